/////////////////////////////TESTS////////////////////////////////////////////////////
/*
quadrature engine tests:
grid geometry (equal widths, last point exact)
constants are exact for every rule
f(x) = x is exact for Trapezoid and Midpoint
Simpson is exact for cubics
odd n: Simpson uses n + 1, the other rules keep n
left/right reflection and monotone bracketing
x^2 on [0, 1] with n = 3
1/x on [0, 1] with n = 4: non-finite left total
zero-width interval
determinism
*/

#[cfg(test)]
mod tests1 {
    use crate::numerical::Riemann_sums::{
        RiemannMethod, SampleGrid, all_methods, approximate, left_endpoint, linspace, midpoint,
        right_endpoint, simpson, simpson_subdivisions, trapezoid,
    };
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    fn grid(start: f64, stop: f64, n: usize) -> SampleGrid {
        SampleGrid::new(start, stop, n).unwrap()
    }

    #[test]
    fn test_linspace_last_point_is_stop() {
        let x = linspace(0.0, 0.3, 4);
        assert_eq!(x.len(), 4);
        assert_eq!(x[0], 0.0);
        assert_eq!(x[3], 0.3);
        let single = linspace(2.0, 5.0, 1);
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_zero_subdivisions_rejected() {
        assert!(SampleGrid::new(0.0, 1.0, 0).is_err());
    }

    #[test]
    fn test_grid_is_read_only() {
        let g = grid(0.0, 2.0, 4);
        assert_eq!(g.start(), 0.0);
        assert_eq!(g.stop(), 2.0);
        assert_eq!(g.subdivisions(), 4);
        assert_eq!(g.points().len(), g.subdivisions() + 1);
        assert_eq!(g.left_points().len(), 4);
        assert_eq!(g.right_points()[3], g.stop());
        assert_eq!(g.midpoints()[0], 0.25);
    }

    #[test]
    fn test_equal_widths() {
        for (a, b, n) in [(0.0, 1.0, 3), (-2.0, 5.0, 7), (1.0, -1.0, 4)] {
            let g = grid(a, b, n);
            assert_eq!(g.points().len(), n + 1);
            let dx = g.dx();
            assert_relative_eq!(dx, (b - a) / n as f64);
            for i in 0..n {
                assert_relative_eq!(g.points()[i + 1] - g.points()[i], dx, epsilon = 1e-12);
            }
            for method in [
                RiemannMethod::Left,
                RiemannMethod::Right,
                RiemannMethod::Midpoint,
                RiemannMethod::Trapezoid,
            ] {
                let result = approximate(method, &g, &|x: f64| x);
                assert_eq!(result.subdivisions, n);
                assert_eq!(result.dx, dx);
            }
        }
    }

    #[test]
    fn test_sample_positions() {
        let g = grid(0.0, 1.0, 4);
        let f = |x: f64| x * x;
        assert_eq!(left_endpoint(&g, &f).x.as_slice(), &[0.0, 0.25, 0.5, 0.75]);
        assert_eq!(right_endpoint(&g, &f).x.as_slice(), &[0.25, 0.5, 0.75, 1.0]);
        assert_eq!(midpoint(&g, &f).x.as_slice(), &[0.125, 0.375, 0.625, 0.875]);
        assert_eq!(trapezoid(&g, &f).x.len(), 5);
        assert_eq!(simpson(&g, &f).x.len(), 5);
    }

    #[test]
    fn test_constants_are_exact() {
        let c = 2.5;
        for (a, b) in [(0.0, 1.0), (-3.0, 4.0), (2.0, -1.0)] {
            for n in [1, 2, 3, 10] {
                let g = grid(a, b, n);
                for result in all_methods(&g, &|_x: f64| c) {
                    assert_relative_eq!(result.total, c * (b - a), epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_identity_exact_for_trapezoid_and_midpoint() {
        let f = |x: f64| x;
        let (a, b) = (-1.0, 3.0);
        let exact = (b * b - a * a) / 2.0;
        for n in [1, 3, 8] {
            let g = grid(a, b, n);
            assert_relative_eq!(trapezoid(&g, &f).total, exact, epsilon = 1e-12);
            assert_relative_eq!(midpoint(&g, &f).total, exact, epsilon = 1e-12);
            assert!((left_endpoint(&g, &f).total - exact).abs() > 1e-6);
            assert!((right_endpoint(&g, &f).total - exact).abs() > 1e-6);
        }
    }

    #[test]
    fn test_simpson_exact_for_cubics() {
        let f = |x: f64| 2.0 * x.powi(3) - x * x + 3.0 * x - 7.0;
        let big_f = |x: f64| 0.5 * x.powi(4) - x.powi(3) / 3.0 + 1.5 * x * x - 7.0 * x;
        for (a, b) in [(0.0, 1.0), (-2.0, 3.0)] {
            for n in [2, 4, 10] {
                let result = simpson(&grid(a, b, n), &f);
                assert_relative_eq!(result.total, big_f(b) - big_f(a), epsilon = 1e-10);
                assert_eq!(result.simpson_corrected_from, None);
            }
        }
    }

    #[test]
    fn test_odd_n_corrected_for_simpson_only() {
        assert_eq!(simpson_subdivisions(3), (4, Some(3)));
        assert_eq!(simpson_subdivisions(4), (4, None));
        let g = grid(0.0, 1.0, 3);
        let results = all_methods(&g, &|x: f64| x * x);
        for result in &results {
            if result.method == RiemannMethod::Simpson {
                assert_eq!(result.subdivisions, 4);
                assert_eq!(result.simpson_corrected_from, Some(3));
                assert_relative_eq!(result.dx, 0.25);
            } else {
                assert_eq!(result.subdivisions, 3);
                assert_eq!(result.simpson_corrected_from, None);
            }
        }
    }

    #[test]
    fn test_left_right_reflection() {
        let (a, b) = (0.5, 2.0);
        let f = |x: f64| x.exp() + x * x;
        let reflected = |x: f64| f(a + b - x);
        for n in [1, 4, 7] {
            let g = grid(a, b, n);
            assert_relative_eq!(
                right_endpoint(&g, &f).total,
                left_endpoint(&g, &reflected).total,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_monotone_bracketing() {
        let g = grid(0.0, 2.0, 5);
        let increasing = |x: f64| x.exp();
        let exact = 2f64.exp() - 1.0;
        assert!(left_endpoint(&g, &increasing).total <= exact);
        assert!(right_endpoint(&g, &increasing).total >= exact);
        let decreasing = |x: f64| (-x).exp();
        let exact = 1.0 - (-2f64).exp();
        assert!(left_endpoint(&g, &decreasing).total >= exact);
        assert!(right_endpoint(&g, &decreasing).total <= exact);
    }

    #[test]
    fn test_x_squared_n3() {
        let g = grid(0.0, 1.0, 3);
        let results = all_methods(&g, &|x: f64| x * x);
        let totals: Vec<f64> = results.iter().map(|r| r.total).collect();
        // Δx Σ f on 0, 1/3, 2/3 and 1/3, 2/3, 1; midpoints 1/6, 1/2, 5/6
        assert_relative_eq!(totals[0], 5.0 / 27.0, epsilon = 1e-12);
        assert_relative_eq!(totals[1], 14.0 / 27.0, epsilon = 1e-12);
        assert_relative_eq!(totals[2], 35.0 / 108.0, epsilon = 1e-12);
        assert_relative_eq!(totals[3], 19.0 / 54.0, epsilon = 1e-12);
        assert_relative_eq!(totals[4], 1.0 / 3.0, epsilon = 1e-12);
        let order: Vec<RiemannMethod> = results.iter().map(|r| r.method).collect();
        assert_eq!(order, RiemannMethod::iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_one_over_x_left_not_finite() {
        let g = grid(0.0, 1.0, 4);
        let f = |x: f64| 1.0 / x;
        let left = left_endpoint(&g, &f);
        assert!(!left.total.is_finite());
        assert!(right_endpoint(&g, &f).total.is_finite());
        assert!(midpoint(&g, &f).total.is_finite());
        assert!(!trapezoid(&g, &f).total.is_finite());
        assert!(!simpson(&g, &f).total.is_finite());
    }

    #[test]
    fn test_zero_width_interval() {
        let g = grid(1.0, 1.0, 3);
        for result in all_methods(&g, &|x: f64| 1.0 / (x - 1.0)) {
            assert_eq!(result.total, 0.0);
        }
    }

    #[test]
    fn test_deterministic_reruns() {
        let g = grid(-1.0, 2.0, 7);
        let f = |x: f64| (3.0 * x).sin() * x.exp();
        let first = all_methods(&g, &f);
        let second = all_methods(&g, &f);
        assert_eq!(first, second);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.total.to_bits(), b.total.to_bits());
        }
    }

    #[test]
    fn test_method_labels() {
        assert_eq!(RiemannMethod::Left.to_string(), "Left Endpoint");
        assert_eq!(RiemannMethod::Simpson.to_string(), "Simpson's Rule");
        assert_eq!(RiemannMethod::Trapezoid.short_label(), "Trap");
    }
}
