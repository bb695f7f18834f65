//! # Riemann sums
//!
//! Five classical quadrature rules on a uniform grid of `n` subintervals of `[start, stop]`:
//!
//! | method    | samples                     | total                                   |
//! |-----------|-----------------------------|-----------------------------------------|
//! | Left      | x₀ … x_{n-1}                | Δx Σ f(xᵢ)                              |
//! | Right     | x₁ … x_n                    | Δx Σ f(xᵢ)                              |
//! | Midpoint  | (xᵢ + xᵢ₊₁)/2               | Δx Σ f(mᵢ)                              |
//! | Trapezoid | x₀ … x_n                    | Δx/2 Σ (yᵢ + yᵢ₊₁)                      |
//! | Simpson   | x₀ … x_m on a grid of m     | Δx/3 [y₀ + 4Σ odd + 2Σ even + y_m]      |
//!
//! Simpson's rule needs an even number of subintervals: an odd `n` is replaced by
//! `m = n + 1` for Simpson only, and the correction is recorded in the result.
//!
//! Δx is computed from the bounds, so a zero-width interval gives exactly 0 for every
//! rule. Non-finite samples are not errors, they propagate into the total.
//!
//! # Example
//! ```
//! use RustedRiemann::numerical::Riemann_sums::{SampleGrid, trapezoid};
//! let grid = SampleGrid::new(0.0, 1.0, 4).unwrap();
//! let result = trapezoid(&grid, &|x: f64| x);
//! assert!((result.total - 0.5).abs() < 1e-15);
//! ```

use log::{debug, warn};
use nalgebra::DVector;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum RiemannMethod {
    #[strum(to_string = "Left Endpoint")]
    Left,
    #[strum(to_string = "Right Endpoint")]
    Right,
    #[strum(to_string = "Midpoint")]
    Midpoint,
    #[strum(to_string = "Trapezoid Rule")]
    Trapezoid,
    #[strum(to_string = "Simpson's Rule")]
    Simpson,
}

impl RiemannMethod {
    /// label used on the error bar chart and in the inspection shell
    pub fn short_label(&self) -> &'static str {
        match self {
            RiemannMethod::Left => "Left",
            RiemannMethod::Right => "Right",
            RiemannMethod::Midpoint => "Mid",
            RiemannMethod::Trapezoid => "Trap",
            RiemannMethod::Simpson => "Simpson",
        }
    }
}

/// `count` equally spaced points from `start` to `stop`; the last point is exactly `stop`.
pub fn linspace(start: f64, stop: f64, count: usize) -> DVector<f64> {
    if count < 2 {
        return DVector::from_element(count, start);
    }
    let step = (stop - start) / (count - 1) as f64;
    DVector::from_fn(count, |i, _| {
        if i == count - 1 {
            stop
        } else {
            start + i as f64 * step
        }
    })
}

/// Uniform grid of `subdivisions + 1` points. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    start: f64,
    stop: f64,
    subdivisions: usize,
    points: DVector<f64>,
}

impl SampleGrid {
    pub fn new(start: f64, stop: f64, subdivisions: usize) -> Result<Self, String> {
        if subdivisions == 0 {
            return Err("the number of subdivisions must be positive".to_string());
        }
        Ok(Self::uniform(start, stop, subdivisions))
    }

    fn uniform(start: f64, stop: f64, subdivisions: usize) -> Self {
        SampleGrid {
            start,
            stop,
            subdivisions,
            points: linspace(start, stop, subdivisions + 1),
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    pub fn points(&self) -> &DVector<f64> {
        &self.points
    }

    /// width of one subinterval, from the bounds
    pub fn dx(&self) -> f64 {
        (self.stop - self.start) / self.subdivisions as f64
    }

    pub fn left_points(&self) -> DVector<f64> {
        self.points.rows(0, self.subdivisions).into_owned()
    }

    pub fn right_points(&self) -> DVector<f64> {
        self.points.rows(1, self.subdivisions).into_owned()
    }

    pub fn midpoints(&self) -> DVector<f64> {
        DVector::from_fn(self.subdivisions, |i, _| {
            (self.points[i] + self.points[i + 1]) / 2.0
        })
    }
}

/// Samples and total of one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ApproximationResult {
    pub method: RiemannMethod,
    /// sample positions
    pub x: DVector<f64>,
    /// function values at `x`
    pub y: DVector<f64>,
    pub total: f64,
    /// subintervals actually used (differs from the request only for Simpson)
    pub subdivisions: usize,
    pub dx: f64,
    /// the odd count Simpson's rule was asked for, when it had to add one subinterval
    pub simpson_corrected_from: Option<usize>,
}

/// Evaluates `f` at every point of `x`.
pub fn eval_vec<F: Fn(f64) -> f64 + ?Sized>(x: &DVector<f64>, f: &F) -> DVector<f64> {
    x.map(|xi| f(xi))
}

fn scaled(dx: f64, sum: f64) -> f64 {
    // zero-width intervals: exactly zero even when samples are not finite
    if dx == 0.0 { 0.0 } else { dx * sum }
}

fn rectangle_rule(
    method: RiemannMethod,
    grid: &SampleGrid,
    x: DVector<f64>,
    y: DVector<f64>,
) -> ApproximationResult {
    let dx = grid.dx();
    let total = scaled(dx, y.sum());
    debug!("{}: n = {}, total = {}", method, grid.subdivisions, total);
    ApproximationResult {
        method,
        x,
        y,
        total,
        subdivisions: grid.subdivisions,
        dx,
        simpson_corrected_from: None,
    }
}

pub fn left_endpoint<F: Fn(f64) -> f64 + ?Sized>(grid: &SampleGrid, f: &F) -> ApproximationResult {
    let x = grid.left_points();
    let y = eval_vec(&x, f);
    rectangle_rule(RiemannMethod::Left, grid, x, y)
}

pub fn right_endpoint<F: Fn(f64) -> f64 + ?Sized>(grid: &SampleGrid, f: &F) -> ApproximationResult {
    let x = grid.right_points();
    let y = eval_vec(&x, f);
    rectangle_rule(RiemannMethod::Right, grid, x, y)
}

pub fn midpoint<F: Fn(f64) -> f64 + ?Sized>(grid: &SampleGrid, f: &F) -> ApproximationResult {
    let x = grid.midpoints();
    let y = eval_vec(&x, f);
    rectangle_rule(RiemannMethod::Midpoint, grid, x, y)
}

pub fn trapezoid<F: Fn(f64) -> f64 + ?Sized>(grid: &SampleGrid, f: &F) -> ApproximationResult {
    let x = grid.points.clone();
    let y = eval_vec(&x, f);
    let dx = grid.dx();
    let pair_sum: f64 = (0..grid.subdivisions).map(|i| y[i] + y[i + 1]).sum();
    let total = scaled(dx / 2.0, pair_sum);
    debug!("{}: n = {}, total = {}", RiemannMethod::Trapezoid, grid.subdivisions, total);
    ApproximationResult {
        method: RiemannMethod::Trapezoid,
        x,
        y,
        total,
        subdivisions: grid.subdivisions,
        dx,
        simpson_corrected_from: None,
    }
}

/// Subdivision count used by Simpson's rule and the odd request it replaced, if any.
pub fn simpson_subdivisions(n: usize) -> (usize, Option<usize>) {
    if n % 2 == 0 { (n, None) } else { (n + 1, Some(n)) }
}

pub fn simpson<F: Fn(f64) -> f64 + ?Sized>(grid: &SampleGrid, f: &F) -> ApproximationResult {
    let (m, corrected_from) = simpson_subdivisions(grid.subdivisions);
    if let Some(n) = corrected_from {
        warn!(
            "Simpson's rule needs an even number of subdivisions: using n = {} instead of {}",
            m, n
        );
    }
    let fine = SampleGrid::uniform(grid.start, grid.stop, m);
    let x = fine.points.clone();
    let y = eval_vec(&x, f);
    let dx = fine.dx();
    let odd: f64 = (1..m).step_by(2).map(|i| y[i]).sum();
    let even: f64 = (2..m).step_by(2).map(|i| y[i]).sum();
    let total = scaled(dx / 3.0, y[0] + 4.0 * odd + 2.0 * even + y[m]);
    debug!("{}: m = {}, total = {}", RiemannMethod::Simpson, m, total);
    ApproximationResult {
        method: RiemannMethod::Simpson,
        x,
        y,
        total,
        subdivisions: m,
        dx,
        simpson_corrected_from: corrected_from,
    }
}

/// Runs one rule.
pub fn approximate<F: Fn(f64) -> f64 + ?Sized>(
    method: RiemannMethod,
    grid: &SampleGrid,
    f: &F,
) -> ApproximationResult {
    match method {
        RiemannMethod::Left => left_endpoint(grid, f),
        RiemannMethod::Right => right_endpoint(grid, f),
        RiemannMethod::Midpoint => midpoint(grid, f),
        RiemannMethod::Trapezoid => trapezoid(grid, f),
        RiemannMethod::Simpson => simpson(grid, f),
    }
}

/// All five rules in canonical order: Left, Right, Midpoint, Trapezoid, Simpson.
pub fn all_methods<F: Fn(f64) -> f64 + ?Sized>(grid: &SampleGrid, f: &F) -> Vec<ApproximationResult> {
    RiemannMethod::iter()
        .map(|method| approximate(method, grid, f))
        .collect()
}
