//! Figure of one integral report: five approximation panels and a signed-error bar chart.
//!
//! [`FigureModel`] holds everything that is drawn, independent of the backend:
//! gnuplot shows it on screen, plotters writes a PNG.
use crate::numerical::Riemann_sums::{ApproximationResult, RiemannMethod, linspace};
use crate::numerical::definite_integral::IntegralReport;
use crate::numerical::integral_error::IntegralError;
use gnuplot::{AutoOption::Fix, AxesCommon, Caption, Color, Figure, FillAlpha, PlotOption, Tick::Major};
use log::info;
use std::path::Path;

pub type Rgb = (u8, u8, u8);

/// Edge and face colors of a panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelStyle {
    pub edge: Rgb,
    pub face: Rgb,
}

impl PanelStyle {
    pub fn for_method(method: RiemannMethod) -> Self {
        let (edge, face) = match method {
            RiemannMethod::Left => ((0, 0, 255), (0, 255, 255)),
            RiemannMethod::Right => ((255, 0, 0), (255, 165, 0)),
            RiemannMethod::Midpoint => ((128, 0, 128), (238, 130, 238)),
            RiemannMethod::Trapezoid => ((0, 128, 0), (144, 238, 144)),
            RiemannMethod::Simpson => ((255, 215, 0), (255, 255, 0)),
        };
        PanelStyle { edge, face }
    }
}

pub const ERROR_BAR_COLOR: Rgb = (128, 0, 128);

fn hex(color: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", color.0, color.1, color.2)
}

/// Region between the x axis and `upper` over `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct FillArea {
    pub x: Vec<f64>,
    pub upper: Vec<f64>,
}

impl FillArea {
    /// closed outline starting and ending on the axis
    pub fn outline(&self) -> Vec<(f64, f64)> {
        let mut points = Vec::with_capacity(self.x.len() + 3);
        if let (Some(first), Some(last)) = (self.x.first(), self.x.last()) {
            points.push((*first, 0.0));
            points.extend(self.x.iter().copied().zip(self.upper.iter().copied()));
            points.push((*last, 0.0));
            points.push((*first, 0.0));
        }
        points
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub method: RiemannMethod,
    pub title: String,
    pub areas: Vec<FillArea>,
    pub style: PanelStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FigureModel {
    pub suptitle: String,
    pub variable: String,
    /// smooth curve, non-finite points dropped
    pub curve: Vec<(f64, f64)>,
    pub panels: Vec<Panel>,
    pub error_labels: Vec<&'static str>,
    pub error_values: Vec<f64>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

/// Quadratic through three nodes, evaluated at `x`.
pub fn lagrange_quadratic(xs: [f64; 3], ys: [f64; 3], x: f64) -> f64 {
    let [x0, x1, x2] = xs;
    let [y0, y1, y2] = ys;
    y0 * (x - x1) * (x - x2) / ((x0 - x1) * (x0 - x2))
        + y1 * (x - x0) * (x - x2) / ((x1 - x0) * (x1 - x2))
        + y2 * (x - x0) * (x - x1) / ((x2 - x0) * (x2 - x1))
}

fn rectangles(result: &ApproximationResult, offset: f64) -> Vec<FillArea> {
    result
        .x
        .iter()
        .zip(result.y.iter())
        .map(|(&xi, &yi)| {
            let left = xi - offset;
            FillArea {
                x: vec![left, left, left + result.dx, left + result.dx],
                upper: vec![0.0, yi, yi, 0.0],
            }
        })
        .collect()
}

fn trapezoids(result: &ApproximationResult) -> Vec<FillArea> {
    (0..result.x.len().saturating_sub(1))
        .map(|i| FillArea {
            x: vec![result.x[i], result.x[i + 1]],
            upper: vec![result.y[i], result.y[i + 1]],
        })
        .collect()
}

fn parabolas(result: &ApproximationResult, quality: usize) -> Vec<FillArea> {
    let quality = quality.max(3);
    (0..result.x.len().saturating_sub(2))
        .step_by(2)
        .map(|i| {
            let xs = [result.x[i], result.x[i + 1], result.x[i + 2]];
            let ys = [result.y[i], result.y[i + 1], result.y[i + 2]];
            let x = linspace(xs[0], xs[2], quality);
            let upper = x.iter().map(|&xi| lagrange_quadratic(xs, ys, xi)).collect();
            FillArea {
                x: x.iter().copied().collect(),
                upper,
            }
        })
        .collect()
}

/// Visible y range: finite values of the curve and the samples, always including 0.
fn visible_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut low, mut high) = (0.0f64, 0.0f64);
    for v in values.filter(|v| v.is_finite()) {
        low = low.min(v);
        high = high.max(v);
    }
    let margin = if high > low { 0.05 * (high - low) } else { 1.0 };
    (low - margin, high + margin)
}

fn clip(value: f64, range: (f64, f64)) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(range.0, range.1)
    }
}

impl FigureModel {
    /// Builds the figure; non-finite heights are clipped to the visible range.
    pub fn from_report(report: &IntegralReport, quality: usize) -> Self {
        let spec = &report.spec;
        let (x, y) = spec.eval_dense(quality.max(2));
        let curve: Vec<(f64, f64)> = x
            .iter()
            .copied()
            .zip(y.iter().copied())
            .filter(|(_, yi)| yi.is_finite())
            .collect();
        let sample_values = report.results.iter().flat_map(|r| r.y.iter().copied());
        let y_range = visible_range(curve.iter().map(|p| p.1).chain(sample_values));
        let (x_low, x_high) = if spec.start <= spec.stop {
            (spec.start, spec.stop)
        } else {
            (spec.stop, spec.start)
        };
        let x_range = if x_high > x_low {
            (x_low, x_high)
        } else {
            (x_low - 1.0, x_high + 1.0)
        };

        let panels = report
            .results
            .iter()
            .map(|result| {
                let areas = match result.method {
                    RiemannMethod::Left => rectangles(result, 0.0),
                    RiemannMethod::Right => rectangles(result, result.dx),
                    RiemannMethod::Midpoint => rectangles(result, result.dx / 2.0),
                    RiemannMethod::Trapezoid => trapezoids(result),
                    RiemannMethod::Simpson => parabolas(result, quality),
                };
                let areas = areas
                    .into_iter()
                    .map(|area| FillArea {
                        upper: area.upper.iter().map(|&v| clip(v, y_range)).collect(),
                        x: area.x,
                    })
                    .collect();
                Panel {
                    method: result.method,
                    title: report.panel_title(result.method),
                    areas,
                    style: PanelStyle::for_method(result.method),
                }
            })
            .collect();

        FigureModel {
            suptitle: report.summary_line(),
            variable: spec.variable.clone(),
            curve,
            panels,
            error_labels: report.results.iter().map(|r| r.method.short_label()).collect(),
            error_values: report.display_errors.clone(),
            x_range,
            y_range,
        }
    }

    fn error_range(&self) -> (f64, f64) {
        visible_range(self.error_values.iter().copied())
    }
}

fn render_error<E: std::fmt::Debug>(error: E) -> IntegralError {
    IntegralError::Render(format!("{:?}", error))
}

/// gnuplot color option from a name or a `#rrggbb` string
fn color(name: &str) -> PlotOption<&str> {
    Color(name.into())
}

/// Shows the figure in a gnuplot window: 2x3 multiplot, the last cell holds the error bars.
pub fn show_with_gnuplot(model: &FigureModel) -> Result<(), IntegralError> {
    let mut fg = Figure::new();
    fg.set_multiplot_layout(2, 3).set_title(&model.suptitle);
    let curve_x: Vec<f64> = model.curve.iter().map(|p| p.0).collect();
    let curve_y: Vec<f64> = model.curve.iter().map(|p| p.1).collect();
    let curve_caption = format!("f({})", model.variable);
    for panel in &model.panels {
        let face = hex(panel.style.face);
        let edge = hex(panel.style.edge);
        let axes = fg
            .axes2d()
            .set_title(&panel.title, &[])
            .set_x_label(&model.variable, &[])
            .set_x_range(Fix(model.x_range.0), Fix(model.x_range.1))
            .set_y_range(Fix(model.y_range.0), Fix(model.y_range.1));
        for area in &panel.areas {
            let zeros = vec![0.0; area.x.len()];
            axes.fill_between(
                &area.x,
                &zeros,
                &area.upper,
                &[color(&face), FillAlpha(0.5)],
            );
            let (ox, oy): (Vec<f64>, Vec<f64>) = area.outline().into_iter().unzip();
            axes.lines(&ox, &oy, &[color(&edge)]);
        }
        axes.lines(&curve_x, &curve_y, &[Caption(curve_caption.as_str()), color("black")]);
    }
    let positions: Vec<f64> = (0..model.error_values.len()).map(|i| i as f64).collect();
    let (low, high) = model.error_range();
    let bar_color = hex(ERROR_BAR_COLOR);
    let last = positions.len() as f64;
    fg.axes2d()
        .set_title("Signed Errors of Approximations", &[])
        .set_y_label("Signed Error", &[])
        .set_x_range(Fix(-0.5), Fix(last - 0.5))
        .set_y_range(Fix(low), Fix(high))
        .set_x_ticks_custom(
            positions
                .iter()
                .zip(model.error_labels.iter())
                .map(|(&p, label)| Major(p, Fix(label.to_string()))),
            &[],
            &[],
        )
        .boxes(
            &positions,
            &model.error_values,
            &[color(&bar_color), FillAlpha(0.7)],
        )
        .lines([-0.5, last - 0.5], [0.0, 0.0], &[color("black")]);
    fg.show().map_err(render_error)?;
    Ok(())
}

/// Writes the figure to a 1600x1100 PNG.
pub fn save_with_plotters<P: AsRef<Path>>(model: &FigureModel, path: P) -> Result<(), IntegralError> {
    use plotters::prelude::*;
    let root = BitMapBackend::new(path.as_ref(), (1600, 1100)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;
    let root = root
        .titled(&model.suptitle, ("sans-serif", 28))
        .map_err(render_error)?;
    let cells = root.split_evenly((2, 3));
    let rgb = |c: Rgb| RGBColor(c.0, c.1, c.2);

    for (panel, cell) in model.panels.iter().zip(cells.iter()) {
        let mut chart = ChartBuilder::on(cell)
            .caption(&panel.title, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(
                model.x_range.0..model.x_range.1,
                model.y_range.0..model.y_range.1,
            )
            .map_err(render_error)?;
        chart
            .configure_mesh()
            .x_desc(&model.variable)
            .draw()
            .map_err(render_error)?;
        let face = rgb(panel.style.face).mix(0.5).filled();
        let edge = rgb(panel.style.edge);
        for area in &panel.areas {
            let outline = area.outline();
            chart
                .draw_series(std::iter::once(Polygon::new(outline.clone(), face)))
                .map_err(render_error)?;
            chart
                .draw_series(std::iter::once(PathElement::new(outline, edge)))
                .map_err(render_error)?;
        }
        chart
            .draw_series(LineSeries::new(model.curve.iter().copied(), &BLACK))
            .map_err(render_error)?
            .label(format!("f({})", model.variable))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_error)?;
    }

    if let Some(cell) = cells.get(model.panels.len()) {
        let (low, high) = model.error_range();
        let count = model.error_values.len() as f64;
        let labels = model.error_labels.clone();
        let mut chart = ChartBuilder::on(cell)
            .caption("Signed Errors of Approximations", ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..count - 0.5, low..high)
            .map_err(render_error)?;
        chart
            .configure_mesh()
            .y_desc("Signed Error")
            .x_labels(labels.len())
            .x_label_formatter(&|x: &f64| {
                let i = x.round();
                if (x - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < labels.len() {
                    labels[i as usize].to_string()
                } else {
                    String::new()
                }
            })
            .draw()
            .map_err(render_error)?;
        let bar = rgb(ERROR_BAR_COLOR).mix(0.7).filled();
        chart
            .draw_series(model.error_values.iter().enumerate().map(|(i, &v)| {
                let i = i as f64;
                Rectangle::new([(i - 0.35, 0.0), (i + 0.35, v)], bar)
            }))
            .map_err(render_error)?;
        chart
            .draw_series(LineSeries::new(vec![(-0.5, 0.0), (count - 0.5, 0.0)], &BLACK))
            .map_err(render_error)?;
    }
    root.present().map_err(render_error)?;
    info!("figure saved to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::definite_integral::IntegralSpec;
    use approx::assert_relative_eq;

    fn model(function: &str, start: &str, stop: &str, n: usize) -> FigureModel {
        let report = IntegralSpec::new(function, "x", start, stop, n).unwrap().report();
        FigureModel::from_report(&report, 50)
    }

    #[test]
    fn test_lagrange_quadratic_hits_nodes() {
        let xs = [0.0, 0.5, 1.0];
        let ys = [1.0, -2.0, 3.0];
        for k in 0..3 {
            assert_relative_eq!(lagrange_quadratic(xs, ys, xs[k]), ys[k], epsilon = 1e-12);
        }
        let square = |x: f64| x * x;
        assert_relative_eq!(
            lagrange_quadratic(xs, [0.0, 0.25, 1.0], 0.3),
            square(0.3),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_panel_layout() {
        let m = model("x^2", "0", "1", 3);
        assert_eq!(m.panels.len(), 5);
        assert_eq!(m.error_values.len(), 5);
        assert_eq!(m.error_labels, vec!["Left", "Right", "Mid", "Trap", "Simpson"]);
        assert_eq!(m.curve.len(), 50);
        let counts: Vec<usize> = m.panels.iter().map(|p| p.areas.len()).collect();
        // Simpson uses 4 subintervals: two parabolas
        assert_eq!(counts, vec![3, 3, 3, 3, 2]);
        assert_eq!(m.panels[4].areas[0].x.len(), 50);
        assert_eq!(m.panels[0].style.face, (0, 255, 255));
        assert!(m.suptitle.contains("1/3"));
    }

    #[test]
    fn test_rectangle_positions() {
        let m = model("x^2", "0", "1", 4);
        let left = &m.panels[0].areas[1];
        let right = &m.panels[1].areas[1];
        let mid = &m.panels[2].areas[1];
        assert_relative_eq!(left.x[0], 0.25);
        assert_relative_eq!(right.x[0], 0.25);
        assert_relative_eq!(right.upper[1], 0.25);
        assert_relative_eq!(mid.x[0], 0.25);
        assert_relative_eq!(mid.x[3], 0.5);
        assert_relative_eq!(mid.upper[1], 0.375 * 0.375);
    }

    #[test]
    fn test_outline_is_closed() {
        let area = FillArea {
            x: vec![0.0, 1.0],
            upper: vec![2.0, 3.0],
        };
        let outline = area.outline();
        assert_eq!(outline.first(), outline.last());
        assert_eq!(outline.len(), 5);
    }

    #[test]
    fn test_non_finite_samples_are_clipped() {
        let m = model("1/x", "0", "1", 4);
        assert!(m.curve.iter().all(|p| p.1.is_finite()));
        assert!(m.error_values.iter().all(|e| *e == 0.0));
        for panel in &m.panels {
            for area in &panel.areas {
                assert!(area.upper.iter().all(|v| v.is_finite()));
                assert!(area.upper.iter().all(|v| *v <= m.y_range.1));
            }
        }
    }

    #[test]
    fn test_signed_errors_in_model() {
        let m = model("x^2", "0", "1", 3);
        assert_relative_eq!(m.error_values[0], 5.0 / 27.0 - 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.error_values[4], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_width_ranges() {
        let m = model("x", "2", "2", 2);
        assert!(m.x_range.0 < m.x_range.1);
        assert!(m.y_range.0 < m.y_range.1);
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(hex((255, 165, 0)), "#FFA500");
    }

    #[test]
    fn test_gnuplot_color_options() {
        let face = hex(PanelStyle::for_method(RiemannMethod::Midpoint).face);
        assert!(matches!(color(&face), Color(_)));
        assert!(matches!(color("black"), Color(_)));
    }
}
