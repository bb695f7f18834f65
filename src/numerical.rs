/// # Riemann sums
/// five quadrature rules on a uniform grid
/// ```
/// use RustedRiemann::numerical::Riemann_sums::{SampleGrid, all_methods};
/// let grid = SampleGrid::new(0.0, 1.0, 3).unwrap();
/// for result in all_methods(&grid, &|x: f64| x * x) {
///     println!("{} = {}", result.method, result.total);
/// }
/// ```
pub mod Riemann_sums;
mod Riemann_sums_tests;
/// # Definite integral
/// problem object: parsed integrand, exact value, approximations and their errors
/// ```
/// use RustedRiemann::numerical::definite_integral::IntegralSpec;
/// let spec = IntegralSpec::new("sin(x)", "x", "0", "pi", 6).unwrap();
/// let report = spec.report();
/// println!("{}", report.summary_line());
/// println!("{}", report.method_table());
/// ```
pub mod definite_integral;
/// errors reported to the user
pub mod integral_error;
