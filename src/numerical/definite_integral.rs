//! # Definite integral problem
//!
//! [`IntegralSpec`] is the immutable description of one problem: the integrand, its
//! variable, exact and float bounds and the subdivision count. It owns the lambdified
//! integrand and the sample grid, so every approximation is a pure function of the `IntegralSpec`.
//!
//! [`IntegralReport`] bundles everything the renderer and the inspection shell need:
//! the exact value, the antiderivative, the five approximations and their signed errors.
//!
//! # Example
//! ```
//! use RustedRiemann::numerical::definite_integral::IntegralSpec;
//! let spec = IntegralSpec::new("x^2", "x", "0", "1", 4).unwrap();
//! let report = spec.report();
//! assert_eq!(report.exact.to_string(), "1/3");
//! assert_eq!(report.totals.len(), 5);
//! ```

use crate::numerical::Riemann_sums::{
    ApproximationResult, RiemannMethod, SampleGrid, all_methods, approximate, linspace,
};
use crate::numerical::integral_error::IntegralError;
use crate::symbolic::parse_expr::RESERVED_NAMES;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_integration::ExactValue;
use crate::symbolic::utils::is_identifier;
use log::{info, warn};
use nalgebra::DVector;
use std::fmt;
use std::sync::Arc;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

/// Thread-safe single-variable function.
pub type Func1D = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// The function under the integral sign.
#[derive(Clone)]
pub enum Integrand {
    /// parsed from a string; has an exact value
    Symbolic(Expr),
    /// plain closure; the exact value is unresolved
    Callable { label: String, func: Func1D },
}

impl fmt::Debug for Integrand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Integrand::Symbolic(expr) => write!(f, "Symbolic({})", expr),
            Integrand::Callable { label, .. } => write!(f, "Callable({})", label),
        }
    }
}

impl fmt::Display for Integrand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Integrand::Symbolic(expr) => write!(f, "{}", expr),
            Integrand::Callable { label, .. } => write!(f, "{}", label),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IntegralSpec {
    pub integrand: Integrand,
    pub variable: String,
    /// exact bounds, e.g. `pi / 2`
    pub start_expr: Expr,
    pub stop_expr: Expr,
    /// float bounds used for sampling
    pub start: f64,
    pub stop: f64,
    pub subdivisions: usize,
    pub grid: SampleGrid,
    func: FuncHolder,
}

#[derive(Clone)]
struct FuncHolder(Func1D);

impl fmt::Debug for FuncHolder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Fn(f64) -> f64")
    }
}

/// Checks a variable name: an identifier that is not a function or constant name.
pub fn validate_variable(variable: &str) -> Result<String, IntegralError> {
    let variable = variable.trim();
    if !is_identifier(variable) || RESERVED_NAMES.contains(&variable) {
        return Err(IntegralError::InvalidVariable(variable.to_string()));
    }
    Ok(variable.to_string())
}

/// Parses a bound such as `0`, `-1.5`, `pi/2`, `e^2`.
pub fn parse_bound(input: &str) -> Result<(Expr, f64), IntegralError> {
    let invalid = |reason: String| IntegralError::InvalidBound {
        input: input.trim().to_string(),
        reason,
    };
    let expr = Expr::parse_expression(input.trim()).map_err(invalid)?;
    let symbols = expr.all_arguments_are_variables();
    if !symbols.is_empty() {
        return Err(invalid(format!("a bound cannot contain variables {:?}", symbols)));
    }
    match expr.eval_const() {
        Some(value) if value.is_finite() => Ok((expr.simplify(), value)),
        _ => Err(invalid("the bound is not a finite number".to_string())),
    }
}

/// Parses a positive subdivision count.
pub fn parse_subdivisions(input: &str) -> Result<usize, IntegralError> {
    match input.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(IntegralError::InvalidCount(input.trim().to_string())),
    }
}

impl IntegralSpec {
    /// Builds a problem from strings, the way the console driver does.
    pub fn new(
        function: &str,
        variable: &str,
        start: &str,
        stop: &str,
        subdivisions: usize,
    ) -> Result<Self, IntegralError> {
        let expr = Expr::parse_expression(function).map_err(|reason| IntegralError::Parse {
            input: function.to_string(),
            reason,
        })?;
        let (start_expr, _) = parse_bound(start)?;
        let (stop_expr, _) = parse_bound(stop)?;
        Self::from_expr(expr, variable, start_expr, stop_expr, subdivisions)
    }

    /// Builds a problem from an already parsed integrand and exact bounds.
    pub fn from_expr(
        expr: Expr,
        variable: &str,
        start_expr: Expr,
        stop_expr: Expr,
        subdivisions: usize,
    ) -> Result<Self, IntegralError> {
        let variable = validate_variable(variable)?;
        let unknown: Vec<String> = expr
            .all_arguments_are_variables()
            .into_iter()
            .filter(|name| *name != variable)
            .collect();
        if !unknown.is_empty() {
            return Err(IntegralError::Parse {
                input: expr.to_string(),
                reason: format!(
                    "unknown symbols {:?}, the only variable is '{}'",
                    unknown, variable
                ),
            });
        }
        let start = bound_value(&start_expr)?;
        let stop = bound_value(&stop_expr)?;
        let func: Func1D = Arc::from(expr.lambdify1D(&variable).map_err(|reason| {
            IntegralError::Parse {
                input: expr.to_string(),
                reason,
            }
        })?);
        Self::assemble(
            Integrand::Symbolic(expr),
            variable,
            (start_expr, start),
            (stop_expr, stop),
            subdivisions,
            func,
        )
    }

    /// Builds a problem from a plain closure; the exact value will be unresolved.
    pub fn from_fn<F>(
        label: &str,
        func: F,
        variable: &str,
        start: f64,
        stop: f64,
        subdivisions: usize,
    ) -> Result<Self, IntegralError>
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        let variable = validate_variable(variable)?;
        for bound in [start, stop] {
            if !bound.is_finite() {
                return Err(IntegralError::InvalidBound {
                    input: bound.to_string(),
                    reason: "the bound is not a finite number".to_string(),
                });
            }
        }
        let func: Func1D = Arc::new(func);
        Self::assemble(
            Integrand::Callable {
                label: label.to_string(),
                func: func.clone(),
            },
            variable,
            (Expr::Const(start), start),
            (Expr::Const(stop), stop),
            subdivisions,
            func,
        )
    }

    fn assemble(
        integrand: Integrand,
        variable: String,
        start: (Expr, f64),
        stop: (Expr, f64),
        subdivisions: usize,
        func: Func1D,
    ) -> Result<Self, IntegralError> {
        let grid = SampleGrid::new(start.1, stop.1, subdivisions)
            .map_err(|_| IntegralError::InvalidCount(subdivisions.to_string()))?;
        let spec = IntegralSpec {
            integrand,
            variable,
            start_expr: start.0,
            stop_expr: stop.0,
            start: start.1,
            stop: stop.1,
            subdivisions,
            grid,
            func: FuncHolder(func),
        };
        info!("{}", spec);
        Ok(spec)
    }

    /// f(x)
    pub fn evaluate(&self, x: f64) -> f64 {
        (self.func.0)(x)
    }

    pub fn function(&self) -> Func1D {
        self.func.0.clone()
    }

    /// `quality` points of the integrand on the interval, for the smooth reference curve.
    pub fn eval_dense(&self, quality: usize) -> (DVector<f64>, DVector<f64>) {
        let x = linspace(self.start, self.stop, quality);
        let y = x.map(|xi| self.evaluate(xi));
        (x, y)
    }

    pub fn is_zero_width(&self) -> bool {
        self.start == self.stop
    }

    pub fn left_endpoint_approximation(&self) -> ApproximationResult {
        self.approximation(RiemannMethod::Left)
    }

    pub fn right_endpoint_approximation(&self) -> ApproximationResult {
        self.approximation(RiemannMethod::Right)
    }

    pub fn midpoint_approximation(&self) -> ApproximationResult {
        self.approximation(RiemannMethod::Midpoint)
    }

    pub fn trapezoid_approximation(&self) -> ApproximationResult {
        self.approximation(RiemannMethod::Trapezoid)
    }

    pub fn simpson_approximation(&self) -> ApproximationResult {
        self.approximation(RiemannMethod::Simpson)
    }

    pub fn approximation(&self, method: RiemannMethod) -> ApproximationResult {
        approximate(method, &self.grid, self.func.0.as_ref())
    }

    /// The five approximations in canonical order.
    pub fn approximations(&self) -> Vec<ApproximationResult> {
        all_methods(&self.grid, self.func.0.as_ref())
    }

    /// Symbolic antiderivative, an error for closures or when no rule applies.
    pub fn antiderivative(&self) -> Result<Expr, String> {
        match &self.integrand {
            Integrand::Symbolic(expr) => expr.integrate(&self.variable),
            Integrand::Callable { label, .. } => {
                Err(format!("{} is a closure without a symbolic form", label))
            }
        }
    }

    pub fn exact_value(&self) -> ExactValue {
        let antiderivative = if self.is_zero_width() {
            None
        } else {
            self.antiderivative().ok()
        };
        self.resolve_exact(antiderivative.as_ref())
    }

    fn resolve_exact(&self, antiderivative: Option<&Expr>) -> ExactValue {
        if self.is_zero_width() {
            return ExactValue::Trivial;
        }
        match (&self.integrand, antiderivative) {
            (Integrand::Symbolic(expr), Some(big_f)) => expr.definite_from_antiderivative(
                &self.variable,
                big_f,
                &self.start_expr,
                &self.stop_expr,
            ),
            (Integrand::Symbolic(expr), None) => {
                ExactValue::Unresolved(format!("no antiderivative found for {}", expr))
            }
            (Integrand::Callable { label, .. }, _) => {
                ExactValue::Unresolved(format!("{} is a closure without a symbolic form", label))
            }
        }
    }

    /// Exact value, approximations and errors of this problem.
    pub fn report(&self) -> IntegralReport {
        let antiderivative = match self.antiderivative() {
            Ok(big_f) => Some(big_f),
            Err(reason) => {
                warn!("antiderivative unavailable: {}", reason);
                None
            }
        };
        let exact = self.resolve_exact(antiderivative.as_ref());
        let exact_float = exact.float_value();
        if exact_float.is_none() {
            warn!("exact value of {} is unavailable: {:?}", self, exact);
        }
        let results = self.approximations();
        let totals: Vec<f64> = results.iter().map(|r| r.total).collect();
        let signed_errors: Vec<Option<f64>> = totals
            .iter()
            .map(|total| match exact_float {
                Some(exact) if total.is_finite() => Some(total - exact),
                _ => None,
            })
            .collect();
        let display_errors = signed_errors.iter().map(|e| e.unwrap_or(0.0)).collect();
        IntegralReport {
            spec: self.clone(),
            antiderivative,
            exact,
            exact_float,
            results,
            totals,
            signed_errors,
            display_errors,
        }
    }
}

fn bound_value(bound: &Expr) -> Result<f64, IntegralError> {
    let invalid = |reason: &str| IntegralError::InvalidBound {
        input: bound.to_string(),
        reason: reason.to_string(),
    };
    if !bound.is_constant() {
        return Err(invalid("a bound cannot contain variables"));
    }
    match bound.eval_const() {
        Some(value) if value.is_finite() => Ok(value),
        _ => Err(invalid("the bound is not a finite number")),
    }
}

impl fmt::Display for IntegralSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Definite integral of {} d{} from {} to {} with {} subintervals",
            self.integrand, self.variable, self.start_expr, self.stop_expr, self.subdivisions
        )
    }
}

/// Everything computed for one problem.
#[derive(Clone, Debug)]
pub struct IntegralReport {
    pub spec: IntegralSpec,
    pub antiderivative: Option<Expr>,
    pub exact: ExactValue,
    /// `None` when the integral diverges or has no closed form
    pub exact_float: Option<f64>,
    /// Left, Right, Midpoint, Trapezoid, Simpson
    pub results: Vec<ApproximationResult>,
    pub totals: Vec<f64>,
    /// approximation − exact; `None` when either side is unavailable or not finite
    pub signed_errors: Vec<Option<f64>>,
    /// signed errors with missing values drawn as 0
    pub display_errors: Vec<f64>,
}

#[derive(Tabled)]
struct MethodRow {
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "n")]
    subdivisions: usize,
    #[tabled(rename = "Approximation")]
    total: String,
    #[tabled(rename = "Signed error")]
    error: String,
}

impl IntegralReport {
    pub fn result(&self, method: RiemannMethod) -> &ApproximationResult {
        &self.results[method as usize]
    }

    pub fn signed_error(&self, method: RiemannMethod) -> Option<f64> {
        self.signed_errors[method as usize]
    }

    /// `∫_a^b f dx = [F]_a^b = exact ≈ float`
    pub fn summary_line(&self) -> String {
        let spec = &self.spec;
        let antiderivative = match &self.antiderivative {
            Some(big_f) => big_f.to_string(),
            None => "?".to_string(),
        };
        let float = match self.exact_float {
            Some(value) => format!("{:.6}", value),
            None => "unavailable".to_string(),
        };
        format!(
            "∫_{a}^{b} {f} d{x} = [{big_f}]_{a}^{b} = {exact} ≈ {float}",
            a = spec.start_expr,
            b = spec.stop_expr,
            f = spec.integrand,
            x = spec.variable,
            big_f = antiderivative,
            exact = self.exact,
        )
    }

    /// Panel title: method name and its total, plus the corrected count for Simpson.
    pub fn panel_title(&self, method: RiemannMethod) -> String {
        let result = self.result(method);
        match result.simpson_corrected_from {
            Some(n) => format!(
                "{} = {:.6} (n = {}, corrected from {})",
                method, result.total, result.subdivisions, n
            ),
            None => format!("{} = {:.6} (n = {})", method, result.total, result.subdivisions),
        }
    }

    /// Console table of all methods.
    pub fn method_table(&self) -> String {
        let rows: Vec<MethodRow> = self
            .results
            .iter()
            .zip(self.signed_errors.iter())
            .map(|(result, error)| MethodRow {
                method: result.method.to_string(),
                subdivisions: result.subdivisions,
                total: format!("{}", result.total),
                error: match error {
                    Some(e) => format!("{:e}", e),
                    None => "n/a".to_string(),
                },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::modern_rounded());
        table.to_string()
    }

    /// Key/value table of the exact side of the report.
    pub fn exact_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(["integrand".to_string(), self.spec.integrand.to_string()]);
        builder.push_record(["variable".to_string(), self.spec.variable.clone()]);
        builder.push_record([
            "interval".to_string(),
            format!("[{}, {}]", self.spec.start_expr, self.spec.stop_expr),
        ]);
        builder.push_record([
            "antiderivative".to_string(),
            self.antiderivative
                .as_ref()
                .map_or("unavailable".to_string(), |big_f| big_f.to_string()),
        ]);
        let exact = match &self.exact {
            ExactValue::Divergent(reason) | ExactValue::Unresolved(reason) => {
                format!("{} ({})", self.exact, reason)
            }
            other => other.to_string(),
        };
        builder.push_record(["exact value".to_string(), exact]);
        builder.push_record([
            "float value".to_string(),
            self.exact_float
                .map_or("unavailable".to_string(), |value| value.to_string()),
        ]);
        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.to_string()
    }
}
