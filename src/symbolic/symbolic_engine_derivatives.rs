//! # Symbolic Engine Derivatives Module
//!
//! Extends the symbolic engine with differentiation and direct numerical evaluation.
//! Integration by parts needs `diff`, the exact-value resolution needs `eval_const`
//! to turn a substituted antiderivative into a float.
//!
//! ## Key Methods
//!
//! ### Differentiation
//! - `diff(var: &str)` - analytical derivative (product, quotient and chain rules)
//!
//! ### Evaluation
//! - `eval_expression()` - evaluation with named variable values
//! - `eval_const()` - evaluation of a variable-free expression
//!
//! ### Utilities
//! - `all_arguments_are_variables()` - sorted list of free symbols

use crate::symbolic::symbolic_engine::Expr;
use std::collections::{BTreeSet, HashMap};

impl Expr {
    /// Analytical derivative with respect to `var`. The result is not simplified.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::Var("x".to_string());
    /// let df = Expr::sin(x.boxed()).diff("x"); // cos(x) * 1
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) | Expr::Pi | Expr::E => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => lhs.diff(var) + rhs.diff(var),
            Expr::Sub(lhs, rhs) => lhs.diff(var) - rhs.diff(var),
            Expr::Mul(lhs, rhs) => {
                lhs.diff(var) * *rhs.clone() + *lhs.clone() * rhs.diff(var)
            }
            Expr::Div(lhs, rhs) => {
                (lhs.diff(var) * *rhs.clone() - *lhs.clone() * rhs.diff(var))
                    / rhs.clone().pow(Expr::Const(2.0))
            }
            Expr::Pow(base, exp) => {
                if !exp.contains_variable(var) {
                    // d/dx u^n = n * u^(n-1) * u'
                    *exp.clone()
                        * base.clone().pow(*exp.clone() - Expr::Const(1.0))
                        * base.diff(var)
                } else {
                    // d/dx u^v = u^v * (v' * ln(u) + v * u' / u)
                    self.clone()
                        * (exp.diff(var) * base.clone().ln()
                            + *exp.clone() * base.diff(var) / *base.clone())
                }
            }
            Expr::Exp(expr) => Expr::Exp(expr.clone()) * expr.diff(var),
            Expr::Ln(expr) => expr.diff(var) / *expr.clone(),
            // d|u| = u/|u| * u'
            Expr::Abs(expr) => (*expr.clone() / Expr::Abs(expr.clone())) * expr.diff(var),
            Expr::sin(expr) => Expr::cos(expr.clone()) * expr.diff(var),
            Expr::cos(expr) => -Expr::sin(expr.clone()) * expr.diff(var),
            Expr::tg(expr) => {
                expr.diff(var) / Expr::cos(expr.clone()).pow(Expr::Const(2.0))
            }
            Expr::ctg(expr) => {
                -(expr.diff(var) / Expr::sin(expr.clone()).pow(Expr::Const(2.0)))
            }
            Expr::arcsin(expr) => {
                expr.diff(var)
                    / (Expr::Const(1.0) - expr.clone().pow(Expr::Const(2.0)))
                        .pow(Expr::Const(0.5))
            }
            Expr::arccos(expr) => {
                -(expr.diff(var)
                    / (Expr::Const(1.0) - expr.clone().pow(Expr::Const(2.0)))
                        .pow(Expr::Const(0.5)))
            }
            Expr::arctg(expr) => {
                expr.diff(var) / (Expr::Const(1.0) + expr.clone().pow(Expr::Const(2.0)))
            }
        }
    }

    /// Evaluates the expression with the given variable values.
    ///
    /// # Errors
    /// Returns an error if a free variable has no value or the slices differ in length.
    pub fn eval_expression(&self, vars: &[&str], values: &[f64]) -> Result<f64, String> {
        if vars.len() != values.len() {
            return Err(format!(
                "{} variables but {} values given",
                vars.len(),
                values.len()
            ));
        }
        let map: HashMap<String, f64> = vars
            .iter()
            .zip(values.iter())
            .map(|(v, val)| (v.to_string(), *val))
            .collect();
        let substituted = self.set_variable_from_map(&map);
        substituted.eval_const().ok_or_else(|| {
            format!(
                "expression still has free variables: {:?}",
                substituted.all_arguments_are_variables()
            )
        })
    }

    /// Float value of a variable-free expression, `None` if a variable remains.
    /// Non-finite results (1/0, ln(0)) are returned as they are.
    pub fn eval_const(&self) -> Option<f64> {
        let value = match self {
            Expr::Var(_) => return None,
            Expr::Const(val) => *val,
            Expr::Pi => std::f64::consts::PI,
            Expr::E => std::f64::consts::E,
            Expr::Add(lhs, rhs) => lhs.eval_const()? + rhs.eval_const()?,
            Expr::Sub(lhs, rhs) => lhs.eval_const()? - rhs.eval_const()?,
            Expr::Mul(lhs, rhs) => lhs.eval_const()? * rhs.eval_const()?,
            Expr::Div(lhs, rhs) => lhs.eval_const()? / rhs.eval_const()?,
            Expr::Pow(base, exp) => base.eval_const()?.powf(exp.eval_const()?),
            Expr::Exp(expr) => expr.eval_const()?.exp(),
            Expr::Ln(expr) => expr.eval_const()?.ln(),
            Expr::Abs(expr) => expr.eval_const()?.abs(),
            Expr::sin(expr) => expr.eval_const()?.sin(),
            Expr::cos(expr) => expr.eval_const()?.cos(),
            Expr::tg(expr) => expr.eval_const()?.tan(),
            Expr::ctg(expr) => 1.0 / expr.eval_const()?.tan(),
            Expr::arcsin(expr) => expr.eval_const()?.asin(),
            Expr::arccos(expr) => expr.eval_const()?.acos(),
            Expr::arctg(expr) => expr.eval_const()?.atan(),
        };
        Some(value)
    }

    /// Sorted, deduplicated names of all variables in the expression.
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars.into_iter().collect()
    }

    fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Expr::Var(name) => {
                vars.insert(name.clone());
            }
            _ => {
                for arg in self.args() {
                    arg.collect_variables(vars);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_diff_power_and_product() {
        let expr = Expr::parse_expression("x^3*sin(x)").unwrap();
        let df = expr.diff("x");
        let x0 = 0.7;
        let expected = 3.0 * x0 * x0 * f64::sin(x0) + x0.powi(3) * f64::cos(x0);
        assert_relative_eq!(
            df.eval_expression(&["x"], &[x0]).unwrap(),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_diff_variable_exponent() {
        let expr = Expr::parse_expression("2^x").unwrap();
        let df = expr.diff("x");
        assert_relative_eq!(
            df.eval_expression(&["x"], &[1.5]).unwrap(),
            2f64.powf(1.5) * 2f64.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_diff_against_central_difference() {
        for input in [
            "exp(2*x)/(x+1)",
            "ln(x^2+1)",
            "tan(x)",
            "cot(x)",
            "arcsin(x/2)",
            "arccos(x/2)",
            "arctan(3*x)",
            "abs(x-3)",
        ] {
            let expr = Expr::parse_expression(input).unwrap();
            let f = expr.lambdify1D("x").unwrap();
            let df = expr.diff("x").lambdify1D("x").unwrap();
            let step = 1e-6;
            for x in [0.3, 0.5, 0.9] {
                let numeric = (f(x + step) - f(x - step)) / (2.0 * step);
                assert!((numeric - df(x)).abs() < 1e-6, "{} at {}", input, x);
            }
        }
    }

    #[test]
    fn test_eval_const() {
        let expr = Expr::parse_expression("sin(pi/2) + ln(e)").unwrap();
        assert_relative_eq!(expr.eval_const().unwrap(), 2.0, epsilon = 1e-15);
        assert_eq!(Expr::parse_expression("x+1").unwrap().eval_const(), None);
        assert!(Expr::parse_expression("1/0").unwrap().eval_const().unwrap().is_infinite());
    }

    #[test]
    fn test_eval_expression_errors() {
        let expr = Expr::parse_expression("x*y").unwrap();
        assert!(expr.eval_expression(&["x"], &[1.0]).is_err());
        assert!(expr.eval_expression(&["x", "y"], &[1.0]).is_err());
        assert_relative_eq!(expr.eval_expression(&["x", "y"], &[2.0, 3.0]).unwrap(), 6.0);
    }

    #[test]
    fn test_all_arguments_are_variables() {
        let expr = Expr::parse_expression("y*x + sin(x) + pi").unwrap();
        assert_eq!(expr.all_arguments_are_variables(), vec!["x", "y"]);
    }
}
