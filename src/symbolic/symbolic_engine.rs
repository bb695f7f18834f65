//! # Symbolic Engine Module
//!
//! Core expression tree of the crate. An integrand typed by the user (`x^2`, `5*sin(x/3) + x`,
//! `1/x`) is parsed into an [`Expr`], and every other symbolic feature works on that tree:
//! - lambdification into Rust closures used by the Riemann sums
//! - analytical differentiation (needed by integration by parts)
//! - simplification and exact evaluation of constant subtrees
//! - symbolic antiderivatives and exact definite values
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)`
//! - **Constants**: `Const(f64)` and the named constants `Pi` and `E`, which are kept
//!   symbolic so that bounds like `pi/2` survive into the exact value
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow`
//! - **Functions**: `Exp`, `Ln`, `Abs`, `sin`, `cos`, `tg`, `ctg`, `arcsin`, `arccos`, `arctg`
//!
//! ### Key Methods
//! - `set_variable_from_map()` / `substitute_variable()` - substitution
//! - `contains_variable()` - dependency check used by the integration rules
//! - `map_args()` - rebuild a node from transformed children
//!
//! Trigonometric functions use the mathematical notation (`tg`, `ctg`, `arctg`), the parser
//! accepts both that and the programming one (`tan`, `cot`, `atan`).

#![allow(non_camel_case_types)]

use std::collections::HashMap;
use std::fmt;

/// Symbolic expression tree.
///
/// # Examples
/// ```rust, ignore
/// use RustedRiemann::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "t")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// The number π
    Pi,
    /// Euler's number e
    E,
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    /// Absolute value, produced by antiderivatives such as ∫ 1/x dx = ln|x|
    Abs(Box<Expr>),
    /// Sine function: sin(x)
    sin(Box<Expr>),
    /// Cosine function: cos(x)
    cos(Box<Expr>),
    /// Tangent function: tan(x)
    tg(Box<Expr>),
    /// Cotangent function: cot(x)
    ctg(Box<Expr>),
    /// Arcsine function: arcsin(x)
    arcsin(Box<Expr>),
    /// Arccosine function: arccos(x)
    arccos(Box<Expr>),
    /// Arctangent function: arctan(x)
    arctg(Box<Expr>),
}

impl Expr {
    /// binding strength used by the printer to decide where brackets are needed
    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(_, _) | Expr::Sub(_, _) => 1,
            Expr::Mul(lhs, _) if matches!(**lhs, Expr::Const(c) if c < 0.0) => 1,
            Expr::Mul(_, _) | Expr::Div(_, _) => 2,
            Expr::Const(val) if *val < 0.0 => 1,
            Expr::Pow(_, _) => 3,
            _ => 4,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Pretty printing with the minimal number of brackets, e.g. `x^3 / 3 - 2 * (x + 1)`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Pi => write!(f, "pi"),
            Expr::E => write!(f, "e"),
            Expr::Add(lhs, rhs) => {
                lhs.fmt_operand(f, 1)?;
                write!(f, " + ")?;
                rhs.fmt_operand(f, 2)
            }
            Expr::Sub(lhs, rhs) => {
                lhs.fmt_operand(f, 1)?;
                write!(f, " - ")?;
                rhs.fmt_operand(f, 2)
            }
            Expr::Mul(lhs, rhs) if **lhs == Expr::Const(-1.0) => {
                write!(f, "-")?;
                rhs.fmt_operand(f, 2)
            }
            Expr::Mul(lhs, rhs) if matches!(**lhs, Expr::Const(c) if c < 0.0) => {
                write!(f, "{} * ", lhs)?;
                rhs.fmt_operand(f, 3)
            }
            Expr::Mul(lhs, rhs) => {
                lhs.fmt_operand(f, 2)?;
                write!(f, " * ")?;
                rhs.fmt_operand(f, 3)
            }
            Expr::Div(lhs, rhs) => {
                lhs.fmt_operand(f, 2)?;
                write!(f, " / ")?;
                rhs.fmt_operand(f, 3)
            }
            Expr::Pow(base, exp) => {
                base.fmt_operand(f, 4)?;
                write!(f, "^")?;
                exp.fmt_operand(f, 4)
            }
            Expr::Exp(expr) => write!(f, "exp({})", expr),
            Expr::Ln(expr) => write!(f, "ln({})", expr),
            Expr::Abs(expr) => write!(f, "|{}|", expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
            Expr::tg(expr) => write!(f, "tan({})", expr),
            Expr::ctg(expr) => write!(f, "cot({})", expr),
            Expr::arcsin(expr) => write!(f, "arcsin({})", expr),
            Expr::arccos(expr) => write!(f, "arccos({})", expr),
            Expr::arctg(expr) => write!(f, "arctan({})", expr),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Creates exponential function e^(self).
    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    /// Creates natural logarithm ln(self).
    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    /// Creates absolute value |self|.
    pub fn abs(self) -> Expr {
        Expr::Abs(self.boxed())
    }

    /// Creates power expression self^rhs.
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// Checks if expression is exactly zero (constant 0.0).
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    /// Checks if expression is exactly one (constant 1.0).
    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    /// Rebuilds this node with every direct child replaced by `f(child)`.
    /// Leaves (`Var`, `Const`, `Pi`, `E`) are returned unchanged.
    pub fn map_args<F: Fn(&Expr) -> Expr>(&self, f: F) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) | Expr::Pi | Expr::E => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(Box::new(f(lhs)), Box::new(f(rhs))),
            Expr::Sub(lhs, rhs) => Expr::Sub(Box::new(f(lhs)), Box::new(f(rhs))),
            Expr::Mul(lhs, rhs) => Expr::Mul(Box::new(f(lhs)), Box::new(f(rhs))),
            Expr::Div(lhs, rhs) => Expr::Div(Box::new(f(lhs)), Box::new(f(rhs))),
            Expr::Pow(base, exp) => Expr::Pow(Box::new(f(base)), Box::new(f(exp))),
            Expr::Exp(expr) => Expr::Exp(Box::new(f(expr))),
            Expr::Ln(expr) => Expr::Ln(Box::new(f(expr))),
            Expr::Abs(expr) => Expr::Abs(Box::new(f(expr))),
            Expr::sin(expr) => Expr::sin(Box::new(f(expr))),
            Expr::cos(expr) => Expr::cos(Box::new(f(expr))),
            Expr::tg(expr) => Expr::tg(Box::new(f(expr))),
            Expr::ctg(expr) => Expr::ctg(Box::new(f(expr))),
            Expr::arcsin(expr) => Expr::arcsin(Box::new(f(expr))),
            Expr::arccos(expr) => Expr::arccos(Box::new(f(expr))),
            Expr::arctg(expr) => Expr::arctg(Box::new(f(expr))),
        }
    }

    /// Direct children of this node, left to right.
    pub fn args(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_) | Expr::Const(_) | Expr::Pi | Expr::E => Vec::new(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::Abs(expr)
            | Expr::sin(expr)
            | Expr::cos(expr)
            | Expr::tg(expr)
            | Expr::ctg(expr)
            | Expr::arcsin(expr)
            | Expr::arccos(expr)
            | Expr::arctg(expr) => vec![expr.as_ref()],
        }
    }

    /// Substitutes multiple variables with constant values.
    pub fn set_variable_from_map(&self, var_map: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) => match var_map.get(name) {
                Some(value) => Expr::Const(*value),
                None => self.clone(),
            },
            _ => self.map_args(|arg| arg.set_variable_from_map(var_map)),
        }
    }

    /// substitute a variable with an expression
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            _ => self.map_args(|arg| arg.substitute_variable(var, expr)),
        }
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            _ => self.args().iter().any(|arg| arg.contains_variable(var_name)),
        }
    }

    /// true when the expression has no variables at all (constants, `pi`, `e` only)
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Var(_) => false,
            _ => self.args().iter().all(|arg| arg.is_constant()),
        }
    }
}

//___________________________________MACROS____________________________________

/// Macro to create symbolic variables from a comma-separated list
/// Usage: symbols!(x, y) -> creates variables x, y
#[macro_export]
macro_rules! symbols {
    ($($var:ident),+ $(,)?) => {
        {
            ($(
                $crate::symbolic::symbolic_engine::Expr::Var(stringify!($var).to_string())
            ),+)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_minimal_brackets() {
        let x = Expr::Var("x".to_string());
        let expr = x.clone().pow(Expr::Const(3.0)) / Expr::Const(3.0)
            - Expr::Const(2.0) * (x.clone() + Expr::Const(1.0));
        assert_eq!(expr.to_string(), "x^3 / 3 - 2 * (x + 1)");
    }

    #[test]
    fn test_display_negation_and_constants() {
        let x = Expr::Var("x".to_string());
        assert_eq!((-Expr::cos(x.clone().boxed())).to_string(), "-cos(x)");
        assert_eq!((Expr::Pi / Expr::Const(2.0)).to_string(), "pi / 2");
        assert_eq!(x.clone().pow(Expr::Const(-1.0)).to_string(), "x^(-1)");
        assert_eq!((x.clone() - (x.clone() - Expr::E)).to_string(), "x - (x - e)");
        let scaled = Expr::Const(-15.0) * Expr::cos(x.clone().boxed());
        assert_eq!(scaled.to_string(), "-15 * cos(x)");
        assert_eq!((x.clone() - scaled).to_string(), "x - (-15 * cos(x))");
    }

    #[test]
    fn test_substitute_variable_inside_functions() {
        let x = Expr::Var("x".to_string());
        let expr = Expr::sin(Box::new(x.clone() * Expr::Const(2.0)));
        let substituted = expr.substitute_variable("x", &Expr::Pi);
        assert_eq!(
            substituted,
            Expr::sin(Box::new(Expr::Pi * Expr::Const(2.0)))
        );
        assert!(!substituted.contains_variable("x"));
        assert!(substituted.is_constant());
    }

    #[test]
    fn test_set_variable_from_map() {
        let (x, y) = symbols!(x, y);
        let expr = x.clone() + y.clone();
        let mut map = HashMap::new();
        map.insert("x".to_string(), 1.0);
        assert_eq!(
            expr.set_variable_from_map(&map),
            Expr::Const(1.0) + Expr::Var("y".to_string())
        );
    }
}
