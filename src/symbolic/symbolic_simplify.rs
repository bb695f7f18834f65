//! # Symbolic Expression Simplification Module
//!
//! Bottom-up rewriting of expression trees until a fixed point is reached.
//!
//! ## Simplification Strategy
//!
//! 1. **Constant Folding**: arithmetic on numeric constants is evaluated when the
//!    result is finite; `pi` and `e` stay symbolic
//! 2. **Algebraic Identities**: x + 0 = x, x * 1 = x, x - x = 0, x^1 = x, 0 / x = 0
//! 3. **Sign Normalization**: x + (-1 * y) = x - y, x - (-c) = x + c
//! 4. **Exact Special Values**: sin(k*pi), cos(k*pi/2), ln(e), exp(ln(x)), trig at 0
//!
//! Exact definite values go through this module twice: first the substituted
//! antiderivative is simplified, then a purely numeric result is displayed as a
//! fraction when it has a small denominator (`rational_approximation`).

use crate::symbolic::symbolic_engine::Expr;
use num::rational::Rational64;

/// Largest denominator accepted when a float is displayed as a fraction.
pub const MAX_DENOMINATOR: i64 = 10_000;
const MAX_PASSES: usize = 16;

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Simplifies the expression by repeated bottom-up passes.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let expr = Expr::parse_expression("0*x + 1*(x^1) - 0").unwrap();
    /// assert_eq!(expr.simplify(), Expr::Var("x".to_string()));
    /// ```
    pub fn simplify(&self) -> Expr {
        let mut current = self.clone();
        for _ in 0..MAX_PASSES {
            let next = current.simplify_once();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn simplify_once(&self) -> Expr {
        let node = self.map_args(|arg| arg.simplify_once());
        if let Some(folded) = node.fold_numbers() {
            return folded;
        }
        match node {
            Expr::Add(lhs, rhs) => simplify_add(*lhs, *rhs),
            Expr::Sub(lhs, rhs) => simplify_sub(*lhs, *rhs),
            Expr::Mul(lhs, rhs) => simplify_mul(*lhs, *rhs),
            Expr::Div(lhs, rhs) => simplify_div(*lhs, *rhs),
            Expr::Pow(base, exp) => simplify_pow(*base, *exp),
            Expr::Exp(arg) => match *arg {
                Expr::Const(c) if c == 0.0 => Expr::Const(1.0),
                Expr::Const(c) if c == 1.0 => Expr::E,
                Expr::Ln(inner) => *inner,
                other => Expr::Exp(other.boxed()),
            },
            Expr::Ln(arg) => match *arg {
                Expr::Const(c) if c == 1.0 => Expr::Const(0.0),
                Expr::E => Expr::Const(1.0),
                Expr::Exp(inner) => *inner,
                other => Expr::Ln(other.boxed()),
            },
            Expr::Abs(arg) => match *arg {
                Expr::Const(c) => Expr::Const(c.abs()),
                Expr::Pi => Expr::Pi,
                Expr::E => Expr::E,
                other => Expr::Abs(other.boxed()),
            },
            Expr::sin(arg) => match pi_multiple(&arg) {
                Some(q) if is_multiple_of(q, 1.0) => Expr::Const(0.0),
                Some(q) if is_multiple_of(q - 0.5, 2.0) => Expr::Const(1.0),
                Some(q) if is_multiple_of(q + 0.5, 2.0) => Expr::Const(-1.0),
                Some(q) if is_multiple_of(q - 1.0 / 6.0, 2.0) || is_multiple_of(q - 5.0 / 6.0, 2.0) => {
                    Expr::Const(0.5)
                }
                Some(q) if is_multiple_of(q + 1.0 / 6.0, 2.0) || is_multiple_of(q + 5.0 / 6.0, 2.0) => {
                    Expr::Const(-0.5)
                }
                _ => Expr::sin(arg),
            },
            Expr::cos(arg) => match pi_multiple(&arg) {
                Some(q) if is_multiple_of(q - 0.5, 1.0) => Expr::Const(0.0),
                Some(q) if is_multiple_of(q, 2.0) => Expr::Const(1.0),
                Some(q) if is_multiple_of(q - 1.0, 2.0) => Expr::Const(-1.0),
                Some(q) if is_multiple_of(q - 1.0 / 3.0, 2.0) || is_multiple_of(q + 1.0 / 3.0, 2.0) => {
                    Expr::Const(0.5)
                }
                Some(q) if is_multiple_of(q - 2.0 / 3.0, 2.0) || is_multiple_of(q + 2.0 / 3.0, 2.0) => {
                    Expr::Const(-0.5)
                }
                _ => Expr::cos(arg),
            },
            Expr::tg(arg) => match pi_multiple(&arg) {
                Some(q) if is_multiple_of(q, 1.0) => Expr::Const(0.0),
                Some(q) if is_multiple_of(q - 0.25, 1.0) => Expr::Const(1.0),
                Some(q) if is_multiple_of(q + 0.25, 1.0) => Expr::Const(-1.0),
                _ => Expr::tg(arg),
            },
            Expr::ctg(arg) => match pi_multiple(&arg) {
                Some(q) if is_multiple_of(q - 0.5, 1.0) => Expr::Const(0.0),
                Some(q) if is_multiple_of(q - 0.25, 1.0) => Expr::Const(1.0),
                Some(q) if is_multiple_of(q + 0.25, 1.0) => Expr::Const(-1.0),
                _ => Expr::ctg(arg),
            },
            Expr::arcsin(arg) => match *arg {
                Expr::Const(c) if c == 0.0 => Expr::Const(0.0),
                Expr::Const(c) if c == 1.0 => Expr::Pi / Expr::Const(2.0),
                Expr::Const(c) if c == -1.0 => -(Expr::Pi / Expr::Const(2.0)),
                other => Expr::arcsin(other.boxed()),
            },
            Expr::arccos(arg) => match *arg {
                Expr::Const(c) if c == 1.0 => Expr::Const(0.0),
                Expr::Const(c) if c == 0.0 => Expr::Pi / Expr::Const(2.0),
                Expr::Const(c) if c == -1.0 => Expr::Pi,
                other => Expr::arccos(other.boxed()),
            },
            Expr::arctg(arg) => match *arg {
                Expr::Const(c) if c == 0.0 => Expr::Const(0.0),
                Expr::Const(c) if c == 1.0 => Expr::Pi / Expr::Const(4.0),
                Expr::Const(c) if c == -1.0 => -(Expr::Pi / Expr::Const(4.0)),
                other => Expr::arctg(other.boxed()),
            },
            other => other,
        }
    }

    /// arithmetic node whose operands are both plain numbers
    fn fold_numbers(&self) -> Option<Expr> {
        let (a, b) = match self {
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => match (lhs.as_ref(), rhs.as_ref()) {
                (Expr::Const(a), Expr::Const(b)) => (*a, *b),
                _ => return None,
            },
            _ => return None,
        };
        let value = match self {
            Expr::Add(_, _) => a + b,
            Expr::Sub(_, _) => a - b,
            Expr::Mul(_, _) => a * b,
            Expr::Div(_, _) => a / b,
            _ => a.powf(b),
        };
        value.is_finite().then_some(Expr::Const(value))
    }
}

fn simplify_add(lhs: Expr, rhs: Expr) -> Expr {
    match (lhs, rhs) {
        (lhs, rhs) if lhs.is_zero() => rhs,
        (lhs, rhs) if rhs.is_zero() => lhs,
        (lhs, Expr::Mul(c, y)) if *c == Expr::Const(-1.0) => Expr::Sub(lhs.boxed(), y),
        (lhs, Expr::Const(c)) if c < 0.0 => Expr::Sub(lhs.boxed(), Box::new(Expr::Const(-c))),
        (Expr::Mul(c, y), rhs) if *c == Expr::Const(-1.0) => Expr::Sub(rhs.boxed(), y),
        (Expr::Add(a, b), Expr::Const(c2)) => match *b {
            Expr::Const(c1) => simplify_add(*a, Expr::Const(c1 + c2)),
            b => Expr::Add(Box::new(Expr::Add(a, b.boxed())), Box::new(Expr::Const(c2))),
        },
        (lhs, rhs) if lhs == rhs => Expr::Const(2.0) * lhs,
        (lhs, rhs) => Expr::Add(lhs.boxed(), rhs.boxed()),
    }
}

fn simplify_sub(lhs: Expr, rhs: Expr) -> Expr {
    match (lhs, rhs) {
        (lhs, rhs) if rhs.is_zero() => lhs,
        (lhs, rhs) if lhs == rhs => Expr::Const(0.0),
        (lhs, rhs) if lhs.is_zero() => simplify_mul(Expr::Const(-1.0), rhs),
        (lhs, Expr::Mul(c, y)) if *c == Expr::Const(-1.0) => Expr::Add(lhs.boxed(), y),
        (lhs, Expr::Const(c)) if c < 0.0 => Expr::Add(lhs.boxed(), Box::new(Expr::Const(-c))),
        (Expr::Add(a, b), Expr::Const(c2)) => match *b {
            Expr::Const(c1) => simplify_add(*a, Expr::Const(c1 - c2)),
            b => Expr::Sub(Box::new(Expr::Add(a, b.boxed())), Box::new(Expr::Const(c2))),
        },
        (lhs, rhs) => Expr::Sub(lhs.boxed(), rhs.boxed()),
    }
}

fn simplify_mul(lhs: Expr, rhs: Expr) -> Expr {
    match (lhs, rhs) {
        (lhs, rhs) if lhs.is_zero() || rhs.is_zero() => Expr::Const(0.0),
        (lhs, rhs) if lhs.is_one() => rhs,
        (lhs, rhs) if rhs.is_one() => lhs,
        // constants go to the left
        (lhs, Expr::Const(c)) if !matches!(lhs, Expr::Const(_)) => simplify_mul(Expr::Const(c), lhs),
        (Expr::Const(c1), Expr::Mul(inner, y)) => match *inner {
            Expr::Const(c2) => simplify_mul(Expr::Const(c1 * c2), *y),
            inner => Expr::Mul(Box::new(Expr::Const(c1)), Box::new(Expr::Mul(inner.boxed(), y))),
        },
        (Expr::Const(c), Expr::Div(num, den)) if c == -1.0 => {
            match *num {
                Expr::Const(n) => Expr::Div(Box::new(Expr::Const(-n)), den),
                num => Expr::Mul(Box::new(Expr::Const(c)), Box::new(Expr::Div(num.boxed(), den))),
            }
        }
        (lhs, rhs) => Expr::Mul(lhs.boxed(), rhs.boxed()),
    }
}

fn simplify_div(lhs: Expr, rhs: Expr) -> Expr {
    match (lhs, rhs) {
        (lhs, rhs) if lhs.is_zero() && !rhs.is_zero() => Expr::Const(0.0),
        (lhs, rhs) if rhs.is_one() => lhs,
        (lhs, rhs) if lhs == rhs && !lhs.is_zero() => Expr::Const(1.0),
        (lhs, Expr::Const(c)) if c == -1.0 => simplify_mul(Expr::Const(-1.0), lhs),
        (lhs, rhs) => Expr::Div(lhs.boxed(), rhs.boxed()),
    }
}

fn simplify_pow(base: Expr, exp: Expr) -> Expr {
    match (base, exp) {
        (_, exp) if exp.is_zero() => Expr::Const(1.0),
        (base, exp) if exp.is_one() => base,
        (base, _) if base.is_one() => Expr::Const(1.0),
        (Expr::Pow(inner, e1), Expr::Const(e2)) => match *e1 {
            Expr::Const(e1) => Expr::Pow(inner, Box::new(Expr::Const(e1 * e2))),
            e1 => Expr::Pow(Box::new(Expr::Pow(inner, e1.boxed())), Box::new(Expr::Const(e2))),
        },
        (base, exp) => Expr::Pow(base.boxed(), exp.boxed()),
    }
}

/// `q` such that `arg == q * pi`, for arguments built from numbers and a single `pi`
fn pi_multiple(arg: &Expr) -> Option<f64> {
    match arg {
        Expr::Const(c) if *c == 0.0 => Some(0.0),
        Expr::Pi => Some(1.0),
        Expr::Mul(lhs, rhs) => match (lhs.as_ref(), rhs.as_ref()) {
            (Expr::Const(c), other) | (other, Expr::Const(c)) => pi_multiple(other).map(|q| q * c),
            _ => None,
        },
        Expr::Div(lhs, rhs) => match rhs.as_ref() {
            Expr::Const(c) if *c != 0.0 => pi_multiple(lhs).map(|q| q / c),
            _ => None,
        },
        Expr::Add(lhs, rhs) => Some(pi_multiple(lhs)? + pi_multiple(rhs)?),
        Expr::Sub(lhs, rhs) => Some(pi_multiple(lhs)? - pi_multiple(rhs)?),
        _ => None,
    }
}

fn is_multiple_of(value: f64, period: f64) -> bool {
    let k = value / period;
    (k - k.round()).abs() < 1e-12
}

/// Best fraction with denominator up to [`MAX_DENOMINATOR`] reproducing `value`
/// to 1e-12 relative accuracy.
pub fn rational_approximation(value: f64) -> Option<Rational64> {
    if !value.is_finite() || value.abs() > 1e12 {
        return None;
    }
    let tolerance = 1e-12 * value.abs().max(1.0);
    (1..=MAX_DENOMINATOR).find_map(|den| {
        let num = (value * den as f64).round();
        ((num / den as f64 - value).abs() <= tolerance)
            .then(|| Rational64::new(num as i64, den))
    })
}

/// Display of a numeric constant: `1/3`, `-2`, or the float itself.
pub fn pretty_constant(value: f64) -> String {
    match rational_approximation(value) {
        Some(r) if *r.denom() == 1 => format!("{}", r.numer()),
        Some(r) => format!("{}/{}", r.numer(), r.denom()),
        None => format!("{}", value),
    }
}
