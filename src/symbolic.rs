#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedRiemann::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("x**2 + 5*sin(x/3)").unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// let f = parsed_expression.lambdify1D("x").unwrap();
/// println!("f(1.0) = {}", f(1.0));
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) keeps the expression tree and its operators
/// 2) substitutes variables and bounds
/// 3) prints expressions with the minimal number of brackets
///# Example#
/// ```
/// use RustedRiemann::symbolic::symbolic_engine::Expr;
/// let expr = Expr::parse_expression("x^2").unwrap();
/// let at_pi = expr.substitute_variable("x", &Expr::Pi);
/// assert_eq!(at_pi.to_string(), "pi^2");
/// ```
pub mod symbolic_engine;
/// differentiation and direct evaluation
pub mod symbolic_engine_derivatives;
/// antiderivatives and exact definite values
///# Example
/// ```
/// use RustedRiemann::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("x^2").unwrap();
/// let exact = f.definite_integral("x", &Expr::Const(0.0), &Expr::Const(1.0));
/// assert_eq!(exact.to_string(), "1/3");
/// ```
pub mod symbolic_integration;
/// symbolic expression -> Rust closure
pub mod symbolic_lambdify;
/// constant folding and algebraic identities
pub mod symbolic_simplify;
pub mod utils;
