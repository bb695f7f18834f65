use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{
    brackets_balanced, find_char_positions_outside_brackets, find_pair_to_this_bracket,
    find_rightmost_operator_outside_brackets, is_identifier, is_wrapped_in_brackets,
};
use log::debug;
/// a module turns a String expression into a symbolic expression
///# Example
/// ```
/// use RustedRiemann::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("5*sin(x/3) + x**2").unwrap();
/// let f = parsed_expression.lambdify1D("x").unwrap();
/// assert!((f(0.0) - 0.0).abs() < 1e-12);
/// ```
//                  search recursion diagram
//                "x^2+exp(x)-ln(x)/y"
//                |     left        | right    |
//                |___________________________ |
//                |   split by rightmost + or -|
//                |____________________________|
//                |  x^2+exp(x) |   ln(x)/y    |
//                |     |       |      |       |
//                |    \|/      |     \|/      |
//                | split by +  |  split by /  |
//                |  x^2 exp(x) |  ln(x)   y   |
//                |    \|/      |              |
//                | split by ^  |              |
//                  etc...
// Names that may not be used as variables.
pub const RESERVED_NAMES: [&str; 24] = [
    "pi", "e", "exp", "ln", "log", "sin", "cos", "tan", "tg", "cot", "ctg", "asin", "arcsin",
    "acos", "arccos", "atan", "arctan", "arctg", "sqrt", "abs", "inf", "nan", "E", "PI",
];

/// entry point: normalizes the string and runs the recursive descent
pub fn parse_expression_func(input: &str) -> Result<Expr, String> {
    if !input.is_ascii() {
        return Err(format!("unsupported characters in expression '{}'", input));
    }
    let normalized = input.replace("**", "^");
    if !brackets_balanced(&normalized) {
        return Err(format!("unbalanced brackets in expression '{}'", input));
    }
    let parsed = parse_recursive(&normalized)?;
    debug!("parsed '{}' into {}", input, parsed);
    Ok(parsed)
}

fn parse_recursive(input: &str) -> Result<Expr, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty expression".to_string());
    }
    if is_wrapped_in_brackets(input) {
        return parse_recursive(&input[1..input.len() - 1]);
    }
    // lowest precedence first: the rightmost operator becomes the root
    if let Some((pos, op)) = find_rightmost_operator_outside_brackets(input, &['+', '-']) {
        let left = parse_recursive(&input[..pos])?;
        let right = parse_recursive(&input[pos + 1..])?;
        return Ok(match op {
            '+' => left + right,
            _ => left - right,
        });
    }
    if let Some((pos, op)) = find_rightmost_operator_outside_brackets(input, &['*', '/']) {
        let left = parse_recursive(&input[..pos])?;
        let right = parse_recursive(&input[pos + 1..])?;
        return Ok(match op {
            '*' => left * right,
            _ => left / right,
        });
    }
    if let Some(rest) = input.strip_prefix('-') {
        return Ok(match parse_recursive(rest)? {
            Expr::Const(val) => Expr::Const(-val),
            other => -other,
        });
    }
    if let Some(rest) = input.strip_prefix('+') {
        return parse_recursive(rest);
    }
    // leftmost '^' so that 2^3^2 = 2^(3^2)
    if let Some(pos) = find_char_positions_outside_brackets(input, '^') {
        let base = parse_recursive(&input[..pos])?;
        let exponent = parse_recursive(&input[pos + 1..])?;
        return Ok(base.pow(exponent));
    }
    if let Some(bracket_start) = input.find('(') {
        return parse_function_call(input, bracket_start);
    }
    parse_atom(input)
}

fn parse_function_call(input: &str, bracket_start: usize) -> Result<Expr, String> {
    let name = input[..bracket_start].trim();
    match find_pair_to_this_bracket(input, bracket_start) {
        Some(end) if end == input.len() - 1 => {}
        _ => return Err(format!("cannot parse '{}'", input)),
    }
    let arg = parse_recursive(&input[bracket_start + 1..input.len() - 1])?.boxed();
    let func = match name {
        "exp" => Expr::Exp(arg),
        "ln" | "log" => Expr::Ln(arg),
        "sin" => Expr::sin(arg),
        "cos" => Expr::cos(arg),
        "tan" | "tg" => Expr::tg(arg),
        "cot" | "ctg" => Expr::ctg(arg),
        "asin" | "arcsin" => Expr::arcsin(arg),
        "acos" | "arccos" => Expr::arccos(arg),
        "atan" | "arctan" | "arctg" => Expr::arctg(arg),
        "sqrt" => Expr::Pow(arg, Box::new(Expr::Const(0.5))),
        "abs" => Expr::Abs(arg),
        "" => return Err(format!("cannot parse '{}'", input)),
        other => return Err(format!("unknown function '{}'", other)),
    };
    Ok(func)
}

fn parse_atom(input: &str) -> Result<Expr, String> {
    match input {
        "pi" | "PI" => return Ok(Expr::Pi),
        "e" | "E" => return Ok(Expr::E),
        _ => {}
    }
    if input.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return input
            .parse::<f64>()
            .map(Expr::Const)
            .map_err(|_| format!("invalid number '{}'", input));
    }
    if is_identifier(input) {
        if RESERVED_NAMES.contains(&input) {
            return Err(format!("'{}' is a function name, not a variable", input));
        }
        return Ok(Expr::Var(input.to_string()));
    }
    Err(format!("cannot parse '{}'", input))
}

impl Expr {
    /// Parses a string like `x^2 + 5*sin(x/3)` into an expression tree.
    /// Both `^` and `**` denote the power.
    pub fn parse_expression(input: &str) -> Result<Expr, String> {
        parse_expression_func(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x() -> Expr {
        Expr::Var("x".to_string())
    }

    #[test]
    fn test_precedence() {
        let parsed = Expr::parse_expression("1+2*x^2").unwrap();
        assert_eq!(
            parsed,
            Expr::Const(1.0) + Expr::Const(2.0) * x().pow(Expr::Const(2.0))
        );
    }

    #[test]
    fn test_double_star_power() {
        assert_eq!(
            Expr::parse_expression("x**2").unwrap(),
            Expr::parse_expression("x^2").unwrap()
        );
    }

    #[test]
    fn test_left_associative_minus_and_division() {
        let parsed = Expr::parse_expression("x-1-2").unwrap();
        assert_eq!(parsed, (x() - Expr::Const(1.0)) - Expr::Const(2.0));
        let parsed = Expr::parse_expression("x/2/4").unwrap();
        assert_eq!(parsed, (x() / Expr::Const(2.0)) / Expr::Const(4.0));
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(
            Expr::parse_expression("-x^2").unwrap(),
            -(x().pow(Expr::Const(2.0)))
        );
        assert_eq!(Expr::parse_expression("-3").unwrap(), Expr::Const(-3.0));
        assert_eq!(
            Expr::parse_expression("2*-x").unwrap(),
            Expr::Const(2.0) * -x()
        );
        assert_eq!(
            Expr::parse_expression("x^-1").unwrap(),
            x().pow(Expr::Const(-1.0))
        );
    }

    #[test]
    fn test_power_right_associative() {
        let parsed = Expr::parse_expression("2^3^2").unwrap();
        assert_eq!(
            parsed,
            Expr::Const(2.0).pow(Expr::Const(3.0).pow(Expr::Const(2.0)))
        );
    }

    #[test]
    fn test_functions_and_constants() {
        let parsed = Expr::parse_expression("5*sin(x/3) + x").unwrap();
        assert_eq!(
            parsed,
            Expr::Const(5.0) * Expr::sin(Box::new(x() / Expr::Const(3.0))) + x()
        );
        assert_eq!(Expr::parse_expression("pi/2").unwrap(), Expr::Pi / Expr::Const(2.0));
        assert_eq!(Expr::parse_expression("e").unwrap(), Expr::E);
        assert_eq!(
            Expr::parse_expression("sqrt(x)").unwrap(),
            x().pow(Expr::Const(0.5))
        );
        assert_eq!(Expr::parse_expression("tan(x)").unwrap(), Expr::tg(x().boxed()));
    }

    #[test]
    fn test_scientific_notation() {
        match Expr::parse_expression("2.5e-3*x").unwrap() {
            Expr::Mul(lhs, _) => match *lhs {
                Expr::Const(val) => assert_relative_eq!(val, 2.5e-3),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nested_brackets() {
        let parsed = Expr::parse_expression("((x+1))*(x-(2))").unwrap();
        assert_eq!(
            parsed,
            (x() + Expr::Const(1.0)) * (x() - Expr::Const(2.0))
        );
    }

    #[test]
    fn test_errors() {
        assert!(Expr::parse_expression("").is_err());
        assert!(Expr::parse_expression("x+").is_err());
        assert!(Expr::parse_expression("(x+1").is_err());
        assert!(Expr::parse_expression("foo(x)").is_err());
        assert!(Expr::parse_expression("x $ 2").is_err());
        assert!(Expr::parse_expression("1.2.3").is_err());
        assert!(Expr::parse_expression("sin").is_err());
        assert!(Expr::parse_expression("x²").is_err());
    }
}
