use crate::symbolic::symbolic_engine::Expr;

/// Flattened evaluation tree: variables are resolved to argument positions once,
/// so evaluating the closure never looks up names.
#[derive(Clone, Debug)]
pub enum Lambda {
    Var(usize),
    Const(f64),
    Add(Box<Lambda>, Box<Lambda>),
    Sub(Box<Lambda>, Box<Lambda>),
    Mul(Box<Lambda>, Box<Lambda>),
    Div(Box<Lambda>, Box<Lambda>),
    Pow(Box<Lambda>, Box<Lambda>),
    Exp(Box<Lambda>),
    Ln(Box<Lambda>),
    Abs(Box<Lambda>),
    Sin(Box<Lambda>),
    Cos(Box<Lambda>),
    Tg(Box<Lambda>),
    Ctg(Box<Lambda>),
    ArcSin(Box<Lambda>),
    ArcCos(Box<Lambda>),
    ArcTg(Box<Lambda>),
}

impl Expr {
    /// LAMBDIFICATION - Converting Symbolic Expressions to Executable Functions

    /// Single-variable closure. A constant expression yields a constant function,
    /// any free symbol other than `var` is an error.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let f = Expr::parse_expression("x^2").unwrap().lambdify1D("x").unwrap();
    /// assert_eq!(f(3.0), 9.0);
    /// ```
    pub fn lambdify1D(&self, var: &str) -> Result<Box<dyn Fn(f64) -> f64 + Send + Sync>, String> {
        let compiled = self.compile(&[var])?;
        Ok(Box::new(move |x: f64| compiled.eval(&[x])))
    }

    pub fn compile(&self, vars: &[&str]) -> Result<Lambda, String> {
        let unary = |e: &Expr, wrap: fn(Box<Lambda>) -> Lambda| -> Result<Lambda, String> {
            Ok(wrap(Box::new(e.compile(vars)?)))
        };
        let binary = |a: &Expr,
                      b: &Expr,
                      wrap: fn(Box<Lambda>, Box<Lambda>) -> Lambda|
         -> Result<Lambda, String> {
            Ok(wrap(Box::new(a.compile(vars)?), Box::new(b.compile(vars)?)))
        };
        match self {
            Expr::Var(name) => vars
                .iter()
                .position(|&v| v == name)
                .map(Lambda::Var)
                .ok_or_else(|| format!("unknown variable '{}', expected one of {:?}", name, vars)),
            Expr::Const(v) => Ok(Lambda::Const(*v)),
            Expr::Pi => Ok(Lambda::Const(std::f64::consts::PI)),
            Expr::E => Ok(Lambda::Const(std::f64::consts::E)),
            Expr::Add(a, b) => binary(a, b, Lambda::Add),
            Expr::Sub(a, b) => binary(a, b, Lambda::Sub),
            Expr::Mul(a, b) => binary(a, b, Lambda::Mul),
            Expr::Div(a, b) => binary(a, b, Lambda::Div),
            Expr::Pow(a, b) => binary(a, b, Lambda::Pow),
            Expr::Exp(e) => unary(e, Lambda::Exp),
            Expr::Ln(e) => unary(e, Lambda::Ln),
            Expr::Abs(e) => unary(e, Lambda::Abs),
            Expr::sin(e) => unary(e, Lambda::Sin),
            Expr::cos(e) => unary(e, Lambda::Cos),
            Expr::tg(e) => unary(e, Lambda::Tg),
            Expr::ctg(e) => unary(e, Lambda::Ctg),
            Expr::arcsin(e) => unary(e, Lambda::ArcSin),
            Expr::arccos(e) => unary(e, Lambda::ArcCos),
            Expr::arctg(e) => unary(e, Lambda::ArcTg),
        }
    }
}

impl Lambda {
    #[inline(always)]
    pub fn eval(&self, args: &[f64]) -> f64 {
        match self {
            Lambda::Var(i) => args[*i],
            Lambda::Const(v) => *v,
            Lambda::Add(a, b) => a.eval(args) + b.eval(args),
            Lambda::Sub(a, b) => a.eval(args) - b.eval(args),
            Lambda::Mul(a, b) => a.eval(args) * b.eval(args),
            Lambda::Div(a, b) => a.eval(args) / b.eval(args),
            Lambda::Pow(a, b) => a.eval(args).powf(b.eval(args)),
            Lambda::Exp(e) => e.eval(args).exp(),
            Lambda::Ln(e) => e.eval(args).ln(),
            Lambda::Abs(e) => e.eval(args).abs(),
            Lambda::Sin(e) => e.eval(args).sin(),
            Lambda::Cos(e) => e.eval(args).cos(),
            Lambda::Tg(e) => e.eval(args).tan(),
            Lambda::Ctg(e) => 1.0 / e.eval(args).tan(),
            Lambda::ArcSin(e) => e.eval(args).asin(),
            Lambda::ArcCos(e) => e.eval(args).acos(),
            Lambda::ArcTg(e) => e.eval(args).atan(),
        }
    }
}
