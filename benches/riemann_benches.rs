use RustedRiemann::numerical::Riemann_sums::{SampleGrid, all_methods};
use RustedRiemann::numerical::definite_integral::IntegralSpec;
use RustedRiemann::symbolic::symbolic_engine::Expr;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_all_methods_lambdified(c: &mut Criterion) {
    let expr = Expr::parse_expression("x^2 * exp(-x) + sin(3*x)").unwrap();
    let f = expr.lambdify1D("x").unwrap();
    let grid = SampleGrid::new(0.0, 10.0, 10_000).unwrap();
    c.bench_function("five rules, n = 10000", |b| {
        b.iter(|| all_methods(black_box(&grid), f.as_ref()))
    });
}

fn bench_report(c: &mut Criterion) {
    let spec = IntegralSpec::new("x * exp(x) + 1/(1 + x^2)", "x", "0", "1", 100).unwrap();
    c.bench_function("full report with exact value", |b| {
        b.iter(|| black_box(&spec).report())
    });
}

criterion_group!(benches, bench_all_methods_lambdified, bench_report);
criterion_main!(benches);
