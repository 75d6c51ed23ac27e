use criterion::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use episim::prelude::*;
use episim::fetch_state;

fn library_model(id: &str) -> Model {
    let library = ModelLibrary::builtin();
    let validated = load_model(id, &library, &Validator::strict()).unwrap();
    Model::new(&validated)
}

fn closure_sir() -> impl OdeSystem {
    ClosureSystem::new("sir", &[("S", 990.0), ("I", 10.0), ("R", 0.0)], |x, dx| {
        fetch_state!(x, s, i, _r);
        let infection = 0.3 * s * i / 1000.0;
        dx[0] = -infection;
        dx[1] = infection - 0.1 * i;
        dx[2] = 0.1 * i;
    })
}

fn criterion_benchmark(c: &mut Criterion) {
    let sir = library_model("sir");
    let hiv = library_model("hiv_risk_groups");
    let closure = closure_sir();
    let year = SimulationConfig::with_horizon(365.0).unwrap();

    let x0 = sir.initial_state();
    c.bench_function("euler_step_sir", |b| {
        b.iter(|| euler_step(&sir, black_box(&x0), 0.1))
    });

    c.bench_function("simulate_sir_json", |b| {
        b.iter(|| simulate(&sir, black_box(year)))
    });
    c.bench_function("simulate_sir_closure", |b| {
        b.iter(|| simulate(&closure, black_box(year)))
    });
    c.bench_function("simulate_hiv_risk_groups", |b| {
        b.iter(|| simulate(&hiv, black_box(SimulationConfig::with_horizon(50.0).unwrap())))
    });

    let jobs: Vec<(&Model, SimulationConfig)> = (1..=8)
        .map(|k| (&sir, SimulationConfig::with_horizon(50.0 * k as f64).unwrap()))
        .collect();
    c.bench_function("simulate_many_sir", |b| b.iter(|| simulate_many(black_box(&jobs))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
