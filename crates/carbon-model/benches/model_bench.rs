use carbon_core::Lever;
use carbon_model::EmissionsModel;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn mixed_model() -> EmissionsModel {
    let mut model = EmissionsModel::new();
    for (i, lever) in Lever::ALL.iter().enumerate() {
        model.set_lever(*lever, (i % 4) as i64 + 1);
    }
    model
}

fn bench_report(c: &mut Criterion) {
    let model = mixed_model();
    c.bench_function("report 24 levers", |b| {
        b.iter(|| black_box(model.report()))
    });
}

fn bench_slider_sweep(c: &mut Criterion) {
    c.bench_function("slider sweep wind 1..=4", |b| {
        b.iter(|| {
            let mut model = mixed_model();
            for level in 1..=4 {
                model.set_lever(Lever::Wind, black_box(level));
                black_box(model.total_emissions());
            }
        })
    });
}

criterion_group!(benches, bench_report, bench_slider_sweep);
criterion_main!(benches);
