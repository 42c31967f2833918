use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vigil_core::{
    assemble, gate_skip_report, resolve_report, should_escalate, ClassifierState, OracleError,
    RoomProfile, SensorData,
};

fn bench_decision(c: &mut Criterion) {
    let profile = RoomProfile::default();
    let ctx = assemble(
        &profile,
        SensorData::default(),
        ClassifierState::FallLikely,
        0.6,
        "bench",
    )
    .unwrap();

    c.bench_function("gate", |b| {
        b.iter(|| should_escalate(black_box(&ctx), black_box(0.75)))
    });
    c.bench_function("gate_skip_report", |b| {
        b.iter(|| gate_skip_report(black_box(&ctx), black_box(0.75)))
    });
    c.bench_function("fallback_resolve", |b| {
        b.iter(|| resolve_report(Err(OracleError::Timeout)))
    });
}

criterion_group!(benches, bench_decision);
criterion_main!(benches);
