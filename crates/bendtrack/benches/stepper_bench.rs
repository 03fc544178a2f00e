//! Criterion benchmarks for the dipole advancer, one group per step mode.
//! Bunches are drawn from a fixed seed so runs are comparable.

use bendtrack::api::{
    sample_bunch, BunchCfg, DipoleAdvancer, ParticleState, StepMode, TrackingCfg, UniformField,
};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use nalgebra::Vector3;

fn bench_modes(c: &mut Criterion) {
    let adv = DipoleAdvancer::new(TrackingCfg::default(), UniformField::dipole(1.2), 1.0);
    let bunch = sample_bunch(&BunchCfg::default(), 256, 42).unwrap();
    assert!(bunch.iter().all(|s| adv.mode_for(s) == StepMode::Helix));

    let mut group = c.benchmark_group("advance");
    group.bench_function("helix_bunch", |b| {
        b.iter(|| {
            for s in &bunch {
                black_box(adv.advance(black_box(s), 0.05));
            }
        })
    });

    let transverse = ParticleState::new(Vector3::zeros(), Vector3::x(), 1.0);
    group.bench_function("runge_kutta", |b| {
        b.iter(|| adv.advance(black_box(&transverse), 0.05))
    });

    let soft = ParticleState::new(Vector3::zeros(), Vector3::z(), 1e-4);
    group.bench_function("spiralling", |b| {
        b.iter(|| adv.advance(black_box(&soft), 0.05))
    });

    group.bench_function("drive_1m", |b| {
        b.iter_batched(
            || bunch[0],
            |s| bendtrack::api::drive(&adv, s, 1.0, 0.01),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_modes);
criterion_main!(benches);
