use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use refinery_sim::core::config::SimulatorConfig;
use refinery_sim::simulation::{SimulationEngine, SimulationState};

fn bench_tick(c: &mut Criterion) {
    let state = SimulationState::with_rng(SimulatorConfig::default(), ChaCha8Rng::seed_from_u64(42));
    let mut engine = SimulationEngine::new(state, 64);
    let mut rx = engine.subscribe();

    c.bench_function("tick_and_publish", |b| {
        b.iter(|| {
            engine.tick();
            while let Ok(message) = rx.try_recv() {
                black_box(message);
            }
        })
    });
}

fn bench_readings(c: &mut Criterion) {
    let mut state = SimulationState::with_rng(SimulatorConfig::default(), ChaCha8Rng::seed_from_u64(42));

    c.bench_function("advance_and_read", |b| {
        b.iter(|| {
            state.advance();
            black_box(state.readings_at(0))
        })
    });
}

criterion_group!(benches, bench_tick, bench_readings);
criterion_main!(benches);
