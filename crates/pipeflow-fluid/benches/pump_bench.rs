//! Criterion benchmarks for network discovery and pump ticks.

use criterion::{Criterion, criterion_group, criterion_main};
use pipeflow_core::config::PumpConfig;
use pipeflow_core::fluid::FluidTank;
use pipeflow_core::pos::{BlockPos, Direction};
use pipeflow_core::test_utils::*;
use pipeflow_fluid::{Network, PipeRegistry, PumpModule};

const PUMP: BlockPos = BlockPos::new(1, 0, 0);

/// A 256-pipe run with a tank hanging under every fourth pipe.
fn long_run() -> TestWorld {
    let mut world = TestWorld::new();
    let pipes = pump_line(&mut world, PUMP, Direction::East, u32::MAX / 2, 256);
    for pipe in pipes.iter().step_by(4) {
        world.set_tank(pipe.relative(Direction::Down), FluidTank::new(1_000_000));
    }
    world
}

fn bench_pump(c: &mut Criterion) {
    let mut group = c.benchmark_group("pump");
    group.sample_size(50);

    group.bench_function("discover_256_pipes", |b| {
        let world = long_run();
        b.iter(|| {
            let mut registry = PipeRegistry::new();
            Network::discover(&world, PUMP, &mut registry)
        });
    });

    group.bench_function("tick_64_consumers", |b| {
        let mut world = long_run();
        let mut module = PumpModule::with_config(PumpConfig::new(1000).unwrap()).unwrap();
        module.add_pump(PUMP).unwrap();
        b.iter(|| module.tick(&mut world));
    });

    group.bench_function("rebuild_after_invalidate", |b| {
        let mut world = long_run();
        let mut module = PumpModule::new();
        module.add_pump(PUMP).unwrap();
        module.tick(&mut world);
        b.iter(|| {
            module.on_pipe_changed(BlockPos::new(100, 0, 0));
            module.tick(&mut world)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pump);
criterion_main!(benches);
