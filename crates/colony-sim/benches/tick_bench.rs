//! Criterion benchmarks for the colony tick pipeline.
//!
//! Three benchmark groups:
//! - `landing`: a freshly founded colony with its wreckage field
//! - `developed`: ~300 staffed buildings across the grid
//! - `serialization`: save and load of the developed colony

use colony_core::registry::BuildingKind;
use colony_sim::Colony;
use colony_sim::test_utils::*;
use criterion::{criterion_group, criterion_main, Criterion};

// ===========================================================================
// Colony builders
// ===========================================================================

/// Rows of solar panels alternating with staffed miners and drills, plus
/// enough homes and storage to keep settlers and capacity busy.
fn build_developed_colony() -> Colony {
    let mut colony = Colony::standard(42);
    let kinds = [
        BuildingKind::Solar,
        BuildingKind::Miner,
        BuildingKind::Solar,
        BuildingKind::OilDrill,
        BuildingKind::Solar,
        BuildingKind::Greenhouse,
        BuildingKind::Storage,
        BuildingKind::Home,
    ];

    let mut staffed = Vec::new();
    for y in (0..50).step_by(3) {
        for x in (0..50).step_by(3) {
            if colony.building_at(x, y).is_some() {
                continue;
            }
            let kind = kinds[((x + y) as usize / 3) % kinds.len()];
            build_instant(&mut colony, x, y, kind);
            if colony.registry().building(kind).requires_staff {
                staffed.push((x, y));
            }
        }
    }

    let crew = add_settlers(&mut colony, staffed.len());
    for (s, (x, y)) in crew.into_iter().zip(staffed) {
        station(&mut colony, s, x, y);
    }

    // Warm up so batteries, counters and events are populated.
    run_ticks(&mut colony, 10);
    colony.drain_events();
    colony
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_landing(c: &mut Criterion) {
    let mut group = c.benchmark_group("landing");
    group.sample_size(50);

    let mut colony = Colony::standard(7);

    group.bench_function("founded_colony_tick", |b| {
        b.iter(|| {
            colony.advance_tick();
            colony.drain_events();
        });
    });

    group.finish();
}

fn bench_developed(c: &mut Criterion) {
    let mut group = c.benchmark_group("developed");
    group.sample_size(30);

    let mut colony = build_developed_colony();

    group.bench_function("300_buildings_tick", |b| {
        b.iter(|| {
            colony.advance_tick();
            colony.drain_events();
        });
    });

    group.bench_function("300_buildings_settler_frame", |b| {
        b.iter(|| {
            colony.update_settlers(1.0 / 60.0);
        });
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");
    group.sample_size(30);

    let colony = build_developed_colony();

    group.bench_function("serialize_developed", |b| {
        b.iter(|| {
            colony.serialize().unwrap();
        });
    });

    let data = colony.serialize().unwrap();
    group.bench_function("deserialize_developed", |b| {
        b.iter(|| {
            Colony::deserialize(&data).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_landing, bench_developed, bench_serialization);
criterion_main!(benches);
