//! Headless colony run: found a colony, build a small base, let a few days
//! pass, then check that a save/load round trip stays in lockstep.
//!
//! Run with: `RUST_LOG=info cargo run -p colony-sim --example headless_runner`

use colony_core::registry::BuildingKind;
use colony_core::resource::Resource;
use colony_sim::{Colony, ColonyEvent};

const SEED: u64 = 2024;
const DAYS: u64 = 3;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut colony = Colony::standard(SEED);

    // A panel with a battery beside it, then a miner once iron allows.
    let orders = [
        (20, 20, BuildingKind::Solar),
        (21, 20, BuildingKind::Battery),
        (20, 22, BuildingKind::Miner),
    ];
    for (x, y, kind) in orders {
        if !colony.place_building(x, y, kind) {
            tracing::warn!(%kind, x, y, "placement refused");
        }
    }

    // Salvage the nearest wreckage for its loot.
    if let Some(wreck) = colony
        .buildings()
        .into_iter()
        .find(|b| b.kind == BuildingKind::Wreckage)
    {
        colony.salvage_wreckage(wreck.position.x, wreck.position.y);
    }

    let tick_ms = colony.config().tick_interval_ms;
    let day_length = colony.config().day_length;
    for day in 0..DAYS {
        for _ in 0..day_length {
            colony.advance(tick_ms);
            // Four presentation frames per tick.
            for _ in 0..4 {
                colony.update_settlers(tick_ms as f64 / 4000.0);
            }
        }

        for event in colony.drain_events() {
            match event {
                ColonyEvent::ConstructionCompleted { kind, position, tick } => {
                    tracing::info!(%kind, x = position.x, y = position.y, tick, "built");
                }
                ColonyEvent::PowerShortage { deficit, shed, tick } => {
                    tracing::info!(%deficit, shed, tick, "brownout");
                }
                _ => {}
            }
        }

        println!(
            "day {} | tick {} | power {} | iron {} | food {} | settlers {} | storm in {}",
            day + 1,
            colony.tick(),
            colony.power_balance(),
            colony.ledger().get(Resource::Iron),
            colony.ledger().get(Resource::Food),
            colony.settlers().len(),
            colony.storm_countdown(),
        );
    }

    let data = match colony.serialize() {
        Ok(data) => data,
        Err(err) => {
            eprintln!("save failed: {err}");
            return;
        }
    };
    let mut restored = match Colony::deserialize(&data) {
        Ok(colony) => colony,
        Err(err) => {
            eprintln!("load failed: {err}");
            return;
        }
    };

    for _ in 0..day_length {
        colony.advance_tick();
        restored.advance_tick();
    }
    let in_sync = colony.state_hash() == restored.state_hash();
    println!(
        "snapshot {} bytes | after one more day: {} (0x{:016X})",
        data.len(),
        if in_sync { "in sync" } else { "DESYNC" },
        colony.state_hash(),
    );
}
