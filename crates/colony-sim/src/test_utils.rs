//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use colony_core::building::Building;
use colony_core::config::ColonyConfig;
use colony_core::fixed::{Fixed64, Ticks};
use colony_core::id::{BuildingId, SettlerId};
use colony_core::position::GridPosition;
use colony_core::registry::{BuildingKind, Registry, RegistryBuilder};
use colony_core::settler::SettlerState;
use colony_tech_tree::TechTree;

use crate::colony::Colony;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Colony constructors
// ===========================================================================

/// Standard tables and ledger, but no anchor, wreckage or settlers.
pub fn bare_colony(seed: u64) -> Colony {
    let registry = Registry::standard();
    let tech = TechTree::standard(&registry);
    Colony::new(registry, tech, ColonyConfig::default(), seed)
}

/// A bare colony whose standard registry was adjusted by `f` first.
pub fn colony_with_registry(seed: u64, f: impl FnOnce(&mut RegistryBuilder)) -> Colony {
    let mut builder = RegistryBuilder::standard();
    f(&mut builder);
    let registry = builder.build().expect("registry should build");
    let tech = TechTree::standard(&registry);
    Colony::new(registry, tech, ColonyConfig::default(), seed)
}

// ===========================================================================
// Settlers
// ===========================================================================

/// Spawn `n` settlers at the centre of the default anchor cell.
pub fn add_settlers(colony: &mut Colony, n: usize) -> Vec<SettlerId> {
    add_settlers_at(colony, n, 25.5, 25.5)
}

pub fn add_settlers_at(colony: &mut Colony, n: usize, x: f64, y: f64) -> Vec<SettlerId> {
    (0..n).map(|_| colony.spawn_settler(x, y)).collect()
}

/// Manually assign a settler and put it on site immediately, skipping the
/// walk.
pub fn station(colony: &mut Colony, settler: SettlerId, x: i32, y: i32) {
    assert!(
        colony.assign_settler_to_building(settler, x, y, true),
        "settler {settler:?} could not be assigned to ({x}, {y})"
    );
    let constructing = colony
        .building_at(x, y)
        .map(|b| b.constructing)
        .unwrap_or(false);
    let (cx, cy) = GridPosition::new(x, y).center();
    let s = &mut colony.settlers[settler.0 as usize];
    s.x = cx;
    s.y = cy;
    s.target = None;
    s.state = if constructing {
        SettlerState::Building
    } else {
        SettlerState::Working
    };
}

// ===========================================================================
// Buildings
// ===========================================================================

/// Insert a completed building without paying for it or checking
/// adjacency. Capacity bonuses apply.
pub fn build_instant(colony: &mut Colony, x: i32, y: i32, kind: BuildingKind) -> BuildingId {
    let mut building = Building::construction_site(kind, GridPosition::new(x, y), &colony.registry);
    building.constructing = false;
    let id = colony
        .insert_building(building)
        .expect("cell should be free");
    colony.grant_capacity_bonus(kind);
    id
}

/// Drop an idle wreckage at `(x, y)`.
pub fn spawn_wreck(colony: &mut Colony, x: i32, y: i32) -> BuildingId {
    let wreck = Building::passive(BuildingKind::Wreckage, GridPosition::new(x, y), &colony.registry);
    colony.insert_building(wreck).expect("cell should be free")
}

// ===========================================================================
// Clock
// ===========================================================================

pub fn run_ticks(colony: &mut Colony, n: u64) {
    for _ in 0..n {
        colony.advance_tick();
    }
}

/// Move the day clock to `tick` within the day.
pub fn set_day_tick(colony: &mut Colony, tick: Ticks) {
    colony.sim.day_tick = tick % colony.config.day_length.max(1);
}

/// Full sun: the solar curve peaks at mid-day.
pub fn set_noon(colony: &mut Colony) {
    let half = colony.config.day_length / 2;
    set_day_tick(colony, half);
}
