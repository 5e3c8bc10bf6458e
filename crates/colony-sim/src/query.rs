//! Read-only query API for inspecting colony state.
//!
//! Snapshot types are owned copies, safe to hand to rendering or UI code
//! without holding a borrow on the colony.

use colony_core::building::{Building, KindState};
use colony_core::config::ColonyConfig;
use colony_core::fixed::{Fixed64, Ticks};
use colony_core::id::{BuildingId, CropId, RecipeId, SettlerId};
use colony_core::ledger::Ledger;
use colony_core::position::GridPosition;
use colony_core::registry::{BuildingKind, Registry};
use colony_core::settler::{Settler, SettlerState};
use colony_core::sim::{GameSpeed, StateHash};
use colony_tech_tree::TechTree;

use crate::colony::Colony;

// ---------------------------------------------------------------------------
// Building snapshot
// ---------------------------------------------------------------------------

/// A read-only view of one building.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingSnapshot {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub position: GridPosition,
    pub active: bool,
    pub constructing: bool,
    /// Construction or salvage progress as a 0..1 fraction. Completed
    /// buildings report 1, idle wreckage 0.
    pub progress: Fixed64,
    pub settlers: Vec<SettlerId>,
    pub not_connected: bool,
    pub active_recipe: Option<RecipeId>,
    pub crop: Option<CropId>,
    pub battery_charge: Option<Fixed64>,
}

impl Colony {
    fn snapshot(&self, id: BuildingId, b: &Building) -> BuildingSnapshot {
        let duration = if b.is_wreckage() {
            self.config.salvage_time
        } else {
            self.config.build_time
        };
        let (active_recipe, crop) = match b.state {
            KindState::Fabrication { active_recipe } => (active_recipe, None),
            KindState::Greenhouse { crop } => (None, Some(crop)),
            KindState::Plain | KindState::Battery { .. } | KindState::Wreckage => (None, None),
        };
        BuildingSnapshot {
            id,
            kind: b.kind,
            position: b.position,
            active: b.active,
            constructing: b.constructing,
            progress: if b.constructing {
                b.build_progress(duration)
            } else if b.is_wreckage() {
                Fixed64::ZERO
            } else {
                Fixed64::from_num(1)
            },
            settlers: b.settlers.clone(),
            not_connected: b.not_connected,
            active_recipe,
            crop,
            battery_charge: b.battery_charge(),
        }
    }

    // -----------------------------------------------------------------------
    // Buildings and settlers
    // -----------------------------------------------------------------------

    /// Every building, wreckage and the anchor, in creation order.
    pub fn buildings(&self) -> Vec<BuildingSnapshot> {
        self.ordered().map(|(id, b)| self.snapshot(id, b)).collect()
    }

    pub fn building_at(&self, x: i32, y: i32) -> Option<BuildingSnapshot> {
        let id = self.grid.occupant(GridPosition::new(x, y))?;
        self.buildings.get(id).map(|b| self.snapshot(id, b))
    }

    pub fn building(&self, id: BuildingId) -> Option<BuildingSnapshot> {
        self.buildings.get(id).map(|b| self.snapshot(id, b))
    }

    pub fn building_count(&self) -> usize {
        self.order.len()
    }

    pub fn settlers(&self) -> &[Settler] {
        &self.settlers
    }

    pub fn settler(&self, id: SettlerId) -> Option<&Settler> {
        self.settlers.get(id.0 as usize)
    }

    /// Settlers currently in `state`.
    pub fn settlers_in_state(&self, state: SettlerState) -> usize {
        self.settlers.iter().filter(|s| s.state == state).count()
    }

    // -----------------------------------------------------------------------
    // Economy
    // -----------------------------------------------------------------------

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ColonyConfig {
        &self.config
    }

    pub fn research(&self) -> &TechTree {
        &self.tech
    }

    /// Net power after the last balance, batteries included.
    pub fn power_balance(&self) -> Fixed64 {
        self.power_balance
    }

    pub fn population_cap(&self) -> u32 {
        self.population_cap
    }

    pub fn life_support_critical(&self) -> bool {
        self.life_support_critical
    }

    pub fn can_afford(&self, kind: BuildingKind) -> bool {
        self.ledger.can_afford(&self.registry.building(kind).cost)
    }

    /// Kinds without a research gate are always unlocked.
    pub fn is_unlocked(&self, kind: BuildingKind) -> bool {
        !self.registry.building(kind).requires_research || self.tech.unlocks().has_building(kind)
    }

    pub fn is_recipe_unlocked(&self, recipe: RecipeId) -> bool {
        self.registry
            .recipe(recipe)
            .is_some_and(|r| !r.requires_research || self.tech.unlocks().has_recipe(recipe))
    }

    pub fn is_crop_unlocked(&self, crop: CropId) -> bool {
        self.registry
            .crop(crop)
            .is_some_and(|c| !c.requires_research || self.tech.unlocks().has_crop(crop))
    }

    // -----------------------------------------------------------------------
    // Clocks
    // -----------------------------------------------------------------------

    pub fn tick(&self) -> Ticks {
        self.sim.tick
    }

    /// Fraction of the current day elapsed, in `[0, 1)`.
    pub fn day_time(&self) -> f64 {
        self.sim.day_time(self.config.day_length)
    }

    pub fn day_count(&self) -> u64 {
        self.sim.day_count
    }

    pub fn is_night(&self) -> bool {
        self.sim.is_night(self.config.day_length)
    }

    pub fn storm_countdown(&self) -> Ticks {
        self.sim.storm_countdown
    }

    pub fn speed(&self) -> GameSpeed {
        self.speed
    }

    /// Hash of the economic state at the end of the last tick.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// Hash everything that feeds the economy. Settler positions and the
    /// visual rng are excluded: they advance with frame time, not ticks.
    pub(crate) fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();

        hasher.write_u64(self.sim.tick);
        hasher.write_u64(self.sim.day_tick);
        hasher.write_u64(self.sim.day_count);
        hasher.write_u64(self.sim.storm_countdown);
        hasher.write_u64(self.sim.depletion_counter);
        hasher.write_u64(self.sim.growth_counter);

        for (resource, amount, capacity) in self.ledger.iter() {
            hasher.write_u32(resource.index() as u32);
            hasher.write_fixed64(amount);
            hasher.write_fixed64(capacity.unwrap_or(Fixed64::MAX));
        }

        for (_, b) in self.ordered() {
            hasher.write_u32(b.kind.index() as u32);
            hasher.write_i32(b.position.x);
            hasher.write_i32(b.position.y);
            hasher.write_bool(b.active);
            hasher.write_bool(b.constructing);
            hasher.write_bool(b.not_connected);
            hasher.write_u64(b.build_work);
            for s in &b.settlers {
                hasher.write_u32(s.0);
            }
            match b.state {
                KindState::Fabrication { active_recipe } => {
                    hasher.write_u32(active_recipe.map_or(u32::MAX, |r| r.0));
                }
                KindState::Greenhouse { crop } => hasher.write_u32(crop.0),
                KindState::Battery { charge } => hasher.write_fixed64(charge),
                KindState::Plain | KindState::Wreckage => {}
            }
        }

        for s in &self.settlers {
            hasher.write_u32(s.id.0);
            hasher.write_u32(s.state as u32);
            hasher.write_bool(s.manually_assigned);
            hasher.write_bool(s.assigned.is_some());
        }

        for tech in self.tech.completed() {
            hasher.write_u32(tech.0);
        }
        if let Some(active) = self.tech.active() {
            hasher.write_u32(active.tech.0);
            hasher.write_u64(active.elapsed);
        }

        hasher.write_u64(self.rng.state());
        hasher.write_u32(self.population_cap);
        hasher.write_fixed64(self.power_balance);
        hasher.write_bool(self.life_support_critical);

        hasher.finish()
    }
}
