//! The colony context and its tick driver.

use colony_core::building::Building;
use colony_core::config::ColonyConfig;
use colony_core::fixed::Fixed64;
use colony_core::id::{BuildingId, SettlerId};
use colony_core::ledger::Ledger;
use colony_core::position::GridPosition;
use colony_core::registry::{BuildingKind, Registry};
use colony_core::resource::{Resource, ResourceCategory};
use colony_core::rng::SimRng;
use colony_core::settler::{Settler, SettlerState};
use colony_core::sim::{GameSpeed, SimState};
use colony_power::PowerModule;
use colony_spatial::{Grid, SpatialError};
use colony_tech_tree::TechTree;
use slotmap::SlotMap;

use crate::error::{CommandError, rejected};
use crate::event::ColonyEvent;

/// Salt mixed into the seed for the presentation-only random stream.
const VISUAL_SEED_SALT: u64 = 0x5E77_1E25_0000_0001;

/// Result of [`Colony::advance`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Ticks run during this call.
    pub steps_run: u64,
}

/// All state of one colony.
///
/// Buildings live in a slotmap keyed by [`BuildingId`]; `order` keeps
/// creation order, which every list-ordered rule (fuel allocation, battery
/// buffering, shedding) walks. The grid and `order` are always updated
/// together. Settlers are indexed by their id.
#[derive(Debug, Clone)]
pub struct Colony {
    pub(crate) registry: Registry,
    pub(crate) config: ColonyConfig,
    pub(crate) ledger: Ledger,
    pub(crate) grid: Grid,
    pub(crate) buildings: SlotMap<BuildingId, Building>,
    pub(crate) order: Vec<BuildingId>,
    pub(crate) settlers: Vec<Settler>,
    pub(crate) tech: TechTree,
    pub(crate) power: PowerModule,
    pub(crate) sim: SimState,
    pub(crate) speed: GameSpeed,
    /// Drives every economic roll (loot, storms, growth).
    pub(crate) rng: SimRng,
    /// Drives settler wandering only, so frame rate never perturbs `rng`.
    pub(crate) visual_rng: SimRng,
    pub(crate) population_cap: u32,
    /// Signed net power from the last balance.
    pub(crate) power_balance: Fixed64,
    pub(crate) life_support_critical: bool,
    /// Seconds of unpaused presentation time; phases settler jitter.
    pub(crate) visual_clock: f64,
    pub(crate) last_state_hash: u64,
    pub(crate) events: Vec<ColonyEvent>,
}

impl Colony {
    /// An empty colony: standard starting ledger, no buildings, no
    /// settlers.
    pub fn new(registry: Registry, tech: TechTree, config: ColonyConfig, seed: u64) -> Self {
        let mut colony = Self {
            grid: Grid::new(config.grid_size),
            sim: SimState::new(&config),
            population_cap: config.starting_population_cap,
            registry,
            config,
            ledger: Ledger::standard(),
            buildings: SlotMap::with_key(),
            order: Vec::new(),
            settlers: Vec::new(),
            tech,
            power: PowerModule::new(),
            speed: GameSpeed::Normal,
            rng: SimRng::new(seed),
            visual_rng: SimRng::new(seed ^ VISUAL_SEED_SALT),
            power_balance: Fixed64::ZERO,
            life_support_critical: false,
            visual_clock: 0.0,
            last_state_hash: 0,
            events: Vec::new(),
        };
        colony.last_state_hash = colony.compute_state_hash();
        colony
    }

    /// A freshly landed colony: the anchor spaceship, the initial wreckage
    /// field around it and the starting settlers.
    pub fn found(registry: Registry, tech: TechTree, config: ColonyConfig, seed: u64) -> Self {
        let mut colony = Self::new(registry, tech, config, seed);
        let anchor = colony.config.anchor;

        let ship = Building::passive(BuildingKind::Spaceship, anchor, &colony.registry);
        if let Err(err) = colony.insert_building(ship) {
            tracing::warn!(%err, "anchor could not be placed");
        }

        let cells = colony.grid.random_free_cells(
            colony.config.initial_wreckage_area,
            colony.config.initial_wreckage,
            colony.config.initial_spawn_attempts,
            &mut colony.rng,
        );
        colony.spawn_wreckage(&cells);

        for _ in 0..colony.config.starting_settlers {
            let x = anchor.x as f64 + (colony.rng.next_f64() - 0.5) * 4.0;
            let y = anchor.y as f64 + (colony.rng.next_f64() - 0.5) * 4.0;
            colony.spawn_settler(x, y);
        }

        tracing::info!(
            seed,
            wreckage = cells.len(),
            settlers = colony.settlers.len(),
            "colony founded"
        );
        colony.last_state_hash = colony.compute_state_hash();
        colony
    }

    /// The standard game with the given seed.
    pub fn standard(seed: u64) -> Self {
        let registry = Registry::standard();
        let tech = TechTree::standard(&registry);
        Self::found(registry, tech, ColonyConfig::default(), seed)
    }

    // -----------------------------------------------------------------------
    // Tick driver
    // -----------------------------------------------------------------------

    /// Run one tick. Does nothing and returns `false` while paused.
    pub fn advance_tick(&mut self) -> bool {
        if self.speed.is_paused() {
            return false;
        }
        self.step_internal();
        true
    }

    /// Feed wall-clock time into the colony. Runs one tick per
    /// `tick_interval_ms / speed` milliseconds, carrying the remainder.
    pub fn advance(&mut self, elapsed_ms: u64) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        let multiplier = self.speed.multiplier();
        if multiplier == 0 {
            return result;
        }

        self.sim.accumulator_ms += elapsed_ms;
        let step_size = (self.config.tick_interval_ms / multiplier).max(1);
        while self.sim.accumulator_ms >= step_size {
            self.sim.accumulator_ms -= step_size;
            self.step_internal();
            result.steps_run += 1;
        }
        result
    }

    fn step_internal(&mut self) {
        self.sim.advance_day(self.config.day_length);
        self.process_construction();
        self.balance_power();
        self.process_production();
        self.process_research();
        self.auto_assign_settlers();
        self.grow_population();
        self.phase_hazard();
        self.phase_bookkeeping();
    }

    fn phase_hazard(&mut self) {
        self.sim.storm_countdown = self.sim.storm_countdown.saturating_sub(1);
        if self.sim.storm_countdown == 0 {
            self.trigger_storm();
        }
    }

    fn phase_bookkeeping(&mut self) {
        self.sim.tick += 1;
        self.last_state_hash = self.compute_state_hash();
    }

    /// 0 pauses, 1 is normal, 2 is double speed.
    pub fn set_game_speed(&mut self, code: u8) -> bool {
        match GameSpeed::from_code(code) {
            Some(speed) => {
                tracing::debug!(?speed, "game speed changed");
                self.speed = speed;
                true
            }
            None => rejected("set_game_speed", CommandError::InvalidSpeed(code)),
        }
    }

    /// Take every buffered event.
    pub fn drain_events(&mut self) -> Vec<ColonyEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[ColonyEvent] {
        &self.events
    }

    /// Direct ledger access for scenario setup.
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    // -----------------------------------------------------------------------
    // Internal: building set
    // -----------------------------------------------------------------------

    /// Insert a building into the slotmap, the grid and the order list.
    pub(crate) fn insert_building(&mut self, building: Building) -> Result<BuildingId, SpatialError> {
        let pos = building.position;
        let id = self.buildings.insert(building);
        if let Err(err) = self.grid.place(id, pos) {
            self.buildings.remove(id);
            return Err(err);
        }
        self.order.push(id);
        Ok(id)
    }

    /// Release a building's settlers and remove it everywhere.
    pub(crate) fn remove_building(&mut self, id: BuildingId) -> Option<Building> {
        self.release_all(id);
        if let Err(err) = self.grid.remove(id) {
            tracing::warn!(%err, "building missing from grid");
        }
        self.order.retain(|other| *other != id);
        self.buildings.remove(id)
    }

    pub(crate) fn spawn_wreckage(&mut self, cells: &[GridPosition]) -> u32 {
        let mut spawned = 0;
        for &pos in cells {
            let wreck = Building::passive(BuildingKind::Wreckage, pos, &self.registry);
            match self.insert_building(wreck) {
                Ok(_) => spawned += 1,
                Err(err) => tracing::warn!(%err, "wreckage not spawned"),
            }
        }
        spawned
    }

    pub(crate) fn spawn_settler(&mut self, x: f64, y: f64) -> SettlerId {
        let id = SettlerId(self.settlers.len() as u32);
        let idle_timer = self.rng.next_f64() * 2.0;
        self.settlers.push(Settler::new(id, x, y, idle_timer));
        id
    }

    pub(crate) fn emit(&mut self, event: ColonyEvent) {
        self.events.push(event);
    }

    /// Buildings in creation order, skipping stale handles.
    pub(crate) fn ordered(&self) -> impl Iterator<Item = (BuildingId, &Building)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.buildings.get(id).map(|b| (id, b)))
    }

    /// Completed, non-passive buildings in creation order.
    pub(crate) fn operational_ids(&self) -> Vec<BuildingId> {
        self.ordered()
            .filter(|(_, b)| b.is_operational())
            .map(|(id, _)| id)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Internal: staffing and adjacency
    // -----------------------------------------------------------------------

    fn count_in_state(&self, id: BuildingId, state: SettlerState) -> u32 {
        self.buildings.get(id).map_or(0, |b| {
            b.settlers
                .iter()
                .filter_map(|sid| self.settlers.get(sid.0 as usize))
                .filter(|s| s.state == state)
                .count() as u32
        })
    }

    /// Settlers that have arrived and are working.
    pub(crate) fn workers(&self, id: BuildingId) -> u32 {
        self.count_in_state(id, SettlerState::Working)
    }

    /// Settlers that have arrived at a construction or salvage site.
    pub(crate) fn builders(&self, id: BuildingId) -> u32 {
        self.count_in_state(id, SettlerState::Building)
    }

    /// Whether an orthogonal neighbour of `pos` satisfies the adjacency list
    /// of `kind`. With `require_complete`, neighbours under construction do
    /// not count.
    pub(crate) fn adjacency_satisfied(
        &self,
        pos: GridPosition,
        kind: BuildingKind,
        require_complete: bool,
    ) -> bool {
        let required = &self.registry.building(kind).adjacency;
        if required.is_empty() {
            return true;
        }
        self.grid
            .neighbors_4(pos)
            .into_iter()
            .filter_map(|(_, id)| self.buildings.get(id))
            .any(|n| required.contains(&n.kind) && (!require_complete || !n.constructing))
    }

    // -----------------------------------------------------------------------
    // Internal: capacity side effects
    // -----------------------------------------------------------------------

    /// Apply the storage and housing bonuses of a completed building.
    pub(crate) fn grant_capacity_bonus(&mut self, kind: BuildingKind) {
        let def = self.registry.building(kind);
        if let Some(bonus) = def.storage_bonus {
            self.ledger
                .grow_capacity(Resource::in_category(ResourceCategory::Raw), bonus.raw);
            self.ledger
                .grow_capacity(Resource::in_category(ResourceCategory::Compound), bonus.compound);
        }
        self.population_cap += def.housing;
    }

    /// Undo [`grant_capacity_bonus`](Self::grant_capacity_bonus), respecting
    /// the configured floors.
    pub(crate) fn revoke_capacity_bonus(&mut self, kind: BuildingKind) {
        let def = self.registry.building(kind);
        if let Some(bonus) = def.storage_bonus {
            self.ledger.shrink_capacity(
                Resource::in_category(ResourceCategory::Raw),
                bonus.raw,
                self.config.raw_capacity_floor,
            );
            self.ledger.shrink_capacity(
                Resource::in_category(ResourceCategory::Compound),
                bonus.compound,
                self.config.compound_capacity_floor,
            );
        }
        if def.housing > 0 {
            self.population_cap = self
                .population_cap
                .saturating_sub(def.housing)
                .max(self.config.starting_population_cap);
        }
    }
}
