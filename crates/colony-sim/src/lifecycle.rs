//! Building lifecycle: placement, construction, demolition and salvage.

use colony_core::building::Building;
use colony_core::fixed::{Fixed64, Ticks};
use colony_core::id::BuildingId;
use colony_core::position::GridPosition;
use colony_core::registry::BuildingKind;

use crate::colony::Colony;
use crate::error::{CommandError, rejected};
use crate::event::ColonyEvent;

impl Colony {
    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Whether the adjacency requirement of `kind` would be met at `(x, y)`.
    /// Neighbours still under construction count here.
    pub fn can_place_at(&self, x: i32, y: i32, kind: BuildingKind) -> bool {
        self.adjacency_satisfied(GridPosition::new(x, y), kind, false)
    }

    /// Validate a placement without mutating anything.
    pub fn check_placement(&self, x: i32, y: i32, kind: BuildingKind) -> Result<(), CommandError> {
        let pos = GridPosition::new(x, y);
        if !self.grid.in_bounds(pos) {
            return Err(CommandError::OutOfBounds(pos));
        }
        if self.grid.is_occupied(pos) {
            return Err(CommandError::Occupied(pos));
        }
        let def = self.registry.building(kind);
        if !def.placeable {
            return Err(CommandError::NotPlaceable(kind));
        }
        if !self.is_unlocked(kind) {
            return Err(CommandError::Locked(kind));
        }
        if !self.can_place_at(x, y, kind) {
            return Err(CommandError::AdjacencyUnmet(kind));
        }
        Ok(())
    }

    /// Pay the full cost and start a construction site at `(x, y)`.
    pub fn place_building(&mut self, x: i32, y: i32, kind: BuildingKind) -> bool {
        match self.try_place_building(x, y, kind) {
            Ok(_) => true,
            Err(err) => rejected("place_building", err),
        }
    }

    pub(crate) fn try_place_building(
        &mut self,
        x: i32,
        y: i32,
        kind: BuildingKind,
    ) -> Result<BuildingId, CommandError> {
        self.check_placement(x, y, kind)?;
        self.ledger.try_spend(&self.registry.building(kind).cost)?;

        let pos = GridPosition::new(x, y);
        let site = Building::construction_site(kind, pos, &self.registry);
        let id = self.insert_building(site)?;
        tracing::debug!(%kind, x, y, "building placed");
        self.emit(ColonyEvent::BuildingPlaced {
            kind,
            position: pos,
            tick: self.sim.tick,
        });
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Demolition
    // -----------------------------------------------------------------------

    /// Remove a building, refunding half its cost.
    pub fn demolish_building(&mut self, x: i32, y: i32) -> bool {
        match self.try_demolish_building(GridPosition::new(x, y)) {
            Ok(()) => true,
            Err(err) => rejected("demolish_building", err),
        }
    }

    fn try_demolish_building(&mut self, pos: GridPosition) -> Result<(), CommandError> {
        let (id, building) = self.building_entry(pos)?;
        if building.is_wreckage() || building.is_anchor() {
            return Err(CommandError::NotDemolishable(building.kind));
        }
        let kind = building.kind;
        let completed = !building.constructing;

        self.ledger.refund_half(&self.registry.building(kind).cost);
        if completed {
            self.revoke_capacity_bonus(kind);
        }
        self.remove_building(id);

        tracing::debug!(%kind, x = pos.x, y = pos.y, "building demolished");
        self.emit(ColonyEvent::BuildingDemolished {
            kind,
            position: pos,
            tick: self.sim.tick,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Salvage
    // -----------------------------------------------------------------------

    /// Mark a wreckage for salvage so settlers can work on it.
    pub fn salvage_wreckage(&mut self, x: i32, y: i32) -> bool {
        match self.try_set_salvage(GridPosition::new(x, y), true) {
            Ok(()) => true,
            Err(err) => rejected("salvage_wreckage", err),
        }
    }

    /// Stop salvaging: progress resets and workers are released.
    pub fn cancel_salvage(&mut self, x: i32, y: i32) -> bool {
        match self.try_set_salvage(GridPosition::new(x, y), false) {
            Ok(()) => true,
            Err(err) => rejected("cancel_salvage", err),
        }
    }

    fn try_set_salvage(&mut self, pos: GridPosition, salvage: bool) -> Result<(), CommandError> {
        let (id, building) = self.building_entry(pos)?;
        if !building.is_wreckage() {
            return Err(CommandError::NotWreckage(pos));
        }
        match (salvage, building.constructing) {
            (true, true) => return Err(CommandError::AlreadySalvaging(pos)),
            (false, false) => return Err(CommandError::NotSalvaging(pos)),
            _ => {}
        }

        if !salvage {
            self.release_all(id);
        }
        if let Some(b) = self.buildings.get_mut(id) {
            b.constructing = salvage;
            b.build_work = 0;
        }

        let tick = self.sim.tick;
        self.emit(if salvage {
            ColonyEvent::SalvageStarted { position: pos, tick }
        } else {
            ColonyEvent::SalvageCancelled { position: pos, tick }
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Construction stage
    // -----------------------------------------------------------------------

    /// Advance every construction and salvage site by its builder count.
    pub(crate) fn process_construction(&mut self) {
        let sites: Vec<BuildingId> = self
            .ordered()
            .filter(|(_, b)| b.constructing)
            .map(|(id, _)| id)
            .collect();

        for id in sites {
            let builders = self.builders(id);
            if builders == 0 {
                continue;
            }
            let Some(site) = self.buildings.get_mut(id) else {
                continue;
            };
            let duration: Ticks = if site.is_wreckage() {
                self.config.salvage_time
            } else {
                self.config.build_time
            };
            site.build_work += builders as Ticks;
            if site.build_work < duration {
                continue;
            }
            site.build_work = duration;

            if site.is_wreckage() {
                self.complete_salvage(id);
            } else {
                self.complete_construction(id);
            }
        }
    }

    fn complete_construction(&mut self, id: BuildingId) {
        let Some(building) = self.buildings.get_mut(id) else {
            return;
        };
        building.constructing = false;
        let kind = building.kind;
        let position = building.position;

        self.grant_capacity_bonus(kind);
        self.release_all(id);

        tracing::info!(%kind, x = position.x, y = position.y, "construction complete");
        self.emit(ColonyEvent::ConstructionCompleted {
            kind,
            position,
            tick: self.sim.tick,
        });
    }

    fn complete_salvage(&mut self, id: BuildingId) {
        let mut loot = Vec::new();
        for entry in self.registry.loot() {
            if let Some(chance) = entry.chance {
                if !self.rng.chance(chance) {
                    continue;
                }
            }
            let amount = self
                .rng
                .range_inclusive(i64::from(entry.min), i64::from(entry.max));
            let stored = self.ledger.add(entry.resource, Fixed64::from_num(amount));
            loot.push((entry.resource, stored));
        }

        let Some(wreck) = self.remove_building(id) else {
            return;
        };
        tracing::info!(x = wreck.position.x, y = wreck.position.y, ?loot, "salvage complete");
        self.emit(ColonyEvent::SalvageCompleted {
            position: wreck.position,
            loot,
            tick: self.sim.tick,
        });
    }

    /// The building at `pos`, or `NoBuilding`.
    pub(crate) fn building_entry(&self, pos: GridPosition) -> Result<(BuildingId, &Building), CommandError> {
        self.grid
            .occupant(pos)
            .and_then(|id| self.buildings.get(id).map(|b| (id, b)))
            .ok_or(CommandError::NoBuilding(pos))
    }
}
