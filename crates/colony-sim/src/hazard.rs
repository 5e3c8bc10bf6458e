//! Storms and shield coverage.

use std::collections::BTreeSet;

use colony_core::id::BuildingId;
use colony_core::position::GridPosition;

use crate::colony::Colony;
use crate::event::ColonyEvent;

/// Outcome of one storm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StormReport {
    pub destroyed: u32,
    pub spawned: u32,
}

impl Colony {
    /// Cells protected by completed, powered shield generators.
    pub fn shielded_cells(&self) -> BTreeSet<GridPosition> {
        let centers = self.ordered().filter_map(|(_, b)| {
            let radius = self.registry.building(b.kind).shield_radius?;
            (!b.constructing && b.active).then_some((b.position, radius))
        });
        self.grid.coverage(centers)
    }

    /// Strike the colony now: flatten everything unshielded, scatter new
    /// wreckage and restart the countdown. No refunds are paid.
    pub fn trigger_storm(&mut self) -> StormReport {
        let shielded = self.shielded_cells();
        let doomed: Vec<BuildingId> = self
            .ordered()
            .filter(|(_, b)| !b.is_wreckage() && !b.is_anchor() && !shielded.contains(&b.position))
            .map(|(id, _)| id)
            .collect();

        let mut report = StormReport::default();
        for id in doomed {
            if let Some(b) = self.remove_building(id) {
                if !b.constructing {
                    self.revoke_capacity_bonus(b.kind);
                }
                tracing::debug!(kind = %b.kind, x = b.position.x, y = b.position.y, "destroyed by storm");
                report.destroyed += 1;
            }
        }

        let count = self.rng.range_inclusive(
            i64::from(self.config.storm_wreckage_min),
            i64::from(self.config.storm_wreckage_max),
        ) as u32;
        let cells = self.grid.random_free_cells(
            self.config.storm_area,
            count,
            self.config.storm_spawn_attempts,
            &mut self.rng,
        );
        report.spawned = self.spawn_wreckage(&cells);
        self.sim.storm_countdown = self.config.storm_interval;

        tracing::info!(
            destroyed = report.destroyed,
            wreckage = report.spawned,
            shielded = shielded.len(),
            "storm struck"
        );
        self.emit(ColonyEvent::StormStruck {
            destroyed: report.destroyed,
            wreckage_spawned: report.spawned,
            tick: self.sim.tick,
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use colony_core::position::GridPosition;
    use colony_core::registry::BuildingKind;
    use colony_core::resource::Resource;

    use crate::test_utils::*;
    use crate::*;

    /// A powered shield generator at (10, 10) with two panels beside it.
    fn shielded_colony() -> Colony {
        let mut colony = bare_colony(5);
        build_instant(&mut colony, 10, 10, BuildingKind::ShieldGenerator);
        build_instant(&mut colony, 11, 10, BuildingKind::Solar);
        build_instant(&mut colony, 10, 11, BuildingKind::Solar);
        set_noon(&mut colony);
        colony.balance_power();
        colony
    }

    // -----------------------------------------------------------------------
    // Test 1: Coverage is a Manhattan diamond around active generators
    // -----------------------------------------------------------------------
    #[test]
    fn coverage_is_manhattan_radius() {
        let colony = shielded_colony();
        let cells = colony.shielded_cells();
        assert!(cells.contains(&GridPosition::new(13, 10)));
        assert!(cells.contains(&GridPosition::new(11, 12)));
        assert!(!cells.contains(&GridPosition::new(12, 12)));
        assert_eq!(cells.len(), 25);
    }

    // -----------------------------------------------------------------------
    // Test 2: Unpowered generators protect nothing
    // -----------------------------------------------------------------------
    #[test]
    fn unpowered_generator_has_no_coverage() {
        let mut colony = bare_colony(5);
        build_instant(&mut colony, 10, 10, BuildingKind::ShieldGenerator);
        colony.balance_power();
        assert!(colony.shielded_cells().is_empty());
    }

    // -----------------------------------------------------------------------
    // Test 3: Storm destroys outside, spares inside, spawns wreckage
    // -----------------------------------------------------------------------
    #[test]
    fn storm_spares_shielded_buildings() {
        let mut colony = shielded_colony();
        build_instant(&mut colony, 12, 11, BuildingKind::Miner);
        build_instant(&mut colony, 40, 40, BuildingKind::Miner);
        assert!(colony.place_building(2, 2, BuildingKind::Solar));

        let report = colony.trigger_storm();
        assert_eq!(report.destroyed, 2);
        assert!(colony.building_at(12, 11).is_some());
        assert!(colony.building_at(10, 10).is_some());
        assert!(colony.building_at(40, 40).is_none());
        assert!(colony.building_at(2, 2).is_none());

        assert!((10..=15).contains(&report.spawned));
        let wrecks = colony
            .buildings()
            .into_iter()
            .filter(|b| b.kind == BuildingKind::Wreckage)
            .collect::<Vec<_>>();
        assert_eq!(wrecks.len() as u32, report.spawned);
        let area = colony.config().storm_area;
        assert!(wrecks.iter().all(|w| area.contains(w.position)));
    }

    // -----------------------------------------------------------------------
    // Test 4: Anchor and existing wreckage survive
    // -----------------------------------------------------------------------
    #[test]
    fn anchor_and_wreckage_survive() {
        let mut colony = Colony::standard(9);
        let wrecks_before = colony
            .buildings()
            .into_iter()
            .filter(|b| b.kind == BuildingKind::Wreckage)
            .count() as u32;
        let report = colony.trigger_storm();
        assert_eq!(report.destroyed, 0);
        assert_eq!(
            colony.building_at(25, 25).map(|b| b.kind),
            Some(BuildingKind::Spaceship)
        );
        let wrecks_after = colony
            .buildings()
            .into_iter()
            .filter(|b| b.kind == BuildingKind::Wreckage)
            .count() as u32;
        assert_eq!(wrecks_after, wrecks_before + report.spawned);
    }

    // -----------------------------------------------------------------------
    // Test 5: Destroyed storage gives back its capacity without a refund
    // -----------------------------------------------------------------------
    #[test]
    fn storm_reverts_capacity_without_refund() {
        let mut colony = bare_colony(5);
        build_instant(&mut colony, 40, 40, BuildingKind::Storage);
        build_instant(&mut colony, 42, 40, BuildingKind::Home);
        assert_eq!(colony.ledger().capacity(Resource::Iron), Some(fixed(55.0)));
        assert_eq!(colony.population_cap(), 7);
        colony.ledger_mut().set(Resource::Iron, fixed(50.0));

        colony.trigger_storm();
        assert_eq!(colony.ledger().capacity(Resource::Iron), Some(fixed(30.0)));
        assert_eq!(colony.ledger().get(Resource::Iron), fixed(30.0));
        assert_eq!(colony.population_cap(), 5);
    }

    // -----------------------------------------------------------------------
    // Test 6: Settlers of destroyed buildings are released
    // -----------------------------------------------------------------------
    #[test]
    fn storm_releases_settlers() {
        let mut colony = bare_colony(5);
        let s = add_settlers(&mut colony, 1)[0];
        build_instant(&mut colony, 40, 40, BuildingKind::Miner);
        station(&mut colony, s, 40, 40);
        colony.trigger_storm();
        let settler = colony.settler(s).unwrap();
        assert_eq!(settler.assigned, None);
        assert!(settler.is_available());
    }

    // -----------------------------------------------------------------------
    // Test 7: The countdown triggers a storm and resets
    // -----------------------------------------------------------------------
    #[test]
    fn countdown_triggers_storm() {
        let mut colony = bare_colony(5);
        colony.sim.storm_countdown = 2;
        colony.advance_tick();
        assert_eq!(colony.storm_countdown(), 1);
        colony.advance_tick();
        assert_eq!(colony.storm_countdown(), colony.config().storm_interval);
        let events = colony.drain_events();
        assert!(events.iter().any(|e| matches!(e, ColonyEvent::StormStruck { .. })));
    }
}
