//! End-to-end colony scenarios: construction, power shortage, storms and
//! research gating, driven only through the public command and tick API.

use colony_core::fixed::Fixed64;
use colony_core::registry::BuildingKind;
use colony_core::resource::{Resource, ResourceCategory};
use colony_core::settler::SettlerState;
use colony_sim::test_utils::*;
use colony_sim::{Colony, ColonyEvent};

// ===========================================================================
// Construction
// ===========================================================================

#[test]
fn construction_scenario() {
    let mut colony = bare_colony(11);
    colony.ledger_mut().set(Resource::Iron, fixed(10.0));

    assert!(colony.place_building(8, 8, BuildingKind::Solar));
    assert_eq!(colony.ledger().get(Resource::Iron), fixed(5.0));
    let site = colony.building_at(8, 8).unwrap();
    assert!(site.constructing);
    assert_eq!(site.progress, Fixed64::ZERO);

    let builder = add_settlers_at(&mut colony, 1, 8.5, 8.5)[0];
    station(&mut colony, builder, 8, 8);
    assert_eq!(colony.settler(builder).unwrap().state, SettlerState::Building);

    let build_time = colony.config().build_time;
    run_ticks(&mut colony, build_time - 1);
    assert!(colony.building_at(8, 8).unwrap().constructing);

    run_ticks(&mut colony, 1);
    let done = colony.building_at(8, 8).unwrap();
    assert!(!done.constructing);
    assert_eq!(done.progress, fixed(1.0));

    let completed = colony
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, ColonyEvent::ConstructionCompleted { .. }))
        .count();
    assert_eq!(completed, 1);
}

#[test]
fn walking_builder_reaches_site_and_builds() {
    let mut colony = bare_colony(12);
    let builder = add_settlers_at(&mut colony, 1, 5.5, 5.5)[0];
    assert!(colony.place_building(5, 8, BuildingKind::Solar));
    assert!(colony.assign_settler_to_building(builder, 5, 8, true));

    // Frames move the settler; ticks only count arrived builders.
    for _ in 0..600 {
        colony.update_settlers(1.0 / 60.0);
    }
    assert_eq!(colony.settler(builder).unwrap().state, SettlerState::Building);

    let build_time = colony.config().build_time;
    run_ticks(&mut colony, build_time);
    assert!(!colony.building_at(5, 8).unwrap().constructing);
}

// ===========================================================================
// Power shortage
// ===========================================================================

/// A fuel-free 6-power generator feeding a 3-power drill and a 5-power miner,
/// the miner being the newest building.
fn brownout_colony() -> Colony {
    let mut colony = colony_with_registry(21, |b| {
        b.mutate_building(BuildingKind::Generator, |def| {
            def.produces = vec![(Resource::Power, fixed(6.0))];
            def.consumes.clear();
            def.requires_staff = false;
        })
        .unwrap();
        b.mutate_building(BuildingKind::Miner, |def| {
            def.consumes = vec![(Resource::Power, fixed(5.0))];
        })
        .unwrap();
    });
    let crew = add_settlers(&mut colony, 2);
    build_instant(&mut colony, 10, 10, BuildingKind::Generator);
    build_instant(&mut colony, 12, 10, BuildingKind::OilDrill);
    build_instant(&mut colony, 14, 10, BuildingKind::Miner);
    station(&mut colony, crew[0], 12, 10);
    station(&mut colony, crew[1], 14, 10);
    colony
}

#[test]
fn power_deficit_sheds_exactly_one_consumer() {
    let mut colony = brownout_colony();
    colony.advance_tick();

    assert!(colony.building_at(10, 10).unwrap().active);
    assert!(colony.building_at(12, 10).unwrap().active);
    assert!(!colony.building_at(14, 10).unwrap().active);
    assert_eq!(colony.power_balance(), fixed(3.0));
    assert!(colony.power_balance() >= Fixed64::ZERO);

    let shortages: Vec<_> = colony
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, ColonyEvent::PowerShortage { .. }))
        .collect();
    assert_eq!(shortages.len(), 1);
}

#[test]
fn shed_consumer_produces_nothing() {
    let mut colony = brownout_colony();
    let iron = colony.ledger().get(Resource::Iron);
    run_ticks(&mut colony, 3);
    // The miner is shed every tick, the drill keeps pumping.
    assert_eq!(colony.ledger().get(Resource::Iron), iron);
    assert!(colony.ledger().get(Resource::Fuel) > Fixed64::ZERO);
}

// ===========================================================================
// Storm
// ===========================================================================

#[test]
fn storm_scenario() {
    let mut colony = bare_colony(31);
    build_instant(&mut colony, 20, 20, BuildingKind::ShieldGenerator);
    build_instant(&mut colony, 21, 20, BuildingKind::Solar);
    build_instant(&mut colony, 19, 20, BuildingKind::Solar);
    build_instant(&mut colony, 20, 22, BuildingKind::Storage);
    build_instant(&mut colony, 5, 5, BuildingKind::Storage);
    set_noon(&mut colony);
    colony.advance_tick();
    assert!(colony.building_at(20, 20).unwrap().active);

    let before = colony.building_count();
    let report = colony.trigger_storm();

    assert_eq!(report.destroyed, 1);
    assert!(colony.building_at(5, 5).is_none());
    assert!(colony.building_at(20, 22).is_some());
    assert!(colony.building_at(21, 20).is_some());

    let cfg = colony.config().clone();
    assert!((cfg.storm_wreckage_min..=cfg.storm_wreckage_max).contains(&report.spawned));
    assert_eq!(
        colony.building_count(),
        before - report.destroyed as usize + report.spawned as usize
    );

    // One storage survives, so one bonus remains.
    let expected = cfg.raw_capacity_floor + fixed(25.0);
    for resource in Resource::in_category(ResourceCategory::Raw) {
        assert_eq!(colony.ledger().capacity(resource), Some(expected));
    }
}

#[test]
fn storm_arrives_on_schedule() {
    let mut colony = bare_colony(32);
    build_instant(&mut colony, 5, 5, BuildingKind::Solar);
    let interval = colony.config().storm_interval;

    run_ticks(&mut colony, interval - 1);
    assert!(colony.building_at(5, 5).is_some());
    assert_eq!(colony.storm_countdown(), 1);

    colony.drain_events();
    run_ticks(&mut colony, 1);
    assert!(colony.building_at(5, 5).is_none());
    assert_eq!(colony.storm_countdown(), interval);
    assert!(
        colony
            .drain_events()
            .iter()
            .any(|e| matches!(e, ColonyEvent::StormStruck { destroyed: 1, .. }))
    );
}

// ===========================================================================
// Research
// ===========================================================================

#[test]
fn research_with_unmet_prerequisite_is_refused() {
    let mut colony = Colony::standard(41);
    colony.ledger_mut().set(Resource::Steel, fixed(15.0));
    colony.ledger_mut().set(Resource::Electronics, fixed(15.0));
    let ledger_before = colony.ledger().clone();
    let research_before = colony.research().clone();

    let deep = colony.research().tech_id("deepMining").unwrap();
    assert!(!colony.start_research(deep));

    assert_eq!(colony.ledger(), &ledger_before);
    assert_eq!(colony.research(), &research_before);
    assert!(colony.research().active().is_none());
}

#[test]
fn research_unlocks_gated_building() {
    let mut colony = bare_colony(42);
    let crew = add_settlers(&mut colony, 1);
    build_instant(&mut colony, 3, 3, BuildingKind::Solar);
    build_instant(&mut colony, 5, 3, BuildingKind::ResearchStation);
    station(&mut colony, crew[0], 5, 3);
    set_noon(&mut colony);

    let tech = colony.research().tech_id("advancedMining").unwrap();
    assert!(!colony.is_unlocked(BuildingKind::AdvancedMine));
    assert!(colony.start_research(tech));
    assert_eq!(colony.ledger().get(Resource::Iron), fixed(0.0));

    let duration = colony.research().technology(tech).unwrap().duration;
    run_ticks(&mut colony, duration);
    assert!(colony.research().is_completed(tech));
    assert!(colony.is_unlocked(BuildingKind::AdvancedMine));

    let steel = colony.registry().recipe_id("steel").unwrap();
    assert!(colony.is_recipe_unlocked(steel));

    // Unlocked but still unaffordable without steel.
    assert!(!colony.can_afford(BuildingKind::AdvancedMine));
    assert!(!colony.place_building(10, 10, BuildingKind::AdvancedMine));
    assert!(colony.building_at(10, 10).is_none());
}
