//! Typed colony events.
//!
//! Events are buffered during a tick (and by commands) and drained by the
//! presentation layer with [`Colony::drain_events`](crate::Colony::drain_events).
//! They are transient and not part of a snapshot.

use colony_core::fixed::{Fixed64, Ticks};
use colony_core::id::SettlerId;
use colony_core::ledger::Bundle;
use colony_core::position::GridPosition;
use colony_core::registry::BuildingKind;
use colony_tech_tree::TechId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColonyEvent {
    BuildingPlaced {
        kind: BuildingKind,
        position: GridPosition,
        tick: Ticks,
    },
    ConstructionCompleted {
        kind: BuildingKind,
        position: GridPosition,
        tick: Ticks,
    },
    BuildingDemolished {
        kind: BuildingKind,
        position: GridPosition,
        tick: Ticks,
    },
    SalvageStarted {
        position: GridPosition,
        tick: Ticks,
    },
    SalvageCancelled {
        position: GridPosition,
        tick: Ticks,
    },
    /// `loot` lists what was actually stored after clamping.
    SalvageCompleted {
        position: GridPosition,
        loot: Bundle,
        tick: Ticks,
    },
    StormStruck {
        destroyed: u32,
        wreckage_spawned: u32,
        tick: Ticks,
    },
    ResearchStarted {
        tech: TechId,
        tick: Ticks,
    },
    ResearchCompleted {
        tech: TechId,
        tick: Ticks,
    },
    PowerShortage {
        deficit: Fixed64,
        shed: u32,
        tick: Ticks,
    },
    PowerRestored {
        tick: Ticks,
    },
    LifeSupportCritical {
        tick: Ticks,
    },
    LifeSupportRestored {
        tick: Ticks,
    },
    SettlerSpawned {
        settler: SettlerId,
        tick: Ticks,
    },
}

impl ColonyEvent {
    /// Tick at which the event was emitted.
    pub fn tick(&self) -> Ticks {
        match self {
            ColonyEvent::BuildingPlaced { tick, .. }
            | ColonyEvent::ConstructionCompleted { tick, .. }
            | ColonyEvent::BuildingDemolished { tick, .. }
            | ColonyEvent::SalvageStarted { tick, .. }
            | ColonyEvent::SalvageCancelled { tick, .. }
            | ColonyEvent::SalvageCompleted { tick, .. }
            | ColonyEvent::StormStruck { tick, .. }
            | ColonyEvent::ResearchStarted { tick, .. }
            | ColonyEvent::ResearchCompleted { tick, .. }
            | ColonyEvent::PowerShortage { tick, .. }
            | ColonyEvent::PowerRestored { tick }
            | ColonyEvent::LifeSupportCritical { tick }
            | ColonyEvent::LifeSupportRestored { tick }
            | ColonyEvent::SettlerSpawned { tick, .. } => *tick,
        }
    }
}
