//! Save and load via `bitcode` with a versioned header.

use colony_core::building::Building;
use colony_core::config::ColonyConfig;
use colony_core::fixed::Fixed64;
use colony_core::id::BuildingId;
use colony_core::ledger::Ledger;
use colony_core::registry::Registry;
use colony_core::rng::SimRng;
use colony_core::settler::Settler;
use colony_core::sim::{GameSpeed, SimState};
use colony_power::PowerModule;
use colony_spatial::Grid;
use colony_tech_tree::TechTree;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::colony::Colony;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a colony snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xC010_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header stored with every snapshot, checked before the payload is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Serializable colony state
// ---------------------------------------------------------------------------

/// Everything except the pending event buffer, which is transient.
#[derive(Debug, Serialize, Deserialize)]
struct ColonySnapshot {
    header: SnapshotHeader,
    registry: Registry,
    config: ColonyConfig,
    ledger: Ledger,
    grid: Grid,
    buildings: SlotMap<BuildingId, Building>,
    order: Vec<BuildingId>,
    settlers: Vec<Settler>,
    tech: TechTree,
    power: PowerModule,
    sim: SimState,
    speed: GameSpeed,
    rng: SimRng,
    visual_rng: SimRng,
    population_cap: u32,
    power_balance: Fixed64,
    life_support_critical: bool,
    visual_clock: f64,
    last_state_hash: u64,
}

impl Colony {
    /// Serialize the colony to a binary blob.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = ColonySnapshot {
            header: SnapshotHeader::new(self.sim.tick),
            registry: self.registry.clone(),
            config: self.config.clone(),
            ledger: self.ledger.clone(),
            grid: self.grid.clone(),
            buildings: self.buildings.clone(),
            order: self.order.clone(),
            settlers: self.settlers.clone(),
            tech: self.tech.clone(),
            power: self.power.clone(),
            sim: self.sim.clone(),
            speed: self.speed,
            rng: self.rng.clone(),
            visual_rng: self.visual_rng.clone(),
            population_cap: self.population_cap,
            power_balance: self.power_balance,
            life_support_critical: self.life_support_critical,
            visual_clock: self.visual_clock,
            last_state_hash: self.last_state_hash,
        };

        let data =
            bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))?;
        tracing::debug!(tick = self.sim.tick, bytes = data.len(), "colony serialized");
        Ok(data)
    }

    /// Restore a colony from [`serialize`](Self::serialize) output. The
    /// event buffer starts empty.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: ColonySnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        Ok(Colony {
            registry: snapshot.registry,
            config: snapshot.config,
            ledger: snapshot.ledger,
            grid: snapshot.grid,
            buildings: snapshot.buildings,
            order: snapshot.order,
            settlers: snapshot.settlers,
            tech: snapshot.tech,
            power: snapshot.power,
            sim: snapshot.sim,
            speed: snapshot.speed,
            rng: snapshot.rng,
            visual_rng: snapshot.visual_rng,
            population_cap: snapshot.population_cap,
            power_balance: snapshot.power_balance,
            life_support_critical: snapshot.life_support_critical,
            visual_clock: snapshot.visual_clock,
            last_state_hash: snapshot.last_state_hash,
            events: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_core::registry::BuildingKind;

    use crate::test_utils::*;

    fn busy_colony() -> Colony {
        let mut colony = Colony::standard(77);
        colony.place_building(20, 20, BuildingKind::Solar);
        colony.place_building(21, 20, BuildingKind::Miner);
        run_ticks(&mut colony, 120);
        colony
    }

    // -----------------------------------------------------------------------
    // Test 1: Round trip preserves the state hash
    // -----------------------------------------------------------------------
    #[test]
    fn round_trip_preserves_state_hash() {
        let colony = busy_colony();
        let data = colony.serialize().expect("serialize should succeed");
        let restored = Colony::deserialize(&data).expect("deserialize should succeed");

        assert_eq!(restored.state_hash(), colony.state_hash());
        assert_eq!(restored.compute_state_hash(), colony.compute_state_hash());
        assert_eq!(restored.tick(), colony.tick());
        assert_eq!(restored.ledger(), colony.ledger());
        assert_eq!(restored.buildings(), colony.buildings());
        assert_eq!(restored.settlers(), colony.settlers());
    }

    // -----------------------------------------------------------------------
    // Test 2: A restored colony continues identically
    // -----------------------------------------------------------------------
    #[test]
    fn restored_colony_stays_in_lockstep() {
        let mut original = busy_colony();
        let mut restored = Colony::deserialize(&original.serialize().unwrap()).unwrap();
        for _ in 0..200 {
            original.advance_tick();
            restored.advance_tick();
            assert_eq!(original.state_hash(), restored.state_hash());
        }
    }

    // -----------------------------------------------------------------------
    // Test 3: Garbage is a decode error, not a panic
    // -----------------------------------------------------------------------
    #[test]
    fn garbage_is_decode_error() {
        let garbage = vec![0u8; 10];
        match Colony::deserialize(&garbage) {
            Err(DeserializeError::Decode(_)) => {}
            Err(other) => panic!("expected Decode error, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    // -----------------------------------------------------------------------
    // Test 4: Wrong magic is rejected
    // -----------------------------------------------------------------------
    #[test]
    fn wrong_magic_is_rejected() {
        let data = bare_colony(1).serialize().unwrap();
        let mut snapshot: ColonySnapshot = bitcode::deserialize(&data).unwrap();
        snapshot.header.magic = 0xDEAD_BEEF;
        let tampered = bitcode::serialize(&snapshot).unwrap();
        assert!(matches!(
            Colony::deserialize(&tampered),
            Err(DeserializeError::InvalidMagic(0xDEAD_BEEF))
        ));
    }

    // -----------------------------------------------------------------------
    // Test 5: Version checks
    // -----------------------------------------------------------------------
    #[test]
    fn header_version_checks() {
        let future = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION + 1,
            tick: 0,
        };
        assert!(matches!(future.validate(), Err(DeserializeError::FutureVersion(_))));

        let old = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: 0,
            tick: 0,
        };
        assert!(matches!(old.validate(), Err(DeserializeError::UnsupportedVersion(0))));
        assert!(SnapshotHeader::new(5).validate().is_ok());
    }

    // -----------------------------------------------------------------------
    // Test 6: Pending events are not saved
    // -----------------------------------------------------------------------
    #[test]
    fn events_are_transient() {
        let mut colony = bare_colony(1);
        colony.place_building(3, 3, BuildingKind::Solar);
        assert!(!colony.pending_events().is_empty());
        let restored = Colony::deserialize(&colony.serialize().unwrap()).unwrap();
        assert!(restored.pending_events().is_empty());
    }
}
