//! Colony Core -- the data model shared by every colony crate.
//!
//! This crate holds the static configuration (resource kinds, building
//! registry, recipes, crops, loot, tuning constants) and the mutable
//! entities the simulation stages operate on (resource ledger, building
//! instances, settlers, tick/day state). It contains no stage logic: the
//! tick pipeline lives in `colony-sim`.
//!
//! # Tick Pipeline (run by `colony-sim`)
//!
//! 1. **Lifecycle** -- construction and salvage progress.
//! 2. **Power** -- staffing/adjacency gate, fuel pre-check, battery buffering,
//!    two-pass deficit shedding.
//! 3. **Production** -- generic output, fabrication recipes, greenhouse
//!    crops, settler upkeep and the life-support post-pass.
//! 4. **Research** -- advance the active technology.
//! 5. **Scheduler** -- auto-assign idle settlers, grow the population.
//! 6. **Hazard** -- storm countdown and destruction of unshielded buildings.
//!
//! # Key Types
//!
//! - [`ledger::Ledger`] -- clamped resource quantities and capacities.
//! - [`registry::Registry`] -- immutable building/recipe/crop/loot tables,
//!   built with [`registry::RegistryBuilder`].
//! - [`building::Building`] -- a placed structure with its kind payload.
//! - [`settler::Settler`] -- a colonist and its behaviour state.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`rng::SimRng`] -- seeded SplitMix64 generator.

pub mod building;
pub mod config;
pub mod fixed;
pub mod id;
pub mod ledger;
pub mod position;
pub mod registry;
pub mod resource;
pub mod rng;
pub mod settler;
pub mod sim;
