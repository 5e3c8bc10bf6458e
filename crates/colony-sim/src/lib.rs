//! Tick-driven colony economy.
//!
//! A [`Colony`] owns every piece of simulation state: the resource ledger,
//! the grid and its buildings, settlers, research and the day/storm clocks.
//! Each call to [`Colony::advance_tick`] runs the stages in a fixed order:
//!
//! 1. **Day clock** -- advance the day tick, wrapping at the day length
//! 2. **Lifecycle** -- construction and salvage progress
//! 3. **Power** -- staffing/adjacency gate, fuel check, battery buffering,
//!    two-pass shedding
//! 4. **Production** -- generic output, fabrication, greenhouses, upkeep and
//!    the life-support post-pass
//! 5. **Research** -- advance the active technology while staffed
//! 6. **Scheduler** -- auto-assign idle settlers, periodic population growth
//! 7. **Hazard** -- storm countdown, storm on expiry
//! 8. **Bookkeeping** -- tick counter and state hash
//!
//! Commands (`place_building`, `start_research`, ...) return `bool` and
//! never partially mutate state; the reason for a rejection is logged at
//! `debug` level.

pub mod colony;
pub mod error;
pub mod event;
pub mod grid_power;
pub mod hazard;
pub mod lifecycle;
pub mod production;
pub mod query;
pub mod research;
pub mod scheduler;
pub mod serialize;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use colony::{AdvanceResult, Colony};
pub use error::CommandError;
pub use event::ColonyEvent;
pub use hazard::StormReport;
pub use query::BuildingSnapshot;
