use serde::{Deserialize, Serialize};

use crate::id::{BuildingId, SettlerId};

/// What a settler is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlerState {
    Idle,
    Walking,
    /// At a construction or salvage site.
    Building,
    /// At a completed building.
    Working,
}

/// A colonist.
///
/// Positions are continuous grid coordinates and only drive presentation;
/// economic effects depend on `state` and `assigned`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settler {
    pub id: SettlerId,
    pub x: f64,
    pub y: f64,
    pub state: SettlerState,
    pub target: Option<(f64, f64)>,
    /// Seconds left before an idle settler picks a new wander target.
    pub idle_timer: f64,
    pub assigned: Option<BuildingId>,
    pub manually_assigned: bool,
}

impl Settler {
    pub fn new(id: SettlerId, x: f64, y: f64, idle_timer: f64) -> Self {
        Self {
            id,
            x,
            y,
            state: SettlerState::Idle,
            target: None,
            idle_timer,
            assigned: None,
            manually_assigned: false,
        }
    }

    /// Idle, unassigned and not pinned by the player.
    pub fn is_available(&self) -> bool {
        self.state == SettlerState::Idle && self.assigned.is_none() && !self.manually_assigned
    }

    /// Counts toward staffing once it has arrived at its building.
    pub fn is_working(&self) -> bool {
        self.state == SettlerState::Working
    }

    pub fn is_building(&self) -> bool {
        self.state == SettlerState::Building
    }
}
