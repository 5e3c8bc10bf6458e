use colony_core::id::{CropId, RecipeId, SettlerId};
use colony_core::ledger::LedgerError;
use colony_core::position::GridPosition;
use colony_core::registry::BuildingKind;
use colony_spatial::SpatialError;
use colony_tech_tree::TechTreeError;

/// Why a command was rejected. Commands surface this as `false`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(GridPosition),
    #[error("({}, {}) is occupied", .0.x, .0.y)]
    Occupied(GridPosition),
    #[error("{0} cannot be placed")]
    NotPlaceable(BuildingKind),
    #[error("{0} is not unlocked")]
    Locked(BuildingKind),
    #[error("no neighbour satisfies the adjacency requirement of {0}")]
    AdjacencyUnmet(BuildingKind),
    #[error("no building at ({}, {})", .0.x, .0.y)]
    NoBuilding(GridPosition),
    #[error("building handle is stale")]
    StaleBuilding,
    #[error("{0} cannot be demolished")]
    NotDemolishable(BuildingKind),
    #[error("no wreckage at ({}, {})", .0.x, .0.y)]
    NotWreckage(GridPosition),
    #[error("wreckage at ({}, {}) is already being salvaged", .0.x, .0.y)]
    AlreadySalvaging(GridPosition),
    #[error("wreckage at ({}, {}) is not being salvaged", .0.x, .0.y)]
    NotSalvaging(GridPosition),
    #[error("unknown settler {0:?}")]
    UnknownSettler(SettlerId),
    #[error("wreckage at ({}, {}) is not marked for salvage", .0.x, .0.y)]
    IdleWreckage(GridPosition),
    #[error("building at ({}, {}) is fully staffed", .0.x, .0.y)]
    BuildingFull(GridPosition),
    #[error("expected a {expected} building, found {found}")]
    WrongKind {
        expected: BuildingKind,
        found: BuildingKind,
    },
    #[error("unknown recipe {0:?}")]
    UnknownRecipe(RecipeId),
    #[error("recipe {0:?} is not unlocked")]
    RecipeLocked(RecipeId),
    #[error("unknown crop {0:?}")]
    UnknownCrop(CropId),
    #[error("crop {0:?} is not unlocked")]
    CropLocked(CropId),
    #[error("invalid game speed {0}")]
    InvalidSpeed(u8),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Spatial(#[from] SpatialError),
    #[error(transparent)]
    Research(#[from] TechTreeError),
}

/// Log a rejected command and return `false`.
pub(crate) fn rejected(command: &'static str, err: CommandError) -> bool {
    tracing::debug!(command, %err, "command rejected");
    false
}
