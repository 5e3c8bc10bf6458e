//! Serde data file structs for colony content.
//!
//! Quantities are plain `f64` on disk and converted to `Fixed64` once, by
//! the loader. Resource, building, recipe and crop references are
//! camelCase keys (`"shieldCrystal"`, `"waterCollector"`) resolved against
//! the tables loaded so far.

use colony_core::config::SpawnArea;
use colony_core::position::GridPosition;
use serde::Deserialize;

/// `(resource, amount)` pairs.
pub type AmountsData = Vec<(String, f64)>;

fn default_true() -> bool {
    true
}

// ===========================================================================
// Buildings
// ===========================================================================

/// A building type definition. `kind` picks which building it replaces.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub cost: AmountsData,
    #[serde(default)]
    pub produces: AmountsData,
    #[serde(default)]
    pub consumes: AmountsData,
    #[serde(default)]
    pub requires_staff: bool,
    #[serde(default)]
    pub requires_research: bool,
    #[serde(default = "default_true")]
    pub placeable: bool,
    /// Kinds of which at least one must be orthogonally adjacent.
    #[serde(default)]
    pub adjacency: Vec<String>,
    #[serde(default)]
    pub battery_capacity: Option<f64>,
    #[serde(default)]
    pub storage_bonus: Option<StorageBonusData>,
    #[serde(default)]
    pub housing: u32,
    #[serde(default)]
    pub shield_radius: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StorageBonusData {
    pub raw: f64,
    pub compound: f64,
}

// ===========================================================================
// Recipes and crops
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    pub inputs: AmountsData,
    pub outputs: AmountsData,
    #[serde(default)]
    pub requires_research: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CropData {
    pub name: String,
    pub produces: AmountsData,
    #[serde(default)]
    pub consumes: AmountsData,
    #[serde(default)]
    pub requires_research: bool,
    /// Marks the crop new greenhouses start with. The first crop is used
    /// when none is marked.
    #[serde(default)]
    pub default: bool,
}

// ===========================================================================
// Salvage loot
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LootData {
    pub resource: String,
    pub min: u32,
    pub max: u32,
    /// Roll probability; omitted means the entry always drops.
    #[serde(default)]
    pub chance: Option<f64>,
}

// ===========================================================================
// Research
// ===========================================================================

/// A technology definition. Prerequisites must name technologies listed
/// earlier in the same file.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchData {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub cost: AmountsData,
    pub duration: u64,
    #[serde(default)]
    pub unlocks: Vec<UnlockData>,
}

/// What completing a technology unlocks.
#[derive(Debug, Clone, Deserialize)]
pub enum UnlockData {
    Building(String),
    Recipe(String),
    Crop(String),
}

// ===========================================================================
// Config
// ===========================================================================

/// Overrides for `ColonyConfig`. Omitted fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigData {
    pub grid_size: Option<u32>,
    pub build_time: Option<u64>,
    pub salvage_time: Option<u64>,
    pub max_settlers_per_building: Option<u32>,
    pub settler_speed: Option<f64>,
    pub starting_settlers: Option<u32>,
    pub starting_population_cap: Option<u32>,
    pub upkeep_oxygen: Option<f64>,
    pub upkeep_food: Option<f64>,
    pub upkeep_water: Option<f64>,
    pub depletion_interval: Option<u64>,
    pub day_length: Option<u64>,
    pub day_start: Option<f64>,
    pub storm_interval: Option<u64>,
    pub storm_wreckage_min: Option<u32>,
    pub storm_wreckage_max: Option<u32>,
    pub storm_area: Option<SpawnArea>,
    pub storm_spawn_attempts: Option<u32>,
    pub initial_wreckage: Option<u32>,
    pub initial_wreckage_area: Option<SpawnArea>,
    pub initial_spawn_attempts: Option<u32>,
    pub anchor: Option<GridPosition>,
    pub growth_interval: Option<u64>,
    pub worker_bonus: Option<f64>,
    pub solar_floor: Option<f64>,
    pub raw_capacity_floor: Option<f64>,
    pub compound_capacity_floor: Option<f64>,
    pub tick_interval_ms: Option<u64>,
}

// ===========================================================================
// TOML wrappers
// ===========================================================================

/// TOML files hold lists under a top-level key (`[[buildings]]`).
#[derive(Debug, Clone, Deserialize)]
pub struct TomlBuildings {
    pub buildings: Vec<BuildingData>,
}
