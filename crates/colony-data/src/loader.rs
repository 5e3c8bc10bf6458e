//! Resolution pipeline: reads data files, resolves cross-references, builds
//! the registry, tech tree and config.
//!
//! A data directory holds up to six files, each in RON, TOML or JSON:
//!
//! | base name   | required | TOML key    |
//! |-------------|----------|-------------|
//! | `buildings` | yes      | `buildings` |
//! | `recipes`   | no       | `recipes`   |
//! | `crops`     | no       | `crops`     |
//! | `loot`      | no       | `loot`      |
//! | `research`  | no       | `research`  |
//! | `config`    | no       | (table)     |
//!
//! Building kinds absent from `buildings` keep their standard definition.
//! Every optional file that is present replaces the matching standard table
//! outright.

use colony_core::config::ColonyConfig;
use colony_core::fixed::{Fixed64, f64_to_fixed64};
use colony_core::id::{CropId, RecipeId};
use colony_core::ledger::Bundle;
use colony_core::registry::{
    BuildingKind, BuildingTypeDef, CropDef, LootEntry, RecipeDef, Registry, RegistryBuilder,
    RegistryError, StorageBonus, standard_building, standard_crops, standard_loot,
    standard_recipes,
};
use colony_core::resource::Resource;
use colony_tech_tree::{TechId, TechTree, TechTreeError, Technology, Unlock};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::schema::*;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A value parsed but is out of range.
    #[error("invalid value in {file}: {detail}")]
    InvalidValue { file: PathBuf, detail: String },

    /// The resolved tables failed registry validation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A technology could not be registered.
    #[error(transparent)]
    Tech(#[from] TechTreeError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

fn invalid(file: &Path, detail: String) -> DataLoadError {
    DataLoadError::InvalidValue {
        file: file.to_path_buf(),
        detail,
    }
}

/// A finite, non-negative quantity.
fn quantity(v: f64, what: &str, file: &Path) -> Result<Fixed64, DataLoadError> {
    if !v.is_finite() || v < 0.0 {
        return Err(invalid(file, format!("{what} must be a non-negative number, got {v}")));
    }
    Ok(f64_to_fixed64(v))
}

fn resolve_amounts(
    amounts: &[(String, f64)],
    resources: &HashMap<String, Resource>,
    file: &Path,
) -> Result<Bundle, DataLoadError> {
    amounts
        .iter()
        .map(|(name, v)| {
            let resource = *resolve_name(resources, name, file, "resource")?;
            Ok((resource, quantity(*v, name, file)?))
        })
        .collect()
}

// ===========================================================================
// Loaded data
// ===========================================================================

/// Everything needed to found a colony.
#[derive(Debug, Clone)]
pub struct GameData {
    pub registry: Registry,
    pub tech_tree: TechTree,
    pub config: ColonyConfig,
}

/// Load and resolve every data file in `dir`.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let resources: HashMap<String, Resource> = Resource::ALL
        .into_iter()
        .map(|r| (r.key().to_string(), r))
        .collect();
    let kinds: HashMap<String, BuildingKind> = BuildingKind::ALL
        .into_iter()
        .map(|k| (k.key().to_string(), k))
        .collect();

    let mut builder = RegistryBuilder::new();
    for kind in BuildingKind::ALL {
        builder.register_building(standard_building(kind));
    }

    // -- Buildings (required) --
    let buildings_path = require_data_file(dir, "buildings")?;
    let buildings: Vec<BuildingData> = deserialize_list(&buildings_path, "buildings")?;
    let mut seen_kinds: HashMap<String, ()> = HashMap::new();
    for data in &buildings {
        check_duplicate(&seen_kinds, &data.kind, &buildings_path)?;
        let def = resolve_building(data, &resources, &kinds, &buildings_path)?;
        seen_kinds.insert(data.kind.clone(), ());
        builder.register_building(def);
    }

    // -- Recipes --
    match find_data_file(dir, "recipes")? {
        Some(path) => {
            let recipes: Vec<RecipeData> = deserialize_list(&path, "recipes")?;
            let mut names: HashMap<String, RecipeId> = HashMap::new();
            for data in &recipes {
                check_duplicate(&names, &data.name, &path)?;
                let id = builder.register_recipe(RecipeDef {
                    name: data.name.clone(),
                    inputs: resolve_amounts(&data.inputs, &resources, &path)?,
                    outputs: resolve_amounts(&data.outputs, &resources, &path)?,
                    requires_research: data.requires_research,
                });
                names.insert(data.name.clone(), id);
            }
        }
        None => {
            tracing::debug!("no recipes file, using standard recipes");
            for recipe in standard_recipes() {
                builder.register_recipe(recipe);
            }
        }
    }

    // -- Crops --
    match find_data_file(dir, "crops")? {
        Some(path) => {
            let crops: Vec<CropData> = deserialize_list(&path, "crops")?;
            let mut names: HashMap<String, CropId> = HashMap::new();
            let mut default_crop: Option<CropId> = None;
            for data in &crops {
                check_duplicate(&names, &data.name, &path)?;
                let id = builder.register_crop(CropDef {
                    name: data.name.clone(),
                    produces: resolve_amounts(&data.produces, &resources, &path)?,
                    consumes: resolve_amounts(&data.consumes, &resources, &path)?,
                    requires_research: data.requires_research,
                });
                if data.default {
                    if default_crop.is_some() {
                        return Err(invalid(&path, "more than one default crop".to_string()));
                    }
                    default_crop = Some(id);
                }
                names.insert(data.name.clone(), id);
            }
            if let Some(id) = default_crop.or_else(|| (!crops.is_empty()).then_some(CropId(0))) {
                builder.set_default_crop(id);
            }
        }
        None => {
            tracing::debug!("no crops file, using standard crops");
            for (i, crop) in standard_crops().into_iter().enumerate() {
                let id = builder.register_crop(crop);
                if i == 0 {
                    builder.set_default_crop(id);
                }
            }
        }
    }

    // -- Loot --
    match find_data_file(dir, "loot")? {
        Some(path) => {
            let loot: Vec<LootData> = deserialize_list(&path, "loot")?;
            let entries = loot
                .iter()
                .map(|data| resolve_loot(data, &resources, &path))
                .collect::<Result<Vec<_>, _>>()?;
            builder.set_loot(entries);
        }
        None => builder.set_loot(standard_loot()),
    }

    let registry = builder.build()?;

    // -- Research --
    let tech_tree = match find_data_file(dir, "research")? {
        Some(path) => load_research(&path, &registry, &resources, &kinds)?,
        None => {
            tracing::debug!("no research file, using standard tech tree");
            TechTree::standard(&registry)
        }
    };

    // -- Config --
    let config = match find_data_file(dir, "config")? {
        Some(path) => {
            let data: ConfigData = deserialize_file(&path)?;
            resolve_config(data, &path)?
        }
        None => ColonyConfig::default(),
    };

    tracing::info!(
        dir = %dir.display(),
        building_overrides = buildings.len(),
        recipes = registry.recipe_count(),
        crops = registry.crop_count(),
        technologies = tech_tree.technology_count(),
        "game data loaded"
    );

    Ok(GameData {
        registry,
        tech_tree,
        config,
    })
}

// ===========================================================================
// Resolution
// ===========================================================================

fn resolve_building(
    data: &BuildingData,
    resources: &HashMap<String, Resource>,
    kinds: &HashMap<String, BuildingKind>,
    path: &Path,
) -> Result<BuildingTypeDef, DataLoadError> {
    let kind = *resolve_name(kinds, &data.kind, path, "building")?;

    let mut def = BuildingTypeDef::new(kind, &data.name);
    def.cost = resolve_amounts(&data.cost, resources, path)?;
    def.produces = resolve_amounts(&data.produces, resources, path)?;
    def.consumes = resolve_amounts(&data.consumes, resources, path)?;
    def.requires_staff = data.requires_staff;
    def.requires_research = data.requires_research;
    def.placeable = data.placeable;
    def.adjacency = data
        .adjacency
        .iter()
        .map(|name| resolve_name(kinds, name, path, "building").copied())
        .collect::<Result<_, _>>()?;
    def.battery_capacity = data
        .battery_capacity
        .map(|v| quantity(v, "battery_capacity", path))
        .transpose()?;
    def.storage_bonus = data
        .storage_bonus
        .map(|b| -> Result<StorageBonus, DataLoadError> {
            Ok(StorageBonus {
                raw: quantity(b.raw, "storage_bonus.raw", path)?,
                compound: quantity(b.compound, "storage_bonus.compound", path)?,
            })
        })
        .transpose()?;
    def.housing = data.housing;
    def.shield_radius = data.shield_radius;

    if kind.is_passive() && def.placeable {
        return Err(invalid(path, format!("{kind} cannot be placeable")));
    }
    Ok(def)
}

fn resolve_loot(
    data: &LootData,
    resources: &HashMap<String, Resource>,
    path: &Path,
) -> Result<LootEntry, DataLoadError> {
    let resource = *resolve_name(resources, &data.resource, path, "resource")?;
    let chance = match data.chance {
        Some(c) if !(0.0..=1.0).contains(&c) => {
            return Err(invalid(path, format!("loot chance {c} outside [0, 1]")));
        }
        Some(c) => Some(f64_to_fixed64(c)),
        None => None,
    };
    Ok(LootEntry {
        resource,
        min: data.min,
        max: data.max,
        chance,
    })
}

fn load_research(
    path: &Path,
    registry: &Registry,
    resources: &HashMap<String, Resource>,
    kinds: &HashMap<String, BuildingKind>,
) -> Result<TechTree, DataLoadError> {
    let research: Vec<ResearchData> = deserialize_list(path, "research")?;
    let recipes: HashMap<String, RecipeId> = registry
        .recipes()
        .map(|(id, r)| (r.name.clone(), id))
        .collect();
    let crops: HashMap<String, CropId> = registry
        .crops()
        .map(|(id, c)| (c.name.clone(), id))
        .collect();

    let mut tree = TechTree::new();
    let mut techs: HashMap<String, TechId> = HashMap::new();
    for data in &research {
        check_duplicate(&techs, &data.key, path)?;

        let prerequisites = data
            .prerequisites
            .iter()
            .map(|name| resolve_name(&techs, name, path, "technology").copied())
            .collect::<Result<Vec<_>, _>>()?;
        let unlocks = data
            .unlocks
            .iter()
            .map(|unlock| -> Result<Unlock, DataLoadError> {
                Ok(match unlock {
                    UnlockData::Building(name) => {
                        Unlock::Building(*resolve_name(kinds, name, path, "building")?)
                    }
                    UnlockData::Recipe(name) => {
                        Unlock::Recipe(*resolve_name(&recipes, name, path, "recipe")?)
                    }
                    UnlockData::Crop(name) => {
                        Unlock::Crop(*resolve_name(&crops, name, path, "crop")?)
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let id = tree.next_tech_id();
        tree.register(Technology {
            id,
            key: data.key.clone(),
            name: data.name.clone(),
            prerequisites,
            cost: resolve_amounts(&data.cost, resources, path)?,
            duration: data.duration,
            unlocks,
        })?;
        techs.insert(data.key.clone(), id);
    }
    Ok(tree)
}

fn resolve_config(data: ConfigData, path: &Path) -> Result<ColonyConfig, DataLoadError> {
    let mut c = ColonyConfig::default();
    let fixed = |v: f64, what: &str| quantity(v, what, path);

    if let Some(v) = data.grid_size {
        c.grid_size = v;
    }
    if let Some(v) = data.build_time {
        c.build_time = v;
    }
    if let Some(v) = data.salvage_time {
        c.salvage_time = v;
    }
    if let Some(v) = data.max_settlers_per_building {
        c.max_settlers_per_building = v;
    }
    if let Some(v) = data.settler_speed {
        c.settler_speed = v;
    }
    if let Some(v) = data.starting_settlers {
        c.starting_settlers = v;
    }
    if let Some(v) = data.starting_population_cap {
        c.starting_population_cap = v;
    }
    if let Some(v) = data.upkeep_oxygen {
        c.upkeep_oxygen = fixed(v, "upkeep_oxygen")?;
    }
    if let Some(v) = data.upkeep_food {
        c.upkeep_food = fixed(v, "upkeep_food")?;
    }
    if let Some(v) = data.upkeep_water {
        c.upkeep_water = fixed(v, "upkeep_water")?;
    }
    if let Some(v) = data.depletion_interval {
        c.depletion_interval = v;
    }
    if let Some(v) = data.day_length {
        c.day_length = v;
    }
    if let Some(v) = data.day_start {
        c.day_start = v;
    }
    if let Some(v) = data.storm_interval {
        c.storm_interval = v;
    }
    if let Some(v) = data.storm_wreckage_min {
        c.storm_wreckage_min = v;
    }
    if let Some(v) = data.storm_wreckage_max {
        c.storm_wreckage_max = v;
    }
    if let Some(v) = data.storm_area {
        c.storm_area = v;
    }
    if let Some(v) = data.storm_spawn_attempts {
        c.storm_spawn_attempts = v;
    }
    if let Some(v) = data.initial_wreckage {
        c.initial_wreckage = v;
    }
    if let Some(v) = data.initial_wreckage_area {
        c.initial_wreckage_area = v;
    }
    if let Some(v) = data.initial_spawn_attempts {
        c.initial_spawn_attempts = v;
    }
    if let Some(v) = data.anchor {
        c.anchor = v;
    }
    if let Some(v) = data.growth_interval {
        c.growth_interval = v;
    }
    if let Some(v) = data.worker_bonus {
        c.worker_bonus = fixed(v, "worker_bonus")?;
    }
    if let Some(v) = data.solar_floor {
        c.solar_floor = v;
    }
    if let Some(v) = data.raw_capacity_floor {
        c.raw_capacity_floor = fixed(v, "raw_capacity_floor")?;
    }
    if let Some(v) = data.compound_capacity_floor {
        c.compound_capacity_floor = fixed(v, "compound_capacity_floor")?;
    }
    if let Some(v) = data.tick_interval_ms {
        c.tick_interval_ms = v;
    }

    for (name, value) in [
        ("day_length", c.day_length),
        ("depletion_interval", c.depletion_interval),
        ("growth_interval", c.growth_interval),
        ("storm_interval", c.storm_interval),
    ] {
        if value == 0 {
            return Err(invalid(path, format!("{name} must be positive")));
        }
    }
    if c.storm_wreckage_min > c.storm_wreckage_max {
        return Err(invalid(
            path,
            format!(
                "storm_wreckage_min {} exceeds storm_wreckage_max {}",
                c.storm_wreckage_min, c.storm_wreckage_max
            ),
        ));
    }
    let size = c.grid_size as i32;
    if !(0..size).contains(&c.anchor.x) || !(0..size).contains(&c.anchor.y) {
        return Err(invalid(path, format!("anchor {:?} outside the grid", c.anchor)));
    }
    Ok(c)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "colony_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    fn shipped_data_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
    }

    const SOLAR_ONLY: &str = r#"[
    (kind: "solar", name: "Big Panel", cost: [("iron", 4.0)], produces: [("power", 7.0)]),
]"#;

    // -----------------------------------------------------------------------
    // detect_format / find_data_file / require_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("buildings.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("config.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("loot.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("loot.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("loot")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn find_data_file_found_and_missing() {
        let dir = make_test_dir("find");
        fs::write(dir.join("crops.json"), "[]").unwrap();

        assert_eq!(
            find_data_file(&dir, "crops").unwrap(),
            Some(dir.join("crops.json"))
        );
        assert_eq!(find_data_file(&dir, "loot").unwrap(), None);

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("loot.ron"), "[]").unwrap();
        fs::write(dir.join("loot.json"), "[]").unwrap();

        assert!(matches!(
            find_data_file(&dir, "loot"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn missing_buildings_file_is_an_error() {
        let dir = make_test_dir("require_missing");

        match load_game_data(&dir) {
            Err(DataLoadError::MissingRequired { file, .. }) => assert_eq!(file, "buildings"),
            other => panic!("expected MissingRequired, got {other:?}"),
        }

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // deserialize_list
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_list_toml_needs_key() {
        let dir = make_test_dir("list_toml");
        let path = dir.join("loot.toml");
        fs::write(
            &path,
            r#"
[[loot]]
resource = "iron"
min = 1
max = 2
"#,
        )
        .unwrap();

        let loot: Vec<LootData> = deserialize_list(&path, "loot").unwrap();
        assert_eq!(loot.len(), 1);
        assert_eq!(loot[0].resource, "iron");

        let wrong: Result<Vec<LootData>, _> = deserialize_list(&path, "drops");
        assert!(matches!(wrong, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = make_test_dir("malformed");
        fs::write(dir.join("buildings.ron"), "[ (kind: ").unwrap();

        assert!(matches!(
            load_game_data(&dir),
            Err(DataLoadError::Parse { .. })
        ));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // load_game_data
    // -----------------------------------------------------------------------

    #[test]
    fn shipped_data_matches_standard_tables() {
        let data = load_game_data(&shipped_data_dir()).unwrap();
        assert_eq!(data.registry, Registry::standard());
        assert_eq!(data.tech_tree, TechTree::standard(&data.registry));
        assert_eq!(data.config, ColonyConfig::default());
    }

    #[test]
    fn building_override_keeps_other_tables() {
        let dir = make_test_dir("override");
        fs::write(dir.join("buildings.ron"), SOLAR_ONLY).unwrap();

        let data = load_game_data(&dir).unwrap();
        let solar = data.registry.building(BuildingKind::Solar);
        assert_eq!(solar.name, "Big Panel");
        assert_eq!(solar.produces_of(Resource::Power), Fixed64::from_num(7));
        assert_eq!(solar.cost, vec![(Resource::Iron, Fixed64::from_num(4))]);
        assert_eq!(
            data.registry.building(BuildingKind::Miner),
            &standard_building(BuildingKind::Miner)
        );
        assert_eq!(data.registry.recipe_count(), 4);
        assert_eq!(data.tech_tree.technology_count(), 5);

        cleanup(&dir);
    }

    #[test]
    fn unknown_resource_is_unresolved() {
        let dir = make_test_dir("unresolved");
        fs::write(
            dir.join("buildings.ron"),
            r#"[(kind: "solar", name: "Panel", cost: [("unobtainium", 1.0)])]"#,
        )
        .unwrap();

        match load_game_data(&dir) {
            Err(DataLoadError::UnresolvedRef {
                name,
                expected_kind,
                ..
            }) => {
                assert_eq!(name, "unobtainium");
                assert_eq!(expected_kind, "resource");
            }
            other => panic!("expected UnresolvedRef, got {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn duplicate_building_kind_is_rejected() {
        let dir = make_test_dir("dup_kind");
        fs::write(
            dir.join("buildings.json"),
            r#"[{"kind": "home", "name": "A"}, {"kind": "home", "name": "B"}]"#,
        )
        .unwrap();

        assert!(matches!(
            load_game_data(&dir),
            Err(DataLoadError::DuplicateName { name, .. }) if name == "home"
        ));

        cleanup(&dir);
    }

    #[test]
    fn placeable_anchor_is_rejected() {
        let dir = make_test_dir("placeable_anchor");
        fs::write(
            dir.join("buildings.ron"),
            r#"[(kind: "spaceship", name: "Ship")]"#,
        )
        .unwrap();

        assert!(matches!(
            load_game_data(&dir),
            Err(DataLoadError::InvalidValue { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let dir = make_test_dir("negative");
        fs::write(
            dir.join("buildings.ron"),
            r#"[(kind: "solar", name: "Panel", produces: [("power", -5.0)])]"#,
        )
        .unwrap();

        assert!(matches!(
            load_game_data(&dir),
            Err(DataLoadError::InvalidValue { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn locked_default_crop_fails_registry_validation() {
        let dir = make_test_dir("locked_crop");
        fs::write(dir.join("buildings.ron"), SOLAR_ONLY).unwrap();
        fs::write(
            dir.join("crops.ron"),
            r#"[(name: "moss", produces: [("food", 1.0)], requires_research: true)]"#,
        )
        .unwrap();

        assert!(matches!(
            load_game_data(&dir),
            Err(DataLoadError::Registry(RegistryError::LockedDefaultCrop(_)))
        ));

        cleanup(&dir);
    }

    #[test]
    fn marked_default_crop_is_used() {
        let dir = make_test_dir("default_crop");
        fs::write(dir.join("buildings.ron"), SOLAR_ONLY).unwrap();
        fs::write(
            dir.join("crops.ron"),
            r#"[
    (name: "moss", produces: [("food", 1.0)], requires_research: true),
    (name: "lichen", produces: [("oxygen", 2.0)], default: true),
]"#,
        )
        .unwrap();

        let data = load_game_data(&dir).unwrap();
        assert_eq!(data.registry.default_crop(), CropId(1));
        assert_eq!(data.registry.crop_count(), 2);

        cleanup(&dir);
    }

    #[test]
    fn research_resolves_prerequisites_in_order() {
        let dir = make_test_dir("research");
        fs::write(dir.join("buildings.ron"), SOLAR_ONLY).unwrap();
        fs::write(
            dir.join("research.toml"),
            r#"
[[research]]
key = "basics"
name = "Basics"
cost = [["iron", 5.0]]
duration = 10
unlocks = [{ Recipe = "steel" }]

[[research]]
key = "deep"
name = "Deep"
prerequisites = ["basics"]
duration = 20
unlocks = [{ Building = "deepMine" }]
"#,
        )
        .unwrap();

        let data = load_game_data(&dir).unwrap();
        let tree = &data.tech_tree;
        assert_eq!(tree.technology_count(), 2);
        let basics = tree.tech_id("basics").unwrap();
        let deep = tree.technology(tree.tech_id("deep").unwrap()).unwrap();
        assert_eq!(deep.prerequisites, vec![basics]);
        assert_eq!(deep.unlocks, vec![Unlock::Building(BuildingKind::DeepMine)]);
        let steel = data.registry.recipe_id("steel").unwrap();
        assert_eq!(
            tree.technology(basics).unwrap().unlocks,
            vec![Unlock::Recipe(steel)]
        );

        cleanup(&dir);
    }

    #[test]
    fn research_forward_reference_is_unresolved() {
        let dir = make_test_dir("research_forward");
        fs::write(dir.join("buildings.ron"), SOLAR_ONLY).unwrap();
        fs::write(
            dir.join("research.ron"),
            r#"[
    (key: "deep", name: "Deep", prerequisites: ["basics"], duration: 20),
    (key: "basics", name: "Basics", duration: 10),
]"#,
        )
        .unwrap();

        assert!(matches!(
            load_game_data(&dir),
            Err(DataLoadError::UnresolvedRef { expected_kind: "technology", .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = make_test_dir("config");
        fs::write(dir.join("buildings.ron"), SOLAR_ONLY).unwrap();
        fs::write(
            dir.join("config.toml"),
            "day_length = 120\nworker_bonus = 0.5\n",
        )
        .unwrap();

        let data = load_game_data(&dir).unwrap();
        assert_eq!(data.config.day_length, 120);
        assert_eq!(data.config.worker_bonus, Fixed64::from_num(0.5));
        assert_eq!(data.config.build_time, ColonyConfig::default().build_time);

        cleanup(&dir);
    }

    #[test]
    fn config_rejects_inverted_storm_range() {
        let dir = make_test_dir("config_storm");
        fs::write(dir.join("buildings.ron"), SOLAR_ONLY).unwrap();
        fs::write(
            dir.join("config.json"),
            r#"{"storm_wreckage_min": 20, "storm_wreckage_max": 5}"#,
        )
        .unwrap();

        assert!(matches!(
            load_game_data(&dir),
            Err(DataLoadError::InvalidValue { .. })
        ));

        cleanup(&dir);
    }
}
