use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::id::{CropId, RecipeId};
use crate::ledger::Bundle;
use crate::resource::Resource;

// ---------------------------------------------------------------------------
// Building kinds
// ---------------------------------------------------------------------------

/// Every kind of structure that can occupy a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildingKind {
    Solar,
    Miner,
    OilDrill,
    Greenhouse,
    Storage,
    Fabrication,
    Home,
    ResearchStation,
    Generator,
    AdvancedMine,
    DeepMine,
    WaterCollector,
    CrystalMine,
    /// The colony anchor. Indestructible and never placed by the player.
    Spaceship,
    Battery,
    ShieldGenerator,
    /// Debris left by storms. Cleared by salvage.
    Wreckage,
}

impl BuildingKind {
    pub const COUNT: usize = 17;

    pub const ALL: [BuildingKind; BuildingKind::COUNT] = [
        BuildingKind::Solar,
        BuildingKind::Miner,
        BuildingKind::OilDrill,
        BuildingKind::Greenhouse,
        BuildingKind::Storage,
        BuildingKind::Fabrication,
        BuildingKind::Home,
        BuildingKind::ResearchStation,
        BuildingKind::Generator,
        BuildingKind::AdvancedMine,
        BuildingKind::DeepMine,
        BuildingKind::WaterCollector,
        BuildingKind::CrystalMine,
        BuildingKind::Spaceship,
        BuildingKind::Battery,
        BuildingKind::ShieldGenerator,
        BuildingKind::Wreckage,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The camelCase key used in data files.
    pub fn key(self) -> &'static str {
        use BuildingKind::*;
        match self {
            Solar => "solar",
            Miner => "miner",
            OilDrill => "oilDrill",
            Greenhouse => "greenhouse",
            Storage => "storage",
            Fabrication => "fabrication",
            Home => "home",
            ResearchStation => "researchStation",
            Generator => "generator",
            AdvancedMine => "advancedMine",
            DeepMine => "deepMine",
            WaterCollector => "waterCollector",
            CrystalMine => "crystalMine",
            Spaceship => "spaceship",
            Battery => "battery",
            ShieldGenerator => "shieldGenerator",
            Wreckage => "wreckage",
        }
    }

    pub fn from_key(key: &str) -> Option<BuildingKind> {
        BuildingKind::ALL.into_iter().find(|k| k.key() == key)
    }

    /// The anchor and wreckage never take part in power or production.
    pub fn is_passive(self) -> bool {
        matches!(self, BuildingKind::Spaceship | BuildingKind::Wreckage)
    }
}

impl std::fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Capacity added to every raw and every compound resource by a storage
/// building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageBonus {
    pub raw: Fixed64,
    pub compound: Fixed64,
}

/// Static description of a building kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingTypeDef {
    pub kind: BuildingKind,
    pub name: String,
    pub cost: Bundle,
    /// Per-tick output. May include `Power`.
    pub produces: Bundle,
    /// Per-tick draw. May include `Power` and `Fuel`.
    pub consumes: Bundle,
    pub requires_staff: bool,
    pub requires_research: bool,
    pub placeable: bool,
    /// At least one of these kinds must sit orthogonally adjacent.
    pub adjacency: Vec<BuildingKind>,
    pub battery_capacity: Option<Fixed64>,
    pub storage_bonus: Option<StorageBonus>,
    /// Population-cap bonus once complete.
    pub housing: u32,
    pub shield_radius: Option<u32>,
}

impl BuildingTypeDef {
    /// A blank definition: free, unstaffed, placeable, no effects.
    pub fn new(kind: BuildingKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            cost: Vec::new(),
            produces: Vec::new(),
            consumes: Vec::new(),
            requires_staff: false,
            requires_research: false,
            placeable: true,
            adjacency: Vec::new(),
            battery_capacity: None,
            storage_bonus: None,
            housing: 0,
            shield_radius: None,
        }
    }

    /// Amount of `resource` produced per tick (summed over entries).
    pub fn produces_of(&self, resource: Resource) -> Fixed64 {
        sum_of(&self.produces, resource)
    }

    /// Amount of `resource` consumed per tick (summed over entries).
    pub fn consumes_of(&self, resource: Resource) -> Fixed64 {
        sum_of(&self.consumes, resource)
    }
}

fn sum_of(bundle: &[(Resource, Fixed64)], resource: Resource) -> Fixed64 {
    bundle
        .iter()
        .filter(|(r, _)| *r == resource)
        .fold(Fixed64::ZERO, |acc, (_, v)| acc + *v)
}

/// A fabrication recipe. Runs once per tick at full staffing bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDef {
    pub name: String,
    pub inputs: Bundle,
    pub outputs: Bundle,
    pub requires_research: bool,
}

/// A greenhouse crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropDef {
    pub name: String,
    pub produces: Bundle,
    pub consumes: Bundle,
    pub requires_research: bool,
}

/// One roll of the salvage loot table. Unconditional when `chance` is
/// `None`; the amount is uniform in `min ..= max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub resource: Resource,
    pub min: u32,
    pub max: u32,
    pub chance: Option<Fixed64>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable Registry.
/// Three-phase lifecycle: registration -> mutation -> finalization.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    buildings: BTreeMap<BuildingKind, BuildingTypeDef>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: BTreeMap<String, RecipeId>,
    crops: Vec<CropDef>,
    crop_name_to_id: BTreeMap<String, CropId>,
    default_crop: Option<CropId>,
    loot: Vec<LootEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder pre-filled with the standard colony tables.
    pub fn standard() -> Self {
        let mut b = Self::new();
        for kind in BuildingKind::ALL {
            b.register_building(standard_building(kind));
        }
        for recipe in standard_recipes() {
            b.register_recipe(recipe);
        }
        for (i, crop) in standard_crops().into_iter().enumerate() {
            let id = b.register_crop(crop);
            if i == 0 {
                b.set_default_crop(id);
            }
        }
        b.set_loot(standard_loot());
        b
    }

    /// Phase 1: Register (or replace) a building definition.
    pub fn register_building(&mut self, def: BuildingTypeDef) {
        self.buildings.insert(def.kind, def);
    }

    /// Phase 1: Register a recipe. Returns its ID.
    pub fn register_recipe(&mut self, def: RecipeDef) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipe_name_to_id.insert(def.name.clone(), id);
        self.recipes.push(def);
        id
    }

    /// Phase 1: Register a crop. Returns its ID.
    pub fn register_crop(&mut self, def: CropDef) -> CropId {
        let id = CropId(self.crops.len() as u32);
        self.crop_name_to_id.insert(def.name.clone(), id);
        self.crops.push(def);
        id
    }

    pub fn set_default_crop(&mut self, id: CropId) {
        self.default_crop = Some(id);
    }

    pub fn set_loot(&mut self, loot: Vec<LootEntry>) {
        self.loot = loot;
    }

    /// Phase 2: Mutate an existing building definition.
    pub fn mutate_building<F>(&mut self, kind: BuildingKind, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut BuildingTypeDef),
    {
        let def = self
            .buildings
            .get_mut(&kind)
            .ok_or_else(|| RegistryError::NotFound(kind.key().to_string()))?;
        f(def);
        Ok(())
    }

    /// Phase 2: Mutate an existing recipe by name.
    pub fn mutate_recipe<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut RecipeDef),
    {
        let id = self
            .recipe_name_to_id
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        f(&mut self.recipes[id.0 as usize]);
        Ok(())
    }

    /// Phase 2: Mutate an existing crop by name.
    pub fn mutate_crop<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut CropDef),
    {
        let id = self
            .crop_name_to_id
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        f(&mut self.crops[id.0 as usize]);
        Ok(())
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn crop_id(&self, name: &str) -> Option<CropId> {
        self.crop_name_to_id.get(name).copied()
    }

    /// Phase 3: Validate and freeze.
    pub fn build(mut self) -> Result<Registry, RegistryError> {
        let mut buildings = Vec::with_capacity(BuildingKind::COUNT);
        for kind in BuildingKind::ALL {
            let def = self
                .buildings
                .remove(&kind)
                .ok_or(RegistryError::MissingBuilding(kind))?;
            buildings.push(def);
        }

        let default_crop = self.default_crop.ok_or(RegistryError::NoDefaultCrop)?;
        let crop = self
            .crops
            .get(default_crop.0 as usize)
            .ok_or(RegistryError::NoDefaultCrop)?;
        if crop.requires_research {
            return Err(RegistryError::LockedDefaultCrop(crop.name.clone()));
        }

        for entry in &self.loot {
            if entry.min > entry.max {
                return Err(RegistryError::InvalidLoot(entry.resource));
            }
        }

        Ok(Registry {
            buildings,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
            crops: self.crops,
            crop_name_to_id: self.crop_name_to_id,
            default_crop,
            loot: self.loot,
        })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable building, recipe, crop and loot tables. Frozen after build().
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    /// Indexed by `BuildingKind::index()`.
    buildings: Vec<BuildingTypeDef>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: BTreeMap<String, RecipeId>,
    crops: Vec<CropDef>,
    crop_name_to_id: BTreeMap<String, CropId>,
    default_crop: CropId,
    loot: Vec<LootEntry>,
}

impl Registry {
    /// The standard colony tables.
    pub fn standard() -> Self {
        let mut recipe_name_to_id = BTreeMap::new();
        let recipes = standard_recipes();
        for (i, r) in recipes.iter().enumerate() {
            recipe_name_to_id.insert(r.name.clone(), RecipeId(i as u32));
        }
        let mut crop_name_to_id = BTreeMap::new();
        let crops = standard_crops();
        for (i, c) in crops.iter().enumerate() {
            crop_name_to_id.insert(c.name.clone(), CropId(i as u32));
        }
        Self {
            buildings: BuildingKind::ALL.into_iter().map(standard_building).collect(),
            recipes,
            recipe_name_to_id,
            crops,
            crop_name_to_id,
            default_crop: CropId(0),
            loot: standard_loot(),
        }
    }

    /// Every kind is present after a successful build.
    pub fn building(&self, kind: BuildingKind) -> &BuildingTypeDef {
        &self.buildings[kind.index()]
    }

    pub fn buildings(&self) -> impl Iterator<Item = &BuildingTypeDef> {
        self.buildings.iter()
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &RecipeDef)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(i, r)| (RecipeId(i as u32), r))
    }

    pub fn crop(&self, id: CropId) -> Option<&CropDef> {
        self.crops.get(id.0 as usize)
    }

    pub fn crop_id(&self, name: &str) -> Option<CropId> {
        self.crop_name_to_id.get(name).copied()
    }

    pub fn crops(&self) -> impl Iterator<Item = (CropId, &CropDef)> {
        self.crops
            .iter()
            .enumerate()
            .map(|(i, c)| (CropId(i as u32), c))
    }

    /// The crop a new greenhouse starts with.
    pub fn default_crop(&self) -> CropId {
        self.default_crop
    }

    pub fn loot(&self) -> &[LootEntry] {
        &self.loot
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn crop_count(&self) -> usize {
        self.crops.len()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("building kind {0} has no definition")]
    MissingBuilding(BuildingKind),
    #[error("no default crop registered")]
    NoDefaultCrop,
    #[error("default crop {0} requires research")]
    LockedDefaultCrop(String),
    #[error("loot entry for {0} has min greater than max")]
    InvalidLoot(Resource),
}

// ---------------------------------------------------------------------------
// Standard tables
// ---------------------------------------------------------------------------

fn bundle(entries: &[(Resource, f64)]) -> Bundle {
    entries
        .iter()
        .map(|&(r, v)| (r, f64_to_fixed64(v)))
        .collect()
}

/// The standard definition of one building kind.
pub fn standard_building(kind: BuildingKind) -> BuildingTypeDef {
    use BuildingKind as K;
    use Resource::*;

    let mut def = BuildingTypeDef::new(kind, "");
    match kind {
        K::Solar => {
            def.name = "Solar Panel".into();
            def.cost = bundle(&[(Iron, 5.0), (Copper, 2.0)]);
            def.produces = bundle(&[(Power, 5.0)]);
        }
        K::Miner => {
            def.name = "Mining Rig".into();
            def.cost = bundle(&[(Iron, 8.0), (Aluminum, 4.0)]);
            def.produces = bundle(&[
                (Iron, 2.0),
                (Copper, 1.0),
                (Sand, 1.0),
                (Aluminum, 1.0),
                (Carbon, 0.5),
            ]);
            def.consumes = bundle(&[(Power, 2.0)]);
            def.requires_staff = true;
        }
        K::OilDrill => {
            def.name = "Oil Drill".into();
            def.cost = bundle(&[(Iron, 12.0), (Copper, 6.0)]);
            def.produces = bundle(&[(Fuel, 2.0)]);
            def.consumes = bundle(&[(Power, 3.0)]);
            def.requires_staff = true;
        }
        K::Greenhouse => {
            def.name = "Greenhouse".into();
            def.cost = bundle(&[(Iron, 8.0), (Sand, 4.0), (Copper, 3.0)]);
            def.produces = bundle(&[(Food, 4.0), (Oxygen, 3.0)]);
            def.consumes = bundle(&[(Power, 3.0)]);
            def.requires_staff = true;
        }
        K::Storage => {
            def.name = "Storage Depot".into();
            def.cost = bundle(&[(Iron, 10.0), (Aluminum, 6.0)]);
            def.storage_bonus = Some(StorageBonus {
                raw: Fixed64::from_num(25),
                compound: Fixed64::from_num(15),
            });
        }
        K::Fabrication => {
            def.name = "Fabrication Plant".into();
            def.cost = bundle(&[(Iron, 15.0), (Copper, 8.0), (Aluminum, 5.0)]);
            def.consumes = bundle(&[(Power, 2.0)]);
            def.requires_staff = true;
        }
        K::Home => {
            def.name = "Habitat".into();
            def.cost = bundle(&[(Iron, 6.0), (Glass, 4.0), (Plastic, 2.0)]);
            def.housing = 2;
        }
        K::ResearchStation => {
            def.name = "Research Station".into();
            def.cost = bundle(&[(Iron, 10.0), (Glass, 5.0), (Copper, 8.0)]);
            def.consumes = bundle(&[(Power, 3.0)]);
            def.requires_staff = true;
        }
        K::Generator => {
            def.name = "Fuel Generator".into();
            def.cost = bundle(&[(Iron, 12.0), (Steel, 6.0), (Copper, 4.0)]);
            def.produces = bundle(&[(Power, 15.0)]);
            def.consumes = bundle(&[(Fuel, 2.0)]);
            def.requires_staff = true;
        }
        K::AdvancedMine => {
            def.name = "Advanced Mine".into();
            def.cost = bundle(&[(Steel, 20.0), (Glass, 8.0), (Aluminum, 5.0)]);
            def.produces = bundle(&[
                (Stone, 2.0),
                (Carbon, 1.0),
                (Sulfur, 1.0),
                (Silicon, 1.0),
                (ShieldCrystal, 0.05),
            ]);
            def.consumes = bundle(&[(Power, 4.0)]);
            def.requires_staff = true;
            def.requires_research = true;
        }
        K::DeepMine => {
            def.name = "Deep Core Mine".into();
            def.cost = bundle(&[(Steel, 25.0), (Aluminum, 15.0), (Electronics, 8.0)]);
            def.produces = bundle(&[(Diamond, 1.0), (Tungsten, 1.0)]);
            def.consumes = bundle(&[(Power, 6.0)]);
            def.requires_staff = true;
            def.requires_research = true;
        }
        K::WaterCollector => {
            def.name = "Water Collector".into();
            def.cost = bundle(&[(Iron, 12.0), (Aluminum, 8.0), (Copper, 4.0)]);
            def.produces = bundle(&[(Water, 3.0)]);
            def.consumes = bundle(&[(Power, 2.0)]);
            def.requires_staff = true;
            def.adjacency = vec![K::Greenhouse, K::Home];
        }
        K::CrystalMine => {
            def.name = "Crystal Mine".into();
            def.cost = bundle(&[(Steel, 15.0), (Glass, 6.0), (Electronics, 4.0)]);
            def.produces = bundle(&[(ShieldCrystal, 0.2)]);
            def.consumes = bundle(&[(Power, 4.0)]);
            def.requires_staff = true;
            def.requires_research = true;
        }
        K::Spaceship => {
            def.name = "Spaceship".into();
            def.placeable = false;
        }
        K::Battery => {
            def.name = "Battery".into();
            def.cost = bundle(&[(Iron, 10.0), (Copper, 6.0), (Sand, 4.0)]);
            def.battery_capacity = Some(Fixed64::from_num(50));
            def.adjacency = vec![K::Solar];
        }
        K::ShieldGenerator => {
            def.name = "Shield Generator".into();
            def.cost = bundle(&[(ShieldCrystal, 10.0), (Steel, 15.0), (Electronics, 8.0)]);
            def.consumes = bundle(&[(Power, 8.0)]);
            def.shield_radius = Some(3);
        }
        K::Wreckage => {
            def.name = "Wreckage".into();
            def.placeable = false;
        }
    }
    def
}

/// glass, plastic, steel, electronics.
pub fn standard_recipes() -> Vec<RecipeDef> {
    use Resource::*;
    vec![
        RecipeDef {
            name: "glass".into(),
            inputs: bundle(&[(Sand, 2.0)]),
            outputs: bundle(&[(Glass, 1.0)]),
            requires_research: false,
        },
        RecipeDef {
            name: "plastic".into(),
            inputs: bundle(&[(Sand, 2.0), (Fuel, 1.0)]),
            outputs: bundle(&[(Plastic, 2.0)]),
            requires_research: false,
        },
        RecipeDef {
            name: "steel".into(),
            inputs: bundle(&[(Iron, 3.0), (Carbon, 1.0)]),
            outputs: bundle(&[(Steel, 2.0)]),
            requires_research: true,
        },
        RecipeDef {
            name: "electronics".into(),
            inputs: bundle(&[(Copper, 2.0), (Silicon, 1.0), (Glass, 1.0)]),
            outputs: bundle(&[(Electronics, 1.0)]),
            requires_research: true,
        },
    ]
}

/// The first entry is the default crop.
pub fn standard_crops() -> Vec<CropDef> {
    use Resource::*;
    vec![
        CropDef {
            name: "basicAlgae".into(),
            produces: bundle(&[(Food, 4.0), (Oxygen, 3.0)]),
            consumes: Vec::new(),
            requires_research: false,
        },
        CropDef {
            name: "potatoes".into(),
            produces: bundle(&[(Food, 8.0), (Oxygen, 1.0)]),
            consumes: bundle(&[(Water, 1.0)]),
            requires_research: true,
        },
        CropDef {
            name: "soybeans".into(),
            produces: bundle(&[(Food, 6.0), (Oxygen, 4.0)]),
            consumes: bundle(&[(Water, 1.0)]),
            requires_research: true,
        },
        CropDef {
            name: "hydroponics".into(),
            produces: bundle(&[(Food, 12.0), (Oxygen, 2.0)]),
            consumes: bundle(&[(Water, 3.0)]),
            requires_research: true,
        },
        CropDef {
            name: "oxygenGarden".into(),
            produces: bundle(&[(Food, 2.0), (Oxygen, 10.0)]),
            consumes: bundle(&[(Water, 2.0)]),
            requires_research: true,
        },
    ]
}

pub fn standard_loot() -> Vec<LootEntry> {
    use Resource::*;
    let always = |resource, min, max| LootEntry {
        resource,
        min,
        max,
        chance: None,
    };
    vec![
        always(Iron, 3, 10),
        always(Copper, 2, 6),
        always(Sand, 1, 5),
        always(Aluminum, 1, 5),
        LootEntry {
            resource: Fuel,
            min: 5,
            max: 10,
            chance: Some(f64_to_fixed64(0.2)),
        },
    ]
}
