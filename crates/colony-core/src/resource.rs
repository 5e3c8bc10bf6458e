use serde::{Deserialize, Serialize};

/// Broad grouping used for storage capacity bonuses and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    /// Power plus life support and fuel.
    Essential,
    /// Mined materials.
    Raw,
    /// Fabricated materials.
    Compound,
}

/// Every resource tracked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Power,
    Oxygen,
    Food,
    Water,
    Fuel,
    Iron,
    Copper,
    Sand,
    Aluminum,
    Stone,
    Carbon,
    Sulfur,
    Silicon,
    ShieldCrystal,
    Diamond,
    Tungsten,
    Steel,
    Glass,
    Plastic,
    Electronics,
}

impl Resource {
    pub const COUNT: usize = 20;

    pub const ALL: [Resource; Resource::COUNT] = [
        Resource::Power,
        Resource::Oxygen,
        Resource::Food,
        Resource::Water,
        Resource::Fuel,
        Resource::Iron,
        Resource::Copper,
        Resource::Sand,
        Resource::Aluminum,
        Resource::Stone,
        Resource::Carbon,
        Resource::Sulfur,
        Resource::Silicon,
        Resource::ShieldCrystal,
        Resource::Diamond,
        Resource::Tungsten,
        Resource::Steel,
        Resource::Glass,
        Resource::Plastic,
        Resource::Electronics,
    ];

    /// Dense index into ledger arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn category(self) -> ResourceCategory {
        use Resource::*;
        match self {
            Power | Oxygen | Food | Water | Fuel => ResourceCategory::Essential,
            Iron | Copper | Sand | Aluminum | Stone | Carbon | Sulfur | Silicon
            | ShieldCrystal | Diamond | Tungsten => ResourceCategory::Raw,
            Steel | Glass | Plastic | Electronics => ResourceCategory::Compound,
        }
    }

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        use Resource::*;
        match self {
            Power => "Power",
            Oxygen => "Oxygen",
            Food => "Food",
            Water => "Water",
            Fuel => "Fuel",
            Iron => "Iron",
            Copper => "Copper",
            Sand => "Sand",
            Aluminum => "Aluminum",
            Stone => "Stone",
            Carbon => "Carbon",
            Sulfur => "Sulfur",
            Silicon => "Silicon",
            ShieldCrystal => "Shield Crystal",
            Diamond => "Diamond",
            Tungsten => "Tungsten",
            Steel => "Steel",
            Glass => "Glass",
            Plastic => "Plastic",
            Electronics => "Electronics",
        }
    }

    /// The camelCase key used in data files (`"shieldCrystal"`).
    pub fn key(self) -> &'static str {
        use Resource::*;
        match self {
            Power => "power",
            Oxygen => "oxygen",
            Food => "food",
            Water => "water",
            Fuel => "fuel",
            Iron => "iron",
            Copper => "copper",
            Sand => "sand",
            Aluminum => "aluminum",
            Stone => "stone",
            Carbon => "carbon",
            Sulfur => "sulfur",
            Silicon => "silicon",
            ShieldCrystal => "shieldCrystal",
            Diamond => "diamond",
            Tungsten => "tungsten",
            Steel => "steel",
            Glass => "glass",
            Plastic => "plastic",
            Electronics => "electronics",
        }
    }

    /// Inverse of [`Resource::key`].
    pub fn from_key(key: &str) -> Option<Resource> {
        Resource::ALL.into_iter().find(|r| r.key() == key)
    }

    /// Iterator over every resource in a category.
    pub fn in_category(category: ResourceCategory) -> impl Iterator<Item = Resource> {
        Resource::ALL
            .into_iter()
            .filter(move |r| r.category() == category)
    }

    /// Life-support resources drained by settler upkeep.
    pub fn life_support() -> [Resource; 3] {
        [Resource::Oxygen, Resource::Food, Resource::Water]
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
