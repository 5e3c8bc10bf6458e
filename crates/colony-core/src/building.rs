use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, Ticks, fraction};
use crate::id::{CropId, RecipeId, SettlerId};
use crate::position::GridPosition;
use crate::registry::{BuildingKind, Registry};

/// Kind-specific state carried by a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KindState {
    Plain,
    Fabrication { active_recipe: Option<RecipeId> },
    Greenhouse { crop: CropId },
    Battery { charge: Fixed64 },
    /// Salvage is in progress while the building's `constructing` flag is set.
    Wreckage,
}

impl KindState {
    /// Initial payload for a freshly created building of `kind`.
    pub fn initial(kind: BuildingKind, registry: &Registry) -> Self {
        match kind {
            BuildingKind::Fabrication => KindState::Fabrication { active_recipe: None },
            BuildingKind::Greenhouse => KindState::Greenhouse {
                crop: registry.default_crop(),
            },
            BuildingKind::Battery => KindState::Battery {
                charge: Fixed64::ZERO,
            },
            BuildingKind::Wreckage => KindState::Wreckage,
            BuildingKind::Solar
            | BuildingKind::Miner
            | BuildingKind::OilDrill
            | BuildingKind::Storage
            | BuildingKind::Home
            | BuildingKind::ResearchStation
            | BuildingKind::Generator
            | BuildingKind::AdvancedMine
            | BuildingKind::DeepMine
            | BuildingKind::WaterCollector
            | BuildingKind::CrystalMine
            | BuildingKind::Spaceship
            | BuildingKind::ShieldGenerator => KindState::Plain,
        }
    }
}

/// A structure on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub kind: BuildingKind,
    pub position: GridPosition,
    pub active: bool,
    /// Under construction, or being salvaged for wreckage.
    pub constructing: bool,
    /// Builder-ticks accumulated toward completion.
    pub build_work: Ticks,
    pub settlers: Vec<SettlerId>,
    /// Adjacency requirement unmet during the last power pass.
    pub not_connected: bool,
    pub state: KindState,
}

impl Building {
    /// A newly placed construction site.
    pub fn construction_site(kind: BuildingKind, position: GridPosition, registry: &Registry) -> Self {
        Self {
            kind,
            position,
            active: false,
            constructing: true,
            build_work: 0,
            settlers: Vec::new(),
            not_connected: false,
            state: KindState::initial(kind, registry),
        }
    }

    /// A passive, already-complete structure (anchor or wreckage).
    pub fn passive(kind: BuildingKind, position: GridPosition, registry: &Registry) -> Self {
        Self {
            constructing: false,
            ..Self::construction_site(kind, position, registry)
        }
    }

    pub fn is_wreckage(&self) -> bool {
        self.kind == BuildingKind::Wreckage
    }

    pub fn is_anchor(&self) -> bool {
        self.kind == BuildingKind::Spaceship
    }

    /// Wreckage with salvage in progress.
    pub fn is_salvaging(&self) -> bool {
        self.is_wreckage() && self.constructing
    }

    /// Completed and able to take part in power and production.
    pub fn is_operational(&self) -> bool {
        !self.constructing && !self.kind.is_passive()
    }

    /// Progress toward completion in `[0, 1]`.
    pub fn build_progress(&self, duration: Ticks) -> Fixed64 {
        fraction(self.build_work, duration)
    }

    pub fn has_settler(&self, id: SettlerId) -> bool {
        self.settlers.contains(&id)
    }

    pub fn battery_charge(&self) -> Option<Fixed64> {
        match self.state {
            KindState::Battery { charge } => Some(charge),
            _ => None,
        }
    }

    pub fn active_recipe(&self) -> Option<RecipeId> {
        match self.state {
            KindState::Fabrication { active_recipe } => active_recipe,
            _ => None,
        }
    }

    pub fn crop(&self) -> Option<CropId> {
        match self.state {
            KindState::Greenhouse { crop } => Some(crop),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_site_starts_inactive() {
        let reg = Registry::standard();
        let b = Building::construction_site(BuildingKind::Miner, GridPosition::new(3, 4), &reg);
        assert!(b.constructing);
        assert!(!b.active);
        assert_eq!(b.build_progress(45), Fixed64::ZERO);
        assert_eq!(b.state, KindState::Plain);
        assert!(!b.is_operational());
    }

    #[test]
    fn payload_matches_kind() {
        let reg = Registry::standard();
        let pos = GridPosition::new(0, 0);
        let gh = Building::construction_site(BuildingKind::Greenhouse, pos, &reg);
        assert_eq!(gh.crop(), Some(reg.default_crop()));
        let bat = Building::construction_site(BuildingKind::Battery, pos, &reg);
        assert_eq!(bat.battery_charge(), Some(Fixed64::ZERO));
        let fab = Building::construction_site(BuildingKind::Fabrication, pos, &reg);
        assert_eq!(fab.active_recipe(), None);
        assert!(matches!(fab.state, KindState::Fabrication { .. }));
    }

    #[test]
    fn wreckage_is_passive_until_salvaged() {
        let reg = Registry::standard();
        let mut w = Building::passive(BuildingKind::Wreckage, GridPosition::new(1, 1), &reg);
        assert!(!w.constructing);
        assert!(!w.is_salvaging());
        assert!(!w.is_operational());
        w.constructing = true;
        assert!(w.is_salvaging());
    }

    #[test]
    fn progress_reaches_one_exactly() {
        let reg = Registry::standard();
        let mut b = Building::construction_site(BuildingKind::Solar, GridPosition::new(0, 0), &reg);
        b.build_work = 44;
        assert!(b.build_progress(45) < Fixed64::from_num(1));
        b.build_work = 45;
        assert_eq!(b.build_progress(45), Fixed64::from_num(1));
    }
}
