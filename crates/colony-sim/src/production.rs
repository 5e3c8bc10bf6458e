//! Production stage: generic output, fabrication, greenhouses, settler
//! upkeep and the life-support post-pass.

use colony_core::building::KindState;
use colony_core::fixed::Fixed64;
use colony_core::id::{BuildingId, CropId, RecipeId};
use colony_core::position::GridPosition;
use colony_core::registry::BuildingKind;
use colony_core::resource::Resource;

use crate::colony::Colony;
use crate::error::{CommandError, rejected};
use crate::event::ColonyEvent;

impl Colony {
    pub(crate) fn process_production(&mut self) {
        let ids = self.operational_ids();
        for &id in &ids {
            let state = match self.buildings.get(id) {
                Some(b) if b.active => b.state.clone(),
                _ => continue,
            };
            match state {
                KindState::Fabrication { active_recipe } => self.run_fabrication(id, active_recipe),
                KindState::Greenhouse { crop } => self.run_greenhouse(id, crop),
                KindState::Plain | KindState::Battery { .. } | KindState::Wreckage => {
                    self.run_generic(id)
                }
            }
        }

        self.apply_upkeep();
        self.check_life_support(&ids);
    }

    /// Fixed output table scaled by staffing, less any fuel draw.
    fn run_generic(&mut self, id: BuildingId) {
        let Some(b) = self.buildings.get(id) else {
            return;
        };
        let def = self.registry.building(b.kind);
        let multiplier = if def.requires_staff {
            self.config.worker_multiplier(self.workers(id))
        } else {
            Fixed64::from_num(1)
        };

        let fuel = def.consumes_of(Resource::Fuel);
        if fuel > Fixed64::ZERO {
            self.ledger.remove(Resource::Fuel, fuel);
        }
        for &(resource, amount) in &def.produces {
            if resource == Resource::Power {
                continue;
            }
            self.ledger.add(resource, amount * multiplier);
        }
    }

    fn run_fabrication(&mut self, id: BuildingId, recipe: Option<RecipeId>) {
        let Some(recipe_id) = recipe else {
            return;
        };
        if !self.is_recipe_unlocked(recipe_id) {
            return;
        }
        let Some(recipe) = self.registry.recipe(recipe_id) else {
            return;
        };
        if self.ledger.try_spend(&recipe.inputs).is_err() {
            return;
        }
        let multiplier = self.config.fabrication_multiplier(self.workers(id));
        for &(resource, amount) in &recipe.outputs {
            self.ledger.add(resource, amount * multiplier);
        }
    }

    fn run_greenhouse(&mut self, id: BuildingId, crop: CropId) {
        let Some(def) = self
            .registry
            .crop(crop)
            .or_else(|| self.registry.crop(self.registry.default_crop()))
        else {
            return;
        };
        if self.ledger.try_spend(&def.consumes).is_err() {
            return;
        }
        let multiplier = self.config.worker_multiplier(self.workers(id));
        for &(resource, amount) in &def.produces {
            self.ledger.add(resource, amount * multiplier);
        }
    }

    /// Every `depletion_interval` ticks each settler consumes oxygen, food
    /// and water.
    fn apply_upkeep(&mut self) {
        self.sim.depletion_counter += 1;
        if self.sim.depletion_counter < self.config.depletion_interval {
            return;
        }
        self.sim.depletion_counter = 0;

        let population = Fixed64::from_num(self.settlers.len());
        for (resource, per_settler) in [
            (Resource::Oxygen, self.config.upkeep_oxygen),
            (Resource::Food, self.config.upkeep_food),
            (Resource::Water, self.config.upkeep_water),
        ] {
            self.ledger.remove(resource, per_settler * population);
        }
    }

    /// With any life-support resource exhausted, every building that needs
    /// staff is switched off for the rest of the tick.
    fn check_life_support(&mut self, ids: &[BuildingId]) {
        let critical = Resource::life_support()
            .into_iter()
            .any(|r| self.ledger.get(r) <= Fixed64::ZERO);

        if critical {
            for &id in ids {
                let Some(b) = self.buildings.get_mut(id) else {
                    continue;
                };
                if self.registry.building(b.kind).requires_staff {
                    b.active = false;
                }
            }
        }

        let tick = self.sim.tick;
        match (self.life_support_critical, critical) {
            (false, true) => {
                tracing::info!(
                    oxygen = %self.ledger.get(Resource::Oxygen),
                    food = %self.ledger.get(Resource::Food),
                    water = %self.ledger.get(Resource::Water),
                    "life support critical"
                );
                self.emit(ColonyEvent::LifeSupportCritical { tick });
            }
            (true, false) => {
                tracing::info!("life support restored");
                self.emit(ColonyEvent::LifeSupportRestored { tick });
            }
            _ => {}
        }
        self.life_support_critical = critical;
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Choose what a fabrication plant makes. `None` stops it.
    pub fn set_active_recipe(&mut self, x: i32, y: i32, recipe: Option<RecipeId>) -> bool {
        match self.try_set_active_recipe(GridPosition::new(x, y), recipe) {
            Ok(()) => true,
            Err(err) => rejected("set_active_recipe", err),
        }
    }

    fn try_set_active_recipe(
        &mut self,
        pos: GridPosition,
        recipe: Option<RecipeId>,
    ) -> Result<(), CommandError> {
        let (id, b) = self.building_entry(pos)?;
        if b.kind != BuildingKind::Fabrication {
            return Err(CommandError::WrongKind {
                expected: BuildingKind::Fabrication,
                found: b.kind,
            });
        }
        if let Some(r) = recipe {
            if self.registry.recipe(r).is_none() {
                return Err(CommandError::UnknownRecipe(r));
            }
            if !self.is_recipe_unlocked(r) {
                return Err(CommandError::RecipeLocked(r));
            }
        }
        if let Some(b) = self.buildings.get_mut(id) {
            b.state = KindState::Fabrication {
                active_recipe: recipe,
            };
        }
        Ok(())
    }

    /// Choose what a greenhouse grows.
    pub fn set_selected_crop(&mut self, x: i32, y: i32, crop: CropId) -> bool {
        match self.try_set_selected_crop(GridPosition::new(x, y), crop) {
            Ok(()) => true,
            Err(err) => rejected("set_selected_crop", err),
        }
    }

    fn try_set_selected_crop(&mut self, pos: GridPosition, crop: CropId) -> Result<(), CommandError> {
        let (id, b) = self.building_entry(pos)?;
        if b.kind != BuildingKind::Greenhouse {
            return Err(CommandError::WrongKind {
                expected: BuildingKind::Greenhouse,
                found: b.kind,
            });
        }
        if self.registry.crop(crop).is_none() {
            return Err(CommandError::UnknownCrop(crop));
        }
        if !self.is_crop_unlocked(crop) {
            return Err(CommandError::CropLocked(crop));
        }
        if let Some(b) = self.buildings.get_mut(id) {
            b.state = KindState::Greenhouse { crop };
        }
        Ok(())
    }
}
