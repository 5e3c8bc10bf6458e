//! Research state machine for the colony.
//!
//! Technologies are registered at startup via [`TechTree::register`]. Each
//! [`Technology`] has prerequisites, a resource cost paid up front, a
//! duration in ticks and a list of [`Unlock`]s.
//!
//! At most one technology is researched at a time:
//!
//! ```text
//! Idle --start_research--> Active(tech, elapsed) --advance x duration--> Completed
//!  ^                                                                        |
//!  +------------------------------------------------------------------------+
//! ```
//!
//! Progress only advances on ticks where the caller reports a staffed
//! research station; otherwise it is frozen. Completing a technology
//! appends its unlocks to the append-only [`UnlockSet`] and emits a
//! [`TechEvent::ResearchCompleted`].
//!
//! Paying the cost is the caller's job: check with
//! [`TechTree::check_can_start`], spend from the ledger, then call
//! [`TechTree::start_research`].

use std::collections::{BTreeMap, BTreeSet};

use colony_core::fixed::{Fixed64, Ticks, fraction};
use colony_core::id::{CropId, RecipeId};
use colony_core::ledger::Bundle;
use colony_core::registry::{BuildingKind, Registry};
use colony_core::resource::Resource;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifies a technology. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TechId(pub u32);

// ---------------------------------------------------------------------------
// Unlocks
// ---------------------------------------------------------------------------

/// What completing a technology unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unlock {
    Building(BuildingKind),
    Recipe(RecipeId),
    Crop(CropId),
}

/// Everything unlocked so far. Entries are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockSet {
    pub buildings: BTreeSet<BuildingKind>,
    pub recipes: BTreeSet<RecipeId>,
    pub crops: BTreeSet<CropId>,
}

impl UnlockSet {
    pub fn apply(&mut self, unlock: &Unlock) {
        match *unlock {
            Unlock::Building(kind) => {
                self.buildings.insert(kind);
            }
            Unlock::Recipe(id) => {
                self.recipes.insert(id);
            }
            Unlock::Crop(id) => {
                self.crops.insert(id);
            }
        }
    }

    pub fn has_building(&self, kind: BuildingKind) -> bool {
        self.buildings.contains(&kind)
    }

    pub fn has_recipe(&self, id: RecipeId) -> bool {
        self.recipes.contains(&id)
    }

    pub fn has_crop(&self, id: CropId) -> bool {
        self.crops.contains(&id)
    }
}

// ---------------------------------------------------------------------------
// Technology definition
// ---------------------------------------------------------------------------

/// A technology that can be researched. Immutable after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    pub id: TechId,
    /// Stable key used by data files and commands (`"advancedMining"`).
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// Technologies that must be completed before this one can start.
    pub prerequisites: Vec<TechId>,
    /// Resources paid when research starts.
    pub cost: Bundle,
    /// Staffed ticks needed to complete.
    pub duration: Ticks,
    pub unlocks: Vec<Unlock>,
}

// ---------------------------------------------------------------------------
// Research state (runtime)
// ---------------------------------------------------------------------------

/// The technology being researched and how far along it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveResearch {
    pub tech: TechId,
    /// Staffed ticks accumulated so far.
    pub elapsed: Ticks,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events emitted by the tech tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TechEvent {
    ResearchStarted { tech_id: TechId, tick: Ticks },
    ResearchCompleted {
        tech_id: TechId,
        unlocks: Vec<Unlock>,
        tick: Ticks,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TechTreeError {
    #[error("technology not found: {0:?}")]
    TechNotFound(TechId),

    #[error("prerequisite not met: {0:?} requires {1:?}")]
    PrerequisiteNotMet(TechId, TechId),

    #[error("technology {0:?} is already being researched")]
    AlreadyInProgress(TechId),

    #[error("technology {0:?} is already completed")]
    AlreadyCompleted(TechId),

    #[error("duplicate technology id: {0:?}")]
    DuplicateId(TechId),

    #[error("duplicate technology key: {0}")]
    DuplicateKey(String),

    #[error("prerequisite {prereq:?} for technology {tech:?} does not exist")]
    InvalidPrerequisite { tech: TechId, prereq: TechId },
}

// ---------------------------------------------------------------------------
// TechTree
// ---------------------------------------------------------------------------

/// Technology definitions plus runtime research state. Serializable for
/// save/load; pending events are transient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechTree {
    technologies: BTreeMap<TechId, Technology>,
    key_to_id: BTreeMap<String, TechId>,
    /// Completed technologies in completion order.
    completed: Vec<TechId>,
    active: Option<ActiveResearch>,
    unlocks: UnlockSet,
    next_id: u32,
    #[serde(skip)]
    events: Vec<TechEvent>,
}

impl Default for TechTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TechTree {
    pub fn new() -> Self {
        Self {
            technologies: BTreeMap::new(),
            key_to_id: BTreeMap::new(),
            completed: Vec::new(),
            active: None,
            unlocks: UnlockSet::default(),
            next_id: 0,
            events: Vec::new(),
        }
    }

    /// The standard colony research tree. Recipe and crop unlocks are
    /// resolved by name against `registry`; names it lacks are skipped.
    pub fn standard(registry: &Registry) -> Self {
        use Resource::*;

        let mut tree = Self::new();
        let n = Fixed64::from_num::<i32>;
        let recipe = |name: &str| registry.recipe_id(name).map(Unlock::Recipe);
        let crop = |name: &str| registry.crop_id(name).map(Unlock::Crop);

        let advanced_mining = tree.next_tech_id();
        tree.insert(Technology {
            id: advanced_mining,
            key: "advancedMining".into(),
            name: "Advanced Mining".into(),
            prerequisites: vec![],
            cost: vec![(Iron, n(30)), (Copper, n(20))],
            duration: 60,
            unlocks: [
                Some(Unlock::Building(BuildingKind::AdvancedMine)),
                Some(Unlock::Building(BuildingKind::CrystalMine)),
                recipe("steel"),
            ]
            .into_iter()
            .flatten()
            .collect(),
        });

        let compound_fab = tree.next_tech_id();
        tree.insert(Technology {
            id: compound_fab,
            key: "compoundFab".into(),
            name: "Compound Fabrication".into(),
            prerequisites: vec![],
            cost: vec![(Iron, n(20)), (Glass, n(5))],
            duration: 45,
            unlocks: recipe("electronics").into_iter().collect(),
        });

        let deep_mining = tree.next_tech_id();
        tree.insert(Technology {
            id: deep_mining,
            key: "deepMining".into(),
            name: "Deep Mining".into(),
            prerequisites: vec![advanced_mining],
            cost: vec![(Steel, n(20)), (Electronics, n(5))],
            duration: 90,
            unlocks: vec![Unlock::Building(BuildingKind::DeepMine)],
        });

        let seeds_1 = tree.next_tech_id();
        tree.insert(Technology {
            id: seeds_1,
            key: "seedResearch1".into(),
            name: "Seed Research I".into(),
            prerequisites: vec![],
            cost: vec![(Food, n(50)), (Iron, n(10)), (Glass, n(5))],
            duration: 45,
            unlocks: [crop("potatoes"), crop("soybeans")]
                .into_iter()
                .flatten()
                .collect(),
        });

        let seeds_2 = tree.next_tech_id();
        tree.insert(Technology {
            id: seeds_2,
            key: "seedResearch2".into(),
            name: "Seed Research II".into(),
            prerequisites: vec![seeds_1],
            cost: vec![(Food, n(100)), (Glass, n(10)), (Plastic, n(5))],
            duration: 75,
            unlocks: [crop("hydroponics"), crop("oxygenGarden")]
                .into_iter()
                .flatten()
                .collect(),
        });

        tree
    }

    // -- Registration API --

    /// Register a technology. Its id and key must be unique and every
    /// prerequisite must already be registered.
    pub fn register(&mut self, tech: Technology) -> Result<TechId, TechTreeError> {
        let id = tech.id;

        if self.technologies.contains_key(&id) {
            return Err(TechTreeError::DuplicateId(id));
        }
        if self.key_to_id.contains_key(&tech.key) {
            return Err(TechTreeError::DuplicateKey(tech.key));
        }
        for prereq in &tech.prerequisites {
            if !self.technologies.contains_key(prereq) {
                return Err(TechTreeError::InvalidPrerequisite {
                    tech: id,
                    prereq: *prereq,
                });
            }
        }

        self.insert(tech);
        Ok(id)
    }

    fn insert(&mut self, tech: Technology) {
        let id = tech.id;
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
        self.key_to_id.insert(tech.key.clone(), id);
        self.technologies.insert(id, tech);
    }

    /// Allocate the next available TechId.
    pub fn next_tech_id(&mut self) -> TechId {
        let id = TechId(self.next_id);
        self.next_id += 1;
        id
    }

    // -- Query API --

    pub fn technology(&self, id: TechId) -> Option<&Technology> {
        self.technologies.get(&id)
    }

    pub fn technologies(&self) -> impl Iterator<Item = &Technology> {
        self.technologies.values()
    }

    pub fn tech_id(&self, key: &str) -> Option<TechId> {
        self.key_to_id.get(key).copied()
    }

    pub fn technology_count(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_completed(&self, id: TechId) -> bool {
        self.completed.contains(&id)
    }

    pub fn completed(&self) -> &[TechId] {
        &self.completed
    }

    pub fn active(&self) -> Option<ActiveResearch> {
        self.active
    }

    pub fn unlocks(&self) -> &UnlockSet {
        &self.unlocks
    }

    /// Progress of the active research in `[0, 1]`; zero when idle.
    pub fn progress(&self) -> Fixed64 {
        match self.active {
            Some(active) => {
                let duration = self
                    .technologies
                    .get(&active.tech)
                    .map_or(0, |t| t.duration);
                fraction(active.elapsed, duration)
            }
            None => Fixed64::ZERO,
        }
    }

    /// Validate that `id` could start now, ignoring cost. Returns the
    /// technology so the caller can charge its cost.
    pub fn check_can_start(&self, id: TechId) -> Result<&Technology, TechTreeError> {
        let tech = self
            .technologies
            .get(&id)
            .ok_or(TechTreeError::TechNotFound(id))?;

        if let Some(active) = self.active {
            return Err(TechTreeError::AlreadyInProgress(active.tech));
        }
        if self.is_completed(id) {
            return Err(TechTreeError::AlreadyCompleted(id));
        }
        for prereq in &tech.prerequisites {
            if !self.is_completed(*prereq) {
                return Err(TechTreeError::PrerequisiteNotMet(id, *prereq));
            }
        }
        Ok(tech)
    }

    // -- Runtime API --

    /// Make `id` the active research. The cost must already be paid.
    /// Emits `ResearchStarted` on success.
    pub fn start_research(&mut self, id: TechId, tick: Ticks) -> Result<(), TechTreeError> {
        self.check_can_start(id)?;
        self.active = Some(ActiveResearch { tech: id, elapsed: 0 });
        self.events.push(TechEvent::ResearchStarted { tech_id: id, tick });
        Ok(())
    }

    /// Advance the active research by one tick if `staffed`. Returns the
    /// technology completed on this tick, if any.
    pub fn advance(&mut self, staffed: bool, tick: Ticks) -> Option<TechId> {
        if !staffed {
            return None;
        }
        let active = self.active.as_mut()?;
        active.elapsed += 1;
        let id = active.tech;
        let elapsed = active.elapsed;

        let duration = self.technologies.get(&id).map_or(0, |t| t.duration);
        if elapsed >= duration {
            self.complete_research(id, tick);
            return Some(id);
        }
        None
    }

    // -- Event API --

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> Vec<TechEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[TechEvent] {
        &self.events
    }

    // -- Internal helpers --

    fn complete_research(&mut self, id: TechId, tick: Ticks) {
        let unlocks = self
            .technologies
            .get(&id)
            .map(|t| t.unlocks.clone())
            .unwrap_or_default();
        for unlock in &unlocks {
            self.unlocks.apply(unlock);
        }
        self.completed.push(id);
        self.active = None;
        self.events.push(TechEvent::ResearchCompleted {
            tech_id: id,
            unlocks,
            tick,
        });
    }
}
