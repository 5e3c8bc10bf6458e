//! Research stage: pay for and start a technology, then advance it while a
//! staffed station is powered.

use colony_core::registry::BuildingKind;
use colony_tech_tree::{TechEvent, TechId};

use crate::colony::Colony;
use crate::error::{CommandError, rejected};
use crate::event::ColonyEvent;

impl Colony {
    /// Pay for `tech` and make it the active research.
    pub fn start_research(&mut self, tech: TechId) -> bool {
        match self.try_start_research(tech) {
            Ok(()) => true,
            Err(err) => rejected("start_research", err),
        }
    }

    fn try_start_research(&mut self, tech: TechId) -> Result<(), CommandError> {
        let cost = self.tech.check_can_start(tech)?.cost.clone();
        self.ledger.try_spend(&cost)?;
        self.tech.start_research(tech, self.sim.tick)?;
        self.forward_tech_events();
        Ok(())
    }

    /// Research advances one tick while any completed research station is
    /// powered and has a worker on site.
    pub(crate) fn process_research(&mut self) {
        let staffed = self.ordered().any(|(id, b)| {
            b.kind == BuildingKind::ResearchStation
                && !b.constructing
                && b.active
                && self.workers(id) > 0
        });
        if let Some(done) = self.tech.advance(staffed, self.sim.tick) {
            let name = self
                .tech
                .technology(done)
                .map(|t| t.name.as_str())
                .unwrap_or_default();
            tracing::info!(tech = name, tick = self.sim.tick, "research completed");
        }
        self.forward_tech_events();
    }

    fn forward_tech_events(&mut self) {
        for event in self.tech.drain_events() {
            let event = match event {
                TechEvent::ResearchStarted { tech_id, tick } => ColonyEvent::ResearchStarted {
                    tech: tech_id,
                    tick,
                },
                TechEvent::ResearchCompleted { tech_id, tick, .. } => {
                    ColonyEvent::ResearchCompleted {
                        tech: tech_id,
                        tick,
                    }
                }
            };
            self.emit(event);
        }
    }
}
