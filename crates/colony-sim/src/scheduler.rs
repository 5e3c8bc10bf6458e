//! Settler assignment, movement and population growth.
//!
//! Assignment links both sides: the settler's `assigned` handle and the
//! building's `settlers` list always agree. Movement is presentation only:
//! [`Colony::update_settlers`] eases settlers toward their targets and flips
//! them to `Building`/`Working` on arrival, which is what staffing counts.

use colony_core::building::Building;
use colony_core::id::{BuildingId, SettlerId};
use colony_core::position::GridPosition;
use colony_core::registry::BuildingKind;
use colony_core::settler::SettlerState;

use crate::colony::Colony;
use crate::error::{CommandError, rejected};
use crate::event::ColonyEvent;

/// Arrival threshold in cells.
const ARRIVAL_DISTANCE: f64 = 0.1;
/// Wander radius around the current position, in cells.
const WANDER_RANGE: f64 = 6.0;
/// Scatter around the anchor when heading home at night.
const SHELTER_SCATTER: f64 = 0.5;
/// Dwell after arriving somewhere without an assignment: `base + rand * spread`.
const DWELL_BASE: f64 = 1.5;
const DWELL_SPREAD: f64 = 3.0;
/// Dwell after being released from a building.
const RELEASE_DWELL: f64 = 0.5;
const JITTER_AMPLITUDE: f64 = 0.3;
/// Fraction of the remaining distance closed per 60 fps frame while on site.
const ON_SITE_EASE: f64 = 0.05;

impl Colony {
    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Send a settler to the building at `(x, y)`. A manual assignment
    /// keeps the settler out of auto-assignment until released.
    pub fn assign_settler_to_building(
        &mut self,
        settler: SettlerId,
        x: i32,
        y: i32,
        manual: bool,
    ) -> bool {
        let result = self
            .building_entry(GridPosition::new(x, y))
            .map(|(id, _)| id)
            .and_then(|id| self.try_assign(settler, id, manual));
        match result {
            Ok(()) => true,
            Err(err) => rejected("assign_settler_to_building", err),
        }
    }

    /// Release a settler from its building. Idempotent.
    pub fn unassign_settler(&mut self, settler: SettlerId) -> bool {
        if self.settlers.get(settler.0 as usize).is_none() {
            return rejected("unassign_settler", CommandError::UnknownSettler(settler));
        }
        self.release_settler(settler);
        true
    }

    pub(crate) fn try_assign(
        &mut self,
        settler: SettlerId,
        building: BuildingId,
        manual: bool,
    ) -> Result<(), CommandError> {
        if self.settlers.get(settler.0 as usize).is_none() {
            return Err(CommandError::UnknownSettler(settler));
        }
        let b = self
            .buildings
            .get(building)
            .ok_or(CommandError::StaleBuilding)?;
        let pos = b.position;
        if b.is_wreckage() && !b.constructing {
            return Err(CommandError::IdleWreckage(pos));
        }
        let others = b.settlers.iter().filter(|id| **id != settler).count();
        if others >= self.config.max_settlers_per_building as usize {
            return Err(CommandError::BuildingFull(pos));
        }

        self.detach(settler);
        if let Some(b) = self.buildings.get_mut(building) {
            b.settlers.push(settler);
        }
        if let Some(s) = self.settlers.get_mut(settler.0 as usize) {
            s.assigned = Some(building);
            s.target = Some(pos.center());
            s.state = SettlerState::Walking;
            s.idle_timer = 0.0;
            s.manually_assigned = manual;
        }
        tracing::debug!(settler = settler.0, x = pos.x, y = pos.y, manual, "settler assigned");
        Ok(())
    }

    /// Unlink a settler from its building, leaving its state untouched.
    fn detach(&mut self, settler: SettlerId) {
        let Some(s) = self.settlers.get_mut(settler.0 as usize) else {
            return;
        };
        if let Some(prev) = s.assigned.take() {
            if let Some(b) = self.buildings.get_mut(prev) {
                b.settlers.retain(|id| *id != settler);
            }
        }
    }

    /// Full release: unlink, go idle, clear target and manual flag.
    pub(crate) fn release_settler(&mut self, settler: SettlerId) {
        self.detach(settler);
        if let Some(s) = self.settlers.get_mut(settler.0 as usize) {
            s.state = SettlerState::Idle;
            s.idle_timer = RELEASE_DWELL;
            s.target = None;
            s.manually_assigned = false;
        }
    }

    /// Release every settler assigned to a building.
    pub(crate) fn release_all(&mut self, building: BuildingId) {
        let assigned = self
            .buildings
            .get(building)
            .map(|b| b.settlers.clone())
            .unwrap_or_default();
        for settler in assigned {
            self.release_settler(settler);
        }
    }

    // -----------------------------------------------------------------------
    // Auto-assignment stage
    // -----------------------------------------------------------------------

    /// Send each idle, unassigned, non-manual settler to the nearest
    /// understaffed site, or failing that the nearest unstaffed building
    /// that needs workers.
    pub(crate) fn auto_assign_settlers(&mut self) {
        let cap = self.config.max_settlers_per_building as usize;
        let idle: Vec<SettlerId> = self
            .settlers
            .iter()
            .filter(|s| s.is_available())
            .map(|s| s.id)
            .collect();

        for settler in idle {
            let Some(s) = self.settlers.get(settler.0 as usize) else {
                continue;
            };
            let (x, y) = (s.x, s.y);

            let target = self
                .nearest_building(x, y, |b| b.constructing && b.settlers.len() < cap)
                .or_else(|| {
                    self.nearest_building(x, y, |b| {
                        !b.constructing
                            && !b.is_wreckage()
                            && self.registry.building(b.kind).requires_staff
                            && self.is_unlocked(b.kind)
                            && b.settlers.is_empty()
                    })
                });

            if let Some(id) = target {
                if let Err(err) = self.try_assign(settler, id, false) {
                    tracing::debug!(%err, settler = settler.0, "auto-assignment skipped");
                }
            }
        }
    }

    /// Nearest matching building by Manhattan distance from the building's
    /// corner; ties go to the earliest created.
    fn nearest_building(
        &self,
        x: f64,
        y: f64,
        matches: impl Fn(&Building) -> bool,
    ) -> Option<BuildingId> {
        let mut best = None;
        let mut best_dist = f64::INFINITY;
        for (id, b) in self.ordered() {
            if !matches(b) {
                continue;
            }
            let d = (x - b.position.x as f64).abs() + (y - b.position.y as f64).abs();
            if d < best_dist {
                best_dist = d;
                best = Some(id);
            }
        }
        best
    }

    // -----------------------------------------------------------------------
    // Population growth stage
    // -----------------------------------------------------------------------

    /// Every `growth_interval` ticks, spawn a settler at a random completed
    /// home while below the population cap.
    pub(crate) fn grow_population(&mut self) {
        self.sim.growth_counter += 1;
        if self.sim.growth_counter < self.config.growth_interval {
            return;
        }
        self.sim.growth_counter = 0;

        if self.settlers.len() as u32 >= self.population_cap {
            return;
        }
        let homes: Vec<GridPosition> = self
            .ordered()
            .filter(|(_, b)| b.kind == BuildingKind::Home && !b.constructing)
            .map(|(_, b)| b.position)
            .collect();
        if homes.is_empty() {
            return;
        }

        let home = homes[self.rng.below(homes.len() as u32) as usize];
        let (x, y) = home.center();
        let settler = self.spawn_settler(x, y);
        tracing::info!(settler = settler.0, x = home.x, y = home.y, "settler arrived");
        self.emit(ColonyEvent::SettlerSpawned {
            settler,
            tick: self.sim.tick,
        });
    }

    // -----------------------------------------------------------------------
    // Movement (presentation step)
    // -----------------------------------------------------------------------

    /// Move settlers by `dt` seconds of wall-clock time. Frozen while
    /// paused. Never touches the ledger or the building set.
    pub fn update_settlers(&mut self, dt: f64) {
        if self.speed.is_paused() || dt <= 0.0 {
            return;
        }
        self.visual_clock += dt;

        let night = self.sim.is_night(self.config.day_length);
        let shelter = self
            .ordered()
            .find(|(_, b)| b.is_anchor())
            .map(|(_, b)| b.position);
        let upper = (self.config.grid_size as f64 - 2.0).max(1.0);
        let speed = self.config.settler_speed * dt * 60.0;
        let ease = (ON_SITE_EASE * dt * 60.0).min(1.0);
        let clock_ms = self.visual_clock * 1000.0;

        for i in 0..self.settlers.len() {
            // A stale handle or a building that dropped this settler both
            // count as no site.
            let site = {
                let s = &self.settlers[i];
                s.assigned
                    .and_then(|id| self.buildings.get(id))
                    .filter(|b| b.settlers.contains(&s.id))
                    .map(|b| (b.position, b.constructing))
            };
            let rng = &mut self.visual_rng;
            let s = &mut self.settlers[i];

            if s.state == SettlerState::Idle {
                s.idle_timer -= dt;
                if s.idle_timer <= 0.0 {
                    let (tx, ty) = match shelter {
                        Some(anchor) if night && s.assigned.is_none() => {
                            let (cx, cy) = anchor.center();
                            (
                                cx + (rng.next_f64() - 0.5) * SHELTER_SCATTER,
                                cy + (rng.next_f64() - 0.5) * SHELTER_SCATTER,
                            )
                        }
                        _ => (
                            s.x + (rng.next_f64() - 0.5) * WANDER_RANGE,
                            s.y + (rng.next_f64() - 0.5) * WANDER_RANGE,
                        ),
                    };
                    s.target = Some((tx.clamp(1.0, upper), ty.clamp(1.0, upper)));
                    s.state = SettlerState::Walking;
                }
            }

            if s.state == SettlerState::Walking {
                let Some((tx, ty)) = s.target else {
                    s.state = SettlerState::Idle;
                    continue;
                };
                let (dx, dy) = (tx - s.x, ty - s.y);
                let dist = dx.hypot(dy);
                if dist < ARRIVAL_DISTANCE {
                    s.x = tx;
                    s.y = ty;
                    s.target = None;
                    s.idle_timer = DWELL_BASE + rng.next_f64() * DWELL_SPREAD;
                    s.state = match site {
                        Some((_, true)) => SettlerState::Building,
                        Some((_, false)) => SettlerState::Working,
                        None => SettlerState::Idle,
                    };
                } else {
                    let step = speed.min(dist);
                    s.x += dx / dist * step;
                    s.y += dy / dist * step;
                }
            }

            if matches!(s.state, SettlerState::Building | SettlerState::Working) {
                match site {
                    Some((pos, _)) => {
                        let phase = s.id.0 as f64;
                        let jx = (clock_ms * 0.002 + phase * 1.7).sin() * JITTER_AMPLITUDE;
                        let jy = (clock_ms * 0.0015 + phase * 2.3).cos() * JITTER_AMPLITUDE;
                        let (cx, cy) = pos.center();
                        s.x += (cx + jx - s.x) * ease;
                        s.y += (cy + jy - s.y) * ease;
                    }
                    None => {
                        s.state = SettlerState::Idle;
                        s.assigned = None;
                        s.idle_timer = RELEASE_DWELL;
                    }
                }
            }
        }
    }
}
