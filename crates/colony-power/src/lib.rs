//! Power grid balancer for the colony.
//!
//! The colony has a single grid. Each tick the balancer takes the gated
//! building list (in placement order), tallies supply and demand, buffers
//! through batteries and sheds consumers until the balance is no longer
//! negative, then reports the rounded net power.
//!
//! # Design
//!
//! - Nodes are plain values built by the caller from its building list; the
//!   balancer only flips `active` flags and battery charges.
//! - Net power is rounded half-up to a whole number at every tally.
//! - Battery discharge offsets the deficit seen by the first shedding pass
//!   only. The recompute before the second pass tallies live producers and
//!   consumers, so a deficit covered purely by charge still sheds there.
//! - Shedding runs at most two passes. A second recompute can in principle
//!   still be negative; the balance is then published as is.
//! - Events fire only on *transitions*, not every tick.

use colony_core::fixed::{Fixed64, Ticks, f64_to_fixed64, round_half_up};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Per-node power specs
// ---------------------------------------------------------------------------

/// Stored energy in a battery building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battery {
    /// Clamped to [0, capacity].
    pub charge: Fixed64,
    pub capacity: Fixed64,
}

/// One building as seen by the balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerNode {
    /// Gate result on input; may be cleared by fuel starvation or shedding.
    pub active: bool,
    /// Power produced while active (before the solar factor).
    pub output: Fixed64,
    /// Power drawn while active.
    pub demand: Fixed64,
    /// Output scales with daylight.
    pub solar: bool,
    /// Fuel this node will produce this tick if active.
    pub fuel_output: Fixed64,
    /// Fuel this node burns per tick.
    pub fuel_demand: Fixed64,
    pub battery: Option<Battery>,
}

impl PowerNode {
    /// A node with no power, fuel or storage effect.
    pub fn inert(active: bool) -> Self {
        Self {
            active,
            output: Fixed64::ZERO,
            demand: Fixed64::ZERO,
            solar: false,
            fuel_output: Fixed64::ZERO,
            fuel_demand: Fixed64::ZERO,
            battery: None,
        }
    }
}

/// Daylight multiplier for solar output: `max(floor, sin(day_time * pi))`.
pub fn solar_factor(day_time: f64, floor: f64) -> Fixed64 {
    f64_to_fixed64((day_time * std::f64::consts::PI).sin().max(floor))
}

// ---------------------------------------------------------------------------
// Report and events
// ---------------------------------------------------------------------------

/// Outcome of one balancing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerReport {
    /// Published net power, a whole number. May be negative only if two
    /// shedding passes were not enough.
    pub balance: Fixed64,
    /// Raw production from active nodes (solar scaled).
    pub produced: Fixed64,
    /// Raw demand of active nodes.
    pub consumed: Fixed64,
    /// Energy drawn from batteries this tick.
    pub discharged: Fixed64,
    /// Energy stored into batteries this tick.
    pub charged: Fixed64,
    /// Deficit left after battery discharge, before shedding.
    pub deficit: Fixed64,
    /// Indices of nodes switched off by shedding, in shedding order.
    pub shed: Vec<usize>,
    /// Indices of nodes switched off for lack of fuel.
    pub fuel_starved: Vec<usize>,
}

impl PowerReport {
    pub fn is_shortage(&self) -> bool {
        !self.shed.is_empty() || self.balance < Fixed64::ZERO
    }
}

/// Events emitted by the power module on state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerEvent {
    /// Consumers had to be shed after being fully powered.
    Shortage {
        deficit: Fixed64,
        shed: usize,
        tick: Ticks,
    },
    /// No shedding needed after a shortage.
    Restored { tick: Ticks },
}

// ---------------------------------------------------------------------------
// Balancer
// ---------------------------------------------------------------------------

/// Sum production and demand over active nodes.
fn tally(nodes: &[PowerNode], solar: Fixed64) -> (Fixed64, Fixed64) {
    nodes
        .iter()
        .filter(|n| n.active)
        .fold((Fixed64::ZERO, Fixed64::ZERO), |(p, c), n| {
            let out = if n.solar { n.output * solar } else { n.output };
            (p + out, c + n.demand)
        })
}

/// Switch off active consumers from the back of the list until `deficit`
/// is covered.
fn shed_pass(nodes: &mut [PowerNode], mut deficit: Fixed64, shed: &mut Vec<usize>) {
    for i in (0..nodes.len()).rev() {
        if deficit <= Fixed64::ZERO {
            break;
        }
        let node = &mut nodes[i];
        if node.active && node.demand > Fixed64::ZERO {
            node.active = false;
            deficit -= node.demand;
            shed.push(i);
        }
    }
}

/// Deactivate fuel burners that the projected fuel stock cannot cover.
fn fuel_check(nodes: &mut [PowerNode], fuel_stock: Fixed64, starved: &mut Vec<usize>) {
    let mut pending = nodes
        .iter()
        .filter(|n| n.active)
        .fold(fuel_stock, |acc, n| acc + n.fuel_output);
    for (i, node) in nodes.iter_mut().enumerate() {
        if !node.active || node.fuel_demand <= Fixed64::ZERO {
            continue;
        }
        if pending >= node.fuel_demand {
            pending -= node.fuel_demand;
        } else {
            node.active = false;
            starved.push(i);
        }
    }
}

/// Run one balancing pass over `nodes` in list order.
pub fn balance(nodes: &mut [PowerNode], fuel_stock: Fixed64, solar: Fixed64) -> PowerReport {
    let zero = Fixed64::ZERO;
    let mut report = PowerReport::default();

    fuel_check(nodes, fuel_stock, &mut report.fuel_starved);

    let (produced, consumed) = tally(nodes, solar);
    let mut net = round_half_up(produced - consumed);

    if net < zero {
        // Discharge in list order.
        let mut needed = -net;
        for node in nodes.iter_mut() {
            if needed <= zero {
                break;
            }
            if let Some(bat) = node.battery.as_mut() {
                let d = bat.charge.min(needed);
                bat.charge -= d;
                needed -= d;
                report.discharged += d;
            }
        }
        net = round_half_up(produced + report.discharged - consumed);
    } else if net > zero {
        // Charge in list order.
        let mut excess = net;
        for node in nodes.iter_mut() {
            if excess <= zero {
                break;
            }
            if let Some(bat) = node.battery.as_mut() {
                let room = (bat.capacity - bat.charge).max(zero);
                let c = room.min(excess);
                bat.charge += c;
                excess -= c;
                report.charged += c;
            }
        }
    }

    report.deficit = (-net).max(zero);
    if net < zero {
        shed_pass(nodes, -net, &mut report.shed);
    }

    // The recompute counts live supply only; drawn charge stays spent.
    let (mut produced, mut consumed) = tally(nodes, solar);
    net = round_half_up(produced - consumed);

    if net < zero {
        shed_pass(nodes, -net, &mut report.shed);
        (produced, consumed) = tally(nodes, solar);
        net = round_half_up(produced - consumed);
    }

    report.balance = net;
    report.produced = produced;
    report.consumed = consumed;
    report
}

// ---------------------------------------------------------------------------
// Power module
// ---------------------------------------------------------------------------

/// Stateful wrapper around [`balance`] that tracks shortage transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerModule {
    /// Whether last tick ended in a shortage.
    pub was_shortage: bool,
    /// Published net power from the last tick.
    pub last_balance: Fixed64,
}

impl PowerModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance the grid and emit transition events.
    pub fn tick(
        &mut self,
        nodes: &mut [PowerNode],
        fuel_stock: Fixed64,
        solar: Fixed64,
        current_tick: Ticks,
    ) -> (PowerReport, Vec<PowerEvent>) {
        let report = balance(nodes, fuel_stock, solar);
        let mut events = Vec::new();
        let shortage = report.is_shortage();

        if shortage && !self.was_shortage {
            events.push(PowerEvent::Shortage {
                deficit: report.deficit,
                shed: report.shed.len(),
                tick: current_tick,
            });
        } else if !shortage && self.was_shortage {
            events.push(PowerEvent::Restored { tick: current_tick });
        }
        self.was_shortage = shortage;
        self.last_balance = report.balance;
        (report, events)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
