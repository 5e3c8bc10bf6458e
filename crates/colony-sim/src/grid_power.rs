//! Power stage: gate buildings, run the balancer, write the result back.

use colony_core::building::KindState;
use colony_core::id::BuildingId;
use colony_core::registry::BuildingKind;
use colony_core::resource::Resource;
use colony_power::{Battery, PowerEvent, PowerNode, solar_factor};

use crate::colony::Colony;
use crate::event::ColonyEvent;

impl Colony {
    /// Gate every operational building on staffing and adjacency, then let
    /// the balancer settle fuel, batteries and shedding. Publishes the net
    /// power.
    pub(crate) fn balance_power(&mut self) {
        let ids = self.operational_ids();
        let mut nodes = Vec::with_capacity(ids.len());
        let mut connected = Vec::with_capacity(ids.len());

        for &id in &ids {
            let Some(b) = self.buildings.get(id) else {
                continue;
            };
            let def = self.registry.building(b.kind);
            let manned = !def.requires_staff || self.workers(id) > 0;
            let adjacent = self.adjacency_satisfied(b.position, b.kind, true);
            connected.push(adjacent);
            nodes.push(PowerNode {
                active: manned && adjacent,
                output: def.produces_of(Resource::Power),
                demand: def.consumes_of(Resource::Power),
                solar: b.kind == BuildingKind::Solar,
                fuel_output: def.produces_of(Resource::Fuel),
                fuel_demand: def.consumes_of(Resource::Fuel),
                battery: def
                    .battery_capacity
                    .zip(b.battery_charge())
                    .map(|(capacity, charge)| Battery { charge, capacity }),
            });
        }

        let solar = solar_factor(self.day_time(), self.config.solar_floor);
        let fuel = self.ledger.get(Resource::Fuel);
        let (report, events) = self.power.tick(&mut nodes, fuel, solar, self.sim.tick);

        for ((id, node), adjacent) in ids.iter().zip(&nodes).zip(connected) {
            self.write_back(*id, node, adjacent);
        }

        self.power_balance = report.balance;
        self.ledger.set_power_mirror(report.balance);
        tracing::debug!(
            balance = %report.balance,
            produced = %report.produced,
            consumed = %report.consumed,
            shed = report.shed.len(),
            fuel_starved = report.fuel_starved.len(),
            "power balanced"
        );

        for event in events {
            let event = match event {
                PowerEvent::Shortage { deficit, shed, tick } => {
                    tracing::info!(%deficit, shed, "power shortage");
                    ColonyEvent::PowerShortage {
                        deficit,
                        shed: shed as u32,
                        tick,
                    }
                }
                PowerEvent::Restored { tick } => {
                    tracing::info!("power restored");
                    ColonyEvent::PowerRestored { tick }
                }
            };
            self.emit(event);
        }
    }

    fn write_back(&mut self, id: BuildingId, node: &PowerNode, adjacent: bool) {
        let Some(b) = self.buildings.get_mut(id) else {
            return;
        };
        b.active = node.active;
        b.not_connected = !adjacent;
        if let (KindState::Battery { charge }, Some(bat)) = (&mut b.state, node.battery) {
            *charge = bat.charge;
        }
    }
}
