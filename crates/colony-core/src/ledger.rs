//! Resource ledger: the colony's stockpile.
//!
//! Every quantity stays within `0 ..= capacity` after each mutation.
//! Additions are clamped to capacity, removals are floored at zero, and
//! capacity changes re-clamp what is stored.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, half_floor};
use crate::resource::{Resource, ResourceCategory};

/// A list of resource amounts: a cost, a recipe side, a production table.
pub type Bundle = Vec<(Resource, Fixed64)>;

/// Errors from ledger operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient {resource}: need {needed}, have {available}")]
    Insufficient {
        resource: Resource,
        needed: Fixed64,
        available: Fixed64,
    },
}

/// Quantities and capacities for every [`Resource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    quantities: [Fixed64; Resource::COUNT],
    capacities: [Option<Fixed64>; Resource::COUNT],
}

impl Default for Ledger {
    fn default() -> Self {
        Self::empty()
    }
}

impl Ledger {
    /// All quantities zero, all capacities unlimited.
    pub fn empty() -> Self {
        Self {
            quantities: [Fixed64::ZERO; Resource::COUNT],
            capacities: [None; Resource::COUNT],
        }
    }

    /// The starting stockpile of a freshly founded colony.
    pub fn standard() -> Self {
        let mut ledger = Self::empty();
        let n = Fixed64::from_num::<i32>;

        ledger.set_capacity(Resource::Oxygen, Some(n(1000)));
        ledger.set_capacity(Resource::Food, Some(n(500)));
        ledger.set_capacity(Resource::Water, Some(n(500)));
        ledger.set_capacity(Resource::Fuel, Some(n(100)));
        for r in Resource::in_category(ResourceCategory::Raw) {
            ledger.set_capacity(r, Some(n(30)));
        }
        for r in Resource::in_category(ResourceCategory::Compound) {
            ledger.set_capacity(r, Some(n(15)));
        }

        for (r, amount) in [
            (Resource::Oxygen, 500),
            (Resource::Food, 300),
            (Resource::Water, 200),
            (Resource::Iron, 30),
            (Resource::Copper, 20),
            (Resource::Sand, 15),
            (Resource::Aluminum, 15),
        ] {
            ledger.set(r, n(amount));
        }
        ledger
    }

    pub fn get(&self, resource: Resource) -> Fixed64 {
        self.quantities[resource.index()]
    }

    /// `None` means uncapped.
    pub fn capacity(&self, resource: Resource) -> Option<Fixed64> {
        self.capacities[resource.index()]
    }

    /// Replace a capacity and re-clamp the stored quantity.
    pub fn set_capacity(&mut self, resource: Resource, capacity: Option<Fixed64>) {
        self.capacities[resource.index()] = capacity.map(|c| c.max(Fixed64::ZERO));
        self.reclamp(resource);
    }

    /// Overwrite a quantity, clamped into `0 ..= capacity`.
    pub fn set(&mut self, resource: Resource, amount: Fixed64) {
        self.quantities[resource.index()] = self.clamp(resource, amount);
    }

    /// Add `amount` (negative amounts are ignored). Returns what was stored.
    pub fn add(&mut self, resource: Resource, amount: Fixed64) -> Fixed64 {
        if amount <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        let before = self.get(resource);
        let after = self.clamp(resource, before.saturating_add(amount));
        self.quantities[resource.index()] = after;
        after - before
    }

    /// Remove up to `amount`, never going below zero. Returns what was
    /// removed.
    pub fn remove(&mut self, resource: Resource, amount: Fixed64) -> Fixed64 {
        if amount <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        let before = self.get(resource);
        let taken = amount.min(before);
        self.quantities[resource.index()] = before - taken;
        taken
    }

    /// True when every entry of `costs` is covered. Repeated resources are
    /// summed.
    pub fn can_afford(&self, costs: &[(Resource, Fixed64)]) -> bool {
        self.first_shortfall(costs).is_none()
    }

    /// Deduct every cost, or nothing at all.
    pub fn try_spend(&mut self, costs: &[(Resource, Fixed64)]) -> Result<(), LedgerError> {
        if let Some(err) = self.first_shortfall(costs) {
            return Err(err);
        }
        for &(resource, amount) in costs {
            self.remove(resource, amount);
        }
        Ok(())
    }

    /// Return `floor(amount / 2)` of each cost, clamped to capacity.
    pub fn refund_half(&mut self, costs: &[(Resource, Fixed64)]) {
        for &(resource, amount) in costs {
            self.add(resource, half_floor(amount));
        }
    }

    /// Raise the capacity of each capped resource by `amount`.
    pub fn grow_capacity(&mut self, resources: impl IntoIterator<Item = Resource>, amount: Fixed64) {
        for r in resources {
            if let Some(cap) = self.capacity(r) {
                self.capacities[r.index()] = Some(cap.saturating_add(amount));
            }
        }
    }

    /// Lower the capacity of each capped resource by `amount`, not below
    /// `floor`, and clamp stored quantities to the new capacity.
    pub fn shrink_capacity(
        &mut self,
        resources: impl IntoIterator<Item = Resource>,
        amount: Fixed64,
        floor: Fixed64,
    ) {
        for r in resources {
            if let Some(cap) = self.capacity(r) {
                self.capacities[r.index()] = Some((cap - amount).max(floor));
                self.reclamp(r);
            }
        }
    }

    /// Publish net power. Negative balances are stored as zero; the signed
    /// value lives on the colony.
    pub fn set_power_mirror(&mut self, net: Fixed64) {
        self.set(Resource::Power, net);
    }

    /// Iterate `(resource, quantity, capacity)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, Fixed64, Option<Fixed64>)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r), self.capacity(r)))
    }

    fn first_shortfall(&self, costs: &[(Resource, Fixed64)]) -> Option<LedgerError> {
        let mut needed = [Fixed64::ZERO; Resource::COUNT];
        for &(resource, amount) in costs {
            needed[resource.index()] = needed[resource.index()].saturating_add(amount.max(Fixed64::ZERO));
        }
        Resource::ALL.into_iter().find_map(|r| {
            let available = self.get(r);
            let need = needed[r.index()];
            (need > available).then_some(LedgerError::Insufficient {
                resource: r,
                needed: need,
                available,
            })
        })
    }

    fn clamp(&self, resource: Resource, amount: Fixed64) -> Fixed64 {
        let floored = amount.max(Fixed64::ZERO);
        match self.capacity(resource) {
            Some(cap) => floored.min(cap),
            None => floored,
        }
    }

    fn reclamp(&mut self, resource: Resource) {
        let current = self.get(resource);
        self.quantities[resource.index()] = self.clamp(resource, current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn f(v: i32) -> Fixed64 {
        Fixed64::from_num(v)
    }

    #[test]
    fn standard_ledger_values() {
        let l = Ledger::standard();
        assert_eq!(l.get(Resource::Oxygen), f(500));
        assert_eq!(l.get(Resource::Food), f(300));
        assert_eq!(l.get(Resource::Water), f(200));
        assert_eq!(l.get(Resource::Iron), f(30));
        assert_eq!(l.get(Resource::Steel), f(0));
        assert_eq!(l.capacity(Resource::Oxygen), Some(f(1000)));
        assert_eq!(l.capacity(Resource::Fuel), Some(f(100)));
        assert_eq!(l.capacity(Resource::Tungsten), Some(f(30)));
        assert_eq!(l.capacity(Resource::Electronics), Some(f(15)));
        assert_eq!(l.capacity(Resource::Power), None);
    }

    #[test]
    fn add_clamps_to_capacity() {
        let mut l = Ledger::standard();
        let stored = l.add(Resource::Iron, f(10));
        assert_eq!(stored, f(0));
        assert_eq!(l.get(Resource::Iron), f(30));

        let stored = l.add(Resource::Sand, f(20));
        assert_eq!(stored, f(15));
        assert_eq!(l.get(Resource::Sand), f(30));
    }

    #[test]
    fn remove_floors_at_zero() {
        let mut l = Ledger::standard();
        let taken = l.remove(Resource::Copper, f(50));
        assert_eq!(taken, f(20));
        assert_eq!(l.get(Resource::Copper), f(0));
    }

    #[test]
    fn try_spend_is_all_or_nothing() {
        let mut l = Ledger::standard();
        let before = l.clone();
        let err = l
            .try_spend(&[(Resource::Iron, f(5)), (Resource::Steel, f(1))])
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::Insufficient {
                resource: Resource::Steel,
                needed: f(1),
                available: f(0),
            }
        );
        assert_eq!(l, before);

        l.try_spend(&[(Resource::Iron, f(5)), (Resource::Copper, f(2))])
            .unwrap();
        assert_eq!(l.get(Resource::Iron), f(25));
        assert_eq!(l.get(Resource::Copper), f(18));
    }

    #[test]
    fn repeated_cost_entries_are_summed() {
        let l = Ledger::standard();
        assert!(!l.can_afford(&[(Resource::Iron, f(20)), (Resource::Iron, f(20))]));
        assert!(l.can_afford(&[(Resource::Iron, f(15)), (Resource::Iron, f(15))]));
    }

    #[test]
    fn can_afford_does_not_mutate() {
        let l = Ledger::standard();
        let costs = [(Resource::Iron, f(8)), (Resource::Aluminum, f(4))];
        assert!(l.can_afford(&costs));
        assert!(l.can_afford(&costs));
        assert_eq!(l, Ledger::standard());
    }

    #[test]
    fn refund_half_floors_each_amount() {
        let mut l = Ledger::empty();
        l.refund_half(&[(Resource::Iron, f(5)), (Resource::Copper, f(2))]);
        assert_eq!(l.get(Resource::Iron), f(2));
        assert_eq!(l.get(Resource::Copper), f(1));
    }

    #[test]
    fn shrink_capacity_reclamps() {
        let mut l = Ledger::standard();
        l.grow_capacity(Resource::in_category(ResourceCategory::Raw), f(25));
        assert_eq!(l.capacity(Resource::Iron), Some(f(55)));
        l.add(Resource::Iron, f(20));
        assert_eq!(l.get(Resource::Iron), f(50));

        l.shrink_capacity(Resource::in_category(ResourceCategory::Raw), f(25), f(30));
        assert_eq!(l.capacity(Resource::Iron), Some(f(30)));
        assert_eq!(l.get(Resource::Iron), f(30));

        // Already at the floor.
        l.shrink_capacity(Resource::in_category(ResourceCategory::Raw), f(25), f(30));
        assert_eq!(l.capacity(Resource::Iron), Some(f(30)));
    }

    #[test]
    fn uncapped_resources_ignore_capacity_changes() {
        let mut l = Ledger::standard();
        l.grow_capacity([Resource::Power], f(10));
        assert_eq!(l.capacity(Resource::Power), None);
    }

    #[test]
    fn power_mirror_never_negative() {
        let mut l = Ledger::standard();
        l.set_power_mirror(f(-7));
        assert_eq!(l.get(Resource::Power), f(0));
        l.set_power_mirror(f(12));
        assert_eq!(l.get(Resource::Power), f(12));
    }

    fn any_resource() -> impl Strategy<Value = Resource> {
        (0..Resource::COUNT).prop_map(|i| Resource::ALL[i])
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(Resource, i32),
        Remove(Resource, i32),
        Spend(Resource, i32),
        Refund(Resource, i32),
        Grow(i32),
        Shrink(i32),
    }

    fn any_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any_resource(), -50..200i32).prop_map(|(r, a)| Op::Add(r, a)),
            (any_resource(), -50..200i32).prop_map(|(r, a)| Op::Remove(r, a)),
            (any_resource(), 0..60i32).prop_map(|(r, a)| Op::Spend(r, a)),
            (any_resource(), 0..60i32).prop_map(|(r, a)| Op::Refund(r, a)),
            (0..40i32).prop_map(Op::Grow),
            (0..40i32).prop_map(Op::Shrink),
        ]
    }

    proptest! {
        #[test]
        fn quantities_stay_within_bounds(ops in proptest::collection::vec(any_op(), 1..80)) {
            let mut l = Ledger::standard();
            for op in ops {
                match op {
                    Op::Add(r, a) => { l.add(r, f(a)); }
                    Op::Remove(r, a) => { l.remove(r, f(a)); }
                    Op::Spend(r, a) => { let _ = l.try_spend(&[(r, f(a))]); }
                    Op::Refund(r, a) => l.refund_half(&[(r, f(a))]),
                    Op::Grow(a) => l.grow_capacity(Resource::ALL, f(a)),
                    Op::Shrink(a) => l.shrink_capacity(Resource::ALL, f(a), f(15)),
                }
                for (_, q, cap) in l.iter() {
                    prop_assert!(q >= Fixed64::ZERO);
                    if let Some(cap) = cap {
                        prop_assert!(q <= cap);
                    }
                }
            }
        }

        #[test]
        fn failed_spend_leaves_ledger_untouched(r in any_resource(), extra in 1..100i32) {
            let mut l = Ledger::standard();
            let before = l.clone();
            let cost = l.get(r) + f(extra);
            prop_assert!(l.try_spend(&[(r, cost)]).is_err());
            prop_assert_eq!(l, before);
        }
    }
}
