//! Resource ledger - wood, stone and silver amounts
//!
//! Used for settlement stores, village stocks, trade cargo and plunder.

use serde::{Deserialize, Serialize};

use crate::core::types::ResourceKind;

/// Amounts of each resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    #[serde(default)]
    pub wood: u64,
    #[serde(default)]
    pub stone: u64,
    #[serde(default)]
    pub silver: u64,
}

impl ResourceLedger {
    pub fn new(wood: u64, stone: u64, silver: u64) -> Self {
        Self { wood, stone, silver }
    }

    pub fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Wood => self.wood,
            ResourceKind::Stone => self.stone,
            ResourceKind::Silver => self.silver,
        }
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut u64 {
        match kind {
            ResourceKind::Wood => &mut self.wood,
            ResourceKind::Stone => &mut self.stone,
            ResourceKind::Silver => &mut self.silver,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, amount: u64) {
        *self.slot(kind) = amount;
    }

    pub fn add(&mut self, kind: ResourceKind, amount: u64) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(amount);
    }

    /// Remove up to `amount`, returns the amount actually removed
    pub fn remove(&mut self, kind: ResourceKind, amount: u64) -> u64 {
        let slot = self.slot(kind);
        let removed = amount.min(*slot);
        *slot -= removed;
        removed
    }

    pub fn subtract(&mut self, other: &ResourceLedger) {
        for kind in ResourceKind::ALL {
            self.remove(kind, other.get(kind));
        }
    }

    pub fn total(&self) -> u64 {
        self.wood.saturating_add(self.stone).saturating_add(self.silver)
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Apply `f` to every amount
    pub fn map(&self, mut f: impl FnMut(ResourceKind, u64) -> u64) -> ResourceLedger {
        let mut out = ResourceLedger::default();
        for kind in ResourceKind::ALL {
            out.set(kind, f(kind, self.get(kind)));
        }
        out
    }

    /// Add `other`, holding each resource at or below `capacity`
    ///
    /// Resources already above the ceiling are left alone. Returns the
    /// amounts that did not fit.
    pub fn merge_capped(&mut self, other: &ResourceLedger, capacity: Option<u64>) -> ResourceLedger {
        let mut overflow = ResourceLedger::default();
        for kind in ResourceKind::ALL {
            let incoming = other.get(kind);
            let admitted = match capacity {
                Some(cap) => incoming.min(cap.saturating_sub(self.get(kind))),
                None => incoming,
            };
            self.add(kind, admitted);
            overflow.set(kind, incoming - admitted);
        }
        overflow
    }
}
