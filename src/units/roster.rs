//! Roster - unit kind to count map
//!
//! Ordered by kind so that every iteration (and therefore every float sum
//! and tie-break in combat) is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::UnitKind;

/// A set of units keyed by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    counts: BTreeMap<UnitKind, u32>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, mostly for fixtures
    pub fn with(mut self, kind: impl Into<UnitKind>, count: u32) -> Self {
        self.add(&kind.into(), count);
        self
    }

    /// Count of a kind (0 if absent)
    pub fn get(&self, kind: &UnitKind) -> u32 {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    /// Set a count; zero removes the entry
    pub fn set(&mut self, kind: UnitKind, count: u32) {
        if count == 0 {
            self.counts.remove(&kind);
        } else {
            self.counts.insert(kind, count);
        }
    }

    pub fn add(&mut self, kind: &UnitKind, count: u32) {
        if count == 0 {
            return;
        }
        let entry = self.counts.entry(kind.clone()).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Remove up to `count` units, returns the amount actually removed
    pub fn remove(&mut self, kind: &UnitKind, count: u32) -> u32 {
        let current = self.get(kind);
        let removed = count.min(current);
        self.set(kind.clone(), current - removed);
        removed
    }

    /// Add every count of `other` into this roster
    pub fn merge(&mut self, other: &Roster) {
        for (kind, count) in other.iter() {
            self.add(kind, count);
        }
    }

    /// Remove every count of `other`, saturating at zero
    pub fn subtract(&mut self, other: &Roster) {
        for (kind, count) in other.iter() {
            self.remove(kind, count);
        }
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().map(|c| *c as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|c| *c == 0)
    }

    pub fn contains(&self, kind: &UnitKind) -> bool {
        self.get(kind) > 0
    }

    /// Non-zero entries in kind order
    pub fn iter(&self) -> impl Iterator<Item = (&UnitKind, u32)> {
        self.counts.iter().filter(|(_, c)| **c > 0).map(|(k, c)| (k, *c))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &UnitKind> {
        self.iter().map(|(k, _)| k)
    }

    /// Sub-roster of the kinds accepted by `keep`
    pub fn filtered(&self, mut keep: impl FnMut(&UnitKind) -> bool) -> Roster {
        self.iter()
            .filter(|(k, _)| keep(*k))
            .map(|(k, c)| (k.clone(), c))
            .collect()
    }

    /// Merge `other` into this roster without exceeding `capacity` in total
    ///
    /// Kinds are admitted in kind order. Returns whatever did not fit.
    pub fn merge_capped(&mut self, other: &Roster, capacity: Option<u64>) -> Roster {
        let Some(capacity) = capacity else {
            self.merge(other);
            return Roster::new();
        };

        let mut room = capacity.saturating_sub(self.total());
        let mut overflow = Roster::new();
        for (kind, count) in other.iter() {
            let admitted = (count as u64).min(room) as u32;
            self.add(kind, admitted);
            room -= admitted as u64;
            overflow.add(kind, count - admitted);
        }
        overflow
    }
}

impl FromIterator<(UnitKind, u32)> for Roster {
    fn from_iter<I: IntoIterator<Item = (UnitKind, u32)>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for (kind, count) in iter {
            roster.add(&kind, count);
        }
        roster
    }
}
