//! Combat power calculation
//!
//! Attackers fight with their attack value, defenders with their defense
//! value. Counters only ever help the attacker: an attacking unit gains
//! COUNTER_ATTACK_BONUS for every opposing kind on its counter list, and a
//! defending unit suffers COUNTERED_DEFENSE_PENALTY for every opposing kind
//! that lists it.

use crate::combat::constants::{
    COUNTERED_DEFENSE_PENALTY, COUNTER_ATTACK_BONUS, OTHER_WEIGHT, PHALANX_WEIGHT, SUPPORT_WEIGHT,
};
use crate::combat::formation::{Role, Roles};
use crate::core::types::UnitKind;
use crate::units::{Roster, UnitCatalog};

/// Which side of the battle a roster fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Attacker,
    Defender,
}

/// Power of one unit stack against an opposing roster
pub fn unit_power(catalog: &UnitCatalog, kind: &UnitKind, count: u32, side: Side, opposing: &Roster) -> f64 {
    let Some(stats) = catalog.get(kind) else {
        return 0.0;
    };

    let (base, modifier) = match side {
        Side::Attacker => {
            let countered = opposing.kinds().filter(|k| stats.counters_kind(k)).count();
            (stats.attack, COUNTER_ATTACK_BONUS.powi(countered as i32))
        }
        Side::Defender => {
            let counters = opposing
                .kinds()
                .filter(|k| catalog.get(k).is_some_and(|s| s.counters_kind(kind)))
                .count();
            (stats.defense, COUNTERED_DEFENSE_PENALTY.powi(counters as i32))
        }
    };

    count as f64 * base * modifier
}

/// Power split by combat role
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PowerBreakdown {
    pub phalanx: f64,
    pub support: f64,
    pub other: f64,
}

impl PowerBreakdown {
    /// Role-weighted power at the moment the lines meet
    pub fn initial(&self) -> f64 {
        PHALANX_WEIGHT * self.phalanx + SUPPORT_WEIGHT * self.support + OTHER_WEIGHT * self.other
    }
}

pub fn power_breakdown(
    catalog: &UnitCatalog,
    roster: &Roster,
    roles: &Roles,
    side: Side,
    opposing: &Roster,
) -> PowerBreakdown {
    let mut breakdown = PowerBreakdown::default();
    for (kind, count) in roster.iter() {
        let power = unit_power(catalog, kind, count, side, opposing);
        match roles.role_of(kind) {
            Role::Phalanx => breakdown.phalanx += power,
            Role::Support => breakdown.support += power,
            Role::Other => breakdown.other += power,
        }
    }
    breakdown
}

/// Unweighted power of a whole roster
pub fn total_power(catalog: &UnitCatalog, roster: &Roster, side: Side, opposing: &Roster) -> f64 {
    roster
        .iter()
        .map(|(kind, count)| unit_power(catalog, kind, count, side, opposing))
        .sum()
}
