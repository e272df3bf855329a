//! Espionage resolution
//!
//! A spy mission spends silver against the target's cave reserve. The only
//! randomness in the engine lives here, drawn from an injected `Rng` so
//! tests can seed it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::world::{Settlement, SettlementSnapshot};

/// Cave silver counts this many times over against a spy
pub const CAVE_SECURITY_MULTIPLIER: u64 = 2;

/// Missions at or below this odds always fail
pub const SUCCESS_THRESHOLD: f64 = 0.5;

/// A defender who catches the spy keeps 1/COMPENSATION_DIVISOR of its silver
pub const COMPENSATION_DIVISOR: u64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScoutingOutcome {
    Success {
        chance: f64,
        snapshot: SettlementSnapshot,
    },
    Failure {
        chance: f64,
        /// Silver credited to the defender's cave
        compensation: u64,
    },
}

impl ScoutingOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, ScoutingOutcome::Success { .. })
    }
}

/// Probability that `silver` spent gets past `cave_silver` of security
pub fn success_chance(silver: u64, cave_silver: u64) -> f64 {
    let security = cave_silver.saturating_mul(CAVE_SECURITY_MULTIPLIER);
    let spent = silver as f64 + 1.0;
    spent / (spent + security as f64)
}

/// Resolve a spy mission against the live target
///
/// Exactly one draw is taken from `rng`, even when the odds alone already
/// rule the mission out. The spent silver is gone either way.
pub fn resolve_scouting<R: Rng + ?Sized>(target: &Settlement, silver: u64, rng: &mut R) -> ScoutingOutcome {
    let chance = success_chance(silver, target.cave.silver);
    let roll: f64 = rng.gen();

    if chance > SUCCESS_THRESHOLD && roll < chance {
        ScoutingOutcome::Success {
            chance,
            snapshot: target.snapshot(),
        }
    } else {
        ScoutingOutcome::Failure {
            chance,
            compensation: silver / COMPENSATION_DIVISOR,
        }
    }
}
