//! Combat balance constants - all tunable values in one place

// Counter modifiers (stack multiplicatively per opposing kind present)
pub const COUNTER_ATTACK_BONUS: f64 = 1.20;
pub const COUNTERED_DEFENSE_PENALTY: f64 = 0.80;

// Initial engagement weights by role
pub const PHALANX_WEIGHT: f64 = 1.0;
pub const SUPPORT_WEIGHT: f64 = 0.5;
pub const OTHER_WEIGHT: f64 = 0.2;

// Loss budget shares, in percent (integer math keeps the floors exact)
pub const PHALANX_LOSS_SHARE_PCT: u64 = 60;
pub const SUPPORT_LOSS_SHARE_PCT: u64 = 30;

// Post-battle
pub const PLUNDER_PCT: u64 = 25;
pub const WOUNDED_PCT: u32 = 15;
