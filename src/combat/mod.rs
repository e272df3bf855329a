//! Combat resolution engine
//!
//! Pure, deterministic, no I/O. Rosters go in, losses, plunder and
//! wounded come out.

pub mod constants;
pub mod formation;
pub mod losses;
pub mod plunder;
pub mod power;
pub mod resolution;
pub mod wounds;

pub use formation::{Formation, Role, Roles};
pub use power::Side;
pub use resolution::{resolve_battle, resolve_combat, BattleOutcome, CombatResult, Engagement};
