//! Strategos - movement processing and combat resolution engine
//!
//! Turns time-delayed troop and resource dispatches into resolved battles,
//! transfers and reports against a transactional document store.

pub mod combat;
pub mod core;
pub mod movement;
pub mod scheduler;
pub mod scouting;
pub mod store;
pub mod units;
pub mod world;
