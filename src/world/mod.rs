//! World state the engine reads and writes: settlements and neutral targets

pub mod neutral;
pub mod resources;
pub mod settlement;

pub use neutral::{GodTown, Ruin, Village};
pub use resources::ResourceLedger;
pub use settlement::{Cave, Settlement, SettlementSnapshot};
