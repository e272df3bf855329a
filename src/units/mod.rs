//! Unit balance data and rosters

pub mod catalog;
pub mod roster;

pub use catalog::{CatalogError, Domain, UnitCatalog, UnitStats};
pub use roster::Roster;
