//! Movement lifecycle
//!
//! A movement is created by a dispatch, travels until its arrival time,
//! and is then handed to the processor, which resolves it against the live
//! target and either deletes it or sends the survivors home.

pub mod admin;
pub mod processor;
pub mod record;
pub mod report;
pub mod travel;

mod attack;
mod homecoming;
mod scout;
mod transfer;

pub use processor::{ArrivalOutcome, MovementProcessor};
pub use record::{DispatchOrder, Movement, MovementKind, MovementStatus, MovementTarget};
pub use report::{BattleReport, Report, ReportBody, TargetEffect};
pub use travel::travel_duration;
