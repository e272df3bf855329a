use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::types::{MovementId, UnitKind};
use crate::store::StoreError;
use crate::units::CatalogError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unknown movement type: {0}")]
    UnknownMovementType(String),

    #[error("Unknown unit kind: {0}")]
    UnknownUnit(UnitKind),

    #[error("Invalid dispatch: {0}")]
    InvalidDispatch(String),

    #[error("Movement {0} has no target matching its type")]
    MissingTarget(MovementId),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unit catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether retrying the same movement on a later tick may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_transient())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
