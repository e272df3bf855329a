//! Transactional document store
//!
//! The engine never talks to a database directly. It opens a unit of work,
//! reads and stages writes through it, and commits: either every staged
//! write lands or none does. Any backend with transactional
//! read-modify-write semantics (a relational transaction, an optimistic
//! key-value store) can implement these traits.

pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::core::time::GameTime;
use crate::core::types::{MovementId, OwnerId};
use crate::movement::MovementStatus;

pub use memory::{MemoryStore, MemoryTx};

/// Document collections known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Movements,
    Settlements,
    Villages,
    Ruins,
    GodTowns,
    Reports,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Movements => "movements",
            Collection::Settlements => "settlements",
            Collection::Villages => "villages",
            Collection::Ruins => "ruins",
            Collection::GodTowns => "god_towns",
            Collection::Reports => "reports",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record type stored in one collection
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    /// Top-level fields the engine is authoritative over
    ///
    /// Writes to an existing document only touch these fields, so sibling
    /// subsystems that own the rest of the record are never clobbered.
    /// `None` means the engine owns the whole document.
    const OWNED_FIELDS: Option<&'static [&'static str]> = None;

    fn doc_id(&self) -> String;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Write conflict on {collection}/{id}")]
    Conflict { collection: Collection, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode {collection}/{id}: {source}")]
    Decode {
        collection: Collection,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {collection} document: {source}")]
    Encode {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Conflicts and outages clear up on their own; a later tick retries
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Conflict { .. } | StoreError::Unavailable(_))
    }
}

/// One atomic batch of reads and writes
pub trait UnitOfWork {
    /// Read a document, seeing this unit's own staged writes
    fn get<D: Document>(&mut self, id: &str) -> Result<Option<D>, StoreError>;

    /// Stage an insert or (field-scoped) update
    fn set<D: Document>(&mut self, doc: &D) -> Result<(), StoreError>;

    /// Stage a deletion
    fn delete<D: Document>(&mut self, id: &str);

    /// Apply every staged write, or none of them
    fn commit(self) -> Result<(), StoreError>;
}

/// A movement the poller found due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivedMovement {
    pub id: MovementId,
    pub status: MovementStatus,
    pub arrival_time: GameTime,
}

/// Entry point to a backend
pub trait Store: Send + Sync {
    type Tx: UnitOfWork;

    fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Movements with `arrival_time <= now`, oldest first (ties by id)
    fn arrived_movements(&self, now: GameTime) -> Result<Vec<ArrivedMovement>, StoreError>;

    /// Movements whose involved parties include `owner`
    fn movements_involving(&self, owner: OwnerId) -> Result<Vec<MovementId>, StoreError>;
}
