//! In-memory document store with optimistic concurrency
//!
//! Documents are kept as JSON values with a version counter. A unit of
//! work remembers the version of everything it read; commit fails with a
//! conflict if any of those moved in the meantime, and then applies
//! nothing.

use ahash::AHashMap;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::time::GameTime;
use crate::core::types::{MovementId, OwnerId};
use crate::movement::MovementStatus;
use crate::store::{ArrivedMovement, Collection, Document, Store, StoreError, UnitOfWork};

type Key = (Collection, String);

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    body: Value,
}

#[derive(Debug, Default)]
struct Tables {
    docs: AHashMap<Key, Versioned>,
    next_version: u64,
    /// Commits left to fail with `Unavailable` (fault injection)
    failing_commits: usize,
}

impl Tables {
    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }

    fn version_of(&self, key: &Key) -> Option<u64> {
        self.docs.get(key).map(|d| d.version)
    }
}

/// Shared handle to an in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

fn lock(inner: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>, StoreError> {
    inner
        .lock()
        .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
}

fn encode<D: Document>(doc: &D) -> Result<Value, StoreError> {
    serde_json::to_value(doc).map_err(|source| StoreError::Encode {
        collection: D::COLLECTION,
        source,
    })
}

fn decode<D: Document>(id: &str, body: &Value) -> Result<D, StoreError> {
    serde_json::from_value(body.clone()).map_err(|source| StoreError::Decode {
        collection: D::COLLECTION,
        id: id.to_string(),
        source,
    })
}

/// Copy `owned` fields from `update` into `current`
fn merge_fields(current: &mut Value, update: Value, owned: &[&str]) {
    match (current.as_object_mut(), update) {
        (Some(target), Value::Object(mut source)) => {
            for field in owned {
                match source.remove(*field) {
                    Some(value) => {
                        target.insert((*field).to_string(), value);
                    }
                    None => {
                        target.remove(*field);
                    }
                }
            }
        }
        (_, update) => *current = update,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully replace a document outside any unit of work
    pub fn insert<D: Document>(&self, doc: &D) -> Result<(), StoreError> {
        let body = encode(doc)?;
        self.insert_raw(D::COLLECTION, &doc.doc_id(), body)
    }

    /// Insert a raw JSON document, bypassing typing
    pub fn insert_raw(&self, collection: Collection, id: &str, body: Value) -> Result<(), StoreError> {
        let mut tables = lock(&self.inner)?;
        let version = tables.bump();
        tables.docs.insert((collection, id.to_string()), Versioned { version, body });
        Ok(())
    }

    /// Overwrite one top-level field, as a sibling subsystem would
    pub fn patch_field(&self, collection: Collection, id: &str, field: &str, value: Value) -> Result<bool, StoreError> {
        let mut tables = lock(&self.inner)?;
        let version = tables.bump();
        let Some(doc) = tables.docs.get_mut(&(collection, id.to_string())) else {
            return Ok(false);
        };
        if let Some(object) = doc.body.as_object_mut() {
            object.insert(field.to_string(), value);
        }
        doc.version = version;
        Ok(true)
    }

    /// Read a committed document
    pub fn fetch<D: Document>(&self, id: &str) -> Result<Option<D>, StoreError> {
        let tables = lock(&self.inner)?;
        tables
            .docs
            .get(&(D::COLLECTION, id.to_string()))
            .map(|d| decode::<D>(id, &d.body))
            .transpose()
    }

    /// Read a committed document as raw JSON, including fields no engine type knows
    pub fn fetch_raw(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let tables = lock(&self.inner)?;
        Ok(tables.docs.get(&(collection, id.to_string())).map(|d| d.body.clone()))
    }

    /// Every committed document of a collection that decodes as `D`
    pub fn all<D: Document>(&self) -> Result<Vec<D>, StoreError> {
        let tables = lock(&self.inner)?;
        let mut entries: Vec<(&Key, &Versioned)> =
            tables.docs.iter().filter(|(key, _)| key.0 == D::COLLECTION).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
            .into_iter()
            .map(|(key, doc)| decode::<D>(&key.1, &doc.body))
            .collect()
    }

    pub fn count(&self, collection: Collection) -> usize {
        lock(&self.inner)
            .map(|t| t.docs.keys().filter(|k| k.0 == collection).count())
            .unwrap_or(0)
    }

    /// Make the next `n` commits fail as if the backend were down
    pub fn fail_next_commits(&self, n: usize) -> Result<(), StoreError> {
        lock(&self.inner)?.failing_commits = n;
        Ok(())
    }
}

enum Pending {
    Set {
        body: Value,
        owned: Option<&'static [&'static str]>,
    },
    Delete,
}

/// Unit of work over a `MemoryStore`
pub struct MemoryTx {
    inner: Arc<Mutex<Tables>>,
    reads: AHashMap<Key, Option<u64>>,
    writes: Vec<(Key, Pending)>,
}

impl MemoryTx {
    fn pending(&self, key: &Key) -> Option<&Pending> {
        self.writes.iter().rev().find(|(k, _)| k == key).map(|(_, p)| p)
    }
}

impl UnitOfWork for MemoryTx {
    fn get<D: Document>(&mut self, id: &str) -> Result<Option<D>, StoreError> {
        let key = (D::COLLECTION, id.to_string());

        match self.pending(&key) {
            Some(Pending::Set { body, .. }) => return decode::<D>(id, body).map(Some),
            Some(Pending::Delete) => return Ok(None),
            None => {}
        }

        let tables = lock(&self.inner)?;
        let current = tables.docs.get(&key).cloned();
        drop(tables);

        self.reads
            .entry(key)
            .or_insert_with(|| current.as_ref().map(|d| d.version));

        current.map(|d| decode::<D>(id, &d.body)).transpose()
    }

    fn set<D: Document>(&mut self, doc: &D) -> Result<(), StoreError> {
        let body = encode(doc)?;
        let key = (D::COLLECTION, doc.doc_id());
        self.writes.push((
            key,
            Pending::Set {
                body,
                owned: D::OWNED_FIELDS,
            },
        ));
        Ok(())
    }

    fn delete<D: Document>(&mut self, id: &str) {
        self.writes.push(((D::COLLECTION, id.to_string()), Pending::Delete));
    }

    fn commit(self) -> Result<(), StoreError> {
        let mut tables = lock(&self.inner)?;

        if tables.failing_commits > 0 {
            tables.failing_commits -= 1;
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }

        // Precondition: nothing we read has changed underneath us
        for (key, seen) in &self.reads {
            if tables.version_of(key) != *seen {
                return Err(StoreError::Conflict {
                    collection: key.0,
                    id: key.1.clone(),
                });
            }
        }

        for (key, pending) in self.writes {
            match pending {
                Pending::Delete => {
                    tables.docs.remove(&key);
                }
                Pending::Set { body, owned } => {
                    let version = tables.bump();
                    match (tables.docs.get_mut(&key), owned) {
                        (Some(existing), Some(fields)) => {
                            merge_fields(&mut existing.body, body, fields);
                            existing.version = version;
                        }
                        _ => {
                            tables.docs.insert(key, Versioned { version, body });
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTx;

    fn begin(&self) -> Result<MemoryTx, StoreError> {
        Ok(MemoryTx {
            inner: Arc::clone(&self.inner),
            reads: AHashMap::new(),
            writes: Vec::new(),
        })
    }

    fn arrived_movements(&self, now: GameTime) -> Result<Vec<ArrivedMovement>, StoreError> {
        let tables = lock(&self.inner)?;
        let mut due = Vec::new();

        for ((collection, id), doc) in tables.docs.iter() {
            if *collection != Collection::Movements {
                continue;
            }
            let arrival = doc.body.get("arrival_time").and_then(Value::as_i64);
            let status = doc
                .body
                .get("status")
                .cloned()
                .and_then(|s| serde_json::from_value::<MovementStatus>(s).ok());

            match (id.parse::<MovementId>(), arrival, status) {
                (Ok(id), Some(arrival), Some(status)) if arrival <= now.as_millis() => {
                    due.push(ArrivedMovement {
                        id,
                        status,
                        arrival_time: GameTime::from_millis(arrival),
                    });
                }
                (Ok(_), Some(_), Some(_)) => {}
                _ => tracing::warn!(movement_id = %id, "Movement document has no readable status or arrival time"),
            }
        }

        due.sort_by(|a, b| a.arrival_time.cmp(&b.arrival_time).then_with(|| a.id.cmp(&b.id)));
        Ok(due)
    }

    fn movements_involving(&self, owner: OwnerId) -> Result<Vec<MovementId>, StoreError> {
        let tables = lock(&self.inner)?;
        let owner = owner.to_string();
        let mut ids: Vec<MovementId> = tables
            .docs
            .iter()
            .filter(|((collection, _), _)| *collection == Collection::Movements)
            .filter(|(_, doc)| {
                doc.body
                    .get("involved_parties")
                    .and_then(Value::as_array)
                    .is_some_and(|parties| parties.iter().any(|p| p.as_str() == Some(owner.as_str())))
            })
            .filter_map(|((_, id), _)| id.parse().ok())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
