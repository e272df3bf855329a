//! Player settlements as the engine sees them
//!
//! Only a slice of the full settlement record matters here. Buildings, the
//! deity and both capacity ceilings are maintained by other subsystems and
//! read-only to the engine; `OWNED_FIELDS` keeps writes away from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{OwnerId, SettlementId};
use crate::store::{Collection, Document};
use crate::units::Roster;
use crate::world::ResourceLedger;

/// Silver hidden in the cave, spent by defenders against spies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cave {
    #[serde(default)]
    pub silver: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<OwnerId>,
    #[serde(default)]
    pub owner_username: Option<String>,
    #[serde(default)]
    pub resources: ResourceLedger,
    #[serde(default)]
    pub units: Roster,
    #[serde(default)]
    pub wounded: Roster,
    /// Building kind -> level
    #[serde(default)]
    pub buildings: BTreeMap<String, u32>,
    #[serde(default)]
    pub cave: Cave,
    /// Worshipped deity, if any
    #[serde(default)]
    pub god: Option<String>,
    /// Per-resource warehouse ceiling (`None` = unbounded)
    #[serde(default)]
    pub warehouse_capacity: Option<u64>,
    /// Hospital ceiling on the total wounded pool (`None` = unbounded)
    #[serde(default)]
    pub wounded_capacity: Option<u64>,
}

impl Settlement {
    pub fn new(name: impl Into<String>, owner_id: OwnerId) -> Self {
        Self {
            id: SettlementId::new(),
            name: name.into(),
            owner_id: Some(owner_id),
            owner_username: None,
            resources: ResourceLedger::default(),
            units: Roster::new(),
            wounded: Roster::new(),
            buildings: BTreeMap::new(),
            cave: Cave::default(),
            god: None,
            warehouse_capacity: None,
            wounded_capacity: None,
        }
    }

    /// What a successful spy brings home
    pub fn snapshot(&self) -> SettlementSnapshot {
        SettlementSnapshot {
            resources: self.resources,
            units: self.units.clone(),
            buildings: self.buildings.clone(),
            god: self.god.clone(),
        }
    }

    /// Credit resources up to the warehouse ceiling, returning what was dropped
    pub fn store_resources(&mut self, incoming: &ResourceLedger) -> ResourceLedger {
        self.resources.merge_capped(incoming, self.warehouse_capacity)
    }

    /// Admit wounded up to the hospital ceiling, returning what was dropped
    pub fn admit_wounded(&mut self, incoming: &Roster) -> Roster {
        self.wounded.merge_capped(incoming, self.wounded_capacity)
    }
}

impl Document for Settlement {
    const COLLECTION: Collection = Collection::Settlements;
    const OWNED_FIELDS: Option<&'static [&'static str]> =
        Some(&["resources", "units", "wounded", "cave", "owner_id", "owner_username"]);

    fn doc_id(&self) -> String {
        self.id.to_string()
    }
}

/// Full intelligence picture of a settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSnapshot {
    pub resources: ResourceLedger,
    pub units: Roster,
    pub buildings: BTreeMap<String, u32>,
    pub god: Option<String>,
}
