//! Neutral targets: farming villages, ruins and world-boss towns

use serde::{Deserialize, Serialize};

use crate::core::time::GameTime;
use crate::core::types::{OwnerId, RuinId, TownId, VillageId};
use crate::store::{Collection, Document};
use crate::units::Roster;
use crate::world::ResourceLedger;

/// A farming village, free until someone takes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Village {
    pub id: VillageId,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub troops: Roster,
    #[serde(default)]
    pub resources: ResourceLedger,
    #[serde(default)]
    pub owner_id: Option<OwnerId>,
    /// Last time the owner was credited from this village
    #[serde(default)]
    pub last_collected: Option<GameTime>,
}

fn default_level() -> u32 {
    1
}

impl Village {
    pub fn new(level: u32, troops: Roster, resources: ResourceLedger) -> Self {
        Self {
            id: VillageId::new(),
            level,
            troops,
            resources,
            owner_id: None,
            last_collected: None,
        }
    }
}

impl Document for Village {
    const COLLECTION: Collection = Collection::Villages;
    const OWNED_FIELDS: Option<&'static [&'static str]> =
        Some(&["troops", "resources", "owner_id", "last_collected"]);

    fn doc_id(&self) -> String {
        self.id.to_string()
    }
}

/// Ancient ruin guarding a research reward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruin {
    pub id: RuinId,
    #[serde(default)]
    pub troops: Roster,
    #[serde(default)]
    pub owner_id: Option<OwnerId>,
    #[serde(default)]
    pub research_reward: Option<String>,
    /// Set once a conqueror has claimed the reward
    #[serde(default)]
    pub reward_claimed_by: Option<OwnerId>,
}

impl Ruin {
    pub fn new(troops: Roster, research_reward: Option<String>) -> Self {
        Self {
            id: RuinId::new(),
            troops,
            owner_id: None,
            research_reward,
            reward_claimed_by: None,
        }
    }

    /// Reward still available to a new conqueror
    pub fn unclaimed_reward(&self) -> Option<&str> {
        match self.reward_claimed_by {
            Some(_) => None,
            None => self.research_reward.as_deref(),
        }
    }
}

impl Document for Ruin {
    const COLLECTION: Collection = Collection::Ruins;
    const OWNED_FIELDS: Option<&'static [&'static str]> = Some(&["troops", "owner_id", "reward_claimed_by"]);

    fn doc_id(&self) -> String {
        self.id.to_string()
    }
}

/// World-boss town shared by every player on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GodTown {
    pub id: TownId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub troops: Roster,
    pub health: u64,
    #[serde(default)]
    pub max_health: u64,
    #[serde(default)]
    pub stage: u32,
}

impl GodTown {
    pub fn new(name: impl Into<String>, troops: Roster, health: u64) -> Self {
        Self {
            id: TownId::new(),
            name: name.into(),
            troops,
            health,
            max_health: health,
            stage: 1,
        }
    }

    /// Apply defender casualties; returns true once the boss is defeated
    pub fn take_losses(&mut self, losses: &Roster) -> bool {
        self.troops.subtract(losses);
        self.health = self.health.saturating_sub(losses.total());
        self.is_defeated()
    }

    pub fn is_defeated(&self) -> bool {
        self.health == 0 || self.troops.is_empty()
    }
}

impl Document for GodTown {
    const COLLECTION: Collection = Collection::GodTowns;
    const OWNED_FIELDS: Option<&'static [&'static str]> = Some(&["troops", "health"]);

    fn doc_id(&self) -> String {
        self.id.to_string()
    }
}
