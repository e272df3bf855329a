//! Reports: immutable notifications written for the parties of a movement

use serde::{Deserialize, Serialize};

use crate::combat::CombatResult;
use crate::core::time::GameTime;
use crate::core::types::{MovementId, OwnerId, ReportId};
use crate::movement::record::{MovementKind, MovementTarget};
use crate::store::{Collection, Document};
use crate::units::Roster;
use crate::world::{ResourceLedger, SettlementSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub recipient: OwnerId,
    pub movement_id: MovementId,
    pub created_at: GameTime,
    pub body: ReportBody,
}

impl Report {
    pub fn new(recipient: OwnerId, movement_id: MovementId, created_at: GameTime, body: ReportBody) -> Self {
        Self {
            id: ReportId::new(),
            recipient,
            movement_id,
            created_at,
            body,
        }
    }
}

impl Document for Report {
    const COLLECTION: Collection = Collection::Reports;

    fn doc_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportBody {
    /// The target was gone when the movement arrived
    TargetVanished { movement_kind: MovementKind, target: MovementTarget },
    /// Attacker's view of a battle
    AttackOutcome(BattleReport),
    /// Defender's view of the same battle
    DefenseOutcome(BattleReport),
    ScoutSuccess { chance: f64, snapshot: SettlementSnapshot },
    ScoutFailure { chance: f64, silver_spent: u64 },
    SpyCaught { compensation: u64 },
    ReinforcementArrived { units: Roster },
    ReinforcementReceived { units: Roster },
    TradeDelivered { resources: ResourceLedger, dropped: ResourceLedger },
    TradeReceived { resources: ResourceLedger, dropped: ResourceLedger },
    TroopsReturned {
        units: Roster,
        wounded: Roster,
        resources: ResourceLedger,
        /// Cargo that did not fit in the warehouse
        dropped_resources: ResourceLedger,
        /// Wounded turned away by a full hospital
        dropped_wounded: Roster,
    },
}

/// Battle summary shared by the attacker and defender reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    pub target: MovementTarget,
    pub attacker: OwnerId,
    pub sent: Roster,
    pub attacker_won: bool,
    pub naval_defeat: bool,
    pub attacker_losses: Roster,
    pub wounded: Roster,
    pub defender_losses: Roster,
    /// Resources actually carried off
    pub plunder: ResourceLedger,
    #[serde(default)]
    pub effect: Option<TargetEffect>,
}

impl BattleReport {
    pub fn new(target: MovementTarget, attacker: OwnerId, sent: &Roster, result: &CombatResult, plunder: ResourceLedger) -> Self {
        Self {
            target,
            attacker,
            sent: sent.clone(),
            attacker_won: result.attacker_won,
            naval_defeat: result.naval_defeat,
            attacker_losses: result.attacker_losses.clone(),
            wounded: result.wounded.clone(),
            defender_losses: result.defender_losses.clone(),
            plunder,
            effect: None,
        }
    }

    pub fn with_effect(mut self, effect: Option<TargetEffect>) -> Self {
        self.effect = effect;
        self
    }
}

/// What a victorious attack did to a neutral target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum TargetEffect {
    VillageConquered,
    RuinConquered { research_reward: Option<String> },
    BossWounded { health: u64, max_health: u64 },
    BossDefeated,
}
