//! The movement record: a dispatch in flight or on its way home

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::combat::Formation;
use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Result};
use crate::core::time::GameTime;
use crate::core::types::{MovementId, OwnerId, RuinId, SettlementId, TownId, VillageId};
use crate::movement::travel::travel_duration;
use crate::store::{Collection, Document};
use crate::units::{Roster, UnitCatalog};
use crate::world::ResourceLedger;

/// What a movement sets out to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum MovementKind {
    Attack,
    AttackVillage,
    AttackRuin,
    AttackGodTown,
    Scout,
    Reinforce,
    Trade,
}

impl MovementKind {
    pub const ALL: [MovementKind; 7] = [
        MovementKind::Attack,
        MovementKind::AttackVillage,
        MovementKind::AttackRuin,
        MovementKind::AttackGodTown,
        MovementKind::Scout,
        MovementKind::Reinforce,
        MovementKind::Trade,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MovementKind::Attack => "attack",
            MovementKind::AttackVillage => "attack_village",
            MovementKind::AttackRuin => "attack_ruin",
            MovementKind::AttackGodTown => "attack_god_town",
            MovementKind::Scout => "scout",
            MovementKind::Reinforce => "reinforce",
            MovementKind::Trade => "trade",
        }
    }

    /// Scouts and traders travel on a flat schedule
    pub fn uses_flat_schedule(&self) -> bool {
        matches!(self, MovementKind::Scout | MovementKind::Trade)
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MovementKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        MovementKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| EngineError::UnknownMovementType(s.to_string()))
    }
}

impl TryFrom<String> for MovementKind {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Moving,
    Returning,
}

/// The one entity a movement is headed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "snake_case")]
pub enum MovementTarget {
    Settlement(SettlementId),
    Village(VillageId),
    Ruin(RuinId),
    GodTown(TownId),
}

impl MovementTarget {
    /// Whether a movement of `kind` may be sent at this target
    pub fn accepts(&self, kind: MovementKind) -> bool {
        match self {
            MovementTarget::Settlement(_) => matches!(
                kind,
                MovementKind::Attack | MovementKind::Scout | MovementKind::Reinforce | MovementKind::Trade
            ),
            MovementTarget::Village(_) => kind == MovementKind::AttackVillage,
            MovementTarget::Ruin(_) => kind == MovementKind::AttackRuin,
            MovementTarget::GodTown(_) => kind == MovementKind::AttackGodTown,
        }
    }
}

/// A dispatch in flight
///
/// Exactly one of the `target_*_id` fields is set, matching `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub status: MovementStatus,

    pub origin_settlement_id: SettlementId,
    pub origin_owner_id: OwnerId,
    #[serde(default)]
    pub origin_owner_username: Option<String>,

    #[serde(default)]
    pub target_settlement_id: Option<SettlementId>,
    #[serde(default)]
    pub target_village_id: Option<VillageId>,
    #[serde(default)]
    pub target_ruin_id: Option<RuinId>,
    #[serde(default)]
    pub target_town_id: Option<TownId>,
    /// Owner of the target, absent for neutral targets
    #[serde(default)]
    pub target_owner_id: Option<OwnerId>,

    #[serde(default)]
    pub units: Roster,
    #[serde(default)]
    pub resources: ResourceLedger,
    #[serde(default)]
    pub wounded: Roster,
    #[serde(default)]
    pub attack_formation: Option<Formation>,
    /// The target lies across the sea
    #[serde(default)]
    pub cross_domain: bool,

    pub departure_time: GameTime,
    pub arrival_time: GameTime,
    #[serde(default)]
    pub involved_parties: BTreeSet<OwnerId>,
}

/// Everything an external dispatch action decides before sending troops
#[derive(Debug, Clone)]
pub struct DispatchOrder {
    pub kind: MovementKind,
    pub origin_settlement_id: SettlementId,
    pub origin_owner_id: OwnerId,
    pub origin_owner_username: Option<String>,
    pub target: MovementTarget,
    pub target_owner_id: Option<OwnerId>,
    pub units: Roster,
    pub resources: ResourceLedger,
    pub formation: Option<Formation>,
    pub cross_domain: bool,
    /// Map distance between origin and target
    pub distance: f64,
}

impl DispatchOrder {
    pub fn new(
        kind: MovementKind,
        origin_settlement_id: SettlementId,
        origin_owner_id: OwnerId,
        target: MovementTarget,
        distance: f64,
    ) -> Self {
        Self {
            kind,
            origin_settlement_id,
            origin_owner_id,
            origin_owner_username: None,
            target,
            target_owner_id: None,
            units: Roster::new(),
            resources: ResourceLedger::default(),
            formation: None,
            cross_domain: false,
            distance,
        }
    }

    pub fn with_units(mut self, units: Roster) -> Self {
        self.units = units;
        self
    }

    pub fn with_resources(mut self, resources: ResourceLedger) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_target_owner(mut self, owner: OwnerId) -> Self {
        self.target_owner_id = Some(owner);
        self
    }

    pub fn with_formation(mut self, formation: Formation) -> Self {
        self.formation = Some(formation);
        self
    }

    pub fn across_sea(mut self) -> Self {
        self.cross_domain = true;
        self
    }

    fn validate(&self, catalog: &UnitCatalog) -> Result<()> {
        if !self.target.accepts(self.kind) {
            return Err(EngineError::InvalidDispatch(format!(
                "{} cannot target {:?}",
                self.kind, self.target
            )));
        }
        if !(self.distance.is_finite() && self.distance > 0.0) {
            return Err(EngineError::InvalidDispatch(format!("distance must be positive, got {}", self.distance)));
        }
        if let Some(unknown) = self.units.kinds().find(|kind| !catalog.contains(kind)) {
            return Err(EngineError::UnknownUnit(unknown.clone()));
        }

        let empty = match self.kind {
            MovementKind::Trade => self.resources.is_empty(),
            MovementKind::Scout => self.resources.silver == 0,
            _ => self.units.is_empty(),
        };
        if empty {
            return Err(EngineError::InvalidDispatch(format!("{} carries nothing", self.kind)));
        }
        Ok(())
    }
}

impl Movement {
    /// Build a `moving` record departing at `now`
    pub fn dispatch(order: DispatchOrder, catalog: &UnitCatalog, config: &EngineConfig, now: GameTime) -> Result<Self> {
        order.validate(catalog)?;
        let travel = travel_duration(order.kind, order.distance, &order.units, catalog, config)?;

        let mut involved_parties = BTreeSet::from([order.origin_owner_id]);
        involved_parties.extend(order.target_owner_id);

        let mut movement = Movement {
            id: MovementId::new(),
            kind: order.kind,
            status: MovementStatus::Moving,
            origin_settlement_id: order.origin_settlement_id,
            origin_owner_id: order.origin_owner_id,
            origin_owner_username: order.origin_owner_username,
            target_settlement_id: None,
            target_village_id: None,
            target_ruin_id: None,
            target_town_id: None,
            target_owner_id: order.target_owner_id,
            units: order.units,
            resources: order.resources,
            wounded: Roster::new(),
            attack_formation: order.formation,
            cross_domain: order.cross_domain,
            departure_time: now,
            // At least one millisecond, so arrival always follows departure
            arrival_time: now + travel.max(std::time::Duration::from_millis(1)),
            involved_parties,
        };
        match order.target {
            MovementTarget::Settlement(id) => movement.target_settlement_id = Some(id),
            MovementTarget::Village(id) => movement.target_village_id = Some(id),
            MovementTarget::Ruin(id) => movement.target_ruin_id = Some(id),
            MovementTarget::GodTown(id) => movement.target_town_id = Some(id),
        }

        tracing::debug!(movement_id = %movement.id, kind = %movement.kind, arrival = %movement.arrival_time, "Movement dispatched");
        Ok(movement)
    }

    /// The target matching this movement's kind
    pub fn target(&self) -> Result<MovementTarget> {
        let target = match self.kind {
            MovementKind::Attack | MovementKind::Scout | MovementKind::Reinforce | MovementKind::Trade => {
                self.target_settlement_id.map(MovementTarget::Settlement)
            }
            MovementKind::AttackVillage => self.target_village_id.map(MovementTarget::Village),
            MovementKind::AttackRuin => self.target_ruin_id.map(MovementTarget::Ruin),
            MovementKind::AttackGodTown => self.target_town_id.map(MovementTarget::GodTown),
        };
        target.ok_or(EngineError::MissingTarget(self.id))
    }

    pub fn is_due(&self, now: GameTime) -> bool {
        self.arrival_time <= now
    }

    /// Turn around with whatever is left, taking as long as the outward leg
    pub fn begin_return(&mut self, survivors: Roster, wounded: Roster, cargo: ResourceLedger) {
        let leg = self.arrival_time.duration_since(self.departure_time);
        self.status = MovementStatus::Returning;
        self.units = survivors;
        self.wounded = wounded;
        self.resources = cargo;
        self.arrival_time = self.arrival_time + leg;
    }
}

impl Document for Movement {
    const COLLECTION: Collection = Collection::Movements;
    const OWNED_FIELDS: Option<&'static [&'static str]> =
        Some(&["status", "units", "resources", "wounded", "arrival_time"]);

    fn doc_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(kind: MovementKind, target: MovementTarget) -> DispatchOrder {
        DispatchOrder::new(kind, SettlementId::new(), OwnerId::new(), target, 10.0)
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in MovementKind::ALL {
            assert_eq!(kind.name().parse::<MovementKind>().unwrap(), kind);
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::json!(kind.name()));
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = "siege".parse::<MovementKind>().unwrap_err();
        assert!(matches!(err, EngineError::UnknownMovementType(ref t) if t == "siege"));
        assert!(serde_json::from_value::<MovementKind>(serde_json::json!("siege")).is_err());
    }

    #[test]
    fn test_dispatch_sets_matching_target() {
        let catalog = UnitCatalog::with_defaults();
        let config = EngineConfig::default();
        let village = VillageId::new();
        let movement = Movement::dispatch(
            order(MovementKind::AttackVillage, MovementTarget::Village(village))
                .with_units(Roster::new().with("hoplite", 10)),
            &catalog,
            &config,
            GameTime::from_secs(1_000),
        )
        .unwrap();

        assert_eq!(movement.status, MovementStatus::Moving);
        assert_eq!(movement.target().unwrap(), MovementTarget::Village(village));
        assert!(movement.target_settlement_id.is_none());
        assert!(movement.arrival_time > movement.departure_time);
        assert!(movement.involved_parties.contains(&movement.origin_owner_id));
    }

    #[test]
    fn test_dispatch_rejects_mismatched_target() {
        let catalog = UnitCatalog::with_defaults();
        let result = Movement::dispatch(
            order(MovementKind::AttackRuin, MovementTarget::Village(VillageId::new()))
                .with_units(Roster::new().with("hoplite", 1)),
            &catalog,
            &EngineConfig::default(),
            GameTime::EPOCH,
        );
        assert!(matches!(result, Err(EngineError::InvalidDispatch(_))));
    }

    #[test]
    fn test_dispatch_rejects_empty_payload_and_unknown_units() {
        let catalog = UnitCatalog::with_defaults();
        let config = EngineConfig::default();
        let city = MovementTarget::Settlement(SettlementId::new());

        let empty = Movement::dispatch(order(MovementKind::Attack, city), &catalog, &config, GameTime::EPOCH);
        assert!(matches!(empty, Err(EngineError::InvalidDispatch(_))));

        let unknown = Movement::dispatch(
            order(MovementKind::Reinforce, city).with_units(Roster::new().with("dragon", 1)),
            &catalog,
            &config,
            GameTime::EPOCH,
        );
        assert!(matches!(unknown, Err(EngineError::UnknownUnit(_))));

        let broke_spy = Movement::dispatch(
            order(MovementKind::Scout, city).with_resources(ResourceLedger::new(100, 0, 0)),
            &catalog,
            &config,
            GameTime::EPOCH,
        );
        assert!(matches!(broke_spy, Err(EngineError::InvalidDispatch(_))));
    }

    #[test]
    fn test_return_leg_mirrors_outward_leg() {
        let catalog = UnitCatalog::with_defaults();
        let mut movement = Movement::dispatch(
            order(MovementKind::Attack, MovementTarget::Settlement(SettlementId::new()))
                .with_units(Roster::new().with("hoplite", 10)),
            &catalog,
            &EngineConfig::default(),
            GameTime::from_secs(100),
        )
        .unwrap();
        let outward = movement.arrival_time.duration_since(movement.departure_time);
        let arrived = movement.arrival_time;

        movement.begin_return(Roster::new().with("hoplite", 7), Roster::new(), ResourceLedger::new(5, 5, 5));

        assert_eq!(movement.status, MovementStatus::Returning);
        assert_eq!(movement.arrival_time, arrived + outward);
        assert_eq!(movement.departure_time, GameTime::from_secs(100));
        assert_eq!(movement.units.get(&"hoplite".into()), 7);
    }

    #[test]
    fn test_missing_target_field_is_reported() {
        let catalog = UnitCatalog::with_defaults();
        let mut movement = Movement::dispatch(
            order(MovementKind::Trade, MovementTarget::Settlement(SettlementId::new()))
                .with_resources(ResourceLedger::new(10, 0, 0)),
            &catalog,
            &EngineConfig::default(),
            GameTime::EPOCH,
        )
        .unwrap();
        movement.target_settlement_id = None;
        assert!(matches!(movement.target(), Err(EngineError::MissingTarget(_))));
    }
}
