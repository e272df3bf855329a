//! Movement processor integration tests
//!
//! Each test dispatches movements into an in-memory store, lets them
//! arrive, and checks the world state and reports left behind.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use std::sync::Arc;

use strategos::core::types::{OwnerId, SettlementId};
use strategos::core::{EngineConfig, GameTime};
use strategos::movement::{
    ArrivalOutcome, DispatchOrder, Movement, MovementKind, MovementProcessor, MovementStatus, MovementTarget,
    Report, ReportBody, TargetEffect,
};
use strategos::store::{ArrivedMovement, Collection, MemoryStore, Store};
use strategos::units::{Roster, UnitCatalog};
use strategos::world::{GodTown, ResourceLedger, Ruin, Settlement, Village};

const T0: i64 = 1_000_000;

struct World {
    store: MemoryStore,
    catalog: Arc<UnitCatalog>,
    athenian: OwnerId,
    spartan: OwnerId,
    athens: SettlementId,
    sparta: SettlementId,
}

impl World {
    /// Athens (attacker) with a small home garrison, Sparta (defender) lightly held
    fn new() -> Self {
        let store = MemoryStore::new();
        let athenian = OwnerId::new();
        let spartan = OwnerId::new();

        let mut athens = Settlement::new("Athens", athenian);
        athens.units = Roster::new().with("hoplite", 50);
        athens.resources = ResourceLedger::new(100, 100, 100);

        let mut sparta = Settlement::new("Sparta", spartan);
        sparta.units = Roster::new().with("swordsman", 15).with("archer", 10);
        sparta.resources = ResourceLedger::new(1000, 600, 250);

        store.insert(&athens).unwrap();
        store.insert(&sparta).unwrap();

        Self {
            store,
            catalog: Arc::new(UnitCatalog::with_defaults()),
            athenian,
            spartan,
            athens: athens.id,
            sparta: sparta.id,
        }
    }

    fn order(&self, kind: MovementKind, target: MovementTarget) -> DispatchOrder {
        DispatchOrder::new(kind, self.athens, self.athenian, target, 30.0)
    }

    fn send(&self, order: DispatchOrder) -> Movement {
        let movement = Movement::dispatch(order, &self.catalog, &EngineConfig::default(), GameTime::from_secs(T0)).unwrap();
        self.store.insert(&movement).unwrap();
        movement
    }

    fn processor(&self, seed: u64) -> MovementProcessor<ChaCha8Rng> {
        MovementProcessor::new(Arc::clone(&self.catalog), ChaCha8Rng::seed_from_u64(seed))
    }

    fn movement(&self, id: &Movement) -> Option<Movement> {
        self.store.fetch::<Movement>(&id.id.to_string()).unwrap()
    }

    fn settlement(&self, id: SettlementId) -> Settlement {
        self.store.fetch::<Settlement>(&id.to_string()).unwrap().unwrap()
    }

    /// Let a movement arrive and process it at its arrival time
    fn arrive(&self, processor: &mut MovementProcessor<ChaCha8Rng>, movement: &Movement) -> ArrivalOutcome {
        let current = self.movement(movement).expect("movement should still exist");
        let arrived = ArrivedMovement {
            id: current.id,
            status: current.status,
            arrival_time: current.arrival_time,
        };
        processor.process(&self.store, &arrived, current.arrival_time).unwrap()
    }

    fn reports_for(&self, owner: OwnerId) -> Vec<ReportBody> {
        self.store
            .all::<Report>()
            .unwrap()
            .into_iter()
            .filter(|r| r.recipient == owner)
            .map(|r| r.body)
            .collect()
    }
}

#[test]
fn test_city_attack_round_trip() {
    let world = World::new();
    let mut processor = world.processor(1);
    let sent = Roster::new().with("hoplite", 100);
    let attack = world.send(
        world
            .order(MovementKind::Attack, MovementTarget::Settlement(world.sparta))
            .with_units(sent.clone())
            .with_target_owner(world.spartan),
    );

    let outcome = world.arrive(&mut processor, &attack);
    let expected_return = attack.arrival_time + attack.arrival_time.duration_since(attack.departure_time);
    assert_eq!(outcome, ArrivalOutcome::Returning { arrival_time: expected_return });

    // Defender wiped out and a quarter of its stock carried off
    let sparta = world.settlement(world.sparta);
    assert!(sparta.units.is_empty());
    assert_eq!(sparta.resources, ResourceLedger::new(750, 450, 188));

    let returning = world.movement(&attack).unwrap();
    assert_eq!(returning.status, MovementStatus::Returning);
    assert_eq!(returning.units.get(&"hoplite".into()), 85);
    assert_eq!(returning.wounded.get(&"hoplite".into()), 2);
    assert_eq!(returning.resources, ResourceLedger::new(250, 150, 62));

    let attacker_reports = world.reports_for(world.athenian);
    assert!(matches!(attacker_reports.as_slice(), [ReportBody::AttackOutcome(r)] if r.attacker_won));
    let defender_reports = world.reports_for(world.spartan);
    assert!(matches!(defender_reports.as_slice(), [ReportBody::DefenseOutcome(r)] if r.attacker_won));

    // Homecoming adds exactly what was carried
    let before = world.settlement(world.athens);
    assert_eq!(world.arrive(&mut processor, &attack), ArrivalOutcome::Completed);
    let after = world.settlement(world.athens);

    assert!(world.movement(&attack).is_none());
    assert_eq!(after.units.get(&"hoplite".into()), before.units.get(&"hoplite".into()) + 85);
    assert_eq!(after.wounded.get(&"hoplite".into()), before.wounded.get(&"hoplite".into()) + 2);
    assert_eq!(after.resources, ResourceLedger::new(350, 250, 162));
    assert!(matches!(
        world.reports_for(world.athenian).as_slice(),
        [_, ReportBody::TroopsReturned { .. }] | [ReportBody::TroopsReturned { .. }, _]
    ));
}

#[test]
fn test_wiped_out_attack_is_deleted_without_plunder() {
    let world = World::new();
    let mut processor = world.processor(1);

    let mut sparta = world.settlement(world.sparta);
    sparta.units = Roster::new().with("hoplite", 100);
    world.store.insert(&sparta).unwrap();

    let attack = world.send(
        world
            .order(MovementKind::Attack, MovementTarget::Settlement(world.sparta))
            .with_units(Roster::new().with("swordsman", 5)),
    );

    assert_eq!(world.arrive(&mut processor, &attack), ArrivalOutcome::Completed);
    assert!(world.movement(&attack).is_none());

    let sparta = world.settlement(world.sparta);
    assert_eq!(sparta.units.get(&"hoplite".into()), 99);
    assert_eq!(sparta.resources, ResourceLedger::new(1000, 600, 250));
}

#[test]
fn test_vanished_target_reports_to_origin_only() {
    let world = World::new();
    let mut processor = world.processor(1);
    let attack = world.send(
        world
            .order(MovementKind::Attack, MovementTarget::Settlement(SettlementId::new()))
            .with_units(Roster::new().with("hoplite", 10)),
    );

    assert_eq!(world.arrive(&mut processor, &attack), ArrivalOutcome::TargetVanished);
    assert!(world.movement(&attack).is_none());

    let reports = world.store.all::<Report>().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].recipient, world.athenian);
    assert!(matches!(reports[0].body, ReportBody::TargetVanished { movement_kind: MovementKind::Attack, .. }));
}

#[test]
fn test_vanished_origin_drops_movement_silently() {
    let world = World::new();
    let mut processor = world.processor(1);
    let orphan = world.send(
        DispatchOrder::new(
            MovementKind::Reinforce,
            SettlementId::new(),
            OwnerId::new(),
            MovementTarget::Settlement(world.sparta),
            10.0,
        )
        .with_units(Roster::new().with("archer", 5)),
    );

    assert_eq!(world.arrive(&mut processor, &orphan), ArrivalOutcome::OriginVanished);
    assert!(world.movement(&orphan).is_none());
    assert_eq!(world.store.count(Collection::Reports), 0);
    assert_eq!(world.settlement(world.sparta).units.get(&"archer".into()), 10);
}

#[test]
fn test_village_conquest() {
    let world = World::new();
    let mut processor = world.processor(1);
    let village = Village::new(
        1,
        Roster::new().with("swordsman", 15).with("archer", 10),
        ResourceLedger::new(1000, 600, 250),
    );
    world.store.insert(&village).unwrap();

    let raid = world.send(
        world
            .order(MovementKind::AttackVillage, MovementTarget::Village(village.id))
            .with_units(Roster::new().with("hoplite", 100)),
    );
    assert!(matches!(world.arrive(&mut processor, &raid), ArrivalOutcome::Returning { .. }));

    let taken = world.store.fetch::<Village>(&village.id.to_string()).unwrap().unwrap();
    assert_eq!(taken.owner_id, Some(world.athenian));
    assert_eq!(taken.last_collected, Some(raid.arrival_time));
    assert!(taken.troops.is_empty());
    assert_eq!(taken.resources, ResourceLedger::new(750, 450, 188));

    let reports = world.reports_for(world.athenian);
    assert!(matches!(
        reports.as_slice(),
        [ReportBody::AttackOutcome(r)] if r.effect == Some(TargetEffect::VillageConquered)
    ));
}

#[test]
fn test_ruin_conquest_claims_reward_once() {
    let world = World::new();
    let mut processor = world.processor(1);

    let fresh = Ruin::new(Roster::new().with("hoplite", 10), Some("naval_warfare".into()));
    let mut plundered = Ruin::new(Roster::new().with("hoplite", 10), Some("siegecraft".into()));
    plundered.reward_claimed_by = Some(OwnerId::new());
    world.store.insert(&fresh).unwrap();
    world.store.insert(&plundered).unwrap();

    for ruin in [&fresh, &plundered] {
        let attack = world.send(
            world
                .order(MovementKind::AttackRuin, MovementTarget::Ruin(ruin.id))
                .with_units(Roster::new().with("hoplite", 100)),
        );
        world.arrive(&mut processor, &attack);
    }

    let fresh = world.store.fetch::<Ruin>(&fresh.id.to_string()).unwrap().unwrap();
    assert_eq!(fresh.owner_id, Some(world.athenian));
    assert_eq!(fresh.reward_claimed_by, Some(world.athenian));

    let plundered_after = world.store.fetch::<Ruin>(&plundered.id.to_string()).unwrap().unwrap();
    assert_eq!(plundered_after.owner_id, Some(world.athenian));
    assert_eq!(plundered_after.reward_claimed_by, plundered.reward_claimed_by);

    let rewards: Vec<Option<String>> = world
        .reports_for(world.athenian)
        .into_iter()
        .filter_map(|body| match body {
            ReportBody::AttackOutcome(r) => match r.effect {
                Some(TargetEffect::RuinConquered { research_reward }) => Some(research_reward),
                _ => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(rewards.len(), 2);
    assert!(rewards.contains(&Some("naval_warfare".to_string())));
    assert!(rewards.contains(&None));
}

#[test]
fn test_world_boss_loses_health_then_falls() {
    let world = World::new();
    let mut processor = world.processor(1);

    let boss = GodTown::new("Temple of Hydra", Roster::new().with("hoplite", 500), 1000);
    world.store.insert(&boss).unwrap();

    let raid = world.send(
        world
            .order(MovementKind::AttackGodTown, MovementTarget::GodTown(boss.id))
            .with_units(Roster::new().with("slinger", 100)),
    );
    world.arrive(&mut processor, &raid);

    let wounded = world.store.fetch::<GodTown>(&boss.id.to_string()).unwrap().unwrap();
    let killed = 500 - wounded.troops.get(&"hoplite".into()) as u64;
    assert!(killed > 0);
    assert_eq!(wounded.health, 1000 - killed);

    let mut weak = GodTown::new("Shrine of Typhon", Roster::new().with("swordsman", 5), 100);
    weak.stage = 3;
    world.store.insert(&weak).unwrap();
    let finisher = world.send(
        world
            .order(MovementKind::AttackGodTown, MovementTarget::GodTown(weak.id))
            .with_units(Roster::new().with("hoplite", 100)),
    );
    world.arrive(&mut processor, &finisher);

    assert!(world.store.fetch::<GodTown>(&weak.id.to_string()).unwrap().is_none());
    assert!(world.reports_for(world.athenian).iter().any(|body| matches!(
        body,
        ReportBody::AttackOutcome(r) if r.effect == Some(TargetEffect::BossDefeated)
    )));
}

#[test]
fn test_scout_success_reports_snapshot() {
    let world = World::new();
    let mut processor = world.processor(7);
    let spy = world.send(
        world
            .order(MovementKind::Scout, MovementTarget::Settlement(world.sparta))
            .with_resources(ResourceLedger::new(0, 0, 1000)),
    );

    assert_eq!(world.arrive(&mut processor, &spy), ArrivalOutcome::Completed);
    assert!(world.movement(&spy).is_none());

    let sparta = world.settlement(world.sparta);
    match world.reports_for(world.athenian).as_slice() {
        [ReportBody::ScoutSuccess { snapshot, .. }] => {
            assert_eq!(snapshot.units, sparta.units);
            assert_eq!(snapshot.resources, sparta.resources);
        }
        other => panic!("unexpected reports {:?}", other),
    }
    assert!(world.reports_for(world.spartan).is_empty());
}

#[test]
fn test_caught_spy_pays_the_defender() {
    let world = World::new();
    let mut processor = world.processor(7);

    let mut sparta = world.settlement(world.sparta);
    sparta.cave.silver = 1_000_000;
    world.store.insert(&sparta).unwrap();

    let spy = world.send(
        world
            .order(MovementKind::Scout, MovementTarget::Settlement(world.sparta))
            .with_resources(ResourceLedger::new(0, 0, 301)),
    );

    assert_eq!(world.arrive(&mut processor, &spy), ArrivalOutcome::Completed);
    assert!(world.movement(&spy).is_none());
    assert_eq!(world.settlement(world.sparta).cave.silver, 1_000_150);

    assert!(matches!(
        world.reports_for(world.athenian).as_slice(),
        [ReportBody::ScoutFailure { silver_spent: 301, .. }]
    ));
    assert!(matches!(
        world.reports_for(world.spartan).as_slice(),
        [ReportBody::SpyCaught { compensation: 150 }]
    ));
}

#[test]
fn test_reinforcements_join_the_garrison() {
    let world = World::new();
    let mut processor = world.processor(1);
    let help = world.send(
        world
            .order(MovementKind::Reinforce, MovementTarget::Settlement(world.sparta))
            .with_units(Roster::new().with("archer", 20)),
    );

    assert_eq!(world.arrive(&mut processor, &help), ArrivalOutcome::Completed);
    assert!(world.movement(&help).is_none());
    assert_eq!(world.settlement(world.sparta).units.get(&"archer".into()), 30);
    assert_eq!(world.reports_for(world.athenian).len(), 1);
    assert_eq!(world.reports_for(world.spartan).len(), 1);
}

#[test]
fn test_transfer_to_missing_target_vanishes_quietly() {
    let world = World::new();
    let mut processor = world.processor(1);
    let caravan = world.send(
        world
            .order(MovementKind::Trade, MovementTarget::Settlement(SettlementId::new()))
            .with_resources(ResourceLedger::new(300, 0, 0)),
    );

    assert_eq!(world.arrive(&mut processor, &caravan), ArrivalOutcome::TargetVanished);
    assert!(world.movement(&caravan).is_none());
    assert_eq!(world.store.count(Collection::Reports), 0);
}

#[test]
fn test_trade_respects_warehouse_and_foreign_fields() {
    let world = World::new();
    let mut processor = world.processor(1);

    // Sparta's record carries a field only the research subsystem knows about
    let mut sparta = world.settlement(world.sparta);
    sparta.resources = ResourceLedger::new(900, 0, 0);
    sparta.warehouse_capacity = Some(1000);
    let mut raw = serde_json::to_value(&sparta).unwrap();
    raw["research_queue"] = json!(["pottery", "phalanx"]);
    world.store.insert_raw(Collection::Settlements, &sparta.id.to_string(), raw).unwrap();

    let caravan = world.send(
        world
            .order(MovementKind::Trade, MovementTarget::Settlement(world.sparta))
            .with_resources(ResourceLedger::new(500, 200, 0))
            .with_target_owner(world.spartan),
    );
    assert_eq!(world.arrive(&mut processor, &caravan), ArrivalOutcome::Completed);

    let after = world.settlement(world.sparta);
    assert_eq!(after.resources, ResourceLedger::new(1000, 200, 0));

    let raw = world
        .store
        .fetch_raw(Collection::Settlements, &sparta.id.to_string())
        .unwrap()
        .unwrap();
    assert_eq!(raw["research_queue"], json!(["pottery", "phalanx"]));

    assert!(matches!(
        world.reports_for(world.spartan).as_slice(),
        [ReportBody::TradeReceived { dropped, .. }] if dropped.wood == 400
    ));
}

#[test]
fn test_full_hospital_drops_wounded() {
    let world = World::new();
    let mut processor = world.processor(1);

    let mut athens = world.settlement(world.athens);
    athens.wounded = Roster::new().with("hoplite", 4);
    athens.wounded_capacity = Some(4);
    world.store.insert(&athens).unwrap();

    let attack = world.send(
        world
            .order(MovementKind::Attack, MovementTarget::Settlement(world.sparta))
            .with_units(Roster::new().with("hoplite", 100)),
    );
    world.arrive(&mut processor, &attack);
    world.arrive(&mut processor, &attack);

    let athens = world.settlement(world.athens);
    assert_eq!(athens.wounded.get(&"hoplite".into()), 4);
    assert!(world.reports_for(world.athenian).iter().any(|body| matches!(
        body,
        ReportBody::TroopsReturned { dropped_wounded, .. } if dropped_wounded.get(&"hoplite".into()) == 2
    )));
}

#[test]
fn test_reprocessing_is_a_no_op() {
    let world = World::new();
    let mut processor = world.processor(1);
    let attack = world.send(
        world
            .order(MovementKind::Attack, MovementTarget::Settlement(world.sparta))
            .with_units(Roster::new().with("hoplite", 100)),
    );
    let stale = ArrivedMovement {
        id: attack.id,
        status: MovementStatus::Moving,
        arrival_time: attack.arrival_time,
    };

    processor.process(&world.store, &stale, attack.arrival_time).unwrap();
    let sparta = world.settlement(world.sparta);
    let reports = world.store.count(Collection::Reports);

    // A retried tick with the same snapshot changes nothing
    let again = processor.process(&world.store, &stale, attack.arrival_time).unwrap();
    assert_eq!(again, ArrivalOutcome::Stale);
    assert_eq!(world.settlement(world.sparta), sparta);
    assert_eq!(world.store.count(Collection::Reports), reports);
}

#[test]
fn test_not_yet_due_is_stale() {
    let world = World::new();
    let mut processor = world.processor(1);
    let help = world.send(
        world
            .order(MovementKind::Reinforce, MovementTarget::Settlement(world.sparta))
            .with_units(Roster::new().with("archer", 5)),
    );
    let early = ArrivedMovement {
        id: help.id,
        status: MovementStatus::Moving,
        arrival_time: help.arrival_time,
    };

    let outcome = processor.process(&world.store, &early, GameTime::from_secs(T0)).unwrap();
    assert_eq!(outcome, ArrivalOutcome::Stale);
    assert!(world.movement(&help).is_some());
}

#[test]
fn test_failed_commit_leaves_everything_untouched() {
    let world = World::new();
    let mut processor = world.processor(1);
    let attack = world.send(
        world
            .order(MovementKind::Attack, MovementTarget::Settlement(world.sparta))
            .with_units(Roster::new().with("hoplite", 100)),
    );
    let sparta = world.settlement(world.sparta);

    world.store.fail_next_commits(1).unwrap();
    let arrived = world.store.arrived_movements(attack.arrival_time).unwrap();
    let err = processor.process(&world.store, &arrived[0], attack.arrival_time).unwrap_err();

    assert!(err.is_transient());
    assert_eq!(world.movement(&attack).unwrap().status, MovementStatus::Moving);
    assert_eq!(world.settlement(world.sparta), sparta);
    assert_eq!(world.store.count(Collection::Reports), 0);

    // The next tick goes through
    let outcome = processor.process(&world.store, &arrived[0], attack.arrival_time).unwrap();
    assert!(matches!(outcome, ArrivalOutcome::Returning { .. }));
}

#[test]
fn test_unknown_movement_type_is_discarded() {
    let world = World::new();
    let mut processor = world.processor(1);
    let id = strategos::core::types::MovementId::new();
    world
        .store
        .insert_raw(
            Collection::Movements,
            &id.to_string(),
            json!({
                "id": id,
                "type": "siege",
                "status": "moving",
                "origin_settlement_id": world.athens,
                "origin_owner_id": world.athenian,
                "departure_time": T0 * 1000,
                "arrival_time": T0 * 1000 + 1,
            }),
        )
        .unwrap();

    let now = GameTime::from_secs(T0 + 1);
    let arrived = world.store.arrived_movements(now).unwrap();
    assert_eq!(arrived.len(), 1);

    let outcome = processor.process(&world.store, &arrived[0], now).unwrap();
    assert_eq!(outcome, ArrivalOutcome::Discarded);
    assert_eq!(world.store.count(Collection::Movements), 0);
}

#[test]
fn test_two_reinforcements_same_target_both_land() {
    let world = World::new();
    let mut processor = world.processor(1);
    let first = world.send(
        world
            .order(MovementKind::Reinforce, MovementTarget::Settlement(world.sparta))
            .with_units(Roster::new().with("archer", 3)),
    );
    let second = world.send(
        world
            .order(MovementKind::Reinforce, MovementTarget::Settlement(world.sparta))
            .with_units(Roster::new().with("archer", 4)),
    );

    let now = first.arrival_time.max(second.arrival_time);
    for arrived in world.store.arrived_movements(now).unwrap() {
        processor.process(&world.store, &arrived, now).unwrap();
    }

    assert_eq!(world.settlement(world.sparta).units.get(&"archer".into()), 17);
    assert_eq!(world.store.count(Collection::Movements), 0);
}

#[test]
fn test_movements_involving_owner() {
    let world = World::new();
    let attack = world.send(
        world
            .order(MovementKind::Attack, MovementTarget::Settlement(world.sparta))
            .with_units(Roster::new().with("hoplite", 10))
            .with_target_owner(world.spartan),
    );
    let _trade = world.send(
        world
            .order(MovementKind::Trade, MovementTarget::Settlement(world.athens))
            .with_resources(ResourceLedger::new(1, 0, 0)),
    );

    assert_eq!(world.store.movements_involving(world.spartan).unwrap(), vec![attack.id]);
    assert_eq!(world.store.movements_involving(world.athenian).unwrap().len(), 2);
}
