//! Attack arrivals: cities, villages, ruins and world-boss towns

use crate::combat::{resolve_combat, CombatResult, Engagement};
use crate::core::error::Result;
use crate::core::time::GameTime;
use crate::movement::processor::{send_report, target_vanished, ArrivalOutcome};
use crate::movement::record::{Movement, MovementTarget};
use crate::movement::report::{BattleReport, ReportBody, TargetEffect};
use crate::store::{Document, UnitOfWork};
use crate::units::{Roster, UnitCatalog};
use crate::world::{GodTown, ResourceLedger, Ruin, Settlement, Village};

pub(crate) fn resolve<T: UnitOfWork>(
    catalog: &UnitCatalog,
    tx: &mut T,
    movement: Movement,
    target: MovementTarget,
    now: GameTime,
) -> Result<ArrivalOutcome> {
    match target {
        MovementTarget::Settlement(id) => {
            let Some(city) = tx.get::<Settlement>(&id.to_string())? else {
                return target_vanished(tx, &movement, target, now);
            };
            attack_city(catalog, tx, movement, target, city, now)
        }
        MovementTarget::Village(id) => {
            let Some(village) = tx.get::<Village>(&id.to_string())? else {
                return target_vanished(tx, &movement, target, now);
            };
            attack_village(catalog, tx, movement, target, village, now)
        }
        MovementTarget::Ruin(id) => {
            let Some(ruin) = tx.get::<Ruin>(&id.to_string())? else {
                return target_vanished(tx, &movement, target, now);
            };
            attack_ruin(catalog, tx, movement, target, ruin, now)
        }
        MovementTarget::GodTown(id) => {
            let Some(town) = tx.get::<GodTown>(&id.to_string())? else {
                return target_vanished(tx, &movement, target, now);
            };
            attack_god_town(catalog, tx, movement, target, town, now)
        }
    }
}

fn attack_city<T: UnitOfWork>(
    catalog: &UnitCatalog,
    tx: &mut T,
    movement: Movement,
    target: MovementTarget,
    mut city: Settlement,
    now: GameTime,
) -> Result<ArrivalOutcome> {
    let result = fight(catalog, &movement, &city.units, &city.resources);
    let plunder = carried_plunder(&movement, &result);

    city.units.subtract(&result.defender_losses);
    city.resources.subtract(&plunder);
    tx.set(&city)?;

    let report = BattleReport::new(target, movement.origin_owner_id, &movement.units, &result, plunder);
    if let Some(defender) = city.owner_id {
        send_report(tx, defender, movement.id, now, ReportBody::DefenseOutcome(report.clone()))?;
    }
    send_report(tx, movement.origin_owner_id, movement.id, now, ReportBody::AttackOutcome(report))?;

    conclude(tx, movement, &result, plunder)
}

fn attack_village<T: UnitOfWork>(
    catalog: &UnitCatalog,
    tx: &mut T,
    movement: Movement,
    target: MovementTarget,
    mut village: Village,
    now: GameTime,
) -> Result<ArrivalOutcome> {
    let result = fight(catalog, &movement, &village.troops, &village.resources);
    let plunder = carried_plunder(&movement, &result);

    village.troops.subtract(&result.defender_losses);
    village.resources.subtract(&plunder);
    let effect = if result.attacker_won {
        village.owner_id = Some(movement.origin_owner_id);
        village.last_collected = Some(now);
        Some(TargetEffect::VillageConquered)
    } else {
        None
    };
    tx.set(&village)?;

    let report = BattleReport::new(target, movement.origin_owner_id, &movement.units, &result, plunder).with_effect(effect);
    send_report(tx, movement.origin_owner_id, movement.id, now, ReportBody::AttackOutcome(report))?;

    conclude(tx, movement, &result, plunder)
}

fn attack_ruin<T: UnitOfWork>(
    catalog: &UnitCatalog,
    tx: &mut T,
    movement: Movement,
    target: MovementTarget,
    mut ruin: Ruin,
    now: GameTime,
) -> Result<ArrivalOutcome> {
    let result = fight(catalog, &movement, &ruin.troops, &ResourceLedger::default());

    ruin.troops.subtract(&result.defender_losses);
    let effect = if result.attacker_won {
        let research_reward = ruin.unclaimed_reward().map(str::to_string);
        ruin.owner_id = Some(movement.origin_owner_id);
        if research_reward.is_some() {
            ruin.reward_claimed_by = Some(movement.origin_owner_id);
        }
        Some(TargetEffect::RuinConquered { research_reward })
    } else {
        None
    };
    tx.set(&ruin)?;

    let report = BattleReport::new(target, movement.origin_owner_id, &movement.units, &result, ResourceLedger::default())
        .with_effect(effect);
    send_report(tx, movement.origin_owner_id, movement.id, now, ReportBody::AttackOutcome(report))?;

    conclude(tx, movement, &result, ResourceLedger::default())
}

fn attack_god_town<T: UnitOfWork>(
    catalog: &UnitCatalog,
    tx: &mut T,
    movement: Movement,
    target: MovementTarget,
    mut town: GodTown,
    now: GameTime,
) -> Result<ArrivalOutcome> {
    let result = fight(catalog, &movement, &town.troops, &ResourceLedger::default());

    let effect = if town.take_losses(&result.defender_losses) {
        tracing::info!(town = %town.id, name = %town.name, "World boss defeated");
        tx.delete::<GodTown>(&town.doc_id());
        TargetEffect::BossDefeated
    } else {
        tx.set(&town)?;
        TargetEffect::BossWounded {
            health: town.health,
            max_health: town.max_health,
        }
    };

    let report = BattleReport::new(target, movement.origin_owner_id, &movement.units, &result, ResourceLedger::default())
        .with_effect(Some(effect));
    if let Some(defender) = movement.target_owner_id {
        send_report(tx, defender, movement.id, now, ReportBody::DefenseOutcome(report.clone()))?;
    }
    send_report(tx, movement.origin_owner_id, movement.id, now, ReportBody::AttackOutcome(report))?;

    conclude(tx, movement, &result, ResourceLedger::default())
}

fn fight(catalog: &UnitCatalog, movement: &Movement, troops: &Roster, resources: &ResourceLedger) -> CombatResult {
    let formation = movement.attack_formation.clone().unwrap_or_default();
    resolve_combat(
        catalog,
        &Engagement {
            attacker: &movement.units,
            defender: troops,
            defender_resources: resources,
            cross_domain: movement.cross_domain,
            attacker_formation: &formation,
            defender_formation: None,
        },
    )
}

/// Plunder only leaves the target if someone is left to carry it
fn carried_plunder(movement: &Movement, result: &CombatResult) -> ResourceLedger {
    if result.survivors(&movement.units).is_empty() && result.wounded.is_empty() {
        ResourceLedger::default()
    } else {
        result.plunder
    }
}

/// Send the survivors home, or delete the movement if nobody is left
fn conclude<T: UnitOfWork>(
    tx: &mut T,
    mut movement: Movement,
    result: &CombatResult,
    plunder: ResourceLedger,
) -> Result<ArrivalOutcome> {
    let survivors = result.survivors(&movement.units);
    if survivors.is_empty() && result.wounded.is_empty() {
        tx.delete::<Movement>(&movement.doc_id());
        return Ok(ArrivalOutcome::Completed);
    }

    movement.begin_return(survivors, result.wounded.clone(), plunder);
    tx.set(&movement)?;
    Ok(ArrivalOutcome::Returning {
        arrival_time: movement.arrival_time,
    })
}
