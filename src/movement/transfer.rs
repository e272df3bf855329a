//! Friendly arrivals: reinforcements and trade caravans
//!
//! Neither makes a return trip. A missing target swallows the movement
//! without a report.

use crate::core::error::Result;
use crate::core::time::GameTime;
use crate::movement::processor::{send_report, settlement_target, ArrivalOutcome};
use crate::movement::record::{Movement, MovementTarget};
use crate::movement::report::ReportBody;
use crate::store::{Document, UnitOfWork};
use crate::world::Settlement;

fn live_target<T: UnitOfWork>(tx: &mut T, movement: &Movement, target: MovementTarget) -> Result<Option<Settlement>> {
    let city = tx.get::<Settlement>(&settlement_target(movement, target)?)?;
    tx.delete::<Movement>(&movement.doc_id());
    if city.is_none() {
        tracing::info!(movement_id = %movement.id, kind = %movement.kind, "Target gone, nothing delivered");
    }
    Ok(city)
}

pub(crate) fn reinforce<T: UnitOfWork>(
    tx: &mut T,
    movement: Movement,
    target: MovementTarget,
    now: GameTime,
) -> Result<ArrivalOutcome> {
    let Some(mut city) = live_target(tx, &movement, target)? else {
        return Ok(ArrivalOutcome::TargetVanished);
    };

    city.units.merge(&movement.units);
    tx.set(&city)?;

    let units = movement.units;
    if let Some(host) = city.owner_id {
        send_report(tx, host, movement.id, now, ReportBody::ReinforcementReceived { units: units.clone() })?;
    }
    send_report(tx, movement.origin_owner_id, movement.id, now, ReportBody::ReinforcementArrived { units })?;
    Ok(ArrivalOutcome::Completed)
}

pub(crate) fn trade<T: UnitOfWork>(
    tx: &mut T,
    movement: Movement,
    target: MovementTarget,
    now: GameTime,
) -> Result<ArrivalOutcome> {
    let Some(mut city) = live_target(tx, &movement, target)? else {
        return Ok(ArrivalOutcome::TargetVanished);
    };

    let resources = movement.resources;
    let dropped = city.store_resources(&resources);
    if !dropped.is_empty() {
        tracing::warn!(movement_id = %movement.id, ?dropped, "Warehouse full, part of the trade was lost");
    }
    tx.set(&city)?;

    if let Some(buyer) = city.owner_id {
        send_report(tx, buyer, movement.id, now, ReportBody::TradeReceived { resources, dropped })?;
    }
    send_report(tx, movement.origin_owner_id, movement.id, now, ReportBody::TradeDelivered { resources, dropped })?;
    Ok(ArrivalOutcome::Completed)
}
