//! Return arrivals: survivors, wounded and cargo come home

use crate::core::error::Result;
use crate::core::time::GameTime;
use crate::movement::processor::{send_report, ArrivalOutcome};
use crate::movement::record::Movement;
use crate::movement::report::ReportBody;
use crate::store::{Document, UnitOfWork};
use crate::world::Settlement;

pub(crate) fn complete<T: UnitOfWork>(
    tx: &mut T,
    movement: Movement,
    mut origin: Settlement,
    now: GameTime,
) -> Result<ArrivalOutcome> {
    origin.units.merge(&movement.units);

    // Capacity clamps: whatever does not fit is dropped, not kept in transit
    let dropped_resources = origin.store_resources(&movement.resources);
    if !dropped_resources.is_empty() {
        tracing::warn!(movement_id = %movement.id, dropped = ?dropped_resources, "Warehouse full, returning cargo dropped");
    }
    let dropped_wounded = origin.admit_wounded(&movement.wounded);
    if !dropped_wounded.is_empty() {
        tracing::warn!(
            movement_id = %movement.id,
            dropped = dropped_wounded.total(),
            "Hospital full, returning wounded turned away"
        );
    }

    tx.set(&origin)?;
    tx.delete::<Movement>(&movement.doc_id());

    send_report(
        tx,
        movement.origin_owner_id,
        movement.id,
        now,
        ReportBody::TroopsReturned {
            units: movement.units,
            wounded: movement.wounded,
            resources: movement.resources,
            dropped_resources,
            dropped_wounded,
        },
    )?;
    Ok(ArrivalOutcome::Completed)
}
