//! Spy arrivals

use rand::Rng;

use crate::core::error::Result;
use crate::core::time::GameTime;
use crate::movement::processor::{send_report, settlement_target, target_vanished, ArrivalOutcome};
use crate::movement::record::{Movement, MovementTarget};
use crate::movement::report::ReportBody;
use crate::scouting::{resolve_scouting, ScoutingOutcome};
use crate::store::{Document, UnitOfWork};
use crate::world::Settlement;

/// A spy never comes back: the movement ends here whatever happens
pub(crate) fn resolve<T: UnitOfWork, R: Rng + ?Sized>(
    tx: &mut T,
    rng: &mut R,
    movement: Movement,
    target: MovementTarget,
    now: GameTime,
) -> Result<ArrivalOutcome> {
    let Some(mut city) = tx.get::<Settlement>(&settlement_target(&movement, target)?)? else {
        return target_vanished(tx, &movement, target, now);
    };

    let silver = movement.resources.silver;
    tx.delete::<Movement>(&movement.doc_id());

    match resolve_scouting(&city, silver, rng) {
        ScoutingOutcome::Success { chance, snapshot } => {
            tracing::debug!(movement_id = %movement.id, chance, "Spy mission succeeded");
            send_report(
                tx,
                movement.origin_owner_id,
                movement.id,
                now,
                ReportBody::ScoutSuccess { chance, snapshot },
            )?;
        }
        ScoutingOutcome::Failure { chance, compensation } => {
            tracing::debug!(movement_id = %movement.id, chance, compensation, "Spy caught");
            city.cave.silver = city.cave.silver.saturating_add(compensation);
            tx.set(&city)?;

            send_report(
                tx,
                movement.origin_owner_id,
                movement.id,
                now,
                ReportBody::ScoutFailure {
                    chance,
                    silver_spent: silver,
                },
            )?;
            if let Some(defender) = city.owner_id {
                send_report(tx, defender, movement.id, now, ReportBody::SpyCaught { compensation })?;
            }
        }
    }

    Ok(ArrivalOutcome::Completed)
}
