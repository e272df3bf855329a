//! Administrative operations on pending movements

use std::time::Duration;

use crate::core::error::Result;
use crate::core::time::GameTime;
use crate::core::types::MovementId;
use crate::movement::record::Movement;
use crate::store::{Store, UnitOfWork};

/// Make a movement due right away
///
/// Only the arrival time changes; the next poll tick processes it like any
/// other arrival. Returns false if the movement does not exist.
pub fn rush<S: Store>(store: &S, id: MovementId, now: GameTime) -> Result<bool> {
    let mut tx = store.begin()?;
    let Some(mut movement) = tx.get::<Movement>(&id.to_string())? else {
        return Ok(false);
    };

    // Arrival stays strictly after departure
    let earliest = movement.departure_time + Duration::from_millis(1);
    movement.arrival_time = now.max(earliest);
    tx.set(&movement)?;
    tx.commit()?;

    tracing::info!(movement_id = %id, arrival = %movement.arrival_time, "Movement rushed");
    Ok(true)
}
