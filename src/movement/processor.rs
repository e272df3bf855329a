//! Movement processor: the arrival state machine
//!
//! `moving -> {deleted | returning}`, `returning -> deleted`. Each arrival
//! is handled inside one unit of work covering the movement, the origin,
//! the target and every report, so either all of it lands or none of it.

use rand::Rng;
use std::fmt;
use std::sync::Arc;

use crate::core::error::{EngineError, Result};
use crate::core::time::GameTime;
use crate::core::types::{MovementId, OwnerId};
use crate::movement::record::{Movement, MovementKind, MovementStatus, MovementTarget};
use crate::movement::report::{Report, ReportBody};
use crate::movement::{attack, homecoming, scout, transfer};
use crate::store::{ArrivedMovement, Store, StoreError, UnitOfWork};
use crate::units::UnitCatalog;
use crate::world::Settlement;

/// What became of one arrived movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    /// Survivors turned around and are due home at `arrival_time`
    Returning { arrival_time: GameTime },
    /// The movement finished and was deleted
    Completed,
    /// The target no longer existed; the movement was deleted
    TargetVanished,
    /// The origin no longer existed; the movement was silently dropped
    OriginVanished,
    /// The stored record was unreadable and was dropped
    Discarded,
    /// Already handled, or not due after all; nothing was written
    Stale,
}

impl ArrivalOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            ArrivalOutcome::Returning { .. } => "returning",
            ArrivalOutcome::Completed => "completed",
            ArrivalOutcome::TargetVanished => "target_vanished",
            ArrivalOutcome::OriginVanished => "origin_vanished",
            ArrivalOutcome::Discarded => "discarded",
            ArrivalOutcome::Stale => "stale",
        }
    }
}

impl fmt::Display for ArrivalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves arrived movements against live world state
pub struct MovementProcessor<R> {
    catalog: Arc<UnitCatalog>,
    rng: R,
}

impl<R: Rng> MovementProcessor<R> {
    pub fn new(catalog: Arc<UnitCatalog>, rng: R) -> Self {
        Self { catalog, rng }
    }

    /// Process one arrival in its own unit of work
    ///
    /// Safe to call again for the same movement: the record is re-read
    /// and nothing is written unless it still has the status the poller
    /// saw and is due.
    pub fn process<S: Store>(&mut self, store: &S, arrived: &ArrivedMovement, now: GameTime) -> Result<ArrivalOutcome> {
        let mut tx = store.begin()?;
        let id = arrived.id.to_string();

        let movement = match tx.get::<Movement>(&id) {
            Ok(Some(movement)) => movement,
            Ok(None) => return Ok(ArrivalOutcome::Stale),
            Err(StoreError::Decode { source, .. }) => {
                tracing::warn!(movement_id = %arrived.id, error = %source, "Discarding unreadable movement");
                tx.delete::<Movement>(&id);
                tx.commit()?;
                return Ok(ArrivalOutcome::Discarded);
            }
            Err(e) => return Err(e.into()),
        };

        if movement.status != arrived.status || !movement.is_due(now) {
            tracing::debug!(movement_id = %movement.id, "Movement already handled, skipping");
            return Ok(ArrivalOutcome::Stale);
        }

        let target = match movement.target() {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(movement_id = %movement.id, error = %e, "Discarding movement without a usable target");
                tx.delete::<Movement>(&id);
                tx.commit()?;
                return Ok(ArrivalOutcome::Discarded);
            }
        };

        let Some(origin) = tx.get::<Settlement>(&movement.origin_settlement_id.to_string())? else {
            tracing::warn!(
                movement_id = %movement.id,
                origin = %movement.origin_settlement_id,
                "Origin settlement gone, dropping movement"
            );
            tx.delete::<Movement>(&id);
            tx.commit()?;
            return Ok(ArrivalOutcome::OriginVanished);
        };

        let kind = movement.kind;
        let status = movement.status;
        let outcome = match (status, kind) {
            (MovementStatus::Returning, _) => homecoming::complete(&mut tx, movement, origin, now)?,
            (
                MovementStatus::Moving,
                MovementKind::Attack | MovementKind::AttackVillage | MovementKind::AttackRuin | MovementKind::AttackGodTown,
            ) => attack::resolve(&self.catalog, &mut tx, movement, target, now)?,
            (MovementStatus::Moving, MovementKind::Scout) => scout::resolve(&mut tx, &mut self.rng, movement, target, now)?,
            (MovementStatus::Moving, MovementKind::Reinforce) => transfer::reinforce(&mut tx, movement, target, now)?,
            (MovementStatus::Moving, MovementKind::Trade) => transfer::trade(&mut tx, movement, target, now)?,
        };

        tx.commit()?;
        tracing::info!(movement_id = %arrived.id, kind = %kind, ?status, outcome = %outcome, "Movement processed");
        Ok(outcome)
    }
}

/// Stage a report for `recipient`
pub(crate) fn send_report<T: UnitOfWork>(
    tx: &mut T,
    recipient: OwnerId,
    movement_id: MovementId,
    now: GameTime,
    body: ReportBody,
) -> Result<()> {
    tx.set(&Report::new(recipient, movement_id, now, body))?;
    Ok(())
}

/// Drop a movement whose target is gone and tell the sender why
pub(crate) fn target_vanished<T: UnitOfWork>(
    tx: &mut T,
    movement: &Movement,
    target: MovementTarget,
    now: GameTime,
) -> Result<ArrivalOutcome> {
    tracing::info!(movement_id = %movement.id, ?target, "Target no longer exists");
    tx.delete::<Movement>(&movement.id.to_string());
    send_report(
        tx,
        movement.origin_owner_id,
        movement.id,
        now,
        ReportBody::TargetVanished {
            movement_kind: movement.kind,
            target,
        },
    )?;
    Ok(ArrivalOutcome::TargetVanished)
}

/// Id of the settlement a scout or transfer is headed for
pub(crate) fn settlement_target(movement: &Movement, target: MovementTarget) -> Result<String> {
    match target {
        MovementTarget::Settlement(id) => Ok(id.to_string()),
        _ => Err(EngineError::MissingTarget(movement.id)),
    }
}
