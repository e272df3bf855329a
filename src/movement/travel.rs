//! Travel time between two settlements

use std::time::Duration;

use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Result};
use crate::movement::record::MovementKind;
use crate::units::{Roster, UnitCatalog};

/// How long a movement of `kind` takes to cover `distance`
///
/// Armies march at the pace of their slowest unit, scaled by the world
/// speed factor. Scouts and traders follow a flat per-tile schedule clamped
/// to the configured bounds.
pub fn travel_duration(
    kind: MovementKind,
    distance: f64,
    units: &Roster,
    catalog: &UnitCatalog,
    config: &EngineConfig,
) -> Result<Duration> {
    if kind.uses_flat_schedule() {
        let seconds = (distance * config.scout_trade_tile_seconds as f64).clamp(
            config.scout_trade_min_seconds as f64,
            config.scout_trade_max_seconds as f64,
        );
        return Ok(Duration::from_secs_f64(seconds));
    }

    let Some(speed) = catalog.slowest_speed(units) else {
        return Err(match units.kinds().next() {
            Some(kind) => EngineError::UnknownUnit(kind.clone()),
            None => EngineError::InvalidDispatch("no units to move".into()),
        });
    };
    if speed <= 0.0 {
        return Err(EngineError::InvalidDispatch(format!("slowest unit has speed {}", speed)));
    }

    let hours = distance / (speed * config.world_speed_factor);
    Duration::try_from_secs_f64(hours * 3600.0)
        .map_err(|e| EngineError::InvalidDispatch(format!("travel time out of range: {}", e)))
}
