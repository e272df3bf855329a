//! Canonical game time
//!
//! Every instant the engine stores or compares is a `GameTime`: whole
//! milliseconds since the Unix epoch. Arrival checks, return legs and
//! admin rushes all operate on this one type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A point in game time (Unix epoch milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameTime(pub i64);

impl GameTime {
    pub const EPOCH: GameTime = GameTime(0);

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Current wall-clock instant
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().min(i64::MAX as u128) as i64)
            .unwrap_or(0);
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later
    pub fn duration_since(&self, earlier: GameTime) -> Duration {
        let delta = self.0.saturating_sub(earlier.0);
        Duration::from_millis(delta.max(0) as u64)
    }

    pub fn saturating_add(&self, duration: Duration) -> Self {
        let millis = duration.as_millis().min(i64::MAX as u128) as i64;
        Self(self.0.saturating_add(millis))
    }
}

impl Add<Duration> for GameTime {
    type Output = GameTime;

    fn add(self, rhs: Duration) -> GameTime {
        self.saturating_add(rhs)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
