//! Arrival poller
//!
//! On every tick, finds the movements whose arrival time has passed and
//! feeds them to the processor one at a time. A failing movement is logged
//! and left for the next tick; it never holds up the rest of the batch.

use rand::Rng;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::time::GameTime;
use crate::movement::{ArrivalOutcome, MovementProcessor};
use crate::store::Store;

/// Source of the current instant
pub type Clock = Box<dyn Fn() -> GameTime + Send + Sync>;

/// Counts of what one or more ticks did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Movements found due
    pub arrived: usize,
    pub returning: usize,
    pub completed: usize,
    pub target_vanished: usize,
    pub origin_vanished: usize,
    pub discarded: usize,
    pub stale: usize,
    /// Processing failed; the movement is retried next tick
    pub failed: usize,
    /// Over the batch cap, left for the next tick
    pub deferred: usize,
}

impl TickSummary {
    fn record(&mut self, outcome: ArrivalOutcome) {
        match outcome {
            ArrivalOutcome::Returning { .. } => self.returning += 1,
            ArrivalOutcome::Completed => self.completed += 1,
            ArrivalOutcome::TargetVanished => self.target_vanished += 1,
            ArrivalOutcome::OriginVanished => self.origin_vanished += 1,
            ArrivalOutcome::Discarded => self.discarded += 1,
            ArrivalOutcome::Stale => self.stale += 1,
        }
    }

    /// Movements that reached a new state this tick
    pub fn processed(&self) -> usize {
        self.returning + self.completed + self.target_vanished + self.origin_vanished + self.discarded
    }

    pub fn absorb(&mut self, other: &TickSummary) {
        self.arrived += other.arrived;
        self.returning += other.returning;
        self.completed += other.completed;
        self.target_vanished += other.target_vanished;
        self.origin_vanished += other.origin_vanished;
        self.discarded += other.discarded;
        self.stale += other.stale;
        self.failed += other.failed;
        self.deferred += other.deferred;
    }
}

/// Totals of a `run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub totals: TickSummary,
}

pub struct Scheduler<S, R> {
    store: S,
    processor: MovementProcessor<R>,
    config: EngineConfig,
    clock: Clock,
    max_ticks: Option<u64>,
}

impl<S: Store, R: Rng> Scheduler<S, R> {
    pub fn new(store: S, processor: MovementProcessor<R>, config: EngineConfig) -> Self {
        Self {
            store,
            processor,
            config,
            clock: Box::new(GameTime::now),
            max_ticks: None,
        }
    }

    /// Replace the wall clock, e.g. with simulated time
    pub fn with_clock(mut self, clock: impl Fn() -> GameTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Stop `run` on its own after this many ticks
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process everything due at `now`
    ///
    /// Only fails if the arrived movements cannot be listed at all.
    pub fn tick(&mut self, now: GameTime) -> Result<TickSummary> {
        let arrived = self.store.arrived_movements(now)?;
        let batch = self
            .config
            .max_movements_per_tick
            .map_or(arrived.len(), |cap| cap.min(arrived.len()));

        let mut summary = TickSummary {
            arrived: arrived.len(),
            deferred: arrived.len() - batch,
            ..TickSummary::default()
        };

        for movement in &arrived[..batch] {
            match self.processor.process(&self.store, movement, now) {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        movement_id = %movement.id,
                        error = %e,
                        transient = e.is_transient(),
                        "Failed to process movement, will retry next tick"
                    );
                }
            }
        }

        if summary.arrived > 0 {
            tracing::info!(
                %now,
                arrived = summary.arrived,
                processed = summary.processed(),
                failed = summary.failed,
                deferred = summary.deferred,
                "Tick complete"
            );
        }
        Ok(summary)
    }

    /// Tick on the configured interval until `shutdown` turns true
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> RunSummary {
        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut summary = RunSummary::default();
        tracing::info!(interval_secs = self.config.tick_interval_seconds, "Scheduler started");

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    let now = (self.clock)();
                    match self.tick(now) {
                        Ok(tick) => summary.totals.absorb(&tick),
                        Err(e) => tracing::error!(error = %e, "Failed to list arrived movements"),
                    }
                    summary.ticks += 1;
                    if self.max_ticks.is_some_and(|max| summary.ticks >= max) {
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    // Sender gone: nobody can ever stop us, so stop now
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(ticks = summary.ticks, processed = summary.totals.processed(), "Scheduler stopped");
        summary
    }
}
