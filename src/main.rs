//! Strategos worker
//!
//! Runs the arrival poller against a small seeded world held in memory.
//! Every demo movement is rushed so the first tick resolves it; return legs
//! come home as simulated time catches up.

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use strategos::combat::Formation;
use strategos::core::error::Result;
use strategos::core::types::OwnerId;
use strategos::core::{EngineConfig, GameTime};
use strategos::movement::{admin, DispatchOrder, Movement, MovementKind, MovementProcessor, MovementTarget};
use strategos::scheduler::Scheduler;
use strategos::store::{Collection, MemoryStore};
use strategos::units::{Roster, UnitCatalog};
use strategos::world::{GodTown, ResourceLedger, Ruin, Settlement, Village};

/// Movement processing worker
#[derive(Parser, Debug)]
#[command(name = "strategos")]
#[command(about = "Poll and resolve arrived movements against a demo world")]
struct Args {
    /// Engine configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Unit balance data (TOML); built-in units if omitted
    #[arg(long)]
    units: Option<PathBuf>,

    /// Seed for the spy dice
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Run this many ticks and exit (default: until Ctrl-C)
    #[arg(long)]
    ticks: Option<u64>,

    /// Game seconds that pass per real second
    #[arg(long, default_value_t = 3600)]
    speedup: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("strategos=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let catalog = match &args.units {
        Some(path) => UnitCatalog::load_from_toml(path)?,
        None => UnitCatalog::with_defaults(),
    };
    tracing::info!(units = catalog.len(), tick_secs = config.tick_interval_seconds, "Strategos starting");

    let store = MemoryStore::new();
    let started = GameTime::now();
    let dispatched = seed_world(&store, &catalog, &config, started)?;
    for id in &dispatched {
        admin::rush(&store, *id, started)?;
    }
    tracing::info!(movements = dispatched.len(), "Demo world seeded");

    let speedup = args.speedup.max(1) as u128;
    let wall = Instant::now();
    let clock = move || GameTime::from_millis(started.as_millis() + (wall.elapsed().as_millis() * speedup) as i64);

    let processor = MovementProcessor::new(Arc::new(catalog), ChaCha8Rng::seed_from_u64(args.seed));
    let mut scheduler = Scheduler::new(store, processor, config).with_clock(clock);
    if let Some(ticks) = args.ticks {
        scheduler = scheduler.with_tick_limit(ticks);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = scheduler.run(shutdown_rx).await;
    let store = scheduler.store();
    tracing::info!(
        ticks = summary.ticks,
        processed = summary.totals.processed(),
        failed = summary.totals.failed,
        pending = store.count(Collection::Movements),
        reports = store.count(Collection::Reports),
        "Strategos finished"
    );

    Ok(())
}

/// Two rival players, a few neutral targets and one movement of every kind
fn seed_world(
    store: &MemoryStore,
    catalog: &UnitCatalog,
    config: &EngineConfig,
    now: GameTime,
) -> Result<Vec<strategos::core::types::MovementId>> {
    let athenian = OwnerId::new();
    let spartan = OwnerId::new();

    let mut athens = Settlement::new("Athens", athenian);
    athens.owner_username = Some("pericles".into());
    athens.resources = ResourceLedger::new(5_000, 5_000, 5_000);
    athens.units = Roster::new().with("hoplite", 400).with("slinger", 200).with("trireme", 20);
    athens.warehouse_capacity = Some(8_000);
    athens.wounded_capacity = Some(100);

    let mut sparta = Settlement::new("Sparta", spartan);
    sparta.owner_username = Some("leonidas".into());
    sparta.resources = ResourceLedger::new(3_000, 2_000, 4_000);
    sparta.units = Roster::new().with("swordsman", 120).with("archer", 80).with("hoplite", 60);
    sparta.cave.silver = 200;
    sparta.buildings.insert("barracks".into(), 10);
    sparta.god = Some("ares".into());

    let village = Village::new(
        1,
        Roster::new().with("swordsman", 15).with("archer", 10),
        ResourceLedger::new(1_000, 1_000, 500),
    );
    let ruin = Ruin::new(Roster::new().with("minotaur", 5).with("hoplite", 40), Some("naval_warfare".into()));
    let town = GodTown::new("Temple of Hydra", Roster::new().with("cyclops", 30).with("medusa", 20), 500);

    store.insert(&village)?;
    store.insert(&ruin)?;
    store.insert(&town)?;

    let athens_id = athens.id;
    let from_athens = |kind, target, distance| DispatchOrder::new(kind, athens_id, athenian, target, distance);
    let orders = vec![
        from_athens(MovementKind::Attack, MovementTarget::Settlement(sparta.id), 40.0)
            .with_units(Roster::new().with("hoplite", 150).with("slinger", 80))
            .with_formation(Formation::new("hoplite", "slinger"))
            .with_target_owner(spartan),
        from_athens(MovementKind::AttackVillage, MovementTarget::Village(village.id), 8.0)
            .with_units(Roster::new().with("hoplite", 100)),
        from_athens(MovementKind::AttackRuin, MovementTarget::Ruin(ruin.id), 25.0)
            .with_units(Roster::new().with("hoplite", 100).with("trireme", 10))
            .across_sea(),
        from_athens(MovementKind::AttackGodTown, MovementTarget::GodTown(town.id), 60.0)
            .with_units(Roster::new().with("slinger", 100)),
        from_athens(MovementKind::Scout, MovementTarget::Settlement(sparta.id), 40.0)
            .with_resources(ResourceLedger::new(0, 0, 1_000))
            .with_target_owner(spartan),
        from_athens(MovementKind::Trade, MovementTarget::Settlement(sparta.id), 40.0)
            .with_resources(ResourceLedger::new(500, 0, 0))
            .with_target_owner(spartan),
        DispatchOrder::new(MovementKind::Reinforce, sparta.id, spartan, MovementTarget::Settlement(athens.id), 40.0)
            .with_units(Roster::new().with("archer", 10))
            .with_target_owner(athenian),
    ];

    // Whatever leaves a settlement is no longer at home
    for order in &orders {
        let origin = if order.origin_settlement_id == athens.id { &mut athens } else { &mut sparta };
        origin.units.subtract(&order.units);
        origin.resources.subtract(&order.resources);
    }
    store.insert(&athens)?;
    store.insert(&sparta)?;

    let mut ids = Vec::with_capacity(orders.len());
    for order in orders {
        let movement = Movement::dispatch(order, catalog, config, now)?;
        store.insert(&movement)?;
        ids.push(movement.id);
    }
    Ok(ids)
}
