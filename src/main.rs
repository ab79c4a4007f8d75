mod config;
mod shutdown;

use std::path::Path;

use engine_core::Scheduler;
use game::deps::{Deps, Tables};
use game::{bootstrap, GameLoop, GameState};
use net::rate_limiter::ConnectionLimiter;
use net::Registry;
use persistence::GameDb;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::parse_cli_args;
use crate::shutdown::shutdown_channel;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(true).init();
}

fn load_tables(dir: &str) -> Result<Tables, data::DataError> {
    let dir = Path::new(dir);
    let npcs = data::NpcTable::load(&dir.join("npcs.yaml"))?;
    let spawns = data::SpawnTable::load(&dir.join("spawns.yaml"), &npcs)?;
    Ok(Tables {
        spawns,
        items: data::ItemTable::load(&dir.join("items.yaml"))?,
        skills: data::SkillTable::load(&dir.join("skills.yaml"))?,
        maps: data::MapData::load(&dir.join("maps.yaml"))?,
        doors: data::DoorTable::load(&dir.join("door_gfxs.yaml"), &dir.join("doors.yaml"))?,
        teleports: data::TeleportTable::load(&dir.join("teleports.yaml"))?,
        polymorphs: data::PolymorphTable::load(&dir.join("polymorphs.yaml"))?,
        npcs,
    })
}

#[tokio::main]
async fn main() {
    let cfg = parse_cli_args();
    init_logging(&cfg.logging.level);
    tracing::info!(name = %cfg.server.name, id = cfg.server.id, "world server starting");

    // Boot order is fixed: config -> static tables -> database -> WAL
    // recovery -> world -> systems -> network listener. The game loop does
    // not open until recovery succeeds.
    let tables = match load_tables(&cfg.data.dir) {
        Ok(tables) => {
            tracing::info!(
                npcs = tables.npcs.len(),
                spawns = tables.spawns.len(),
                items = tables.items.len(),
                skills = tables.skills.len(),
                maps = tables.maps.len(),
                doors = tables.doors.len(),
                "static tables loaded"
            );
            tables
        }
        Err(err) => {
            tracing::error!(%err, "failed to load static tables");
            std::process::exit(1);
        }
    };

    let mut db = match GameDb::open(&cfg.database.path, cfg.wal_sync_mode()) {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(%err, path = %cfg.database.path, "failed to open database");
            std::process::exit(1);
        }
    };

    match db.wal().recover() {
        Ok(applied) => tracing::info!(applied, "wal recovery complete"),
        Err(err) => {
            tracing::error!(%err, "wal recovery failed, refusing to start");
            std::process::exit(1);
        }
    }

    let deps = Deps {
        tuning: cfg.to_tuning(),
        rates: cfg.to_rates(),
        tables,
        db,
    };
    let mut state = GameState::new(deps, cfg.login_attempts_per_minute());

    let npcs = bootstrap::spawn_npcs(
        &mut state.world,
        &state.deps.tables.npcs,
        &state.deps.tables.spawns,
    );
    let doors = bootstrap::spawn_doors(&mut state.world, &state.deps.tables.doors);
    tracing::info!(npcs, doors, "world seeded");

    let mut registry = Registry::new();
    game::handlers::register_all(&mut registry);
    let opcodes = registry.opcode_set();

    let mut scheduler = Scheduler::new(cfg.tick_period());
    game::systems::register_all(&mut scheduler);

    let (ingress_tx, ingress_rx) =
        tokio::sync::mpsc::channel(cfg.network.in_queue_size.max(1));
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let limiter = ConnectionLimiter::new(cfg.to_limiter_config());
    let listener_shutdown = shutdown_rx.clone();
    let bind_address = cfg.network.bind_address.clone();
    let net_config = cfg.to_net_config();
    tokio::spawn(async move {
        if let Err(err) = net::server::run_listener(
            bind_address,
            net_config,
            ingress_tx,
            opcodes,
            limiter,
            listener_shutdown.into_inner(),
        )
        .await
        {
            tracing::error!(%err, "listener failed");
        }
    });

    let max_packets_per_tick = cfg.network.max_packets_per_tick;
    let tick_shutdown = shutdown_rx;
    let tick_handle = std::thread::spawn(move || {
        GameLoop::new(
            state,
            scheduler,
            registry,
            ingress_rx,
            tick_shutdown.into_inner(),
            max_packets_per_tick,
        )
        .run();
    });

    shutdown::wait_for_signal().await;
    tracing::info!("shutdown signal received, stopping server");
    shutdown_tx.trigger();

    let _ = tick_handle.join();
    tracing::info!("server stopped");
}
