//! Engine binary for Idlewild.
//!
//! Startup sequence:
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `idlewild-config.yaml`
//! 3. Open the Dragonfly durable store (fatal on failure)
//! 4. Start the state actor and restore the snapshot
//! 5. Register the local service and await its readiness (fatal on failure)
//! 6. Spawn the inbound event router
//! 7. Spawn the tick scheduler
//! 8. Publish the ready signal and run until interrupted

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use idlewild_db::DragonflyStore;
use idlewild_engine::config::EngineConfig;
use idlewild_engine::error::EngineError;
use idlewild_engine::outbox::Outbox;
use idlewild_engine::router::Router;
use idlewild_engine::service::{ChatService, StubService};
use idlewild_engine::tick::TickRunner;
use idlewild_players::{Registry, TableGenerator};
use idlewild_types::InboundEvent;

/// Queue depth for inbound events.
const EVENT_BUFFER: usize = 256;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if the durable store cannot be opened or the
/// transport layer fails to start; every other failure is survived.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Structured logging first, so startup failures are visible.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("idlewild-engine starting");

    // 2. Configuration.
    let config = load_config()?;
    info!(
        world = config.world.name,
        agent = config.world.agent,
        tick_interval_ms = config.progression.tick_interval_ms,
        luck = config.progression.luck,
        "Configuration loaded"
    );

    // 3. Durable store. The only fatal persistence error is failing to
    //    open it.
    let store = DragonflyStore::connect(&config.infrastructure.dragonfly_url)
        .await
        .map_err(EngineError::from)?;

    // 4. State actor; restore happens before the handle is returned.
    let (state, _state_task) = idlewild_state::spawn(store).await;
    let registry = Registry::new(state);
    info!("State actor started");

    // 5. Transport layer. The built-in local service stands in until a
    //    real adapter is wired; its readiness failing aborts startup.
    let local = StubService::new(String::from("local"), config.world.agent.clone());
    local.ready().await.map_err(EngineError::from)?;
    registry
        .register_service(local.name())
        .await
        .map_err(|e| format!("local service registration failed: {e}"))?;

    let mut services: BTreeMap<String, Arc<dyn ChatService>> = BTreeMap::new();
    services.insert(local.name().to_owned(), Arc::new(local));
    info!(services = services.len(), "Transport layer ready");

    // 6. Inbound event router. Adapters clone `events_tx` to feed the
    //    engine; the handle kept here keeps the queue open for the
    //    lifetime of the process.
    let outbox = Outbox::new();
    let (events_tx, events_rx) = mpsc::channel::<InboundEvent>(EVENT_BUFFER);
    let router = Router::new(registry.clone(), outbox.clone());
    let router_task = tokio::spawn(router.run(events_rx));
    let _events_tx = events_tx;

    // 7. Tick scheduler.
    let generator = TableGenerator::new(config.progression.inventory_capacity);
    let runner = TickRunner::new(
        registry,
        outbox.clone(),
        config.progression.clone(),
        config.world.agent.clone(),
        Box::new(generator),
    );
    let tick_task = tokio::spawn(runner.run());
    info!("Tick scheduler started");

    // 8. Ready.
    outbox.ready();

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, shutting down");

    tick_task.abort();
    router_task.abort();

    info!("idlewild-engine shutdown complete");
    Ok(())
}

/// Load the engine configuration from `idlewild-config.yaml`.
///
/// A missing file is not an error; defaults are used.
fn load_config() -> Result<EngineConfig, EngineError> {
    let config_path = Path::new("idlewild-config.yaml");
    if config_path.exists() {
        Ok(EngineConfig::from_file(config_path)?)
    } else {
        info!("Config file not found, using defaults");
        Ok(EngineConfig::default())
    }
}
