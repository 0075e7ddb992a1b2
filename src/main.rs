//! paycore - Payment Ledger Engine
//!
//! Entry point: load config, init logging, connect PostgreSQL, wire the
//! engine to its collaborators (risk service, event bus, auth service) and
//! serve the HTTP gateway.

use std::sync::Arc;

use paycore::config::AppConfig;
use paycore::db::Database;
use paycore::engine::PaymentEngine;
use paycore::events::{EventPublisher, HttpEventBus, NullPublisher};
use paycore::fraud::HttpFraudClient;
use paycore::gateway::{self, AppState, HttpPrincipalResolver};
use paycore::ledger::LedgerStore;
use paycore::logging::init_logging;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env)?;

    let _log_guard = init_logging(&config);
    tracing::info!("Starting paycore (env: {})", env);

    let db = Arc::new(Database::connect(&config.postgres_url).await?);
    db.migrate().await?;

    let fraud = Arc::new(HttpFraudClient::new(&config.fraud)?);

    let events: Arc<dyn EventPublisher> = if config.event_bus.enabled {
        Arc::new(HttpEventBus::new(&config.event_bus)?)
    } else {
        tracing::warn!("Event bus disabled, lifecycle events will be dropped");
        Arc::new(NullPublisher)
    };

    let engine = Arc::new(PaymentEngine::new(
        LedgerStore::new(db.pool().clone()),
        fraud,
        events,
        config.fraud.large_amount_threshold,
    ));

    let auth = Arc::new(HttpPrincipalResolver::new(&config.auth)?);

    let state = Arc::new(AppState::new(engine, auth, db));
    gateway::run_gateway(state, &config.gateway.host, config.gateway.port).await
}
