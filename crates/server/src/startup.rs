use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use configs::AppConfig;
use service::clock::{Clock, SystemClock};
use service::hold::repo::seaorm::SeaOrmHoldRepository;
use service::hold::repository::HoldRepository;
use service::hold::{sweep, HoldService, HoldSettings};
use service::jobs::JobQueue;
use service::legacy::{LegacyJobDispatcher, QueuedLegacyDispatcher, SeaOrmLegacyDispatcher};
use service::notify::{LoggingNotificationSink, QueuedNotificationDispatcher};

use crate::auth::ServerAuthConfig;
use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Wire the hold service, its dispatchers and the job queue. Notifications
/// and legacy jobs are delivered through the queue with retries.
pub fn build_state(
    cfg: &AppConfig,
    repo: Arc<dyn HoldRepository>,
    legacy: Arc<dyn LegacyJobDispatcher>,
    clock: Arc<dyn Clock>,
) -> ServerState {
    let queue = JobQueue::start(&cfg.queue);
    let notifier = Arc::new(QueuedNotificationDispatcher::new(queue.clone(), Arc::new(LoggingNotificationSink)));
    let legacy = Arc::new(QueuedLegacyDispatcher::new(queue.clone(), legacy));
    let holds = Arc::new(HoldService::new(repo, notifier, legacy, clock, HoldSettings::from(&cfg.holds)));
    ServerState {
        holds,
        queue,
        auth: ServerAuthConfig { jwt_secret: cfg.auth.jwt_secret.clone() },
    }
}

pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_or_env()?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    let repo: Arc<dyn HoldRepository> = Arc::new(SeaOrmHoldRepository::new(db.clone()));
    let legacy: Arc<dyn LegacyJobDispatcher> =
        Arc::new(SeaOrmLegacyDispatcher::new(db, cfg.holds.legacy_channel.clone()));
    let state = build_state(&cfg, repo, legacy, Arc::new(SystemClock));

    if cfg.holds.sweep_interval_secs > 0 {
        sweep::spawn_sweeper(state.holds.clone(), Duration::from_secs(cfg.holds.sweep_interval_secs));
    }

    let app = build_app(state);
    let addr = bind_addr(&cfg)?;
    info!(%addr, workers = cfg.queue.workers, "starting hold server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_bad_host() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not a host".into();
        assert!(matches!(bind_addr(&cfg), Err(StartupError::InvalidConfig(_))));
        cfg.server.host = "127.0.0.1".into();
        assert_eq!(bind_addr(&cfg).unwrap().port(), 8080);
    }
}
