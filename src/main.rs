//! Geo quiz server: loads the round catalog, starts the countdown driver and serves
//! the WebSocket, SSE and REST surface.

use std::{env, net::SocketAddr};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use geo_quiz_back::{
    config::AppConfig,
    routes,
    services::countdown_service::run_countdown_driver,
    state::{AppState, catalog::RoundCatalog},
};

const DEFAULT_PORT: u16 = 3000;
const PORT_ENV_VARS: [&str; 2] = ["PORT", "SERVER_PORT"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let catalog = RoundCatalog::load_or_empty(&config.catalog_path);
    let (state, ticks) = AppState::new(config, catalog);
    tokio::spawn(run_countdown_driver(state.clone(), ticks));

    let app: Router = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], listen_port()));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "geo quiz server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with an error")?;

    info!("server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// First parsable port among `PORT` and `SERVER_PORT`, else [`DEFAULT_PORT`].
fn listen_port() -> u16 {
    PORT_ENV_VARS
        .iter()
        .find_map(|name| env::var(name).ok()?.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown requested");
}
