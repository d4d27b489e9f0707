use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use dotenvy::dotenv;
use service::{bank::BankService, runtime, storage};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Resolves when the process receives Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Serve `app` until `signal` resolves, letting in-flight requests finish.
pub async fn serve<F>(listener: TcpListener, app: Router, signal: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app).with_graceful_shutdown(signal).await?;
    Ok(())
}

/// Public entry: load configuration, open storage, serve HTTP, tear storage down on exit.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();

    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    runtime::ensure_env(&cfg.storage)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let storage = storage::build(&cfg.storage).await?;
    if cfg.storage.auto_setup {
        let report = storage.setup().await?;
        info!(backend = report.backend.as_str(), seeded_users = report.seeded_users, "storage setup done");
    }

    let state = AppState::new(BankService::new(Arc::clone(&storage), cfg.admin.clone()))
        .with_body_limit(cfg.server.max_body_bytes);
    let app = routes::build_router(state);

    let addr = bind_addr(&cfg)?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, backend = storage.backend().as_str(), "bank api listening");
    let served = serve(listener, app, shutdown_signal()).await;

    if let Err(e) = storage.shutdown().await {
        error!(error = %e, "storage teardown failed");
    }
    info!("storage closed");
    served
}
