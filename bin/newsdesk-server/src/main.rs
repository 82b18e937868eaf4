//! newsdesk-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Open the status store and fail records orphaned by a previous run.
//! 4. Build provider clients and the task catalogue.
//! 5. Start the worker pool (and the reaper, when configured).
//! 6. Build the Axum router and serve with graceful shutdown.
//! 7. Close the work queue and let in-flight work drain.

mod config;
mod error;
mod logging;
mod middleware;
mod routes;
mod schemas;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use newsdesk_core::providers::{HttpNewsSource, OpenAiChatModel, ProviderConfig};
use newsdesk_core::{
    AnyStore, Executor, MemoryStore, PoolConfig, Reaper, SqliteStore, StatusStore, TaskCatalog,
    Worker, WorkerPool,
};
use tracing::{info, warn};

use crate::config::{Config, StoreKind};
use crate::state::AppState;

const INTERRUPTED_DETAIL: &str = "interrupted: server restarted before completion";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Arc::new(Config::from_env());

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let _log_guard = logging::init(&cfg)?;
    info!(version = env!("CARGO_PKG_VERSION"), "newsdesk-server starting");

    // ── 3. Status store ────────────────────────────────────────────────────────
    let store = Arc::new(match cfg.store {
        StoreKind::Sqlite => {
            let store = SqliteStore::connect(&cfg.database_url).await?;
            info!(database_url = %cfg.database_url, "sqlite store ready");
            AnyStore::Sqlite(store)
        }
        StoreKind::Memory => {
            warn!("using in-memory store; process records are lost on restart");
            AnyStore::Memory(MemoryStore::new())
        }
    });
    // Nothing survives a restart mid-run; close those records out now.
    let orphaned = store.fail_unfinished(INTERRUPTED_DETAIL).await?;
    if orphaned > 0 {
        warn!(count = orphaned, "failed processes left unfinished by a previous run");
    }

    // ── 4. Providers and tasks ─────────────────────────────────────────────────
    let provider_cfg = ProviderConfig { timeout: cfg.http_timeout };
    let news = HttpNewsSource::new(&cfg.news_api_url, cfg.news_api_key.clone(), &provider_cfg)?;
    let model = OpenAiChatModel::new(
        &cfg.llm_base_url,
        cfg.llm_api_key.clone(),
        &cfg.llm_model,
        &provider_cfg,
    )?;
    let catalog = TaskCatalog::new(Arc::new(news), Arc::new(model));
    let executor = Executor::new(Arc::new(catalog), cfg.execution_timeout);
    info!(
        news_api = %cfg.news_api_url,
        llm = %cfg.llm_base_url,
        model = %cfg.llm_model,
        "task catalogue ready"
    );

    // ── 5. Worker pool and reaper ──────────────────────────────────────────────
    let worker = Arc::new(Worker::new(Arc::clone(&store), executor.clone()));
    let (dispatcher, pool) = WorkerPool::start(
        worker,
        PoolConfig {
            queue_capacity: cfg.queue_capacity,
            concurrency: cfg.worker_concurrency,
            hard_timeout: cfg.hard_timeout,
        },
    );
    let reaper = cfg.reap_after.map(|stale_after| {
        Arc::new(Reaper::new(Arc::clone(&store), stale_after)).spawn(cfg.reap_interval)
    });

    // ── 6. HTTP server with graceful shutdown ──────────────────────────────────
    let state = Arc::new(AppState::new(Arc::clone(&cfg), store, dispatcher, executor));
    let app = routes::build(state);
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // ── 7. Drain ───────────────────────────────────────────────────────────────
    // The router (and with it the only dispatcher) is gone, so the queue is
    // closed and the pool finishes once in-flight work completes.
    if let Some(reaper) = reaper {
        reaper.abort();
    }
    info!("waiting for in-flight processes");
    if let Err(e) = pool.await {
        warn!(error = %e, "worker pool did not shut down cleanly");
    }

    info!("newsdesk-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
