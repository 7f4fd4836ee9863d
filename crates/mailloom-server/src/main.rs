//! Mailloom - email marketing backend entry point

use anyhow::Result;
use mailloom_api::AppState;
use mailloom_common::config::Config;
use mailloom_core::dispatch::{LinkRewriter, MailDispatcher, SmtpMailer};
use mailloom_core::{CampaignScheduler, ConditionEvaluator, TrackingStore, WorkflowExecutor};
use mailloom_storage::repository::{
    ActionRepository, CampaignRepository, ContactRepository, ServerRepository,
    TrackingLogRepository, WorkflowRepository,
};
use mailloom_storage::DatabasePool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting Mailloom server...");

    // Load configuration
    let config = Config::load()?;

    // Initialize database
    let db_pool = DatabasePool::new(&config.database).await?;

    // Run migrations
    db_pool.migrate().await?;

    let pool = db_pool.pool().clone();
    let tracking: Arc<dyn TrackingStore> = Arc::new(TrackingLogRepository::new(pool.clone()));

    // Dispatch pipeline shared by the scheduler and the executor
    let rewriter = LinkRewriter::new(&config.tracking.base_url);
    let dispatcher = Arc::new(MailDispatcher::new(
        Arc::clone(&tracking),
        Arc::new(SmtpMailer::new()),
        rewriter,
    ));
    let evaluator = Arc::new(ConditionEvaluator::new(
        Arc::clone(&tracking),
        Duration::from_secs(config.workflow.condition_poll_secs),
    ));

    let executor = Arc::new(WorkflowExecutor::new(
        Arc::new(WorkflowRepository::new(pool.clone())),
        Arc::new(ActionRepository::new(pool.clone())),
        Arc::new(ContactRepository::new(pool.clone())),
        Arc::new(ServerRepository::new(pool.clone())),
        Arc::clone(&dispatcher),
        evaluator,
    ));

    // Start campaign scheduler
    let shutdown = CancellationToken::new();
    let scheduler_handle = {
        let scheduler = CampaignScheduler::new(
            Arc::new(CampaignRepository::new(pool.clone())),
            Arc::new(ContactRepository::new(pool.clone())),
            Arc::new(ServerRepository::new(pool)),
            dispatcher,
            Duration::from_secs(config.scheduler.tick_interval_secs),
        );
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            scheduler.run(shutdown).await;
        })
    };

    // Start API server
    let api_handle = {
        let state = Arc::new(AppState::new(db_pool, tracking, executor));
        let api_port = config.api.port;
        tokio::spawn(async move {
            let app = mailloom_api::create_router(state);
            let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", api_port))
                .await
            {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!("Failed to bind API server: {}", e);
                    return;
                }
            };
            info!("Starting API server on port {}", api_port);
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("API server error: {}", e);
            }
        })
    };

    info!("Mailloom server started successfully");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Cleanup
    shutdown.cancel();
    let _ = scheduler_handle.await;
    api_handle.abort();

    info!("Mailloom server shutdown complete");

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mailloom=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .init();
}
