use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ruleset_sync::config::Config;
use ruleset_sync::github::GitHubApp;
use ruleset_sync::pipeline::{Pipeline, RulesetStore};
use ruleset_sync::server::{AppState, build_router};
use ruleset_sync::worker::{SyncWorker, event_queue};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ruleset_sync=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    let private_key = std::fs::read(&config.private_key_path).with_context(|| {
        format!(
            "reading GitHub App private key from {}",
            config.private_key_path.display()
        )
    })?;
    let app = GitHubApp::new(
        config.app_id,
        &private_key,
        config.github_api_url.as_deref(),
    )?;

    let shutdown = CancellationToken::new();
    let (tx, rx) = event_queue();

    let pipeline = Pipeline::new(RulesetStore::new(&config.rulesets_dir), app)
        .with_app_slug(config.app_slug.clone());
    let worker = tokio::spawn(SyncWorker::new(pipeline, rx, shutdown.clone()).run());

    let router = build_router(AppState::with_app_slug(
        config.webhook_secret.into_bytes(),
        config.app_slug,
        tx,
    ));
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!("listening on {}", config.listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("webhook server failed")?;

    shutdown.cancel();
    worker.await.context("sync worker panicked")?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
    shutdown.cancel();
}
