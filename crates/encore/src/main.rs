use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use encore::{sessions, telemetry, web};
use encoreconf::{AnalyzerKind, EncoreConfig};
use tokio_util::sync::CancellationToken;

/// The Encore performance grading server
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ./encore.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides bind.http_port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Scoring backend: mock, heuristic or fixed
    #[arg(long)]
    analyzer: Option<AnalyzerKind>,

    /// Seed for the mock analyzer
    #[arg(long)]
    seed: Option<u64>,

    /// OTLP gRPC endpoint for OpenTelemetry (e.g., "127.0.0.1:4317")
    #[arg(long)]
    otlp_endpoint: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut EncoreConfig) {
        if let Some(port) = self.port {
            config.infra.bind.http_port = port;
        }
        if let Some(kind) = self.analyzer {
            config.analysis.analyzer = kind;
        }
        if let Some(seed) = self.seed {
            config.analysis.seed = Some(seed);
        }
        if let Some(endpoint) = &self.otlp_endpoint {
            config.infra.telemetry.otlp_endpoint = endpoint.clone();
        }
    }
}

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);
const SESSION_MAX_IDLE: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = EncoreConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    cli.apply(&mut config);

    if cli.print_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    let telemetry_guard = telemetry::init(
        &config.infra.telemetry.log_level,
        &config.infra.telemetry.otlp_endpoint,
    )
    .context("Failed to initialize telemetry")?;

    for file in &sources.files {
        tracing::info!("Loaded config from {}", file.display());
    }
    if !sources.env_overrides.is_empty() {
        tracing::info!(overrides = ?sources.env_overrides, "Applied environment overrides");
    }

    let upload_dir = &config.infra.paths.upload_dir;
    std::fs::create_dir_all(upload_dir).with_context(|| {
        format!("Failed to create upload directory {}", upload_dir.display())
    })?;
    tracing::info!("Using upload directory: {}", upload_dir.display());

    let state = encore::app_state(&config)?;
    let shutdown_token = CancellationToken::new();

    sessions::spawn_cleanup_task(
        state.sessions.clone(),
        SESSION_CLEANUP_INTERVAL,
        SESSION_MAX_IDLE,
        shutdown_token.clone(),
    );

    let addr = config.infra.bind.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("🎻 Encore listening on http://{}", addr);
    tracing::info!("   Health: GET http://{}/health", addr);

    let shutdown_token_srv = shutdown_token.clone();
    let server = axum::serve(listener, web::router(state)).with_graceful_shutdown(async move {
        shutdown_token_srv.cancelled().await;
        tracing::info!("Server shutdown signal received");
    });

    let server_task = tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!("Server shutdown with error: {:?}", e);
        }
    });

    // Handle both SIGINT (Ctrl+C) and SIGTERM (systemd, containers)
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate() => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
    shutdown_token.cancel();

    if let Err(e) = server_task.await {
        tracing::error!("Server task failed: {:?}", e);
    }

    tracing::info!("Shutdown complete");
    telemetry_guard.shutdown()?;

    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
