//! fleetcfgd — the configuration rollout controller.
//!
//! Receives validation and delivery webhooks, dispatches configurations
//! to devices and reports rollout progress.
//!
//! # Usage
//!
//! ```text
//! fleetcfgd --config /etc/fleetcfg/fleetcfg.toml --port 8080
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fleetcfg_api::{ApiState, CoordinatorService};
use fleetcfg_core::ControllerConfig;
use fleetcfg_metrics::MetricsCollector;

#[derive(Parser)]
#[command(name = "fleetcfgd", about = "Configuration rollout controller")]
struct Cli {
    /// Path to a fleetcfg.toml file. Defaults apply when omitted.
    #[arg(long, env = "FLEETCFG_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to bind (overrides the config file).
    #[arg(long, env = "FLEETCFG_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides the config file).
    #[arg(long, env = "FLEETCFG_PORT")]
    port: Option<u16>,

    /// Log output format.
    #[arg(long, env = "FLEETCFG_LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = load_config(&cli)?;
    run(config).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fleetcfgd=debug,fleetcfg=debug"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ControllerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = ControllerConfig::from_file(path)?;
            info!(path = ?path, "configuration loaded");
            config
        }
        None => ControllerConfig::default(),
    };
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;
    Ok(config)
}

async fn run(config: ControllerConfig) -> anyhow::Result<()> {
    info!("config controller starting");

    let metrics = Arc::new(MetricsCollector::default());
    let coordinator = Arc::new(CoordinatorService::from_config(&config, Arc::clone(&metrics)));
    info!(
        acceptance_rate = config.simulation.acceptance_rate,
        delivery_rate = config.simulation.delivery_rate,
        synthesis = ?config.simulation.status_synthesis,
        "coordinator initialized"
    );

    let state = ApiState::new(coordinator, metrics, &config.server.service_name);
    let router = fleetcfg_api::build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "config controller listening");
    for (method, path, summary) in fleetcfg_api::ENDPOINTS {
        info!("  {method:<4} {path:<22} - {summary}");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("config controller stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            // Without a signal handler, run until killed.
            error!(error = %e, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    }
}
