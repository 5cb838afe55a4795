use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use vaultgate::{
    api::{start_api_server, ApiState},
    cli::Cli,
    config::AppConfig,
    observability::{init_logging, log_config_info},
    secrets::{BackendRegistry, OpContext},
    startup::bootstrap,
    APP_NAME, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let mut config = AppConfig::from_env()?;
    config.apply_overrides(cli.overrides());
    init_logging(&config.observability)?;

    info!(app_name = APP_NAME, version = VERSION, "Starting vaultgate");
    config.validate()?;
    log_config_info(&config);

    let registry = BackendRegistry::with_builtin_backends();
    let startup_ctx = OpContext::background().with_timeout(config.server.request_timeout());
    let runtime = match bootstrap(&config.backend, &registry, &startup_ctx).await {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Startup failed, refusing to serve traffic");
            return Err(e).context("failed to start secret backend");
        }
    };

    let state = ApiState::new(runtime.orchestrator.clone(), config.server.request_timeout());
    let served = start_api_server(&config.server, state, shutdown_signal()).await;

    // Cancels anything still in flight, then releases the backend exactly once.
    if let Err(e) = runtime.lifecycle.close().await {
        warn!(error = %e, "Backend close reported an error");
    }

    served.context("API server terminated with error")?;
    info!("vaultgate shutdown completed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
