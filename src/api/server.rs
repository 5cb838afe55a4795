use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{config::ServerConfig, errors::Error};

use super::routes::{build_router, ApiState};

/// Bind the configured address and serve the secrets API until `shutdown`
/// resolves, then drain in-flight requests for at most the grace period.
pub async fn start_api_server<F>(config: &ServerConfig, state: ApiState, shutdown: F) -> crate::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let addr: SocketAddr = config.bind_address()?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::transport(format!("Failed to bind API server: {}", e)))?;

    info!(address = %addr, "Starting HTTP API server");
    run_http_server(listener, build_router(state), shutdown, config.shutdown_grace()).await?;

    info!("API server shutdown completed");
    Ok(())
}

/// Serve `router` on `listener` with a bounded graceful shutdown.
///
/// Once `shutdown` resolves the listener stops accepting connections. If
/// in-flight requests have not finished after `grace`, the server task is
/// aborted.
pub async fn run_http_server<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
    grace: Duration,
) -> crate::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let stop = CancellationToken::new();
    let graceful = stop.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { graceful.cancelled().await })
            .await
    });

    tokio::pin!(shutdown);
    tokio::select! {
        joined = &mut server => return flatten(joined),
        _ = &mut shutdown => {}
    }

    info!(grace_secs = grace.as_secs(), "Shutdown signal received, draining in-flight requests");
    stop.cancel();

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "Grace period elapsed, aborting in-flight requests");
            server.abort();
            Ok(())
        }
    }
}

fn flatten(
    joined: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> crate::Result<()> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Error::transport(format!("API server error: {}", e))),
        Err(e) => Err(Error::transport(format!("API server task failed: {}", e))),
    }
}
