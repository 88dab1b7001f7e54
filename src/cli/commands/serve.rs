use std::future::Future;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::initialize_app_state_with_url;
use crate::router::create_router;

/// Connects to `database_url` and serves the users API on `bind_address`
/// until Ctrl-C is received.
pub async fn serve(database_url: &str, bind_address: &str) -> Result<()> {
    let state = initialize_app_state_with_url(database_url)
        .await
        .with_context(|| format!("failed to connect to database {}", database_url))?;
    let listener = bind(bind_address).await?;

    run_until(listener, create_router(state), shutdown_signal()).await
}

async fn bind(bind_address: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    let local = listener.local_addr()?;
    info!("Users API listening on http://{}", local);
    info!("Swagger UI at http://{}/swagger-ui", local);
    Ok(listener)
}

/// Serves `app` until `shutdown` resolves, then lets in-flight requests finish.
async fn run_until<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server terminated abnormally")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => debug!("Received Ctrl-C, draining connections"),
        // Without a signal handler the server can only be killed.
        Err(e) => {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
