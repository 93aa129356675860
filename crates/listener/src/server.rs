//! Router assembly, listeners, and graceful shutdown.
//!
//! Requests to the relay surface flow through middleware in order:
//! 1. Request id assignment (reuses an inbound `X-Request-Id`)
//! 2. Request span and redacting access log
//! 3. Timeout enforcement
//! 4. Handler execution
//!
//! The liveness surface runs on its own listener with the same request-id and
//! access-log layers but no relay state, so it keeps answering while relay
//! requests are slow.

use std::{future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use bridge::{RedactionPolicy, Relay};
use tokio::{net::TcpListener, sync::watch};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use crate::{
    handlers,
    middleware::{assign_request_id, observe_request},
};

/// Route served by the relay surface.
pub const RELAY_ROUTE: &str = "/webhookb2/{id1}/IncomingWebhook/{id2}/{id3}";

/// Route served by the liveness surface.
pub const HEALTH_ROUTE: &str = "/healthz";

/// Listener configuration for [`serve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeSettings {
    /// Address of the relay surface.
    pub listen_addr: SocketAddr,
    /// Address of the liveness surface.
    pub health_listen_addr: SocketAddr,
    /// Upper bound for handling one relay request, downstream call included.
    pub request_timeout: Duration,
}

/// Creates the relay router. It also answers `/healthz`.
///
/// Requests that exceed `request_timeout` are answered with
/// `408 Request Timeout` by the timeout layer.
pub fn create_relay_router(relay: Arc<Relay>, request_timeout: Duration) -> Router {
    let policy = relay.settings().redaction;

    Router::new()
        .route(RELAY_ROUTE, post(handlers::relay_webhook))
        .route(HEALTH_ROUTE, get(handlers::healthz))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn_with_state(policy, observe_request))
        .layer(middleware::from_fn(assign_request_id))
        .with_state(relay)
}

/// Creates the liveness router.
pub fn create_health_router(policy: RedactionPolicy) -> Router {
    Router::new()
        .route(HEALTH_ROUTE, get(handlers::healthz))
        .layer(middleware::from_fn_with_state(policy, observe_request))
        .layer(middleware::from_fn(assign_request_id))
}

/// Serves the relay and liveness surfaces until a shutdown signal arrives.
///
/// Both listeners are bound before either starts serving, so a port conflict
/// fails startup instead of leaving one surface running alone. On CTRL+C or
/// SIGTERM both stop accepting connections and drain in-flight requests.
///
/// # Errors
///
/// Returns `std::io::Error` if either address cannot be bound or a listener
/// fails while serving.
pub async fn serve(settings: ServeSettings, relay: Arc<Relay>) -> Result<(), std::io::Error> {
    let policy = relay.settings().redaction;
    let relay_app = create_relay_router(relay, settings.request_timeout);
    let health_app = create_health_router(policy);

    let relay_listener = TcpListener::bind(settings.listen_addr).await?;
    let health_listener = TcpListener::bind(settings.health_listen_addr).await?;

    info!(addr = %relay_listener.local_addr()?, "Relay surface listening");
    info!(addr = %health_listener.local_addr()?, "Liveness surface listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    let relay_server = axum::serve(relay_listener, relay_app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()));
    let health_server = axum::serve(health_listener, health_app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx));

    tokio::try_join!(relay_server.into_future(), health_server.into_future())?;

    info!("HTTP servers stopped gracefully");
    Ok(())
}

/// Binds `addr` and serves `app` until a shutdown signal arrives.
pub(crate) async fn serve_single(addr: SocketAddr, app: Router) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<()>) {
    // A dropped sender also means shutdown.
    let _ = rx.changed().await;
}

/// Waits for CTRL+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight requests to complete");
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
