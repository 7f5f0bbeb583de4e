use axum::extract::Request;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use log::*;
use sentry_tower::{NewSentryLayer, SentryHttpLayer};
use std::future::IntoFuture;
use std::io;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

pub use service::AppState;

mod controller;
mod cookies;
pub mod error;
mod extractors;
mod middleware;
mod router;
mod sse;

pub use router::define_routes;

/// All routes with CORS applied, each request running in its own Sentry hub with
/// a transaction named after the route.
pub fn app(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config.allowed_origins);
    define_routes(app_state).layer(cors).layer(
        ServiceBuilder::new()
            .layer(NewSentryLayer::<Request>::new_from_top())
            .layer(SentryHttpLayer::with_transaction()),
    )
}

/// Serve the application until SIGINT/SIGTERM.
///
/// On a shutdown signal the server-wide token in `app_state` is cancelled, which
/// makes every open event stream send its `close` event and end. Connections still
/// open after the configured shutdown timeout are abandoned.
pub async fn init_server(app_state: AppState) -> io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{interface}:{}", app_state.config.port);
    let listener = TcpListener::bind(&addr).await?;

    let shutdown = app_state.shutdown.clone();
    let shutdown_timeout = app_state.config.shutdown_timeout();
    let router = app(app_state);

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("Server shutting down");
            shutdown.cancel();
        }
    });

    info!("Server starting... listening for connections on http://{addr}");

    let graceful = {
        let shutdown = shutdown.clone();
        async move { shutdown.cancelled().await }
    };
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(graceful)
        .into_future();
    let deadline = async {
        shutdown.cancelled().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => {
            result?;
            info!("Server shutdown successful");
        }
        _ = deadline => {
            warn!("Shutdown timed out after {shutdown_timeout:?}, dropping open connections");
        }
    }

    Ok(())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::ACCEPT, header::CACHE_CONTROL, header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::app_state;
    use axum::body::Body;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_app_serves_routes_with_cors() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();

        let response = app(app_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_app_ignores_unknown_origins() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://elsewhere.example")
            .body(Body::empty())
            .unwrap();

        let response = app(app_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AppState;
    use cache::MemoryStore;
    use clap::Parser;
    use service::config::Config;
    use sse::LocalPubSub;
    use std::sync::Arc;

    pub(crate) fn app_state() -> AppState {
        let config = Config::try_parse_from(["groceries", "--dev"])
            .unwrap()
            .set_redis_host(None);
        AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(LocalPubSub::default()),
        )
    }
}
