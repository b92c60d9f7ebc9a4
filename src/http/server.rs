//! Metrics exposition server.
//!
//! # Responsibilities
//! - Create Axum Router with the exposition handler mounted at a path
//! - Bind server to listener
//! - Stop accepting on shutdown signal
//!
//! # Design Decisions
//! - Every scrape renders the full current snapshot, never a delta
//! - Encoding failures answer 500 rather than an empty body

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::observability::MetricRegistry;

/// HTTP server exposing a [`MetricRegistry`] for scraping.
pub struct MetricsServer {
    router: Router,
    path: String,
}

impl MetricsServer {
    /// Create a server exposing `registry` at `path`.
    pub fn new(registry: MetricRegistry, path: &str) -> Self {
        let router = Self::build_router(registry, path);
        Self {
            router,
            path: path.to_string(),
        }
    }

    fn build_router(registry: MetricRegistry, path: &str) -> Router {
        Router::new()
            .route(path, get(metrics_handler))
            .with_state(registry)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for mounting elsewhere or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.path,
            "Metrics server listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Metrics server stopped");
        Ok(())
    }
}

async fn metrics_handler(State(registry): State<MetricRegistry>) -> Response {
    match registry.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, registry.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
