//! Prometheus `/metrics` endpoint.
//!
//! Nothing is cached: every scrape queries Slurm and is rendered from a
//! registry that lives only for that request.

use crate::metrics::{self, MetricsSnapshot};
use crate::slurm::SlurmProvider;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

const METRIC_PREFIX: &str = "slurm_gpus";

/// Render the snapshot in the Prometheus text format, leaving out gauges without a value.
pub fn render_snapshot(snapshot: &MetricsSnapshot) -> prometheus::Result<String> {
    let registry = Registry::new();
    for (name, help, value) in snapshot.present_gauges() {
        let opts = Opts::new(format!("{METRIC_PREFIX}_{name}"), help);
        let gauge = Gauge::with_opts(opts)?;
        gauge.set(value);
        registry.register(Box::new(gauge))?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

pub fn create_app<P: SlurmProvider + Send + Sync + 'static>(provider: Arc<P>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler::<P>))
        .route("/health", get(health_handler))
        .with_state(provider)
}

async fn metrics_handler<P: SlurmProvider + Send + Sync + 'static>(
    State(provider): State<Arc<P>>,
) -> Response {
    let snapshot = metrics::collect_metrics(&*provider).await;
    match render_snapshot(&snapshot) {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            text,
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to encode Prometheus metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}

async fn health_handler() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Serve `/metrics` and `/health` until Ctrl-C.
pub async fn serve<P: SlurmProvider + Send + Sync + 'static>(
    provider: P,
    listen_addr: SocketAddr,
) -> io::Result<()> {
    let app = create_app(Arc::new(provider));
    let listener = TcpListener::bind(listen_addr).await?;
    info!("Serving GPU metrics on http://{}/metrics", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
}
