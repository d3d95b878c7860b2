// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::handlers::{health_handler, metrics_handler, SharedRegistry};
use crate::common::config::MonitorConfig;
use crate::error::Result;
use crate::metrics::MetricsRegistry;
use crate::poller::Poller;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storwatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Router serving the registry at `metrics_path`, plus `/health`.
pub fn build_router(registry: SharedRegistry, metrics_path: &str) -> Router {
    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(registry)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Start the poll loop in the background and serve metrics until the
/// listener fails.
pub async fn run_serve_mode(config: &MonitorConfig) -> Result<()> {
    let registry = Arc::new(MetricsRegistry::new());
    let poller = Poller::from_config(config, registry.clone())?;
    let interval = config.poll_interval();

    tracing::info!(
        target_host = %config.target.address(),
        snmp_version = %config.target.version,
        interval_secs = interval.as_secs(),
        "starting poll loop"
    );
    tokio::spawn(poller.run(interval));

    let app = build_router(registry, &config.exporter.metrics_path);
    run_tcp_listener(app, config.exporter.listen_port).await
}

async fn run_tcp_listener(app: Router, port: u16) -> Result<()> {
    let listener = TcpListener::bind(&format!("0.0.0.0:{port}"))
        .await
        .inspect_err(|e| tracing::error!("Failed to bind TCP listener on port {port}: {e}"))?;
    match listener.local_addr() {
        Ok(addr) => tracing::info!("Metrics server listening on {addr}"),
        Err(_) => tracing::info!("Metrics server listening on port {port}"),
    }
    axum::serve(listener, app).await?;
    Ok(())
}
