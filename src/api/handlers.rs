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

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::api::metrics::disk::DiskMetricExporter;
use crate::api::metrics::poll::PollMetricExporter;
use crate::api::metrics::MetricExporter;
use crate::metrics::MetricsRegistry;

pub type SharedRegistry = Arc<MetricsRegistry>;

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn metrics_handler(State(registry): State<SharedRegistry>) -> impl IntoResponse {
    let snapshot = registry.snapshot().await;

    let mut metrics = String::new();
    metrics.push_str(&DiskMetricExporter::new(&snapshot.disks).export_metrics());
    metrics.push_str(&PollMetricExporter::new(&snapshot).export_metrics());

    ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], metrics)
}

/// Liveness only; says nothing about whether the agent is reachable.
pub async fn health_handler() -> &'static str {
    "ok"
}
