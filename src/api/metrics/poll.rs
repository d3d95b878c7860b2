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

use super::{MetricBuilder, MetricExporter};
use crate::metrics::RegistrySnapshot;

/// Health of the poll loop itself.
pub struct PollMetricExporter<'a> {
    snapshot: &'a RegistrySnapshot,
}

impl<'a> PollMetricExporter<'a> {
    pub fn new(snapshot: &'a RegistrySnapshot) -> Self {
        Self { snapshot }
    }
}

impl<'a> MetricExporter for PollMetricExporter<'a> {
    fn export_metrics(&self) -> String {
        let mut builder = MetricBuilder::new();

        builder
            .family(
                "storwatch_polls_total",
                "Total number of poll cycles attempted",
                "counter",
            )
            .metric("storwatch_polls_total", &[], self.snapshot.polls_total);

        builder
            .family(
                "storwatch_poll_failures_total",
                "Total number of poll cycles that failed",
                "counter",
            )
            .metric(
                "storwatch_poll_failures_total",
                &[],
                self.snapshot.poll_failures,
            );

        // absent until the first cycle succeeds
        if let Some(last) = self.snapshot.last_success {
            builder
                .family(
                    "storwatch_last_poll_success_timestamp_seconds",
                    "Unix time of the last successful poll cycle",
                    "gauge",
                )
                .metric(
                    "storwatch_last_poll_success_timestamp_seconds",
                    &[],
                    last.timestamp(),
                );
        }

        builder.build()
    }
}
