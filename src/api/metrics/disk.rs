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
use crate::metrics::DiskSample;
use std::collections::BTreeMap;

/// Per-volume gauges, labelled by `disk`.
///
/// Each family is emitted once with every known volume under it, so the
/// output stays valid when several disks are present.
pub struct DiskMetricExporter<'a> {
    disks: &'a BTreeMap<String, DiskSample>,
}

impl<'a> DiskMetricExporter<'a> {
    pub fn new(disks: &'a BTreeMap<String, DiskSample>) -> Self {
        Self { disks }
    }

    fn export_family(
        &self,
        builder: &mut MetricBuilder,
        name: &str,
        description: &str,
        value: impl Fn(&DiskSample) -> String,
    ) {
        builder.family(name, description, "gauge");
        for (disk, sample) in self.disks {
            builder.metric(name, &[("disk", disk.as_str())], value(sample));
        }
    }
}

impl<'a> MetricExporter for DiskMetricExporter<'a> {
    fn export_metrics(&self) -> String {
        let mut builder = MetricBuilder::new();
        if self.disks.is_empty() {
            return builder.build();
        }

        self.export_family(
            &mut builder,
            "disk_usage_percent",
            "Disk usage percentage",
            |s| s.usage_percent.to_string(),
        );
        self.export_family(
            &mut builder,
            "disk_total_bytes",
            "Total disk space in bytes",
            |s| s.total_bytes.to_string(),
        );
        self.export_family(
            &mut builder,
            "disk_used_bytes",
            "Used disk space in bytes",
            |s| s.used_bytes.to_string(),
        );
        self.export_family(
            &mut builder,
            "disk_free_bytes",
            "Free disk space in bytes",
            |s| s.free_bytes.to_string(),
        );

        builder.build()
    }
}
