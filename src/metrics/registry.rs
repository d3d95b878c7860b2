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

//! Last-known gauge values served to scrapers.
//!
//! The registry is owned explicitly and shared through an `Arc`: the poll
//! loop writes a finished cycle in one critical section, and the HTTP
//! handler takes snapshots. A failed cycle never touches the per-disk
//! values, so scrapers keep seeing the last successful poll.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::storage::StorageEntity;

/// Current values for one labelled volume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskSample {
    pub usage_percent: f64,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrySnapshot {
    /// Keyed by volume label.
    pub disks: BTreeMap<String, DiskSample>,
    pub last_success: Option<DateTime<Utc>>,
    pub polls_total: u64,
    pub poll_failures: u64,
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    state: RwLock<RegistrySnapshot>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a successful cycle.
    pub async fn publish(&self, entities: &[StorageEntity]) {
        let mut state = self.state.write().await;
        for entity in entities {
            state.disks.insert(
                entity.label(),
                DiskSample {
                    usage_percent: entity.usage_percent,
                    total_bytes: entity.total_bytes,
                    used_bytes: entity.used_bytes,
                    free_bytes: entity.free_bytes,
                },
            );
        }
        state.polls_total += 1;
        state.last_success = Some(Utc::now());
    }

    /// Count a failed cycle without touching any disk values.
    pub async fn record_failure(&self) {
        let mut state = self.state.write().await;
        state.polls_total += 1;
        state.poll_failures += 1;
    }

    pub async fn usage(&self, label: &str) -> Option<f64> {
        let state = self.state.read().await;
        state.disks.get(label).map(|d| d.usage_percent)
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.state.read().await.clone()
    }
}
