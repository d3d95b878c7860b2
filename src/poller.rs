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

//! One poll cycle, and the loop that repeats it.
//!
//! A cycle is strictly linear: read the table, join and filter, compute
//! usage, then report. Any read failure aborts the cycle before the
//! registry is touched.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::alert::{self, AlertSink, Delivery, LogOnlySink, Thresholds, WebhookNotifier};
use crate::common::config::MonitorConfig;
use crate::error::Result;
use crate::metrics::MetricsRegistry;
use crate::storage::{build_entities, SnmpTableReader, StorageEntity, TableReader};

/// What a successful cycle produced.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub entities: Vec<StorageEntity>,
    /// Accepted by the webhook.
    pub alerts_sent: usize,
    /// Written to the log only, because no webhook is configured.
    pub alerts_logged: usize,
    pub alerts_failed: usize,
}

pub struct Poller {
    reader: Box<dyn TableReader>,
    registry: Arc<MetricsRegistry>,
    alert_sink: Box<dyn AlertSink>,
    thresholds: Thresholds,
}

impl Poller {
    pub fn new(
        reader: Box<dyn TableReader>,
        registry: Arc<MetricsRegistry>,
        alert_sink: Box<dyn AlertSink>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            reader,
            registry,
            alert_sink,
            thresholds,
        }
    }

    /// Wire up the SNMP reader and the configured alert sink.
    pub fn from_config(config: &MonitorConfig, registry: Arc<MetricsRegistry>) -> Result<Self> {
        let reader = Box::new(SnmpTableReader::new(config.target.clone()));
        let alert_sink: Box<dyn AlertSink> = match &config.alert.webhook_url {
            Some(url) => Box::new(WebhookNotifier::new(
                url.clone(),
                config.alert.message_prefix.clone(),
            )?),
            None => Box::new(LogOnlySink),
        };
        Ok(Self::new(
            reader,
            registry,
            alert_sink,
            config.alert.thresholds,
        ))
    }

    /// Read and finalize the current volumes without reporting anything.
    pub async fn poll(&self) -> Result<Vec<StorageEntity>> {
        let table = self.reader.read_storage_table().await?;
        let entities = build_entities(&table);
        tracing::debug!(
            target_host = %self.reader.target(),
            indices = table.indices.len(),
            fixed_disks = entities.len(),
            "storage table joined"
        );
        Ok(entities)
    }

    /// Poll, publish gauges and dispatch alerts.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let entities = match self.poll().await {
            Ok(entities) => entities,
            Err(e) => {
                tracing::error!(target_host = %self.reader.target(), error = %e, "poll cycle failed");
                self.registry.record_failure().await;
                return Err(e);
            }
        };

        self.registry.publish(&entities).await;

        let mut report = CycleReport::default();
        for alert in alert::evaluate(&entities, &self.thresholds) {
            match self.alert_sink.send(&alert.message).await {
                Delivery::Delivered => report.alerts_sent += 1,
                Delivery::Logged => report.alerts_logged += 1,
                Delivery::Failed => report.alerts_failed += 1,
            }
        }

        tracing::info!(
            target_host = %self.reader.target(),
            volumes = entities.len(),
            alerts_sent = report.alerts_sent,
            alerts_logged = report.alerts_logged,
            alerts_failed = report.alerts_failed,
            "poll cycle complete"
        );
        report.entities = entities;
        Ok(report)
    }

    /// Run cycles forever. Ticks missed while a slow cycle holds the session
    /// are skipped, so cycles never overlap.
    pub async fn run(self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            // errors are already logged and counted
            let _ = self.run_cycle().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::snmp::{SnmpValue, VarBind};
    use crate::storage::table::index_column_oid;
    use crate::storage::{RawStorageTable, StorageColumn, TableRow};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct FakeReader {
        table: RawStorageTable,
        fail: AtomicBool,
    }

    #[async_trait]
    impl TableReader for FakeReader {
        async fn read_storage_table(&self) -> Result<RawStorageTable> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Query {
                    oid: StorageColumn::Used.oid().to_string(),
                    reason: "agent returned genErr (index 1)".to_string(),
                });
            }
            Ok(self.table.clone())
        }

        fn target(&self) -> String {
            "fake:161".to_string()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: Arc<Mutex<Vec<String>>>,
        accept: bool,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn send(&self, message: &str) -> Delivery {
            self.messages.lock().unwrap().push(message.to_string());
            if self.accept {
                Delivery::Delivered
            } else {
                Delivery::Failed
            }
        }
    }

    fn row(column: StorageColumn, index: u32, value: SnmpValue) -> TableRow {
        TableRow::from(VarBind::new(column.oid().child(index), value))
    }

    fn fixed_disk() -> SnmpValue {
        SnmpValue::ObjectId("1.3.6.1.2.1.25.2.1.4".parse().unwrap())
    }

    /// index 1: "/" at 40%, index 2: RAM, index 3: "/data" at 85%
    fn table() -> RawStorageTable {
        let mut table = RawStorageTable::default();
        for index in [1, 2, 3] {
            table.indices.push(TableRow::from(VarBind::new(
                index_column_oid().child(index),
                SnmpValue::Integer(i64::from(index)),
            )));
            table
                .allocation_units
                .push(row(StorageColumn::AllocationUnits, index, SnmpValue::Integer(4096)));
            table
                .sizes
                .push(row(StorageColumn::Size, index, SnmpValue::Integer(1000)));
        }
        table.types = vec![
            row(StorageColumn::Type, 1, fixed_disk()),
            row(
                StorageColumn::Type,
                2,
                SnmpValue::ObjectId("1.3.6.1.2.1.25.2.1.2".parse().unwrap()),
            ),
            row(StorageColumn::Type, 3, fixed_disk()),
        ];
        table.descriptions = vec![
            row(StorageColumn::Description, 1, SnmpValue::OctetString(b"/".to_vec())),
            row(
                StorageColumn::Description,
                2,
                SnmpValue::OctetString(b"Physical memory".to_vec()),
            ),
            row(StorageColumn::Description, 3, SnmpValue::OctetString(b"/data".to_vec())),
        ];
        table.used = vec![
            row(StorageColumn::Used, 1, SnmpValue::Integer(400)),
            row(StorageColumn::Used, 2, SnmpValue::Integer(999)),
            row(StorageColumn::Used, 3, SnmpValue::Integer(850)),
        ];
        table
    }

    fn poller(accept: bool) -> (Poller, Arc<MetricsRegistry>, Arc<Mutex<Vec<String>>>) {
        let registry = Arc::new(MetricsRegistry::new());
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink {
            messages: messages.clone(),
            accept,
        };
        let reader = FakeReader {
            table: table(),
            fail: AtomicBool::new(false),
        };
        let poller = Poller::new(
            Box::new(reader),
            registry.clone(),
            Box::new(sink),
            Thresholds::new(80.0, 90.0),
        );
        (poller, registry, messages)
    }

    #[tokio::test]
    async fn test_cycle_publishes_and_alerts() {
        let (poller, registry, messages) = poller(true);
        let report = poller.run_cycle().await.unwrap();

        assert_eq!(report.entities.len(), 2);
        assert_eq!(report.alerts_sent, 1);
        assert_eq!(report.alerts_logged, 0);
        assert_eq!(report.alerts_failed, 0);

        assert_eq!(registry.usage("/").await, Some(40.0));
        assert_eq!(registry.usage("/data").await, Some(85.0));
        assert_eq!(registry.usage("Physical memory").await, None);

        let messages = messages.lock().unwrap();
        assert_eq!(messages.as_slice(), ["WARNING: /data usage 85.00%"]);
    }

    #[tokio::test]
    async fn test_sink_failure_is_not_fatal() {
        let (poller, registry, _) = poller(false);
        let report = poller.run_cycle().await.unwrap();
        assert_eq!(report.alerts_failed, 1);
        assert_eq!(registry.usage("/data").await, Some(85.0));
    }

    #[tokio::test]
    async fn test_logged_alerts_are_not_counted_as_sent() {
        let registry = Arc::new(MetricsRegistry::new());
        let poller = Poller::new(
            Box::new(FakeReader {
                table: table(),
                fail: AtomicBool::new(false),
            }),
            registry,
            Box::new(LogOnlySink),
            Thresholds::new(80.0, 90.0),
        );

        let report = poller.run_cycle().await.unwrap();
        assert_eq!(report.alerts_sent, 0);
        assert_eq!(report.alerts_logged, 1);
        assert_eq!(report.alerts_failed, 0);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_last_values() {
        let registry = Arc::new(MetricsRegistry::new());
        let messages = Arc::new(Mutex::new(Vec::new()));
        let reader = Arc::new(FakeReader {
            table: table(),
            fail: AtomicBool::new(false),
        });

        struct SharedReader(Arc<FakeReader>);

        #[async_trait]
        impl TableReader for SharedReader {
            async fn read_storage_table(&self) -> Result<RawStorageTable> {
                self.0.read_storage_table().await
            }

            fn target(&self) -> String {
                self.0.target()
            }
        }

        let poller = Poller::new(
            Box::new(SharedReader(reader.clone())),
            registry.clone(),
            Box::new(RecordingSink {
                messages: messages.clone(),
                accept: true,
            }),
            Thresholds::new(80.0, 90.0),
        );

        poller.run_cycle().await.unwrap();
        let before = registry.snapshot().await;

        reader.fail.store(true, Ordering::SeqCst);
        let err = poller.run_cycle().await.unwrap_err();
        assert!(matches!(err, Error::Query { .. }));

        let after = registry.snapshot().await;
        assert_eq!(after.disks, before.disks);
        assert_eq!(after.poll_failures, 1);
        assert_eq!(registry.usage("/").await, Some(40.0));
        // no alerts from the failed cycle
        assert_eq!(messages.lock().unwrap().len(), 1);
    }
}
