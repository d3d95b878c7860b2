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

//! Runtime configuration.
//!
//! Everything the poller needs is carried in an explicit [`MonitorConfig`]
//! built at startup, either from CLI flags or from a JSON file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::alert::Thresholds;
use crate::error::{Error, Result};
use crate::snmp::SnmpVersion;

/// Application configuration constants
pub struct AppConfig;

impl AppConfig {
    // Remote session
    pub const DEFAULT_SNMP_PORT: u16 = 161;
    pub const DEFAULT_COMMUNITY: &'static str = "public";
    pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5000;
    pub const DEFAULT_MAX_REPETITIONS: u32 = 10;
    pub const MAX_REPETITIONS_LIMIT: u32 = 1000;
    pub const RECV_BUFFER_SIZE: usize = 65535;

    // Exporter
    pub const DEFAULT_LISTEN_PORT: u16 = 9100;
    pub const DEFAULT_METRICS_PATH: &'static str = "/metrics";

    // Poll loop
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

    // Alerting
    pub const DEFAULT_WARNING_THRESHOLD: f64 = 80.0;
    pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 90.0;
    pub const DEFAULT_ALERT_PREFIX: &'static str = "Disk alert: ";
    pub const WEBHOOK_TIMEOUT_SECS: u64 = 10;
}

/// Where and how to reach the SNMP agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpTarget {
    pub host: String,
    pub port: u16,
    pub community: String,
    pub version: SnmpVersion,
    /// Per-query deadline in milliseconds.
    pub timeout_ms: u64,
    /// GetBulk max-repetitions (v2c only).
    pub max_repetitions: u32,
}

impl Default for SnmpTarget {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: AppConfig::DEFAULT_SNMP_PORT,
            community: AppConfig::DEFAULT_COMMUNITY.to_string(),
            version: SnmpVersion::V2c,
            timeout_ms: AppConfig::DEFAULT_QUERY_TIMEOUT_MS,
            max_repetitions: AppConfig::DEFAULT_MAX_REPETITIONS,
        }
    }
}

impl SnmpTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn community(mut self, community: impl Into<String>) -> Self {
        self.community = community.into();
        self
    }

    pub fn version(mut self, version: SnmpVersion) -> Self {
        self.version = version;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn max_repetitions(mut self, max_repetitions: u32) -> Self {
        self.max_repetitions = max_repetitions;
        self
    }

    /// `host:port`, bracketing bare IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub listen_port: u16,
    pub metrics_path: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_port: AppConfig::DEFAULT_LISTEN_PORT,
            metrics_path: AppConfig::DEFAULT_METRICS_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// No webhook means alerts are only logged.
    pub webhook_url: Option<String>,
    pub message_prefix: String,
    pub thresholds: Thresholds,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            message_prefix: AppConfig::DEFAULT_ALERT_PREFIX.to_string(),
            thresholds: Thresholds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub target: SnmpTarget,
    pub exporter: ExporterConfig,
    pub alert: AlertConfig,
    pub poll_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target: SnmpTarget::default(),
            exporter: ExporterConfig::default(),
            alert: AlertConfig::default(),
            poll_interval_secs: AppConfig::DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl MonitorConfig {
    pub fn new(target: SnmpTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        let target = &self.target;
        if target.host.trim().is_empty() {
            return Err(Error::Config("target host must not be empty".to_string()));
        }
        if target.port == 0 {
            return Err(Error::Config("target port must not be 0".to_string()));
        }
        if target.timeout_ms == 0 {
            return Err(Error::Config("query timeout must be positive".to_string()));
        }
        if target.max_repetitions == 0 || target.max_repetitions > AppConfig::MAX_REPETITIONS_LIMIT
        {
            return Err(Error::Config(format!(
                "max repetitions must be between 1 and {}",
                AppConfig::MAX_REPETITIONS_LIMIT
            )));
        }

        if !self.exporter.metrics_path.starts_with('/') {
            return Err(Error::Config(format!(
                "metrics path '{}' must start with '/'",
                self.exporter.metrics_path
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Config("poll interval must be at least 1 second".to_string()));
        }

        self.alert.thresholds.validate()?;

        if let Some(webhook) = &self.alert.webhook_url {
            let parsed = url::Url::parse(webhook)
                .map_err(|e| Error::Config(format!("invalid webhook URL '{webhook}': {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "webhook URL must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        }

        Ok(())
    }
}
