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

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::common::config::MonitorConfig;
use crate::error::Result;
use crate::snmp::SnmpVersion;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the target continuously and serve Prometheus metrics.
    Serve(ServeArgs),
    /// Run a single poll cycle, print the fixed disks and exit.
    Check(CheckArgs),
}

/// Options shared by every subcommand. Flags override the config file.
#[derive(Args, Clone, Debug, Default)]
pub struct TargetArgs {
    /// JSON configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Hostname or IP address of the SNMP agent.
    #[arg(long)]
    pub host: Option<String>,
    /// UDP port of the SNMP agent.
    #[arg(long)]
    pub port: Option<u16>,
    /// SNMP community string.
    #[arg(long)]
    pub community: Option<String>,
    /// SNMP protocol version (1 or 2c).
    #[arg(long = "snmp-version")]
    pub snmp_version: Option<SnmpVersion>,
    /// Per-query timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Rows requested per GetBulk round trip.
    #[arg(long)]
    pub max_repetitions: Option<u32>,
    /// Warning threshold in percent.
    #[arg(long)]
    pub warning: Option<f64>,
    /// Critical threshold in percent.
    #[arg(long)]
    pub critical: Option<f64>,
    /// Webhook URL for alerts. Alerts are only logged when unset.
    #[arg(long)]
    pub webhook: Option<String>,
    /// Text prepended to every alert message.
    #[arg(long)]
    pub alert_prefix: Option<String>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ServeArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// The port to listen on for the metrics server.
    #[arg(short = 'p', long)]
    pub listen_port: Option<u16>,
    /// HTTP path serving the metrics.
    #[arg(long)]
    pub metrics_path: Option<String>,
    /// The interval in seconds between poll cycles.
    #[arg(short, long)]
    pub interval: Option<u64>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Evaluate thresholds but do not send any alert.
    #[arg(long)]
    pub no_alerts: bool,
}

impl TargetArgs {
    /// Load the config file if given, then overlay every flag that was set.
    pub fn build_config(&self) -> Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::from_file(path)?,
            None => MonitorConfig::default(),
        };

        let target = &mut config.target;
        if let Some(host) = &self.host {
            target.host = host.clone();
        }
        if let Some(port) = self.port {
            target.port = port;
        }
        if let Some(community) = &self.community {
            target.community = community.clone();
        }
        if let Some(version) = self.snmp_version {
            target.version = version;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            target.timeout_ms = timeout_ms;
        }
        if let Some(max_repetitions) = self.max_repetitions {
            target.max_repetitions = max_repetitions;
        }

        let alert = &mut config.alert;
        if let Some(warning) = self.warning {
            alert.thresholds.warning = warning;
        }
        if let Some(critical) = self.critical {
            alert.thresholds.critical = critical;
        }
        if let Some(webhook) = &self.webhook {
            alert.webhook_url = Some(webhook.clone());
        }
        if let Some(prefix) = &self.alert_prefix {
            alert.message_prefix = prefix.clone();
        }

        Ok(config)
    }
}

impl ServeArgs {
    pub fn build_config(&self) -> Result<MonitorConfig> {
        let mut config = self.target.build_config()?;
        if let Some(port) = self.listen_port {
            config.exporter.listen_port = port;
        }
        if let Some(path) = &self.metrics_path {
            config.exporter.metrics_path = path.clone();
        }
        if let Some(interval) = self.interval {
            config.poll_interval_secs = interval;
        }
        config.validate()?;
        Ok(config)
    }
}

impl CheckArgs {
    pub fn build_config(&self) -> Result<MonitorConfig> {
        let mut config = self.target.build_config()?;
        if self.no_alerts {
            config.alert.webhook_url = None;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_serve_flags_overlay_defaults() {
        let cli = parse(&[
            "storwatch",
            "serve",
            "--host",
            "10.0.0.5",
            "--community",
            "secret",
            "--snmp-version",
            "1",
            "-p",
            "9200",
            "--interval",
            "30",
            "--warning",
            "70",
        ]);
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let config = args.build_config().unwrap();

        assert_eq!(config.target.host, "10.0.0.5");
        assert_eq!(config.target.community, "secret");
        assert_eq!(config.target.version, SnmpVersion::V1);
        assert_eq!(config.target.port, 161);
        assert_eq!(config.exporter.listen_port, 9200);
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.alert.thresholds.warning, 70.0);
        assert_eq!(config.alert.thresholds.critical, 90.0);
    }

    #[test]
    fn test_missing_host_is_rejected() {
        let cli = parse(&["storwatch", "check"]);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert!(matches!(args.build_config(), Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_version_fails_parsing() {
        let result = Cli::try_parse_from(["storwatch", "check", "--snmp-version", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"target": {{"host": "filehost", "community": "fromfile"}}, "poll_interval_secs": 120}}"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = parse(&["storwatch", "serve", "--config", &path, "--host", "flaghost"]);
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let config = args.build_config().unwrap();

        assert_eq!(config.target.host, "flaghost");
        assert_eq!(config.target.community, "fromfile");
        assert_eq!(config.poll_interval_secs, 120);
    }

    #[test]
    fn test_no_alerts_drops_webhook() {
        let cli = parse(&[
            "storwatch",
            "check",
            "--host",
            "h",
            "--webhook",
            "https://hooks.example.com/x",
            "--no-alerts",
        ]);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert!(args.build_config().unwrap().alert.webhook_url.is_none());
    }
}
