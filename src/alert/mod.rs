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

//! Threshold-based disk alerts.
//!
//! The policy is two-tiered: usage at or above `critical` produces a
//! CRITICAL message, usage at or above `warning` a WARNING message, and
//! anything below produces nothing at all.

pub mod webhook;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::config::AppConfig;
use crate::error::{Error, Result};
use crate::storage::StorageEntity;

pub use webhook::{AlertSink, Delivery, LogOnlySink, WebhookNotifier};

/// Usage percentages at which alerts fire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub warning: f64,
    pub critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning: AppConfig::DEFAULT_WARNING_THRESHOLD,
            critical: AppConfig::DEFAULT_CRITICAL_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("warning", self.warning), ("critical", self.critical)] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{name} threshold must be between 0 and 100, got {value}"
                )));
            }
        }
        if self.warning > self.critical {
            return Err(Error::Config(format!(
                "warning threshold ({}) must not exceed critical threshold ({})",
                self.warning, self.critical
            )));
        }
        Ok(())
    }

    pub fn level_for(&self, usage_percent: f64) -> Option<AlertLevel> {
        if usage_percent >= self.critical {
            Some(AlertLevel::Critical)
        } else if usage_percent >= self.warning {
            Some(AlertLevel::Warning)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub level: AlertLevel,
    pub disk: String,
    pub usage_percent: f64,
    pub message: String,
}

/// Format the alert for one volume, if its usage crosses a threshold.
pub fn check_threshold(entity: &StorageEntity, thresholds: &Thresholds) -> Option<Alert> {
    let level = thresholds.level_for(entity.usage_percent)?;
    let disk = entity.label();
    let message = format!("{level}: {disk} usage {:.2}%", entity.usage_percent);
    Some(Alert {
        level,
        disk,
        usage_percent: entity.usage_percent,
        message,
    })
}

pub fn evaluate(entities: &[StorageEntity], thresholds: &Thresholds) -> Vec<Alert> {
    entities
        .iter()
        .filter_map(|entity| check_threshold(entity, thresholds))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(description: &str, usage_percent: f64) -> StorageEntity {
        StorageEntity {
            description: description.to_string(),
            usage_percent,
            ..StorageEntity::new(1)
        }
    }

    #[test]
    fn test_warning_only_between_thresholds() {
        let thresholds = Thresholds::new(80.0, 90.0);
        let alerts = evaluate(
            &[volume("/", 85.0), volume("/home", 79.99), volume("/boot", 10.0)],
            &thresholds,
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Warning);
        assert_eq!(alerts[0].message, "WARNING: / usage 85.00%");
        assert!(alerts.iter().all(|a| !a.message.starts_with("CRITICAL")));
    }

    #[test]
    fn test_critical_takes_precedence() {
        let thresholds = Thresholds::new(80.0, 90.0);
        let alert = check_threshold(&volume("/var", 95.5), &thresholds).unwrap();
        assert_eq!(alert.level, AlertLevel::Critical);
        assert_eq!(alert.message, "CRITICAL: /var usage 95.50%");
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let thresholds = Thresholds::new(80.0, 90.0);
        assert_eq!(thresholds.level_for(80.0), Some(AlertLevel::Warning));
        assert_eq!(thresholds.level_for(90.0), Some(AlertLevel::Critical));
        assert_eq!(thresholds.level_for(79.999), None);
    }

    #[test]
    fn test_healthy_volume_emits_nothing() {
        assert!(check_threshold(&volume("/", 0.0), &Thresholds::default()).is_none());
    }

    #[test]
    fn test_validate() {
        assert!(Thresholds::default().validate().is_ok());
        assert!(Thresholds::new(90.0, 90.0).validate().is_ok());
        assert!(Thresholds::new(91.0, 90.0).validate().is_err());
        assert!(Thresholds::new(-1.0, 90.0).validate().is_err());
        assert!(Thresholds::new(80.0, f64::NAN).validate().is_err());
    }
}
