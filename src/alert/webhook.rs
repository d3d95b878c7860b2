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

//! Alert delivery.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::common::config::AppConfig;
use crate::error::{Error, Result};

/// What happened to one alert message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by a remote receiver.
    Delivered,
    /// Only written to the log; nobody was notified.
    Logged,
    Failed,
}

/// Destination for formatted alert messages.
///
/// Delivery failures are the sink's business: they are logged and reported
/// through the return value, never raised.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, message: &str) -> Delivery;
}

/// Posts alerts to a chat-robot style webhook as
/// `{"msgtype":"text","text":{"content":"<prefix><message>"}}`.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    prefix: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, prefix: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(AppConfig::WEBHOOK_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("failed to build webhook client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            prefix: prefix.into(),
        })
    }

    pub fn payload(&self, message: &str) -> Value {
        json!({
            "msgtype": "text",
            "text": {
                "content": format!("{}{message}", self.prefix),
            },
        })
    }
}

#[async_trait]
impl AlertSink for WebhookNotifier {
    async fn send(&self, message: &str) -> Delivery {
        let payload = self.payload(message);
        match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(alert = message, "alert delivered");
                Delivery::Delivered
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), alert = message, "webhook rejected alert");
                Delivery::Failed
            }
            Err(e) => {
                tracing::warn!(error = %e, alert = message, "failed to send alert");
                Delivery::Failed
            }
        }
    }
}

/// Used when no webhook is configured: alerts only reach the log.
pub struct LogOnlySink;

#[async_trait]
impl AlertSink for LogOnlySink {
    async fn send(&self, message: &str) -> Delivery {
        tracing::warn!(alert = message, "disk alert (no webhook configured)");
        Delivery::Logged
    }
}
