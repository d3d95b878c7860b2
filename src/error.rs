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

//! Unified error types for storwatch.
//!
//! Every error in this enum is fatal to the poll cycle that raised it.
//! Row-level shape problems never surface here: they are skipped at the
//! join step and only logged.
//!
//! # Example
//!
//! ```rust,no_run
//! use storwatch::{Error, Result};
//!
//! fn check(ok: bool) -> Result<()> {
//!     if ok {
//!         Ok(())
//!     } else {
//!         Err(Error::Config("warning threshold above critical".to_string()))
//!     }
//! }
//! ```

use thiserror::Error;

use crate::snmp::ber::DecodeError;

/// The main error type for storwatch operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The SNMP session could not be established or was closed prematurely.
    #[error("Connection to {target} failed: {reason}")]
    Connection { target: String, reason: String },

    /// A table walk failed outright (agent error status, socket error).
    #[error("Query for OID {oid} failed: {reason}")]
    Query { oid: String, reason: String },

    /// A single query exceeded the per-query deadline.
    #[error("Query for OID {oid} timed out after {timeout_ms}ms")]
    Timeout { oid: String, timeout_ms: u64 },

    /// The agent's reply could not be decoded as an SNMP message.
    #[error("Malformed SNMP response: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid configuration supplied at startup.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for storwatch operations.
pub type Result<T> = std::result::Result<T, Error>;
