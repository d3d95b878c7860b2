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

//! UDP session against a single SNMP agent.
//!
//! A session is owned by exactly one poll cycle. Every request waits at
//! most `timeout` for a matching response; anything exceeding it fails the
//! query and, through it, the cycle.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use tokio::net::{lookup_host, UdpSocket};
use tokio::time::Instant;

use super::oid::Oid;
use super::pdu::{error_status_name, Message, Pdu, PduType, SnmpVersion, VarBind};
use crate::common::config::{AppConfig, SnmpTarget};
use crate::error::{Error, Result};

pub struct SnmpSession {
    socket: UdpSocket,
    peer: SocketAddr,
    community: Vec<u8>,
    version: SnmpVersion,
    timeout: Duration,
    max_repetitions: i32,
    next_request_id: AtomicI32,
}

impl SnmpSession {
    /// Resolve the target and bind a connected UDP socket to it.
    pub async fn connect(target: &SnmpTarget) -> Result<Self> {
        let address = target.address();
        let peer = lookup_host(&address)
            .await
            .map_err(|e| Error::Connection {
                target: address.clone(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| Error::Connection {
                target: address.clone(),
                reason: "host did not resolve to any address".to_string(),
            })?;

        let bind_addr: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| Error::Connection {
                target: address.clone(),
                reason: format!("failed to bind local socket: {e}"),
            })?;
        socket.connect(peer).await.map_err(|e| Error::Connection {
            target: address.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(%peer, version = %target.version, "SNMP session opened");

        Ok(Self {
            socket,
            peer,
            community: target.community.as_bytes().to_vec(),
            version: target.version,
            timeout: target.timeout(),
            max_repetitions: i32::try_from(target.max_repetitions).unwrap_or(i32::MAX),
            next_request_id: AtomicI32::new(seed_request_id()),
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn version(&self) -> SnmpVersion {
        self.version
    }

    /// Walk `root` with GetNext requests, one varbind per round trip.
    pub async fn walk(&self, root: &Oid) -> Result<Vec<VarBind>> {
        let mut rows = Vec::new();
        let mut cursor = root.clone();

        loop {
            let pdu = Pdu::get_next(self.next_request_id(), std::slice::from_ref(&cursor));
            let response = self.request(pdu, root).await?;
            if response.error_status != 0 {
                // v1 agents signal the end of the MIB view this way
                if self.version == SnmpVersion::V1 && response.error_status == 2 {
                    break;
                }
                return Err(status_error(root, &response));
            }

            let Some(vb) = response.varbinds.into_iter().next() else {
                break;
            };
            if !self.advance(root, &mut cursor, &vb)? {
                break;
            }
            rows.push(vb);
        }

        tracing::debug!(oid = %root, rows = rows.len(), "walk finished");
        Ok(rows)
    }

    /// Walk `root` with GetBulk requests. v1 has no GetBulk, so this falls
    /// back to [`walk`](Self::walk).
    pub async fn bulk_walk(&self, root: &Oid) -> Result<Vec<VarBind>> {
        if self.version == SnmpVersion::V1 {
            return self.walk(root).await;
        }

        let mut rows = Vec::new();
        let mut cursor = root.clone();

        'outer: loop {
            let pdu = Pdu::get_bulk(
                self.next_request_id(),
                0,
                self.max_repetitions,
                std::slice::from_ref(&cursor),
            );
            let response = self.request(pdu, root).await?;
            if response.error_status != 0 {
                return Err(status_error(root, &response));
            }
            if response.varbinds.is_empty() {
                break;
            }

            for vb in response.varbinds {
                if !self.advance(root, &mut cursor, &vb)? {
                    break 'outer;
                }
                rows.push(vb);
            }
        }

        tracing::debug!(oid = %root, rows = rows.len(), "bulk walk finished");
        Ok(rows)
    }

    /// Returns `Ok(false)` once the walk has left `root`'s subtree.
    fn advance(&self, root: &Oid, cursor: &mut Oid, vb: &VarBind) -> Result<bool> {
        if vb.value.is_exception() || !vb.oid.starts_with(root) {
            return Ok(false);
        }
        if vb.oid <= *cursor {
            return Err(Error::Query {
                oid: root.to_string(),
                reason: format!("agent returned non-increasing OID {} after {cursor}", vb.oid),
            });
        }
        *cursor = vb.oid.clone();
        Ok(true)
    }

    async fn request(&self, pdu: Pdu, context: &Oid) -> Result<Pdu> {
        let request_id = pdu.request_id;
        let bytes = Message::new(self.version, self.community.clone(), pdu).encode();
        self.socket
            .send(&bytes)
            .await
            .map_err(|e| self.io_error(e, context))?;

        let deadline = Instant::now() + self.timeout;
        let mut buf = vec![0u8; AppConfig::RECV_BUFFER_SIZE];
        loop {
            let len = match tokio::time::timeout_at(deadline, self.socket.recv(&mut buf)).await {
                Err(_) => {
                    return Err(Error::Timeout {
                        oid: context.to_string(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    })
                }
                Ok(Err(e)) => return Err(self.io_error(e, context)),
                Ok(Ok(len)) => len,
            };

            let message = Message::decode(&buf[..len])?;
            if message.pdu.pdu_type != PduType::Response || message.pdu.request_id != request_id {
                tracing::debug!(
                    expected = request_id,
                    received = message.pdu.request_id,
                    "discarding unrelated SNMP datagram"
                );
                continue;
            }
            return Ok(message.pdu);
        }
    }

    fn next_request_id(&self) -> i32 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed) & 0x7fff_ffff
    }

    fn io_error(&self, err: io::Error, context: &Oid) -> Error {
        match err.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::NotConnected => Error::Connection {
                target: self.peer.to_string(),
                reason: err.to_string(),
            },
            _ => Error::Query {
                oid: context.to_string(),
                reason: err.to_string(),
            },
        }
    }
}

fn status_error(root: &Oid, response: &Pdu) -> Error {
    Error::Query {
        oid: root.to_string(),
        reason: format!(
            "agent returned {} (index {})",
            error_status_name(response.error_status),
            response.error_index
        ),
    }
}

fn seed_request_id() -> i32 {
    (chrono::Utc::now().timestamp_subsec_micros() & 0x00ff_ffff) as i32 + 1
}
