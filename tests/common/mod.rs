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

//! In-process SNMP agent for integration tests.
//!
//! Serves GetNext and GetBulk from a sorted OID map over a real UDP socket,
//! using the crate's own codec.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use storwatch::common::config::SnmpTarget;
use storwatch::snmp::{Message, Oid, Pdu, PduType, SnmpValue, SnmpVersion, VarBind};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

pub const HR_STORAGE_ENTRY: &str = "1.3.6.1.2.1.25.2.3.1";
pub const FIXED_DISK: &str = "1.3.6.1.2.1.25.2.1.4";
pub const RAM: &str = "1.3.6.1.2.1.25.2.1.2";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Answer,
    /// Never reply.
    Silent,
    /// Reply to every request with this error status.
    ErrorStatus(i32),
    /// Answer normally except for requests inside this hrStorageEntry
    /// column, which get genErr.
    FailColumn(u32),
}

pub struct FakeAgent {
    pub addr: SocketAddr,
    pub requests: Arc<AtomicUsize>,
    behavior: Arc<Mutex<Behavior>>,
    handle: JoinHandle<()>,
}

impl FakeAgent {
    pub async fn start(mib: BTreeMap<Oid, SnmpValue>, behavior: Behavior) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();
        let behavior = Arc::new(Mutex::new(behavior));
        let current = behavior.clone();

        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; 65535];
            loop {
                let Ok((len, from)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let Ok(request) = Message::decode(&buf[..len]) else {
                    continue;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let behavior = *current.lock().unwrap();
                let pdu = match behavior {
                    Behavior::Silent => continue,
                    Behavior::ErrorStatus(status) => error_reply(&request, status),
                    Behavior::FailColumn(column) if in_column(&request, column) => {
                        error_reply(&request, 5)
                    }
                    Behavior::Answer | Behavior::FailColumn(_) => answer(&mib, &request),
                };

                let reply = Message::new(request.version, request.community.clone(), pdu);
                let _ = socket.send_to(&reply.encode(), from).await;
            }
        });

        Self {
            addr,
            requests,
            behavior,
            handle,
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn target(&self, version: SnmpVersion) -> SnmpTarget {
        SnmpTarget::new(self.addr.ip().to_string())
            .port(self.addr.port())
            .version(version)
            .timeout_ms(300)
            .max_repetitions(4)
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for FakeAgent {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn next_after<'a>(
    mib: &'a BTreeMap<Oid, SnmpValue>,
    oid: &Oid,
) -> Option<(&'a Oid, &'a SnmpValue)> {
    mib.range::<Oid, _>((std::ops::Bound::Excluded(oid), std::ops::Bound::Unbounded))
        .next()
}

fn error_reply(request: &Message, status: i32) -> Pdu {
    Pdu {
        error_status: status,
        error_index: 1,
        ..Pdu::response(request.pdu.request_id, request.pdu.varbinds.clone())
    }
}

fn in_column(request: &Message, column: u32) -> bool {
    let prefix = oid(&format!("{HR_STORAGE_ENTRY}.{column}"));
    request
        .pdu
        .varbinds
        .first()
        .is_some_and(|vb| vb.oid.starts_with(&prefix))
}

fn answer(mib: &BTreeMap<Oid, SnmpValue>, request: &Message) -> Pdu {
    let id = request.pdu.request_id;
    let Some(start) = request.pdu.varbinds.first().map(|vb| vb.oid.clone()) else {
        return Pdu::response(id, Vec::new());
    };

    match request.pdu.pdu_type {
        PduType::GetBulkRequest => {
            // max-repetitions travels in the error-index field
            let max = request.pdu.error_index.max(1) as usize;
            let mut varbinds = Vec::new();
            let mut cursor = start;
            for _ in 0..max {
                match next_after(mib, &cursor) {
                    Some((oid, value)) => {
                        varbinds.push(VarBind::new(oid.clone(), value.clone()));
                        cursor = oid.clone();
                    }
                    None => {
                        varbinds.push(VarBind::new(cursor.clone(), SnmpValue::EndOfMibView));
                        break;
                    }
                }
            }
            Pdu::response(id, varbinds)
        }
        _ => match next_after(mib, &start) {
            Some((oid, value)) => Pdu::response(id, vec![VarBind::new(oid.clone(), value.clone())]),
            None if request.version == SnmpVersion::V1 => Pdu {
                error_status: 2,
                error_index: 1,
                ..Pdu::response(id, request.pdu.varbinds.clone())
            },
            None => Pdu::response(id, vec![VarBind::new(start, SnmpValue::EndOfMibView)]),
        },
    }
}

pub fn oid(text: &str) -> Oid {
    text.parse().unwrap()
}

/// One hrStorageTable row.
pub struct Row<'a> {
    pub index: u32,
    pub storage_type: &'a str,
    pub description: &'a str,
    pub allocation_units: i64,
    pub size: i64,
    pub used: i64,
}

/// Build the MIB for a set of rows, plus an unrelated object after the
/// table so walks have to notice they left the subtree.
pub fn storage_mib(rows: &[Row<'_>]) -> BTreeMap<Oid, SnmpValue> {
    let mut mib = BTreeMap::new();
    let column = |n: u32, index: u32| oid(&format!("{HR_STORAGE_ENTRY}.{n}.{index}"));

    for row in rows {
        mib.insert(column(1, row.index), SnmpValue::Integer(i64::from(row.index)));
        mib.insert(column(2, row.index), SnmpValue::ObjectId(oid(row.storage_type)));
        mib.insert(
            column(3, row.index),
            SnmpValue::OctetString(row.description.as_bytes().to_vec()),
        );
        mib.insert(column(4, row.index), SnmpValue::Integer(row.allocation_units));
        mib.insert(column(5, row.index), SnmpValue::Integer(row.size));
        mib.insert(column(6, row.index), SnmpValue::Integer(row.used));
    }

    // hrStorageAllocationFailures lives outside the walked columns
    mib.insert(oid("1.3.6.1.2.1.25.2.3.1.7.1"), SnmpValue::Counter32(0));
    mib.insert(oid("1.3.6.1.2.1.25.3.1.0"), SnmpValue::Integer(1));
    mib
}

pub fn typical_host() -> BTreeMap<Oid, SnmpValue> {
    storage_mib(&[
        Row {
            index: 1,
            storage_type: RAM,
            description: "Physical memory",
            allocation_units: 1024,
            size: 16_000_000,
            used: 15_000_000,
        },
        Row {
            index: 31,
            storage_type: FIXED_DISK,
            description: "/",
            allocation_units: 4096,
            size: 1000,
            used: 400,
        },
        Row {
            index: 36,
            storage_type: FIXED_DISK,
            description: "/data",
            allocation_units: 4096,
            size: 2000,
            used: 1900,
        },
    ])
}
