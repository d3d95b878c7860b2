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

//! Remote storage table reader.
//!
//! This module provides the [`TableReader`] trait for fetching the raw
//! `hrStorageTable` columns from a remote agent and an [`SnmpTableReader`]
//! implementation that walks them over SNMP. The reader returns rows
//! untouched; matching them back to entities happens in [`super::join`].

use async_trait::async_trait;

use crate::common::config::SnmpTarget;
use crate::error::Result;
use crate::snmp::{Oid, SnmpSession, SnmpValue, VarBind};

/// `hrStorageEntry` (HOST-RESOURCES-MIB)
const HR_STORAGE_ENTRY: [u32; 10] = [1, 3, 6, 1, 2, 1, 25, 2, 3, 1];
const HR_STORAGE_INDEX: u32 = 1;

/// The per-volume columns joined into a [`super::StorageEntity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageColumn {
    Type,
    Description,
    AllocationUnits,
    Size,
    Used,
}

impl StorageColumn {
    /// Join order; the type filter must come first.
    pub const ALL: [StorageColumn; 5] = [
        Self::Type,
        Self::Description,
        Self::AllocationUnits,
        Self::Size,
        Self::Used,
    ];

    pub fn oid(self) -> Oid {
        entry_column(match self {
            Self::Type => 2,
            Self::Description => 3,
            Self::AllocationUnits => 4,
            Self::Size => 5,
            Self::Used => 6,
        })
    }

    pub fn mib_name(self) -> &'static str {
        match self {
            Self::Type => "hrStorageType",
            Self::Description => "hrStorageDescr",
            Self::AllocationUnits => "hrStorageAllocationUnits",
            Self::Size => "hrStorageSize",
            Self::Used => "hrStorageUsed",
        }
    }
}

pub fn index_column_oid() -> Oid {
    entry_column(HR_STORAGE_INDEX)
}

fn entry_column(column: u32) -> Oid {
    let mut arcs = HR_STORAGE_ENTRY.to_vec();
    arcs.push(column);
    Oid::from_arcs(arcs)
}

/// One walked row: an opaque key whose trailing arc is the entity index,
/// and the decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub key: String,
    pub value: SnmpValue,
}

impl TableRow {
    pub fn new(key: impl Into<String>, value: SnmpValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl From<VarBind> for TableRow {
    fn from(vb: VarBind) -> Self {
        Self {
            key: vb.oid.to_string(),
            value: vb.value,
        }
    }
}

/// Everything one poll reads from the agent, before any joining.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStorageTable {
    pub indices: Vec<TableRow>,
    pub types: Vec<TableRow>,
    pub descriptions: Vec<TableRow>,
    pub allocation_units: Vec<TableRow>,
    pub sizes: Vec<TableRow>,
    pub used: Vec<TableRow>,
}

impl RawStorageTable {
    pub fn column(&self, column: StorageColumn) -> &[TableRow] {
        match column {
            StorageColumn::Type => &self.types,
            StorageColumn::Description => &self.descriptions,
            StorageColumn::AllocationUnits => &self.allocation_units,
            StorageColumn::Size => &self.sizes,
            StorageColumn::Used => &self.used,
        }
    }

    pub fn column_mut(&mut self, column: StorageColumn) -> &mut Vec<TableRow> {
        match column {
            StorageColumn::Type => &mut self.types,
            StorageColumn::Description => &mut self.descriptions,
            StorageColumn::AllocationUnits => &mut self.allocation_units,
            StorageColumn::Size => &mut self.sizes,
            StorageColumn::Used => &mut self.used,
        }
    }
}

/// Recover the entity index from a row key under `column`.
///
/// The key must be exactly `column.<index>`. Keys without an index suffix,
/// with extra arcs, or outside the column yield `None` so the caller can
/// skip the row.
pub fn parse_row_index(column: &Oid, key: &str) -> Option<u32> {
    let oid: Oid = key.parse().ok()?;
    if oid.len() != column.len() + 1 || !oid.starts_with(column) {
        return None;
    }
    oid.last_arc()
}

/// Trait for reading the storage table from a remote host.
///
/// Any failed query must fail the whole read: a partial table is never
/// returned.
#[async_trait]
pub trait TableReader: Send + Sync {
    async fn read_storage_table(&self) -> Result<RawStorageTable>;

    /// Human-readable identifier of the remote end, for logs.
    fn target(&self) -> String;
}

/// Reads `hrStorageTable` over SNMP, opening a fresh session per read.
pub struct SnmpTableReader {
    target: SnmpTarget,
}

impl SnmpTableReader {
    pub fn new(target: SnmpTarget) -> Self {
        Self { target }
    }
}

#[async_trait]
impl TableReader for SnmpTableReader {
    async fn read_storage_table(&self) -> Result<RawStorageTable> {
        let session = SnmpSession::connect(&self.target).await?;
        read_table(&session).await
    }

    fn target(&self) -> String {
        self.target.address()
    }
}

/// Enumerate indices, then walk each column in join order.
pub async fn read_table(session: &SnmpSession) -> Result<RawStorageTable> {
    tracing::debug!(
        peer = %session.peer(),
        version = %session.version(),
        "reading storage table"
    );
    let mut table = RawStorageTable {
        indices: rows(session.walk(&index_column_oid()).await?),
        ..RawStorageTable::default()
    };

    for column in StorageColumn::ALL {
        let walked = session.bulk_walk(&column.oid()).await?;
        tracing::debug!(
            column = column.mib_name(),
            rows = walked.len(),
            "walked storage column"
        );
        *table.column_mut(column) = rows(walked);
    }

    Ok(table)
}

fn rows(varbinds: Vec<VarBind>) -> Vec<TableRow> {
    varbinds.into_iter().map(TableRow::from).collect()
}
