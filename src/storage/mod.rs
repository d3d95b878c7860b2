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

//! Remote storage monitoring.
//!
//! This module turns the remote host's storage table into finalized
//! per-volume records: the [`table`] reader fetches raw column walks,
//! [`join`] merges them by index and keeps fixed disks only, and [`usage`]
//! derives free space and percentage.

pub mod info;
pub mod join;
pub mod table;
pub mod usage;

pub use info::{StorageEntity, StorageType};
pub use join::join_storage_table;
pub use table::{
    parse_row_index, RawStorageTable, SnmpTableReader, StorageColumn, TableReader, TableRow,
};
pub use usage::{calculate_usage, usage_percent};

/// Join a raw table and finalize every entity.
pub fn build_entities(table: &RawStorageTable) -> Vec<StorageEntity> {
    join_storage_table(table)
        .into_iter()
        .map(calculate_usage)
        .collect()
}
