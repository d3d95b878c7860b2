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

//! Joins the per-column walks back into per-volume records.

use std::collections::BTreeMap;

use super::info::{StorageEntity, StorageType};
use super::table::{index_column_oid, parse_row_index, RawStorageTable, StorageColumn, TableRow};
use crate::snmp::SnmpValue;

/// Join a raw table into fixed-disk entities with byte totals set.
///
/// Rows for unknown indices and rows with an unexpected value shape are
/// skipped. `free_bytes` and `usage_percent` are left for
/// [`super::usage::calculate_usage`].
pub fn join_storage_table(table: &RawStorageTable) -> Vec<StorageEntity> {
    let mut entities = seed_entities(&table.indices);

    for column in StorageColumn::ALL {
        let rows = table.column(column);
        match column {
            StorageColumn::Type => apply_type_filter(&mut entities, rows),
            StorageColumn::Description => join_column(&mut entities, column, rows, |e, v| {
                let bytes = v.as_bytes()?;
                e.description = String::from_utf8_lossy(bytes).into_owned();
                Some(())
            }),
            StorageColumn::AllocationUnits => join_column(&mut entities, column, rows, |e, v| {
                e.allocation_unit_size = v.as_u64()?;
                Some(())
            }),
            StorageColumn::Size => join_column(&mut entities, column, rows, |e, v| {
                e.total_units = v.as_u64()?;
                Some(())
            }),
            StorageColumn::Used => join_column(&mut entities, column, rows, |e, v| {
                e.used_units = v.as_u64()?;
                Some(())
            }),
        }
    }

    entities
        .into_values()
        .map(|mut entity| {
            // each from its own raw inputs, never from another derived field
            entity.total_bytes = entity.allocation_unit_size.saturating_mul(entity.total_units);
            entity.used_bytes = entity.allocation_unit_size.saturating_mul(entity.used_units);
            entity
        })
        .collect()
}

fn seed_entities(index_rows: &[TableRow]) -> BTreeMap<u32, StorageEntity> {
    let index_column = index_column_oid();
    let mut entities = BTreeMap::new();

    for row in index_rows {
        // hrStorageIndex carries the index as its value; the key suffix is
        // the fallback for agents that send something else
        let index = row
            .value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| parse_row_index(&index_column, &row.key));
        match index {
            Some(index) => {
                entities.insert(index, StorageEntity::new(index));
            }
            None => tracing::debug!(key = %row.key, "skipping unparseable index row"),
        }
    }

    entities
}

/// Keep only entities whose type row decodes to a fixed disk. Entities with
/// no usable type row are dropped as well.
fn apply_type_filter(entities: &mut BTreeMap<u32, StorageEntity>, rows: &[TableRow]) {
    let column = StorageColumn::Type.oid();

    for row in rows {
        let Some(index) = parse_row_index(&column, &row.key) else {
            tracing::debug!(key = %row.key, "skipping type row without index");
            continue;
        };
        if !entities.contains_key(&index) {
            continue;
        }

        match StorageType::from_value(&row.value) {
            Some(StorageType::FixedDisk) => {
                if let Some(entity) = entities.get_mut(&index) {
                    entity.storage_type = Some(StorageType::FixedDisk);
                }
            }
            Some(other) => {
                tracing::trace!(index, storage_type = %other, "filtering out non-fixed storage");
                entities.remove(&index);
            }
            None => tracing::debug!(
                index,
                value_type = row.value.type_name(),
                "skipping undecodable storage type"
            ),
        }
    }

    entities.retain(|index, entity| {
        let keep = entity.storage_type.is_some();
        if !keep {
            tracing::debug!(index, "dropping storage entry without a usable type");
        }
        keep
    });
}

fn join_column<F>(
    entities: &mut BTreeMap<u32, StorageEntity>,
    column: StorageColumn,
    rows: &[TableRow],
    mut apply: F,
) where
    F: FnMut(&mut StorageEntity, &SnmpValue) -> Option<()>,
{
    let column_oid = column.oid();

    for row in rows {
        let Some(index) = parse_row_index(&column_oid, &row.key) else {
            tracing::debug!(column = column.mib_name(), key = %row.key, "skipping row without index");
            continue;
        };
        // unknown or already filtered out
        let Some(entity) = entities.get_mut(&index) else {
            continue;
        };
        if apply(entity, &row.value).is_none() {
            tracing::debug!(
                column = column.mib_name(),
                index,
                value_type = row.value.type_name(),
                "skipping row with unexpected value type"
            );
        }
    }
}
