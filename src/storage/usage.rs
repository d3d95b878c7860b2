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

//! Free space and usage percentage.

use super::info::StorageEntity;

/// Fill in `free_bytes` and `usage_percent`.
///
/// When the agent reports more used than total space, `used_bytes` is
/// clamped to `total_bytes` (so free is 0 and usage 100%) and the entity is
/// flagged `clamped`. A zero-sized volume reports 0% usage.
pub fn calculate_usage(mut entity: StorageEntity) -> StorageEntity {
    if entity.used_bytes > entity.total_bytes {
        tracing::warn!(
            index = entity.index,
            description = %entity.description,
            used_bytes = entity.used_bytes,
            total_bytes = entity.total_bytes,
            "agent reported used space above total; clamping"
        );
        entity.used_bytes = entity.total_bytes;
        entity.clamped = true;
    }

    entity.free_bytes = entity.total_bytes - entity.used_bytes;
    entity.usage_percent = usage_percent(entity.used_bytes, entity.total_bytes);
    entity
}

/// `used / total * 100`, defined as 0 for an empty volume.
pub fn usage_percent(used_bytes: u64, total_bytes: u64) -> f64 {
    if total_bytes == 0 {
        return 0.0;
    }
    (used_bytes as f64 / total_bytes as f64 * 100.0).clamp(0.0, 100.0)
}
