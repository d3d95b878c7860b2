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

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snmp::{Oid, SnmpValue};

/// `hrStorageTypes` (HOST-RESOURCES-TYPES, 1.3.6.1.2.1.25.2.1)
const HR_STORAGE_TYPES: [u32; 9] = [1, 3, 6, 1, 2, 1, 25, 2, 1];

/// Decoded `hrStorageType`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    Other,
    Ram,
    VirtualMemory,
    FixedDisk,
    RemovableDisk,
    FloppyDisk,
    CompactDisc,
    RamDisk,
    FlashMemory,
    NetworkDisk,
    /// Anything outside the registered subtree, kept as the dotted OID.
    Unknown(String),
}

impl StorageType {
    pub fn from_oid(oid: &Oid) -> Self {
        let arcs = oid.arcs();
        if arcs.len() != HR_STORAGE_TYPES.len() + 1 || !arcs.starts_with(&HR_STORAGE_TYPES) {
            return Self::Unknown(oid.to_string());
        }
        match arcs[HR_STORAGE_TYPES.len()] {
            1 => Self::Other,
            2 => Self::Ram,
            3 => Self::VirtualMemory,
            4 => Self::FixedDisk,
            5 => Self::RemovableDisk,
            6 => Self::FloppyDisk,
            7 => Self::CompactDisc,
            8 => Self::RamDisk,
            9 => Self::FlashMemory,
            10 => Self::NetworkDisk,
            _ => Self::Unknown(oid.to_string()),
        }
    }

    /// Accepts MIB names (`hrStorageFixedDisk`, case-insensitive, prefix
    /// optional) and dotted OIDs, which is what agents that render the
    /// column as text tend to send.
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if let Ok(oid) = trimmed.parse::<Oid>() {
            return Some(Self::from_oid(&oid));
        }

        let lower = trimmed.to_ascii_lowercase();
        let short = lower.strip_prefix("hrstorage").unwrap_or(&lower);
        let parsed = match short {
            "other" => Self::Other,
            "ram" => Self::Ram,
            "virtualmemory" => Self::VirtualMemory,
            "fixeddisk" => Self::FixedDisk,
            "removabledisk" => Self::RemovableDisk,
            "floppydisk" => Self::FloppyDisk,
            "compactdisc" => Self::CompactDisc,
            "ramdisk" => Self::RamDisk,
            "flashmemory" => Self::FlashMemory,
            "networkdisk" => Self::NetworkDisk,
            _ => return None,
        };
        Some(parsed)
    }

    /// `None` when the value has neither OID nor text shape.
    pub fn from_value(value: &SnmpValue) -> Option<Self> {
        if let Some(oid) = value.as_oid() {
            return Some(Self::from_oid(oid));
        }
        match value {
            SnmpValue::OctetString(bytes) => Self::from_name(&String::from_utf8_lossy(bytes)),
            _ => None,
        }
    }

    pub fn mib_name(&self) -> &str {
        match self {
            Self::Other => "hrStorageOther",
            Self::Ram => "hrStorageRam",
            Self::VirtualMemory => "hrStorageVirtualMemory",
            Self::FixedDisk => "hrStorageFixedDisk",
            Self::RemovableDisk => "hrStorageRemovableDisk",
            Self::FloppyDisk => "hrStorageFloppyDisk",
            Self::CompactDisc => "hrStorageCompactDisc",
            Self::RamDisk => "hrStorageRamDisk",
            Self::FlashMemory => "hrStorageFlashMemory",
            Self::NetworkDisk => "hrStorageNetworkDisk",
            Self::Unknown(oid) => oid,
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mib_name())
    }
}

/// One volume from the remote host's storage table.
///
/// Byte fields are derived; `free_bytes` and `usage_percent` stay zero until
/// the usage calculator has run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StorageEntity {
    /// Agent-assigned row index, only meaningful within one poll.
    pub index: u32,
    pub description: String,
    pub storage_type: Option<StorageType>,
    pub allocation_unit_size: u64,
    pub total_units: u64,
    pub used_units: u64,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub usage_percent: f64,
    /// Set when the agent reported more used than total space.
    pub clamped: bool,
}

impl StorageEntity {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            description: String::new(),
            storage_type: None,
            allocation_unit_size: 0,
            total_units: 0,
            used_units: 0,
            total_bytes: 0,
            used_bytes: 0,
            free_bytes: 0,
            usage_percent: 0.0,
            clamped: false,
        }
    }

    /// Metric label for this volume: its description, or `index-N` when the
    /// agent did not supply one.
    pub fn label(&self) -> String {
        if self.description.trim().is_empty() {
            format!("index-{}", self.index)
        } else {
            self.description.clone()
        }
    }
}
