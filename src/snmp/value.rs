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

//! Typed varbind values.
//!
//! Decoding happens once, at the protocol boundary. Downstream code asks
//! for the shape it needs through the `as_*` accessors and treats `None`
//! as a row-level shape error.

use super::ber::{
    decode_integer, decode_oid, decode_unsigned, integer_content, oid_content, tag,
    unsigned_content, write_tlv, DecodeError,
};
use super::oid::Oid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    ObjectId(Oid),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Opaque(Vec<u8>),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// A tag this decoder does not understand; kept so one odd varbind
    /// does not invalidate the whole response.
    Unsupported(u8),
}

impl SnmpValue {
    pub fn decode(value_tag: u8, content: &[u8]) -> Result<Self, DecodeError> {
        let value = match value_tag {
            tag::INTEGER => Self::Integer(decode_integer(content)?),
            tag::OCTET_STRING => Self::OctetString(content.to_vec()),
            tag::NULL => Self::Null,
            tag::OBJECT_IDENTIFIER => Self::ObjectId(decode_oid(content)?),
            tag::IP_ADDRESS => {
                let octets: [u8; 4] = content.try_into().map_err(|_| DecodeError::Truncated)?;
                Self::IpAddress(octets)
            }
            tag::COUNTER32 => Self::Counter32(decode_u32(content)?),
            tag::GAUGE32 => Self::Gauge32(decode_u32(content)?),
            tag::TIMETICKS => Self::TimeTicks(decode_u32(content)?),
            tag::OPAQUE => Self::Opaque(content.to_vec()),
            tag::COUNTER64 => Self::Counter64(decode_unsigned(content)?),
            tag::NO_SUCH_OBJECT => Self::NoSuchObject,
            tag::NO_SUCH_INSTANCE => Self::NoSuchInstance,
            tag::END_OF_MIB_VIEW => Self::EndOfMibView,
            other => Self::Unsupported(other),
        };
        Ok(value)
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Integer(v) => write_tlv(out, tag::INTEGER, &integer_content(*v)),
            Self::OctetString(bytes) => write_tlv(out, tag::OCTET_STRING, bytes),
            Self::Null => write_tlv(out, tag::NULL, &[]),
            Self::ObjectId(oid) => write_tlv(out, tag::OBJECT_IDENTIFIER, &oid_content(oid)),
            Self::IpAddress(octets) => write_tlv(out, tag::IP_ADDRESS, octets),
            Self::Counter32(v) => write_tlv(out, tag::COUNTER32, &unsigned_content(u64::from(*v))),
            Self::Gauge32(v) => write_tlv(out, tag::GAUGE32, &unsigned_content(u64::from(*v))),
            Self::TimeTicks(v) => write_tlv(out, tag::TIMETICKS, &unsigned_content(u64::from(*v))),
            Self::Opaque(bytes) => write_tlv(out, tag::OPAQUE, bytes),
            Self::Counter64(v) => write_tlv(out, tag::COUNTER64, &unsigned_content(*v)),
            Self::NoSuchObject => write_tlv(out, tag::NO_SUCH_OBJECT, &[]),
            Self::NoSuchInstance => write_tlv(out, tag::NO_SUCH_INSTANCE, &[]),
            Self::EndOfMibView => write_tlv(out, tag::END_OF_MIB_VIEW, &[]),
            Self::Unsupported(t) => write_tlv(out, *t, &[]),
        }
    }

    /// Non-negative numeric value, whatever integer type the agent used.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(v) => u64::try_from(*v).ok(),
            Self::Counter32(v) | Self::Gauge32(v) | Self::TimeTicks(v) => Some(u64::from(*v)),
            Self::Counter64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::OctetString(bytes) | Self::Opaque(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Self::ObjectId(oid) => Some(oid),
            _ => None,
        }
    }

    /// v2c exception values that mark "no data here" rather than a value.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Self::NoSuchObject | Self::NoSuchInstance | Self::EndOfMibView
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "INTEGER",
            Self::OctetString(_) => "OCTET STRING",
            Self::Null => "NULL",
            Self::ObjectId(_) => "OBJECT IDENTIFIER",
            Self::IpAddress(_) => "IpAddress",
            Self::Counter32(_) => "Counter32",
            Self::Gauge32(_) => "Gauge32",
            Self::TimeTicks(_) => "TimeTicks",
            Self::Opaque(_) => "Opaque",
            Self::Counter64(_) => "Counter64",
            Self::NoSuchObject => "noSuchObject",
            Self::NoSuchInstance => "noSuchInstance",
            Self::EndOfMibView => "endOfMibView",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

fn decode_u32(content: &[u8]) -> Result<u32, DecodeError> {
    u32::try_from(decode_unsigned(content)?).map_err(|_| DecodeError::IntegerOverflow)
}
