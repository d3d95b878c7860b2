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

//! SNMPv1/v2c message framing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ber::{decode_oid, oid_content, tag, write_integer, write_tlv, BerReader, DecodeError};
use super::oid::Oid;
use super::value::SnmpValue;

/// Community-based protocol versions. SNMPv3 is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnmpVersion {
    #[serde(rename = "1")]
    V1,
    #[default]
    #[serde(rename = "2c")]
    V2c,
}

impl SnmpVersion {
    pub fn wire_value(self) -> i64 {
        match self {
            Self::V1 => 0,
            Self::V2c => 1,
        }
    }

    pub fn from_wire(value: i64) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(Self::V1),
            1 => Ok(Self::V2c),
            other => Err(DecodeError::UnsupportedVersion(other)),
        }
    }
}

impl FromStr for SnmpVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "v1" => Ok(Self::V1),
            "2c" | "v2c" | "2" => Ok(Self::V2c),
            other => Err(format!("unsupported SNMP version '{other}' (expected 1 or 2c)")),
        }
    }
}

impl fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "1"),
            Self::V2c => write!(f, "2c"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduType {
    GetRequest,
    GetNextRequest,
    Response,
    GetBulkRequest,
}

impl PduType {
    pub fn tag(self) -> u8 {
        match self {
            Self::GetRequest => tag::GET_REQUEST,
            Self::GetNextRequest => tag::GET_NEXT_REQUEST,
            Self::Response => tag::RESPONSE,
            Self::GetBulkRequest => tag::GET_BULK_REQUEST,
        }
    }

    pub fn from_tag(value: u8) -> Result<Self, DecodeError> {
        match value {
            tag::GET_REQUEST => Ok(Self::GetRequest),
            tag::GET_NEXT_REQUEST => Ok(Self::GetNextRequest),
            tag::RESPONSE => Ok(Self::Response),
            tag::GET_BULK_REQUEST => Ok(Self::GetBulkRequest),
            other => Err(DecodeError::UnsupportedPdu(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new(oid: Oid, value: SnmpValue) -> Self {
        Self { oid, value }
    }

    pub fn null(oid: Oid) -> Self {
        Self::new(oid, SnmpValue::Null)
    }
}

/// A protocol data unit.
///
/// For GetBulk requests `error_status` and `error_index` carry
/// non-repeaters and max-repetitions respectively, as on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: i32,
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    pub fn get_next(request_id: i32, oids: &[Oid]) -> Self {
        Self {
            pdu_type: PduType::GetNextRequest,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().cloned().map(VarBind::null).collect(),
        }
    }

    pub fn get_bulk(request_id: i32, non_repeaters: i32, max_repetitions: i32, oids: &[Oid]) -> Self {
        Self {
            pdu_type: PduType::GetBulkRequest,
            request_id,
            error_status: non_repeaters,
            error_index: max_repetitions,
            varbinds: oids.iter().cloned().map(VarBind::null).collect(),
        }
    }

    pub fn response(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }
}

/// Human-readable name for an error-status code (RFC 3416).
pub fn error_status_name(status: i32) -> &'static str {
    match status {
        0 => "noError",
        1 => "tooBig",
        2 => "noSuchName",
        3 => "badValue",
        4 => "readOnly",
        5 => "genErr",
        6 => "noAccess",
        7 => "wrongType",
        8 => "wrongLength",
        9 => "wrongEncoding",
        10 => "wrongValue",
        11 => "noCreation",
        12 => "inconsistentValue",
        13 => "resourceUnavailable",
        14 => "commitFailed",
        15 => "undoFailed",
        16 => "authorizationError",
        17 => "notWritable",
        18 => "inconsistentName",
        _ => "unknown",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: SnmpVersion,
    pub community: Vec<u8>,
    pub pdu: Pdu,
}

impl Message {
    pub fn new(version: SnmpVersion, community: impl Into<Vec<u8>>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut varbind_list = Vec::new();
        for vb in &self.pdu.varbinds {
            let mut inner = Vec::new();
            write_tlv(&mut inner, tag::OBJECT_IDENTIFIER, &oid_content(&vb.oid));
            vb.value.encode(&mut inner);
            write_tlv(&mut varbind_list, tag::SEQUENCE, &inner);
        }

        let mut pdu = Vec::new();
        write_integer(&mut pdu, i64::from(self.pdu.request_id));
        write_integer(&mut pdu, i64::from(self.pdu.error_status));
        write_integer(&mut pdu, i64::from(self.pdu.error_index));
        write_tlv(&mut pdu, tag::SEQUENCE, &varbind_list);

        let mut body = Vec::new();
        write_integer(&mut body, self.version.wire_value());
        write_tlv(&mut body, tag::OCTET_STRING, &self.community);
        write_tlv(&mut body, self.pdu.pdu_type.tag(), &pdu);

        let mut out = Vec::with_capacity(body.len() + 4);
        write_tlv(&mut out, tag::SEQUENCE, &body);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut outer = BerReader::new(buf);
        let mut body = outer.read_constructed(tag::SEQUENCE)?;

        let version = SnmpVersion::from_wire(body.read_integer()?)?;
        let community = body.expect(tag::OCTET_STRING)?.to_vec();

        let (pdu_tag, pdu_content) = body.read_tlv()?;
        let pdu_type = PduType::from_tag(pdu_tag)?;
        let mut pdu = BerReader::new(pdu_content);
        let request_id = read_i32(&mut pdu)?;
        let error_status = read_i32(&mut pdu)?;
        let error_index = read_i32(&mut pdu)?;

        let mut list = pdu.read_constructed(tag::SEQUENCE)?;
        let mut varbinds = Vec::new();
        while !list.is_empty() {
            let mut vb = list.read_constructed(tag::SEQUENCE)?;
            let oid = decode_oid(vb.expect(tag::OBJECT_IDENTIFIER)?)?;
            let (value_tag, content) = vb.read_tlv()?;
            // a bad value only spoils its own row; framing errors above are fatal
            let value = SnmpValue::decode(value_tag, content).unwrap_or_else(|e| {
                tracing::debug!(%oid, value_tag, error = %e, "undecodable varbind value");
                SnmpValue::Unsupported(value_tag)
            });
            varbinds.push(VarBind::new(oid, value));
        }

        Ok(Self {
            version,
            community,
            pdu: Pdu {
                pdu_type,
                request_id,
                error_status,
                error_index,
                varbinds,
            },
        })
    }
}

fn read_i32(reader: &mut BerReader<'_>) -> Result<i32, DecodeError> {
    i32::try_from(reader.read_integer()?).map_err(|_| DecodeError::IntegerOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hr_storage_index() -> Oid {
        "1.3.6.1.2.1.25.2.3.1.1".parse().unwrap()
    }

    #[test]
    fn test_get_next_wire_format() {
        let msg = Message::new(
            SnmpVersion::V2c,
            b"public".to_vec(),
            Pdu::get_next(1, &[hr_storage_index()]),
        );

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x30, 0x28,
            0x02, 0x01, 0x01,
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c',
            0xa1, 0x1b,
            0x02, 0x01, 0x01,
            0x02, 0x01, 0x00,
            0x02, 0x01, 0x00,
            0x30, 0x10,
            0x30, 0x0e,
            0x06, 0x0a, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x19, 0x02, 0x03, 0x01, 0x01,
            0x05, 0x00,
        ];
        assert_eq!(msg.encode(), expected);
    }

    #[test]
    fn test_decode_response_with_mixed_values() {
        let descr: Oid = "1.3.6.1.2.1.25.2.3.1.3.1".parse().unwrap();
        let size: Oid = "1.3.6.1.2.1.25.2.3.1.5.1".parse().unwrap();
        let msg = Message::new(
            SnmpVersion::V2c,
            b"public".to_vec(),
            Pdu::response(
                77,
                vec![
                    VarBind::new(descr.clone(), SnmpValue::OctetString(b"/".to_vec())),
                    VarBind::new(size.clone(), SnmpValue::Integer(1_000)),
                ],
            ),
        );

        let decoded = Message::decode(&msg.encode()).unwrap();
        assert_eq!(decoded.pdu.pdu_type, PduType::Response);
        assert_eq!(decoded.pdu.request_id, 77);
        assert_eq!(decoded.pdu.varbinds[0].oid, descr);
        assert_eq!(decoded.pdu.varbinds[0].value.as_bytes(), Some(&b"/"[..]));
        assert_eq!(decoded.pdu.varbinds[1].oid, size);
        assert_eq!(decoded.pdu.varbinds[1].value.as_u64(), Some(1_000));
    }

    #[test]
    fn test_bad_value_spoils_only_its_own_varbind() {
        let used: Oid = "1.3.6.1.2.1.25.2.3.1.6.1".parse().unwrap();
        let other: Oid = "1.3.6.1.2.1.25.2.3.1.6.2".parse().unwrap();
        let mut bytes = Message::new(
            SnmpVersion::V2c,
            b"public".to_vec(),
            Pdu::response(
                9,
                vec![
                    VarBind::new(used.clone(), SnmpValue::Integer(400)),
                    VarBind::new(other.clone(), SnmpValue::Counter32(u32::MAX)),
                ],
            ),
        )
        .encode();

        // widen the Counter32 past 32 bits without touching any length
        let counter = [0x41, 0x05, 0x00, 0xff, 0xff, 0xff, 0xff];
        let at = bytes
            .windows(counter.len())
            .position(|w| w == counter)
            .unwrap();
        bytes[at + 2] = 0x01;

        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(decoded.pdu.varbinds.len(), 2);
        assert_eq!(decoded.pdu.varbinds[0], VarBind::new(used, SnmpValue::Integer(400)));
        assert_eq!(decoded.pdu.varbinds[1].oid, other);
        assert_eq!(decoded.pdu.varbinds[1].value, SnmpValue::Unsupported(0x41));
        assert_eq!(decoded.pdu.varbinds[1].value.as_u64(), None);
    }

    #[test]
    fn test_truncated_framing_is_still_fatal() {
        let bytes = Message::new(
            SnmpVersion::V2c,
            b"public".to_vec(),
            Pdu::response(9, vec![VarBind::new(hr_storage_index(), SnmpValue::Integer(1))]),
        )
        .encode();
        assert!(Message::decode(&bytes[..bytes.len() - 2]).is_err());
    }

    #[test]
    fn test_get_bulk_carries_repetitions_in_error_fields() {
        let pdu = Pdu::get_bulk(5, 0, 10, &[hr_storage_index()]);
        let decoded = Message::decode(&Message::new(SnmpVersion::V2c, "c", pdu).encode()).unwrap();
        assert_eq!(decoded.pdu.pdu_type, PduType::GetBulkRequest);
        assert_eq!(decoded.pdu.error_status, 0);
        assert_eq!(decoded.pdu.error_index, 10);
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut bytes = Message::new(
            SnmpVersion::V1,
            b"public".to_vec(),
            Pdu::get_next(1, &[hr_storage_index()]),
        )
        .encode();
        // version INTEGER content byte
        bytes[4] = 3;
        assert_eq!(
            Message::decode(&bytes),
            Err(DecodeError::UnsupportedVersion(3))
        );
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!("2c".parse::<SnmpVersion>(), Ok(SnmpVersion::V2c));
        assert_eq!("v1".parse::<SnmpVersion>(), Ok(SnmpVersion::V1));
        assert!("3".parse::<SnmpVersion>().is_err());
        assert_eq!(SnmpVersion::V2c.to_string(), "2c");
    }

    #[test]
    fn test_error_status_names() {
        assert_eq!(error_status_name(5), "genErr");
        assert_eq!(error_status_name(99), "unknown");
    }
}
