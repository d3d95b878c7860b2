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

//! Minimal BER (X.690) encoding and decoding for the subset of ASN.1 that
//! SNMPv1/v2c messages use.

use thiserror::Error;

use super::oid::Oid;

/// Universal and SNMP application tags.
pub mod tag {
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const SEQUENCE: u8 = 0x30;

    pub const IP_ADDRESS: u8 = 0x40;
    pub const COUNTER32: u8 = 0x41;
    pub const GAUGE32: u8 = 0x42;
    pub const TIMETICKS: u8 = 0x43;
    pub const OPAQUE: u8 = 0x44;
    pub const COUNTER64: u8 = 0x46;

    // v2c exception values (context-specific, primitive)
    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;

    pub const GET_REQUEST: u8 = 0xa0;
    pub const GET_NEXT_REQUEST: u8 = 0xa1;
    pub const RESPONSE: u8 = 0xa2;
    pub const GET_BULK_REQUEST: u8 = 0xa5;
}

/// Wire-level decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("message truncated")]
    Truncated,
    #[error("unsupported length encoding")]
    InvalidLength,
    #[error("expected tag 0x{expected:02x}, found 0x{found:02x}")]
    UnexpectedTag { expected: u8, found: u8 },
    #[error("integer does not fit target type")]
    IntegerOverflow,
    #[error("malformed object identifier")]
    InvalidOid,
    #[error("unsupported SNMP version {0}")]
    UnsupportedVersion(i64),
    #[error("unsupported PDU type 0x{0:02x}")]
    UnsupportedPdu(u8),
}

/// Cursor over a BER-encoded buffer.
pub struct BerReader<'a> {
    buf: &'a [u8],
}

impl<'a> BerReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Read one tag-length-value triple and return the tag and content.
    pub fn read_tlv(&mut self) -> Result<(u8, &'a [u8]), DecodeError> {
        let (&tag, rest) = self.buf.split_first().ok_or(DecodeError::Truncated)?;
        let (&first, mut rest) = rest.split_first().ok_or(DecodeError::Truncated)?;

        let len = if first < 0x80 {
            first as usize
        } else {
            // 0x80 is the indefinite form, which SNMP never uses
            let n = (first & 0x7f) as usize;
            if n == 0 || n > 4 {
                return Err(DecodeError::InvalidLength);
            }
            if rest.len() < n {
                return Err(DecodeError::Truncated);
            }
            let len = rest[..n]
                .iter()
                .fold(0usize, |acc, &b| (acc << 8) | b as usize);
            rest = &rest[n..];
            len
        };

        if rest.len() < len {
            return Err(DecodeError::Truncated);
        }
        let (content, remaining) = rest.split_at(len);
        self.buf = remaining;
        Ok((tag, content))
    }

    /// Read a TLV and require a specific tag.
    pub fn expect(&mut self, expected: u8) -> Result<&'a [u8], DecodeError> {
        let (found, content) = self.read_tlv()?;
        if found != expected {
            return Err(DecodeError::UnexpectedTag { expected, found });
        }
        Ok(content)
    }

    /// Read a constructed value and return a reader over its contents.
    pub fn read_constructed(&mut self, expected: u8) -> Result<BerReader<'a>, DecodeError> {
        self.expect(expected).map(BerReader::new)
    }

    pub fn read_integer(&mut self) -> Result<i64, DecodeError> {
        decode_integer(self.expect(tag::INTEGER)?)
    }
}

pub fn decode_integer(content: &[u8]) -> Result<i64, DecodeError> {
    if content.is_empty() {
        return Err(DecodeError::Truncated);
    }
    if content.len() > 8 {
        return Err(DecodeError::IntegerOverflow);
    }
    let seed: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
    Ok(content
        .iter()
        .fold(seed, |acc, &b| (acc << 8) | i64::from(b)))
}

/// Decode an unsigned application integer (Counter32, Gauge32, Counter64...).
/// Agents may prefix a zero byte to keep the high bit clear.
pub fn decode_unsigned(content: &[u8]) -> Result<u64, DecodeError> {
    if content.is_empty() {
        return Err(DecodeError::Truncated);
    }
    let first_significant = content
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(content.len());
    let significant = &content[first_significant..];
    if significant.len() > 8 {
        return Err(DecodeError::IntegerOverflow);
    }
    Ok(significant
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

pub fn decode_oid(content: &[u8]) -> Result<Oid, DecodeError> {
    if content.is_empty() {
        return Err(DecodeError::InvalidOid);
    }

    let mut subids = Vec::new();
    let mut current: u32 = 0;
    let mut pending = false;
    for &b in content {
        if current > (u32::MAX >> 7) {
            return Err(DecodeError::InvalidOid);
        }
        current = (current << 7) | u32::from(b & 0x7f);
        pending = b & 0x80 != 0;
        if !pending {
            subids.push(current);
            current = 0;
        }
    }
    if pending {
        return Err(DecodeError::InvalidOid);
    }

    let first = subids[0];
    let (a, b) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };
    let mut arcs = Vec::with_capacity(subids.len() + 1);
    arcs.push(a);
    arcs.push(b);
    arcs.extend_from_slice(&subids[1..]);
    Ok(Oid::from_arcs(arcs))
}

pub fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = (len as u32).to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    out.push(0x80 | (4 - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

pub fn write_tlv(out: &mut Vec<u8>, tag: u8, content: &[u8]) {
    out.push(tag);
    write_length(out, content.len());
    out.extend_from_slice(content);
}

/// Minimal two's-complement encoding.
pub fn integer_content(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

pub fn unsigned_content(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().take_while(|&&b| b == 0).count().min(7);
    let mut out = Vec::with_capacity(9);
    if bytes[start] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[start..]);
    out
}

pub fn oid_content(oid: &Oid) -> Vec<u8> {
    let arcs = oid.arcs();
    let mut out = Vec::new();
    let (head, tail) = match arcs {
        [a, b, rest @ ..] => (a * 40 + b, rest),
        [a] => (a * 40, &[][..]),
        [] => (0, &[][..]),
    };
    push_base128(&mut out, head);
    for &arc in tail {
        push_base128(&mut out, arc);
    }
    out
}

fn push_base128(out: &mut Vec<u8>, mut value: u32) {
    let mut stack = [0u8; 5];
    let mut n = 0;
    loop {
        stack[n] = (value & 0x7f) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(stack[i] | continuation);
    }
}

pub fn write_integer(out: &mut Vec<u8>, value: i64) {
    write_tlv(out, tag::INTEGER, &integer_content(value));
}
