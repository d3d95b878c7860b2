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

//! SNMPv1/v2c client plumbing: object identifiers, BER codec, message
//! framing and a UDP session with table-walk helpers.

pub mod ber;
pub mod oid;
pub mod pdu;
pub mod session;
pub mod value;

pub use oid::{Oid, OidParseError};
pub use pdu::{Message, Pdu, PduType, SnmpVersion, VarBind};
pub use session::SnmpSession;
pub use value::SnmpValue;
