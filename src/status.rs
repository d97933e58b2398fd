//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The internal STATUS subnegotiation handler (RFC 859, spec §4.6).
//!
//! Unlike every other option, STATUS is implemented inside the engine
//! rather than left to an application-registered handler.

use crate::consts::{self, option};
use crate::qmethod::{Direction, OptionStatusTable};
use crate::registry::OptionRegistry;
use crate::result::{status_excluded, ProtocolError};
use bytes::{BufMut, Bytes, BytesMut};

/// A parsed STATUS subnegotiation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    /// `IAC SB STATUS SEND IAC SE` — the peer wants our view of option
    /// state.
    Send,
    /// `IAC SB STATUS IS <list> IAC SE` — the peer's view of option state.
    Is(Vec<(u8, StatusVerb)>),
}

/// One entry in an `IS` listing: which command the reporting side claims
/// about `option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusVerb {
    /// The reporting side will perform the option.
    Will,
    /// The reporting side asks its peer to perform the option.
    Do,
}

/// Parse a captured STATUS subnegotiation payload (without the leading
/// `IAC SB STATUS` or trailing `IAC SE`).
pub fn parse(payload: &[u8]) -> Result<StatusMessage, ProtocolError> {
    match payload.first() {
        None => Err(ProtocolError::InvalidSubnegotiation {
            option: option::STATUS,
            reason: "empty STATUS payload".into(),
        }),
        Some(&consts::option::status::SEND) => Ok(StatusMessage::Send),
        Some(&consts::option::status::IS) => {
            let mut entries = Vec::new();
            let mut rest = &payload[1..];
            while rest.len() >= 2 {
                let verb = match rest[0] {
                    consts::WILL => StatusVerb::Will,
                    consts::DO => StatusVerb::Do,
                    other => {
                        return Err(ProtocolError::InvalidSubnegotiation {
                            option: option::STATUS,
                            reason: format!("unrecognised STATUS verb byte 0x{other:02X}"),
                        });
                    }
                };
                entries.push((rest[1], verb));
                rest = &rest[2..];
            }
            if !rest.is_empty() {
                return Err(ProtocolError::InvalidSubnegotiation {
                    option: option::STATUS,
                    reason: "trailing byte in STATUS IS listing".into(),
                });
            }
            Ok(StatusMessage::Is(entries))
        }
        Some(other) => Err(ProtocolError::InvalidSubnegotiation {
            option: option::STATUS,
            reason: format!("unrecognised STATUS subcommand 0x{other:02X}"),
        }),
    }
}

/// Build the `IS` reply payload (without `IAC SB STATUS` / `IAC SE`
/// framing, which the stream layer's `write_subnegotiation` adds, escaping
/// any literal `0xFF` or `0xF0` along the way).
///
/// Per spec.md §4.6/S5: one `WILL <id>` entry for every option currently
/// enabled locally and one `DO <id>` entry for every option enabled
/// remotely, in ascending id order, excluding `STATUS` itself.
pub fn build_is_reply(registry: &OptionRegistry, status: &OptionStatusTable) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u8(consts::option::status::IS);
    for id in registry.ids_ascending() {
        if status_excluded(id) {
            continue;
        }
        if status.is_enabled(id, Direction::Local) {
            buf.put_u8(consts::WILL);
            buf.put_u8(id);
        }
        if status.is_enabled(id, Direction::Remote) {
            buf.put_u8(consts::DO);
            buf.put_u8(id);
        }
    }
    buf.freeze()
}

/// Build the `SEND` request payload.
pub fn build_send_request() -> Bytes {
    Bytes::from_static(&[consts::option::status::SEND])
}
