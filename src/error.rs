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

//! The layered stream's error type.
//!
//! The byte-level taxonomy in [`crate::result`] is hand-rolled, matching
//! the low-level codec tier of the engine. The stream (orchestration) tier
//! gets a `thiserror`-derived error instead, the same split observed
//! between a protocol codec and its enclosing connection-management layer.

use crate::result::ProtocolError;
use thiserror::Error;

/// Result type for [`crate::stream::TelnetStream`] operations.
pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// Errors surfaced by the layered stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying transport failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte-level engine reported a protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// An option the caller referenced is not registered.
    #[error("option 0x{0:02X} is not registered")]
    OptionNotRegistered(u8),

    /// `write_subnegotiation` was called for an option that does not
    /// support subnegotiation, or is not currently enabled.
    #[error("option 0x{0:02X} does not support subnegotiation or is not enabled")]
    SubnegotiationNotPermitted(u8),

    /// The stream was already at end-of-file.
    #[error("stream is at end of file")]
    Eof,
}

impl StreamError {
    /// Errors where retrying the operation, or simply continuing, might
    /// succeed. Per spec.md §7's "Recoverable at the stream" category.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StreamError::Io(_))
    }

    /// Errors that originate below the engine's own logic (the transport,
    /// or an option the application misused), as opposed to a protocol
    /// violation by the peer.
    pub fn is_caller_misuse(&self) -> bool {
        matches!(
            self,
            StreamError::OptionNotRegistered(_) | StreamError::SubnegotiationNotPermitted(_)
        )
    }
}
