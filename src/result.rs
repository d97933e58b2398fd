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

//! Error and in-band processing-signal taxonomy for the byte-level engine.
//!
//! Two disjoint categories share a single propagation path: [`ProtocolError`]
//! (something the peer or the application did wrong) and [`ProcessingSignal`]
//! (an in-band Telnet meaning, not an exception). [`EngineOutcome`] is the
//! three-valued result both the state machine and the layered stream return.

use crate::consts::option;

/// A protocol-level error: the peer, or the application, did something the
/// engine cannot silently absorb without informing the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A byte sequence violated RFC 854 framing in a way that was still
    /// recoverable (state was reset, stream resumes).
    ProtocolViolation(String),
    /// An invariant internal to the engine was broken; indicates a bug.
    InternalError(String),
    /// An unrecognised command byte followed `IAC`.
    InvalidCommand(u8),
    /// A negotiation byte sequence could not be interpreted.
    InvalidNegotiation(String),
    /// The option is not registered, or not supported in the requested
    /// direction.
    OptionNotAvailable(u8),
    /// A subnegotiation payload was malformed.
    InvalidSubnegotiation { option: u8, reason: String },
    /// A subnegotiation payload exceeded the option's configured maximum.
    SubnegotiationOverflow { option: u8, limit: usize },
    /// `IAC GA` was received while Suppress-Go-Ahead is enabled remotely.
    IgnoredGoAhead,
    /// A registered handler declined to run (e.g. re-entrant disallowed).
    UserHandlerForbidden { option: u8 },
    /// A handler was invoked for an option with none registered.
    UserHandlerNotFound { option: u8 },
    /// The Q-Method negotiation queue reached an inconsistent state.
    NegotiationQueueError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::ProtocolViolation(reason) => write!(f, "protocol violation: {reason}"),
            ProtocolError::InternalError(reason) => write!(f, "internal error: {reason}"),
            ProtocolError::InvalidCommand(cmd) => write!(f, "invalid command byte: 0x{cmd:02X}"),
            ProtocolError::InvalidNegotiation(reason) => {
                write!(f, "invalid negotiation: {reason}")
            }
            ProtocolError::OptionNotAvailable(id) => {
                write!(f, "option 0x{id:02X} is not available")
            }
            ProtocolError::InvalidSubnegotiation { option, reason } => {
                write!(f, "invalid subnegotiation for option 0x{option:02X}: {reason}")
            }
            ProtocolError::SubnegotiationOverflow { option, limit } => {
                write!(f, "subnegotiation payload for option 0x{option:02X} exceeded {limit} bytes")
            }
            ProtocolError::IgnoredGoAhead => write!(f, "go-ahead ignored (suppress-go-ahead is enabled)"),
            ProtocolError::UserHandlerForbidden { option } => {
                write!(f, "handler for option 0x{option:02X} forbidden")
            }
            ProtocolError::UserHandlerNotFound { option } => {
                write!(f, "no handler registered for option 0x{option:02X}")
            }
            ProtocolError::NegotiationQueueError(reason) => {
                write!(f, "negotiation queue error: {reason}")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Whether the byte-level state machine can absorb this error on its
    /// own: the state is reset and the stream simply resumes, per
    /// spec.md §7 "Recoverable at the byte-level FSM". Errors that are
    /// *not* FSM-recoverable must be surfaced to the caller of
    /// `read_some`.
    pub fn is_fsm_recoverable(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidCommand(_)
                | ProtocolError::IgnoredGoAhead
                | ProtocolError::InvalidSubnegotiation { .. }
        )
    }

    /// A human-oriented name for the option referenced by this error, if any.
    pub fn option_name(&self) -> Option<&'static str> {
        let id = match self {
            ProtocolError::OptionNotAvailable(id) => *id,
            ProtocolError::InvalidSubnegotiation { option, .. } => *option,
            ProtocolError::SubnegotiationOverflow { option, .. } => *option,
            ProtocolError::UserHandlerForbidden { option } => *option,
            ProtocolError::UserHandlerNotFound { option } => *option,
            _ => return None,
        };
        Some(crate::registry::option_name(id))
    }
}

/// An in-band Telnet processing signal. Not exceptional: these compose a
/// side-channel carrying RFC 854 semantics to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingSignal {
    /// A complete line (`CR LF`) was seen; the `LF` has been forwarded.
    EndOfLine,
    /// A bare `CR` (not followed by `LF` or `NUL`) was seen.
    CarriageReturn,
    /// `IAC EOR` was received with End-Of-Record enabled remotely.
    EndOfRecord,
    /// `IAC GA` was received with Suppress-Go-Ahead not enabled remotely.
    GoAhead,
    /// `IAC EC` was received.
    EraseCharacter,
    /// `IAC EL` was received.
    EraseLine,
    /// `IAC AO` was received.
    AbortOutput,
    /// `IAC IP` was received.
    InterruptProcess,
    /// `IAC BRK` was received.
    TelnetBreak,
    /// `IAC DM` was received.
    DataMark,
}

impl std::fmt::Display for ProcessingSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProcessingSignal::EndOfLine => "end-of-line",
            ProcessingSignal::CarriageReturn => "carriage-return",
            ProcessingSignal::EndOfRecord => "end-of-record",
            ProcessingSignal::GoAhead => "go-ahead",
            ProcessingSignal::EraseCharacter => "erase-character",
            ProcessingSignal::EraseLine => "erase-line",
            ProcessingSignal::AbortOutput => "abort-output",
            ProcessingSignal::InterruptProcess => "interrupt-process",
            ProcessingSignal::TelnetBreak => "telnet-break",
            ProcessingSignal::DataMark => "data-mark",
        };
        f.write_str(name)
    }
}

/// The three-valued result shared by the byte-level state machine and the
/// layered stream: a step either continues normally, yields an in-band
/// signal, or fails with a protocol error.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    /// Nothing noteworthy happened; processing continues.
    Continue,
    /// An in-band processing signal was produced.
    Signal(ProcessingSignal),
    /// A protocol error occurred.
    Error(ProtocolError),
}

impl EngineOutcome {
    /// True if this outcome is [`EngineOutcome::Continue`].
    pub fn is_continue(&self) -> bool {
        matches!(self, EngineOutcome::Continue)
    }

    /// The signal carried by this outcome, if any.
    pub fn signal(&self) -> Option<ProcessingSignal> {
        match self {
            EngineOutcome::Signal(signal) => Some(*signal),
            _ => None,
        }
    }

    /// The error carried by this outcome, if any.
    pub fn error(&self) -> Option<&ProtocolError> {
        match self {
            EngineOutcome::Error(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ProtocolError> for EngineOutcome {
    fn from(error: ProtocolError) -> Self {
        EngineOutcome::Error(error)
    }
}

impl From<ProcessingSignal> for EngineOutcome {
    fn from(signal: ProcessingSignal) -> Self {
        EngineOutcome::Signal(signal)
    }
}

/// Excludes `STATUS` itself, per RFC 859's SEND/IS enumeration rule.
pub(crate) fn status_excluded(id: u8) -> bool {
    id == option::STATUS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_outcome_from_error() {
        let outcome: EngineOutcome = ProtocolError::IgnoredGoAhead.into();
        assert!(outcome.error().is_some());
        assert!(!outcome.is_continue());
    }

    #[test]
    fn engine_outcome_from_signal() {
        let outcome: EngineOutcome = ProcessingSignal::DataMark.into();
        assert_eq!(outcome.signal(), Some(ProcessingSignal::DataMark));
    }

    #[test]
    fn status_is_excluded_from_listings() {
        assert!(status_excluded(option::STATUS));
        assert!(!status_excluded(option::ECHO));
    }
}
