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

//! The byte-level protocol state machine (spec component 6).
//!
//! Consumes one byte at a time, classifying it per RFC 854/855/1143, and
//! reports a [`StepResult`]: the engine outcome, whether the byte is
//! application data the caller should see, and an optional response the
//! stream layer must dispatch.

use crate::consts::{self, option};
use crate::qmethod::{Direction, Emission, OptionStatusTable};
use crate::registry::OptionRegistry;
use crate::result::{EngineOutcome, ProcessingSignal, ProtocolError};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use tracing::{trace, warn};

/// The 7-state classifier of spec.md §3/§4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProtocolState {
    Normal,
    HasCr,
    HasIac,
    OptionNeg,
    SubnegOpt,
    Subneg,
    SubnegIac,
}

/// A negotiation byte sequence the stream should write: `IAC <cmd> <opt>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiationResponse {
    /// The option this negotiation concerns.
    pub option: u8,
    /// Which axis the negotiation is on.
    pub dir: Direction,
    /// The affirmative or negative command to send.
    pub emission: Emission,
}

impl NegotiationResponse {
    /// The two-byte `<cmd> <opt>` payload that follows `IAC` on the wire.
    pub fn command_bytes(&self) -> [u8; 2] {
        [self.emission.command_byte(self.dir), self.option]
    }
}

/// What kind of handler the stream should invoke as a result of a
/// completed transition or subnegotiation.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionKind {
    /// An option just transitioned to enabled in `dir`.
    Enable { option: u8, dir: Direction },
    /// An option just transitioned out of enabled in `dir`.
    Disable { option: u8, dir: Direction },
    /// A complete subnegotiation payload arrived for `option`.
    Subnegotiate { option: u8, payload: Bytes },
}

/// The response the stream must dispatch after a step, per spec.md §4.4's
/// `response_variant`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseVariant {
    /// Write `IAC (WILL|WONT|DO|DONT) opt`.
    Negotiation(NegotiationResponse),
    /// Write a raw string reply (used for `AYT`).
    RawString(String),
    /// Invoke a handler, optionally emitting a negotiation response first.
    Completion {
        negotiation: Option<NegotiationResponse>,
        kind: CompletionKind,
    },
}

/// The result of feeding one byte to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// The three-valued engine outcome.
    pub outcome: EngineOutcome,
    /// Whether the byte is application data the caller's buffer should
    /// receive.
    pub forward: bool,
    /// A response the stream must dispatch, if any.
    pub response: Option<ResponseVariant>,
}

impl StepResult {
    fn continue_forward() -> Self {
        StepResult {
            outcome: EngineOutcome::Continue,
            forward: true,
            response: None,
        }
    }

    fn continue_discard() -> Self {
        StepResult {
            outcome: EngineOutcome::Continue,
            forward: false,
            response: None,
        }
    }

    fn signal(signal: ProcessingSignal, forward: bool) -> Self {
        StepResult {
            outcome: EngineOutcome::Signal(signal),
            forward,
            response: None,
        }
    }

    fn error(error: ProtocolError) -> Self {
        StepResult {
            outcome: EngineOutcome::Error(error),
            forward: false,
            response: None,
        }
    }
}

/// The byte-level protocol state machine, owned exclusively by one stream.
pub struct ProtocolEngine {
    state: ProtocolState,
    current_command: Option<u8>,
    current_option: Option<u8>,
    subneg_buffer: BytesMut,
    subneg_max: usize,
    /// Whether an unrecognised byte was seen while escaping inside a
    /// subnegotiation, meaning the next literal byte must be folded back in.
    subneg_missing_iac: bool,
    status: OptionStatusTable,
    registry: Arc<OptionRegistry>,
    ayt_reply: String,
    unknown_option_handler: Option<Arc<crate::config::UnknownOptionHandler>>,
}

impl ProtocolEngine {
    /// A fresh engine over a shared registry, with the given AYT reply.
    pub fn new(registry: Arc<OptionRegistry>, ayt_reply: impl Into<String>) -> Self {
        ProtocolEngine {
            state: ProtocolState::Normal,
            current_command: None,
            current_option: None,
            subneg_buffer: BytesMut::new(),
            subneg_max: 0,
            subneg_missing_iac: false,
            status: OptionStatusTable::new(),
            registry,
            ayt_reply: ayt_reply.into(),
            unknown_option_handler: None,
        }
    }

    /// Install a policy consulted whenever a negotiated option has no
    /// registry entry, in place of the default refusal.
    pub fn with_unknown_option_handler(mut self, handler: Arc<crate::config::UnknownOptionHandler>) -> Self {
        self.unknown_option_handler = Some(handler);
        self
    }

    /// The per-connection option status table.
    pub fn status(&self) -> &OptionStatusTable {
        &self.status
    }

    /// The per-connection option status table, mutably — used by
    /// user-initiated `request_option`/`disable_option`.
    pub fn status_mut(&mut self) -> &mut OptionStatusTable {
        &mut self.status
    }

    /// The shared option registry.
    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    fn is_binary_remote(&self) -> bool {
        self.status.is_enabled(option::BINARY, Direction::Remote)
    }

    fn is_sga_remote(&self) -> bool {
        self.status.is_enabled(option::SUPPRESS_GO_AHEAD, Direction::Remote)
    }

    fn is_eor_remote(&self) -> bool {
        self.status.is_enabled(option::END_OF_RECORD, Direction::Remote)
    }

    /// Feed one byte to the engine.
    pub fn step(&mut self, byte: u8) -> StepResult {
        match self.state {
            ProtocolState::Normal => self.step_normal(byte),
            ProtocolState::HasCr => self.step_has_cr(byte),
            ProtocolState::HasIac => self.step_has_iac(byte),
            ProtocolState::OptionNeg => self.step_option_neg(byte),
            ProtocolState::SubnegOpt => self.step_subneg_opt(byte),
            ProtocolState::Subneg => self.step_subneg(byte),
            ProtocolState::SubnegIac => self.step_subneg_iac(byte),
        }
    }

    fn step_normal(&mut self, byte: u8) -> StepResult {
        match byte {
            consts::IAC => {
                self.state = ProtocolState::HasIac;
                StepResult::continue_discard()
            }
            consts::CR if !self.is_binary_remote() => {
                self.state = ProtocolState::HasCr;
                StepResult::continue_discard()
            }
            consts::NUL => StepResult::continue_discard(),
            _ => StepResult::continue_forward(),
        }
    }

    fn step_has_cr(&mut self, byte: u8) -> StepResult {
        self.state = ProtocolState::Normal;
        match byte {
            consts::LF => StepResult::signal(ProcessingSignal::EndOfLine, true),
            consts::NUL => StepResult::signal(ProcessingSignal::CarriageReturn, false),
            consts::IAC => {
                warn!("CR followed by IAC outside BINARY");
                self.state = ProtocolState::HasIac;
                StepResult {
                    outcome: EngineOutcome::Signal(ProcessingSignal::CarriageReturn),
                    forward: false,
                    response: None,
                }
            }
            _ => {
                warn!(byte, "bare CR not followed by LF or NUL");
                // Re-run the byte through NORMAL after reporting the signal,
                // since it is ordinary data that still needs classifying.
                let mut inner = self.step_normal(byte);
                inner.outcome = EngineOutcome::Signal(ProcessingSignal::CarriageReturn);
                inner
            }
        }
    }

    fn step_has_iac(&mut self, byte: u8) -> StepResult {
        match byte {
            consts::IAC => {
                self.state = ProtocolState::Normal;
                StepResult::continue_forward()
            }
            consts::WILL | consts::WONT | consts::DO | consts::DONT => {
                self.current_command = Some(byte);
                self.state = ProtocolState::OptionNeg;
                StepResult::continue_discard()
            }
            consts::SB => {
                self.state = ProtocolState::SubnegOpt;
                StepResult::continue_discard()
            }
            consts::SE => {
                self.state = ProtocolState::Normal;
                StepResult::error(ProtocolError::InvalidSubnegotiation {
                    option: 0,
                    reason: "SE received outside of subnegotiation".into(),
                })
            }
            consts::DM => {
                self.state = ProtocolState::Normal;
                StepResult::signal(ProcessingSignal::DataMark, false)
            }
            consts::GA => {
                self.state = ProtocolState::Normal;
                if self.is_sga_remote() {
                    StepResult::error(ProtocolError::IgnoredGoAhead)
                } else {
                    StepResult::signal(ProcessingSignal::GoAhead, false)
                }
            }
            consts::AYT => {
                self.state = ProtocolState::Normal;
                StepResult {
                    outcome: EngineOutcome::Continue,
                    forward: false,
                    response: Some(ResponseVariant::RawString(self.ayt_reply.clone())),
                }
            }
            consts::EOR => {
                self.state = ProtocolState::Normal;
                if self.is_eor_remote() {
                    StepResult::signal(ProcessingSignal::EndOfRecord, false)
                } else {
                    StepResult::continue_discard()
                }
            }
            consts::NOP => {
                self.state = ProtocolState::Normal;
                StepResult::continue_discard()
            }
            consts::EC => {
                self.state = ProtocolState::Normal;
                StepResult::signal(ProcessingSignal::EraseCharacter, false)
            }
            consts::EL => {
                self.state = ProtocolState::Normal;
                StepResult::signal(ProcessingSignal::EraseLine, false)
            }
            consts::AO => {
                self.state = ProtocolState::Normal;
                StepResult::signal(ProcessingSignal::AbortOutput, false)
            }
            consts::IP => {
                self.state = ProtocolState::Normal;
                StepResult::signal(ProcessingSignal::InterruptProcess, false)
            }
            consts::BRK => {
                self.state = ProtocolState::Normal;
                StepResult::signal(ProcessingSignal::TelnetBreak, false)
            }
            other => {
                self.state = ProtocolState::Normal;
                StepResult::error(ProtocolError::InvalidCommand(other))
            }
        }
    }

    fn step_option_neg(&mut self, byte: u8) -> StepResult {
        self.state = ProtocolState::Normal;
        let command = self.current_command.take().expect("OPTION_NEG entered with no pending command");
        let dir = match command {
            consts::DO | consts::DONT => Direction::Local,
            consts::WILL | consts::WONT => Direction::Remote,
            _ => unreachable!("only negotiation commands enter OPTION_NEG"),
        };
        let descriptor = self.registry.get(byte);
        let supported = match &descriptor {
            Some(d) => match dir {
                Direction::Local => d.local_supported,
                Direction::Remote => d.remote_supported,
            },
            None => self
                .unknown_option_handler
                .as_ref()
                .map(|handler| handler(byte, dir))
                .unwrap_or(false),
        };

        let transition = match command {
            consts::DO | consts::WILL => self.status.record_mut(byte).peer_affirm(dir, supported),
            consts::DONT | consts::WONT => self.status.record_mut(byte).peer_refuse(dir),
            _ => unreachable!(),
        };

        let negotiation = transition.emit.map(|emission| NegotiationResponse {
            option: byte,
            dir,
            emission,
        });

        if transition.run_enable_handler {
            StepResult {
                outcome: EngineOutcome::Continue,
                forward: false,
                response: Some(ResponseVariant::Completion {
                    negotiation,
                    kind: CompletionKind::Enable { option: byte, dir },
                }),
            }
        } else if transition.run_disable_handler {
            StepResult {
                outcome: EngineOutcome::Continue,
                forward: false,
                response: Some(ResponseVariant::Completion {
                    negotiation,
                    kind: CompletionKind::Disable { option: byte, dir },
                }),
            }
        } else if let Some(negotiation) = negotiation {
            StepResult {
                outcome: EngineOutcome::Continue,
                forward: false,
                response: Some(ResponseVariant::Negotiation(negotiation)),
            }
        } else {
            trace!(option = byte, ?dir, "negotiation settled with no response required");
            StepResult::continue_discard()
        }
    }

    fn step_subneg_opt(&mut self, byte: u8) -> StepResult {
        self.current_option = Some(byte);
        self.subneg_buffer.clear();
        let descriptor = self.registry.get(byte).unwrap_or_else(|| {
            self.registry.upsert(crate::registry::OptionDescriptor::unknown(byte));
            warn!(option = byte, "invalid_subnegotiation: unknown option, memoized default");
            crate::registry::OptionDescriptor::unknown(byte)
        });
        let enabled = self.status.is_enabled(byte, Direction::Local)
            || self.status.is_enabled(byte, Direction::Remote);
        if !descriptor.supports_subnegotiation || !enabled {
            warn!(option = byte, "invalid_subnegotiation: not supported or not enabled, capturing payload anyway");
        }
        self.subneg_max = if descriptor.max_subnegotiation_size == 0 {
            usize::MAX
        } else {
            descriptor.max_subnegotiation_size
        };
        self.subneg_buffer.reserve(self.subneg_max.min(4096));
        self.subneg_missing_iac = false;
        self.state = ProtocolState::Subneg;
        StepResult::continue_discard()
    }

    fn step_subneg(&mut self, byte: u8) -> StepResult {
        if byte == consts::IAC {
            self.state = ProtocolState::SubnegIac;
            return StepResult::continue_discard();
        }
        if self.subneg_buffer.len() >= self.subneg_max {
            self.state = ProtocolState::Normal;
            let option = self.current_option.unwrap_or(0);
            return StepResult::error(ProtocolError::SubnegotiationOverflow {
                option,
                limit: self.subneg_max,
            });
        }
        self.subneg_buffer.extend_from_slice(&[byte]);
        StepResult::continue_discard()
    }

    fn step_subneg_iac(&mut self, byte: u8) -> StepResult {
        match byte {
            consts::IAC => {
                self.state = ProtocolState::Subneg;
                if self.subneg_buffer.len() >= self.subneg_max {
                    self.state = ProtocolState::Normal;
                    let option = self.current_option.unwrap_or(0);
                    return StepResult::error(ProtocolError::SubnegotiationOverflow {
                        option,
                        limit: self.subneg_max,
                    });
                }
                self.subneg_buffer.extend_from_slice(&[consts::IAC]);
                StepResult::continue_discard()
            }
            consts::SE => {
                self.state = ProtocolState::Normal;
                let option = self.current_option.take().unwrap_or(0);
                let payload = self.subneg_buffer.split().freeze();
                StepResult {
                    outcome: EngineOutcome::Continue,
                    forward: false,
                    response: Some(ResponseVariant::Completion {
                        negotiation: None,
                        kind: CompletionKind::Subnegotiate { option, payload },
                    }),
                }
            }
            other => {
                warn!(byte = other, "invalid_command: assuming a forgotten IAC escape inside subnegotiation");
                self.state = ProtocolState::Subneg;
                self.subneg_buffer.extend_from_slice(&[consts::IAC, other]);
                StepResult {
                    outcome: EngineOutcome::Error(ProtocolError::InvalidCommand(other)),
                    forward: false,
                    response: None,
                }
            }
        }
    }
}
