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

//! # Telnetix
//!
//! A Telnet protocol engine: a layered, bidirectional byte-stream adapter
//! implementing RFC 854 (the Network Virtual Terminal), RFC 855 (option
//! negotiation), RFC 1143 (the Q-Method, race-free negotiation), RFC 859
//! (the STATUS subnegotiation), and the Synch/urgent-data procedure.
//!
//! ## Overview
//!
//! [`TelnetStream`] wraps any `AsyncRead + AsyncWrite` transport and layers
//! Telnet semantics on top of it:
//!
//! - **NVT line discipline**: `CR LF`/`CR NUL` canonicalisation, `IAC`
//!   escaping, in both directions.
//! - **Option negotiation**: a [`qmethod`] implementation of RFC 1143's
//!   four-state, race-free negotiation, keyed by option id and direction.
//! - **Subnegotiation**: arbitrary per-option payloads, with an internal
//!   handler for [`status`] (RFC 859) and an application-registrable
//!   handler for everything else.
//! - **Synch / urgent data**: a lock-free [`sync::UrgentTracker`] absorbing
//!   the asynchronous arrival of an out-of-band urgent signal relative to
//!   the in-band `DM` byte.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use telnetix::{Direction, EngineConfig, TelnetStream};
//!
//! # async fn example(transport: tokio::net::TcpStream) -> Result<(), Box<dyn std::error::Error>> {
//! let mut stream = TelnetStream::with_config(transport, EngineConfig::default());
//! stream.request_option(telnetix::consts::option::ECHO, Direction::Local).await?;
//!
//! let mut buf = [0u8; 1024];
//! let (n, signal) = stream.read_some(&mut buf).await?;
//! if let Some(signal) = signal {
//!     eprintln!("received in-band signal: {signal}");
//! }
//! stream.write_some(&buf[..n]).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Two error taxonomies exist at different layers: [`result::ProtocolError`]
//! at the byte-level engine (hand-rolled `Display`/`Error`, mirroring a
//! codec's framing errors) and [`error::StreamError`] at the stream
//! (`thiserror`-derived, mirroring a connection-management layer's errors).
//! Not every `ProtocolError` reaches a `TelnetStream` caller — some are
//! absorbed internally by the byte-level engine and only logged; see
//! [`result::ProtocolError::is_fsm_recoverable`].
//!
//! ## Non-goals
//!
//! This crate does not implement transport establishment (TCP connect/listen,
//! TLS), terminal emulation (ANSI/VT escape interpretation), stream
//! compression, or a CLI/client/server binary. It negotiates the
//! compression option's enablement state like any other option, but does
//! not itself compress or decompress bytes.

#![forbid(unsafe_code)]
#![warn(missing_docs, future_incompatible, rust_2018_idioms)]

pub mod config;
pub mod consts;
pub mod error;
pub mod handlers;
pub mod qmethod;
pub mod registry;
pub mod result;
pub mod statemachine;
pub mod status;
pub mod stream;
pub mod sync;

pub use self::config::{EngineConfig, UnknownOptionHandler};
pub use self::error::{StreamError, StreamResult};
pub use self::handlers::{OptionHandlerTable, OptionHandlers};
pub use self::qmethod::{Direction, QState};
pub use self::registry::{OptionDescriptor, OptionRegistry};
pub use self::result::{EngineOutcome, ProcessingSignal, ProtocolError};
pub use self::stream::TelnetStream;
pub use self::sync::{UrgentState, UrgentTracker};
