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

//! The layered stream (spec component 7): the orchestration layer sitting
//! between a generic transport and Telnet-aware application I/O.

use crate::config::EngineConfig;
use crate::consts;
use crate::error::{StreamError, StreamResult};
use crate::handlers::{OptionHandlerTable, OptionHandlers};
use crate::qmethod::{Direction, Emission};
use crate::registry::OptionRegistry;
use crate::result::{EngineOutcome, ProcessingSignal};
use crate::statemachine::{CompletionKind, NegotiationResponse, ProtocolEngine, ResponseVariant};
use crate::status::{self, StatusMessage};
use crate::sync::UrgentTracker;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, trace, warn};

const READ_CHUNK: usize = 4096;

/// A Telnet-aware layered stream wrapping a reliable byte-stream `transport`.
///
/// All per-stream mutable state (the byte-level engine, option status
/// table, context buffers) is owned exclusively by this value and mutated
/// only from its own methods — there is no internal locking, matching
/// spec.md §5's single-strand cooperative scheduling model: callers must
/// not drive two operations on the same `TelnetStream` concurrently.
pub struct TelnetStream<T> {
    transport: T,
    engine: ProtocolEngine,
    handlers: OptionHandlerTable,
    urgent: Arc<UrgentTracker>,
    input_buffer: Vec<u8>,
    input_cursor: usize,
    deferred_write_error: Option<StreamError>,
}

impl<T> TelnetStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap `transport` with the default, process-wide configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, EngineConfig::default())
    }

    /// Wrap `transport` with an explicit configuration — the per-connection
    /// escape hatch spec.md §9 describes for multi-tenant embedders.
    pub fn with_config(transport: T, config: EngineConfig) -> Self {
        let mut engine = ProtocolEngine::new(config.registry(), config.ayt_reply().to_string());
        if let Some(handler) = config.unknown_option_handler() {
            engine = engine.with_unknown_option_handler(handler);
        }
        TelnetStream {
            transport,
            engine,
            handlers: OptionHandlerTable::new(),
            urgent: Arc::new(UrgentTracker::new()),
            input_buffer: Vec::new(),
            input_cursor: 0,
            deferred_write_error: None,
        }
    }

    /// The shared option registry in use by this stream.
    pub fn registry(&self) -> &OptionRegistry {
        self.engine.registry()
    }

    /// A cloneable handle to this connection's urgent-data tracker. A
    /// transport integration aware of TCP out-of-band data notifications
    /// should call [`UrgentTracker::saw_urgent`] on this handle when one
    /// arrives; this crate does not itself observe OOB socket state, since
    /// the transport is out of scope (spec.md §1).
    pub fn urgent_tracker(&self) -> Arc<UrgentTracker> {
        self.urgent.clone()
    }

    /// Whether `opt` is currently enabled in `dir`.
    pub fn is_enabled(&self, opt: u8, dir: Direction) -> bool {
        self.engine.status().is_enabled(opt, dir)
    }

    /// Register per-option callbacks. Replaces any previously registered
    /// set for `opt`.
    pub fn register_option_handlers(&mut self, opt: u8, handlers: OptionHandlers) {
        self.handlers.register(opt, handlers);
    }

    /// Remove any handlers registered for `opt`.
    pub fn unregister_option_handlers(&mut self, opt: u8) {
        self.handlers.unregister(opt);
    }

    /// User-initiated request to enable `dir` of option `opt`. Spec.md §4.3.
    #[instrument(skip(self))]
    pub async fn request_option(&mut self, opt: u8, dir: Direction) -> StreamResult<()> {
        let transition = self.engine.status_mut().record_mut(opt).request_enable(dir);
        self.apply_transition(opt, dir, transition).await
    }

    /// User-initiated request to disable `dir` of option `opt`. Spec.md §4.3.
    #[instrument(skip(self))]
    pub async fn disable_option(&mut self, opt: u8, dir: Direction) -> StreamResult<()> {
        let transition = self.engine.status_mut().record_mut(opt).request_disable(dir);
        self.apply_transition(opt, dir, transition).await
    }

    async fn apply_transition(
        &mut self,
        opt: u8,
        dir: Direction,
        transition: crate::qmethod::Transition,
    ) -> StreamResult<()> {
        if let Some(emission) = transition.emit {
            self.write_negotiation(dir, emission, opt).await?;
        }
        if transition.run_disable_handler {
            if let Some(handlers) = self.handlers.get(opt).cloned() {
                handlers.run_disable(dir).await;
            }
        }
        // request_enable never sets run_enable_handler (only a peer
        // response can complete a YES transition), but stay defensive.
        if transition.run_enable_handler {
            if let Some(handlers) = self.handlers.get(opt).cloned() {
                handlers.run_enable(dir).await;
            }
        }
        Ok(())
    }

    /// Escape `data` per spec.md §4.5 and write it to the transport.
    pub async fn write_some(&mut self, data: &[u8]) -> StreamResult<usize> {
        let binary_local = self.is_enabled(crate::consts::option::BINARY, Direction::Local);
        let mut escaped = Vec::with_capacity(data.len());
        for &byte in data {
            match byte {
                consts::IAC => {
                    escaped.push(consts::IAC);
                    escaped.push(consts::IAC);
                }
                consts::LF if !binary_local => {
                    escaped.push(consts::CR);
                    escaped.push(consts::LF);
                }
                consts::CR if !binary_local => {
                    escaped.push(consts::CR);
                    escaped.push(consts::NUL);
                }
                other => escaped.push(other),
            }
        }
        self.transport.write_all(&escaped).await?;
        Ok(data.len())
    }

    /// Write `data` to the transport without escaping. The caller asserts
    /// RFC 854 correctness.
    pub async fn write_raw(&mut self, data: &[u8]) -> StreamResult<usize> {
        self.transport.write_all(data).await?;
        Ok(data.len())
    }

    /// Write `IAC cmd`.
    pub async fn write_command(&mut self, cmd: u8) -> StreamResult<usize> {
        self.write_raw(&[consts::IAC, cmd]).await
    }

    /// Write `IAC (WILL|WONT|DO|DONT) opt`.
    pub async fn write_negotiation(&mut self, dir: Direction, emission: Emission, opt: u8) -> StreamResult<usize> {
        self.write_raw(&[consts::IAC, emission.command_byte(dir), opt]).await
    }

    /// Write `IAC SB opt <escaped payload> IAC SE` after validating that
    /// `opt` supports subnegotiation and is currently enabled. Both `IAC`
    /// (0xFF) and `SE` (0xF0) occurring literally in `payload` are doubled.
    pub async fn write_subnegotiation(&mut self, opt: u8, payload: &[u8]) -> StreamResult<usize> {
        let descriptor = self
            .registry()
            .get(opt)
            .ok_or(StreamError::OptionNotRegistered(opt))?;
        let enabled = self.is_enabled(opt, Direction::Local) || self.is_enabled(opt, Direction::Remote);
        if !descriptor.supports_subnegotiation || !enabled {
            return Err(StreamError::SubnegotiationNotPermitted(opt));
        }
        let mut framed = Vec::with_capacity(payload.len() + 5);
        framed.push(consts::IAC);
        framed.push(consts::SB);
        framed.push(opt);
        for &byte in payload {
            framed.push(byte);
            if byte == consts::IAC || byte == consts::SE {
                framed.push(byte);
            }
        }
        framed.push(consts::IAC);
        framed.push(consts::SE);
        self.write_raw(&framed).await?;
        Ok(payload.len())
    }

    /// Send the Synch procedure: three `NUL` bytes (the middle conceptually
    /// marked urgent at the transport level — this generic implementation
    /// sends them in-band and relies on a transport-specific integration to
    /// mark the middle byte urgent; see [`Self::urgent_tracker`]) followed
    /// by `IAC DM`.
    pub async fn send_synch(&mut self) -> StreamResult<()> {
        self.write_raw(&[consts::NUL, consts::NUL, consts::NUL]).await?;
        self.write_command(consts::DM).await?;
        Ok(())
    }

    /// Read into `buf`, running the byte-level engine on each consumed
    /// byte. Implements the `INITIALIZING/READING/PROCESSING/DONE`
    /// orchestration of spec.md §4.7.
    #[instrument(skip(self, buf))]
    pub async fn read_some(&mut self, buf: &mut [u8]) -> StreamResult<(usize, Option<ProcessingSignal>)> {
        if buf.is_empty() {
            return Ok((0, None));
        }
        loop {
            // INITIALIZING
            if self.input_cursor >= self.input_buffer.len() {
                self.input_buffer.clear();
                self.input_cursor = 0;
                let mut chunk = [0u8; READ_CHUNK];
                let n = self.transport.read(&mut chunk).await?; // READING
                if n == 0 {
                    if let Some(error) = self.deferred_write_error.take() {
                        return Err(error);
                    }
                    return Err(StreamError::Eof);
                }
                self.input_buffer.extend_from_slice(&chunk[..n]);
            }

            // PROCESSING
            let mut written = 0usize;
            while self.input_cursor < self.input_buffer.len() && written < buf.len() {
                let byte = self.input_buffer[self.input_cursor];
                self.input_cursor += 1;
                let step = self.engine.step(byte);

                match step.outcome {
                    EngineOutcome::Error(error) => {
                        if let Some(response) = step.response {
                            self.dispatch_response(response).await;
                        }
                        if !error.is_fsm_recoverable() {
                            return Err(error.into());
                        }
                    }
                    EngineOutcome::Continue => {
                        if let Some(response) = step.response {
                            self.dispatch_response(response).await;
                        } else if step.forward && !self.urgent.is_suppressing() {
                            buf[written] = byte;
                            written += 1;
                        }
                    }
                    EngineOutcome::Signal(signal) => {
                        if signal == ProcessingSignal::DataMark {
                            self.urgent.saw_data_mark();
                            continue;
                        }
                        if self.urgent.is_suppressing() {
                            trace!(?signal, "signal suppressed during urgent-data window");
                            continue;
                        }
                        match signal {
                            ProcessingSignal::CarriageReturn => {
                                if written < buf.len() {
                                    buf[written] = consts::CR;
                                    written += 1;
                                }
                                // A bare CR also carries the following data
                                // byte through `step_has_cr`'s fallback
                                // (`forward: true`); forward it too.
                                if step.forward && written < buf.len() {
                                    buf[written] = byte;
                                    written += 1;
                                }
                            }
                            ProcessingSignal::EraseCharacter => {
                                if written > 0 {
                                    written -= 1;
                                } else {
                                    return Ok((0, Some(signal)));
                                }
                            }
                            ProcessingSignal::EraseLine => {
                                if written > 0 {
                                    written = 0;
                                } else {
                                    return Ok((0, Some(signal)));
                                }
                            }
                            ProcessingSignal::AbortOutput => {
                                // This stream keeps no unflushed output
                                // side-buffer of its own (writes are
                                // eager), so there is nothing to discard
                                // beyond initiating the Synch procedure.
                                if let Err(error) = self.send_synch().await {
                                    warn!(%error, "send_synch failed while handling abort_output");
                                }
                                return Ok((written, Some(signal)));
                            }
                            _ => {
                                // EndOfLine carries its LF through as
                                // forwardable data (`forward: true` in
                                // `step_has_cr`'s LF arm); every other
                                // signal here is never forward-carrying.
                                if step.forward && written < buf.len() {
                                    buf[written] = byte;
                                    written += 1;
                                }
                                return Ok((written, Some(signal)));
                            }
                        }
                    }
                }
            }

            if written > 0 {
                return Ok((written, None));
            }
            // Only protocol traffic was consumed; re-enter INITIALIZING
            // rather than returning zero bytes, which would be
            // indistinguishable from EOF.
        }
    }

    async fn dispatch_response(&mut self, response: ResponseVariant) {
        match response {
            ResponseVariant::Negotiation(negotiation) => {
                self.emit_negotiation(negotiation).await;
            }
            ResponseVariant::RawString(text) => {
                if let Err(error) = self.write_raw(text.as_bytes()).await {
                    self.defer_write_error(error);
                }
            }
            ResponseVariant::Completion { negotiation, kind } => {
                if let Some(negotiation) = negotiation {
                    self.emit_negotiation(negotiation).await;
                }
                self.run_completion(kind).await;
            }
        }
    }

    async fn emit_negotiation(&mut self, negotiation: NegotiationResponse) {
        let bytes = negotiation.command_bytes();
        if let Err(error) = self.write_raw(&[consts::IAC, bytes[0], bytes[1]]).await {
            self.defer_write_error(error);
        }
    }

    async fn run_completion(&mut self, kind: CompletionKind) {
        match kind {
            CompletionKind::Enable { option, dir } => {
                if let Some(handlers) = self.handlers.get(option).cloned() {
                    handlers.run_enable(dir).await;
                }
            }
            CompletionKind::Disable { option, dir } => {
                if let Some(handlers) = self.handlers.get(option).cloned() {
                    handlers.run_disable(dir).await;
                }
            }
            CompletionKind::Subnegotiate { option, payload } => {
                if option == crate::consts::option::STATUS {
                    self.handle_status_subnegotiation(payload).await;
                } else if let Some(handlers) = self.handlers.get(option).cloned() {
                    if handlers.has_subnegotiate() {
                        if let Some(completion) = handlers.run_subnegotiate(payload).await {
                            if let Some(reply) = completion.payload {
                                if let Err(error) = self.write_subnegotiation(option, &reply).await {
                                    self.defer_write_error(error);
                                }
                            }
                        }
                    } else {
                        debug!(option, "no subnegotiation handler registered");
                    }
                } else {
                    debug!(option, "no subnegotiation handler registered");
                }
            }
        }
    }

    async fn handle_status_subnegotiation(&mut self, payload: bytes::Bytes) {
        let message = match status::parse(&payload) {
            Ok(message) => message,
            Err(error) => {
                warn!(%error, "malformed STATUS subnegotiation");
                return;
            }
        };
        match message {
            StatusMessage::Send => {
                if self.is_enabled(crate::consts::option::STATUS, Direction::Local) {
                    let reply = status::build_is_reply(self.registry(), self.engine.status());
                    if let Err(error) = self.write_subnegotiation(crate::consts::option::STATUS, &reply).await {
                        self.defer_write_error(error);
                    }
                } else {
                    warn!("STATUS SEND received but STATUS is not enabled locally");
                }
            }
            StatusMessage::Is(entries) => {
                if self.is_enabled(crate::consts::option::STATUS, Direction::Remote) {
                    if let Some(handlers) = self.handlers.get(crate::consts::option::STATUS).cloned() {
                        if handlers.has_subnegotiate() {
                            handlers.run_subnegotiate(payload).await;
                        }
                    }
                    trace!(count = entries.len(), "peer STATUS IS listing received");
                } else {
                    warn!("STATUS IS received but STATUS is not enabled remotely");
                }
            }
        }
    }

    fn defer_write_error(&mut self, error: StreamError) {
        warn!(%error, "deferring response write error until next read completion");
        if self.deferred_write_error.is_none() {
            self.deferred_write_error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    async fn pair() -> (TelnetStream<tokio::io::DuplexStream>, tokio::io::DuplexStream) {
        let (a, b) = duplex(4096);
        (TelnetStream::new(a), b)
    }

    #[tokio::test]
    async fn s1_echo_negotiation_happy_path() {
        let (mut stream, mut peer) = pair().await;
        stream
            .registry()
            .upsert(crate::registry::OptionDescriptor::flag(crate::consts::option::ECHO, "ECHO", true, true));

        peer.write_all(&[consts::IAC, consts::DO, crate::consts::option::ECHO])
            .await
            .unwrap();

        let mut buf = [0u8; 16];
        // The DO triggers an internal negotiation response with no
        // forwardable bytes and no signal; read_some should loop back to
        // INITIALIZING on its own rather than reporting 0 bytes, so drive
        // it from the peer side with a trailing data byte instead.
        peer.write_all(b"X").await.unwrap();
        let (n, signal) = stream.read_some(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"X");
        assert!(signal.is_none());

        let mut reply = [0u8; 3];
        peer.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [consts::IAC, consts::WILL, crate::consts::option::ECHO]);
        assert!(stream.is_enabled(crate::consts::option::ECHO, Direction::Local));
    }

    #[tokio::test]
    async fn write_some_escapes_iac_and_canonicalises_newline() {
        let (mut stream, mut peer) = pair().await;
        stream.write_some(&[0xFFu8, b'h', b'i', consts::LF]).await.unwrap();
        let mut out = [0u8; 6];
        peer.read_exact(&mut out).await.unwrap();
        assert_eq!(out, [0xFF, 0xFF, b'h', b'i', consts::CR, consts::LF]);
    }

    #[tokio::test]
    async fn write_subnegotiation_rejects_unsupported_option() {
        let (mut stream, _peer) = pair().await;
        let err = stream.write_subnegotiation(0x2D, b"hi").await.unwrap_err();
        assert!(matches!(err, StreamError::OptionNotRegistered(0x2D)));
    }

    #[tokio::test]
    async fn s4_end_of_line_forwards_the_lf() {
        let (mut stream, mut peer) = pair().await;
        peer.write_all(b"HI\r\n").await.unwrap();
        let mut buf = [0u8; 8];
        let (n, signal) = stream.read_some(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"HI\n");
        assert_eq!(signal, Some(ProcessingSignal::EndOfLine));
    }

    #[tokio::test]
    async fn s4_bare_cr_forwards_the_following_byte() {
        let (mut stream, mut peer) = pair().await;
        peer.write_all(b"\rL").await.unwrap();
        let mut buf = [0u8; 8];
        let (n, signal) = stream.read_some(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[consts::CR, b'L']);
        assert_eq!(signal, Some(ProcessingSignal::CarriageReturn));
    }

    #[tokio::test]
    async fn s5_status_send_triggers_is_reply() {
        let (mut stream, mut peer) = pair().await;
        stream.request_option(crate::consts::option::STATUS, Direction::Local).await.unwrap();
        // drain our own WILL STATUS so the reply-reading below lines up
        let mut drain = [0u8; 3];
        peer.read_exact(&mut drain).await.unwrap();
        peer.write_all(&[consts::IAC, consts::DO, crate::consts::option::STATUS]).await.unwrap();

        let mut buf = [0u8; 1];
        // drive one processing pass to settle the negotiation
        peer.write_all(&[consts::IAC, consts::SB, crate::consts::option::STATUS, consts::option::status::SEND, consts::IAC, consts::SE]).await.unwrap();
        peer.write_all(b"Z").await.unwrap();
        let (n, _) = stream.read_some(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"Z");

        let mut reply = vec![0u8; 6];
        peer.read_exact(&mut reply).await.unwrap();
        assert_eq!(
            &reply[..],
            &[
                consts::IAC, consts::SB, crate::consts::option::STATUS,
                consts::option::status::IS,
                consts::IAC, consts::SE,
            ][..]
        );
    }

    #[tokio::test]
    async fn write_subnegotiation_doubles_iac_and_se() {
        let (mut stream, mut peer) = pair().await;
        stream.request_option(crate::consts::option::STATUS, Direction::Local).await.unwrap();
        let mut drain = [0u8; 3];
        peer.read_exact(&mut drain).await.unwrap();
        peer.write_all(&[consts::IAC, consts::DO, crate::consts::option::STATUS]).await.unwrap();
        let mut buf = [0u8; 1];
        peer.write_all(b"Z").await.unwrap();
        let (n, _) = stream.read_some(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"Z");

        stream
            .write_subnegotiation(crate::consts::option::STATUS, &[0xFF, 0xF0, b'x'])
            .await
            .unwrap();
        let mut reply = vec![0u8; 9];
        peer.read_exact(&mut reply).await.unwrap();
        assert_eq!(
            &reply[..],
            &[
                consts::IAC, consts::SB, crate::consts::option::STATUS,
                0xFF, 0xFF, 0xF0, 0xF0, b'x',
                consts::IAC,
            ][..]
        );
        let mut tail = [0u8; 1];
        peer.read_exact(&mut tail).await.unwrap();
        assert_eq!(tail, [consts::SE]);
    }

    #[tokio::test]
    async fn urgent_signal_suppresses_data_until_data_mark() {
        let (mut stream, mut peer) = pair().await;
        let urgent = stream.urgent_tracker();
        urgent.saw_urgent();

        peer.write_all(b"hidden").await.unwrap();
        peer.write_all(&[consts::IAC, consts::DM]).await.unwrap();
        peer.write_all(b"visible").await.unwrap();

        let mut buf = [0u8; 16];
        let (n, signal) = stream.read_some(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"visible");
        assert!(signal.is_none());
        assert!(!stream.urgent_tracker().is_suppressing());
    }

    #[tokio::test]
    async fn s6_abort_output_initiates_synch() {
        let (mut stream, mut peer) = pair().await;
        peer.write_all(&[b'A', b'B', consts::IAC, consts::AO, b'C']).await.unwrap();
        let mut buf = [0u8; 8];
        let (n, signal) = stream.read_some(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"AB");
        assert_eq!(signal, Some(ProcessingSignal::AbortOutput));

        let mut synch = [0u8; 5];
        peer.read_exact(&mut synch).await.unwrap();
        assert_eq!(synch, [consts::NUL, consts::NUL, consts::NUL, consts::IAC, consts::DM]);

        let (n2, signal2) = stream.read_some(&mut buf).await.unwrap();
        assert_eq!(&buf[..n2], b"C");
        assert!(signal2.is_none());
    }
}
