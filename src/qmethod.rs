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

//! RFC 1143 Q-Method per-option, per-direction negotiation state.

use crate::consts::{DO, DONT, WILL, WONT};
use tracing::{debug, trace, warn};

/// The axis a negotiation travels on.
///
/// `Local` is the "I-will / you-DO-on-me" axis: the engine requests it with
/// `WILL`/`WONT`, the peer answers (or requests) with `DO`/`DONT`. `Remote`
/// is the opposite axis: the engine requests it with `DO`/`DONT`, the peer
/// answers (or requests) with `WILL`/`WONT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Whether *this* side performs the option.
    Local,
    /// Whether the *peer* performs the option.
    Remote,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Local => "local",
            Direction::Remote => "remote",
        })
    }
}

/// The four Q-Method states (RFC 1143 §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QState {
    /// Disabled, no negotiation pending.
    No,
    /// Enabled, no negotiation pending.
    Yes,
    /// We asked to disable; awaiting the peer's confirmation.
    WantNo,
    /// We asked to enable; awaiting the peer's confirmation.
    WantYes,
}

/// A single direction's negotiation state: the 4-state FSM plus its one
/// queue bit. Invariant: the queue bit is always `false` when `state` is
/// `No` or `Yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirectionState {
    state: QState,
    queue_opposite: bool,
}

impl Default for DirectionState {
    fn default() -> Self {
        DirectionState {
            state: QState::No,
            queue_opposite: false,
        }
    }
}

/// What, if anything, the Q-Method wants emitted on the wire as a result of
/// a transition: either the affirmative command (`WILL`/`DO`) or the
/// negative one (`WONT`/`DONT`) for the direction in question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// Send `WILL` (local) or `DO` (remote).
    Affirm,
    /// Send `WONT` (local) or `DONT` (remote).
    Refuse,
}

impl Emission {
    /// The concrete IAC command byte for this emission in `dir`.
    pub fn command_byte(self, dir: Direction) -> u8 {
        match (dir, self) {
            (Direction::Local, Emission::Affirm) => WILL,
            (Direction::Local, Emission::Refuse) => WONT,
            (Direction::Remote, Emission::Affirm) => DO,
            (Direction::Remote, Emission::Refuse) => DONT,
        }
    }
}

/// The outcome of feeding a peer `WILL`/`WONT`/`DO`/`DONT` message, or a
/// user `request`/`disable` call, into the Q-Method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    /// An outbound negotiation response to emit, if any.
    pub emit: Option<Emission>,
    /// Whether the enablement handler should be invoked (the direction just
    /// reached `Yes`).
    pub run_enable_handler: bool,
    /// Whether the disablement handler should be invoked (the direction
    /// just left `Yes`).
    pub run_disable_handler: bool,
}

/// Packed two-direction negotiation record for one option: 2 Q-states plus
/// 2 queue bits, four bits of real information packed into one byte in
/// spirit (the struct itself is two bytes for field-access ergonomics;
/// nothing external observes the packing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionStatusRecord {
    local: DirectionState,
    remote: DirectionState,
}

impl OptionStatusRecord {
    /// A fresh record: both directions `No`, no queue bit set.
    pub fn new() -> Self {
        OptionStatusRecord::default()
    }

    fn direction_mut(&mut self, dir: Direction) -> &mut DirectionState {
        match dir {
            Direction::Local => &mut self.local,
            Direction::Remote => &mut self.remote,
        }
    }

    /// Whether `dir` is currently enabled (`Yes`).
    pub fn is_enabled(&self, dir: Direction) -> bool {
        match dir {
            Direction::Local => self.local.state == QState::Yes,
            Direction::Remote => self.remote.state == QState::Yes,
        }
    }

    /// The raw Q-state of `dir`, mostly useful for tests and STATUS.
    pub fn state(&self, dir: Direction) -> QState {
        match dir {
            Direction::Local => self.local.state,
            Direction::Remote => self.remote.state,
        }
    }

    /// User-initiated request to enable `dir`. Spec §4.3 "User asks to
    /// enable".
    pub fn request_enable(&mut self, dir: Direction) -> Transition {
        let entry = self.direction_mut(dir);
        match (entry.state, entry.queue_opposite) {
            (QState::Yes, _) => {
                debug!(direction = %dir, "request_enable: already enabled, idempotent no-op");
                Transition::default()
            }
            (QState::WantYes, false) => Transition::default(),
            (QState::WantYes, true) => {
                entry.queue_opposite = false;
                Transition::default()
            }
            (QState::WantNo, false) => {
                entry.queue_opposite = true;
                Transition::default()
            }
            (QState::WantNo, true) => Transition::default(),
            (QState::No, _) => {
                entry.state = QState::WantYes;
                entry.queue_opposite = false;
                Transition {
                    emit: Some(Emission::Affirm),
                    ..Transition::default()
                }
            }
        }
    }

    /// User-initiated request to disable `dir`. Spec §4.3 "User asks to
    /// disable", symmetric to `request_enable`.
    pub fn request_disable(&mut self, dir: Direction) -> Transition {
        let entry = self.direction_mut(dir);
        match (entry.state, entry.queue_opposite) {
            (QState::No, _) => Transition::default(),
            (QState::WantNo, false) => Transition::default(),
            (QState::WantNo, true) => {
                entry.queue_opposite = false;
                Transition::default()
            }
            (QState::WantYes, false) => {
                entry.queue_opposite = true;
                Transition::default()
            }
            (QState::WantYes, true) => Transition::default(),
            (QState::Yes, _) => {
                entry.state = QState::WantNo;
                entry.queue_opposite = false;
                Transition {
                    emit: Some(Emission::Refuse),
                    run_disable_handler: true,
                    ..Transition::default()
                }
            }
        }
    }

    /// The peer sent an affirmative message on `dir` (`WILL` on the remote
    /// axis, `DO` on the local axis). `supported` is whether the option is
    /// supported in `dir` per the registry; only consulted from `No`.
    pub fn peer_affirm(&mut self, dir: Direction, supported: bool) -> Transition {
        let entry = self.direction_mut(dir);
        match (entry.state, entry.queue_opposite) {
            (QState::Yes, _) => {
                trace!(direction = %dir, "peer_affirm: redundant, already enabled");
                Transition::default()
            }
            (QState::WantYes, false) => {
                entry.state = QState::Yes;
                Transition {
                    run_enable_handler: true,
                    ..Transition::default()
                }
            }
            (QState::WantYes, true) => {
                entry.state = QState::WantNo;
                entry.queue_opposite = false;
                Transition {
                    emit: Some(Emission::Refuse),
                    ..Transition::default()
                }
            }
            (QState::WantNo, false) => {
                // Invalid per RFC 1143 (peer affirmed what we asked it to
                // stop); accept gracefully and converge to Yes anyway.
                warn!(direction = %dir, "peer_affirm: received while WANT_NO, converging anyway");
                entry.state = QState::Yes;
                Transition {
                    run_enable_handler: true,
                    ..Transition::default()
                }
            }
            (QState::WantNo, true) => {
                entry.state = QState::Yes;
                entry.queue_opposite = false;
                Transition {
                    run_enable_handler: true,
                    ..Transition::default()
                }
            }
            (QState::No, _) => {
                if supported {
                    entry.state = QState::Yes;
                    Transition {
                        emit: Some(Emission::Affirm),
                        run_enable_handler: true,
                        ..Transition::default()
                    }
                } else {
                    Transition {
                        emit: Some(Emission::Refuse),
                        ..Transition::default()
                    }
                }
            }
        }
    }

    /// The peer sent a negative message on `dir` (`WONT` on the remote
    /// axis, `DONT` on the local axis). Symmetric to `peer_affirm`.
    pub fn peer_refuse(&mut self, dir: Direction) -> Transition {
        let entry = self.direction_mut(dir);
        match (entry.state, entry.queue_opposite) {
            (QState::No, _) => {
                trace!(direction = %dir, "peer_refuse: redundant, already disabled");
                Transition::default()
            }
            (QState::WantNo, false) => {
                entry.state = QState::No;
                Transition::default()
            }
            (QState::WantNo, true) => {
                entry.state = QState::WantYes;
                entry.queue_opposite = false;
                Transition {
                    emit: Some(Emission::Affirm),
                    ..Transition::default()
                }
            }
            (QState::WantYes, false) => {
                entry.state = QState::No;
                Transition::default()
            }
            (QState::WantYes, true) => {
                entry.state = QState::No;
                entry.queue_opposite = false;
                Transition::default()
            }
            (QState::Yes, _) => {
                entry.state = QState::No;
                Transition {
                    emit: Some(Emission::Refuse),
                    run_disable_handler: true,
                    ..Transition::default()
                }
            }
        }
    }
}

/// A fixed-size table of [`OptionStatusRecord`]s, one per possible option
/// id. One table per connection (per FSM instance), not shared.
pub struct OptionStatusTable {
    records: Box<[OptionStatusRecord; 256]>,
}

impl std::fmt::Debug for OptionStatusTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionStatusTable").finish_non_exhaustive()
    }
}

impl Default for OptionStatusTable {
    fn default() -> Self {
        OptionStatusTable {
            records: Box::new([OptionStatusRecord::new(); 256]),
        }
    }
}

impl OptionStatusTable {
    /// A fresh table, every option at `{No, No}`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The record for `id`, mutable.
    pub fn record_mut(&mut self, id: u8) -> &mut OptionStatusRecord {
        &mut self.records[id as usize]
    }

    /// The record for `id`.
    pub fn record(&self, id: u8) -> &OptionStatusRecord {
        &self.records[id as usize]
    }

    /// Whether `dir` of option `id` is currently enabled.
    pub fn is_enabled(&self, id: u8, dir: Direction) -> bool {
        self.records[id as usize].is_enabled(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_enable_from_no_to_wantyes_emits_will() {
        let mut record = OptionStatusRecord::new();
        let transition = record.request_enable(Direction::Local);
        assert_eq!(transition.emit, Some(Emission::Affirm));
        assert_eq!(record.state(Direction::Local), QState::WantYes);
    }

    #[test]
    fn local_enable_recv_do_completes_to_yes() {
        let mut record = OptionStatusRecord::new();
        record.request_enable(Direction::Local);
        let transition = record.peer_affirm(Direction::Local, true);
        assert!(transition.emit.is_none());
        assert!(transition.run_enable_handler);
        assert_eq!(record.state(Direction::Local), QState::Yes);
    }

    #[test]
    fn local_enable_idempotent_when_yes() {
        let mut record = OptionStatusRecord::new();
        record.request_enable(Direction::Local);
        record.peer_affirm(Direction::Local, true);
        let transition = record.request_enable(Direction::Local);
        assert_eq!(transition, Transition::default());
    }

    #[test]
    fn local_disable_from_yes_to_wantno_emits_wont_and_runs_disable_handler() {
        let mut record = OptionStatusRecord::new();
        record.request_enable(Direction::Local);
        record.peer_affirm(Direction::Local, true);
        let transition = record.request_disable(Direction::Local);
        assert_eq!(transition.emit, Some(Emission::Refuse));
        assert!(transition.run_disable_handler);
        assert_eq!(record.state(Direction::Local), QState::WantNo);
    }

    #[test]
    fn remote_enable_from_no_to_wantyes_emits_do() {
        let mut record = OptionStatusRecord::new();
        let transition = record.request_enable(Direction::Remote);
        assert_eq!(transition.emit.unwrap().command_byte(Direction::Remote), DO);
    }

    #[test]
    fn peer_supported_request_from_no_accepts_and_emits_affirm() {
        let mut record = OptionStatusRecord::new();
        let transition = record.peer_affirm(Direction::Remote, true);
        assert_eq!(transition.emit, Some(Emission::Affirm));
        assert!(transition.run_enable_handler);
        assert_eq!(record.state(Direction::Remote), QState::Yes);
    }

    #[test]
    fn peer_unsupported_request_from_no_refuses() {
        let mut record = OptionStatusRecord::new();
        let transition = record.peer_affirm(Direction::Remote, false);
        assert_eq!(transition.emit, Some(Emission::Refuse));
        assert!(!transition.run_enable_handler);
        assert_eq!(record.state(Direction::Remote), QState::No);
    }

    #[test]
    fn simultaneous_request_converges_without_further_negotiation() {
        // S3: we request remote enable, then the peer independently sends
        // an affirmative (WILL) for the same option before seeing our DO.
        let mut record = OptionStatusRecord::new();
        let our_emit = record.request_enable(Direction::Remote);
        assert_eq!(our_emit.emit, Some(Emission::Affirm));
        assert_eq!(record.state(Direction::Remote), QState::WantYes);

        let transition = record.peer_affirm(Direction::Remote, true);
        assert!(transition.emit.is_none(), "no further negotiation bytes once WANT_YES/EMPTY converges");
        assert!(transition.run_enable_handler);
        assert_eq!(record.state(Direction::Remote), QState::Yes);
    }

    #[test]
    fn want_no_receiving_affirm_converges_gracefully() {
        let mut record = OptionStatusRecord::new();
        record.request_enable(Direction::Local);
        record.peer_affirm(Direction::Local, true);
        record.request_disable(Direction::Local);
        assert_eq!(record.state(Direction::Local), QState::WantNo);
        let transition = record.peer_affirm(Direction::Local, true);
        assert!(transition.run_enable_handler);
        assert_eq!(record.state(Direction::Local), QState::Yes);
    }

    #[test]
    fn queue_bit_replays_opposite_request_after_refusal() {
        let mut record = OptionStatusRecord::new();
        record.request_enable(Direction::Local);
        record.peer_affirm(Direction::Local, true);
        record.request_disable(Direction::Local);
        // a second disable request while WANT_NO/EMPTY queues nothing; but
        // an enable request after the disable queues the opposite bit.
        let transition = record.request_enable(Direction::Local);
        assert_eq!(transition, Transition::default());
        let peer_transition = record.peer_refuse(Direction::Local);
        assert_eq!(peer_transition.emit, Some(Emission::Affirm));
        assert_eq!(record.state(Direction::Local), QState::WantYes);
    }

    #[test]
    fn peer_refuse_from_yes_runs_disable_handler_and_confirms() {
        let mut record = OptionStatusRecord::new();
        record.request_enable(Direction::Local);
        record.peer_affirm(Direction::Local, true);
        let transition = record.peer_refuse(Direction::Local);
        assert_eq!(transition.emit, Some(Emission::Refuse));
        assert!(transition.run_disable_handler);
        assert_eq!(record.state(Direction::Local), QState::No);
    }

    #[test]
    fn status_table_indexes_by_id() {
        let mut table = OptionStatusTable::new();
        table.record_mut(5).request_enable(Direction::Local);
        assert!(!table.is_enabled(5, Direction::Local));
        assert_eq!(table.record(5).state(Direction::Local), QState::WantYes);
    }
}
