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

//! The Synch / urgent-data tracker (spec component, §4.8).
//!
//! A lock-free, three-state atomic. The urgent-data notification and the
//! in-band `DM` byte arrive on different continuations (one from the
//! transport's out-of-band receive, one from the ordinary byte stream), so
//! this is the one piece of per-connection state with genuine cross-thread
//! concurrency.

use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;

const NONE: u8 = 0;
const URGENT_PENDING: u8 = 1;
const DM_SEEN_FIRST: u8 = 2;

/// The three states of the urgent-data tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgentState {
    /// No urgent data in flight.
    None,
    /// The transport signalled urgent data; the `DM` byte has not yet been
    /// observed in the byte stream.
    UrgentPending,
    /// `DM` was observed without a prior urgent signal; already synched.
    DmSeenFirst,
}

impl From<u8> for UrgentState {
    fn from(value: u8) -> Self {
        match value {
            URGENT_PENDING => UrgentState::UrgentPending,
            DM_SEEN_FIRST => UrgentState::DmSeenFirst,
            _ => UrgentState::None,
        }
    }
}

/// A shared, cloneable handle onto one connection's urgent-data state.
#[derive(Debug, Default)]
pub struct UrgentTracker {
    state: AtomicU8,
}

impl UrgentTracker {
    /// A fresh tracker in state `None`.
    pub fn new() -> Self {
        UrgentTracker {
            state: AtomicU8::new(NONE),
        }
    }

    /// The current state.
    pub fn state(&self) -> UrgentState {
        UrgentState::from(self.state.load(Ordering::Acquire))
    }

    /// Whether the tracker is currently suppressing data-byte forwarding.
    pub fn is_suppressing(&self) -> bool {
        self.state() == UrgentState::UrgentPending
    }

    /// The transport signalled urgent data.
    pub fn saw_urgent(&self) {
        loop {
            let current = self.state.load(Ordering::Acquire);
            let next = match UrgentState::from(current) {
                UrgentState::None => URGENT_PENDING,
                UrgentState::DmSeenFirst => NONE,
                UrgentState::UrgentPending => {
                    debug!("saw_urgent called while already URGENT_PENDING: missing DM or duplicate wait");
                    current
                }
            };
            if self
                .state
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }

    /// A `DM` byte was observed in the byte stream.
    pub fn saw_data_mark(&self) {
        loop {
            let current = self.state.load(Ordering::Acquire);
            let next = match UrgentState::from(current) {
                UrgentState::UrgentPending => NONE,
                UrgentState::None => DM_SEEN_FIRST,
                UrgentState::DmSeenFirst => {
                    debug!("saw_data_mark called while already DM_SEEN_FIRST: duplicate DM, benign");
                    current
                }
            };
            if self
                .state
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgent_then_data_mark_returns_to_none() {
        let tracker = UrgentTracker::new();
        tracker.saw_urgent();
        assert_eq!(tracker.state(), UrgentState::UrgentPending);
        assert!(tracker.is_suppressing());
        tracker.saw_data_mark();
        assert_eq!(tracker.state(), UrgentState::None);
        assert!(!tracker.is_suppressing());
    }

    #[test]
    fn data_mark_without_prior_urgent_is_dm_seen_first() {
        let tracker = UrgentTracker::new();
        tracker.saw_data_mark();
        assert_eq!(tracker.state(), UrgentState::DmSeenFirst);
        tracker.saw_urgent();
        assert_eq!(tracker.state(), UrgentState::None);
    }

    #[test]
    fn duplicate_urgent_signal_is_benign() {
        let tracker = UrgentTracker::new();
        tracker.saw_urgent();
        tracker.saw_urgent();
        assert_eq!(tracker.state(), UrgentState::UrgentPending);
    }
}
