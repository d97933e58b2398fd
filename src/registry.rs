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

//! Option descriptors and the process-wide option registry.

use crate::consts::option;
use dashmap::DashMap;

/// The default per-option subnegotiation payload cap when a descriptor does
/// not specify one. `0` on a descriptor means unlimited.
pub const DEFAULT_MAX_SUBNEGOTIATION_SIZE: usize = 1024;

/// Immutable-after-construction metadata for one Telnet option.
///
/// Descriptors may be upserted to memoize a default for an option first seen
/// during subnegotiation, but once an option is in use its support
/// predicates must not change, or the RFC 1143 invariants the Q-Method
/// relies on will break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDescriptor {
    /// The option id, `0x00..=0xFF`.
    pub id: u8,
    /// A human-readable name, for logging and STATUS-adjacent diagnostics.
    pub name: &'static str,
    /// Whether this engine will accept enabling this option locally.
    pub local_supported: bool,
    /// Whether this engine will accept enabling this option remotely.
    pub remote_supported: bool,
    /// Whether this option carries a subnegotiation payload.
    pub supports_subnegotiation: bool,
    /// Maximum subnegotiation payload size in bytes. `0` means unlimited.
    pub max_subnegotiation_size: usize,
}

impl OptionDescriptor {
    /// A descriptor for an option not present in the registry: unsupported
    /// in both directions, no subnegotiation.
    pub fn unknown(id: u8) -> Self {
        OptionDescriptor {
            id,
            name: option_name(id),
            local_supported: false,
            remote_supported: false,
            supports_subnegotiation: false,
            max_subnegotiation_size: 0,
        }
    }

    /// Convenience constructor for a simple flag option (no subnegotiation).
    pub const fn flag(id: u8, name: &'static str, local_supported: bool, remote_supported: bool) -> Self {
        OptionDescriptor {
            id,
            name,
            local_supported,
            remote_supported,
            supports_subnegotiation: false,
            max_subnegotiation_size: 0,
        }
    }

    /// Convenience constructor for an option that carries subnegotiation.
    pub const fn with_subnegotiation(
        id: u8,
        name: &'static str,
        local_supported: bool,
        remote_supported: bool,
        max_subnegotiation_size: usize,
    ) -> Self {
        OptionDescriptor {
            id,
            name,
            local_supported,
            remote_supported,
            supports_subnegotiation: true,
            max_subnegotiation_size,
        }
    }
}

/// `true` if `list` is strictly sorted by `id`. `const fn` so it can run at
/// compile time over [`DEFAULT_SEED`]; `slice::windows` is unavailable in
/// const contexts, hence the manual index walk.
const fn is_sorted_by_id(list: &[OptionDescriptor]) -> bool {
    let mut i = 1;
    while i < list.len() {
        if list[i - 1].id >= list[i].id {
            return false;
        }
        i += 1;
    }
    true
}

/// The descriptors [`OptionRegistry::with_defaults`] seeds: BINARY,
/// SUPPRESS-GO-AHEAD, and STATUS.
const DEFAULT_SEED: &[OptionDescriptor] = &[
    OptionDescriptor::flag(option::BINARY, "BINARY", true, true),
    OptionDescriptor::flag(option::SUPPRESS_GO_AHEAD, "SUPPRESS-GO-AHEAD", true, true),
    OptionDescriptor::with_subnegotiation(
        option::STATUS,
        "STATUS",
        true,
        true,
        DEFAULT_MAX_SUBNEGOTIATION_SIZE,
    ),
];

const _: () = assert!(is_sorted_by_id(DEFAULT_SEED), "DEFAULT_SEED must be strictly sorted by id");

/// A concurrent, process-wide-by-default registry of option descriptors.
///
/// Reads are lock-free snapshots (`DashMap::get` takes only a per-shard
/// read lock, never blocking on other readers); `upsert` takes the shard's
/// write lock. If `has(id)` observes `true` before a concurrent `upsert`,
/// a subsequent `get(id)` is guaranteed to return *some* descriptor, never
/// `None` — `upsert` only ever replaces an entry, never removes one.
#[derive(Debug, Default)]
pub struct OptionRegistry {
    descriptors: DashMap<u8, OptionDescriptor>,
}

impl OptionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        OptionRegistry {
            descriptors: DashMap::new(),
        }
    }

    /// Build a registry from an initial list, sorted by id.
    ///
    /// `initial` is an arbitrary runtime slice, so its sortedness can only
    /// be checked here at runtime: panics in debug builds if it is not
    /// sorted by `id`. [`OptionRegistry::with_defaults`] seeds from
    /// [`DEFAULT_SEED`], whose sortedness is instead checked once at
    /// compile time (`const _: () = assert!(...)` above), since that list
    /// is statically known.
    pub fn seeded(initial: &[OptionDescriptor]) -> Self {
        debug_assert!(
            initial.windows(2).all(|pair| pair[0].id < pair[1].id),
            "option registry seed must be strictly sorted by id"
        );
        let descriptors = DashMap::new();
        for descriptor in initial {
            descriptors.insert(descriptor.id, descriptor.clone());
        }
        OptionRegistry { descriptors }
    }

    /// The registry seeded with BINARY, SUPPRESS-GO-AHEAD, and STATUS —
    /// the minimum spec.md §6 names as always present.
    pub fn with_defaults() -> Self {
        Self::seeded(DEFAULT_SEED)
    }

    /// Look up a descriptor by id.
    pub fn get(&self, id: u8) -> Option<OptionDescriptor> {
        self.descriptors.get(&id).map(|entry| entry.clone())
    }

    /// Whether an id is registered.
    pub fn has(&self, id: u8) -> bool {
        self.descriptors.contains_key(&id)
    }

    /// Insert or replace a descriptor, returning the previous one if any.
    pub fn upsert(&self, descriptor: OptionDescriptor) -> Option<OptionDescriptor> {
        self.descriptors.insert(descriptor.id, descriptor)
    }

    /// Iterate every registered descriptor's id, in ascending order. Used
    /// by the STATUS handler to build a deterministic `IS` listing.
    pub fn ids_ascending(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.descriptors.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }
}

/// A best-effort human name for a well-known option id, for logging.
pub fn option_name(id: u8) -> &'static str {
    match id {
        option::BINARY => "BINARY",
        option::ECHO => "ECHO",
        option::RECONNECTION => "RECONNECTION",
        option::SUPPRESS_GO_AHEAD => "SUPPRESS-GO-AHEAD",
        option::APPROX_MESSAGE_SIZE => "APPROX-MESSAGE-SIZE",
        option::STATUS => "STATUS",
        option::TIMING_MARK => "TIMING-MARK",
        option::RCTE => "RCTE",
        option::OUT_LINE_WIDTH => "NAOL",
        option::OUT_PAGE_SIZE => "NAOP",
        option::NAOCRD => "NAOCRD",
        option::NAOHTS => "NAOHTS",
        option::NAOHTD => "NAOHTD",
        option::NAOFFD => "NAOFFD",
        option::NAOVTS => "NAOVTS",
        option::NAOVTD => "NAOVTD",
        option::NAOLFD => "NAOLFD",
        option::XASCII => "EXTEND-ASCII",
        option::LOGOUT => "LOGOUT",
        option::BYTE_MACRO => "BM",
        option::DET => "DET",
        option::SUPDUP => "SUPDUP",
        option::SUPDUP_OUTPUT => "SUPDUP-OUTPUT",
        option::SEND_LOCATION => "SNDLOC",
        option::TERMINAL_TYPE => "TTYPE",
        option::END_OF_RECORD => "END-OF-RECORD",
        option::TUID => "TUID",
        option::OUTMRK => "OUTMRK",
        option::TTYLOC => "TTYLOC",
        option::OPT_3270_REGIME => "3270-REGIME",
        option::X3_PAD => "X.3-PAD",
        option::NAWS => "NAWS",
        option::TSPEED => "TSPEED",
        option::LFLOW => "LFLOW",
        option::LINEMODE => "LINEMODE",
        option::XDISPLOC => "XDISPLOC",
        option::ENVIRONMENT => "ENVIRON",
        option::AUTHENTICATION => "AUTHENTICATION",
        option::ENCRYPTION => "ENCRYPT",
        option::NEW_ENVIRONMENT => "NEW-ENVIRON",
        option::TN3270E => "TN3270E",
        option::XAUTH => "XAUTH",
        option::CHARSET => "CHARSET",
        option::TRSP => "RSP",
        option::CPCO => "COM-PORT-CONTROL",
        option::TSLE => "SUPPRESS-LOCAL-ECHO",
        option::START_TLS => "START-TLS",
        option::KERMIT => "KERMIT",
        option::SEND_URL => "SEND-URL",
        option::FORWARD_X => "FORWARD-X",
        option::MSDP => "MSDP",
        option::MSSP => "MSSP",
        option::COMPRESS1 => "COMPRESS",
        option::COMPRESS2 => "COMPRESS2",
        option::ZMP => "ZMP",
        option::PRAGMA_LOGON => "PRAGMA-LOGON",
        option::SSPI_LOGON => "SSPI-LOGON",
        option::PRAGMA_HEARTBEAT => "PRAGMA-HEARTBEAT",
        option::GMCP => "GMCP",
        option::EXOPL => "EXOPL",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_seeded() {
        let registry = OptionRegistry::with_defaults();
        assert!(registry.has(option::BINARY));
        assert!(registry.has(option::SUPPRESS_GO_AHEAD));
        assert!(registry.has(option::STATUS));
        assert!(!registry.has(0x2A));
    }

    #[test]
    fn upsert_replaces_existing() {
        let registry = OptionRegistry::with_defaults();
        let replaced = registry.upsert(OptionDescriptor::flag(option::BINARY, "BINARY", false, false));
        assert!(replaced.is_some());
        assert_eq!(registry.get(option::BINARY).unwrap().local_supported, false);
    }

    #[test]
    fn has_then_get_never_sees_none_after_concurrent_upsert() {
        let registry = OptionRegistry::with_defaults();
        assert!(registry.has(option::STATUS));
        registry.upsert(OptionDescriptor::flag(option::STATUS, "STATUS", true, true));
        assert!(registry.get(option::STATUS).is_some());
    }

    #[test]
    fn unregistered_option_has_no_support() {
        let descriptor = OptionDescriptor::unknown(0x2A);
        assert!(!descriptor.local_supported);
        assert!(!descriptor.remote_supported);
    }

    #[test]
    fn is_sorted_by_id_detects_misordering() {
        assert!(is_sorted_by_id(DEFAULT_SEED));
        let unsorted = [
            OptionDescriptor::flag(option::STATUS, "STATUS", true, true),
            OptionDescriptor::flag(option::BINARY, "BINARY", true, true),
        ];
        assert!(!is_sorted_by_id(&unsorted));
    }

    #[test]
    fn ids_ascending_is_sorted() {
        let registry = OptionRegistry::with_defaults();
        let ids = registry.ids_ascending();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
