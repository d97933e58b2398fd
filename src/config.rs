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

//! Process-wide engine configuration (spec component 8).

use crate::qmethod::Direction;
use crate::registry::OptionRegistry;
use std::sync::Arc;

/// Default reply text for `IAC AYT`.
pub const DEFAULT_AYT_REPLY: &str = "\r\n[Yes]\r\n";

/// Decides whether an option absent from the registry should still be
/// accepted in the given direction. Consulted only when no
/// [`crate::registry::OptionDescriptor`] is registered for the option id;
/// returning `true` admits the option as supported for this negotiation,
/// `false` preserves the default refusal.
pub type UnknownOptionHandler = dyn Fn(u8, Direction) -> bool + Send + Sync;

/// Configuration shared by the engine's default, process-wide setup.
///
/// Per spec.md §9 "Global configuration", a multi-tenant embedder may
/// instead construct a distinct `EngineConfig` per connection and hand it
/// to [`crate::stream::TelnetStream::with_config`] rather than relying on
/// `EngineConfig::default()`'s process-wide registry.
#[derive(Clone)]
pub struct EngineConfig {
    registry: Arc<OptionRegistry>,
    ayt_reply: String,
    unknown_option_handler: Option<Arc<UnknownOptionHandler>>,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("ayt_reply", &self.ayt_reply)
            .finish_non_exhaustive()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            registry: Arc::new(OptionRegistry::with_defaults()),
            ayt_reply: DEFAULT_AYT_REPLY.to_string(),
            unknown_option_handler: None,
        }
    }
}

impl EngineConfig {
    /// A configuration seeded with BINARY, SUPPRESS-GO-AHEAD, and STATUS.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already-constructed registry instead of the default seed.
    pub fn with_registry(mut self, registry: Arc<OptionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Override the `IAC AYT` reply text.
    pub fn with_ayt_reply(mut self, reply: impl Into<String>) -> Self {
        self.ayt_reply = reply.into();
        self
    }

    /// Install a policy for options absent from the registry. Without one,
    /// an unregistered option is always refused.
    pub fn with_unknown_option_handler(
        mut self,
        handler: impl Fn(u8, Direction) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.unknown_option_handler = Some(Arc::new(handler));
        self
    }

    /// The configured option registry, shared.
    pub fn registry(&self) -> Arc<OptionRegistry> {
        self.registry.clone()
    }

    /// The configured AYT reply text.
    pub fn ayt_reply(&self) -> &str {
        &self.ayt_reply
    }

    /// The configured unknown-option policy, if any.
    pub fn unknown_option_handler(&self) -> Option<Arc<UnknownOptionHandler>> {
        self.unknown_option_handler.clone()
    }
}
