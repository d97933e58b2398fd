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

//! Per-option handler registry and tagged completions.
//!
//! Handlers are optional, application-supplied callbacks invoked when an
//! option transitions to enabled, transitions out of enabled, or when a
//! complete subnegotiation payload arrives for it. Each invocation produces
//! a [`TaggedCompletion`] so the stream can dispatch the result (write a
//! produced payload, or simply note completion) without losing track of
//! which kind of handler produced it.

use crate::qmethod::Direction;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Disambiguates what kind of handler produced a [`TaggedCompletion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// An option transitioned to enabled in some direction.
    Enablement,
    /// An option transitioned out of enabled in some direction.
    Disablement,
    /// A complete subnegotiation payload was delivered.
    Subnegotiation,
}

/// The result of running a registered handler: a kind tag plus whatever
/// payload (if any) the handler produced. Only subnegotiation handlers
/// produce a payload to write back; enablement and disablement handlers
/// are void-returning but still tagged, so dispatch sites never confuse an
/// enablement completion with a disablement one.
#[derive(Debug, Clone)]
pub struct TaggedCompletion {
    /// Which kind of handler produced this completion.
    pub kind: HandlerKind,
    /// A payload the handler wants written back to the peer, if any.
    pub payload: Option<Bytes>,
}

impl TaggedCompletion {
    fn void(kind: HandlerKind) -> Self {
        TaggedCompletion { kind, payload: None }
    }
}

type EnableFn = dyn Fn(Direction) -> BoxFuture<'static, ()> + Send + Sync;
type DisableFn = dyn Fn(Direction) -> BoxFuture<'static, ()> + Send + Sync;
type SubnegFn = dyn Fn(Bytes) -> BoxFuture<'static, Option<Bytes>> + Send + Sync;

/// The optional enablement/disablement/subnegotiation callbacks for one
/// option.
#[derive(Clone, Default)]
pub struct OptionHandlers {
    enable: Option<Arc<EnableFn>>,
    disable: Option<Arc<DisableFn>>,
    subnegotiate: Option<Arc<SubnegFn>>,
}

impl std::fmt::Debug for OptionHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionHandlers")
            .field("enable", &self.enable.is_some())
            .field("disable", &self.disable.is_some())
            .field("subnegotiate", &self.subnegotiate.is_some())
            .finish()
    }
}

impl OptionHandlers {
    /// No handlers registered.
    pub fn new() -> Self {
        OptionHandlers::default()
    }

    /// Register (or replace) the enablement handler.
    pub fn with_enable<F>(mut self, handler: F) -> Self
    where
        F: Fn(Direction) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.enable = Some(Arc::new(handler));
        self
    }

    /// Register (or replace) the disablement handler.
    pub fn with_disable<F>(mut self, handler: F) -> Self
    where
        F: Fn(Direction) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.disable = Some(Arc::new(handler));
        self
    }

    /// Register (or replace) the subnegotiation handler.
    pub fn with_subnegotiate<F>(mut self, handler: F) -> Self
    where
        F: Fn(Bytes) -> BoxFuture<'static, Option<Bytes>> + Send + Sync + 'static,
    {
        self.subnegotiate = Some(Arc::new(handler));
        self
    }

    /// Run the enablement handler, if registered.
    pub async fn run_enable(&self, dir: Direction) -> Option<TaggedCompletion> {
        let handler = self.enable.clone()?;
        handler(dir).await;
        Some(TaggedCompletion::void(HandlerKind::Enablement))
    }

    /// Run the disablement handler, if registered.
    pub async fn run_disable(&self, dir: Direction) -> Option<TaggedCompletion> {
        let handler = self.disable.clone()?;
        handler(dir).await;
        Some(TaggedCompletion::void(HandlerKind::Disablement))
    }

    /// Run the subnegotiation handler, if registered, with the captured
    /// payload.
    pub async fn run_subnegotiate(&self, payload: Bytes) -> Option<TaggedCompletion> {
        let handler = self.subnegotiate.clone()?;
        let produced = handler(payload).await;
        Some(TaggedCompletion {
            kind: HandlerKind::Subnegotiation,
            payload: produced,
        })
    }

    /// Whether a subnegotiation handler is registered for this option.
    pub fn has_subnegotiate(&self) -> bool {
        self.subnegotiate.is_some()
    }
}

/// A fixed-size table of per-option handler sets, one per connection.
#[derive(Debug, Default)]
pub struct OptionHandlerTable {
    handlers: std::collections::HashMap<u8, OptionHandlers>,
}

impl OptionHandlerTable {
    /// An empty table.
    pub fn new() -> Self {
        OptionHandlerTable::default()
    }

    /// Register handlers for `id`, replacing any previously registered set.
    pub fn register(&mut self, id: u8, handlers: OptionHandlers) {
        self.handlers.insert(id, handlers);
    }

    /// Remove any handlers registered for `id`.
    pub fn unregister(&mut self, id: u8) {
        self.handlers.remove(&id);
    }

    /// The handler set for `id`, if any are registered.
    pub fn get(&self, id: u8) -> Option<&OptionHandlers> {
        self.handlers.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn enable_handler_runs_and_tags_enablement() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let handlers = OptionHandlers::new().with_enable(move |_dir| {
            let calls = calls_clone.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        });
        let completion = handlers.run_enable(Direction::Local).await.unwrap();
        assert_eq!(completion.kind, HandlerKind::Enablement);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subnegotiate_handler_can_produce_a_payload() {
        let handlers = OptionHandlers::new()
            .with_subnegotiate(|payload| Box::pin(async move { Some(payload) }));
        let completion = handlers
            .run_subnegotiate(Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert_eq!(completion.kind, HandlerKind::Subnegotiation);
        assert_eq!(completion.payload.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn missing_handler_returns_none() {
        let handlers = OptionHandlers::new();
        assert!(handlers.run_enable(Direction::Local).await.is_none());
    }

    #[test]
    fn table_register_and_unregister() {
        let mut table = OptionHandlerTable::new();
        table.register(5, OptionHandlers::new());
        assert!(table.get(5).is_some());
        table.unregister(5);
        assert!(table.get(5).is_none());
    }
}
