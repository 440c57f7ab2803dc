//! Typed publish/subscribe core.
//!
//! An [`EventEmitter`] keeps, per event name, an ordered list of async
//! listeners. [`EventEmitter::emit`] awaits them one after another in
//! registration order and stops at the first failure.

use std::{
    borrow::{Borrow, Cow},
    collections::HashMap,
    fmt,
    future::Future,
    marker::PhantomData,
    pin::Pin,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::domain::{context::CommandContext, error::HookError};

/// Boxed future returned by listeners and middleware steps.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ============================================================================
// Event sets
// ============================================================================

/// A known set of lifecycle events together with the payload its listeners
/// receive.
///
/// The set is advisory: an emitter accepts listeners for any name, it only
/// uses the set to tell known events from custom ones.
pub trait Events: Send + Sync + 'static {
    /// Payload handed (mutably) to every listener of this set.
    type Payload: Send + 'static;

    /// Event names belonging to this set.
    const NAMES: &'static [&'static str];
}

/// The base event set every application understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultEvents;

impl Events for DefaultEvents {
    type Payload = CommandContext;

    const NAMES: &'static [&'static str] = &[
        "install",
        "parse",
        "before.new",
        "new",
        "after.new",
        "before.build",
        "build",
        "after.build",
        "before.deploy",
        "deploy",
        "after.deploy",
        "before.run",
        "run",
        "after.run",
    ];
}

/// Name of a lifecycle moment, e.g. `"before.build"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(Cow<'static, str>);

impl EventName {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for EventName {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Handle returned by [`EventEmitter::on`], used to unregister a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Emitter
// ============================================================================

type ListenerFn<P> = dyn for<'a> Fn(&'a mut P) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync;

struct Listener<P> {
    id: ListenerId,
    /// Registration sequence number, shared counter per emitter.
    seq: u64,
    callback: Arc<ListenerFn<P>>,
}

// Manual impl: deriving would require `P: Clone`.
impl<P> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            seq: self.seq,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Event emitter shared by every plugin of one application run.
pub struct EventEmitter<E: Events = DefaultEvents> {
    listeners: RwLock<HashMap<EventName, Vec<Listener<E::Payload>>>>,
    next_seq: AtomicU64,
    _events: PhantomData<fn() -> E>,
}

impl<E: Events> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            _events: PhantomData,
        }
    }

    /// `true` if `name` belongs to `E` or to the default event set.
    pub fn is_known(name: &str) -> bool {
        E::NAMES.iter().chain(DefaultEvents::NAMES).any(|known| *known == name)
    }

    /// Register `listener` for `event`.
    ///
    /// Never fails. Unknown event names are accepted so plugins can agree on
    /// custom events.
    pub fn on<F>(&self, event: impl Into<EventName>, listener: F) -> ListenerId
    where
        F: for<'a> Fn(&'a mut E::Payload) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        let event = event.into();
        if !Self::is_known(event.as_str()) {
            debug!(event = %event, "Registering listener for custom event");
        }

        let id = ListenerId::new();
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners.entry(event.clone()).or_default().push(Listener {
            id,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            callback: Arc::new(listener),
        });
        trace!(event = %event, listener = %id, "Listener registered");
        id
    }

    /// Remove a previously registered listener. Returns `false` if it was
    /// not registered for `event`.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = listeners.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        before != list.len()
    }

    /// Invoke every listener of `event` in registration order, awaiting each
    /// before starting the next.
    ///
    /// The listener list is captured when the call starts: listeners added
    /// while it runs fire on the next emit only. The first failing listener
    /// aborts the call and its error is returned.
    #[instrument(skip_all, fields(event = %event))]
    pub async fn emit(&self, event: &str, payload: &mut E::Payload) -> Result<(), HookError> {
        let snapshot = self.snapshot(event);
        if snapshot.is_empty() {
            trace!("No listeners");
            return Ok(());
        }

        debug!(listeners = snapshot.len(), "Emitting event");
        for (index, listener) in snapshot.iter().enumerate() {
            (listener.callback)(&mut *payload)
                .await
                .map_err(|source| HookError::ListenerFailure {
                    event: event.to_string(),
                    index,
                    source,
                })?;
        }
        Ok(())
    }

    /// Number of listeners currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Event names that currently have at least one listener, sorted.
    pub fn event_names(&self) -> Vec<EventName> {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = listeners
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Position in the registration sequence; see [`Self::discard_from`].
    pub(crate) fn mark(&self) -> u64 {
        self.next_seq.load(Ordering::Relaxed)
    }

    /// Drop every listener registered at or after `mark`. Returns how many
    /// were removed.
    pub(crate) fn discard_from(&self, mark: u64) -> usize {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;
        for list in listeners.values_mut() {
            let before = list.len();
            list.retain(|l| l.seq < mark);
            removed += before - list.len();
        }
        removed
    }

    fn snapshot(&self, event: &str) -> Vec<Listener<E::Payload>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .cloned()
            .unwrap_or_default()
    }
}

impl<E: Events> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Events> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("events", &self.event_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct LogEvents;

    impl Events for LogEvents {
        type Payload = Vec<String>;
        const NAMES: &'static [&'static str] = &["init"];
    }

    fn push_a(log: &mut Vec<String>) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            log.push("a".into());
            Ok(())
        })
    }

    fn push_b(log: &mut Vec<String>) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            log.push("b".into());
            Ok(())
        })
    }

    fn fail(_log: &mut Vec<String>) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Err(anyhow::anyhow!("listener exploded")) })
    }

    #[tokio::test]
    async fn listeners_fire_in_registration_order() {
        let emitter = EventEmitter::<LogEvents>::new();
        emitter.on("init", push_a);
        emitter.on("init", push_b);

        let mut log = Vec::new();
        emitter.emit("init", &mut log).await.unwrap();

        assert_eq!(log, vec!["a", "b"]);
    }

    #[test]
    fn emit_without_listeners_is_a_no_op() {
        let emitter = EventEmitter::<LogEvents>::new();
        let mut log = vec!["untouched".to_string()];

        tokio_test::block_on(emitter.emit("nobody.listens", &mut log)).unwrap();

        assert_eq!(log, vec!["untouched"]);
    }

    #[tokio::test]
    async fn failing_listener_stops_dispatch() {
        let emitter = EventEmitter::<LogEvents>::new();
        emitter.on("init", push_a);
        emitter.on("init", fail);
        emitter.on("init", push_b);

        let mut log = Vec::new();
        let err = emitter.emit("init", &mut log).await.unwrap_err();

        assert_eq!(log, vec!["a"]);
        match err {
            HookError::ListenerFailure { event, index, source } => {
                assert_eq!(event, "init");
                assert_eq!(index, 1);
                assert_eq!(source.to_string(), "listener exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn listener_added_during_emit_waits_for_next_call() {
        let emitter = Arc::new(EventEmitter::<LogEvents>::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        let inner = Arc::clone(&emitter);
        let counter = Arc::clone(&late_calls);
        emitter.on("init", move |log: &mut Vec<String>| {
            let counter = Arc::clone(&counter);
            inner.on("init", move |_log: &mut Vec<String>| {
                let counter = Arc::clone(&counter);
                Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            });
            Box::pin(async move {
                log.push("registrar".into());
                Ok(())
            })
        });

        let mut log = Vec::new();
        emitter.emit("init", &mut log).await.unwrap();
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(emitter.listener_count("init"), 2);

        emitter.emit("init", &mut log).await.unwrap();
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn off_removes_only_the_given_listener() {
        let emitter = EventEmitter::<LogEvents>::new();
        let a = emitter.on("init", push_a);
        emitter.on("init", push_b);

        assert!(emitter.off("init", a));
        assert!(!emitter.off("init", a));
        assert!(!emitter.off("other", a));

        let mut log = Vec::new();
        emitter.emit("init", &mut log).await.unwrap();
        assert_eq!(log, vec!["b"]);
    }

    #[test]
    fn known_events_include_defaults_and_extensions() {
        assert!(EventEmitter::<LogEvents>::is_known("init"));
        assert!(EventEmitter::<LogEvents>::is_known("after.new"));
        assert!(!EventEmitter::<LogEvents>::is_known("after.party"));
    }

    #[test]
    fn event_names_are_sorted_and_skip_empty_lists() {
        let emitter = EventEmitter::<LogEvents>::new();
        emitter.on("zeta", push_a);
        let id = emitter.on("alpha", push_a);
        emitter.on("init", push_b);
        emitter.off("alpha", id);

        let names: Vec<String> = emitter.event_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["init", "zeta"]);
    }
}
