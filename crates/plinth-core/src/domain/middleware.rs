//! Named, ordered middleware slots.
//!
//! A [`MiddlewareCollection`] declares its slots once, at construction.
//! Plugins append steps to existing slots; the host later runs a slot and
//! every step gets its turn on the shared, mutable context.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::{debug, instrument, trace};

use crate::domain::{error::HookError, event::BoxFuture};

/// Slots declared by [`MiddlewareCollection::with_default_slots`].
pub const DEFAULT_SLOTS: &[&str] = &[
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

/// Priority given to steps registered through [`MiddlewareCollection::use_step`].
pub const DEFAULT_PRIORITY: i32 = 0;

/// What a step tells the collection once it is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Hand the context to the next step.
    Continue,
    /// Skip the remaining steps of this slot. Not an error.
    Halt,
}

/// Result of a successful [`MiddlewareCollection::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step ran.
    Completed { steps: usize },
    /// Step `step` (zero-based) asked to halt; later steps did not run.
    Halted { step: usize },
}

impl RunOutcome {
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted { .. })
    }
}

type StepFn<C> = dyn for<'a> Fn(&'a mut C) -> BoxFuture<'a, anyhow::Result<StepOutcome>> + Send + Sync;

struct Step<C> {
    priority: i32,
    seq: u64,
    callback: Arc<StepFn<C>>,
}

impl<C> Clone for Step<C> {
    fn clone(&self) -> Self {
        Self {
            priority: self.priority,
            seq: self.seq,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Registry of pipeline stages, each an ordered list of steps.
///
/// Steps run by ascending priority; equal priorities keep registration order.
pub struct MiddlewareCollection<C> {
    order: Vec<String>,
    slots: RwLock<HashMap<String, Vec<Step<C>>>>,
    next_seq: AtomicU64,
}

impl<C: Send + 'static> MiddlewareCollection<C> {
    /// Create a collection with exactly the given slots.
    pub fn new<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order: Vec<String> = Vec::new();
        for slot in slots {
            let slot = slot.into();
            if !order.contains(&slot) {
                order.push(slot);
            }
        }
        let slots = order.iter().map(|s| (s.clone(), Vec::new())).collect();
        Self {
            order,
            slots: RwLock::new(slots),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Create a collection with the lifecycle slots in [`DEFAULT_SLOTS`].
    pub fn with_default_slots() -> Self {
        Self::new(DEFAULT_SLOTS.iter().copied())
    }

    /// Slot names in declaration order.
    pub fn slots(&self) -> &[String] {
        &self.order
    }

    pub fn has_slot(&self, slot: &str) -> bool {
        self.order.iter().any(|s| s == slot)
    }

    /// Append `step` to `slot` with [`DEFAULT_PRIORITY`].
    pub fn use_step<F>(&self, slot: &str, step: F) -> Result<(), HookError>
    where
        F: for<'a> Fn(&'a mut C) -> BoxFuture<'a, anyhow::Result<StepOutcome>>
            + Send
            + Sync
            + 'static,
    {
        self.use_step_with_priority(slot, DEFAULT_PRIORITY, step)
    }

    /// Insert `step` into `slot`, after every step whose priority is lower
    /// than or equal to `priority`.
    ///
    /// Fails with [`HookError::UnknownSlot`] when `slot` was not declared.
    pub fn use_step_with_priority<F>(
        &self,
        slot: &str,
        priority: i32,
        step: F,
    ) -> Result<(), HookError>
    where
        F: for<'a> Fn(&'a mut C) -> BoxFuture<'a, anyhow::Result<StepOutcome>>
            + Send
            + Sync
            + 'static,
    {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let Some(steps) = slots.get_mut(slot) else {
            return Err(self.unknown_slot(slot));
        };

        let position = steps.partition_point(|s| s.priority <= priority);
        steps.insert(
            position,
            Step {
                priority,
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                callback: Arc::new(step),
            },
        );
        trace!(slot, priority, position, "Step registered");
        Ok(())
    }

    /// Run every step of `slot` in order, each awaiting the previous one.
    ///
    /// The step list is captured when the call starts. A step returning
    /// [`StepOutcome::Halt`] ends the run early with the context as mutated
    /// so far; a failing step ends it with [`HookError::StepFailure`].
    #[instrument(skip_all, fields(slot = %slot))]
    pub async fn run(&self, slot: &str, ctx: &mut C) -> Result<RunOutcome, HookError> {
        let snapshot = self.snapshot(slot)?;
        debug!(steps = snapshot.len(), "Running middleware slot");

        for (index, step) in snapshot.iter().enumerate() {
            let outcome = (step.callback)(&mut *ctx)
                .await
                .map_err(|source| HookError::StepFailure {
                    slot: slot.to_string(),
                    index,
                    source,
                })?;

            if outcome == StepOutcome::Halt {
                debug!(step = index, "Step halted the slot");
                return Ok(RunOutcome::Halted { step: index });
            }
        }

        Ok(RunOutcome::Completed {
            steps: snapshot.len(),
        })
    }

    /// Number of steps registered in `slot`, `None` if undeclared.
    pub fn step_count(&self, slot: &str) -> Option<usize> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(slot)
            .map(Vec::len)
    }

    pub(crate) fn mark(&self) -> u64 {
        self.next_seq.load(Ordering::Relaxed)
    }

    /// Drop every step registered at or after `mark`, in any slot.
    pub(crate) fn discard_from(&self, mark: u64) -> usize {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;
        for steps in slots.values_mut() {
            let before = steps.len();
            steps.retain(|s| s.seq < mark);
            removed += before - steps.len();
        }
        removed
    }

    fn snapshot(&self, slot: &str) -> Result<Vec<Step<C>>, HookError> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(slot)
            .cloned()
            .ok_or_else(|| self.unknown_slot(slot))
    }

    fn unknown_slot(&self, slot: &str) -> HookError {
        HookError::UnknownSlot {
            slot: slot.to_string(),
            available: self.order.clone(),
        }
    }
}

impl<C> fmt::Debug for MiddlewareCollection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareCollection")
            .field("slots", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> MiddlewareCollection<Vec<String>> {
        MiddlewareCollection::new(["validate", "build"])
    }

    fn halt(_ctx: &mut Vec<String>) -> BoxFuture<'_, anyhow::Result<StepOutcome>> {
        Box::pin(async move { Ok(StepOutcome::Halt) })
    }

    fn push_x(ctx: &mut Vec<String>) -> BoxFuture<'_, anyhow::Result<StepOutcome>> {
        Box::pin(async move {
            ctx.push("x".into());
            Ok(StepOutcome::Continue)
        })
    }

    fn step<F>(f: F) -> F
    where
        F: for<'a> Fn(&'a mut Vec<String>) -> BoxFuture<'a, anyhow::Result<StepOutcome>>,
    {
        f
    }

    fn push(
        tag: &'static str,
    ) -> impl for<'a> Fn(&'a mut Vec<String>) -> BoxFuture<'a, anyhow::Result<StepOutcome>>
    + Send
    + Sync
    + 'static {
        step(move |ctx: &mut Vec<String>| {
            Box::pin(async move {
                ctx.push(tag.to_string());
                Ok(StepOutcome::Continue)
            })
        })
    }

    #[tokio::test]
    async fn halting_step_prevents_later_steps() {
        let mw = collection();
        mw.use_step("validate", halt).unwrap();
        mw.use_step("validate", push_x).unwrap();

        let mut ctx = vec!["input".to_string()];
        let outcome = mw.run("validate", &mut ctx).await.unwrap();

        assert_eq!(outcome, RunOutcome::Halted { step: 0 });
        assert_eq!(ctx, vec!["input"]);
    }

    #[tokio::test]
    async fn halt_keeps_mutations_made_before_it() {
        let mw = collection();
        mw.use_step("build", push("first")).unwrap();
        mw.use_step("build", halt).unwrap();
        mw.use_step("build", push("never")).unwrap();

        let mut ctx = Vec::new();
        let outcome = mw.run("build", &mut ctx).await.unwrap();

        assert!(outcome.is_halted());
        assert_eq!(ctx, vec!["first"]);
    }

    #[tokio::test]
    async fn steps_run_in_registration_order() {
        let mw = collection();
        for tag in ["one", "two", "three"] {
            mw.use_step("build", push(tag)).unwrap();
        }

        let mut ctx = Vec::new();
        let outcome = mw.run("build", &mut ctx).await.unwrap();

        assert_eq!(outcome, RunOutcome::Completed { steps: 3 });
        assert_eq!(ctx, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn priority_orders_before_registration() {
        let mw = collection();
        mw.use_step("build", push("default-1")).unwrap();
        mw.use_step_with_priority("build", 10, push("late")).unwrap();
        mw.use_step_with_priority("build", -5, push("early")).unwrap();
        mw.use_step("build", push("default-2")).unwrap();

        let mut ctx = Vec::new();
        mw.run("build", &mut ctx).await.unwrap();

        assert_eq!(ctx, vec!["early", "default-1", "default-2", "late"]);
    }

    #[test]
    fn use_on_undeclared_slot_fails_immediately() {
        let mw = collection();
        let err = mw.use_step("deploy", push_x).unwrap_err();

        match err {
            HookError::UnknownSlot { slot, available } => {
                assert_eq!(slot, "deploy");
                assert_eq!(available, vec!["validate", "build"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(mw.step_count("deploy"), None);
    }

    #[tokio::test]
    async fn empty_slot_leaves_context_unchanged() {
        let mw = collection();
        let mut ctx = vec!["same".to_string()];

        let outcome = mw.run("build", &mut ctx).await.unwrap();

        assert_eq!(outcome, RunOutcome::Completed { steps: 0 });
        assert_eq!(ctx, vec!["same"]);
    }

    #[tokio::test]
    async fn failing_step_is_reported_with_slot_and_index() {
        let mw = collection();
        mw.use_step("build", push("ok")).unwrap();
        mw.use_step("build", |_ctx: &mut Vec<String>| {
            Box::pin(async move { Err(anyhow::anyhow!("compiler missing")) })
        })
        .unwrap();
        mw.use_step("build", push("skipped")).unwrap();

        let mut ctx = Vec::new();
        let err = mw.run("build", &mut ctx).await.unwrap_err();

        assert!(matches!(
            err,
            HookError::StepFailure { ref slot, index: 1, .. } if slot == "build"
        ));
        assert_eq!(ctx, vec!["ok"]);
    }

    #[tokio::test]
    async fn running_undeclared_slot_is_an_error() {
        let mw = collection();
        let mut ctx = Vec::new();
        assert!(matches!(
            mw.run("publish", &mut ctx).await,
            Err(HookError::UnknownSlot { .. })
        ));
    }

    #[test]
    fn duplicate_slot_names_are_declared_once() {
        let mw = MiddlewareCollection::<()>::new(["a", "b", "a"]);
        assert_eq!(mw.slots(), ["a", "b"]);
        assert!(mw.has_slot("b"));
        assert!(!mw.has_slot("c"));
    }

    #[test]
    fn default_slots_include_new_lifecycle() {
        let mw = MiddlewareCollection::<()>::with_default_slots();
        for slot in ["before.new", "new", "after.new"] {
            assert_eq!(mw.step_count(slot), Some(0), "missing slot {slot}");
        }
    }
}
