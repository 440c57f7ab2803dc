//! Shared objects handed to plugins.
//!
//! [`AppContext`] bundles the emitter and the middleware collection of one
//! application run. [`CommandContext`] is the payload of the default event
//! set: what the running command knows and what plugins add to it.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    event::{DefaultEvents, EventEmitter, Events},
    middleware::MiddlewareCollection,
};

/// References to the shared hook machinery of one application run.
///
/// Cloning is cheap; every clone points at the same emitter and collection.
pub struct AppContext<E: Events = DefaultEvents> {
    emitter: Arc<EventEmitter<E>>,
    middleware: Arc<MiddlewareCollection<E::Payload>>,
}

impl<E: Events> AppContext<E> {
    pub fn new(
        emitter: Arc<EventEmitter<E>>,
        middleware: Arc<MiddlewareCollection<E::Payload>>,
    ) -> Self {
        Self {
            emitter,
            middleware,
        }
    }

    pub fn emitter(&self) -> &Arc<EventEmitter<E>> {
        &self.emitter
    }

    pub fn middleware(&self) -> &Arc<MiddlewareCollection<E::Payload>> {
        &self.middleware
    }

    /// Remember the registrations made so far.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            listeners: self.emitter.mark(),
            steps: self.middleware.mark(),
        }
    }

    /// Remove every listener and step registered since `checkpoint`, by
    /// anyone holding this context. Returns the number removed.
    pub fn rollback(&self, checkpoint: Checkpoint) -> usize {
        self.emitter.discard_from(checkpoint.listeners)
            + self.middleware.discard_from(checkpoint.steps)
    }
}

/// Registration position returned by [`AppContext::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    listeners: u64,
    steps: u64,
}

impl<E: Events> Clone for AppContext<E> {
    fn clone(&self) -> Self {
        Self {
            emitter: Arc::clone(&self.emitter),
            middleware: Arc::clone(&self.middleware),
        }
    }
}

impl<E: Events> std::fmt::Debug for AppContext<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("emitter", &self.emitter)
            .field("middleware", &self.middleware)
            .finish()
    }
}

/// Payload of [`DefaultEvents`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandContext {
    /// Name of the running command, e.g. `"new"`.
    pub command: String,
    /// Directory the command operates on.
    pub project_dir: PathBuf,
    /// Positional arguments by name.
    pub args: Map<String, Value>,
    /// Flags by long name.
    pub flags: Map<String, Value>,
    /// Messages plugins want shown to the user once the command finishes.
    pub notes: Vec<String>,
}

impl CommandContext {
    pub fn new(command: impl Into<String>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            project_dir: project_dir.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.flags.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Boolean flag; absent or non-boolean values read as `false`.
    pub fn flag_bool(&self, name: &str) -> bool {
        self.flags.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn flag_str(&self, name: &str) -> Option<&str> {
        self.flags.get(name).and_then(Value::as_str)
    }

    /// String-list flag; a single string counts as a one-element list.
    pub fn flag_list(&self, name: &str) -> Vec<String> {
        match self.flags.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.notes.push(message.into());
    }
}
