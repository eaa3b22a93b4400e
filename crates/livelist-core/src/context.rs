//! Designated execution context handle.
//!
//! A data stack is bound to one [`ExecutionContext`] (by default the thread
//! that built it). Controllers verify every observer mutation against it.

use std::fmt;
use std::panic::Location;
use std::thread::{self, ThreadId};

use crate::config::ContextConfig;
use crate::diagnostics::Diagnostics;

/// Identifies the single thread allowed to mutate observer registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    thread: ThreadId,
    label: &'static str,
}

impl ExecutionContext {
    /// Bind a context labelled "main" to the calling thread.
    pub fn main() -> Self {
        Self::current(ContextConfig::MAIN_CONTEXT_LABEL)
    }

    /// Bind a context with the given label to the calling thread.
    pub fn current(label: &'static str) -> Self {
        Self {
            thread: thread::current().id(),
            label,
        }
    }

    /// Whether the calling thread is this context.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Report through `diagnostics` if the caller is not on this context.
    ///
    /// The message is only built on failure. Returns whether the check passed.
    #[track_caller]
    pub fn verify(&self, diagnostics: &dyn Diagnostics, message: impl FnOnce() -> String) -> bool {
        if self.is_current() {
            return true;
        }
        diagnostics.assert_failed(&message(), Location::caller());
        false
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.label, self.thread)
    }
}
