//! Error and assertion reporting.
//!
//! Nothing in the list controller returns errors to its caller. Failures are
//! handed to a [`Diagnostics`] implementation instead: either the one attached
//! to the data stack, or the process-wide default.

use std::panic::Location;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::error;

use crate::error::LiveListError;

/// Sink for errors and programming-error assertions.
///
/// Both methods are fire-and-forget. Implementations must not call back into
/// the controller that reported.
pub trait Diagnostics: Send + Sync {
    /// Report a recoverable failure with a context message.
    fn handle_error(&self, error: &LiveListError, message: &str);

    /// Report a violated precondition.
    ///
    /// Returning from this method lets the reporting operation proceed.
    fn assert_failed(&self, message: &str, location: &'static Location<'static>);
}

/// Default diagnostics backed by `tracing`.
///
/// Assertion failures panic in debug builds and are only logged in release
/// builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn handle_error(&self, err: &LiveListError, message: &str) {
        error!(code = err.code().as_i32(), "{}: {}", message, err);
    }

    fn assert_failed(&self, message: &str, location: &'static Location<'static>) {
        error!("Assertion failed at {}: {}", location, message);
        if cfg!(debug_assertions) {
            panic!("{} ({})", message, location);
        }
    }
}

fn default_slot() -> &'static RwLock<Arc<dyn Diagnostics>> {
    static SLOT: OnceLock<RwLock<Arc<dyn Diagnostics>>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(Arc::new(TracingDiagnostics)))
}

/// The process-wide diagnostics used by stacks built without their own.
pub fn default_diagnostics() -> Arc<dyn Diagnostics> {
    default_slot()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide diagnostics.
///
/// Stacks already built keep the diagnostics they were built with.
pub fn set_default_diagnostics(diagnostics: Arc<dyn Diagnostics>) {
    *default_slot()
        .write()
        .unwrap_or_else(PoisonError::into_inner) = diagnostics;
}
