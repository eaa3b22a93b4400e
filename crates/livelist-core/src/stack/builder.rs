//! Builder for configuring a DataStack.

use std::sync::Arc;

use tracing::debug;

use super::DataStack;
use crate::context::ExecutionContext;
use crate::diagnostics::{default_diagnostics, Diagnostics};
use crate::store::ObjectStore;

/// Builder for configuring a [`DataStack`].
///
/// # Example
///
/// ```rust,ignore
/// use livelist::{DataStack, SqliteStore};
///
/// let store = Arc::new(SqliteStore::new("./data/store.sqlite")?);
/// let stack = DataStack::builder(store)
///     .diagnostics(Arc::new(MyDiagnostics))
///     .build();
/// ```
pub struct DataStackBuilder {
    store: Arc<dyn ObjectStore>,
    main_context: Option<ExecutionContext>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
}

impl DataStackBuilder {
    /// Create a new builder over the store serving as the main context.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            main_context: None,
            diagnostics: None,
        }
    }

    /// Designate the execution context observers must be registered on.
    ///
    /// Default: the thread calling [`build`](Self::build).
    pub fn main_context(mut self, context: ExecutionContext) -> Self {
        self.main_context = Some(context);
        self
    }

    /// Report errors and assertion failures to `diagnostics`.
    ///
    /// Default: the process-wide diagnostics at build time.
    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Build the stack.
    pub fn build(self) -> Arc<DataStack> {
        let execution_context = self.main_context.unwrap_or_else(ExecutionContext::main);
        let diagnostics = self.diagnostics.unwrap_or_else(default_diagnostics);

        debug!("Data stack bound to {} context", execution_context);

        Arc::new(DataStack {
            main_context: self.store,
            execution_context,
            diagnostics,
        })
    }
}
