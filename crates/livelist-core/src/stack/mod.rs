//! Data stack: a store bound to its main execution context.

mod builder;

pub use builder::DataStackBuilder;

use std::any::type_name;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::controller::ListController;
use crate::diagnostics::Diagnostics;
use crate::query::FetchClause;
use crate::store::{ManagedObject, ObjectStore};

/// Entry point for observing lists of objects in a store.
///
/// Controllers created from a stack refer back to it weakly; dropping the last
/// `Arc<DataStack>` does not drop its controllers.
pub struct DataStack {
    main_context: Arc<dyn ObjectStore>,
    execution_context: ExecutionContext,
    diagnostics: Arc<dyn Diagnostics>,
}

impl DataStack {
    /// Stack bound to the calling thread, reporting to the process-wide
    /// diagnostics.
    pub fn new(store: Arc<dyn ObjectStore>) -> Arc<Self> {
        Self::builder(store).build()
    }

    pub fn builder(store: Arc<dyn ObjectStore>) -> DataStackBuilder {
        DataStackBuilder::new(store)
    }

    /// The store that list controllers fetch from.
    pub fn main_context_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.main_context)
    }

    pub fn execution_context(&self) -> ExecutionContext {
        self.execution_context
    }

    pub fn diagnostics(&self) -> Arc<dyn Diagnostics> {
        Arc::clone(&self.diagnostics)
    }

    /// Observe every `T` matching `clauses`, without sections or caching.
    #[track_caller]
    pub fn observe_object_list<T: ManagedObject>(
        self: &Arc<Self>,
        clauses: &[&dyn FetchClause],
    ) -> Arc<ListController<T>> {
        self.verify_observing::<T>();
        ListController::new(self, None, false, clauses)
    }

    /// Observe every `T` matching `clauses`, grouped by `section_name_key_path`.
    ///
    /// Sections are runs of consecutive objects, so `clauses` should sort by
    /// the section key first.
    #[track_caller]
    pub fn observe_sectioned_list<T: ManagedObject>(
        self: &Arc<Self>,
        section_name_key_path: impl Into<String>,
        cache_results: bool,
        clauses: &[&dyn FetchClause],
    ) -> Arc<ListController<T>> {
        self.verify_observing::<T>();
        ListController::new(
            self,
            Some(section_name_key_path.into()),
            cache_results,
            clauses,
        )
    }

    #[track_caller]
    fn verify_observing<T: ManagedObject>(&self) {
        self.execution_context
            .verify(self.diagnostics.as_ref(), || {
                format!(
                    "Attempted to observe <{}> objects outside the {} context.",
                    type_name::<T>(),
                    self.execution_context.label()
                )
            });
    }
}

impl std::fmt::Debug for DataStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStack")
            .field("execution_context", &self.execution_context)
            .finish_non_exhaustive()
    }
}
