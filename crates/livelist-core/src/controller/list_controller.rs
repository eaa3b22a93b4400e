//! Live list controller over a data stack.

use std::any::type_name;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::debug;
use uuid::Uuid;

use crate::config::FetchConfig;
use crate::context::ExecutionContext;
use crate::diagnostics::Diagnostics;
use crate::observer::ObserverSet;
use crate::query::{FetchClause, FetchRequest, ResultType};
use crate::results::{ChangeType, FetchedResults, FetchedResultsDelegate, IndexPath, SectionInfo};
use crate::stack::DataStack;
use crate::store::ManagedObject;

/// A listener for changes to a [`ListController`]'s result set.
///
/// Controllers hold observers weakly: keep the `Arc` alive for as long as the
/// observer should stay registered.
pub trait ListObserver<T: ManagedObject>: Send + Sync {
    fn list_will_change(&self, _controller: &ListController<T>) {}

    fn list_did_change(&self, _controller: &ListController<T>) {}
}

/// Keeps a fetched result set of `T` attached to its data stack and tracks
/// the observers interested in it.
///
/// Observer registration must happen on the stack's execution context. Calls
/// from anywhere else are reported to the stack's diagnostics and then carried
/// out anyway.
pub struct ListController<T: ManagedObject> {
    fetched_results: Mutex<FetchedResults<T>>,
    parent_stack: Weak<DataStack>,
    context: ExecutionContext,
    diagnostics: Arc<dyn Diagnostics>,
    observers: ObserverSet<dyn ListObserver<T>>,
}

impl<T: ManagedObject> ListController<T> {
    /// Build the fetch request, attach to the fetched results and run the
    /// initial fetch.
    ///
    /// Construction always succeeds. A failed fetch is reported to the stack's
    /// diagnostics and leaves the result set empty.
    pub fn new(
        data_stack: &Arc<DataStack>,
        section_name_key_path: Option<String>,
        cache_results: bool,
        clauses: &[&dyn FetchClause],
    ) -> Arc<Self> {
        let store = data_stack.main_context_store();

        let mut request = FetchRequest::new();
        request.entity = store.entity_description(T::ENTITY_NAME);
        request.fetch_limit = FetchConfig::UNBOUNDED_FETCH_LIMIT;
        request.result_type = ResultType::ManagedObject;

        for clause in clauses {
            clause.apply_to_fetch_request(&mut request);
        }

        let cache_name = cache_results.then(Self::unique_cache_name);
        let diagnostics = data_stack.diagnostics();

        Arc::new_cyclic(|this: &Weak<Self>| {
            let mut fetched_results =
                FetchedResults::new(request, store, section_name_key_path, cache_name);
            let delegate: Weak<dyn FetchedResultsDelegate<T>> = this.clone();
            fetched_results.set_delegate(delegate);

            if let Err(err) = fetched_results.perform_fetch() {
                diagnostics.handle_error(&err, FetchConfig::FETCH_FAILED_MESSAGE);
            }

            Self {
                fetched_results: Mutex::new(fetched_results),
                parent_stack: Arc::downgrade(data_stack),
                context: data_stack.execution_context(),
                diagnostics,
                observers: ObserverSet::new(),
            }
        })
    }

    // A fresh token per controller: cache names are never shared, not even
    // between controllers for the same query.
    fn unique_cache_name() -> String {
        format!(
            "{}{}{}",
            type_name::<ListController<T>>(),
            FetchConfig::CACHE_NAME_SEPARATOR,
            Uuid::new_v4()
        )
    }

    /// Register `observer`. Only a weak reference is kept.
    #[track_caller]
    pub fn add_observer<O: ListObserver<T> + 'static>(&self, observer: &Arc<O>) {
        self.context.verify(self.diagnostics.as_ref(), || {
            format!(
                "Attempted to add a <{}> outside the {} context.",
                type_name::<O>(),
                self.context.label()
            )
        });

        let observer: Arc<dyn ListObserver<T>> = observer.clone();
        if self.observers.insert(&observer) {
            debug!("Added <{}> observer", type_name::<O>());
        }
    }

    /// Unregister `observer`. Does nothing if it is not registered.
    #[track_caller]
    pub fn remove_observer<O: ListObserver<T> + 'static>(&self, observer: &Arc<O>) {
        self.context.verify(self.diagnostics.as_ref(), || {
            format!(
                "Attempted to remove a <{}> outside the {} context.",
                type_name::<O>(),
                self.context.label()
            )
        });

        let observer: Arc<dyn ListObserver<T>> = observer.clone();
        if self.observers.remove(&observer) {
            debug!("Removed <{}> observer", type_name::<O>());
        }
    }

    pub fn contains_observer<O: ListObserver<T> + 'static>(&self, observer: &Arc<O>) -> bool {
        let observer: Arc<dyn ListObserver<T>> = observer.clone();
        self.observers.contains(&observer)
    }

    /// Number of registered observers that are still alive.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Strong handles to the live observers, in no particular order.
    pub fn observers(&self) -> Vec<Arc<dyn ListObserver<T>>> {
        self.observers.snapshot()
    }

    /// The owning stack, `None` once it has been dropped.
    pub fn data_stack(&self) -> Option<Arc<DataStack>> {
        self.parent_stack.upgrade()
    }

    pub fn execution_context(&self) -> ExecutionContext {
        self.context
    }

    pub fn fetch_request(&self) -> FetchRequest {
        self.results().fetch_request().clone()
    }

    pub fn section_name_key_path(&self) -> Option<String> {
        self.results().section_name_key_path().map(str::to_string)
    }

    pub fn cache_name(&self) -> Option<String> {
        self.results().cache_name().map(str::to_string)
    }

    pub fn fetched_objects(&self) -> Vec<Arc<T>> {
        self.results().fetched_objects()
    }

    pub fn sections(&self) -> Vec<SectionInfo<T>> {
        self.results().sections().to_vec()
    }

    pub fn number_of_sections(&self) -> usize {
        self.results().sections().len()
    }

    pub fn number_of_objects(&self) -> usize {
        self.results().number_of_objects()
    }

    pub fn fetched_object_ids(&self) -> Vec<String> {
        self.results().fetched_object_ids().to_vec()
    }

    pub fn object_at(&self, index_path: IndexPath) -> Option<Arc<T>> {
        self.results().object_at(index_path)
    }

    fn results(&self) -> MutexGuard<'_, FetchedResults<T>> {
        self.fetched_results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// Change notifications are received but not forwarded to observers.
impl<T: ManagedObject> FetchedResultsDelegate<T> for ListController<T> {
    fn will_change_content(&self) {}

    fn did_change_object(
        &self,
        _object: &T,
        _index_path: Option<IndexPath>,
        _change: ChangeType,
        _new_index_path: Option<IndexPath>,
    ) {
    }

    fn did_change_section(
        &self,
        _section: &SectionInfo<T>,
        _section_index: usize,
        _change: ChangeType,
    ) {
    }

    fn did_change_content(&self) {}

    fn section_index_title(&self, _section_name: Option<&str>) -> Option<String> {
        None
    }
}

impl<T: ManagedObject> std::fmt::Debug for ListController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListController")
            .field("entity", &T::ENTITY_NAME)
            .field("context", &self.context)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
