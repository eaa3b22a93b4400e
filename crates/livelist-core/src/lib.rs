//! livelist - Live, weakly-observed object lists over a pluggable store.
//!
//! A [`DataStack`] binds an [`ObjectStore`] to the execution context that owns
//! observer registration. [`ListController`]s built from the stack fetch a
//! typed, optionally sectioned result set and hold their [`ListObserver`]s
//! weakly.
//!
//! # Example
//!
//! ```rust,ignore
//! use livelist::{DataStack, ManagedObject, OrderBy, SqliteStore, Where};
//! use std::sync::Arc;
//!
//! #[derive(serde::Deserialize)]
//! struct Person { name: String, age: u32 }
//!
//! impl ManagedObject for Person {
//!     const ENTITY_NAME: &'static str = "Person";
//! }
//!
//! let store = Arc::new(SqliteStore::new("./data/people.sqlite")?);
//! store.register_entity("Person")?;
//!
//! let stack = DataStack::new(store);
//! let adults = stack.observe_object_list::<Person>(&[
//!     &Where::ge("age", 18),
//!     &OrderBy::ascending("name"),
//! ]);
//! println!("{} adults", adults.number_of_objects());
//! ```

pub mod config;
pub mod context;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod observer;
pub mod query;
pub mod results;
pub mod stack;
pub mod store;

// Re-export commonly used types
pub use context::ExecutionContext;
pub use controller::{ListController, ListObserver};
pub use diagnostics::{default_diagnostics, set_default_diagnostics, Diagnostics, TracingDiagnostics};
pub use error::{ErrorCode, LiveListError, Result};
pub use observer::ObserverSet;
pub use query::{
    ComparisonOp, EntityDescription, FetchClause, FetchRequest, OrderBy, Predicate, ResultType,
    SortDescriptor, SortKey, Tweak, Where,
};
pub use results::{ChangeType, FetchedResults, FetchedResultsDelegate, IndexPath, SectionInfo};
pub use stack::{DataStack, DataStackBuilder};
pub use store::{ManagedObject, ObjectStore, Record, SqliteStore};
