//! Fetch requests and the clauses that configure them.
//!
//! - [`request`]: [`FetchRequest`] and its parts.
//! - [`predicate`]: [`Predicate`] filters over JSON object data.
//! - [`clause`]: [`FetchClause`] implementors: [`Where`], [`OrderBy`], [`Tweak`].

mod clause;
mod predicate;
mod request;

pub use clause::{FetchClause, OrderBy, SortKey, Tweak, Where};
pub use predicate::{resolve_key_path, total_order, ComparisonOp, Predicate};
pub use request::{EntityDescription, FetchRequest, ResultType, SortDescriptor};
