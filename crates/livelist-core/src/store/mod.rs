//! Object stores that back a data stack.
//!
//! [`ObjectStore`] is the seam between list controllers and storage.
//! [`SqliteStore`] is the bundled implementation; [`apply_fetch_request`] is
//! available to other implementations that evaluate requests in-process.

mod execute;
mod sqlite;
mod traits;

pub use execute::apply_fetch_request;
pub use sqlite::SqliteStore;
pub use traits::{ManagedObject, ObjectStore, Record};
