//! Store collaborator trait and record types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::query::{EntityDescription, FetchRequest};

/// A stored object: its identifier and JSON data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub data: Value,
}

impl Record {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// A typed entity that list controllers can fetch.
///
/// Records are decoded into the entity with serde.
pub trait ManagedObject: DeserializeOwned + Send + Sync + 'static {
    /// Name of the entity in the store.
    const ENTITY_NAME: &'static str;
}

/// Query execution context backing a data stack.
///
/// Implementations own storage I/O and predicate evaluation.
/// All operations are synchronous.
pub trait ObjectStore: Send + Sync {
    /// Look up the description of an entity by name.
    ///
    /// Returns `None` if the store does not know the entity.
    fn entity_description(&self, entity_name: &str) -> Option<EntityDescription>;

    /// Execute a fetch and return matching records in request order.
    fn execute_fetch(&self, request: &FetchRequest) -> Result<Vec<Record>>;
}
