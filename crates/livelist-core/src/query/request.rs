//! Fetch request descriptor.

use serde::{Deserialize, Serialize};

use super::predicate::Predicate;
use crate::config::FetchConfig;

/// Store-side description of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityDescription {
    pub name: String,
}

impl EntityDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// What a fetch returns for each match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// Fully materialized objects.
    #[default]
    ManagedObject,
    /// Object identifiers only, nothing decoded.
    ObjectId,
    /// Number of matches only, nothing decoded.
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    pub key_path: String,
    pub ascending: bool,
}

impl SortDescriptor {
    pub fn new(key_path: impl Into<String>, ascending: bool) -> Self {
        Self {
            key_path: key_path.into(),
            ascending,
        }
    }
}

/// Describes which objects to fetch and in what order.
///
/// A `fetch_limit` of zero means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub entity: Option<EntityDescription>,
    pub fetch_limit: usize,
    pub fetch_offset: usize,
    pub result_type: ResultType,
    pub predicate: Option<Predicate>,
    pub sort_descriptors: Vec<SortDescriptor>,
}

impl FetchRequest {
    /// An unbounded, unfiltered, unsorted request with no entity.
    pub fn new() -> Self {
        Self {
            entity: None,
            fetch_limit: FetchConfig::UNBOUNDED_FETCH_LIMIT,
            fetch_offset: FetchConfig::DEFAULT_FETCH_OFFSET,
            result_type: ResultType::ManagedObject,
            predicate: None,
            sort_descriptors: Vec::new(),
        }
    }

    pub fn entity_name(&self) -> Option<&str> {
        self.entity.as_ref().map(|e| e.name.as_str())
    }

    pub fn is_unbounded(&self) -> bool {
        self.fetch_limit == FetchConfig::UNBOUNDED_FETCH_LIMIT
    }
}

impl Default for FetchRequest {
    fn default() -> Self {
        Self::new()
    }
}
