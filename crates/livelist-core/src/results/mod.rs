//! Fetched results handle and its change-notification delegate.
//!
//! [`FetchedResults`] executes a [`FetchRequest`] against an [`ObjectStore`]
//! and keeps what the request's [`ResultType`] asks for: decoded objects
//! grouped into sections, object ids, or a bare count. It computes no diffs:
//! whichever store layer tracks mutations drives the
//! [`FetchedResultsDelegate`] callbacks.

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::debug;

use crate::error::{LiveListError, Result};
use crate::query::{resolve_key_path, FetchRequest, ResultType};
use crate::store::{ManagedObject, ObjectStore, Record};

/// Position of an object in a sectioned result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexPath {
    pub section: usize,
    pub item: usize,
}

impl IndexPath {
    pub fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.item)
    }
}

/// Kind of change reported for an object or a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Insert,
    Delete,
    Move,
    Update,
}

/// One group of a sectioned result set.
#[derive(Debug)]
pub struct SectionInfo<T> {
    /// Section value rendered as a string; empty when the value is missing.
    pub name: String,
    /// Uppercased first character of `name`.
    pub index_title: Option<String>,
    pub objects: Vec<Arc<T>>,
}

impl<T> SectionInfo<T> {
    fn new(name: String) -> Self {
        let index_title = name.chars().next().map(|c| c.to_uppercase().to_string());
        Self {
            name,
            index_title,
            objects: Vec::new(),
        }
    }

    pub fn number_of_objects(&self) -> usize {
        self.objects.len()
    }
}

impl<T> Clone for SectionInfo<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            index_title: self.index_title.clone(),
            objects: self.objects.clone(),
        }
    }
}

/// Receiver of result-set change notifications.
///
/// A burst of changes is bracketed by `will_change_content` and
/// `did_change_content`.
pub trait FetchedResultsDelegate<T>: Send + Sync {
    fn will_change_content(&self);

    fn did_change_object(
        &self,
        object: &T,
        index_path: Option<IndexPath>,
        change: ChangeType,
        new_index_path: Option<IndexPath>,
    );

    fn did_change_section(&self, section: &SectionInfo<T>, section_index: usize, change: ChangeType);

    fn did_change_content(&self);

    /// Custom index title for a section, `None` to keep the default.
    fn section_index_title(&self, section_name: Option<&str>) -> Option<String>;
}

/// A live result set for one fetch request.
pub struct FetchedResults<T: ManagedObject> {
    request: FetchRequest,
    store: Arc<dyn ObjectStore>,
    section_name_key_path: Option<String>,
    cache_name: Option<String>,
    delegate: Option<Weak<dyn FetchedResultsDelegate<T>>>,
    sections: Vec<SectionInfo<T>>,
    object_ids: Vec<String>,
    match_count: usize,
}

impl<T: ManagedObject> FetchedResults<T> {
    pub fn new(
        request: FetchRequest,
        store: Arc<dyn ObjectStore>,
        section_name_key_path: Option<String>,
        cache_name: Option<String>,
    ) -> Self {
        Self {
            request,
            store,
            section_name_key_path,
            cache_name,
            delegate: None,
            sections: Vec::new(),
            object_ids: Vec::new(),
            match_count: 0,
        }
    }

    /// Replace the delegate. Only a weak reference is kept.
    pub fn set_delegate(&mut self, delegate: Weak<dyn FetchedResultsDelegate<T>>) {
        self.delegate = Some(delegate);
    }

    /// The delegate, if one is set and still alive.
    pub fn delegate(&self) -> Option<Arc<dyn FetchedResultsDelegate<T>>> {
        self.delegate.as_ref().and_then(Weak::upgrade)
    }

    /// Execute the request and rebuild the result set.
    ///
    /// On failure the result set is left empty. A request without an entity
    /// fails with [`LiveListError::Unknown`]. Object ids are kept for
    /// [`ResultType::ManagedObject`] and [`ResultType::ObjectId`]; only the
    /// former decodes objects.
    pub fn perform_fetch(&mut self) -> Result<()> {
        self.sections.clear();
        self.object_ids.clear();
        self.match_count = 0;

        let entity = self
            .request
            .entity_name()
            .ok_or(LiveListError::Unknown)?
            .to_string();
        let records = self.store.execute_fetch(&self.request)?;
        let count = records.len();

        match self.request.result_type {
            ResultType::Count => {}
            ResultType::ObjectId => {
                self.object_ids = records.into_iter().map(|record| record.id).collect();
            }
            ResultType::ManagedObject => {
                let mut ids = Vec::with_capacity(count);
                let mut decoded = Vec::with_capacity(count);
                for record in records {
                    let section_name = self.section_name_for(&record);
                    let object: T = serde_json::from_value(record.data).map_err(|e| {
                        LiveListError::Decode {
                            entity: entity.clone(),
                            id: record.id.clone(),
                            message: e.to_string(),
                        }
                    })?;
                    ids.push(record.id);
                    decoded.push((section_name, Arc::new(object)));
                }
                self.object_ids = ids;
                self.sections = group_into_sections(decoded);
            }
        }

        self.match_count = count;
        debug!(
            "Fetched {} {} matches ({:?}) into {} sections",
            count,
            entity,
            self.request.result_type,
            self.sections.len()
        );
        Ok(())
    }

    fn section_name_for(&self, record: &Record) -> String {
        let Some(key_path) = &self.section_name_key_path else {
            return String::new();
        };
        match resolve_key_path(&record.data, key_path) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn fetch_request(&self) -> &FetchRequest {
        &self.request
    }

    pub fn section_name_key_path(&self) -> Option<&str> {
        self.section_name_key_path.as_deref()
    }

    pub fn cache_name(&self) -> Option<&str> {
        self.cache_name.as_deref()
    }

    pub fn sections(&self) -> &[SectionInfo<T>] {
        &self.sections
    }

    /// All fetched objects in section order.
    pub fn fetched_objects(&self) -> Vec<Arc<T>> {
        self.sections
            .iter()
            .flat_map(|section| section.objects.iter().cloned())
            .collect()
    }

    /// Number of matches from the last fetch, whatever the result type.
    pub fn number_of_objects(&self) -> usize {
        self.match_count
    }

    /// Ids of the fetched objects in fetch order. Empty for count fetches.
    pub fn fetched_object_ids(&self) -> &[String] {
        &self.object_ids
    }

    pub fn object_at(&self, index_path: IndexPath) -> Option<Arc<T>> {
        self.sections
            .get(index_path.section)?
            .objects
            .get(index_path.item)
            .cloned()
    }
}

/// Group objects into runs of equal section name, preserving fetch order.
fn group_into_sections<T>(objects: Vec<(String, Arc<T>)>) -> Vec<SectionInfo<T>> {
    let mut sections: Vec<SectionInfo<T>> = Vec::new();
    for (name, object) in objects {
        if let Some(section) = sections.last_mut().filter(|s| s.name == name) {
            section.objects.push(object);
            continue;
        }
        let mut section = SectionInfo::new(name);
        section.objects.push(object);
        sections.push(section);
    }
    sections
}
