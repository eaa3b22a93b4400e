//! Integration tests for ListController and DataStack.
//!
//! These tests drive controllers through a real SQLite store and a recording
//! diagnostics sink, so every error and assertion report can be counted.

use livelist::{
    ChangeType, DataStack, Diagnostics, ErrorCode, FetchRequest, FetchedResultsDelegate,
    IndexPath, ListController, ListObserver, LiveListError, ManagedObject, ObjectStore, OrderBy,
    Record, ResultType, SqliteStore, Tweak, Where,
};
use livelist::{config::FetchConfig, EntityDescription};
use serde::Deserialize;
use serde_json::json;
use std::panic::Location;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

#[derive(Debug, Deserialize, PartialEq)]
struct Person {
    name: String,
    age: u32,
    team: String,
}

impl ManagedObject for Person {
    const ENTITY_NAME: &'static str = "Person";
}

#[derive(Default)]
struct RecordingDiagnostics {
    errors: Mutex<Vec<(ErrorCode, String)>>,
    assertions: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    fn assertion_count(&self) -> usize {
        self.assertions.lock().unwrap().len()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn handle_error(&self, error: &LiveListError, message: &str) {
        self.errors
            .lock()
            .unwrap()
            .push((error.code(), message.to_string()));
    }

    fn assert_failed(&self, message: &str, _location: &'static Location<'static>) {
        self.assertions.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
struct CountingObserver {
    will_change: AtomicUsize,
    did_change: AtomicUsize,
}

impl CountingObserver {
    fn notifications(&self) -> usize {
        self.will_change.load(Ordering::SeqCst) + self.did_change.load(Ordering::SeqCst)
    }
}

impl ListObserver<Person> for CountingObserver {
    fn list_will_change(&self, _controller: &ListController<Person>) {
        self.will_change.fetch_add(1, Ordering::SeqCst);
    }

    fn list_did_change(&self, _controller: &ListController<Person>) {
        self.did_change.fetch_add(1, Ordering::SeqCst);
    }
}

struct FailingStore;

impl ObjectStore for FailingStore {
    fn entity_description(&self, entity_name: &str) -> Option<EntityDescription> {
        Some(EntityDescription::new(entity_name))
    }

    fn execute_fetch(&self, _request: &FetchRequest) -> livelist::Result<Vec<Record>> {
        Err(LiveListError::Database {
            message: "disk I/O error".to_string(),
            source: None,
        })
    }
}

/// Create a populated store and a stack reporting to a recorder.
fn create_test_stack() -> (TempDir, Arc<DataStack>, Arc<RecordingDiagnostics>) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::new(temp_dir.path().join("people.sqlite")).unwrap();
    store.register_entity("Person").unwrap();
    store
        .upsert("Person", "p1", &json!({ "name": "Cy", "age": 30, "team": "beta" }))
        .unwrap();
    store
        .upsert("Person", "p2", &json!({ "name": "Ada", "age": 36, "team": "alpha" }))
        .unwrap();
    store
        .upsert("Person", "p3", &json!({ "name": "Bob", "age": 17, "team": "alpha" }))
        .unwrap();

    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let stack = DataStack::builder(Arc::new(store))
        .diagnostics(diagnostics.clone())
        .build();
    (temp_dir, stack, diagnostics)
}

fn names(controller: &ListController<Person>) -> Vec<String> {
    controller
        .fetched_objects()
        .iter()
        .map(|p| p.name.clone())
        .collect()
}

#[test]
fn test_empty_clause_list_fetches_all() {
    let (_temp, stack, diagnostics) = create_test_stack();
    let controller = stack.observe_object_list::<Person>(&[]);

    let request = controller.fetch_request();
    assert_eq!(request.entity_name(), Some("Person"));
    assert_eq!(request.predicate, None);
    assert!(request.sort_descriptors.is_empty());
    assert_eq!(request.fetch_limit, 0);
    assert!(request.is_unbounded());
    assert_eq!(request.result_type, ResultType::ManagedObject);

    assert_eq!(names(&controller), vec!["Cy", "Ada", "Bob"]);
    assert_eq!(controller.number_of_sections(), 1);
    assert_eq!(controller.cache_name(), None);
    assert_eq!(diagnostics.error_count(), 0);
    assert_eq!(diagnostics.assertion_count(), 0);
}

#[test]
fn test_clauses_filter_and_sort() {
    let (_temp, stack, _diagnostics) = create_test_stack();
    let controller =
        stack.observe_object_list::<Person>(&[&Where::ge("age", 18), &OrderBy::ascending("name")]);

    assert_eq!(names(&controller), vec!["Ada", "Cy"]);
    assert_eq!(
        controller.object_at(IndexPath::new(0, 1)).unwrap().age,
        30
    );
}

#[test]
fn test_sectioned_list() {
    let (_temp, stack, _diagnostics) = create_test_stack();
    let controller = stack.observe_sectioned_list::<Person>(
        "team",
        false,
        &[&OrderBy::ascending("team").then(livelist::SortKey::Ascending("name".into()))],
    );

    assert_eq!(controller.section_name_key_path().as_deref(), Some("team"));
    let sections = controller.sections();
    let section_names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(section_names, vec!["alpha", "beta"]);
    assert_eq!(sections[0].number_of_objects(), 2);
    assert_eq!(sections[1].index_title.as_deref(), Some("B"));
    assert_eq!(controller.number_of_objects(), 3);
}

#[test]
fn test_observer_membership_is_net_effect() {
    let (_temp, stack, diagnostics) = create_test_stack();
    let controller = stack.observe_object_list::<Person>(&[]);

    let a = Arc::new(CountingObserver::default());
    let b = Arc::new(CountingObserver::default());
    let never_added = Arc::new(CountingObserver::default());

    controller.add_observer(&a);
    controller.add_observer(&b);
    controller.add_observer(&a);
    assert_eq!(controller.observer_count(), 2);

    controller.remove_observer(&never_added);
    assert_eq!(controller.observer_count(), 2);

    controller.remove_observer(&b);
    assert_eq!(controller.observer_count(), 1);
    assert!(controller.contains_observer(&a));
    assert!(!controller.contains_observer(&b));

    controller.remove_observer(&a);
    controller.remove_observer(&a);
    assert_eq!(controller.observer_count(), 0);
    assert_eq!(diagnostics.assertion_count(), 0);
}

#[test]
fn test_dropped_observer_leaves_registry() {
    let (_temp, stack, _diagnostics) = create_test_stack();
    let controller = stack.observe_object_list::<Person>(&[]);

    let kept = Arc::new(CountingObserver::default());
    let dropped = Arc::new(CountingObserver::default());
    controller.add_observer(&kept);
    controller.add_observer(&dropped);
    assert_eq!(Arc::strong_count(&dropped), 1);

    drop(dropped);

    assert_eq!(controller.observer_count(), 1);
    assert_eq!(controller.observers().len(), 1);
    assert!(controller.contains_observer(&kept));
}

#[test]
fn test_off_context_registration_reports_and_mutates() {
    let (_temp, stack, diagnostics) = create_test_stack();
    let controller = stack.observe_object_list::<Person>(&[]);
    let observer = Arc::new(CountingObserver::default());

    let (worker_controller, worker_observer) = (controller.clone(), observer.clone());
    std::thread::spawn(move || {
        worker_controller.add_observer(&worker_observer);
    })
    .join()
    .unwrap();

    assert_eq!(diagnostics.assertion_count(), 1);
    assert!(diagnostics.assertions.lock().unwrap()[0].contains("Attempted to add a <"));
    assert!(controller.contains_observer(&observer));

    let (worker_controller, worker_observer) = (controller.clone(), observer.clone());
    std::thread::spawn(move || {
        worker_controller.remove_observer(&worker_observer);
    })
    .join()
    .unwrap();

    assert_eq!(diagnostics.assertion_count(), 2);
    assert!(diagnostics.assertions.lock().unwrap()[1].contains("Attempted to remove a <"));
    assert!(!controller.contains_observer(&observer));
}

#[test]
fn test_off_context_observe_reports_once() {
    let (_temp, stack, diagnostics) = create_test_stack();

    let worker_stack = stack.clone();
    let count = std::thread::spawn(move || {
        worker_stack
            .observe_object_list::<Person>(&[])
            .number_of_objects()
    })
    .join()
    .unwrap();

    assert_eq!(count, 3);
    assert_eq!(diagnostics.assertion_count(), 1);
}

#[test]
fn test_cache_names_are_never_shared() {
    let (_temp, stack, _diagnostics) = create_test_stack();
    let order = OrderBy::ascending("team");
    let clauses: [&dyn livelist::FetchClause; 1] = [&order];

    let first = stack.observe_sectioned_list::<Person>("team", true, &clauses);
    let second = stack.observe_sectioned_list::<Person>("team", true, &clauses);

    let first_name = first.cache_name().expect("caching was requested");
    let second_name = second.cache_name().expect("caching was requested");

    // Identical queries still get distinct names, which rules out reusing a
    // cache across controllers.
    assert_ne!(first_name, second_name);
    for name in [&first_name, &second_name] {
        let (type_tag, token) = name.rsplit_once(FetchConfig::CACHE_NAME_SEPARATOR).unwrap();
        assert!(type_tag.contains("ListController<"));
        assert!(Uuid::parse_str(token).is_ok());
    }

    let uncached = stack.observe_sectioned_list::<Person>("team", false, &clauses);
    assert_eq!(uncached.cache_name(), None);
}

#[test]
fn test_fetch_failure_reports_once_and_constructs() {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let stack = DataStack::builder(Arc::new(FailingStore))
        .diagnostics(diagnostics.clone())
        .build();

    let controller = stack.observe_object_list::<Person>(&[]);

    assert_eq!(controller.number_of_objects(), 0);
    assert_eq!(controller.number_of_sections(), 0);
    let errors = diagnostics.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, ErrorCode::StoreFailure);
    assert_eq!(errors[0].1, FetchConfig::FETCH_FAILED_MESSAGE);
}

#[test]
fn test_unknown_entity_reports_unknown_error() {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let store = SqliteStore::in_memory().unwrap();
    let stack = DataStack::builder(Arc::new(store))
        .diagnostics(diagnostics.clone())
        .build();

    let controller = stack.observe_object_list::<Person>(&[]);

    assert_eq!(controller.fetch_request().entity, None);
    assert!(controller.fetched_objects().is_empty());
    let errors = diagnostics.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, ErrorCode::UnknownError);
}

#[test]
fn test_change_callbacks_are_noops() {
    let (_temp, stack, diagnostics) = create_test_stack();
    let controller = stack.observe_object_list::<Person>(&[]);
    let observer = Arc::new(CountingObserver::default());
    controller.add_observer(&observer);

    let before = names(&controller);
    let first = controller.object_at(IndexPath::new(0, 0)).unwrap();
    let section = controller.sections()[0].clone();

    controller.will_change_content();
    controller.did_change_object(&first, Some(IndexPath::new(0, 0)), ChangeType::Update, None);
    controller.did_change_object(
        &first,
        Some(IndexPath::new(0, 0)),
        ChangeType::Move,
        Some(IndexPath::new(0, 2)),
    );
    controller.did_change_section(&section, 0, ChangeType::Insert);
    controller.did_change_content();
    assert_eq!(controller.section_index_title(Some("alpha")), None);
    assert_eq!(controller.section_index_title(None), None);

    assert_eq!(observer.notifications(), 0);
    assert_eq!(names(&controller), before);
    assert_eq!(diagnostics.error_count(), 0);
    assert_eq!(diagnostics.assertion_count(), 0);
}

#[test]
fn test_controller_does_not_keep_stack_alive() {
    let (_temp, stack, _diagnostics) = create_test_stack();
    let controller = stack.observe_object_list::<Person>(&[]);
    assert!(controller.data_stack().is_some());

    drop(stack);

    assert!(controller.data_stack().is_none());
    assert_eq!(controller.number_of_objects(), 3);
}

#[test]
fn test_direct_construction_matches_stack_helpers() {
    let (_temp, stack, _diagnostics) = create_test_stack();
    let controller: Arc<ListController<Person>> =
        ListController::new(&stack, Some("team".to_string()), false, &[&OrderBy::ascending("team")]);

    assert_eq!(controller.number_of_sections(), 2);
    assert_eq!(controller.execution_context(), stack.execution_context());
}

#[test]
fn test_count_result_type_counts_without_objects() {
    let (_temp, stack, diagnostics) = create_test_stack();
    let count_only = Tweak::new(|request| request.result_type = ResultType::Count);
    let controller = stack.observe_object_list::<Person>(&[&Where::lt("age", 35), &count_only]);

    assert_eq!(controller.fetch_request().result_type, ResultType::Count);
    assert_eq!(controller.number_of_objects(), 2);
    assert!(controller.fetched_objects().is_empty());
    assert!(controller.fetched_object_ids().is_empty());
    assert_eq!(controller.number_of_sections(), 0);
    assert_eq!(diagnostics.error_count(), 0);
}
