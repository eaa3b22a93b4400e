//! Composable fetch clauses.
//!
//! Clauses are applied to a [`FetchRequest`] one after another in the order
//! given. A clause that sets a field another clause already set replaces it
//! and logs a warning.

use serde_json::Value;
use std::ops::{BitAnd, BitOr, Not};
use tracing::warn;

use super::predicate::{ComparisonOp, Predicate};
use super::request::{FetchRequest, SortDescriptor};

/// A unit of fetch configuration.
pub trait FetchClause {
    fn apply_to_fetch_request(&self, request: &mut FetchRequest);
}

/// Filters the fetch with a predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Where(pub Predicate);

impl Where {
    /// `Where::new(true)` matches everything, `Where::new(false)` nothing.
    pub fn new(value: bool) -> Self {
        Where(if value { Predicate::True } else { Predicate::False })
    }

    pub fn predicate(&self) -> &Predicate {
        &self.0
    }

    pub fn eq(key_path: impl Into<String>, value: impl Into<Value>) -> Self {
        Where(Predicate::compare(key_path, ComparisonOp::Equal, value))
    }

    pub fn ne(key_path: impl Into<String>, value: impl Into<Value>) -> Self {
        Where(Predicate::compare(key_path, ComparisonOp::NotEqual, value))
    }

    pub fn lt(key_path: impl Into<String>, value: impl Into<Value>) -> Self {
        Where(Predicate::compare(key_path, ComparisonOp::LessThan, value))
    }

    pub fn le(key_path: impl Into<String>, value: impl Into<Value>) -> Self {
        Where(Predicate::compare(key_path, ComparisonOp::LessThanOrEqual, value))
    }

    pub fn gt(key_path: impl Into<String>, value: impl Into<Value>) -> Self {
        Where(Predicate::compare(key_path, ComparisonOp::GreaterThan, value))
    }

    pub fn ge(key_path: impl Into<String>, value: impl Into<Value>) -> Self {
        Where(Predicate::compare(key_path, ComparisonOp::GreaterThanOrEqual, value))
    }

    pub fn is_in(key_path: impl Into<String>, values: Vec<Value>) -> Self {
        Where(Predicate::compare(key_path, ComparisonOp::In, Value::Array(values)))
    }

    pub fn contains(key_path: impl Into<String>, value: impl Into<Value>) -> Self {
        Where(Predicate::compare(key_path, ComparisonOp::Contains, value))
    }
}

impl FetchClause for Where {
    fn apply_to_fetch_request(&self, request: &mut FetchRequest) {
        if let Some(existing) = &request.predicate {
            warn!(
                "An existing predicate ({}) for the fetch request will be overwritten by Where clause ({})",
                existing, self.0
            );
        }
        request.predicate = Some(self.0.clone());
    }
}

impl BitAnd for Where {
    type Output = Where;

    fn bitand(self, rhs: Where) -> Where {
        Where(self.0.and(rhs.0))
    }
}

impl BitOr for Where {
    type Output = Where;

    fn bitor(self, rhs: Where) -> Where {
        Where(self.0.or(rhs.0))
    }
}

impl Not for Where {
    type Output = Where;

    fn not(self) -> Where {
        Where(self.0.negate())
    }
}

/// One key of an [`OrderBy`] clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Ascending(String),
    Descending(String),
}

impl SortKey {
    fn descriptor(&self) -> SortDescriptor {
        match self {
            SortKey::Ascending(key) => SortDescriptor::new(key.clone(), true),
            SortKey::Descending(key) => SortDescriptor::new(key.clone(), false),
        }
    }
}

/// Sorts the fetch by one or more keys, most significant first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy(pub Vec<SortKey>);

impl OrderBy {
    pub fn new(keys: Vec<SortKey>) -> Self {
        OrderBy(keys)
    }

    pub fn ascending(key_path: impl Into<String>) -> Self {
        OrderBy(vec![SortKey::Ascending(key_path.into())])
    }

    pub fn descending(key_path: impl Into<String>) -> Self {
        OrderBy(vec![SortKey::Descending(key_path.into())])
    }

    /// Append a less significant key.
    pub fn then(mut self, key: SortKey) -> Self {
        self.0.push(key);
        self
    }

    pub fn sort_descriptors(&self) -> Vec<SortDescriptor> {
        self.0.iter().map(SortKey::descriptor).collect()
    }
}

impl FetchClause for OrderBy {
    fn apply_to_fetch_request(&self, request: &mut FetchRequest) {
        if !request.sort_descriptors.is_empty() {
            warn!(
                "Existing sort descriptors for the fetch request will be overwritten by OrderBy clause ({} keys)",
                self.0.len()
            );
        }
        request.sort_descriptors = self.sort_descriptors();
    }
}

/// Arbitrary adjustment of the fetch request.
pub struct Tweak(Box<dyn Fn(&mut FetchRequest) + Send + Sync>);

impl Tweak {
    pub fn new(closure: impl Fn(&mut FetchRequest) + Send + Sync + 'static) -> Self {
        Tweak(Box::new(closure))
    }
}

impl FetchClause for Tweak {
    fn apply_to_fetch_request(&self, request: &mut FetchRequest) {
        (self.0)(request);
    }
}

impl std::fmt::Debug for Tweak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Tweak(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_where_sets_predicate() {
        let mut request = FetchRequest::new();
        Where::eq("name", "Ada").apply_to_fetch_request(&mut request);
        assert_eq!(
            request.predicate,
            Some(Predicate::compare("name", ComparisonOp::Equal, "Ada"))
        );
    }

    #[test]
    fn test_later_where_replaces_earlier() {
        let mut request = FetchRequest::new();
        Where::eq("name", "Ada").apply_to_fetch_request(&mut request);
        Where::gt("age", 30).apply_to_fetch_request(&mut request);
        assert_eq!(
            request.predicate,
            Some(Predicate::compare("age", ComparisonOp::GreaterThan, 30))
        );
    }

    #[test]
    fn test_where_operators() {
        let clause = (Where::eq("name", "Ada") | Where::eq("name", "Bob")) & !Where::new(false);
        let data = json!({ "name": "Bob" });
        assert!(clause.predicate().evaluate(&data));
        assert!(!clause.predicate().evaluate(&json!({ "name": "Cy" })));
    }

    #[test]
    fn test_where_is_in() {
        let clause = Where::is_in("age", vec![json!(1), json!(2)]);
        assert!(clause.predicate().evaluate(&json!({ "age": 2 })));
        assert!(!clause.predicate().evaluate(&json!({ "age": 3 })));
    }

    #[test]
    fn test_order_by_sets_descriptors() {
        let mut request = FetchRequest::new();
        OrderBy::ascending("last")
            .then(SortKey::Descending("age".into()))
            .apply_to_fetch_request(&mut request);
        assert_eq!(
            request.sort_descriptors,
            vec![
                SortDescriptor::new("last", true),
                SortDescriptor::new("age", false)
            ]
        );

        OrderBy::descending("first").apply_to_fetch_request(&mut request);
        assert_eq!(request.sort_descriptors, vec![SortDescriptor::new("first", false)]);
    }

    #[test]
    fn test_tweak_applies_closure() {
        let mut request = FetchRequest::new();
        Tweak::new(|r| {
            r.fetch_limit = 5;
            r.fetch_offset = 2;
        })
        .apply_to_fetch_request(&mut request);
        assert_eq!(request.fetch_limit, 5);
        assert_eq!(request.fetch_offset, 2);
    }

    #[test]
    fn test_clause_order_matters() {
        let clauses: Vec<Box<dyn FetchClause>> = vec![
            Box::new(Tweak::new(|r| r.predicate = Some(Predicate::False))),
            Box::new(Where::new(true)),
        ];
        let mut request = FetchRequest::new();
        for clause in &clauses {
            clause.apply_to_fetch_request(&mut request);
        }
        assert_eq!(request.predicate, Some(Predicate::True));
    }
}
