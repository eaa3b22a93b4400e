//! In-process evaluation of a fetch request over loaded records.

use std::cmp::Ordering;

use serde_json::Value;

use super::traits::Record;
use crate::query::{resolve_key_path, total_order, FetchRequest, SortDescriptor};

/// Filter, sort, offset and limit `records` according to `request`.
///
/// Sorting is stable, so records that compare equal keep their input order.
pub fn apply_fetch_request(request: &FetchRequest, records: Vec<Record>) -> Vec<Record> {
    let mut matched: Vec<Record> = match &request.predicate {
        Some(predicate) => records
            .into_iter()
            .filter(|record| predicate.evaluate(&record.data))
            .collect(),
        None => records,
    };

    if !request.sort_descriptors.is_empty() {
        matched.sort_by(|a, b| compare_records(&request.sort_descriptors, a, b));
    }

    let skipped = matched.into_iter().skip(request.fetch_offset);
    if request.is_unbounded() {
        skipped.collect()
    } else {
        skipped.take(request.fetch_limit).collect()
    }
}

fn compare_records(descriptors: &[SortDescriptor], a: &Record, b: &Record) -> Ordering {
    for descriptor in descriptors {
        let lhs = resolve_key_path(&a.data, &descriptor.key_path).unwrap_or(&Value::Null);
        let rhs = resolve_key_path(&b.data, &descriptor.key_path).unwrap_or(&Value::Null);
        let ord = total_order(lhs, rhs);
        let ord = if descriptor.ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
