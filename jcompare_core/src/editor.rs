//! Absent-tolerant get/delete by accessor path over JSON documents.
//!
//! Ignore lists may reference paths that exist in neither document being
//! compared, so lookups on unknown paths are non-fatal: any type mismatch,
//! missing key, or out-of-range index yields `None` or a silent no-op.

use crate::accessor::{AccessorPath, PathSegment};
use serde_json::Value;

/// Walk `path` segment by segment and return the addressed value, if any.
pub fn get<'a>(document: &'a Value, path: &AccessorPath) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.segments() {
        current = match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get(key)?,
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Remove the element addressed by `path`, in place.
///
/// The parent is resolved with the same absent-tolerant rule as [`get`]; if
/// parent resolution fails or the final segment is absent, nothing happens.
/// The empty path is also a no-op, the root itself cannot be deleted.
pub fn delete(document: &mut Value, path: &AccessorPath) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut parent = document;
    for segment in parents {
        parent = match (parent, segment) {
            (Value::Object(map), PathSegment::Key(key)) => match map.get_mut(key) {
                Some(value) => value,
                None => return,
            },
            (Value::Array(items), PathSegment::Index(index)) => match items.get_mut(*index) {
                Some(value) => value,
                None => return,
            },
            _ => return,
        };
    }

    match (parent, last) {
        (Value::Object(map), PathSegment::Key(key)) => {
            // shift_remove keeps the remaining keys in insertion order
            map.shift_remove(key);
        }
        (Value::Array(items), PathSegment::Index(index)) => {
            if *index < items.len() {
                items.remove(*index);
            }
        }
        _ => {}
    }
}
