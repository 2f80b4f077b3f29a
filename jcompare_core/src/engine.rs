//! Structural diff engine behind the adapter contract.
//!
//! Given two documents and an order-insensitivity flag, produces categorized
//! change records keyed by accessor path: object-key additions/removals,
//! sequence-item additions/removals, value changes, and sequence-item moves.
//! In order-insensitive mode two sequences holding the same multiset of
//! elements are structurally equal, at most reported as moved.

use crate::accessor::{AccessorPath, PathSegment};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A change record carrying the value at its path
#[derive(Debug, Clone, Serialize)]
pub struct KeyedValue {
    pub path: AccessorPath,
    pub value: Value,
}

/// A value replaced at a path
#[derive(Debug, Clone, Serialize)]
pub struct ValueChange {
    pub path: AccessorPath,
    pub old: Value,
    pub new: Value,
}

/// Categorized changes between two documents.
///
/// Each bucket is in deterministic traversal order, which doubles as the
/// uniform iteration contract consumed by the report builder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategorizedChanges {
    /// Object keys present only in the new document
    pub added_keys: Vec<KeyedValue>,
    /// Object keys present only in the old document
    pub removed_keys: Vec<KeyedValue>,
    /// Sequence items present only in the new document
    pub added_items: Vec<KeyedValue>,
    /// Sequence items present only in the old document
    pub removed_items: Vec<KeyedValue>,
    /// Values that differ at the same location
    pub changed_values: Vec<ValueChange>,
    /// Sequence items found at a different position, addressed by old position
    pub moved_items: Vec<AccessorPath>,
}

impl CategorizedChanges {
    /// True when the documents are structurally equal.
    ///
    /// Moves alone do not count: under order-insensitive comparison a pure
    /// reorder leaves the sequences equal as multisets.
    pub fn is_empty(&self) -> bool {
        self.added_keys.is_empty()
            && self.removed_keys.is_empty()
            && self.added_items.is_empty()
            && self.removed_items.is_empty()
            && self.changed_values.is_empty()
    }

    /// Total number of records across all buckets, moves included
    pub fn len(&self) -> usize {
        self.added_keys.len()
            + self.removed_keys.len()
            + self.added_items.len()
            + self.removed_items.len()
            + self.changed_values.len()
            + self.moved_items.len()
    }
}

/// Engine for structural comparison of two documents
pub struct DiffEngine {
    order_insensitive: bool,
}

impl DiffEngine {
    /// Order-insensitive by default: sequences compare as multisets
    pub fn new() -> Self {
        Self {
            order_insensitive: true,
        }
    }

    pub fn with_order_insensitive(mut self, enabled: bool) -> Self {
        self.order_insensitive = enabled;
        self
    }

    /// Compare two documents and categorize every difference.
    ///
    /// Never fails for well-formed input; malformed input is the loader's
    /// responsibility.
    pub fn diff(&self, old: &Value, new: &Value) -> CategorizedChanges {
        let mut changes = CategorizedChanges::default();
        let mut prefix = Vec::new();
        self.diff_values(old, new, &mut prefix, &mut changes);
        debug!(records = changes.len(), "structural diff complete");
        changes
    }

    fn diff_values(
        &self,
        old: &Value,
        new: &Value,
        prefix: &mut Vec<PathSegment>,
        out: &mut CategorizedChanges,
    ) {
        match (old, new) {
            (Value::Object(old_map), Value::Object(new_map)) => {
                for (key, value) in old_map {
                    if !new_map.contains_key(key) {
                        out.removed_keys.push(KeyedValue {
                            path: child(prefix, PathSegment::Key(key.clone())),
                            value: value.clone(),
                        });
                    }
                }
                for (key, value) in new_map {
                    if !old_map.contains_key(key) {
                        out.added_keys.push(KeyedValue {
                            path: child(prefix, PathSegment::Key(key.clone())),
                            value: value.clone(),
                        });
                    }
                }
                for (key, old_value) in old_map {
                    if let Some(new_value) = new_map.get(key) {
                        prefix.push(PathSegment::Key(key.clone()));
                        self.diff_values(old_value, new_value, prefix, out);
                        prefix.pop();
                    }
                }
            }
            (Value::Array(old_items), Value::Array(new_items)) => {
                if self.order_insensitive {
                    self.diff_sequences_unordered(old_items, new_items, prefix, out);
                } else {
                    self.diff_sequences_ordered(old_items, new_items, prefix, out);
                }
            }
            _ => {
                // Scalars, and any pair of differently-shaped values
                if old != new {
                    out.changed_values.push(ValueChange {
                        path: AccessorPath::from(prefix.clone()),
                        old: old.clone(),
                        new: new.clone(),
                    });
                }
            }
        }
    }

    /// Multiset matching: every old item claims an equal unmatched new item,
    /// preferring its own position so unmoved items stay quiet. Leftovers are
    /// paired positionally and recursed; the surplus becomes plain
    /// additions/removals.
    fn diff_sequences_unordered(
        &self,
        old_items: &[Value],
        new_items: &[Value],
        prefix: &mut Vec<PathSegment>,
        out: &mut CategorizedChanges,
    ) {
        let mut matched = vec![false; new_items.len()];
        let mut leftover_old = Vec::new();

        for (i, item) in old_items.iter().enumerate() {
            if i < new_items.len() && !matched[i] && *item == new_items[i] {
                matched[i] = true;
                continue;
            }
            match new_items
                .iter()
                .enumerate()
                .find_map(|(j, candidate)| (!matched[j] && candidate == item).then_some(j))
            {
                Some(j) => {
                    matched[j] = true;
                    out.moved_items.push(child(prefix, PathSegment::Index(i)));
                }
                None => leftover_old.push(i),
            }
        }

        let leftover_new: Vec<usize> = (0..new_items.len()).filter(|j| !matched[*j]).collect();

        let paired = leftover_old.len().min(leftover_new.len());
        for k in 0..paired {
            let i = leftover_old[k];
            prefix.push(PathSegment::Index(i));
            self.diff_values(&old_items[i], &new_items[leftover_new[k]], prefix, out);
            prefix.pop();
        }
        for &i in &leftover_old[paired..] {
            out.removed_items.push(KeyedValue {
                path: child(prefix, PathSegment::Index(i)),
                value: old_items[i].clone(),
            });
        }
        for &j in &leftover_new[paired..] {
            out.added_items.push(KeyedValue {
                path: child(prefix, PathSegment::Index(j)),
                value: new_items[j].clone(),
            });
        }
    }

    fn diff_sequences_ordered(
        &self,
        old_items: &[Value],
        new_items: &[Value],
        prefix: &mut Vec<PathSegment>,
        out: &mut CategorizedChanges,
    ) {
        let shared = old_items.len().min(new_items.len());
        for i in 0..shared {
            prefix.push(PathSegment::Index(i));
            self.diff_values(&old_items[i], &new_items[i], prefix, out);
            prefix.pop();
        }
        for (i, item) in old_items.iter().enumerate().skip(shared) {
            out.removed_items.push(KeyedValue {
                path: child(prefix, PathSegment::Index(i)),
                value: item.clone(),
            });
        }
        for (j, item) in new_items.iter().enumerate().skip(shared) {
            out.added_items.push(KeyedValue {
                path: child(prefix, PathSegment::Index(j)),
                value: item.clone(),
            });
        }
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn child(prefix: &[PathSegment], segment: PathSegment) -> AccessorPath {
    let mut segments = prefix.to_vec();
    segments.push(segment);
    AccessorPath::from(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equal_documents_are_empty() {
        let doc = json!({"a": 1, "b": [1, 2, {"c": true}]});
        let changes = DiffEngine::new().diff(&doc, &doc.clone());
        assert!(changes.is_empty());
        assert_eq!(changes.len(), 0);
    }

    #[test]
    fn test_changed_scalar() {
        let changes = DiffEngine::new().diff(&json!({"x": 1}), &json!({"x": 2}));
        assert_eq!(changes.changed_values.len(), 1);
        assert_eq!(changes.changed_values[0].path.to_string(), "['x']");
        assert_eq!(changes.changed_values[0].old, json!(1));
        assert_eq!(changes.changed_values[0].new, json!(2));
    }

    #[test]
    fn test_type_change_is_a_value_change() {
        let changes = DiffEngine::new().diff(&json!({"x": 1}), &json!({"x": "1"}));
        assert_eq!(changes.changed_values.len(), 1);
        assert!(changes.added_keys.is_empty());
        assert!(changes.removed_keys.is_empty());
    }

    #[test]
    fn test_added_and_removed_keys() {
        let changes = DiffEngine::new().diff(
            &json!({"keep": 1, "gone": 2}),
            &json!({"keep": 1, "fresh": 3}),
        );
        assert_eq!(changes.removed_keys.len(), 1);
        assert_eq!(changes.removed_keys[0].path.to_string(), "['gone']");
        assert_eq!(changes.added_keys.len(), 1);
        assert_eq!(changes.added_keys[0].path.to_string(), "['fresh']");
        assert_eq!(changes.added_keys[0].value, json!(3));
    }

    #[test]
    fn test_reordered_sequence_is_structurally_equal() {
        let changes = DiffEngine::new().diff(&json!({"xs": [1, 2, 3]}), &json!({"xs": [3, 2, 1]}));
        assert!(changes.is_empty());
        assert!(changes.changed_values.is_empty());
        // At most moves are reported for a pure reorder
        assert_eq!(changes.moved_items.len(), 2);
        assert_eq!(changes.moved_items[0].to_string(), "['xs'][0]");
        assert_eq!(changes.moved_items[1].to_string(), "['xs'][2]");
    }

    #[test]
    fn test_unordered_leftovers_pair_into_value_changes() {
        let changes = DiffEngine::new().diff(&json!([1, 2, 3]), &json!([1, 2, 4]));
        assert_eq!(changes.changed_values.len(), 1);
        assert_eq!(changes.changed_values[0].path.to_string(), "[2]");
        assert_eq!(changes.changed_values[0].old, json!(3));
        assert_eq!(changes.changed_values[0].new, json!(4));
    }

    #[test]
    fn test_unordered_surplus_items() {
        let changes = DiffEngine::new().diff(&json!([1, 2]), &json!([2, 1, 9, 10]));
        assert!(changes.changed_values.is_empty());
        assert_eq!(changes.added_items.len(), 2);
        assert_eq!(changes.added_items[0].path.to_string(), "[2]");
        assert_eq!(changes.added_items[1].path.to_string(), "[3]");

        let changes = DiffEngine::new().diff(&json!([1, 2, 3]), &json!([3]));
        assert_eq!(changes.removed_items.len(), 2);
    }

    #[test]
    fn test_unordered_recurses_into_paired_objects() {
        let changes = DiffEngine::new().diff(
            &json!({"items": [{"id": 1, "v": "a"}]}),
            &json!({"items": [{"id": 1, "v": "b"}]}),
        );
        assert_eq!(changes.changed_values.len(), 1);
        assert_eq!(changes.changed_values[0].path.to_string(), "['items'][0]['v']");
    }

    #[test]
    fn test_ordered_mode_reports_reorder_as_changes() {
        let engine = DiffEngine::new().with_order_insensitive(false);
        let changes = engine.diff(&json!([1, 2]), &json!([2, 1]));
        assert_eq!(changes.changed_values.len(), 2);
        assert!(changes.moved_items.is_empty());
    }

    #[test]
    fn test_ordered_mode_surplus() {
        let engine = DiffEngine::new().with_order_insensitive(false);
        let changes = engine.diff(&json!([1]), &json!([1, 2, 3]));
        assert!(!changes.is_empty());
        assert_eq!(changes.added_items.len(), 2);
        assert_eq!(changes.added_items[0].path.to_string(), "[1]");
    }

    #[test]
    fn test_root_scalar_change() {
        let changes = DiffEngine::new().diff(&json!(1), &json!(2));
        assert_eq!(changes.changed_values.len(), 1);
        assert!(changes.changed_values[0].path.is_empty());
    }

    #[test]
    fn test_nested_mixed_changes() {
        let old = json!({"cfg": {"host": "a", "port": 80}, "tags": ["x", "y"]});
        let new = json!({"cfg": {"host": "b", "port": 80}, "tags": ["y", "x", "z"]});
        let changes = DiffEngine::new().diff(&old, &new);
        assert_eq!(changes.changed_values.len(), 1);
        assert_eq!(changes.changed_values[0].path.to_string(), "['cfg']['host']");
        assert_eq!(changes.added_items.len(), 1);
        assert_eq!(changes.added_items[0].value, json!("z"));
    }
}
