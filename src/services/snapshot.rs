//! Entity snapshot and field-level diff primitives.
//!
//! A snapshot is a projection of an entity's tracked fields into a
//! JSON map. Diffing two snapshots yields one [`FieldChange`] per field
//! whose value differs, in the declared field order. Both operations
//! are pure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Order-independent tracked-field projection of an entity.
pub type SnapshotMap = serde_json::Map<String, Value>;

/// One field whose value differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// An entity whose mutations are audited.
///
/// Timestamps and internal ids are not tracked: snapshots describe what
/// a user can observably change, so identical input produces an empty
/// diff and no history record.
pub trait Tracked {
    /// Tracked field names. Diff output follows this order.
    const TRACKED_FIELDS: &'static [&'static str];

    /// Field whose lone change is additionally recorded as a
    /// `status_changed` event.
    const STATUS_FIELD: Option<&'static str>;

    /// Optional field whose first non-null value is additionally
    /// recorded as a `field_added` event.
    const ADDED_FIELD: Option<&'static str>;

    fn entity_id(&self) -> i32;

    fn snapshot(&self) -> SnapshotMap;
}

/// Compare two snapshots field by field. Values are compared
/// structurally; array fields (tags) are order-sensitive, matching how
/// they are persisted. A field missing from a map counts as null.
pub fn diff(fields: &[&str], before: &SnapshotMap, after: &SnapshotMap) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    for &field in fields {
        let old_value = before.get(field).cloned().unwrap_or(Value::Null);
        let new_value = after.get(field).cloned().unwrap_or(Value::Null);
        if old_value != new_value {
            changes.push(FieldChange {
                field: field.to_string(),
                old_value,
                new_value,
            });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[&str] = &["title", "tags", "status"];

    fn snapshot(title: &str, tags: Value, status: &str) -> SnapshotMap {
        let mut map = SnapshotMap::new();
        map.insert("title".to_string(), json!(title));
        map.insert("tags".to_string(), tags);
        map.insert("status".to_string(), json!(status));
        map
    }

    #[test]
    fn diff_of_identical_snapshots_is_empty() {
        let snap = snapshot("A", json!(["x", "y"]), "draft");
        assert!(diff(FIELDS, &snap, &snap).is_empty());
    }

    #[test]
    fn diff_reports_changed_fields_in_declared_order() {
        let before = snapshot("A", json!(["x"]), "draft");
        let after = snapshot("B", json!(["x"]), "published");
        let changes = diff(FIELDS, &before, &after);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, "title");
        assert_eq!(changes[0].old_value, json!("A"));
        assert_eq!(changes[0].new_value, json!("B"));
        assert_eq!(changes[1].field, "status");
    }

    #[test]
    fn diff_is_symmetric_with_values_swapped() {
        let a = snapshot("A", json!(["x"]), "draft");
        let b = snapshot("B", json!(["y"]), "draft");

        let forward = diff(FIELDS, &a, &b);
        let backward = diff(FIELDS, &b, &a);

        assert_eq!(forward.len(), backward.len());
        for (f, b) in forward.iter().zip(backward.iter()) {
            assert_eq!(f.field, b.field);
            assert_eq!(f.old_value, b.new_value);
            assert_eq!(f.new_value, b.old_value);
        }
    }

    #[test]
    fn tag_order_is_significant() {
        let before = snapshot("A", json!(["x", "y"]), "draft");
        let after = snapshot("A", json!(["y", "x"]), "draft");
        let changes = diff(FIELDS, &before, &after);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "tags");
    }

    #[test]
    fn missing_field_compares_as_null() {
        let mut before = snapshot("A", json!([]), "draft");
        before.remove("status");
        let after = snapshot("A", json!([]), "draft");
        let changes = diff(FIELDS, &before, &after);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "status");
        assert_eq!(changes[0].old_value, Value::Null);
        assert_eq!(changes[0].new_value, json!("draft"));
    }
}
