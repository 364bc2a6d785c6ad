//! Field-level document edits shared by every store backend

use serde_json::{Map, Value};

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Concurrent write on {0}, retries exhausted")]
    Conflict(String),

    #[error("Document not found: {0}")]
    NotFound(String),
}

/// One edit to a field addressed by a dotted path (`players.<id>`)
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    Set(Value),
    Delete,
    /// Append each value not already present in the array
    ArrayUnion(Vec<Value>),
}

/// Apply edits in order. Intermediate objects are created as needed; a
/// non-object in the way is replaced.
pub fn apply_field_ops(doc: &mut Value, ops: &[(String, FieldOp)]) {
    for (path, op) in ops {
        apply_one(doc, path, op);
    }
}

fn apply_one(doc: &mut Value, path: &str, op: &FieldOp) {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    if let Some((leaf, parents)) = segments.split_last() {
        apply_at(doc, parents, leaf, op);
    }
}

fn apply_at(cursor: &mut Value, parents: &[&str], leaf: &str, op: &FieldOp) {
    if !cursor.is_object() {
        *cursor = Value::Object(Map::new());
    }
    let Value::Object(object) = cursor else {
        return;
    };

    if let Some((head, rest)) = parents.split_first() {
        let child = object
            .entry(head.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        apply_at(child, rest, leaf, op);
        return;
    }

    match op {
        FieldOp::Set(value) => {
            object.insert(leaf.to_string(), value.clone());
        }
        FieldOp::Delete => {
            object.remove(leaf);
        }
        FieldOp::ArrayUnion(values) => {
            let slot = object
                .entry(leaf.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                for value in values {
                    if !items.contains(value) {
                        items.push(value.clone());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_creates_nested_objects() {
        let mut doc = json!({});
        apply_field_ops(&mut doc, &[("players.abc".into(), FieldOp::Set(json!({"x": 1})))]);
        assert_eq!(doc, json!({"players": {"abc": {"x": 1}}}));
    }

    #[test]
    fn delete_removes_only_the_leaf() {
        let mut doc = json!({"players": {"a": 1, "b": 2}});
        apply_field_ops(&mut doc, &[("players.a".into(), FieldOp::Delete)]);
        assert_eq!(doc, json!({"players": {"b": 2}}));
    }

    #[test]
    fn array_union_skips_existing_values() {
        let mut doc = json!({"droppedItems": [{"id": "1"}]});
        apply_field_ops(
            &mut doc,
            &[(
                "droppedItems".into(),
                FieldOp::ArrayUnion(vec![json!({"id": "1"}), json!({"id": "2"})]),
            )],
        );
        assert_eq!(doc["droppedItems"].as_array().map(Vec::len), Some(2));
    }
}
