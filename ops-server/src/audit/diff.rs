//! Field-level diff between decision snapshots
//!
//! Compares the JSON serializations of the row before and after an update
//! and emits one change record per differing field, with string renderings
//! suitable for the audit timeline.

use serde::Serialize;
use serde_json::Value;
use shared::models::Decision;
use std::collections::BTreeSet;

/// Fields that never appear in the trail: identity, bookkeeping, and the
/// participants relation (logged separately as a single entry).
const EXCLUDED_FIELDS: &[&str] = &[
    "id",
    "created_by_id",
    "created_by_name",
    "created_at",
    "updated_at",
    "participants",
];

/// One changed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Render a JSON value for timeline display: bare strings stay unquoted,
/// nulls become absent, everything else keeps its JSON form.
fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn to_object<T: Serialize>(value: &T) -> serde_json::Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut obj)) => {
            for field in EXCLUDED_FIELDS {
                obj.remove(*field);
            }
            obj
        }
        Ok(_) | Err(_) => {
            tracing::error!("Failed to serialize decision snapshot for diff");
            serde_json::Map::new()
        }
    }
}

/// Compute the field-level diff between two decision snapshots.
pub fn diff_decisions(from: &Decision, to: &Decision) -> Vec<FieldChange> {
    let from_obj = to_object(from);
    let to_obj = to_object(to);

    let keys: BTreeSet<&String> = from_obj.keys().chain(to_obj.keys()).collect();

    let mut changes = Vec::new();
    for key in keys {
        let old = from_obj.get(key.as_str()).unwrap_or(&Value::Null);
        let new = to_obj.get(key.as_str()).unwrap_or(&Value::Null);
        if old != new {
            changes.push(FieldChange {
                field: key.clone(),
                old_value: render(old),
                new_value: render(new),
            });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision() -> Decision {
        Decision {
            id: 1,
            created_by_id: 1,
            created_by_name: Some("Jo".to_string()),
            title: "Use SQLite".to_string(),
            description: "embedded store".to_string(),
            context: "small team".to_string(),
            outcome: "adopted".to_string(),
            decision_date: "2025-03-01".to_string(),
            tags: vec!["infra".to_string()],
            created_at: 1_000,
            updated_at: 1_000,
            participants: vec![],
        }
    }

    #[test]
    fn test_no_changes_yields_empty_diff() {
        let d = decision();
        assert!(diff_decisions(&d, &d).is_empty());
    }

    #[test]
    fn test_simple_field_changes() {
        let old = decision();
        let mut new = old.clone();
        new.title = "Use Postgres".to_string();
        new.outcome = "superseded".to_string();

        let changes = diff_decisions(&old, &new);
        assert_eq!(changes.len(), 2);

        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"outcome"));

        let title = changes.iter().find(|c| c.field == "title").unwrap();
        assert_eq!(title.old_value.as_deref(), Some("Use SQLite"));
        assert_eq!(title.new_value.as_deref(), Some("Use Postgres"));
    }

    #[test]
    fn test_tags_rendered_as_json() {
        let old = decision();
        let mut new = old.clone();
        new.tags = vec!["infra".to_string(), "storage".to_string()];

        let changes = diff_decisions(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "tags");
        assert_eq!(changes[0].old_value.as_deref(), Some(r#"["infra"]"#));
        assert_eq!(
            changes[0].new_value.as_deref(),
            Some(r#"["infra","storage"]"#)
        );
    }

    #[test]
    fn test_excluded_fields_ignored() {
        let old = decision();
        let mut new = old.clone();
        new.updated_at = 9_000;
        new.created_by_name = Some("Someone Else".to_string());
        new.participants = vec![Default::default()];

        assert!(diff_decisions(&old, &new).is_empty());
    }
}
