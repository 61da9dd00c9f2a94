//! Decision Audit Trail
//!
//! Append-only recorder for field-level changes to decisions. Entries are
//! written inside the same transaction as the change they describe and are
//! never mutated afterwards; the trail survives even a hard delete of the
//! decision (its final entry records the deletion).

pub mod diff;

pub use diff::{FieldChange, diff_decisions};

use shared::models::ChangeType;
use sqlx::SqliteConnection;

/// One entry to append to the trail
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub decision_id: i64,
    pub changed_by_id: i64,
    pub change_type: ChangeType,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_at: i64,
}

impl NewAuditEntry {
    /// Entry for a freshly created decision (no field diff)
    pub fn created(decision_id: i64, changed_by_id: i64, changed_at: i64) -> Self {
        Self {
            decision_id,
            changed_by_id,
            change_type: ChangeType::Created,
            field_name: None,
            old_value: None,
            new_value: None,
            changed_at,
        }
    }

    /// Entry for one changed field of an update
    pub fn updated(
        decision_id: i64,
        changed_by_id: i64,
        change: FieldChange,
        changed_at: i64,
    ) -> Self {
        Self {
            decision_id,
            changed_by_id,
            change_type: ChangeType::Updated,
            field_name: Some(change.field),
            old_value: change.old_value,
            new_value: change.new_value,
            changed_at,
        }
    }

    /// Entry recorded just before a hard delete
    pub fn deleted(decision_id: i64, changed_by_id: i64, changed_at: i64) -> Self {
        Self {
            decision_id,
            changed_by_id,
            change_type: ChangeType::Deleted,
            field_name: None,
            old_value: None,
            new_value: None,
            changed_at,
        }
    }
}

/// Append one entry. Takes a connection so callers can batch entries into
/// the transaction that carries the change itself.
pub async fn append(conn: &mut SqliteConnection, entry: &NewAuditEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO decision_audit_log (decision_id, changed_by_id, change_type, field_name, old_value, new_value, changed_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.decision_id)
    .bind(entry.changed_by_id)
    .bind(entry.change_type)
    .bind(&entry.field_name)
    .bind(&entry.old_value)
    .bind(&entry.new_value)
    .bind(entry.changed_at)
    .execute(conn)
    .await?;
    Ok(())
}
