//! Decision Model
//!
//! Decisions carry an append-only audit trail: every create/update/delete
//! produces one or more [`DecisionAuditEntry`] rows.

use serde::{Deserialize, Serialize};

/// Decision record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Decision {
    pub id: i64,
    pub created_by_id: i64,
    /// Creator display name (joined from users)
    pub created_by_name: Option<String>,
    pub title: String,
    pub description: String,
    pub context: String,
    pub outcome: String,
    /// Calendar date of the decision (YYYY-MM-DD)
    pub decision_date: String,
    /// JSON array of tag strings
    #[cfg_attr(feature = "db", sqlx(json))]
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,

    // -- Relations (populated by application code, skipped by FromRow) --
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub participants: Vec<DecisionParticipant>,
}

/// Participant reference attached to a decision
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DecisionParticipant {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
}

/// Create decision payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionCreate {
    pub title: String,
    pub description: String,
    pub context: String,
    pub outcome: String,
    pub decision_date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub participant_ids: Vec<i64>,
}

/// Update decision payload (creator or admin only)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_ids: Option<Vec<i64>>,
}

/// Kind of change an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

/// Audit trail entry (immutable once written)
///
/// `field_name`/`old_value`/`new_value` are set only for `updated` entries;
/// values are string renderings for timeline display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DecisionAuditEntry {
    pub id: i64,
    pub decision_id: i64,
    pub changed_by_id: i64,
    /// Display name of the user who made the change (joined from users)
    pub changed_by_name: Option<String>,
    pub change_type: ChangeType,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_at: i64,
}
