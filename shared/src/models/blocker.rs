//! Blocker Model

use serde::{Deserialize, Serialize};

/// Blocker lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum BlockerStatus {
    Active,
    Resolved,
}

impl BlockerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
        }
    }
}

/// Blocker record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Blocker {
    pub id: i64,
    pub reported_by_id: i64,
    /// Reporter display name (joined from users)
    pub reported_by_name: Option<String>,
    pub description: String,
    pub impact: String,
    pub status: BlockerStatus,
    pub resolution_notes: Option<String>,
    pub related_status_id: Option<i64>,
    pub related_incident_id: Option<i64>,
    pub archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub resolved_at: Option<i64>,
}

/// Create blocker payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockerCreate {
    pub description: String,
    pub impact: String,
    #[serde(default)]
    pub related_status_id: Option<i64>,
    #[serde(default)]
    pub related_incident_id: Option<i64>,
}

/// Edit blocker payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_incident_id: Option<i64>,
}

/// Resolve blocker payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockerResolve {
    #[serde(default)]
    pub resolution_notes: Option<String>,
}
