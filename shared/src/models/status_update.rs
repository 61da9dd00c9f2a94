//! Status Update Model

use serde::{Deserialize, Serialize};

/// Status update record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StatusUpdate {
    pub id: i64,
    pub user_id: i64,
    /// Author display name (joined from users)
    pub author_name: Option<String>,
    pub title: String,
    pub content: String,
    /// JSON array of tag strings
    #[cfg_attr(feature = "db", sqlx(json))]
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create status update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateCreate {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Update status update payload (author only)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
