//! Incident Model

use serde::{Deserialize, Serialize};

/// Incident severity, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IncidentSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Incident lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum IncidentStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl IncidentStatus {
    /// Open or in progress - the states the daily summary treats as active
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

/// Incident record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Incident {
    pub id: i64,
    pub reported_by_id: i64,
    /// Reporter display name (joined from users)
    pub reported_by_name: Option<String>,
    pub assigned_to_id: Option<i64>,
    /// Assignee display name (joined from users)
    pub assigned_to_name: Option<String>,
    pub title: String,
    pub description: String,
    pub severity: IncidentSeverity,
    pub status: IncidentStatus,
    /// Only meaningful while status is resolved or closed
    pub resolution_notes: Option<String>,
    pub archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub resolved_at: Option<i64>,
}

/// Create incident payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentCreate {
    pub title: String,
    pub description: String,
    pub severity: IncidentSeverity,
    #[serde(default)]
    pub assigned_to_id: Option<i64>,
}

/// Field-edit payload (status and assignment have dedicated endpoints)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<IncidentSeverity>,
}

/// Status transition payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentStatusUpdate {
    pub status: IncidentStatus,
    #[serde(default)]
    pub resolution_notes: Option<String>,
}

/// Assignment payload - `None` unassigns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentAssign {
    pub assigned_to_id: Option<i64>,
}
