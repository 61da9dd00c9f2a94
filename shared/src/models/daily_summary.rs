//! Daily Summary Model
//!
//! A point-in-time snapshot aggregated from live entity state, persisted
//! independently of the source rows and keyed by calendar date.

use serde::{Deserialize, Serialize};

/// Daily summary row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DailySummary {
    pub id: i64,
    /// Date the summary covers (YYYY-MM-DD, unique)
    pub summary_date: String,
    /// Embedded [`SummaryContent`] snapshot
    #[cfg_attr(feature = "db", sqlx(json))]
    pub content: serde_json::Value,
    pub status_updates_count: i64,
    pub incidents_count: i64,
    pub blockers_count: i64,
    pub decisions_count: i64,
    /// When the snapshot was (re)computed (Unix millis)
    pub generated_at: i64,
    pub created_at: i64,
}

/// Snapshot content embedded in a summary row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryContent {
    pub status_updates: Vec<SummaryStatusEntry>,
    pub incidents: Vec<SummaryIncidentEntry>,
    pub blockers: Vec<SummaryBlockerEntry>,
    pub recent_decisions: Vec<SummaryDecisionEntry>,
    pub statistics: SummaryStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStatusEntry {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryIncidentEntry {
    pub id: i64,
    pub title: String,
    pub severity: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryBlockerEntry {
    pub id: i64,
    pub description: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryDecisionEntry {
    pub id: i64,
    pub title: String,
    pub decision_date: String,
}

/// Independent aggregate counts recomputed at generation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_status_updates: i64,
    pub critical_incidents: i64,
    pub active_blockers: i64,
    pub decisions_last_7_days: i64,
}
