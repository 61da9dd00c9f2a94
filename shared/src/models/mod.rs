//! Domain Models
//!
//! One module per table. Each module defines the row model plus the
//! create/update payloads accepted by the API.

pub mod blocker;
pub mod daily_summary;
pub mod decision;
pub mod incident;
pub mod status_update;
pub mod user;

// Re-exports
pub use blocker::{Blocker, BlockerCreate, BlockerResolve, BlockerStatus, BlockerUpdate};
pub use daily_summary::{
    DailySummary, SummaryBlockerEntry, SummaryContent, SummaryDecisionEntry, SummaryIncidentEntry,
    SummaryStatistics, SummaryStatusEntry,
};
pub use decision::{
    ChangeType, Decision, DecisionAuditEntry, DecisionCreate, DecisionParticipant, DecisionUpdate,
};
pub use incident::{
    Incident, IncidentAssign, IncidentCreate, IncidentSeverity, IncidentStatus,
    IncidentStatusUpdate, IncidentUpdate,
};
pub use status_update::{StatusUpdate, StatusUpdateCreate, StatusUpdateUpdate};
pub use user::{User, UserRole};

use serde::Serialize;

/// Paginated list envelope returned by collection endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}
