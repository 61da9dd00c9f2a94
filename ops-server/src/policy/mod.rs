//! Lifecycle Policy
//!
//! Pure decision logic for the status/resolution/archival state machine
//! shared by incidents and blockers, plus decision edit/delete
//! authorization. Given an entity's current state and the acting user,
//! each `transition` either returns the patch to apply or rejects with a
//! [`PolicyError`] - no I/O, no framework types, unit-testable on its own.
//!
//! Handlers run the policy first and only touch the database on success;
//! the repositories then persist the merged row.

pub mod blocker;
pub mod decision;
pub mod incident;

pub use blocker::{BlockerAction, BlockerPatch};
pub use incident::{IncidentAction, IncidentPatch};

use crate::utils::AppError;
use thiserror::Error;

/// Rejection reasons for lifecycle transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Role or ownership check failed
    #[error("{0}")]
    Forbidden(String),

    /// Mutation attempted on an archived entity
    #[error("{0}")]
    Archived(String),

    /// Transition not legal from the current status
    #[error("{0}")]
    InvalidState(String),

    /// Operation requires the entity to be archived first
    #[error("{0}")]
    NotArchived(String),
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Forbidden(msg) => AppError::Forbidden(msg),
            PolicyError::Archived(msg) => AppError::Archived(msg),
            PolicyError::InvalidState(msg) => AppError::InvalidState(msg),
            PolicyError::NotArchived(msg) => AppError::NotArchived(msg),
        }
    }
}
