//! Shared types for the ops service
//!
//! Domain models, create/update payloads, and utility types used by both
//! the server and any in-process test clients. Database derives are gated
//! behind the `db` feature so the crate stays usable without sqlx.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
