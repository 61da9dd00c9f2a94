//! Ops Server - team operations backend
//!
//! Authenticated users record status updates, incidents, blockers and
//! decisions; the service aggregates them into daily summaries.
//!
//! # Module structure
//!
//! ```text
//! ops-server/src/
//! ├── core/      # configuration, state, server lifecycle
//! ├── auth/      # JWT authentication, argon2 passwords, middleware
//! ├── policy/    # lifecycle state machine (pure, no I/O)
//! ├── audit/     # decision audit trail (append-only)
//! ├── summary/   # daily summary aggregation
//! ├── db/        # SQLite pool, migrations, repositories
//! ├── api/       # HTTP routes and handlers
//! └── utils/     # errors, logging, time, validation
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod policy;
pub mod summary;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};
pub use utils::logger::{init_logger, init_logger_with_file};

/// Prepare the process environment: dotenv, working directory, logging
pub fn setup_environment() {
    dotenv::dotenv().ok();
    init_logger();
}
