//! User Routes
//!
//! The assignment picker is open to any authenticated user; the full
//! listing is admin only.

mod handler;

use axum::{Router, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/users/for-assignment", get(handler::for_assignment))
        .merge(
            Router::new()
                .route("/api/users", get(handler::list))
                .route_layer(axum::middleware::from_fn(require_admin)),
        )
}
