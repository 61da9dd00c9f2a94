//! Daily Summary Routes
//!
//! Generation is admin only; reading is open to any authenticated user.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/summaries", get(handler::list))
        .route("/api/summaries/{id}", get(handler::get_by_id))
        .merge(
            Router::new()
                .route("/api/summaries/generate", post(handler::generate))
                .route_layer(axum::middleware::from_fn(require_admin)),
        )
}
