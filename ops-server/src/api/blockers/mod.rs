//! Blocker Routes

mod handler;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/blockers", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/resolve", patch(handler::resolve))
        .route("/{id}/reopen", patch(handler::reopen))
        .route("/{id}/archive", patch(handler::archive))
        .route("/{id}/unarchive", patch(handler::unarchive))
}
