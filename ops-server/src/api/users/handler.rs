//! User Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::AppResult;
use shared::models::{Paginated, User, UserRole};

/// GET /api/users/for-assignment - active users for pickers
pub async fn for_assignment(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    let users = user::find_for_assignment(&state.pool).await?;
    Ok(Json(users))
}

/// Query params for the admin listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub role: Option<UserRole>,
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

/// GET /api/users - list users (admin only)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Paginated<User>>> {
    let (items, total) = user::list(
        &state.pool,
        query.role,
        query.search.as_deref(),
        query.page,
        query.limit,
    )
    .await?;

    Ok(Json(Paginated {
        items,
        total,
        page: query.page.max(1),
        limit: query.limit.clamp(1, 100),
    }))
}
