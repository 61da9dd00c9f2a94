//! Status Update Handlers
//!
//! Mutation is author-only - there is deliberately no admin override here,
//! unlike decisions, incidents and blockers.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::status_update;
use crate::utils::time::{day_end_millis, day_start_millis, parse_date};
use crate::utils::validation::{
    MAX_BODY_LEN, MAX_TITLE_LEN, validate_optional_text, validate_required_text, validate_tags,
};
use crate::utils::{AppError, AppResult};
use shared::models::{Paginated, StatusUpdate, StatusUpdateCreate, StatusUpdateUpdate};

/// Query params for listing status updates
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub author_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

/// POST /api/status - create a status update
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<StatusUpdateCreate>,
) -> AppResult<(StatusCode, Json<StatusUpdate>)> {
    validate_required_text(&payload.title, "title", MAX_TITLE_LEN)?;
    validate_required_text(&payload.content, "content", MAX_BODY_LEN)?;
    validate_tags(&payload.tags)?;

    let created = status_update::create(&state.pool, &payload, current_user.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/status - list status updates
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Paginated<StatusUpdate>>> {
    let start = match &query.start_date {
        Some(date) => Some(day_start_millis(parse_date(date)?)),
        None => None,
    };
    let end = match &query.end_date {
        Some(date) => Some(day_end_millis(parse_date(date)?)),
        None => None,
    };

    let (items, total) = status_update::list(
        &state.pool,
        query.author_id,
        start,
        end,
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

/// GET /api/status/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<StatusUpdate>> {
    let update = status_update::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Status update {id} not found")))?;
    Ok(Json(update))
}

/// PATCH /api/status/:id - author only
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdateUpdate>,
) -> AppResult<Json<StatusUpdate>> {
    validate_optional_text(&payload.title, "title", MAX_TITLE_LEN)?;
    validate_optional_text(&payload.content, "content", MAX_BODY_LEN)?;
    if let Some(tags) = &payload.tags {
        validate_tags(tags)?;
    }

    let mut existing = status_update::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Status update {id} not found")))?;

    if existing.user_id != current_user.id {
        return Err(AppError::forbidden(
            "Not authorized to update this status update",
        ));
    }

    if let Some(title) = payload.title {
        existing.title = title;
    }
    if let Some(content) = payload.content {
        existing.content = content;
    }
    if let Some(tags) = payload.tags {
        existing.tags = tags;
    }
    existing.updated_at = shared::util::now_millis();

    let saved = status_update::update_row(&state.pool, &existing).await?;
    Ok(Json(saved))
}

/// DELETE /api/status/:id - author only
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let existing = status_update::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Status update {id} not found")))?;

    if existing.user_id != current_user.id {
        return Err(AppError::forbidden(
            "Not authorized to delete this status update",
        ));
    }

    status_update::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
