//! Blocker Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{blocker, incident, status_update};
use crate::policy::blocker::{BlockerAction, transition};
use crate::utils::validation::{MAX_BODY_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{
    Blocker, BlockerCreate, BlockerResolve, BlockerStatus, BlockerUpdate, Paginated,
};

/// Query params for listing blockers
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<BlockerStatus>,
    #[serde(default)]
    pub archived: bool,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

/// Referenced rows must exist before a blocker may point at them
async fn ensure_relations_exist(
    state: &ServerState,
    related_status_id: Option<i64>,
    related_incident_id: Option<i64>,
) -> AppResult<()> {
    if let Some(id) = related_status_id
        && status_update::find_by_id(&state.pool, id).await?.is_none()
    {
        return Err(AppError::not_found("Related status update not found"));
    }
    if let Some(id) = related_incident_id
        && incident::find_by_id(&state.pool, id).await?.is_none()
    {
        return Err(AppError::not_found("Related incident not found"));
    }
    Ok(())
}

async fn fetch(state: &ServerState, id: i64) -> AppResult<Blocker> {
    blocker::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Blocker {id} not found")))
}

/// Run a policy transition and persist the resulting patch
async fn apply_transition(
    state: &ServerState,
    id: i64,
    action: BlockerAction,
    actor: &CurrentUser,
) -> AppResult<Blocker> {
    let mut existing = fetch(state, id).await?;
    let now = shared::util::now_millis();
    let patch = transition(&existing, action, actor, now)?;
    patch.apply(&mut existing, now);
    let saved = blocker::update_row(&state.pool, &existing).await?;
    Ok(saved)
}

/// POST /api/blockers - report a blocker
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<BlockerCreate>,
) -> AppResult<(StatusCode, Json<Blocker>)> {
    validate_required_text(&payload.description, "description", MAX_BODY_LEN)?;
    validate_required_text(&payload.impact, "impact", MAX_BODY_LEN)?;
    ensure_relations_exist(&state, payload.related_status_id, payload.related_incident_id).await?;

    let created = blocker::create(&state.pool, &payload, current_user.id).await?;
    tracing::info!(blocker_id = created.id, "blocker reported");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/blockers - list, active first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Paginated<Blocker>>> {
    let (items, total) = blocker::list(
        &state.pool,
        query.status,
        query.archived,
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

/// GET /api/blockers/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Blocker>> {
    Ok(Json(fetch(&state, id).await?))
}

/// PATCH /api/blockers/:id - edit fields (blocked while archived)
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<BlockerUpdate>,
) -> AppResult<Json<Blocker>> {
    validate_optional_text(&payload.description, "description", MAX_BODY_LEN)?;
    validate_optional_text(&payload.impact, "impact", MAX_BODY_LEN)?;
    ensure_relations_exist(&state, payload.related_status_id, payload.related_incident_id).await?;

    let saved = apply_transition(
        &state,
        id,
        BlockerAction::Edit {
            description: payload.description,
            impact: payload.impact,
            related_status_id: payload.related_status_id,
            related_incident_id: payload.related_incident_id,
        },
        &current_user,
    )
    .await?;
    Ok(Json(saved))
}

/// PATCH /api/blockers/:id/resolve
pub async fn resolve(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<BlockerResolve>,
) -> AppResult<Json<Blocker>> {
    validate_optional_text(&payload.resolution_notes, "resolution_notes", MAX_BODY_LEN)?;

    let saved = apply_transition(
        &state,
        id,
        BlockerAction::Resolve {
            resolution_notes: payload.resolution_notes,
        },
        &current_user,
    )
    .await?;

    tracing::info!(blocker_id = id, "blocker resolved");
    Ok(Json(saved))
}

/// PATCH /api/blockers/:id/reopen
pub async fn reopen(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Blocker>> {
    let saved = apply_transition(&state, id, BlockerAction::Reopen, &current_user).await?;
    tracing::info!(blocker_id = id, "blocker reopened");
    Ok(Json(saved))
}

/// PATCH /api/blockers/:id/archive
pub async fn archive(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Blocker>> {
    let saved = apply_transition(&state, id, BlockerAction::Archive, &current_user).await?;
    Ok(Json(saved))
}

/// PATCH /api/blockers/:id/unarchive
pub async fn unarchive(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Blocker>> {
    let saved = apply_transition(&state, id, BlockerAction::Unarchive, &current_user).await?;
    Ok(Json(saved))
}

/// DELETE /api/blockers/:id - admin only, archived only
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let existing = fetch(&state, id).await?;
    let now = shared::util::now_millis();
    transition(&existing, BlockerAction::Delete, &current_user, now)?;

    blocker::delete(&state.pool, id).await?;
    tracing::info!(blocker_id = id, by = current_user.id, "blocker deleted");
    Ok(StatusCode::NO_CONTENT)
}
