//! Incident Handlers
//!
//! Every mutation runs through the lifecycle policy first; the repository
//! only sees patches the policy produced.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::incident::{self, IncidentFilter};
use crate::db::repository::user;
use crate::policy::incident::{IncidentAction, transition};
use crate::utils::validation::{
    MAX_BODY_LEN, MAX_TITLE_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{
    Incident, IncidentAssign, IncidentCreate, IncidentSeverity, IncidentStatus,
    IncidentStatusUpdate, IncidentUpdate, Paginated,
};

/// Query params for listing incidents
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<IncidentStatus>,
    pub severity: Option<IncidentSeverity>,
    pub assigned_to_id: Option<i64>,
    /// Defaults to false: archived incidents are hidden unless asked for
    #[serde(default)]
    pub archived: bool,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

async fn ensure_assignee_exists(
    state: &ServerState,
    assigned_to_id: Option<i64>,
) -> AppResult<()> {
    if let Some(id) = assigned_to_id
        && user::find_by_id(&state.pool, id).await?.is_none()
    {
        return Err(AppError::not_found("Assigned user not found"));
    }
    Ok(())
}

async fn fetch(state: &ServerState, id: i64) -> AppResult<Incident> {
    incident::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Incident {id} not found")))
}

/// Run a policy transition and persist the resulting patch
async fn apply_transition(
    state: &ServerState,
    id: i64,
    action: IncidentAction,
    actor: &CurrentUser,
) -> AppResult<Incident> {
    let mut existing = fetch(state, id).await?;
    let now = shared::util::now_millis();
    let patch = transition(&existing, action, actor, now)?;
    patch.apply(&mut existing, now);
    let saved = incident::update_row(&state.pool, &existing).await?;
    Ok(saved)
}

/// POST /api/incidents - report an incident
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<IncidentCreate>,
) -> AppResult<(StatusCode, Json<Incident>)> {
    validate_required_text(&payload.title, "title", MAX_TITLE_LEN)?;
    validate_required_text(&payload.description, "description", MAX_BODY_LEN)?;
    ensure_assignee_exists(&state, payload.assigned_to_id).await?;

    let created = incident::create(&state.pool, &payload, current_user.id).await?;
    tracing::info!(
        incident_id = created.id,
        severity = created.severity.as_str(),
        "incident reported"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/incidents - list with filters
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Paginated<Incident>>> {
    let filter = IncidentFilter {
        status: query.status,
        severity: query.severity,
        assigned_to_id: query.assigned_to_id,
        archived: query.archived,
    };
    let (items, total) = incident::list(&state.pool, &filter, query.page, query.limit).await?;

    Ok(Json(Paginated {
        items,
        total,
        page: query.page.max(1),
        limit: query.limit.clamp(1, 100),
    }))
}

/// GET /api/incidents/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Incident>> {
    Ok(Json(fetch(&state, id).await?))
}

/// PATCH /api/incidents/:id - field edits
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<IncidentUpdate>,
) -> AppResult<Json<Incident>> {
    validate_optional_text(&payload.title, "title", MAX_TITLE_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_BODY_LEN)?;

    let saved = apply_transition(
        &state,
        id,
        IncidentAction::Edit {
            title: payload.title,
            description: payload.description,
            severity: payload.severity,
        },
        &current_user,
    )
    .await?;
    Ok(Json(saved))
}

/// PATCH /api/incidents/:id/status
pub async fn set_status(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<IncidentStatusUpdate>,
) -> AppResult<Json<Incident>> {
    validate_optional_text(&payload.resolution_notes, "resolution_notes", MAX_BODY_LEN)?;

    let saved = apply_transition(
        &state,
        id,
        IncidentAction::SetStatus {
            status: payload.status,
            resolution_notes: payload.resolution_notes,
        },
        &current_user,
    )
    .await?;

    tracing::info!(
        incident_id = id,
        status = saved.status.as_str(),
        "incident status changed"
    );
    Ok(Json(saved))
}

/// PATCH /api/incidents/:id/assign - assign or unassign
pub async fn assign(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<IncidentAssign>,
) -> AppResult<Json<Incident>> {
    ensure_assignee_exists(&state, payload.assigned_to_id).await?;

    let saved = apply_transition(
        &state,
        id,
        IncidentAction::Assign {
            assigned_to_id: payload.assigned_to_id,
        },
        &current_user,
    )
    .await?;
    Ok(Json(saved))
}

/// PATCH /api/incidents/:id/archive
pub async fn archive(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Incident>> {
    let saved = apply_transition(&state, id, IncidentAction::Archive, &current_user).await?;
    Ok(Json(saved))
}

/// PATCH /api/incidents/:id/unarchive
pub async fn unarchive(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Incident>> {
    let saved = apply_transition(&state, id, IncidentAction::Unarchive, &current_user).await?;
    Ok(Json(saved))
}

/// DELETE /api/incidents/:id - admin only, archived only
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let existing = fetch(&state, id).await?;
    let now = shared::util::now_millis();
    transition(&existing, IncidentAction::Delete, &current_user, now)?;

    incident::delete(&state.pool, id).await?;
    tracing::info!(incident_id = id, by = current_user.id, "incident deleted");
    Ok(StatusCode::NO_CONTENT)
}
