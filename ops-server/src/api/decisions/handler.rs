//! Decision Handlers
//!
//! Updates diff the old row against the edited one and append one audit
//! entry per changed field, inside the transaction that persists the edit.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::audit::{NewAuditEntry, diff_decisions};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::decision::{self, DecisionFilter};
use crate::db::repository::user;
use crate::policy::decision::{authorize_delete, authorize_edit};
use crate::utils::time::parse_date;
use crate::utils::validation::{
    MAX_BODY_LEN, MAX_TITLE_LEN, validate_optional_text, validate_required_text, validate_tags,
};
use crate::utils::{AppError, AppResult};
use shared::models::{
    Decision, DecisionAuditEntry, DecisionCreate, DecisionUpdate, Paginated,
};

/// Query params for listing decisions
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub participant_id: Option<i64>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

/// Audit trail response, oldest entry first
#[derive(Debug, Serialize)]
pub struct AuditTrailResponse {
    pub items: Vec<DecisionAuditEntry>,
}

async fn ensure_participants_exist(state: &ServerState, ids: &[i64]) -> AppResult<()> {
    if !user::all_exist(&state.pool, ids).await? {
        return Err(AppError::not_found("One or more participant users not found"));
    }
    Ok(())
}

async fn fetch(state: &ServerState, id: i64) -> AppResult<Decision> {
    decision::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Decision {id} not found")))
}

/// POST /api/decisions - record a decision
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<DecisionCreate>,
) -> AppResult<(StatusCode, Json<Decision>)> {
    validate_required_text(&payload.title, "title", MAX_TITLE_LEN)?;
    validate_required_text(&payload.description, "description", MAX_BODY_LEN)?;
    validate_required_text(&payload.context, "context", MAX_BODY_LEN)?;
    validate_required_text(&payload.outcome, "outcome", MAX_BODY_LEN)?;
    parse_date(&payload.decision_date)?;
    validate_tags(&payload.tags)?;
    ensure_participants_exist(&state, &payload.participant_ids).await?;

    let created = decision::create(&state.pool, &payload, current_user.id).await?;
    tracing::info!(decision_id = created.id, "decision recorded");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/decisions - list with filters and search
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Paginated<Decision>>> {
    if let Some(date) = &query.start_date {
        parse_date(date)?;
    }
    if let Some(date) = &query.end_date {
        parse_date(date)?;
    }

    let filter = DecisionFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        participant_id: query.participant_id,
        tag: query.tag,
        search: query.search,
    };
    let (items, total) = decision::list(&state.pool, &filter, query.page, query.limit).await?;

    Ok(Json(Paginated {
        items,
        total,
        page: query.page.max(1),
        limit: query.limit.clamp(1, 100),
    }))
}

/// GET /api/decisions/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Decision>> {
    Ok(Json(fetch(&state, id).await?))
}

/// PATCH /api/decisions/:id - creator or admin only
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<DecisionUpdate>,
) -> AppResult<Json<Decision>> {
    validate_optional_text(&payload.title, "title", MAX_TITLE_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_BODY_LEN)?;
    validate_optional_text(&payload.context, "context", MAX_BODY_LEN)?;
    validate_optional_text(&payload.outcome, "outcome", MAX_BODY_LEN)?;
    if let Some(date) = &payload.decision_date {
        parse_date(date)?;
    }
    if let Some(tags) = &payload.tags {
        validate_tags(tags)?;
    }

    let old = fetch(&state, id).await?;
    authorize_edit(&old, &current_user)?;

    if let Some(ids) = &payload.participant_ids {
        ensure_participants_exist(&state, ids).await?;
    }

    let now = shared::util::now_millis();
    let mut edited = old.clone();
    if let Some(title) = payload.title {
        edited.title = title;
    }
    if let Some(description) = payload.description {
        edited.description = description;
    }
    if let Some(context) = payload.context {
        edited.context = context;
    }
    if let Some(outcome) = payload.outcome {
        edited.outcome = outcome;
    }
    if let Some(date) = payload.decision_date {
        edited.decision_date = date;
    }
    if let Some(tags) = payload.tags {
        edited.tags = tags;
    }
    edited.updated_at = now;

    // One audit entry per changed field, plus one for a participant change
    let mut entries: Vec<NewAuditEntry> = diff_decisions(&old, &edited)
        .into_iter()
        .map(|change| NewAuditEntry::updated(id, current_user.id, change, now))
        .collect();

    if let Some(ids) = &payload.participant_ids {
        let old_ids: Vec<i64> = old.participants.iter().map(|p| p.user_id).collect();
        if old_ids != *ids {
            entries.push(NewAuditEntry {
                decision_id: id,
                changed_by_id: current_user.id,
                change_type: shared::models::ChangeType::Updated,
                field_name: Some("participants".to_string()),
                old_value: Some(format!("{old_ids:?}")),
                new_value: Some(format!("{ids:?}")),
                changed_at: now,
            });
        }
    }

    let saved = decision::update(
        &state.pool,
        &edited,
        payload.participant_ids.as_deref(),
        &entries,
    )
    .await?;

    tracing::info!(
        decision_id = id,
        changes = entries.len(),
        "decision updated"
    );
    Ok(Json(saved))
}

/// DELETE /api/decisions/:id - creator or admin only
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let existing = fetch(&state, id).await?;
    authorize_delete(&existing, &current_user)?;

    let entry = NewAuditEntry::deleted(id, current_user.id, shared::util::now_millis());
    decision::delete(&state.pool, id, &entry).await?;

    tracing::info!(decision_id = id, by = current_user.id, "decision deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/decisions/:id/audit - change history, oldest first
pub async fn audit_trail(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AuditTrailResponse>> {
    // 404 for decisions that never existed; a deleted decision still has
    // its surviving trail served here
    let items = decision::audit_trail(&state.pool, id).await?;
    if items.is_empty() && decision::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found(format!("Decision {id} not found")));
    }
    Ok(Json(AuditTrailResponse { items }))
}
