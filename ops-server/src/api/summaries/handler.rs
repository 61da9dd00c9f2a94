//! Daily Summary Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::daily_summary;
use crate::summary;
use crate::utils::time::{parse_date, validate_not_future};
use crate::utils::{AppError, AppResult};
use shared::models::{DailySummary, Paginated};

/// Query params for generation
#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub summary_date: Option<String>,
    #[serde(default)]
    pub force_update: bool,
}

/// Query params for listing summaries
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

/// POST /api/summaries/generate - admin-triggered idempotent upsert
pub async fn generate(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<GenerateQuery>,
) -> AppResult<(StatusCode, Json<DailySummary>)> {
    let date = match &query.summary_date {
        Some(raw) => {
            let date = parse_date(raw)?;
            validate_not_future(date)?;
            Some(date)
        }
        None => None,
    };

    let now = shared::util::now_millis();
    let generated = summary::generate(&state.pool, date, query.force_update, now).await?;

    tracing::info!(
        summary_date = %generated.summary_date,
        force_update = query.force_update,
        by = current_user.id,
        "daily summary generated"
    );
    Ok((StatusCode::CREATED, Json(generated)))
}

/// GET /api/summaries - list with optional date range
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Paginated<DailySummary>>> {
    if let Some(date) = &query.start_date {
        parse_date(date)?;
    }
    if let Some(date) = &query.end_date {
        parse_date(date)?;
    }

    let (items, total) = daily_summary::list(
        &state.pool,
        query.start_date.as_deref(),
        query.end_date.as_deref(),
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

/// GET /api/summaries/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DailySummary>> {
    let summary = daily_summary::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Daily summary {id} not found")))?;
    Ok(Json(summary))
}
