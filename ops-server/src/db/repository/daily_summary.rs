//! Daily Summary Repository
//!
//! One row per calendar date. Regeneration replaces content, counts and
//! `generated_at` in a single UPDATE so concurrent regenerations cannot
//! interleave partial snapshots.

use super::{RepoError, RepoResult, page_offset};
use shared::models::DailySummary;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const COLUMNS: &str = "id, summary_date, content, status_updates_count, incidents_count, blockers_count, decisions_count, generated_at, created_at";

/// Snapshot counts persisted alongside the content
#[derive(Debug, Clone, Copy)]
pub struct SummaryCounts {
    pub status_updates: i64,
    pub incidents: i64,
    pub blockers: i64,
    pub decisions: i64,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<DailySummary>> {
    let summary = sqlx::query_as::<_, DailySummary>(&format!(
        "SELECT {COLUMNS} FROM daily_summaries WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(summary)
}

pub async fn find_by_date(pool: &SqlitePool, date: &str) -> RepoResult<Option<DailySummary>> {
    let summary = sqlx::query_as::<_, DailySummary>(&format!(
        "SELECT {COLUMNS} FROM daily_summaries WHERE summary_date = ?"
    ))
    .bind(date.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(summary)
}

/// Newest summary date first, optional date range
pub async fn list(
    pool: &SqlitePool,
    start_date: Option<&str>,
    end_date: Option<&str>,
    page: i64,
    limit: i64,
) -> RepoResult<(Vec<DailySummary>, i64)> {
    let (_, limit, offset) = page_offset(page, limit);

    fn apply_filters<'a>(
        qb: &mut QueryBuilder<'a, Sqlite>,
        start_date: Option<&'a str>,
        end_date: Option<&'a str>,
    ) {
        qb.push(" WHERE 1 = 1");
        if let Some(start) = start_date {
            qb.push(" AND summary_date >= ").push_bind(start);
        }
        if let Some(end) = end_date {
            qb.push(" AND summary_date <= ").push_bind(end);
        }
    }

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM daily_summaries");
    apply_filters(&mut count_qb, start_date, end_date);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM daily_summaries"));
    apply_filters(&mut qb, start_date, end_date);
    qb.push(" ORDER BY summary_date DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let summaries = qb.build_query_as::<DailySummary>().fetch_all(pool).await?;

    Ok((summaries, total))
}

/// Insert the first summary for a date
pub async fn insert(
    pool: &SqlitePool,
    date: &str,
    content_json: &str,
    counts: SummaryCounts,
    generated_at: i64,
) -> RepoResult<DailySummary> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO daily_summaries (summary_date, content, status_updates_count, incidents_count, blockers_count, decisions_count, generated_at, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(date.to_string())
    .bind(content_json.to_string())
    .bind(counts.status_updates)
    .bind(counts.incidents)
    .bind(counts.blockers)
    .bind(counts.decisions)
    .bind(generated_at)
    .bind(generated_at)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to insert daily summary".into()))
}

/// Atomic replace of an existing summary row (forced regeneration)
pub async fn replace(
    pool: &SqlitePool,
    id: i64,
    content_json: &str,
    counts: SummaryCounts,
    generated_at: i64,
) -> RepoResult<DailySummary> {
    let rows = sqlx::query(
        "UPDATE daily_summaries SET content = ?, status_updates_count = ?, incidents_count = ?, blockers_count = ?, decisions_count = ?, generated_at = ? WHERE id = ?",
    )
    .bind(content_json.to_string())
    .bind(counts.status_updates)
    .bind(counts.incidents)
    .bind(counts.blockers)
    .bind(counts.decisions)
    .bind(generated_at)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Daily summary {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Daily summary {id} not found")))
}
