//! Status Update Repository

use super::{RepoError, RepoResult, page_offset};
use shared::models::{StatusUpdate, StatusUpdateCreate};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SELECT: &str = "SELECT s.id, s.user_id, u.full_name AS author_name, s.title, s.content, s.tags, s.created_at, s.updated_at FROM status_updates s LEFT JOIN users u ON u.id = s.user_id";

pub async fn create(
    pool: &SqlitePool,
    data: &StatusUpdateCreate,
    author_id: i64,
) -> RepoResult<StatusUpdate> {
    let now = shared::util::now_millis();
    let tags_json = serde_json::to_string(&data.tags).unwrap_or_else(|_| "[]".to_string());

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO status_updates (user_id, title, content, tags, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(author_id)
    .bind(&data.title)
    .bind(&data.content)
    .bind(tags_json)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create status update".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<StatusUpdate>> {
    let update = sqlx::query_as::<_, StatusUpdate>(&format!("{SELECT} WHERE s.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(update)
}

/// Newest first, optionally filtered by author and creation window
pub async fn list(
    pool: &SqlitePool,
    author_id: Option<i64>,
    start_millis: Option<i64>,
    end_millis: Option<i64>,
    page: i64,
    limit: i64,
) -> RepoResult<(Vec<StatusUpdate>, i64)> {
    let (_, limit, offset) = page_offset(page, limit);

    fn apply_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        author_id: Option<i64>,
        start_millis: Option<i64>,
        end_millis: Option<i64>,
    ) {
        qb.push(" WHERE 1 = 1");
        if let Some(author_id) = author_id {
            qb.push(" AND s.user_id = ").push_bind(author_id);
        }
        if let Some(start) = start_millis {
            qb.push(" AND s.created_at >= ").push_bind(start);
        }
        if let Some(end) = end_millis {
            qb.push(" AND s.created_at < ").push_bind(end);
        }
    }

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM status_updates s");
    apply_filters(&mut count_qb, author_id, start_millis, end_millis);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(SELECT);
    apply_filters(&mut qb, author_id, start_millis, end_millis);
    qb.push(" ORDER BY s.created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let updates = qb.build_query_as::<StatusUpdate>().fetch_all(pool).await?;

    Ok((updates, total))
}

/// Everything created at or after `since_millis`, newest first (summary window)
pub async fn find_since(pool: &SqlitePool, since_millis: i64) -> RepoResult<Vec<StatusUpdate>> {
    let updates = sqlx::query_as::<_, StatusUpdate>(&format!(
        "{SELECT} WHERE s.created_at >= ? ORDER BY s.created_at DESC"
    ))
    .bind(since_millis)
    .fetch_all(pool)
    .await?;
    Ok(updates)
}

/// Persist the mutable fields of an edited status update
pub async fn update_row(pool: &SqlitePool, update: &StatusUpdate) -> RepoResult<StatusUpdate> {
    let tags_json = serde_json::to_string(&update.tags).unwrap_or_else(|_| "[]".to_string());

    let rows = sqlx::query(
        "UPDATE status_updates SET title = ?, content = ?, tags = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&update.title)
    .bind(&update.content)
    .bind(tags_json)
    .bind(update.updated_at)
    .bind(update.id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Status update {} not found",
            update.id
        )));
    }
    find_by_id(pool, update.id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Status update {} not found", update.id)))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM status_updates WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Status update {id} not found")));
    }
    Ok(())
}
