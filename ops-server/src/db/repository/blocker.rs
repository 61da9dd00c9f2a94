//! Blocker Repository

use super::{RepoError, RepoResult, page_offset};
use shared::models::{Blocker, BlockerCreate, BlockerStatus};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SELECT: &str = "SELECT b.id, b.reported_by_id, u.full_name AS reported_by_name, b.description, b.impact, b.status, b.resolution_notes, b.related_status_id, b.related_incident_id, b.archived, b.created_at, b.updated_at, b.resolved_at FROM blockers b LEFT JOIN users u ON u.id = b.reported_by_id";

/// Active first, then newest
const ORDER: &str =
    " ORDER BY CASE b.status WHEN 'active' THEN 0 ELSE 1 END, b.created_at DESC";

pub async fn create(
    pool: &SqlitePool,
    data: &BlockerCreate,
    reporter_id: i64,
) -> RepoResult<Blocker> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO blockers (reported_by_id, description, impact, status, related_status_id, related_incident_id, archived, created_at, updated_at) VALUES (?, ?, ?, 'active', ?, ?, 0, ?, ?) RETURNING id",
    )
    .bind(reporter_id)
    .bind(&data.description)
    .bind(&data.impact)
    .bind(data.related_status_id)
    .bind(data.related_incident_id)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create blocker".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Blocker>> {
    let blocker = sqlx::query_as::<_, Blocker>(&format!("{SELECT} WHERE b.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(blocker)
}

pub async fn list(
    pool: &SqlitePool,
    status: Option<BlockerStatus>,
    archived: bool,
    page: i64,
    limit: i64,
) -> RepoResult<(Vec<Blocker>, i64)> {
    let (_, limit, offset) = page_offset(page, limit);

    fn apply_filters(
        qb: &mut QueryBuilder<'_, Sqlite>,
        status: Option<BlockerStatus>,
        archived: bool,
    ) {
        qb.push(" WHERE b.archived = ").push_bind(archived);
        if let Some(status) = status {
            qb.push(" AND b.status = ").push_bind(status);
        }
    }

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM blockers b");
    apply_filters(&mut count_qb, status, archived);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(SELECT);
    apply_filters(&mut qb, status, archived);
    qb.push(ORDER)
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let blockers = qb.build_query_as::<Blocker>().fetch_all(pool).await?;

    Ok((blockers, total))
}

/// Non-archived active blockers, newest first (summary section)
pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<Blocker>> {
    let blockers = sqlx::query_as::<_, Blocker>(&format!(
        "{SELECT} WHERE b.archived = 0 AND b.status = 'active' ORDER BY b.created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(blockers)
}

/// Persist the mutable fields of a blocker row
pub async fn update_row(pool: &SqlitePool, blocker: &Blocker) -> RepoResult<Blocker> {
    let rows = sqlx::query(
        "UPDATE blockers SET description = ?, impact = ?, status = ?, resolution_notes = ?, related_status_id = ?, related_incident_id = ?, archived = ?, updated_at = ?, resolved_at = ? WHERE id = ?",
    )
    .bind(&blocker.description)
    .bind(&blocker.impact)
    .bind(blocker.status)
    .bind(&blocker.resolution_notes)
    .bind(blocker.related_status_id)
    .bind(blocker.related_incident_id)
    .bind(blocker.archived)
    .bind(blocker.updated_at)
    .bind(blocker.resolved_at)
    .bind(blocker.id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Blocker {} not found",
            blocker.id
        )));
    }
    find_by_id(pool, blocker.id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Blocker {} not found", blocker.id)))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM blockers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Blocker {id} not found")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::user;
    use crate::db::test_pool;
    use shared::models::UserRole;

    async fn seed_reporter(pool: &SqlitePool) -> i64 {
        user::create(pool, "r@example.com", "h", "Rae", UserRole::Member)
            .await
            .unwrap()
            .id
    }

    fn payload(description: &str) -> BlockerCreate {
        BlockerCreate {
            description: description.to_string(),
            impact: "stalled".to_string(),
            related_status_id: None,
            related_incident_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_active() {
        let pool = test_pool().await;
        let reporter = seed_reporter(&pool).await;
        let b = create(&pool, &payload("waiting on docs"), reporter)
            .await
            .unwrap();
        assert_eq!(b.status, BlockerStatus::Active);
        assert!(!b.archived);
        assert_eq!(b.reported_by_name.as_deref(), Some("Rae"));
    }

    #[tokio::test]
    async fn test_list_active_first() {
        let pool = test_pool().await;
        let reporter = seed_reporter(&pool).await;
        let mut resolved = create(&pool, &payload("done"), reporter).await.unwrap();
        resolved.status = BlockerStatus::Resolved;
        update_row(&pool, &resolved).await.unwrap();
        create(&pool, &payload("still stuck"), reporter).await.unwrap();

        let (items, total) = list(&pool, None, false, 1, 20).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].description, "still stuck");

        let (items, total) = list(&pool, Some(BlockerStatus::Resolved), false, 1, 20)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].description, "done");
    }

    #[tokio::test]
    async fn test_find_active_skips_archived_and_resolved() {
        let pool = test_pool().await;
        let reporter = seed_reporter(&pool).await;
        let mut archived = create(&pool, &payload("hidden"), reporter).await.unwrap();
        archived.archived = true;
        update_row(&pool, &archived).await.unwrap();

        let mut resolved = create(&pool, &payload("done"), reporter).await.unwrap();
        resolved.status = BlockerStatus::Resolved;
        update_row(&pool, &resolved).await.unwrap();

        create(&pool, &payload("live"), reporter).await.unwrap();

        let active = find_active(&pool).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].description, "live");
    }
}
