//! Incident Repository

use super::{RepoError, RepoResult, page_offset};
use shared::models::{Incident, IncidentCreate, IncidentSeverity, IncidentStatus};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SELECT: &str = "SELECT i.id, i.reported_by_id, r.full_name AS reported_by_name, i.assigned_to_id, a.full_name AS assigned_to_name, i.title, i.description, i.severity, i.status, i.resolution_notes, i.archived, i.created_at, i.updated_at, i.resolved_at FROM incidents i LEFT JOIN users r ON r.id = i.reported_by_id LEFT JOIN users a ON a.id = i.assigned_to_id";

/// Critical first, then newest
const ORDER: &str = " ORDER BY CASE i.severity WHEN 'critical' THEN 0 WHEN 'high' THEN 1 WHEN 'medium' THEN 2 ELSE 3 END, i.created_at DESC";

/// List filters (all optional; `archived` defaults to false at the API layer)
#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    pub status: Option<IncidentStatus>,
    pub severity: Option<IncidentSeverity>,
    pub assigned_to_id: Option<i64>,
    pub archived: bool,
}

pub async fn create(
    pool: &SqlitePool,
    data: &IncidentCreate,
    reporter_id: i64,
) -> RepoResult<Incident> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO incidents (reported_by_id, assigned_to_id, title, description, severity, status, archived, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 'open', 0, ?, ?) RETURNING id",
    )
    .bind(reporter_id)
    .bind(data.assigned_to_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.severity)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create incident".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Incident>> {
    let incident = sqlx::query_as::<_, Incident>(&format!("{SELECT} WHERE i.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(incident)
}

pub async fn list(
    pool: &SqlitePool,
    filter: &IncidentFilter,
    page: i64,
    limit: i64,
) -> RepoResult<(Vec<Incident>, i64)> {
    let (_, limit, offset) = page_offset(page, limit);

    fn apply_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &IncidentFilter) {
        qb.push(" WHERE i.archived = ").push_bind(filter.archived);
        if let Some(status) = filter.status {
            qb.push(" AND i.status = ").push_bind(status);
        }
        if let Some(severity) = filter.severity {
            qb.push(" AND i.severity = ").push_bind(severity);
        }
        if let Some(assignee) = filter.assigned_to_id {
            qb.push(" AND i.assigned_to_id = ").push_bind(assignee);
        }
    }

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM incidents i");
    apply_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(SELECT);
    apply_filters(&mut qb, filter);
    qb.push(ORDER)
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let incidents = qb.build_query_as::<Incident>().fetch_all(pool).await?;

    Ok((incidents, total))
}

/// Non-archived incidents that are open or in progress (summary section)
pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<Incident>> {
    let incidents = sqlx::query_as::<_, Incident>(&format!(
        "{SELECT} WHERE i.archived = 0 AND i.status IN ('open', 'in_progress'){ORDER}"
    ))
    .fetch_all(pool)
    .await?;
    Ok(incidents)
}

/// Count of currently-active critical incidents (summary statistic)
pub async fn count_critical_active(pool: &SqlitePool) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM incidents WHERE archived = 0 AND status IN ('open', 'in_progress') AND severity = 'critical'",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Persist the mutable fields of an incident row
pub async fn update_row(pool: &SqlitePool, incident: &Incident) -> RepoResult<Incident> {
    let rows = sqlx::query(
        "UPDATE incidents SET assigned_to_id = ?, title = ?, description = ?, severity = ?, status = ?, resolution_notes = ?, archived = ?, updated_at = ?, resolved_at = ? WHERE id = ?",
    )
    .bind(incident.assigned_to_id)
    .bind(&incident.title)
    .bind(&incident.description)
    .bind(incident.severity)
    .bind(incident.status)
    .bind(&incident.resolution_notes)
    .bind(incident.archived)
    .bind(incident.updated_at)
    .bind(incident.resolved_at)
    .bind(incident.id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Incident {} not found",
            incident.id
        )));
    }
    find_by_id(pool, incident.id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Incident {} not found", incident.id)))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM incidents WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Incident {id} not found")));
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

    fn payload(title: &str, severity: IncidentSeverity) -> IncidentCreate {
        IncidentCreate {
            title: title.to_string(),
            description: "something broke".to_string(),
            severity,
            assigned_to_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_open() {
        let pool = test_pool().await;
        let reporter = seed_reporter(&pool).await;
        let inc = create(&pool, &payload("outage", IncidentSeverity::High), reporter)
            .await
            .unwrap();
        assert_eq!(inc.status, IncidentStatus::Open);
        assert!(!inc.archived);
        assert_eq!(inc.reported_by_name.as_deref(), Some("Rae"));
    }

    #[tokio::test]
    async fn test_list_orders_critical_first() {
        let pool = test_pool().await;
        let reporter = seed_reporter(&pool).await;
        create(&pool, &payload("minor", IncidentSeverity::Low), reporter)
            .await
            .unwrap();
        create(&pool, &payload("major", IncidentSeverity::Critical), reporter)
            .await
            .unwrap();

        let (items, total) = list(&pool, &IncidentFilter::default(), 1, 20).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].title, "major");
    }

    #[tokio::test]
    async fn test_list_excludes_archived_by_default() {
        let pool = test_pool().await;
        let reporter = seed_reporter(&pool).await;
        let mut inc = create(&pool, &payload("old", IncidentSeverity::Low), reporter)
            .await
            .unwrap();
        inc.archived = true;
        update_row(&pool, &inc).await.unwrap();

        let (items, _) = list(&pool, &IncidentFilter::default(), 1, 20).await.unwrap();
        assert!(items.is_empty());

        let archived_filter = IncidentFilter {
            archived: true,
            ..Default::default()
        };
        let (items, _) = list(&pool, &archived_filter, 1, 20).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_critical_count_tracks_status() {
        let pool = test_pool().await;
        let reporter = seed_reporter(&pool).await;
        let mut inc = create(&pool, &payload("sev1", IncidentSeverity::Critical), reporter)
            .await
            .unwrap();
        assert_eq!(count_critical_active(&pool).await.unwrap(), 1);

        inc.status = IncidentStatus::Closed;
        update_row(&pool, &inc).await.unwrap();
        assert_eq!(count_critical_active(&pool).await.unwrap(), 0);
        assert!(find_active(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = test_pool().await;
        let reporter = seed_reporter(&pool).await;
        let inc = create(&pool, &payload("gone", IncidentSeverity::Low), reporter)
            .await
            .unwrap();
        delete(&pool, inc.id).await.unwrap();
        assert!(find_by_id(&pool, inc.id).await.unwrap().is_none());
    }
}
