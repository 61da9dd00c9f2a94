//! Decision Repository
//!
//! Every write runs in a transaction that also appends the matching audit
//! entries, so a decision change and its trail cannot diverge.

use super::{RepoError, RepoResult, page_offset};
use crate::audit::{self, NewAuditEntry};
use shared::models::{Decision, DecisionAuditEntry, DecisionCreate, DecisionParticipant};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const SELECT: &str = "SELECT d.id, d.created_by_id, u.full_name AS created_by_name, d.title, d.description, d.context, d.outcome, d.decision_date, d.tags, d.created_at, d.updated_at FROM decisions d LEFT JOIN users u ON u.id = d.created_by_id";

/// List filters
#[derive(Debug, Clone, Default)]
pub struct DecisionFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub participant_id: Option<i64>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

pub async fn create(
    pool: &SqlitePool,
    data: &DecisionCreate,
    creator_id: i64,
) -> RepoResult<Decision> {
    let now = shared::util::now_millis();
    let tags_json = serde_json::to_string(&data.tags).unwrap_or_else(|_| "[]".to_string());

    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO decisions (created_by_id, title, description, context, outcome, decision_date, tags, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(creator_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(&data.context)
    .bind(&data.outcome)
    .bind(&data.decision_date)
    .bind(tags_json)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    insert_participants(&mut *tx, id, &data.participant_ids, now).await?;

    audit::append(&mut *tx, &NewAuditEntry::created(id, creator_id, now)).await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create decision".into()))
}

async fn insert_participants(
    conn: &mut SqliteConnection,
    decision_id: i64,
    user_ids: &[i64],
    now: i64,
) -> RepoResult<()> {
    for user_id in user_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO decision_participants (decision_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(decision_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load_participants(
    pool: &SqlitePool,
    decision_id: i64,
) -> RepoResult<Vec<DecisionParticipant>> {
    let participants = sqlx::query_as::<_, DecisionParticipant>(
        "SELECT dp.user_id, u.full_name, u.email FROM decision_participants dp JOIN users u ON u.id = dp.user_id WHERE dp.decision_id = ? ORDER BY u.full_name",
    )
    .bind(decision_id)
    .fetch_all(pool)
    .await?;
    Ok(participants)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Decision>> {
    let decision = sqlx::query_as::<_, Decision>(&format!("{SELECT} WHERE d.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match decision {
        Some(mut decision) => {
            decision.participants = load_participants(pool, id).await?;
            Ok(Some(decision))
        }
        None => Ok(None),
    }
}

/// Newest decision date first
pub async fn list(
    pool: &SqlitePool,
    filter: &DecisionFilter,
    page: i64,
    limit: i64,
) -> RepoResult<(Vec<Decision>, i64)> {
    let (_, limit, offset) = page_offset(page, limit);

    fn apply_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a DecisionFilter) {
        qb.push(" WHERE 1 = 1");
        if let Some(start) = &filter.start_date {
            qb.push(" AND d.decision_date >= ").push_bind(start);
        }
        if let Some(end) = &filter.end_date {
            qb.push(" AND d.decision_date <= ").push_bind(end);
        }
        if let Some(participant_id) = filter.participant_id {
            qb.push(" AND d.id IN (SELECT decision_id FROM decision_participants WHERE user_id = ")
                .push_bind(participant_id)
                .push(")");
        }
        if let Some(tag) = &filter.tag {
            // tags is a JSON array of strings
            qb.push(" AND EXISTS (SELECT 1 FROM json_each(d.tags) WHERE json_each.value = ")
                .push_bind(tag)
                .push(")");
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (d.title LIKE ")
                .push_bind(pattern.clone())
                .push(" OR d.description LIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM decisions d");
    apply_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(SELECT);
    apply_filters(&mut qb, filter);
    qb.push(" ORDER BY d.decision_date DESC, d.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let mut decisions = qb.build_query_as::<Decision>().fetch_all(pool).await?;

    for decision in &mut decisions {
        decision.participants = load_participants(pool, decision.id).await?;
    }

    Ok((decisions, total))
}

/// Decisions dated on or after `since_date`, newest first (summary window)
pub async fn find_since_date(pool: &SqlitePool, since_date: &str) -> RepoResult<Vec<Decision>> {
    let decisions = sqlx::query_as::<_, Decision>(&format!(
        "{SELECT} WHERE d.decision_date >= ? ORDER BY d.decision_date DESC, d.id DESC"
    ))
    .bind(since_date.to_string())
    .fetch_all(pool)
    .await?;
    Ok(decisions)
}

/// Persist an edited decision together with its audit entries.
///
/// `participant_ids` of `Some` replaces the participant set wholesale.
pub async fn update(
    pool: &SqlitePool,
    decision: &Decision,
    participant_ids: Option<&[i64]>,
    entries: &[NewAuditEntry],
) -> RepoResult<Decision> {
    let tags_json = serde_json::to_string(&decision.tags).unwrap_or_else(|_| "[]".to_string());

    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE decisions SET title = ?, description = ?, context = ?, outcome = ?, decision_date = ?, tags = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&decision.title)
    .bind(&decision.description)
    .bind(&decision.context)
    .bind(&decision.outcome)
    .bind(&decision.decision_date)
    .bind(tags_json)
    .bind(decision.updated_at)
    .bind(decision.id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Decision {} not found",
            decision.id
        )));
    }

    if let Some(ids) = participant_ids {
        sqlx::query("DELETE FROM decision_participants WHERE decision_id = ?")
            .bind(decision.id)
            .execute(&mut *tx)
            .await?;
        insert_participants(&mut *tx, decision.id, ids, decision.updated_at).await?;
    }

    for entry in entries {
        audit::append(&mut *tx, entry).await?;
    }

    tx.commit().await?;

    find_by_id(pool, decision.id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Decision {} not found", decision.id)))
}

/// Hard delete; records the `deleted` audit entry in the same transaction.
pub async fn delete(pool: &SqlitePool, id: i64, entry: &NewAuditEntry) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    audit::append(&mut *tx, entry).await?;

    let rows = sqlx::query("DELETE FROM decisions WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Decision {id} not found")));
    }

    tx.commit().await?;
    Ok(())
}

/// Full audit trail for one decision, oldest entry first
pub async fn audit_trail(
    pool: &SqlitePool,
    decision_id: i64,
) -> RepoResult<Vec<DecisionAuditEntry>> {
    let entries = sqlx::query_as::<_, DecisionAuditEntry>(
        "SELECT a.id, a.decision_id, a.changed_by_id, u.full_name AS changed_by_name, a.change_type, a.field_name, a.old_value, a.new_value, a.changed_at FROM decision_audit_log a LEFT JOIN users u ON u.id = a.changed_by_id WHERE a.decision_id = ? ORDER BY a.changed_at ASC, a.id ASC",
    )
    .bind(decision_id)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::diff_decisions;
    use crate::db::repository::user;
    use crate::db::test_pool;
    use shared::models::{ChangeType, UserRole};

    async fn seed_creator(pool: &SqlitePool) -> i64 {
        user::create(pool, "c@example.com", "h", "Cleo", UserRole::Member)
            .await
            .unwrap()
            .id
    }

    fn payload() -> DecisionCreate {
        DecisionCreate {
            title: "Use SQLite".to_string(),
            description: "embedded store".to_string(),
            context: "small team".to_string(),
            outcome: "adopted".to_string(),
            decision_date: "2025-03-01".to_string(),
            tags: vec!["infra".to_string()],
            participant_ids: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_appends_created_entry() {
        let pool = test_pool().await;
        let creator = seed_creator(&pool).await;
        let d = create(&pool, &payload(), creator).await.unwrap();

        let trail = audit_trail(&pool, d.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].change_type, ChangeType::Created);
        assert_eq!(trail[0].field_name, None);
        assert_eq!(trail[0].changed_by_name.as_deref(), Some("Cleo"));
    }

    #[tokio::test]
    async fn test_update_appends_one_entry_per_field() {
        let pool = test_pool().await;
        let creator = seed_creator(&pool).await;
        let old = create(&pool, &payload(), creator).await.unwrap();

        let now = shared::util::now_millis();
        let mut new = old.clone();
        new.title = "Use Postgres".to_string();
        new.outcome = "superseded".to_string();
        new.updated_at = now;

        let entries: Vec<NewAuditEntry> = diff_decisions(&old, &new)
            .into_iter()
            .map(|c| NewAuditEntry::updated(old.id, creator, c, now))
            .collect();
        assert_eq!(entries.len(), 2);

        let saved = update(&pool, &new, None, &entries).await.unwrap();
        assert_eq!(saved.title, "Use Postgres");

        let trail = audit_trail(&pool, old.id).await.unwrap();
        // created + 2 field updates, oldest first
        assert_eq!(trail.len(), 3);
        assert_eq!(trail[0].change_type, ChangeType::Created);
        let title_entry = trail
            .iter()
            .find(|e| e.field_name.as_deref() == Some("title"))
            .unwrap();
        assert_eq!(title_entry.old_value.as_deref(), Some("Use SQLite"));
        assert_eq!(title_entry.new_value.as_deref(), Some("Use Postgres"));
    }

    #[tokio::test]
    async fn test_participants_replace() {
        let pool = test_pool().await;
        let creator = seed_creator(&pool).await;
        let ann = user::create(&pool, "a@example.com", "h", "Ann", UserRole::Member)
            .await
            .unwrap()
            .id;
        let bo = user::create(&pool, "b@example.com", "h", "Bo", UserRole::Member)
            .await
            .unwrap()
            .id;

        let mut data = payload();
        data.participant_ids = vec![ann];
        let d = create(&pool, &data, creator).await.unwrap();
        assert_eq!(d.participants.len(), 1);
        assert_eq!(d.participants[0].full_name, "Ann");

        let mut edited = d.clone();
        edited.updated_at = shared::util::now_millis();
        let saved = update(&pool, &edited, Some(&[bo]), &[]).await.unwrap();
        assert_eq!(saved.participants.len(), 1);
        assert_eq!(saved.participants[0].full_name, "Bo");
    }

    #[tokio::test]
    async fn test_delete_keeps_trail() {
        let pool = test_pool().await;
        let creator = seed_creator(&pool).await;
        let d = create(&pool, &payload(), creator).await.unwrap();

        let entry = NewAuditEntry::deleted(d.id, creator, shared::util::now_millis());
        delete(&pool, d.id, &entry).await.unwrap();

        assert!(find_by_id(&pool, d.id).await.unwrap().is_none());
        let trail = audit_trail(&pool, d.id).await.unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail.last().unwrap().change_type, ChangeType::Deleted);
    }

    #[tokio::test]
    async fn test_list_filters_by_tag_and_search() {
        let pool = test_pool().await;
        let creator = seed_creator(&pool).await;
        create(&pool, &payload(), creator).await.unwrap();

        let mut other = payload();
        other.title = "Hire a contractor".to_string();
        other.tags = vec!["staffing".to_string()];
        other.decision_date = "2025-03-05".to_string();
        create(&pool, &other, creator).await.unwrap();

        let filter = DecisionFilter {
            tag: Some("staffing".to_string()),
            ..Default::default()
        };
        let (items, total) = list(&pool, &filter, 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].title, "Hire a contractor");

        let filter = DecisionFilter {
            search: Some("sqlite".to_string()),
            ..Default::default()
        };
        let (items, _) = list(&pool, &filter, 1, 20).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Use SQLite");

        // Newest decision date first when unfiltered
        let (items, _) = list(&pool, &DecisionFilter::default(), 1, 20).await.unwrap();
        assert_eq!(items[0].title, "Hire a contractor");
    }
}
