//! Daily summary generation
//!
//! Builds a point-in-time snapshot from live entity state and upserts it
//! keyed by calendar date. Windows:
//! - status updates: created in the 24 hours before generation time
//! - incidents/blockers: currently active, regardless of age
//! - recent decisions: decision_date within the last 7 days
//!
//! Generation is admin-triggered; the route layer enforces the role before
//! this service runs.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::db::repository::daily_summary::{self, SummaryCounts};
use crate::db::repository::{RepoError, RepoResult, blocker, decision, incident, status_update};
use crate::utils::time::HOUR_MS;
use shared::models::{
    DailySummary, SummaryBlockerEntry, SummaryContent, SummaryDecisionEntry, SummaryIncidentEntry,
    SummaryStatistics, SummaryStatusEntry,
};

/// Snapshot of live state plus the counts persisted alongside it
struct BuiltContent {
    content: SummaryContent,
    counts: SummaryCounts,
}

async fn build_content(pool: &SqlitePool, now_ms: i64) -> RepoResult<BuiltContent> {
    let since = now_ms - 24 * HOUR_MS;
    let decisions_since = {
        let today = chrono::DateTime::from_timestamp_millis(now_ms)
            .map(|dt| dt.date_naive())
            .unwrap_or_else(shared::util::today_utc);
        crate::utils::time::days_before(today, 7)
    };

    let status_updates = status_update::find_since(pool, since).await?;
    let incidents = incident::find_active(pool).await?;
    let blockers = blocker::find_active(pool).await?;
    let decisions = decision::find_since_date(pool, &decisions_since).await?;
    let critical_incidents = incident::count_critical_active(pool).await?;

    let counts = SummaryCounts {
        status_updates: status_updates.len() as i64,
        incidents: incidents.len() as i64,
        blockers: blockers.len() as i64,
        decisions: decisions.len() as i64,
    };

    let content = SummaryContent {
        status_updates: status_updates
            .into_iter()
            .map(|u| SummaryStatusEntry {
                id: u.id,
                title: u.title,
                author: u.author_name.unwrap_or_else(|| "Unknown".to_string()),
                created_at: u.created_at,
            })
            .collect(),
        incidents: incidents
            .into_iter()
            .map(|i| SummaryIncidentEntry {
                id: i.id,
                title: i.title,
                severity: i.severity.as_str().to_string(),
                status: i.status.as_str().to_string(),
            })
            .collect(),
        blockers: blockers
            .into_iter()
            .map(|b| SummaryBlockerEntry {
                id: b.id,
                description: b.description,
                status: b.status.as_str().to_string(),
            })
            .collect(),
        recent_decisions: decisions
            .into_iter()
            .map(|d| SummaryDecisionEntry {
                id: d.id,
                title: d.title,
                decision_date: d.decision_date,
            })
            .collect(),
        statistics: SummaryStatistics {
            total_status_updates: counts.status_updates,
            critical_incidents,
            active_blockers: counts.blockers,
            decisions_last_7_days: counts.decisions,
        },
    };

    Ok(BuiltContent { content, counts })
}

/// Generate (or return) the summary for a date.
///
/// Idempotent upsert: an existing row is returned untouched unless
/// `force_update` is set, in which case content, counts and `generated_at`
/// are replaced in one atomic write.
pub async fn generate(
    pool: &SqlitePool,
    summary_date: Option<NaiveDate>,
    force_update: bool,
    now_ms: i64,
) -> RepoResult<DailySummary> {
    let date = summary_date.unwrap_or_else(|| {
        chrono::DateTime::from_timestamp_millis(now_ms)
            .map(|dt| dt.date_naive())
            .unwrap_or_else(shared::util::today_utc)
    });
    let date_str = date.format("%Y-%m-%d").to_string();

    let existing = daily_summary::find_by_date(pool, &date_str).await?;
    if let Some(existing) = &existing
        && !force_update
    {
        tracing::debug!(date = %date_str, "returning existing summary unchanged");
        return Ok(existing.clone());
    }

    let built = build_content(pool, now_ms).await?;
    let content_json = serde_json::to_string(&built.content)
        .map_err(|e| RepoError::Database(format!("Failed to serialize summary content: {e}")))?;

    let summary = match existing {
        Some(existing) => {
            tracing::info!(date = %date_str, "regenerating summary");
            daily_summary::replace(pool, existing.id, &content_json, built.counts, now_ms).await?
        }
        None => {
            tracing::info!(date = %date_str, "generating summary");
            daily_summary::insert(pool, &date_str, &content_json, built.counts, now_ms).await?
        }
    };

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{blocker, incident, status_update, user};
    use crate::db::test_pool;
    use shared::models::{
        BlockerCreate, IncidentCreate, IncidentSeverity, IncidentStatus, StatusUpdateCreate,
        UserRole,
    };

    async fn seed_user(pool: &SqlitePool) -> i64 {
        user::create(pool, "s@example.com", "h", "Sam", UserRole::Member)
            .await
            .unwrap()
            .id
    }

    fn content_of(summary: &DailySummary) -> SummaryContent {
        serde_json::from_value(summary.content.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_generate_is_idempotent_without_force() {
        let pool = test_pool().await;
        let now = shared::util::now_millis();

        let first = generate(&pool, None, false, now).await.unwrap();
        let second = generate(&pool, None, false, now + 60_000).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.generated_at, second.generated_at);
    }

    #[tokio::test]
    async fn test_force_update_recomputes() {
        let pool = test_pool().await;
        let author = seed_user(&pool).await;
        let now = shared::util::now_millis();

        let first = generate(&pool, None, false, now).await.unwrap();
        assert_eq!(first.status_updates_count, 0);

        status_update::create(
            &pool,
            &StatusUpdateCreate {
                title: "shipped the thing".to_string(),
                content: "done".to_string(),
                tags: vec![],
            },
            author,
        )
        .await
        .unwrap();

        let second = generate(&pool, None, true, now + 60_000).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.status_updates_count, 1);
        assert!(second.generated_at > first.generated_at);

        let content = content_of(&second);
        assert_eq!(content.statistics.total_status_updates, 1);
        assert_eq!(content.status_updates[0].author, "Sam");
    }

    #[tokio::test]
    async fn test_status_window_is_24_hours() {
        let pool = test_pool().await;
        let author = seed_user(&pool).await;
        let now = shared::util::now_millis();

        status_update::create(
            &pool,
            &StatusUpdateCreate {
                title: "recent".to_string(),
                content: "c".to_string(),
                tags: vec![],
            },
            author,
        )
        .await
        .unwrap();

        // Within the window
        let s = generate(&pool, None, true, now).await.unwrap();
        assert_eq!(s.status_updates_count, 1);

        // Generation a day later: outside the window
        let s = generate(&pool, None, true, now + 25 * HOUR_MS).await.unwrap();
        assert_eq!(s.status_updates_count, 0);
    }

    #[tokio::test]
    async fn test_closed_critical_incident_leaves_count_and_list() {
        let pool = test_pool().await;
        let reporter = seed_user(&pool).await;
        let now = shared::util::now_millis();

        let mut inc = incident::create(
            &pool,
            &IncidentCreate {
                title: "data loss".to_string(),
                description: "d".to_string(),
                severity: IncidentSeverity::Critical,
                assigned_to_id: None,
            },
            reporter,
        )
        .await
        .unwrap();

        let s = generate(&pool, None, true, now).await.unwrap();
        let content = content_of(&s);
        assert_eq!(content.statistics.critical_incidents, 1);
        assert_eq!(content.incidents.len(), 1);

        inc.status = IncidentStatus::Closed;
        incident::update_row(&pool, &inc).await.unwrap();

        let s = generate(&pool, None, true, now + 1_000).await.unwrap();
        let content = content_of(&s);
        assert_eq!(content.statistics.critical_incidents, 0);
        assert!(content.incidents.is_empty());
    }

    #[tokio::test]
    async fn test_active_blockers_counted() {
        let pool = test_pool().await;
        let reporter = seed_user(&pool).await;
        let now = shared::util::now_millis();

        blocker::create(
            &pool,
            &BlockerCreate {
                description: "stuck".to_string(),
                impact: "badly".to_string(),
                related_status_id: None,
                related_incident_id: None,
            },
            reporter,
        )
        .await
        .unwrap();

        let s = generate(&pool, None, true, now).await.unwrap();
        let content = content_of(&s);
        assert_eq!(content.statistics.active_blockers, 1);
        assert_eq!(content.blockers[0].status, "active");
    }

    #[tokio::test]
    async fn test_explicit_date_keys_the_row() {
        let pool = test_pool().await;
        let now = shared::util::now_millis();
        let date = chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let s = generate(&pool, Some(date), false, now).await.unwrap();
        assert_eq!(s.summary_date, "2025-03-01");

        let again = generate(&pool, Some(date), false, now + 1_000).await.unwrap();
        assert_eq!(again.id, s.id);
    }
}
