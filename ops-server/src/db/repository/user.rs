//! User Repository

use super::{RepoError, RepoResult, page_offset};
use shared::models::{User, UserRole};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const COLUMNS: &str =
    "id, email, password_hash, full_name, role, is_active, created_at, updated_at";

pub async fn create(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    full_name: &str,
    role: UserRole,
) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (email, password_hash, full_name, role, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, 1, ?, ?) RETURNING id",
    )
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .bind(role)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

/// Active users, ordered by name - populates assignment/participant pickers
pub async fn find_for_assignment(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE is_active = 1 ORDER BY full_name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Admin listing with role and name/email filters
pub async fn list(
    pool: &SqlitePool,
    role: Option<UserRole>,
    search: Option<&str>,
    page: i64,
    limit: i64,
) -> RepoResult<(Vec<User>, i64)> {
    let (_, limit, offset) = page_offset(page, limit);

    fn apply_filters<'a>(
        qb: &mut QueryBuilder<'a, Sqlite>,
        role: Option<UserRole>,
        search: Option<&'a str>,
    ) {
        qb.push(" WHERE 1 = 1");
        if let Some(role) = role {
            qb.push(" AND role = ").push_bind(role);
        }
        if let Some(search) = search {
            let pattern = format!("%{search}%");
            qb.push(" AND (full_name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR email LIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM users");
    apply_filters(&mut count_qb, role, search);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM users"));
    apply_filters(&mut qb, role, search);
    qb.push(" ORDER BY full_name LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let users = qb.build_query_as::<User>().fetch_all(pool).await?;

    Ok((users, total))
}

/// True iff every id refers to an existing user
pub async fn all_exist(pool: &SqlitePool, ids: &[i64]) -> RepoResult<bool> {
    if ids.is_empty() {
        return Ok(true);
    }
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    qb.push(")");
    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(count as usize == ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = test_pool().await;
        let user = create(&pool, "a@example.com", "hash", "Alice", UserRole::Member)
            .await
            .unwrap();
        assert_eq!(user.email, "a@example.com");
        assert!(user.is_active);

        let by_email = find_by_email(&pool, "a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = test_pool().await;
        create(&pool, "a@example.com", "h", "Alice", UserRole::Member)
            .await
            .unwrap();
        let err = create(&pool, "a@example.com", "h", "Clone", UserRole::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_all_exist() {
        let pool = test_pool().await;
        let a = create(&pool, "a@example.com", "h", "Alice", UserRole::Member)
            .await
            .unwrap();
        let b = create(&pool, "b@example.com", "h", "Bob", UserRole::Member)
            .await
            .unwrap();

        assert!(all_exist(&pool, &[a.id, b.id]).await.unwrap());
        assert!(!all_exist(&pool, &[a.id, 9999]).await.unwrap());
        assert!(all_exist(&pool, &[]).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let pool = test_pool().await;
        create(&pool, "a@example.com", "h", "Alice", UserRole::Admin)
            .await
            .unwrap();
        create(&pool, "b@example.com", "h", "Bob", UserRole::Member)
            .await
            .unwrap();

        let (admins, total) = list(&pool, Some(UserRole::Admin), None, 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(admins[0].full_name, "Alice");

        let (found, total) = list(&pool, None, Some("bob"), 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].email, "b@example.com");
    }
}
