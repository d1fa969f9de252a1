//! Postgres-backed [`UserStore`].
//!
//! The last-admin guard runs as a single conditional statement: the admin
//! count is evaluated inside the same UPDATE/DELETE that performs the write,
//! so there is no separate read for a concurrent removal to go stale
//! against. Under READ COMMITTED two simultaneous removals of different
//! admins can still each see the pre-commit count; deployments that need
//! that closed run these statements at SERIALIZABLE.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Role, User};
use crate::store::{StoreResult, UserStore, LAST_ADMIN_MESSAGE};

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: Uuid) -> StoreResult<bool> {
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check user existence")?;
        Ok(found.is_some())
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role: row.role.parse::<Role>().map_err(anyhow::Error::msg)?,
            active: row.active,
            created_at: row.created_at,
        })
    }
}

/// Guard clause shared by the destructive statements: the write only
/// proceeds when the target is not the sole remaining active admin.
const NOT_LAST_ADMIN: &str = "(role <> 'ADMIN' OR active = false \
     OR (SELECT count(*) FROM users u2 WHERE u2.role = 'ADMIN' AND u2.active) > 1)";

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: User) -> StoreResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(user_id = %user.id, role = %user.role, "created user");
                Ok(user)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                StoreError::Conflict(format!("email '{}' is already registered", user.email)),
            ),
            Err(e) => Err(StoreError::Backend(
                anyhow::Error::new(e).context("Failed to insert user"),
            )),
        }
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, active, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        row.map(User::try_from)
            .transpose()
            .map_err(StoreError::Backend)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, active, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        rows.into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Backend)
    }

    async fn update(&self, user: User) -> StoreResult<User> {
        // Demoting or deactivating counts against the same guard as
        // deletion, unless the updated row remains an active admin.
        let sql = format!(
            r#"
            UPDATE users
            SET email = $2, name = $3, role = $4, active = $5
            WHERE id = $1
              AND (($4 = 'ADMIN' AND $5 = true) OR {NOT_LAST_ADMIN})
            "#
        );
        let result = sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(user.role.as_str())
            .bind(user.active)
            .execute(&self.pool)
            .await
            .context("Failed to update user")?;

        if result.rows_affected() == 0 {
            return if self.exists(user.id).await? {
                Err(StoreError::Conflict(LAST_ADMIN_MESSAGE.to_string()))
            } else {
                Err(StoreError::NotFound)
            };
        }
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let sql = format!("DELETE FROM users WHERE id = $1 AND {NOT_LAST_ADMIN}");
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        if result.rows_affected() == 0 {
            return if self.exists(id).await? {
                Err(StoreError::Conflict(LAST_ADMIN_MESSAGE.to_string()))
            } else {
                Err(StoreError::NotFound)
            };
        }
        info!(user_id = %id, "deleted user");
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> StoreResult<User> {
        let sql = format!(
            r#"
            UPDATE users SET active = false
            WHERE id = $1 AND {NOT_LAST_ADMIN}
            RETURNING id, email, name, role, active, created_at
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to deactivate user")?;

        match row {
            Some(row) => {
                info!(user_id = %id, "deactivated user");
                User::try_from(row).map_err(StoreError::Backend)
            }
            None => {
                if self.exists(id).await? {
                    Err(StoreError::Conflict(LAST_ADMIN_MESSAGE.to_string()))
                } else {
                    Err(StoreError::NotFound)
                }
            }
        }
    }

    async fn count_active_admins(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM users WHERE role = 'ADMIN' AND active = true",
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to count active admins")?;
        Ok(count.max(0) as u64)
    }
}
