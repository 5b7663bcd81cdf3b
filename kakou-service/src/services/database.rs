//! PostgreSQL stores for the account database and the kakou database.

use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

use crate::models::{
    Checkpoint, CrossingRecord, IdRange, NewUser, Scope, User, UserChanges, UserFilter,
};
use crate::services::metrics::db_timer;
use crate::services::store::{AccountStore, KakouStore};
use crate::utils::{Page, PageRequest};

const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str =
    "id, username, password, scope, date_created, date_modified, banned";

const CROSSING_COLUMNS: &str = "clxxbh::bigint AS clxxbh, kkbh, kkmc, jgsk, cdbh, hphm, hpys, \
     xsfxdm, cllx, csys, hpzl, clsd, hptp, qjtp";

/// Open a connection pool.
#[instrument(skip(database_url))]
pub async fn connect_pool(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<PgPool, AppError> {
    info!(
        max_connections = max_connections,
        min_connections = min_connections,
        "Connecting to PostgreSQL"
    );

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

async fn ping(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
    Ok(())
}

/// Escape `LIKE` metacharacters so the value matches literally (with `ESCAPE '\'`).
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn username_pattern(filter: &UserFilter) -> Option<String> {
    filter
        .username_contains
        .as_deref()
        .map(|needle| format!("%{}%", escape_like(needle)))
}

/// Users and scopes in the service's own database.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for Database {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        ping(&self.pool).await
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let _timer = db_timer("find_user_by_id");

        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))
    }

    #[instrument(skip(self))]
    async fn find_user_by_name(&self, username: &str) -> Result<Option<User>, AppError> {
        let _timer = db_timer("find_user_by_name");

        let sql = format!(
            "SELECT {} FROM users WHERE username = $1 ORDER BY banned, id DESC LIMIT 1",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))
    }

    #[instrument(skip(self))]
    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Page<User>, AppError> {
        let _timer = db_timer("list_users");
        let pattern = username_pattern(filter);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::varchar IS NULL OR username LIKE $1 ESCAPE '\')
            "#,
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count users: {}", e)))?;

        let sql = format!(
            r#"
            SELECT {}
            FROM users
            WHERE ($1::varchar IS NULL OR username LIKE $1 ESCAPE '\')
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
            USER_COLUMNS
        );
        let items = sqlx::query_as::<_, User>(&sql)
            .bind(pattern.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list users: {}", e)))?;

        Ok(Page { items, total })
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn insert_user(&self, user: &NewUser) -> Result<User, AppError> {
        let _timer = db_timer("insert_user");

        let sql = format!(
            r#"
            INSERT INTO users (username, password, scope, date_created, date_modified, banned)
            VALUES ($1, $2, $3, $4, $4, 0)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.scope.to_string())
            .bind(user.created)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                    AppError::Conflict(anyhow::anyhow!("Username already exists"))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create user: {}", e)),
            })?;

        info!(user_id = created.id, "User created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    async fn update_user(&self, id: i32, changes: &UserChanges) -> Result<bool, AppError> {
        let _timer = db_timer("update_user");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET scope = COALESCE($2, scope),
                password = COALESCE($3, password),
                banned = COALESCE($4, banned),
                date_modified = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.scope.as_ref().map(|s| s.to_string()))
        .bind(changes.password_hash.as_deref())
        .bind(changes.banned)
        .bind(changes.modified)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AppError::Conflict(anyhow::anyhow!("Username already exists"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update user: {}", e)),
        })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn list_scopes(&self) -> Result<Vec<Scope>, AppError> {
        let _timer = db_timer("list_scopes");

        sqlx::query_as::<_, Scope>("SELECT id, name FROM scope ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list scopes: {}", e)))
    }
}

/// Read-only views `v_kkxx` (checkpoints) and `v_gcxx` (crossings) in the kakou database.
#[derive(Clone)]
pub struct KakouDatabase {
    pool: PgPool,
}

impl KakouDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KakouStore for KakouDatabase {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        ping(&self.pool).await
    }

    #[instrument(skip(self))]
    async fn list_checkpoints(&self) -> Result<Vec<Checkpoint>, AppError> {
        let _timer = db_timer("list_checkpoints");

        sqlx::query_as::<_, Checkpoint>(
            "SELECT kkid::bigint AS kkid, kkdm, kkmc, wd, jd FROM v_kkxx ORDER BY kkid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list checkpoints: {}", e))
        })
    }

    #[instrument(skip(self))]
    async fn find_crossing(&self, id: i64) -> Result<Option<CrossingRecord>, AppError> {
        let _timer = db_timer("find_crossing");

        let sql = format!("SELECT {} FROM v_gcxx WHERE clxxbh = $1", CROSSING_COLUMNS);
        sqlx::query_as::<_, CrossingRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get crossing: {}", e)))
    }

    #[instrument(skip(self))]
    async fn list_crossings(
        &self,
        range: IdRange,
        page: PageRequest,
    ) -> Result<Page<CrossingRecord>, AppError> {
        let _timer = db_timer("list_crossings");

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM v_gcxx
            WHERE ($1::bigint IS NULL OR clxxbh >= $1)
              AND ($2::bigint IS NULL OR clxxbh <= $2)
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count crossings: {}", e))
        })?;

        let sql = format!(
            r#"
            SELECT {}
            FROM v_gcxx
            WHERE ($1::bigint IS NULL OR clxxbh >= $1)
              AND ($2::bigint IS NULL OR clxxbh <= $2)
            ORDER BY clxxbh
            LIMIT $3 OFFSET $4
            "#,
            CROSSING_COLUMNS
        );
        let items = sqlx::query_as::<_, CrossingRecord>(&sql)
            .bind(range.start)
            .bind(range.end)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list crossings: {}", e))
            })?;

        Ok(Page { items, total })
    }

    #[instrument(skip(self))]
    async fn max_crossing_id(&self) -> Result<Option<i64>, AppError> {
        let _timer = db_timer("max_crossing_id");

        sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(clxxbh)::bigint FROM v_gcxx")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to get max crossing id: {}", e))
            })
    }
}
