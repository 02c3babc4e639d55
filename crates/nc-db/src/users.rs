//! User repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nc_core::traits::Id;
use nc_models::User;
use sqlx::{FromRow, PgPool};

use crate::repository::{parse_column, RepositoryError, RepositoryResult};
use crate::stores::{UserFilter, UserStore};

const USER_COLUMNS: &str = "id, email, name, role, password_hash, must_set_password, active, \
                            last_login_at, created_at, updated_at";

/// User database row
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub password_hash: Option<String>,
    pub must_set_password: bool,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> RepositoryResult<Self> {
        Ok(User {
            id: Some(row.id),
            email: row.email,
            name: row.name,
            role: parse_column(&row.role)?,
            password_hash: row.password_hash,
            must_set_password: row.must_set_password,
            active: row.active,
            last_login_at: row.last_login_at,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

/// User repository implementation
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by_id(&self, id: Id) -> RepositoryResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("User", id))
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn list(&self, filter: &UserFilter) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1::TEXT IS NULL OR role = $1)
              AND ($2::BOOLEAN IS NULL OR active = $2)
            ORDER BY email ASC
            "#
        ))
        .bind(filter.role.map(|r| r.as_str()))
        .bind(filter.active)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn create(&self, user: &User) -> RepositoryResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, name, role, password_hash, must_set_password, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.must_set_password)
        .bind(user.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, format!("email {} is already registered", user.email)))?;

        User::try_from(row)
    }

    async fn set_initial_password(&self, id: Id, password_hash: &str) -> RepositoryResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET password_hash = $1, must_set_password = FALSE, updated_at = NOW()
            WHERE id = $2 AND must_set_password
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => User::try_from(row),
            None => {
                self.fetch_one_by_id(id).await?;
                Err(RepositoryError::Conflict("Password has already been set".into()))
            }
        }
    }

    async fn record_login(&self, id: Id) -> RepositoryResult<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_active(&self, id: Id, active: bool) -> RepositoryResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET active = $1, updated_at = NOW() WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found("User", id))?;

        User::try_from(row)
    }
}
