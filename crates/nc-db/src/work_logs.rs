//! Work log repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nc_core::traits::Id;
use nc_models::{WorkLog, WorkLogDetails};
use sqlx::{FromRow, PgPool};

use crate::repository::{parse_column, RepositoryError, RepositoryResult};
use crate::stores::{WorkLogFilter, WorkLogStore};

const LOG_COLUMNS: &str = "id, log_date, user_id, task_id, detail, activity_kind, metadata, \
                           status_update, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct WorkLogRow {
    pub id: i64,
    pub log_date: NaiveDate,
    pub user_id: i64,
    pub task_id: Option<i64>,
    pub detail: String,
    pub activity_kind: String,
    pub metadata: Option<serde_json::Value>,
    pub status_update: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<WorkLogRow> for WorkLog {
    type Error = RepositoryError;

    fn try_from(row: WorkLogRow) -> RepositoryResult<Self> {
        let kind = parse_column(&row.activity_kind)?;
        Ok(WorkLog {
            id: Some(row.id),
            date: row.log_date,
            user_id: row.user_id,
            task_id: row.task_id,
            detail: row.detail,
            details: WorkLogDetails::from_parts(kind, row.metadata),
            status_update: row.status_update.as_deref().map(parse_column).transpose()?,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

pub struct WorkLogRepository {
    pool: PgPool,
}

impl WorkLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, log: &WorkLog, upsert_slot: bool) -> RepositoryResult<WorkLog> {
        let conflict = if upsert_slot {
            r#"
            ON CONFLICT (user_id, log_date) WHERE upsert_slot DO UPDATE SET
                task_id = EXCLUDED.task_id,
                detail = EXCLUDED.detail,
                activity_kind = EXCLUDED.activity_kind,
                metadata = EXCLUDED.metadata,
                status_update = EXCLUDED.status_update,
                updated_at = NOW()
            "#
        } else {
            ""
        };

        let row = sqlx::query_as::<_, WorkLogRow>(&format!(
            r#"
            INSERT INTO work_logs (log_date, user_id, task_id, detail, activity_kind,
                                   metadata, status_update, upsert_slot)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            {conflict}
            RETURNING {LOG_COLUMNS}
            "#
        ))
        .bind(log.date)
        .bind(log.user_id)
        .bind(log.task_id)
        .bind(&log.detail)
        .bind(log.kind().as_str())
        .bind(log.details.metadata())
        .bind(log.status_update.map(|s| s.as_str()))
        .bind(upsert_slot)
        .fetch_one(&self.pool)
        .await?;

        WorkLog::try_from(row)
    }
}

#[async_trait]
impl WorkLogStore for WorkLogRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<WorkLog>> {
        let row = sqlx::query_as::<_, WorkLogRow>(&format!(
            "SELECT {LOG_COLUMNS} FROM work_logs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkLog::try_from).transpose()
    }

    async fn list(&self, filter: &WorkLogFilter) -> RepositoryResult<Vec<WorkLog>> {
        let rows = sqlx::query_as::<_, WorkLogRow>(&format!(
            r#"
            SELECT {LOG_COLUMNS} FROM work_logs
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::DATE IS NULL OR log_date = $2)
              AND ($3::BIGINT IS NULL OR task_id = $3)
            ORDER BY log_date ASC, id ASC
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.date)
        .bind(filter.task_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WorkLog::try_from).collect()
    }

    async fn append(&self, log: &WorkLog) -> RepositoryResult<WorkLog> {
        self.insert(log, false).await
    }

    async fn upsert_daily(&self, log: &WorkLog) -> RepositoryResult<WorkLog> {
        self.insert(log, true).await
    }
}
