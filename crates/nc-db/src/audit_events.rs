//! Audit event repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nc_audit::{AuditError, AuditEvent, AuditFilter, AuditResult, AuditStore};
use nc_core::traits::Id;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow)]
pub struct AuditEventRow {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub entity_kind: String,
    pub entity_id: Option<i64>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AuditEventRow> for AuditEvent {
    type Error = AuditError;

    fn try_from(row: AuditEventRow) -> AuditResult<Self> {
        Ok(AuditEvent {
            id: Some(row.id),
            actor_id: row.actor_id,
            action: row
                .action
                .parse()
                .map_err(|e: nc_core::types::ParseEnumError| AuditError::InvalidData(e.to_string()))?,
            entity_kind: row
                .entity_kind
                .parse()
                .map_err(|e: nc_core::types::ParseEnumError| AuditError::InvalidData(e.to_string()))?,
            entity_id: row.entity_id,
            before: row.before,
            after: row.after,
            message: row.message,
            created_at: row.created_at,
        })
    }
}

fn db_error(err: sqlx::Error) -> AuditError {
    AuditError::Database(err.to_string())
}

pub struct AuditEventRepository {
    pool: PgPool,
}

impl AuditEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for AuditEventRepository {
    async fn append(&self, event: &AuditEvent) -> AuditResult<Id> {
        sqlx::query_scalar(
            r#"
            INSERT INTO audit_events (actor_id, action, entity_kind, entity_id, before, after,
                                      message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(event.actor_id)
        .bind(event.action.as_str())
        .bind(event.entity_kind.as_str())
        .bind(event.entity_id)
        .bind(&event.before)
        .bind(&event.after)
        .bind(&event.message)
        .bind(event.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn list(&self, filter: &AuditFilter) -> AuditResult<Vec<AuditEvent>> {
        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT id, actor_id, action, entity_kind, entity_id, before, after, message, created_at
            FROM audit_events
            WHERE ($1::TEXT IS NULL OR entity_kind = $1)
              AND ($2::BIGINT IS NULL OR entity_id = $2)
              AND ($3::BIGINT IS NULL OR actor_id = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#,
        )
        .bind(filter.entity_kind.map(|k| k.as_str()))
        .bind(filter.entity_id)
        .bind(filter.actor_id)
        .bind(filter.effective_limit() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(AuditEvent::try_from).collect()
    }
}
