//! Leave request repository
//!
//! Decisions run in a transaction that locks the applicant's user row, so
//! two approvals for the same person are serialized and the quota check
//! sees every earlier approval.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nc_core::traits::Id;
use nc_core::types::{LeaveStatus, LeaveType};
use nc_models::LeaveRequest;
use sqlx::{FromRow, PgPool};

use crate::repository::{parse_column, RepositoryError, RepositoryResult};
use crate::stores::{LeaveDecisionRecord, LeaveFilter, LeaveStore, INSUFFICIENT_BALANCE};

const LEAVE_COLUMNS: &str = "id, user_id, leave_type, start_date, end_date, days, reason, status, \
                             rejection_reason, decided_by, decided_at, override_balance, \
                             created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct LeaveRequestRow {
    pub id: i64,
    pub user_id: i64,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i32,
    pub reason: String,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub decided_by: Option<i64>,
    pub decided_at: Option<DateTime<Utc>>,
    pub override_balance: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = RepositoryError;

    fn try_from(row: LeaveRequestRow) -> RepositoryResult<Self> {
        Ok(LeaveRequest {
            id: Some(row.id),
            user_id: row.user_id,
            leave_type: parse_column(&row.leave_type)?,
            start_date: row.start_date,
            end_date: row.end_date,
            days: row.days,
            reason: row.reason,
            status: parse_column(&row.status)?,
            rejection_reason: row.rejection_reason,
            decided_by: row.decided_by,
            decided_at: row.decided_at,
            override_balance: row.override_balance,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

pub struct LeaveRequestRepository {
    pool: PgPool,
}

impl LeaveRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for LeaveRequestRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<LeaveRequest>> {
        let row = sqlx::query_as::<_, LeaveRequestRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LeaveRequest::try_from).transpose()
    }

    async fn list(&self, filter: &LeaveFilter) -> RepositoryResult<Vec<LeaveRequest>> {
        let rows = sqlx::query_as::<_, LeaveRequestRow>(&format!(
            r#"
            SELECT {LEAVE_COLUMNS} FROM leave_requests
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LeaveRequest::try_from).collect()
    }

    async fn create(&self, request: &LeaveRequest) -> RepositoryResult<LeaveRequest> {
        let row = sqlx::query_as::<_, LeaveRequestRow>(&format!(
            r#"
            INSERT INTO leave_requests (user_id, leave_type, start_date, end_date, days, reason, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LEAVE_COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(request.leave_type.as_str())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.days)
        .bind(&request.reason)
        .bind(request.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        LeaveRequest::try_from(row)
    }

    async fn decide(&self, id: Id, decision: &LeaveDecisionRecord) -> RepositoryResult<LeaveRequest> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<i64> =
            sqlx::query_scalar("SELECT user_id FROM leave_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let user_id = user_id.ok_or_else(|| RepositoryError::not_found("LeaveRequest", id))?;

        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let current = sqlx::query_as::<_, LeaveRequestRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        let current = LeaveRequest::try_from(current)?;

        if !current.status.is_pending() {
            return Err(RepositoryError::Conflict(format!(
                "leave request {id} has already been {}",
                current.status.as_str().to_lowercase()
            )));
        }

        if decision.status == LeaveStatus::Approved && !decision.override_balance {
            let used: i64 = sqlx::query_scalar(
                r#"
                SELECT COALESCE(SUM(days), 0)::BIGINT FROM leave_requests
                WHERE user_id = $1 AND leave_type = $2 AND status = 'Approved'
                "#,
            )
            .bind(user_id)
            .bind(current.leave_type.as_str())
            .fetch_one(&mut *tx)
            .await?;

            if used + i64::from(current.days) > decision.quota {
                return Err(RepositoryError::Validation(INSUFFICIENT_BALANCE.into()));
            }
        }

        let row = sqlx::query_as::<_, LeaveRequestRow>(&format!(
            r#"
            UPDATE leave_requests
            SET status = $1, rejection_reason = $2, decided_by = $3, decided_at = NOW(),
                override_balance = $4, updated_at = NOW()
            WHERE id = $5 AND status = 'Pending'
            RETURNING {LEAVE_COLUMNS}
            "#
        ))
        .bind(decision.status.as_str())
        .bind(&decision.rejection_reason)
        .bind(decision.decided_by)
        .bind(decision.override_balance && decision.status == LeaveStatus::Approved)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        LeaveRequest::try_from(row)
    }

    async fn used_days(&self, user_id: Id, leave_type: LeaveType) -> RepositoryResult<i64> {
        let used: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(days), 0)::BIGINT FROM leave_requests
            WHERE user_id = $1 AND leave_type = $2 AND status = 'Approved'
            "#,
        )
        .bind(user_id)
        .bind(leave_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(used)
    }

    async fn on_leave(&self, user_id: Id, date: NaiveDate) -> RepositoryResult<bool> {
        let covered: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM leave_requests
                WHERE user_id = $1 AND status = 'Approved'
                  AND start_date <= $2 AND end_date >= $2
            )
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(covered)
    }

    async fn overlapping(&self, user_id: Id, start: NaiveDate, end: NaiveDate) -> RepositoryResult<bool> {
        let overlaps: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM leave_requests
                WHERE user_id = $1 AND status IN ('Pending', 'Approved')
                  AND start_date <= $3 AND end_date >= $2
            )
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(overlaps)
    }
}
