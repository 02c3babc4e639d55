//! Task repository
//!
//! Subtree reads and deletes use recursive CTEs so a whole tree is handled
//! in one statement.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nc_core::traits::Id;
use nc_core::types::TaskStatus;
use nc_models::Task;
use sqlx::{FromRow, PgPool};

use crate::repository::{parse_column, RepositoryError, RepositoryResult};
use crate::stores::{TaskFilter, TaskStore};

const TASK_COLUMNS: &str = "id, title, description, assignee_id, parent_id, status, start_date, \
                            end_date, created_by, stakeholders, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub assignee_id: i64,
    pub parent_id: Option<i64>,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: i64,
    pub stakeholders: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = RepositoryError;

    fn try_from(row: TaskRow) -> RepositoryResult<Self> {
        Ok(Task {
            id: Some(row.id),
            title: row.title,
            description: row.description,
            assignee_id: row.assignee_id,
            parent_id: row.parent_id,
            status: parse_column(&row.status)?,
            start_date: row.start_date,
            end_date: row.end_date,
            created_by: row.created_by,
            stakeholders: row.stakeholders,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> RepositoryResult<Vec<Task>> {
    rows.into_iter().map(Task::try_from).collect()
}

pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for TaskRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn list(&self, filter: &TaskFilter) -> RepositoryResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE ($1::BIGINT IS NULL OR assignee_id = $1)
              AND ($2::BIGINT IS NULL OR parent_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
              AND (NOT $4 OR parent_id IS NULL)
            ORDER BY id ASC
            "#
        ))
        .bind(filter.assignee_id)
        .bind(filter.parent_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.roots_only)
        .fetch_all(&self.pool)
        .await?;

        into_tasks(rows)
    }

    async fn create(&self, task: &Task) -> RepositoryResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (title, description, assignee_id, parent_id, status,
                               start_date, end_date, created_by, stakeholders)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assignee_id)
        .bind(task.parent_id)
        .bind(task.status.as_str())
        .bind(task.start_date)
        .bind(task.end_date)
        .bind(task.created_by)
        .bind(&task.stakeholders)
        .fetch_one(&self.pool)
        .await?;

        Task::try_from(row)
    }

    async fn update_status(&self, id: Id, status: TaskStatus) -> RepositoryResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {TASK_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Task", id))?;

        Task::try_from(row)
    }

    async fn descendants(&self, id: Id) -> RepositoryResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id, 1 AS depth FROM tasks WHERE parent_id = $1
                UNION ALL
                SELECT t.id, s.depth + 1 FROM tasks t JOIN subtree s ON t.parent_id = s.id
            )
            SELECT {TASK_COLUMNS} FROM tasks
            JOIN subtree USING (id)
            ORDER BY subtree.depth ASC, id ASC
            "#
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        into_tasks(rows)
    }

    async fn complete_if_children_completed(&self, parent_id: Id) -> RepositoryResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks SET status = 'Completed', updated_at = NOW()
            WHERE id = $1
              AND status <> 'Completed'
              AND EXISTS (SELECT 1 FROM tasks c WHERE c.parent_id = $1)
              AND NOT EXISTS (
                  SELECT 1 FROM tasks c WHERE c.parent_id = $1 AND c.status <> 'Completed'
              )
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn delete_subtree(&self, id: Id) -> RepositoryResult<Vec<Id>> {
        let deleted: Vec<Id> = sqlx::query_scalar(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id FROM tasks WHERE id = $1
                UNION ALL
                SELECT t.id FROM tasks t JOIN subtree s ON t.parent_id = s.id
            )
            DELETE FROM tasks WHERE id IN (SELECT id FROM subtree)
            RETURNING id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        if deleted.is_empty() {
            return Err(RepositoryError::not_found("Task", id));
        }
        tracing::debug!(root = id, count = deleted.len(), "Deleted task subtree");
        Ok(deleted)
    }
}
