/// Task model and database operations
///
/// Tasks are the core entity of TaskHub. Every task is owned by exactly one
/// user, and every query in this module is scoped to that owner: lookups,
/// updates, and deletes all match on `id AND user_id`, so a task that exists
/// but belongs to someone else is indistinguishable from one that doesn't
/// exist at all.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(100) NOT NULL,
///     description VARCHAR(500),
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::task::{Task, CreateTask, TaskPriority, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, owner, CreateTask {
///     title: "Write report".to_string(),
///     description: None,
///     status: TaskStatus::Pending,
///     priority: TaskPriority::High,
///     due_date: None,
/// }).await?;
///
/// let stats = Task::summarize(&pool, owner).await?;
/// assert_eq!(stats.high_priority, 1);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started yet (default)
    Pending,

    /// Being worked on
    InProgress,

    /// Done
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    /// Gets status as string (matches the wire and database representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl TaskPriority {
    /// Gets priority as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(format!("Invalid priority: {}", other)),
        }
    }
}

/// Allow-listed sort fields for task listing
///
/// Sort requests are parsed into this enum before any query is built, so an
/// arbitrary field name from the client can never reach the SQL layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskSortField {
    Title,
    Status,
    Priority,
    DueDate,
    CreatedAt,
    UpdatedAt,
}

impl Default for TaskSortField {
    fn default() -> Self {
        TaskSortField::CreatedAt
    }
}

impl TaskSortField {
    /// Column name for ORDER BY
    ///
    /// Only ever returns a known column, never client input.
    pub fn column(&self) -> &'static str {
        match self {
            TaskSortField::Title => "title",
            TaskSortField::Status => "status",
            TaskSortField::Priority => "priority",
            TaskSortField::DueDate => "due_date",
            TaskSortField::CreatedAt => "created_at",
            TaskSortField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for TaskSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(TaskSortField::Title),
            "status" => Ok(TaskSortField::Status),
            "priority" => Ok(TaskSortField::Priority),
            "dueDate" => Ok(TaskSortField::DueDate),
            "createdAt" => Ok(TaskSortField::CreatedAt),
            "updatedAt" => Ok(TaskSortField::UpdatedAt),
            other => Err(format!("Unknown sort field: {}", other)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

impl SortOrder {
    /// SQL keyword for ORDER BY
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Task model
///
/// Serialized in camelCase for the API wire format.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user; immutable after creation
    pub user_id: Uuid,

    /// Title (1-100 characters)
    pub title: String,

    /// Optional description (max 500 characters)
    pub description: Option<String>,

    /// Current status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// The owner comes from the authenticated identity, never from the payload.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
}

/// Allow-listed partial update
///
/// Only these five fields can change through the API; the owner and
/// timestamps are never client-writable. A field left as None is not
/// touched. The nullable columns use a nested Option: `Some(None)` writes
/// NULL, so a description or due date can be cleared, not just replaced.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Filters for task listing
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

/// Per-user task summary counts
///
/// A user with zero tasks gets all-zero counts, never an absent result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub high_priority: i64,
}

const TASK_COLUMNS: &str =
    "id, user_id, title, description, status, priority, due_date, created_at, updated_at";

impl Task {
    /// Creates a new task owned by `owner_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description, status, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, description, status, priority, due_date,
                      created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, scoped to its owner
    ///
    /// Returns None both when the task doesn't exist and when it belongs to
    /// a different user; callers cannot probe other users' task ids.
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, priority, due_date,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks for an owner with optional filters, sorting, and a limit
    ///
    /// The sort column comes from the [`TaskSortField`] allow-list, so the
    /// interpolation below can never see client-controlled text.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: Uuid,
        filter: TaskFilter,
        sort_by: TaskSortField,
        sort_order: SortOrder,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {columns}
            FROM tasks
            WHERE user_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::task_priority IS NULL OR priority = $3)
            ORDER BY {column} {order}
            LIMIT $4
            "#,
            columns = TASK_COLUMNS,
            column = sort_by.column(),
            order = sort_order.keyword(),
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(owner_id)
            .bind(filter.status)
            .bind(filter.priority)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Applies a partial update to an owned task
    ///
    /// Only non-None fields are written; `updated_at` is always bumped.
    /// The nullable columns take a set-flag plus value, so `Some(None)`
    /// writes NULL instead of being swallowed by a COALESCE.
    /// Returns None if no task with that id is owned by `owner_id`.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let set_description = data.description.is_some();
        let set_due_date = data.due_date.is_some();

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                status = COALESCE($6, status),
                priority = COALESCE($7, priority),
                due_date = CASE WHEN $8 THEN $9 ELSE due_date END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, status, priority, due_date,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(data.title)
        .bind(set_description)
        .bind(data.description.flatten())
        .bind(data.status)
        .bind(data.priority)
        .bind(set_due_date)
        .bind(data.due_date.flatten())
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes an owned task
    ///
    /// Returns true if a task was deleted, false if no task with that id is
    /// owned by `owner_id`.
    pub async fn delete(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Computes per-user summary counts in a single aggregate query
    ///
    /// An aggregate without GROUP BY always yields one row, so a user with
    /// zero tasks gets all-zero counts rather than no result.
    pub async fn summarize(pool: &PgPool, owner_id: Uuid) -> Result<TaskStats, sqlx::Error> {
        let stats = sqlx::query_as::<_, TaskStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                   COUNT(*) FILTER (WHERE status = 'in-progress') AS in_progress,
                   COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                   COUNT(*) FILTER (WHERE priority = 'high') AS high_priority
            FROM tasks
            WHERE user_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }
}
