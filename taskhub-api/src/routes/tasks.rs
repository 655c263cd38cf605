/// Task CRUD and statistics endpoints
///
/// All endpoints require JWT authentication, and every database query is
/// scoped to the authenticated owner: a task id belonging to another user
/// behaves exactly like a missing one.
///
/// # Endpoints
///
/// - `GET /tasks?status=&priority=&sortBy=&sortOrder=&limit=` - List tasks
/// - `POST /tasks` - Create task
/// - `GET /tasks/:id` - Get a single task
/// - `PUT /tasks/:id` - Partial update
/// - `DELETE /tasks/:id` - Delete task
/// - `GET /tasks/stats/summary` - Per-user counts

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use taskhub_shared::models::task::{
    CreateTask, SortOrder, Task, TaskFilter, TaskPriority, TaskSortField, TaskStats, TaskStatus,
    UpdateTask,
};
use uuid::Uuid;
use validator::Validate;

/// Default number of tasks returned by the list endpoint
const DEFAULT_LIST_LIMIT: i64 = 50;

/// Query parameters for task listing
///
/// Filter and sort values arrive as strings and are parsed against the
/// enum allow-lists; an unknown value is a validation error, never raw
/// input forwarded to the query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    /// Filter by status
    pub status: Option<String>,

    /// Filter by priority
    pub priority: Option<String>,

    /// Sort field (default: createdAt)
    pub sort_by: Option<String>,

    /// Sort direction (default: desc)
    pub sort_order: Option<String>,

    /// Maximum number of tasks to return (default: 50)
    pub limit: Option<i64>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Title (required, 1-100 characters)
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title is required and must be less than 100 characters"
    ))]
    pub title: String,

    /// Optional description (max 500 characters)
    #[validate(length(max = 500, message = "Description must be less than 500 characters"))]
    pub description: Option<String>,

    /// Status (default: pending)
    pub status: Option<TaskStatus>,

    /// Priority (default: medium)
    pub priority: Option<TaskPriority>,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Keeps an explicit `null` distinguishable from an absent field
///
/// Plain `Option` deserializes both to None; wrapping the parsed value in
/// an outer Some means absent stays None while `null` becomes Some(None).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Partial update request
///
/// Explicit allow-list: only these fields can change. The owner and
/// timestamps are never client-writable. Sending `null` for description or
/// dueDate clears the stored value; omitting the field leaves it alone.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// New title (1-100 characters)
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title is required and must be less than 100 characters"
    ))]
    pub title: Option<String>,

    /// New description (max 500 characters), or null to clear it
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500, message = "Description must be less than 500 characters"))]
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date, or null to clear it
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Delete response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTaskResponse {
    /// Human-readable outcome
    pub message: String,
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Parses the list query's string parameters against the enum allow-lists
fn parse_list_query(
    query: &ListTasksQuery,
) -> Result<(TaskFilter, TaskSortField, SortOrder, i64), ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| s.parse::<TaskStatus>())
        .transpose()
        .map_err(|e| ApiError::validation("status", e))?;

    let priority = query
        .priority
        .as_deref()
        .map(|s| s.parse::<TaskPriority>())
        .transpose()
        .map_err(|e| ApiError::validation("priority", e))?;

    let sort_by = query
        .sort_by
        .as_deref()
        .map(|s| s.parse::<TaskSortField>())
        .transpose()
        .map_err(|e| ApiError::validation("sortBy", e))?
        .unwrap_or_default();

    let sort_order = match query.sort_order.as_deref() {
        None => SortOrder::default(),
        Some("asc") => SortOrder::Asc,
        Some("desc") => SortOrder::Desc,
        Some(other) => {
            return Err(ApiError::validation(
                "sortOrder",
                format!("Invalid sort order: {}", other),
            ))
        }
    };

    let limit = match query.limit {
        None => DEFAULT_LIST_LIMIT,
        Some(n) if n > 0 => n,
        Some(n) => {
            return Err(ApiError::validation(
                "limit",
                format!("Limit must be positive, got {}", n),
            ))
        }
    };

    Ok((TaskFilter { status, priority }, sort_by, sort_order, limit))
}

/// List the authenticated user's tasks
///
/// Supports status/priority filters, allow-listed sorting, and a result
/// limit (default 50).
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let (filter, sort_by, sort_order, limit) = parse_list_query(&query)?;

    let tasks = Task::list_by_owner(&state.db, user.id, filter, sort_by, sort_order, limit).await?;

    Ok(Json(tasks))
}

/// Get a single task
///
/// # Errors
///
/// - `404 Not Found`: No task with that id is owned by the caller
pub async fn get_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id_and_owner(&state.db, id, user.id)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task))
}

/// Create a new task
///
/// Validation runs before any persistence attempt; a task that fails
/// validation is never written.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let task = Task::create(
        &state.db,
        user.id,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or_default(),
            priority: req.priority.unwrap_or_default(),
            due_date: req.due_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Apply a partial update to a task
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: No task with that id is owned by the caller
pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let update = UpdateTask {
        title: req.title,
        description: req.description,
        status: req.status,
        priority: req.priority,
        due_date: req.due_date,
    };

    let task = Task::update(&state.db, id, user.id, update)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task))
}

/// Delete a task
///
/// # Errors
///
/// - `404 Not Found`: No task with that id is owned by the caller
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    let deleted = Task::delete(&state.db, id, user.id).await?;

    if !deleted {
        return Err(task_not_found());
    }

    Ok(Json(DeleteTaskResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// Per-user summary counts
///
/// A user with zero tasks gets all-zero counts, never an empty body.
pub async fn stats_summary(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<TaskStats>> {
    let stats = Task::summarize(&state.db, user.id).await?;

    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_query_defaults() {
        let (filter, sort_by, sort_order, limit) =
            parse_list_query(&ListTasksQuery::default()).unwrap();

        assert!(filter.status.is_none());
        assert!(filter.priority.is_none());
        assert_eq!(sort_by, TaskSortField::CreatedAt);
        assert_eq!(sort_order, SortOrder::Desc);
        assert_eq!(limit, 50);
    }

    #[test]
    fn test_parse_list_query_full() {
        let query = ListTasksQuery {
            status: Some("in-progress".to_string()),
            priority: Some("high".to_string()),
            sort_by: Some("dueDate".to_string()),
            sort_order: Some("asc".to_string()),
            limit: Some(10),
        };

        let (filter, sort_by, sort_order, limit) = parse_list_query(&query).unwrap();

        assert_eq!(filter.status, Some(TaskStatus::InProgress));
        assert_eq!(filter.priority, Some(TaskPriority::High));
        assert_eq!(sort_by, TaskSortField::DueDate);
        assert_eq!(sort_order, SortOrder::Asc);
        assert_eq!(limit, 10);
    }

    #[test]
    fn test_parse_list_query_rejects_unknown_sort_field() {
        let query = ListTasksQuery {
            sort_by: Some("password_hash".to_string()),
            ..Default::default()
        };

        let err = parse_list_query(&query).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_parse_list_query_rejects_bad_enum_values() {
        let query = ListTasksQuery {
            status: Some("done".to_string()),
            ..Default::default()
        };
        assert!(parse_list_query(&query).is_err());

        let query = ListTasksQuery {
            priority: Some("urgent".to_string()),
            ..Default::default()
        };
        assert!(parse_list_query(&query).is_err());

        let query = ListTasksQuery {
            sort_order: Some("sideways".to_string()),
            ..Default::default()
        };
        assert!(parse_list_query(&query).is_err());
    }

    #[test]
    fn test_parse_list_query_rejects_non_positive_limit() {
        let query = ListTasksQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert!(parse_list_query(&query).is_err());
    }

    #[test]
    fn test_create_task_request_empty_title_fails() {
        let req = CreateTaskRequest {
            title: String::new(),
            description: None,
            status: None,
            priority: None,
            due_date: None,
        };

        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("title"));
    }

    #[test]
    fn test_create_task_request_long_description_fails() {
        let req = CreateTaskRequest {
            title: "Write report".to_string(),
            description: Some("x".repeat(501)),
            status: None,
            priority: None,
            due_date: None,
        };

        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("description"));
    }

    #[test]
    fn test_update_task_request_all_absent_is_valid() {
        let req = UpdateTaskRequest {
            title: None,
            description: None,
            status: None,
            priority: None,
            due_date: None,
        };

        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_task_request_null_clears_nullable_fields() {
        // Explicit null marks the field for clearing
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": null, "dueDate": null}"#).unwrap();
        assert_eq!(req.description, Some(None));
        assert_eq!(req.due_date, Some(None));
        assert!(req.title.is_none());

        // Absent fields stay untouched
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"title": "T1"}"#).unwrap();
        assert!(req.description.is_none());
        assert!(req.due_date.is_none());

        // A value still replaces
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": "notes"}"#).unwrap();
        assert_eq!(req.description, Some(Some("notes".to_string())));
    }

    #[test]
    fn test_update_task_request_validates_replacement_description() {
        let req = UpdateTaskRequest {
            title: None,
            description: Some(Some("x".repeat(501))),
            status: None,
            priority: None,
            due_date: None,
        };

        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("description"));
    }

    #[test]
    fn test_create_task_request_parses_camel_case() {
        let req: CreateTaskRequest = serde_json::from_str(
            r#"{"title": "T1", "status": "in-progress", "priority": "high",
                "dueDate": "2026-09-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(req.status, Some(TaskStatus::InProgress));
        assert_eq!(req.priority, Some(TaskPriority::High));
        assert!(req.due_date.is_some());
    }
}
