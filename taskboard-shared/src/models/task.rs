/// Task model and database operations
///
/// Tasks belong to exactly one project and may be assigned to one user.
/// Status and priority are plain enumerations; any value may be set at any
/// time, there is no transition table.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('To Do', 'In Progress', 'Done');
/// CREATE TYPE task_priority AS ENUM ('Low', 'Medium', 'High');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status task_status NOT NULL DEFAULT 'To Do',
///     priority task_priority NOT NULL DEFAULT 'Medium',
///     assigned_to_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     due_date TIMESTAMPTZ NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     project_id,
///     title: "Write release notes".to_string(),
///     description: "Cover the API changes".to_string(),
///     status: TaskStatus::ToDo,
///     priority: TaskPriority::High,
///     assigned_to_id: None,
///     due_date: chrono::Utc::now() + chrono::Duration::days(7),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    #[sqlx(rename = "To Do")]
    ToDo,

    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,

    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    Low,

    #[default]
    Medium,

    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    pub description: String,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// Assignee; reset to NULL when the user is deleted
    pub assigned_to_id: Option<Uuid>,

    /// Owning project; fixed at creation
    pub project_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub due_date: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to_id: Option<Uuid>,
    pub due_date: DateTime<Utc>,
}

/// Input for updating a task
///
/// Only `Some` fields are written. `assigned_to_id: Some(None)` clears the
/// assignee.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to_id: Option<Option<Uuid>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assigned_to_id.is_none()
            && self.due_date.is_none()
    }
}

impl Task {
    /// Inserts a task
    ///
    /// The caller is responsible for checking that the project is visible
    /// to the acting user; this only enforces referential integrity.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, assigned_to_id, project_id, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, status, priority, assigned_to_id,
                      project_id, created_at, due_date
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.assigned_to_id)
        .bind(data.project_id)
        .bind(data.due_date)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by ID regardless of visibility
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, assigned_to_id,
                   project_id, created_at, due_date
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a task by ID if its project is visible to `user_id`
    pub async fn find_visible(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.priority, t.assigned_to_id,
                   t.project_id, t.created_at, t.due_date
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.id = $1
              AND (
                  p.owner_id = $2
                  OR EXISTS (
                      SELECT 1 FROM project_members m
                      WHERE m.project_id = p.id AND m.user_id = $2
                  )
              )
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists tasks whose project is visible to `user_id`, oldest first
    pub async fn list_visible(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.priority, t.assigned_to_id,
                   t.project_id, t.created_at, t.due_date
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE p.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM project_members m
                   WHERE m.project_id = p.id AND m.user_id = $1
               )
            ORDER BY t.created_at ASC, t.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Lists all tasks of a project, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, assigned_to_id,
                   project_id, created_at, due_date
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Loads several tasks at once (no visibility filter)
    pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, assigned_to_id,
                   project_id, created_at, due_date
            FROM tasks
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Updates a task
    ///
    /// Returns `None` when the task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut assignments = Vec::new();
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            assignments.push(format!("title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            assignments.push(format!("description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            assignments.push(format!("status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            assignments.push(format!("priority = ${}", bind_count));
        }
        if data.assigned_to_id.is_some() {
            bind_count += 1;
            assignments.push(format!("assigned_to_id = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            assignments.push(format!("due_date = ${}", bind_count));
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = $1 \
             RETURNING id, title, description, status, priority, assigned_to_id, \
             project_id, created_at, due_date",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(assigned_to_id) = data.assigned_to_id {
            q = q.bind(assigned_to_id);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a task and its comments
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
