/// Project model and database operations
///
/// A project is a named container of tasks with exactly one owner and any
/// number of members. Creating a project also enrolls the owner as an
/// `Admin` member in the same transaction, so a project is never observable
/// without its owning membership.
///
/// # Visibility
///
/// A project is visible to a user when the user owns it or holds a
/// membership row for it. Every `*_visible` query below applies that rule in
/// SQL; tasks and comments reuse it through their project.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::member::{CreateProjectMember, MemberRole, ProjectMember};

/// Project row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    pub name: String,

    pub description: String,

    /// Owning user; deleting the owner deletes the project
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
}

/// Input for updating a project; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Project {
    /// Creates a project and its owner's `Admin` membership atomically
    ///
    /// # Returns
    ///
    /// The project together with the owner's membership row
    pub async fn create_with_owner(
        pool: &PgPool,
        data: CreateProject,
    ) -> Result<(Self, ProjectMember), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, owner_id, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        let membership = ProjectMember::create(
            &mut *tx,
            CreateProjectMember {
                project_id: project.id,
                user_id: project.owner_id,
                role: MemberRole::Admin,
            },
        )
        .await?;

        tx.commit().await?;

        debug!(project_id = %project.id, owner_id = %project.owner_id, "Created project");
        Ok((project, membership))
    }

    /// Finds a project by ID regardless of visibility
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, owner_id, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a project by ID if it is visible to `user_id`
    pub async fn find_visible(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.description, p.owner_id, p.created_at
            FROM projects p
            WHERE p.id = $1
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

    /// Lists the projects visible to `user_id`, oldest first
    pub async fn list_visible(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.description, p.owner_id, p.created_at
            FROM projects p
            WHERE p.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM project_members m
                   WHERE m.project_id = p.id AND m.user_id = $1
               )
            ORDER BY p.created_at ASC, p.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Loads several projects at once (no visibility filter)
    pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, owner_id, created_at
            FROM projects
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Lists projects owned by a user
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, owner_id, created_at
            FROM projects
            WHERE owner_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    /// Updates name and/or description
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description, owner_id, created_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a project with its memberships, tasks and comments
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
