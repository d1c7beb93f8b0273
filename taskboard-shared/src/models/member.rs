/// Project membership model and database operations
///
/// A membership grants a user visibility of a project. The role is stored
/// and returned to clients but does not gate any operation.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('Admin', 'Member');
///
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'Member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT project_members_project_id_user_id_key UNIQUE (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Membership role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role")]
pub enum MemberRole {
    Admin,

    #[default]
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "Admin",
            MemberRole::Member => "Member",
        }
    }
}

/// Membership row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a membership
#[derive(Debug, Clone)]
pub struct CreateProjectMember {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
}

impl ProjectMember {
    /// Inserts a membership
    ///
    /// Generic over the executor so project creation can run it inside its
    /// transaction.
    ///
    /// # Errors
    ///
    /// Fails with the `project_members_project_id_user_id_key` constraint
    /// when the user is already a member.
    pub async fn create<'e, E>(executor: E, data: CreateProjectMember) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, user_id, role, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    /// Finds the membership of `user_id` in a project
    pub async fn find_by_user(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, created_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists the members of several projects, oldest membership first
    pub async fn list_by_projects(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, created_at
            FROM project_members
            WHERE project_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(pool)
        .await
    }

    /// Lists the members of one project
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        Self::list_by_projects(pool, &[project_id]).await
    }

    /// Changes a member's role
    pub async fn update_role(
        pool: &PgPool,
        project_id: Uuid,
        id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            UPDATE project_members
            SET role = $3
            WHERE project_id = $1 AND id = $2
            RETURNING id, project_id, user_id, role, created_at
            "#,
        )
        .bind(project_id)
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await
    }

    /// Removes a membership
    pub async fn delete(pool: &PgPool, project_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND id = $2")
            .bind(project_id)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
