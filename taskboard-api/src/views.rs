/// Response views
///
/// Responses nest full read-only objects rather than bare foreign keys: a
/// task carries its project (with owner and members) and its assignee, a
/// comment carries its author and task. Views are built in batches so a list
/// of N rows costs a fixed number of queries, not N.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use taskboard_shared::models::{
    comment::Comment,
    member::{MemberRole, ProjectMember},
    project::Project,
    task::{Task, TaskPriority, TaskStatus},
    user::User,
};
use uuid::Uuid;

/// Public user fields; the password hash is never included
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            date_joined: user.date_joined,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub id: Uuid,
    pub user: UserView,
    pub role: MemberRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner: UserView,
    pub created_at: DateTime<Utc>,
    pub members: Vec<MemberView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserView>,
    pub project: ProjectView,
    pub created_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub user: UserView,
    pub task: TaskView,
    pub created_at: DateTime<Utc>,
}

fn unique(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Loads users keyed by ID
async fn user_map(
    pool: &PgPool,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, UserView>, sqlx::Error> {
    let ids = unique(ids);
    let users = User::find_many(pool, &ids).await?;

    Ok(users.iter().map(|u| (u.id, UserView::from(u))).collect())
}

/// Looks up a row the schema guarantees exists
///
/// A miss means the row was deleted between queries, reported as not found.
fn lookup<T: Clone>(map: &HashMap<Uuid, T>, id: Uuid) -> Result<T, sqlx::Error> {
    map.get(&id).cloned().ok_or(sqlx::Error::RowNotFound)
}

pub async fn member_views(
    pool: &PgPool,
    members: Vec<ProjectMember>,
) -> Result<Vec<MemberView>, sqlx::Error> {
    let users = user_map(pool, members.iter().map(|m| m.user_id)).await?;

    members
        .into_iter()
        .map(|m| {
            Ok(MemberView {
                id: m.id,
                user: lookup(&users, m.user_id)?,
                role: m.role,
            })
        })
        .collect()
}

pub async fn member_view(pool: &PgPool, member: ProjectMember) -> Result<MemberView, sqlx::Error> {
    member_views(pool, vec![member])
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn project_views(
    pool: &PgPool,
    projects: Vec<Project>,
) -> Result<Vec<ProjectView>, sqlx::Error> {
    let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
    let members = ProjectMember::list_by_projects(pool, &project_ids).await?;

    let users = user_map(
        pool,
        projects
            .iter()
            .map(|p| p.owner_id)
            .chain(members.iter().map(|m| m.user_id)),
    )
    .await?;

    let mut members_by_project: HashMap<Uuid, Vec<MemberView>> = HashMap::new();
    for member in members {
        let view = MemberView {
            id: member.id,
            user: lookup(&users, member.user_id)?,
            role: member.role,
        };
        members_by_project.entry(member.project_id).or_default().push(view);
    }

    projects
        .into_iter()
        .map(|p| {
            Ok(ProjectView {
                id: p.id,
                owner: lookup(&users, p.owner_id)?,
                members: members_by_project.remove(&p.id).unwrap_or_default(),
                name: p.name,
                description: p.description,
                created_at: p.created_at,
            })
        })
        .collect()
}

pub async fn project_view(pool: &PgPool, project: Project) -> Result<ProjectView, sqlx::Error> {
    project_views(pool, vec![project])
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn task_views(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<TaskView>, sqlx::Error> {
    let project_ids = unique(tasks.iter().map(|t| t.project_id));
    let projects = Project::find_many(pool, &project_ids).await?;
    let projects: HashMap<Uuid, ProjectView> = project_views(pool, projects)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let assignees = user_map(pool, tasks.iter().filter_map(|t| t.assigned_to_id)).await?;

    tasks
        .into_iter()
        .map(|t| {
            let assigned_to = match t.assigned_to_id {
                Some(id) => Some(lookup(&assignees, id)?),
                None => None,
            };

            Ok(TaskView {
                id: t.id,
                project: lookup(&projects, t.project_id)?,
                assigned_to,
                title: t.title,
                description: t.description,
                status: t.status,
                priority: t.priority,
                created_at: t.created_at,
                due_date: t.due_date,
            })
        })
        .collect()
}

pub async fn task_view(pool: &PgPool, task: Task) -> Result<TaskView, sqlx::Error> {
    task_views(pool, vec![task])
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn comment_views(
    pool: &PgPool,
    comments: Vec<Comment>,
) -> Result<Vec<CommentView>, sqlx::Error> {
    let task_ids = unique(comments.iter().map(|c| c.task_id));
    let tasks = Task::find_many(pool, &task_ids).await?;
    let tasks: HashMap<Uuid, TaskView> = task_views(pool, tasks)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let authors = user_map(pool, comments.iter().map(|c| c.user_id)).await?;

    comments
        .into_iter()
        .map(|c| {
            Ok(CommentView {
                id: c.id,
                user: lookup(&authors, c.user_id)?,
                task: lookup(&tasks, c.task_id)?,
                content: c.content,
                created_at: c.created_at,
            })
        })
        .collect()
}

pub async fn comment_view(pool: &PgPool, comment: Comment) -> Result<CommentView, sqlx::Error> {
    comment_views(pool, vec![comment])
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)
}
