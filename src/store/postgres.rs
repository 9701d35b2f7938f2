// src/store/postgres.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::Store;
use crate::error::StoreError;
use crate::models::{NewProject, NewTask, Project, Task, TaskDraft, Tier, UpdateTaskSchema, User};

// --- 数据库行结构 (枚举字段以文本/整数存储，读出后再解析) ---

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    tier: i32,
    start_date: NaiveDate,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            tier: Tier::try_from(row.tier).map_err(decode_error)?,
            start_date: row.start_date,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    project_id: Uuid,
    title: String,
    description: Option<String>,
    scheduled_date: DateTime<Utc>,
    is_completed: bool,
    priority: String,
    estimated_time: Option<String>,
    task_type: String,
    tier: i32,
    recurring_day: Option<i32>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            scheduled_date: row.scheduled_date,
            is_completed: row.is_completed,
            priority: row.priority.parse().map_err(decode_error)?,
            estimated_time: row.estimated_time,
            task_type: row.task_type.parse().map_err(decode_error)?,
            tier: Tier::try_from(row.tier).map_err(decode_error)?,
            recurring_day: row.recurring_day,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

fn decode_error<E>(err: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Database(sqlx::Error::Decode(Box::new(err)))
}

fn decode_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const INSERT_TASK: &str = "INSERT INTO tasks (id, project_id, title, description, scheduled_date, is_completed, priority, estimated_time, task_type, tier, recurring_day)
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
     RETURNING *";

const INSERT_PROJECT: &str = "INSERT INTO projects (id, user_id, name, tier, start_date, is_active)
     VALUES ($1, $2, $3, $4, $5, $6)
     RETURNING *";

/// PostgreSQL 存储
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// 连接数据库并执行 migrations/ 下的迁移
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))?;

        Ok(Self { pool })
    }
}

async fn insert_task<'e, E>(executor: E, task: NewTask) -> Result<Task, StoreError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, TaskRow>(INSERT_TASK)
        .bind(Uuid::new_v4())
        .bind(task.project_id)
        .bind(task.title)
        .bind(task.description)
        .bind(task.scheduled_date)
        .bind(task.is_completed)
        .bind(task.priority.as_str())
        .bind(task.estimated_time)
        .bind(task.task_type.as_str())
        .bind(i32::from(task.tier))
        .bind(task.recurring_day)
        .fetch_one(executor)
        .await?;

    row.try_into()
}

async fn insert_project<'e, E>(executor: E, project: NewProject) -> Result<Project, StoreError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ProjectRow>(INSERT_PROJECT)
        .bind(Uuid::new_v4())
        .bind(project.user_id)
        .bind(project.name)
        .bind(i32::from(project.tier))
        .bind(project.start_date)
        .bind(project.is_active)
        .fetch_one(executor)
        .await?;

    row.try_into()
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)
             ON CONFLICT (username) DO NOTHING
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from)
            .ok_or_else(|| StoreError::Conflict(format!("username `{username}` is taken")))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        insert_project(&self.pool, project).await
    }

    async fn create_project_with_tasks(
        &self,
        project: NewProject,
        tasks: Vec<TaskDraft>,
    ) -> Result<(Project, Vec<Task>), StoreError> {
        // 事务内写入，任何一条失败都会在 tx 被 drop 时回滚
        let mut tx = self.pool.begin().await?;

        let project = insert_project(&mut *tx, project).await?;
        let mut created = Vec::with_capacity(tasks.len());
        for draft in tasks {
            created.push(insert_task(&mut *tx, draft.for_project(project.id)).await?);
        }

        tx.commit().await?;
        Ok((project, created))
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Project::try_from)
            .transpose()
    }

    async fn get_projects_by_user(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        decode_rows(rows)
    }

    async fn set_project_active(&self, id: Uuid, is_active: bool) -> Result<Option<Project>, StoreError> {
        sqlx::query_as::<_, ProjectRow>(
            "UPDATE projects SET is_active = $1 WHERE id = $2 RETURNING *",
        )
        .bind(is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Project::try_from)
        .transpose()
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError> {
        // tasks.project_id 上有 ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let project_id = task.project_id;
        insert_task(&self.pool, task).await.map_err(|err| match err {
            StoreError::Database(ref e) if is_foreign_key_violation(e) => {
                StoreError::MissingProject(project_id)
            }
            other => other,
        })
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Task::try_from)
            .transpose()
    }

    async fn get_tasks_by_project(&self, project_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks WHERE project_id = $1 ORDER BY scheduled_date ASC, seq ASC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        decode_rows(rows)
    }

    async fn update_task(&self, id: Uuid, update: UpdateTaskSchema) -> Result<Option<Task>, StoreError> {
        sqlx::query_as::<_, TaskRow>(
            "UPDATE tasks SET is_completed = $1 WHERE id = $2 RETURNING *",
        )
        .bind(update.is_completed)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Task::try_from)
        .transpose()
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .map(|code| code == "23503")
        .unwrap_or(false)
}
