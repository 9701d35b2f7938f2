// src/store/mod.rs
//! 存储层抽象。默认使用内存实现，设置 DATABASE_URL 时切换到 Postgres。

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewProject, NewTask, Project, Task, TaskDraft, UpdateTaskSchema, User};

/// 未登录请求的项目都归到这个用户名下
pub const DEMO_USER_ID: Uuid = Uuid::nil();
pub const DEMO_USERNAME: &str = "demo-user";

#[async_trait]
pub trait Store: Send + Sync {
    // --- 用户 ---
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    // --- 项目 ---
    async fn create_project(&self, project: NewProject) -> Result<Project, StoreError>;

    /// 项目和它的全部任务一起写入，要么全部成功，要么什么都不留下
    async fn create_project_with_tasks(
        &self,
        project: NewProject,
        tasks: Vec<TaskDraft>,
    ) -> Result<(Project, Vec<Task>), StoreError>;

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, StoreError>;

    /// 按创建时间倒序
    async fn get_projects_by_user(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError>;

    async fn set_project_active(&self, id: Uuid, is_active: bool) -> Result<Option<Project>, StoreError>;

    /// 连同任务一起删除，返回是否存在
    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError>;

    // --- 任务 ---
    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError>;
    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// 按 scheduled_date 升序
    async fn get_tasks_by_project(&self, project_id: Uuid) -> Result<Vec<Task>, StoreError>;

    async fn update_task(&self, id: Uuid, update: UpdateTaskSchema) -> Result<Option<Task>, StoreError>;
}
