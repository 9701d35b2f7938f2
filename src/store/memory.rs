// src/store/memory.rs
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, DEMO_USERNAME, DEMO_USER_ID};
use crate::error::StoreError;
use crate::models::{NewProject, NewTask, Project, Task, TaskDraft, UpdateTaskSchema, User};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    tasks: HashMap<Uuid, Task>,
    // 插入顺序，日期相同的任务按它排序
    task_order: Vec<Uuid>,
}

impl Inner {
    fn insert_task(&mut self, task: NewTask) -> Task {
        let task = task.into_task(Uuid::new_v4());
        self.task_order.push(task.id);
        self.tasks.insert(task.id, task.clone());
        task
    }
}

fn build_project(project: NewProject) -> Project {
    Project {
        id: Uuid::new_v4(),
        user_id: project.user_id,
        name: project.name,
        tier: project.tier,
        start_date: project.start_date,
        is_active: project.is_active,
        created_at: Utc::now(),
    }
}

/// 进程内存储，一把读写锁保护所有集合
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut inner = Inner::default();
        inner.users.insert(
            DEMO_USER_ID,
            User {
                id: DEMO_USER_ID,
                username: DEMO_USERNAME.to_string(),
                password_hash: String::new(),
                created_at: Utc::now(),
            },
        );

        Self {
            inner: RwLock::new(inner),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == username) {
            return Err(StoreError::Conflict(format!("username `{username}` is taken")));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let project = build_project(project);
        self.inner
            .write()
            .await
            .projects
            .insert(project.id, project.clone());
        Ok(project)
    }

    async fn create_project_with_tasks(
        &self,
        project: NewProject,
        tasks: Vec<TaskDraft>,
    ) -> Result<(Project, Vec<Task>), StoreError> {
        let project = build_project(project);

        // 同一把写锁内完成，其他请求看不到只写了一半的项目
        let mut inner = self.inner.write().await;
        inner.projects.insert(project.id, project.clone());
        let tasks = tasks
            .into_iter()
            .map(|draft| inner.insert_task(draft.for_project(project.id)))
            .collect();

        Ok((project, tasks))
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(self.inner.read().await.projects.get(&id).cloned())
    }

    async fn get_projects_by_user(&self, user_id: Uuid) -> Result<Vec<Project>, StoreError> {
        let inner = self.inner.read().await;
        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn set_project_active(&self, id: Uuid, is_active: bool) -> Result<Option<Project>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.projects.get_mut(&id).map(|project| {
            project.is_active = is_active;
            project.clone()
        }))
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.projects.remove(&id).is_none() {
            return Ok(false);
        }

        inner.tasks.retain(|_, task| task.project_id != id);
        let Inner {
            tasks, task_order, ..
        } = &mut *inner;
        task_order.retain(|task_id| tasks.contains_key(task_id));
        Ok(true)
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.projects.contains_key(&task.project_id) {
            return Err(StoreError::MissingProject(task.project_id));
        }
        Ok(inner.insert_task(task))
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn get_tasks_by_project(&self, project_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<Task> = inner
            .task_order
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .filter(|task| task.project_id == project_id)
            .cloned()
            .collect();
        // 稳定排序，同一天的任务保持插入顺序
        tasks.sort_by_key(|task| task.scheduled_date);
        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, update: UpdateTaskSchema) -> Result<Option<Task>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.tasks.get_mut(&id).map(|task| {
            task.is_completed = update.is_completed;
            task.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tier;
    use crate::scheduler::generate_tasks;
    use chrono::NaiveDate;

    fn new_project(tier: Tier) -> NewProject {
        NewProject {
            user_id: DEMO_USER_ID,
            name: "Acme".to_string(),
            tier,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            is_active: true,
        }
    }

    async fn seeded(store: &MemoryStore, tier: Tier) -> (Project, Vec<Task>) {
        let drafts = generate_tasks(tier.into(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()).unwrap();
        store
            .create_project_with_tasks(new_project(tier), drafts)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn demo_user_exists_from_the_start() {
        let store = MemoryStore::new();
        let demo = store.get_user(DEMO_USER_ID).await.unwrap().unwrap();
        assert_eq!(demo.username, DEMO_USERNAME);
    }

    #[tokio::test]
    async fn tasks_come_back_in_date_order() {
        let store = MemoryStore::new();
        let (project, created) = seeded(&store, Tier::Premium).await;

        let tasks = store.get_tasks_by_project(project.id).await.unwrap();
        assert_eq!(tasks.len(), created.len());
        assert!(tasks
            .windows(2)
            .all(|w| w[0].scheduled_date <= w[1].scheduled_date));
        assert!(tasks.iter().all(|t| t.project_id == project.id && !t.is_completed));
    }

    #[tokio::test]
    async fn toggling_twice_restores_the_task() {
        let store = MemoryStore::new();
        let (_, tasks) = seeded(&store, Tier::Basic).await;
        let original = tasks[3].clone();

        let done = store
            .update_task(original.id, UpdateTaskSchema { is_completed: true })
            .await
            .unwrap()
            .unwrap();
        assert!(done.is_completed);
        assert_eq!(Task { is_completed: false, ..done }, original);

        let reopened = store
            .update_task(original.id, UpdateTaskSchema { is_completed: false })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::to_vec(&reopened).unwrap(),
            serde_json::to_vec(&original).unwrap()
        );
    }

    #[tokio::test]
    async fn update_of_unknown_task_is_none() {
        let store = MemoryStore::new();
        let result = store
            .update_task(Uuid::new_v4(), UpdateTaskSchema { is_completed: true })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn task_requires_existing_project() {
        let store = MemoryStore::new();
        let orphan = generate_tasks(1, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .unwrap()
            .remove(0)
            .for_project(Uuid::new_v4());

        let err = store.create_task(orphan).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingProject(_)));
    }

    #[tokio::test]
    async fn create_task_attaches_to_project() {
        let store = MemoryStore::new();
        let project = store.create_project(new_project(Tier::Basic)).await.unwrap();
        let draft = generate_tasks(1, project.start_date).unwrap().remove(0);

        let task = store.create_task(draft.for_project(project.id)).await.unwrap();
        assert_eq!(store.get_task(task.id).await.unwrap(), Some(task.clone()));
        assert_eq!(store.get_tasks_by_project(project.id).await.unwrap(), vec![task]);
    }

    #[tokio::test]
    async fn deleting_a_project_removes_its_tasks() {
        let store = MemoryStore::new();
        let (project, tasks) = seeded(&store, Tier::Standard).await;
        let (other, _) = seeded(&store, Tier::Basic).await;

        assert!(store.delete_project(project.id).await.unwrap());
        assert!(store.get_project(project.id).await.unwrap().is_none());
        assert!(store.get_task(tasks[0].id).await.unwrap().is_none());
        assert!(store.get_tasks_by_project(project.id).await.unwrap().is_empty());
        assert_eq!(store.get_tasks_by_project(other.id).await.unwrap().len(), 8);

        assert!(!store.delete_project(project.id).await.unwrap());
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        store.create_user("alice", "hash").await.unwrap();
        let err = store.create_user("alice", "other").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let found = store.get_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "hash");
    }

    #[tokio::test]
    async fn projects_are_listed_per_user() {
        let store = MemoryStore::new();
        seeded(&store, Tier::Basic).await;
        seeded(&store, Tier::Standard).await;

        let mine = store.get_projects_by_user(DEMO_USER_ID).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(store
            .get_projects_by_user(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());

        let archived = store
            .set_project_active(mine[0].id, false)
            .await
            .unwrap()
            .unwrap();
        assert!(!archived.is_active);
        assert_eq!(archived.tier, mine[0].tier);
    }
}
