// src/handlers.rs
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{create_jwt, hash_password, verify_password, MaybeAuthUser};
use crate::ics;
use crate::models::{
    AuthResponse, CreateProjectResponse, CreateProjectSchema, LoginSchema, NewProject, Project,
    ProjectWithTasks, RegisterSchema, Task, Tier, TierInfo, UpdateProjectSchema, UpdateTaskSchema,
};
use crate::scheduler::generate_tasks;
use crate::validation::ValidatedJson;
use crate::{AppError, AppState};

// 只有项目所有者能看到/修改；别人的项目一律当作不存在
async fn owned_project(state: &AppState, id: Uuid, owner: Uuid) -> Result<Project, AppError> {
    state
        .store
        .get_project(id)
        .await?
        .filter(|p| p.user_id == owner)
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

// --- 1. 服务等级 (GET /api/tiers) ---
pub async fn list_tiers_handler() -> Json<Vec<TierInfo>> {
    Json(Tier::ALL.iter().map(|t| t.info()).collect())
}

// --- 2. 项目列表 (GET /api/projects) ---
pub async fn list_projects_handler(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = state.store.get_projects_by_user(auth.user_id()).await?;
    Ok(Json(projects))
}

// --- 3. 创建项目并生成当月任务 (POST /api/projects) ---
pub async fn create_project_handler(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateProjectSchema>,
) -> Result<Json<CreateProjectResponse>, AppError> {
    // 先生成任务：等级非法时直接返回，不写入任何数据
    let drafts = generate_tasks(body.tier, body.start_date)?;
    let tier = Tier::try_from(body.tier)?;

    let new_project = NewProject {
        user_id: auth.user_id(),
        name: body.name,
        tier,
        start_date: body.start_date,
        is_active: body.is_active.unwrap_or(true),
    };

    let (project, tasks) = state
        .store
        .create_project_with_tasks(new_project, drafts)
        .await?;

    tracing::info!(
        project_id = %project.id,
        tier = i32::from(project.tier),
        tasks = tasks.len(),
        "project created"
    );

    Ok(Json(CreateProjectResponse {
        project,
        tasks_count: tasks.len(),
    }))
}

// --- 4. 项目详情 (GET /api/projects/:id) ---
pub async fn get_project_handler(
    Path(id): Path<Uuid>,
    auth: MaybeAuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProjectWithTasks>, AppError> {
    let project = owned_project(&state, id, auth.user_id()).await?;
    let tasks = state.store.get_tasks_by_project(project.id).await?;

    Ok(Json(ProjectWithTasks { project, tasks }))
}

// --- 5. 归档/恢复项目 (PATCH /api/projects/:id) ---
pub async fn update_project_handler(
    Path(id): Path<Uuid>,
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<UpdateProjectSchema>,
) -> Result<Json<Project>, AppError> {
    owned_project(&state, id, auth.user_id()).await?;

    let project = state
        .store
        .set_project_active(id, body.is_active)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

// --- 6. 删除项目 (DELETE /api/projects/:id)，任务一并删除 ---
pub async fn delete_project_handler(
    Path(id): Path<Uuid>,
    auth: MaybeAuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    owned_project(&state, id, auth.user_id()).await?;

    if !state.store.delete_project(id).await? {
        return Err(AppError::NotFound("Project not found".to_string()));
    }

    tracing::info!(project_id = %id, "project deleted");
    Ok(StatusCode::NO_CONTENT) // 204 No Content
}

// --- 7. 切换任务完成状态 (PATCH /api/tasks/:id) ---
pub async fn update_task_handler(
    Path(id): Path<Uuid>,
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<UpdateTaskSchema>,
) -> Result<Json<Task>, AppError> {
    let not_found = || AppError::NotFound("Task not found".to_string());

    let task = state.store.get_task(id).await?.ok_or_else(not_found)?;
    owned_project(&state, task.project_id, auth.user_id())
        .await
        .map_err(|_| not_found())?;

    let task = state
        .store
        .update_task(id, body)
        .await?
        .ok_or_else(not_found)?;

    tracing::debug!(task_id = %task.id, is_completed = task.is_completed, "task toggled");
    Ok(Json(task))
}

// --- 8. 导出日历 (GET /api/projects/:id/export) ---
pub async fn export_project_handler(
    Path(id): Path<Uuid>,
    auth: MaybeAuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let project = owned_project(&state, id, auth.user_id()).await?;
    let tasks = state.store.get_tasks_by_project(project.id).await?;

    let body = ics::export_project(&project, &tasks, Utc::now());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        ics::export_filename(&project.name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

// --- 9. 用户注册 ---
pub async fn register_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterSchema>,
) -> Result<Json<serde_json::Value>, AppError> {
    let hashed_password = hash_password(&payload.password).map_err(|e| {
        tracing::error!("password hashing failed: {}", e);
        AppError::Internal
    })?;

    let user = state
        .store
        .create_user(&payload.username, &hashed_password)
        .await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(Json(json!({"message": "User registered successfully"})))
}

// --- 10. 用户登录 ---
pub async fn login_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginSchema>,
) -> Result<Json<AuthResponse>, AppError> {
    // 1. 查找用户
    let user = state
        .store
        .get_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid username or password".into()))?;

    // 2. 验证密码 (演示用户的哈希为空，永远无法登录)
    if !verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::Auth("Invalid username or password".into()));
    }

    // 3. 生成 Token
    let token = create_jwt(user.id, &user.username, &state.config.jwt_secret).map_err(|e| {
        tracing::error!("token signing failed: {}", e);
        AppError::Internal
    })?;

    Ok(Json(AuthResponse {
        token,
        username: user.username,
    }))
}
