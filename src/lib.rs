// src/lib.rs
use axum::{
    http::Method,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ics;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::AppError;

use handlers::*;
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        // 认证
        .route("/api/register", post(register_handler))
        .route("/api/login", post(login_handler))
        // 服务等级
        .route("/api/tiers", get(list_tiers_handler))
        // 项目路由
        .route(
            "/api/projects",
            get(list_projects_handler).post(create_project_handler),
        )
        .route(
            "/api/projects/:id",
            get(get_project_handler)
                .patch(update_project_handler)
                .delete(delete_project_handler),
        )
        .route("/api/projects/:id/export", get(export_project_handler))
        // 任务路由
        .route("/api/tasks/:id", patch(update_task_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
