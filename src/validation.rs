// src/validation.rs
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use validator::Validate;

use crate::AppError;

/// 请求体提取器：JSON 解析 + validator 校验，任何一步失败都不会进入 handler
pub struct ValidatedJson<T>(pub T);

fn reject(rejection: JsonRejection) -> AppError {
    tracing::debug!(status = %rejection.status(), "rejected request body: {}", rejection.body_text());
    AppError::BadRequest(rejection.body_text())
}

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Validate + serde::de::DeserializeOwned + 'static,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // 缺 Content-Type、JSON 语法错误、字段缺失或类型不对 (比如 isCompleted 传了字符串)
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(reject)?;

        // 字段级规则 (名称长度、密码长度) 通过 AppError::ValidationError 返回
        value.validate()?;

        Ok(ValidatedJson(value))
    }
}
