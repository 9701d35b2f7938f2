// src/auth.rs
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString
    },
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::DEMO_USER_ID;
use crate::{AppError, AppState};

// --- 1. 密码处理 (Argon2) ---

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(password_hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// --- 2. JWT (Access Token) 处理 ---

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,        // 用户 ID
    pub username: String,
    pub exp: usize,       // 过期时间
}

/// 生成短效的 Access Token，有效期 15 分钟
pub fn create_jwt(user_id: Uuid, username: &str, secret: &str) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::minutes(15))
        .ok_or_else(|| "token expiry overflow".to_string())?
        .timestamp();

    let claims = Claims {
        sub: user_id,
        username: username.to_owned(),
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

// --- 3. 认证提取器 (AuthUser Extractor) ---
// Handler 中通过 (user: AuthUser) 获取当前登录用户；
// MaybeAuthUser: 没有 Authorization 头时落到演示用户，带了无效 token 仍然 401

pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    /// 请求方：登录用户，否则是演示用户
    pub fn user_id(&self) -> Uuid {
        self.0.as_ref().map(|u| u.id).unwrap_or(DEMO_USER_ID)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // 1. 从 HTTP Header 提取 Bearer Token
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Auth("Missing or malformed bearer token".into()))?;

        // 2. 验证 Token 有效性
        let claims = decode_jwt(bearer.token(), &state.config.jwt_secret).map_err(|e| {
            tracing::warn!("JWT validation failed: {}", e);
            AppError::Auth("Token expired or invalid".into())
        })?;

        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(MaybeAuthUser(Some(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-hash"));
    }

    #[test]
    fn token_carries_the_user_id() {
        let id = Uuid::new_v4();
        let token = create_jwt(id, "alice", "secret").unwrap();
        let claims = decode_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "alice");
        assert!(decode_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn anonymous_requests_belong_to_the_demo_user() {
        assert_eq!(MaybeAuthUser(None).user_id(), DEMO_USER_ID);
        let user = AuthUser {
            id: Uuid::new_v4(),
            username: "bob".into(),
        };
        let id = user.id;
        assert_eq!(MaybeAuthUser(Some(user)).user_id(), id);
    }
}
