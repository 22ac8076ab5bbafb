//! 会话认证
//!
//! 登录后在 cookie 中保存一个会话令牌，请求到来时由提取器查出当前用户。

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;

use crate::core::error::AppError;
use crate::core::server::AppState;
use crate::db::sessions;
use crate::models::User;
use crate::utils::login_url;

/// 计算密码的 argon2 哈希
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

/// 校验密码，哈希无法解析时视为不匹配
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// 会话 cookie
pub fn session_cookie(name: &str, token: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// 删除会话 cookie 时使用的同名 cookie
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(name.to_string()).path("/").build()
}

/// 当前用户，匿名访问时为 None
pub struct CurrentUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let user = match jar.get(&state.config.session.cookie_name) {
            Some(cookie) => sessions::find_user(&state.db.pool, cookie.value()).await?,
            None => None,
        };
        Ok(CurrentUser(user))
    }
}

/// 要求已登录，匿名用户被重定向到登录页
pub struct RequireUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match user {
            Some(user) => Ok(RequireUser(user)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                debug!("Anonymous request to {}, redirecting to login", next);
                Err(Redirect::to(&login_url(next)).into_response())
            }
        }
    }
}
