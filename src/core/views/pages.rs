use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use tracing::debug;

use super::{base_context, render};
use crate::core::auth::CurrentUser;
use crate::core::error::Result;
use crate::core::server::AppState;

/// 关于
pub async fn about(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>> {
    render(&state, "pages/about.html", &base_context(&state, user.as_ref()))
}

/// 规则
pub async fn rules(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>> {
    render(&state, "pages/rules.html", &base_context(&state, user.as_ref()))
}

/// 未匹配任何路由
pub async fn not_found(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    uri: Uri,
) -> Result<Response> {
    debug!("No route for {}", uri);
    let page = render(&state, "pages/404.html", &base_context(&state, user.as_ref()))?;
    Ok((StatusCode::NOT_FOUND, page).into_response())
}
