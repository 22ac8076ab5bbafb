//! 请求处理函数
//!
//! 列表页共用 [`listing`] 中的分页渲染；其余视图直接组合查询、表单和模板。

use axum::response::{Html, Redirect};
use serde::Deserialize;
use tera::Context;

use crate::core::error::Result;
use crate::core::server::AppState;
use crate::forms::FormErrors;
use crate::models::User;

pub mod accounts;
pub mod comments;
pub mod listing;
pub mod pages;
pub mod posts;
pub mod profile;

/// `?page=` 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// 每个模板都能用到的上下文：站点标题、当前用户、空的表单错误
pub fn base_context(state: &AppState, user: Option<&User>) -> Context {
    let mut context = Context::new();
    context.insert("site_title", &state.config.title);
    context.insert("user", &user);
    context.insert("errors", &FormErrors::default());
    context
}

pub fn render(state: &AppState, template: &str, context: &Context) -> Result<Html<String>> {
    Ok(Html(state.renderer.render(template, context)?))
}

pub fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

/// POST 之后的跳转统一使用 303
pub fn see_other(path: &str) -> Redirect {
    Redirect::to(path)
}
