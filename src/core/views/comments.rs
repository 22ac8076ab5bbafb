use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use tracing::{debug, info};

use super::{base_context, post_detail_url, render, see_other};
use crate::core::auth::RequireUser;
use crate::core::error::{OrNotFound, Result};
use crate::core::server::AppState;
use crate::db::{comments, posts};
use crate::forms::{CommentInput, FormErrors};
use crate::models::{Comment, Post, User};

/// 评论
///
/// 无论表单是否有效都跳回文章详情；无效的评论直接丢弃，不提示错误。
pub async fn add_comment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
    Form(input): Form<CommentInput>,
) -> Result<Response> {
    let post = posts::get(&state.db.pool, id)
        .await?
        .or_not_found(format!("post {}", id))?;

    match input.validate() {
        Ok(text) => {
            let comment = comments::create(&state.db.pool, post.id, user.id, &text).await?;
            info!("Comment {} added to post {} by {}", comment.id, post.id, user.username);
        }
        Err(errors) => {
            debug!("Discarding invalid comment on post {}: {:?}", post.id, errors);
        }
    }

    Ok(see_other(&post_detail_url(post.id)).into_response())
}

/// 找到文章和当前用户在这篇文章下的评论；别人的评论按不存在处理
async fn load_own_comment(
    state: &AppState,
    user: &User,
    post_id: i64,
    comment_id: i64,
) -> Result<(Post, Comment)> {
    let post = posts::get(&state.db.pool, post_id)
        .await?
        .or_not_found(format!("post {}", post_id))?;
    let comment = comments::get_owned(&state.db.pool, comment_id, post.id, user.id)
        .await?
        .or_not_found(format!(
            "comment {} on post {} by user {}",
            comment_id, post.id, user.id
        ))?;
    Ok((post, comment))
}

fn render_comment_page(
    state: &AppState,
    user: &User,
    post: &Post,
    comment: &Comment,
    form: Option<(&CommentInput, &FormErrors)>,
) -> Result<Html<String>> {
    let mut context = base_context(state, Some(user));
    context.insert("post", post);
    context.insert("comment", comment);
    if let Some((form, errors)) = form {
        context.insert("form", form);
        context.insert("errors", errors);
    }
    render(state, "blog/comment.html", &context)
}

pub async fn edit_comment_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Html<String>> {
    let (post, comment) = load_own_comment(&state, &user, post_id, comment_id).await?;
    let form = CommentInput::from_text(&comment.text);
    render_comment_page(&state, &user, &post, &comment, Some((&form, &FormErrors::default())))
}

pub async fn edit_comment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Form(input): Form<CommentInput>,
) -> Result<Response> {
    let (post, comment) = load_own_comment(&state, &user, post_id, comment_id).await?;

    match input.validate() {
        Ok(text) => {
            comments::update_text(&state.db.pool, comment.id, &text).await?;
            info!("Comment {} on post {} edited by {}", comment.id, post.id, user.username);
            Ok(see_other(&post_detail_url(post.id)).into_response())
        }
        Err(errors) => Ok(
            render_comment_page(&state, &user, &post, &comment, Some((&input, &errors)))?
                .into_response(),
        ),
    }
}

/// 删除确认页
pub async fn delete_comment_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Html<String>> {
    let (post, comment) = load_own_comment(&state, &user, post_id, comment_id).await?;
    render_comment_page(&state, &user, &post, &comment, None)
}

pub async fn delete_comment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Response> {
    let (post, comment) = load_own_comment(&state, &user, post_id, comment_id).await?;
    comments::delete(&state.db.pool, comment.id).await?;
    info!("Comment {} on post {} deleted by {}", comment.id, post.id, user.username);

    Ok(see_other(&post_detail_url(post.id)).into_response())
}
