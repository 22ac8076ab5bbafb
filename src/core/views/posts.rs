use axum::{
    extract::{Multipart, Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use std::path::Path as StdPath;
use tera::Context;
use tracing::{debug, info};

use super::listing::{render_listing, CategoryListing, HomeListing};
use super::{base_context, post_detail_url, profile_url, render, see_other, PageQuery};
use crate::core::auth::{CurrentUser, RequireUser};
use crate::core::error::{AppError, OrNotFound, Result};
use crate::core::media;
use crate::core::server::AppState;
use crate::db::posts::PostFields;
use crate::db::{categories, comments, locations, posts, PostQuery};
use crate::forms::{CommentInput, FormErrors, ImageAction, PostChoices, PostInput, Upload};
use crate::models::{Post, User};

/// 首页
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PageQuery>,
) -> Result<Html<String>> {
    let listing = HomeListing { now: Utc::now() };
    render_listing(&state, listing, params.page.as_deref(), user.as_ref()).await
}

/// 分类下的文章
pub async fn category_posts(
    State(state): State<AppState>,
    Path(category_slug): Path<String>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PageQuery>,
) -> Result<Html<String>> {
    let listing = CategoryListing {
        slug: category_slug,
        now: Utc::now(),
    };
    render_listing(&state, listing, params.page.as_deref(), user.as_ref()).await
}

/// 文章详情，附带评论列表和空的评论表单
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>> {
    let post = posts::find_card(&state.db.pool, &PostQuery::public_post(id, Utc::now()))
        .await?
        .or_not_found(format!("post {}", id))?;
    let comments = comments::list_for_post(&state.db.pool, post.id).await?;

    let mut context = base_context(&state, user.as_ref());
    context.insert("post", &post);
    context.insert("form", &CommentInput::default());
    context.insert("comments", &comments);
    render(&state, "blog/detail.html", &context)
}

/// 从 multipart 请求体读取文章表单
async fn read_post_input(mut multipart: Multipart) -> Result<PostInput> {
    let mut input = PostInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            // 浏览器在未选择文件时也会提交一个空的 image 字段
            if !filename.is_empty() && !bytes.is_empty() {
                input.image = Some(Upload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        match name.as_str() {
            "title" => input.title = value,
            "text" => input.text = value,
            "pub_date" => input.pub_date = value,
            "location" => input.location = value,
            "category" => input.category = value,
            "image-clear" => input.image_clear = true,
            _ => {}
        }
    }

    Ok(input)
}

async fn post_choices(state: &AppState) -> Result<PostChoices> {
    let category_ids = categories::list(&state.db.pool)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    let location_ids = locations::list(&state.db.pool)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect();
    Ok(PostChoices {
        category_ids,
        location_ids,
    })
}

/// 创建、编辑、删除共用 create.html
async fn post_form_context(
    state: &AppState,
    user: &User,
    form: &PostInput,
    errors: &FormErrors,
    post: Option<&Post>,
    action: &str,
    is_delete: bool,
) -> Result<Context> {
    let mut context = base_context(state, Some(user));
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("post", &post);
    context.insert("action", action);
    context.insert("is_delete", &is_delete);
    context.insert("categories", &categories::list(&state.db.pool).await?);
    context.insert("locations", &locations::list(&state.db.pool).await?);
    Ok(context)
}

/// 已写入磁盘、尚未落库的图片变更
#[derive(Debug, Default)]
struct StagedImage {
    /// 要写入文章的图片路径
    image: Option<String>,
    /// 本次新保存的文件
    fresh: Option<String>,
    /// 落库成功后才删除的旧文件
    stale: Option<String>,
}

impl StagedImage {
    /// 数据库写入成功，删除被替换或清除的旧文件
    async fn commit(self, media_dir: &StdPath) {
        if let Some(old) = self.stale {
            media::remove(media_dir, &old).await;
        }
    }

    /// 数据库写入失败，删除刚保存的新文件，旧文件保持不动
    async fn rollback(self, media_dir: &StdPath) {
        if let Some(new) = self.fresh {
            media::remove(media_dir, &new).await;
        }
    }
}

/// 先保存新图片，不删除任何已有文件
async fn stage_image(
    media_dir: &StdPath,
    action: &ImageAction,
    current: Option<&str>,
) -> Result<StagedImage> {
    let staged = match action {
        ImageAction::Keep => StagedImage {
            image: current.map(str::to_string),
            ..Default::default()
        },
        ImageAction::Clear => StagedImage {
            stale: current.map(str::to_string),
            ..Default::default()
        },
        ImageAction::Replace(upload) => {
            let saved = media::save_upload(media_dir, upload).await?;
            StagedImage {
                image: Some(saved.clone()),
                fresh: Some(saved),
                stale: current.map(str::to_string),
            }
        }
    };
    Ok(staged)
}

pub async fn create_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Html<String>> {
    let form = PostInput::initial(Utc::now());
    let context = post_form_context(
        &state,
        &user,
        &form,
        &FormErrors::default(),
        None,
        "/posts/create/",
        false,
    )
    .await?;
    render(&state, "blog/create.html", &context)
}

/// 新建文章，作者为当前用户，成功后跳转到作者主页
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    multipart: Multipart,
) -> Result<Response> {
    let input = read_post_input(multipart).await?;
    let choices = post_choices(&state).await?;

    let cleaned = match input.validate(&choices) {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            debug!("Post form rejected: {:?}", errors);
            let context =
                post_form_context(&state, &user, &input, &errors, None, "/posts/create/", false)
                    .await?;
            return Ok(render(&state, "blog/create.html", &context)?.into_response());
        }
    };

    let media_dir = &state.config.media_dir;
    let staged = stage_image(media_dir, &cleaned.image, None).await?;
    let fields = PostFields {
        title: cleaned.title,
        text: cleaned.text,
        pub_date: cleaned.pub_date,
        location_id: cleaned.location_id,
        category_id: Some(cleaned.category_id),
        image: staged.image.clone(),
    };
    let post = match posts::create(&state.db.pool, user.id, &fields).await {
        Ok(post) => post,
        Err(e) => {
            staged.rollback(media_dir).await;
            return Err(e.into());
        }
    };
    staged.commit(media_dir).await;
    info!("Post {} created by {}", post.id, user.username);

    Ok(see_other(&profile_url(&user.username)).into_response())
}

enum EditAccess {
    Author(Post),
    Redirect(Response),
}

/// 编辑前的检查：文章必须存在，非作者被送回详情页
async fn load_for_edit(state: &AppState, user: &User, id: i64) -> Result<EditAccess> {
    let post = posts::get(&state.db.pool, id)
        .await?
        .or_not_found(format!("post {}", id))?;
    if post.author_id != user.id {
        debug!("User {} is not the author of post {}, redirecting", user.id, id);
        return Ok(EditAccess::Redirect(
            see_other(&post_detail_url(post.id)).into_response(),
        ));
    }
    let post = posts::get_owned(&state.db.pool, id, user.id)
        .await?
        .or_not_found(format!("post {} of user {}", id, user.id))?;
    Ok(EditAccess::Author(post))
}

pub async fn edit_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let post = match load_for_edit(&state, &user, id).await? {
        EditAccess::Author(post) => post,
        EditAccess::Redirect(redirect) => return Ok(redirect),
    };

    let form = PostInput::from_post(&post);
    let action = format!("/posts/{}/edit/", post.id);
    let context = post_form_context(
        &state,
        &user,
        &form,
        &FormErrors::default(),
        Some(&post),
        &action,
        false,
    )
    .await?;
    Ok(render(&state, "blog/create.html", &context)?.into_response())
}

/// 保存编辑，成功后跳转到文章详情
pub async fn edit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Response> {
    let post = match load_for_edit(&state, &user, id).await? {
        EditAccess::Author(post) => post,
        EditAccess::Redirect(redirect) => return Ok(redirect),
    };

    let input = read_post_input(multipart).await?;
    let choices = post_choices(&state).await?;
    let cleaned = match input.validate(&choices) {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            let action = format!("/posts/{}/edit/", post.id);
            let context =
                post_form_context(&state, &user, &input, &errors, Some(&post), &action, false)
                    .await?;
            return Ok(render(&state, "blog/create.html", &context)?.into_response());
        }
    };

    let media_dir = &state.config.media_dir;
    let staged = stage_image(media_dir, &cleaned.image, post.image.as_deref()).await?;
    let fields = PostFields {
        title: cleaned.title,
        text: cleaned.text,
        pub_date: cleaned.pub_date,
        location_id: cleaned.location_id,
        category_id: Some(cleaned.category_id),
        image: staged.image.clone(),
    };
    match posts::update_owned(&state.db.pool, post.id, user.id, &fields).await {
        Ok(true) => staged.commit(media_dir).await,
        Ok(false) => {
            staged.rollback(media_dir).await;
            return Err(AppError::not_found(format!("post {} of user {}", post.id, user.id)));
        }
        Err(e) => {
            staged.rollback(media_dir).await;
            return Err(e.into());
        }
    }
    info!("Post {} updated by {}", post.id, user.username);

    Ok(see_other(&post_detail_url(post.id)).into_response())
}

/// 删除确认页，以只读方式展示文章表单
pub async fn delete_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
) -> Result<Html<String>> {
    let post = posts::get_owned(&state.db.pool, id, user.id)
        .await?
        .or_not_found(format!("post {} of user {}", id, user.id))?;

    let form = PostInput::from_post(&post);
    let action = format!("/posts/{}/delete/", post.id);
    let context = post_form_context(
        &state,
        &user,
        &form,
        &FormErrors::default(),
        Some(&post),
        &action,
        true,
    )
    .await?;
    render(&state, "blog/create.html", &context)
}

pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let post = posts::get_owned(&state.db.pool, id, user.id)
        .await?
        .or_not_found(format!("post {} of user {}", id, user.id))?;

    if !posts::delete_owned(&state.db.pool, post.id, user.id).await? {
        return Err(AppError::not_found(format!("post {} of user {}", post.id, user.id)));
    }
    if let Some(image) = &post.image {
        media::remove(&state.config.media_dir, image).await;
    }
    info!("Post {} deleted by {}", post.id, user.username);

    Ok(see_other("/").into_response())
}
