use axum::async_trait;
use axum::response::Html;
use chrono::{DateTime, Utc};
use tera::Context;

use super::{base_context, render};
use crate::core::error::{OrNotFound, Result};
use crate::core::server::AppState;
use crate::db::{categories, posts, users, PageParam, Paginator, PostQuery};
use crate::models::{Profile, User};

/// 分页文章列表
///
/// 实现者给出模板和查询条件，并可以往上下文里补充数据；
/// 分页、评论数统计和渲染由 [`render_listing`] 完成。
#[async_trait]
pub trait PostListing: Send + Sync {
    fn template(&self) -> &'static str;

    /// 查询条件；找不到路径中的对象时返回 NotFound
    async fn query(&mut self, state: &AppState) -> Result<PostQuery>;

    async fn extend_context(&self, _state: &AppState, _context: &mut Context) -> Result<()> {
        Ok(())
    }
}

pub async fn render_listing<L: PostListing>(
    state: &AppState,
    mut listing: L,
    page: Option<&str>,
    user: Option<&User>,
) -> Result<Html<String>> {
    let query = listing.query(state).await?;

    let param = PageParam::parse(page).or_not_found("invalid page number")?;
    let paginator = Paginator::new(state.config.per_page);
    let count = posts::count(&state.db.pool, &query).await?;
    let (number, limit, offset) = paginator
        .window(param, count)
        .or_not_found("page out of range")?;
    let items = posts::list(&state.db.pool, &query, limit, offset).await?;

    let mut context = base_context(state, user);
    context.insert("page_obj", &paginator.page(items, number, count));
    listing.extend_context(state, &mut context).await?;

    render(state, listing.template(), &context)
}

/// 首页
pub struct HomeListing {
    pub now: DateTime<Utc>,
}

#[async_trait]
impl PostListing for HomeListing {
    fn template(&self) -> &'static str {
        "blog/index.html"
    }

    async fn query(&mut self, _state: &AppState) -> Result<PostQuery> {
        Ok(PostQuery::public(self.now))
    }
}

/// 分类页
pub struct CategoryListing {
    pub slug: String,
    pub now: DateTime<Utc>,
}

#[async_trait]
impl PostListing for CategoryListing {
    fn template(&self) -> &'static str {
        "blog/category.html"
    }

    async fn query(&mut self, state: &AppState) -> Result<PostQuery> {
        let category = categories::get_published_by_slug(&state.db.pool, &self.slug)
            .await?
            .or_not_found(format!("published category {}", self.slug))?;
        Ok(PostQuery::public_in_category(category.id, self.now))
    }

    /// 上下文中的分类按别名重新查询，不再检查发布状态
    async fn extend_context(&self, state: &AppState, context: &mut Context) -> Result<()> {
        let category = categories::get_by_slug(&state.db.pool, &self.slug)
            .await?
            .or_not_found(format!("category {}", self.slug))?;
        context.insert("category", &category);
        Ok(())
    }
}

/// 用户主页，列出该用户的全部文章
pub struct ProfileListing {
    pub username: String,
    pub profile: Option<Profile>,
}

#[async_trait]
impl PostListing for ProfileListing {
    fn template(&self) -> &'static str {
        "blog/profile.html"
    }

    async fn query(&mut self, state: &AppState) -> Result<PostQuery> {
        let user = users::get_by_username(&state.db.pool, &self.username)
            .await?
            .or_not_found(format!("user {}", self.username))?;
        let query = PostQuery::by_author(user.id);
        self.profile = Some(Profile::from(user));
        Ok(query)
    }

    async fn extend_context(&self, _state: &AppState, context: &mut Context) -> Result<()> {
        context.insert("profile", &self.profile);
        Ok(())
    }
}
