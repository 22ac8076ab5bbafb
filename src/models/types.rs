use chrono::{DateTime, Utc};
use serde::Serialize;

/// 用户
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// 用户名，唯一，用于个人主页 URL
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

/// 分类
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// 分类别名（用于URL）
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// 地点
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// 文章表中的一行
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    /// 相对于 media 目录的路径
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// 列表和详情页使用的文章，已关联作者、分类、地点并统计评论数
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub is_published: bool,
    pub author_id: i64,
    pub author_username: String,
    pub category_id: Option<i64>,
    pub category_slug: Option<String>,
    pub category_title: Option<String>,
    pub category_is_published: Option<bool>,
    pub location_name: Option<String>,
    pub location_is_published: Option<bool>,
    pub comment_count: i64,
}

/// 评论
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub post_id: i64,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

/// 附带作者用户名的评论
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub text: String,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

/// 个人主页展示的用户信息
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
    /// 由名和姓拼接而成，两者都为空时为 None
    pub full_name: Option<String>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        let full_name = crate::utils::get_full_name(&user.first_name, &user.last_name);
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            date_joined: user.date_joined,
            full_name,
        }
    }
}
