use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::query::PostQuery;
use crate::models::{Post, PostCard};

/// 写入文章时使用的字段
#[derive(Debug, Clone)]
pub struct PostFields {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
}

const CARD_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.pub_date, p.image, p.is_published,
           p.author_id, u.username AS author_username,
           p.category_id, cat.slug AS category_slug, cat.title AS category_title,
           cat.is_published AS category_is_published,
           loc.name AS location_name, loc.is_published AS location_is_published,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories cat ON cat.id = p.category_id
    LEFT JOIN locations loc ON loc.id = p.location_id
"#;

const POST_COLUMNS: &str =
    "id, title, text, pub_date, author_id, location_id, category_id, image, is_published, created_at";

/// 按条件列出文章，发布时间倒序
pub async fn list(
    pool: &SqlitePool,
    query: &PostQuery,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostCard>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new(CARD_SELECT);
    query.push_where(&mut builder);
    builder
        .push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    builder.build_query_as::<PostCard>().fetch_all(pool).await
}

/// 统计满足条件的文章数
pub async fn count(pool: &SqlitePool, query: &PostQuery) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM posts p LEFT JOIN categories cat ON cat.id = p.category_id",
    );
    query.push_where(&mut builder);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// 按条件取一篇文章
pub async fn find_card(
    pool: &SqlitePool,
    query: &PostQuery,
) -> Result<Option<PostCard>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new(CARD_SELECT);
    query.push_where(&mut builder);
    builder.push(" LIMIT 1");

    builder.build_query_as::<PostCard>().fetch_optional(pool).await
}

/// 按 ID 取文章，不检查可见性
pub async fn get(pool: &SqlitePool, post_id: i64) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS))
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

/// 取属于某个作者的文章
pub async fn get_owned(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        "SELECT {} FROM posts WHERE id = ?1 AND author_id = ?2",
        POST_COLUMNS
    ))
    .bind(post_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
}

/// 新建文章
pub async fn create(
    pool: &SqlitePool,
    author_id: i64,
    fields: &PostFields,
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        r#"
        INSERT INTO posts (title, text, pub_date, author_id, location_id, category_id, image, is_published, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)
        RETURNING {}
        "#,
        POST_COLUMNS
    ))
    .bind(&fields.title)
    .bind(&fields.text)
    .bind(fields.pub_date)
    .bind(author_id)
    .bind(fields.location_id)
    .bind(fields.category_id)
    .bind(&fields.image)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// 更新作者自己的文章，返回是否有行被修改
pub async fn update_owned(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    fields: &PostFields,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET title = ?1, text = ?2, pub_date = ?3, location_id = ?4, category_id = ?5, image = ?6
        WHERE id = ?7 AND author_id = ?8
        "#,
    )
    .bind(&fields.title)
    .bind(&fields.text)
    .bind(fields.pub_date)
    .bind(fields.location_id)
    .bind(fields.category_id)
    .bind(&fields.image)
    .bind(post_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 删除作者自己的文章，评论随外键级联删除
pub async fn delete_owned(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?1 AND author_id = ?2")
        .bind(post_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 修改发布状态，供运维命令和测试使用
pub async fn set_published(
    pool: &SqlitePool,
    post_id: i64,
    is_published: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE posts SET is_published = ?1 WHERE id = ?2")
        .bind(is_published)
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
