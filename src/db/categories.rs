use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::Category;

const CATEGORY_COLUMNS: &str = "id, title, description, slug, is_published, created_at";

pub async fn create(
    pool: &SqlitePool,
    title: &str,
    description: &str,
    slug: &str,
    is_published: bool,
) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        r#"
        INSERT INTO categories (title, description, slug, is_published, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING {}
        "#,
        CATEGORY_COLUMNS
    ))
    .bind(title)
    .bind(description)
    .bind(slug)
    .bind(is_published)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// 按别名取分类，不检查发布状态
pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {} FROM categories WHERE slug = ?1",
        CATEGORY_COLUMNS
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
}

/// 按别名取已发布的分类
pub async fn get_published_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {} FROM categories WHERE slug = ?1 AND is_published = 1",
        CATEGORY_COLUMNS
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
}

/// 全部分类，用于文章表单的下拉框
pub async fn list(pool: &SqlitePool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {} FROM categories ORDER BY title, id",
        CATEGORY_COLUMNS
    ))
    .fetch_all(pool)
    .await
}

pub async fn set_published(
    pool: &SqlitePool,
    slug: &str,
    is_published: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE categories SET is_published = ?1 WHERE slug = ?2")
        .bind(is_published)
        .bind(slug)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
