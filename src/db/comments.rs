use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{Comment, CommentWithAuthor};

/// 在文章下新建评论
pub async fn create(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    text: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (text, post_id, author_id, created_at)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, text, post_id, author_id, created_at
        "#,
    )
    .bind(text)
    .bind(post_id)
    .bind(author_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// 文章下的全部评论，按创建顺序
pub async fn list_for_post(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, CommentWithAuthor>(
        r#"
        SELECT c.id, c.text, c.post_id, c.author_id, u.username AS author_username, c.created_at
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.post_id = ?1
        ORDER BY c.created_at, c.id
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

/// 取某篇文章下属于某个作者的评论
pub async fn get_owned(
    pool: &SqlitePool,
    comment_id: i64,
    post_id: i64,
    author_id: i64,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, text, post_id, author_id, created_at
        FROM comments
        WHERE id = ?1 AND post_id = ?2 AND author_id = ?3
        "#,
    )
    .bind(comment_id)
    .bind(post_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
}

/// 只修改评论正文，文章和作者保持不变
pub async fn update_text(
    pool: &SqlitePool,
    comment_id: i64,
    text: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE comments SET text = ?1 WHERE id = ?2")
        .bind(text)
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete(pool: &SqlitePool, comment_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM comments WHERE id = ?1")
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// 统计文章的评论数
pub async fn count_for_post(pool: &SqlitePool, post_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = ?1")
        .bind(post_id)
        .fetch_one(pool)
        .await
}
