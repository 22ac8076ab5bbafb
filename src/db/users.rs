use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::User;

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, password_hash, date_joined";

/// 新用户的资料
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// 可在个人资料页修改的字段
#[derive(Debug, Clone)]
pub struct ProfileFields {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

pub async fn create(pool: &SqlitePool, user: &NewUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, first_name, last_name, email, password_hash, date_joined)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user.username)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn get(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?1",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// 写入撞上了唯一约束，例如两个请求同时占用同一个用户名
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// 用户名是否已被其他用户占用
pub async fn username_taken(
    pool: &SqlitePool,
    username: &str,
    except_user_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE username = ?1 AND id != ?2",
    )
    .bind(username)
    .bind(except_user_id.unwrap_or(-1))
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    fields: &ProfileFields,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET username = ?1, first_name = ?2, last_name = ?3, email = ?4
        WHERE id = ?5
        "#,
    )
    .bind(&fields.username)
    .bind(&fields.first_name)
    .bind(&fields.last_name)
    .bind(&fields.email)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}
