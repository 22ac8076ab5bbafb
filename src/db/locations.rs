use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::Location;

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    is_published: bool,
) -> Result<Location, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        r#"
        INSERT INTO locations (name, is_published, created_at)
        VALUES (?1, ?2, ?3)
        RETURNING id, name, is_published, created_at
        "#,
    )
    .bind(name)
    .bind(is_published)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        "SELECT id, name, is_published, created_at FROM locations ORDER BY name, id",
    )
    .fetch_all(pool)
    .await
}
