//! 数据访问层
//!
//! 连接池与迁移在这里初始化；各实体的查询函数放在子模块中，
//! 全部接收 `&SqlitePool` 并返回 `sqlx::Error`。

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::models::config::DatabaseConfig;

pub mod categories;
pub mod comments;
pub mod locations;
pub mod paginator;
pub mod posts;
pub mod query;
pub mod sessions;
pub mod users;

pub use paginator::{Page, PageParam, Paginator};
pub use query::{PostQuery, Visibility};

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// 按配置连接数据库，文件不存在时自动创建
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid database url: {}", config.url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to {}", config.url))?;

        info!("Database pool established: {}", config.url);
        Ok(Self { pool })
    }

    /// 单连接的内存数据库，每个连接都是独立的库，所以连接数固定为 1
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// 执行数据库迁移
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        info!("Database migrations completed");
        Ok(())
    }
}
