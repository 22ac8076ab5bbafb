use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::core::server::{AppState, Server};
use crate::db::{categories, locations, Database};
use crate::models::Config;
use crate::theme::ThemeRenderer;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "blogicum.yml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 生成默认配置、创建 media 目录并初始化数据库
    Init(InitArgs),

    /// 执行数据库迁移
    Migrate,

    /// 启动 HTTP 服务
    Serve(ServeArgs),

    /// 分类管理
    Category(CategoryArgs),

    /// 地点管理
    Location(LocationArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// 站点标题
    #[arg(short, long)]
    pub title: Option<String>,

    /// 覆盖已有的配置文件
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    /// 监听地址，默认取配置文件
    #[arg(long)]
    pub host: Option<String>,

    /// 服务器端口，默认取配置文件
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args)]
pub struct CategoryArgs {
    #[command(subcommand)]
    command: CategoryCommands,
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// 新建分类
    Add {
        title: String,
        /// 地址中使用的别名，默认由标题生成
        #[arg(long)]
        slug: Option<String>,
        #[arg(short, long, default_value = "")]
        description: String,
        /// 创建为隐藏状态
        #[arg(long)]
        hidden: bool,
    },
    /// 列出全部分类
    List,
    /// 发布分类
    Publish { slug: String },
    /// 隐藏分类，其下文章不再出现在公开列表中
    Hide { slug: String },
}

#[derive(Args)]
pub struct LocationArgs {
    #[command(subcommand)]
    command: LocationCommands,
}

#[derive(Subcommand)]
pub enum LocationCommands {
    /// 新建地点
    Add {
        name: String,
        #[arg(long)]
        hidden: bool,
    },
    /// 列出全部地点
    List,
}

const MAX_TITLE_LEN: usize = 256;

/// 别名只允许字母、数字、连字符和下划线
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn open_database(config: &Config) -> Result<Database> {
    let db = Database::connect(&config.database).await?;
    db.migrate().await?;
    Ok(db)
}

fn published_label(is_published: bool) -> colored::ColoredString {
    if is_published {
        "published".bright_green()
    } else {
        "hidden".bright_yellow()
    }
}

async fn run_category(config: &Config, command: CategoryCommands) -> Result<()> {
    let db = open_database(config).await?;

    match command {
        CategoryCommands::Add {
            title,
            slug,
            description,
            hidden,
        } => {
            if title.chars().count() > MAX_TITLE_LEN {
                bail!("Title is longer than {} characters", MAX_TITLE_LEN);
            }
            let slug = slug.unwrap_or_else(|| slug::slugify(&title));
            if !is_valid_slug(&slug) {
                bail!(
                    "Invalid slug '{}': only latin letters, digits, hyphens and underscores are allowed",
                    slug
                );
            }
            if categories::get_by_slug(&db.pool, &slug).await?.is_some() {
                bail!("Category with slug '{}' already exists", slug);
            }
            let category =
                categories::create(&db.pool, &title, &description, &slug, !hidden).await?;
            println!(
                "{} category {} ({})",
                "Created".bright_green(),
                category.title.bright_white(),
                category.slug
            );
        }
        CategoryCommands::List => {
            for category in categories::list(&db.pool).await? {
                println!(
                    "{:>4}  {:<24} {:<32} {}",
                    category.id,
                    category.slug,
                    category.title,
                    published_label(category.is_published)
                );
            }
        }
        CategoryCommands::Publish { slug } => {
            if !categories::set_published(&db.pool, &slug, true).await? {
                bail!("Category '{}' not found", slug);
            }
            println!("{} {}", "Published".bright_green(), slug);
        }
        CategoryCommands::Hide { slug } => {
            if !categories::set_published(&db.pool, &slug, false).await? {
                bail!("Category '{}' not found", slug);
            }
            println!("{} {}", "Hidden".bright_yellow(), slug);
        }
    }

    Ok(())
}

async fn run_location(config: &Config, command: LocationCommands) -> Result<()> {
    let db = open_database(config).await?;

    match command {
        LocationCommands::Add { name, hidden } => {
            if name.chars().count() > MAX_TITLE_LEN {
                bail!("Name is longer than {} characters", MAX_TITLE_LEN);
            }
            let location = locations::create(&db.pool, &name, !hidden).await?;
            println!(
                "{} location {} (id {})",
                "Created".bright_green(),
                location.name.bright_white(),
                location.id
            );
        }
        LocationCommands::List => {
            for location in locations::list(&db.pool).await? {
                println!(
                    "{:>4}  {:<32} {}",
                    location.id,
                    location.name,
                    published_label(location.is_published)
                );
            }
        }
    }

    Ok(())
}

/// 执行命令
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(args) => {
            let config = if cli.config.exists() && !args.force {
                info!("Keeping existing config: {}", cli.config.display());
                Config::from_file(&cli.config)?
            } else {
                let mut config = Config::default();
                if let Some(title) = args.title {
                    config.title = title;
                }
                config.save(&cli.config)?;
                info!("Wrote config: {}", cli.config.display());
                config
            };

            fs::create_dir_all(&config.media_dir)?;
            if let Some(static_dir) = &config.static_dir {
                fs::create_dir_all(static_dir)?;
            }
            open_database(&config).await?;

            println!(
                "{} {} is ready. Run `blogicum serve` to start.",
                "Initialized".bright_green(),
                config.title.bright_white()
            );
        }
        Commands::Migrate => {
            let config = Config::load(&cli.config)?;
            open_database(&config).await?;
        }
        Commands::Serve(args) => {
            let config = Config::load(&cli.config)?;
            let host = args.host.unwrap_or_else(|| config.server.host.clone());
            let port = args.port.unwrap_or(config.server.port);

            fs::create_dir_all(&config.media_dir)?;
            let db = open_database(&config).await?;
            let renderer = ThemeRenderer::new(config.templates_dir.as_deref())?;

            let state = AppState::new(db, config, renderer);
            Server::new(state, &host, port)?.start().await?;
        }
        Commands::Category(args) => {
            let config = Config::load(&cli.config)?;
            run_category(&config, args.command).await?;
        }
        Commands::Location(args) => {
            let config = Config::load(&cli.config)?;
            run_location(&config, args.command).await?;
        }
    }

    Ok(())
}
