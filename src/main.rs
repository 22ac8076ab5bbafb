use anyhow::Result;
use blogicum::cli;
use clap::Parser;
use colored::Colorize;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志系统，RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("blogicum=info,tower_http=info"));
    fmt().with_target(false).with_env_filter(filter).init();

    // 解析命令行参数
    let cli = cli::Cli::parse();

    // 打印欢迎信息
    println!("{}", r"
 ____  _             _
| __ )| | ___   __ _(_) ___ _   _ _ __ ___
|  _ \| |/ _ \ / _` | |/ __| | | | '_ ` _ \
| |_) | | (_) | (_| | | (__| |_| | | | | | |
|____/|_|\___/ \__, |_|\___|\__,_|_| |_| |_|
               |___/
    ".bright_cyan());

    println!("{} {}", "Blogicum".bright_cyan(), env!("CARGO_PKG_VERSION").bright_green());
    println!("{}", "A blog with categories, scheduled posts and comments".bright_white());
    println!();

    // 执行命令
    if let Err(e) = cli::execute(cli).await {
        error!("Error: {}", e);

        // 打印错误链
        for cause in e.chain().skip(1) {
            error!("Caused by: {}", cause);
        }

        std::process::exit(1);
    }

    Ok(())
}
