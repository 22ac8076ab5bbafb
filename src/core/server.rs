use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::core::views::{accounts, comments, pages, posts, profile};
use crate::db::Database;
use crate::models::Config;
use crate::theme::renderer::ThemeRenderer;

/// 所有请求共享的状态
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub renderer: Arc<ThemeRenderer>,
}

impl AppState {
    pub fn new(db: Database, config: Config, renderer: ThemeRenderer) -> Self {
        Self {
            db,
            config: Arc::new(config),
            renderer: Arc::new(renderer),
        }
    }
}

/// 创建路由
pub fn router(state: AppState) -> Router {
    // 只放宽带图片上传的表单
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_mb * 1024 * 1024);

    let mut app = Router::new()
        .route("/", get(posts::index))
        .route("/category/:category_slug/", get(posts::category_posts))
        .route(
            "/posts/create/",
            get(posts::create_form)
                .post(posts::create)
                .layer(upload_limit),
        )
        .route(
            "/posts/:id/edit/",
            get(posts::edit_form).post(posts::edit).layer(upload_limit),
        )
        .route("/posts/:id/delete/", get(posts::delete_form).post(posts::delete))
        .route("/posts/:id/comment/", post(comments::add_comment))
        .route(
            "/posts/:post_id/edit_comment/:comment_id/",
            get(comments::edit_comment_form).post(comments::edit_comment),
        )
        .route(
            "/posts/:post_id/delete_comment/:comment_id/",
            get(comments::delete_comment_form).post(comments::delete_comment),
        )
        .route("/posts/:id/", get(posts::detail))
        .route("/profile/edit/", get(profile::edit_form).post(profile::edit))
        .route("/profile/:username/", get(profile::profile))
        .route(
            "/auth/registration/",
            get(accounts::registration_form).post(accounts::register),
        )
        .route("/auth/login/", get(accounts::login_form).post(accounts::login))
        .route("/auth/logout/", get(accounts::logout).post(accounts::logout))
        .route("/pages/about/", get(pages::about))
        .route("/pages/rules/", get(pages::rules))
        .nest_service("/media", ServeDir::new(&state.config.media_dir));

    if let Some(static_dir) = &state.config.static_dir {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    }

    app.fallback(pages::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP 服务器
pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub fn new(state: AppState, host: &str, port: u16) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self { state, addr })
    }

    /// 启动服务器
    pub async fn start(self) -> Result<()> {
        let app = router(self.state);

        info!("Server started at http://{}", self.addr);
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down");
            })
            .await?;

        Ok(())
    }
}
