// 通过路由对整个站点做端到端测试：内存数据库 + 内置模板

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use blogicum::core::auth::hash_password;
use blogicum::db::posts::PostFields;
use blogicum::db::users::NewUser;
use blogicum::db::{categories, comments, locations, posts, sessions, users};
use blogicum::models::{Category, Post, User};
use blogicum::utils::start_of_day;
use blogicum::{router, AppState, Config, Database, ThemeRenderer};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "blogicum-test-boundary";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

struct TestApp {
    state: AppState,
    media: TempDir,
}

async fn setup() -> TestApp {
    let db = Database::in_memory().await.unwrap();
    db.migrate().await.unwrap();

    let media = tempfile::tempdir().unwrap();
    let config = Config {
        media_dir: media.path().to_path_buf(),
        per_page: 10,
        ..Config::default()
    };
    let renderer = ThemeRenderer::embedded().unwrap();

    TestApp {
        state: AppState::new(db, config, renderer),
        media,
    }
}

fn yesterday() -> DateTime<Utc> {
    Utc::now() - Duration::days(1)
}

impl TestApp {
    fn pool(&self) -> &SqlitePool {
        &self.state.db.pool
    }

    async fn user(&self, username: &str) -> User {
        let password_hash = hash_password("s3cret-pass").unwrap();
        users::create(
            self.pool(),
            &NewUser {
                username,
                first_name: "",
                last_name: "",
                email: "",
                password_hash: &password_hash,
            },
        )
        .await
        .unwrap()
    }

    /// 直接建立会话，返回 Cookie 请求头
    async fn login(&self, user: &User) -> String {
        let token = sessions::create(self.pool(), user.id, Duration::days(1))
            .await
            .unwrap();
        format!("{}={}", self.state.config.session.cookie_name, token)
    }

    async fn category(&self, slug: &str, is_published: bool) -> Category {
        categories::create(self.pool(), &format!("Category {}", slug), "", slug, is_published)
            .await
            .unwrap()
    }

    async fn post(
        &self,
        author: &User,
        title: &str,
        category_id: Option<i64>,
        pub_date: DateTime<Utc>,
    ) -> Post {
        let fields = PostFields {
            title: title.to_string(),
            text: format!("Text of {}", title),
            pub_date,
            location_id: None,
            category_id,
            image: None,
        };
        posts::create(self.pool(), author.id, &fields).await.unwrap()
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        router(self.state.clone()).oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
    ) -> Response<Body> {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    async fn post_multipart(
        &self,
        uri: &str,
        cookie: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, &str, &[u8])>,
    ) -> Response<Body> {
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((filename, content_type, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    BOUNDARY, filename, content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn home_shows_only_publicly_visible_posts() {
    let app = setup().await;
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    let closed = app.category("closed", false).await;

    app.post(&author, "Visible post", Some(open.id), yesterday()).await;
    app.post(&author, "Scheduled post", Some(open.id), Utc::now() + Duration::days(2))
        .await;
    app.post(&author, "Todays post", Some(open.id), start_of_day(&Utc::now()))
        .await;
    app.post(&author, "Hidden category post", Some(closed.id), yesterday())
        .await;
    app.post(&author, "Uncategorized post", None, yesterday()).await;
    let draft = app.post(&author, "Draft post", Some(open.id), yesterday()).await;
    posts::set_published(app.pool(), draft.id, false).await.unwrap();

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    assert!(html.contains("Visible post"));
    assert!(!html.contains("Scheduled post"));
    assert!(!html.contains("Todays post"));
    assert!(!html.contains("Hidden category post"));
    assert!(!html.contains("Uncategorized post"));
    assert!(!html.contains("Draft post"));
}

#[tokio::test]
async fn listing_shows_comment_counts() {
    let app = setup().await;
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "Talked about", Some(open.id), yesterday()).await;
    comments::create(app.pool(), post.id, author.id, "first").await.unwrap();
    comments::create(app.pool(), post.id, author.id, "second").await.unwrap();

    let html = body_text(app.get("/", None).await).await;
    assert!(html.contains("Comments (2)"));
}

#[tokio::test]
async fn pagination_splits_listing_and_rejects_bad_pages() {
    let app = setup().await;
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    for i in 1..=12 {
        let pub_date = yesterday() - Duration::minutes(60 - i);
        app.post(&author, &format!("Post {:02}", i), Some(open.id), pub_date)
            .await;
    }

    let first = body_text(app.get("/", None).await).await;
    assert!(first.contains("Post 12"));
    assert!(first.contains("Post 03"));
    assert!(!first.contains("Post 02"));

    let second = body_text(app.get("/?page=2", None).await).await;
    assert!(second.contains("Post 02"));
    assert!(second.contains("Post 01"));
    assert!(!second.contains("Post 12"));

    let last = body_text(app.get("/?page=last", None).await).await;
    assert!(last.contains("Post 01"));

    assert_eq!(app.get("/?page=3", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/?page=0", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/?page=abc", None).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_listing_still_has_a_first_page() {
    let app = setup().await;
    let response = app.get("/?page=1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No posts yet."));
}

#[tokio::test]
async fn category_page_requires_published_category() {
    let app = setup().await;
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    let other = app.category("other", true).await;
    let closed = app.category("closed", false).await;
    app.post(&author, "Open post", Some(open.id), yesterday()).await;
    app.post(&author, "Other post", Some(other.id), yesterday()).await;
    app.post(&author, "Closed post", Some(closed.id), yesterday()).await;

    let response = app.get("/category/open/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Category open"));
    assert!(html.contains("Open post"));
    assert!(!html.contains("Other post"));

    assert_eq!(
        app.get("/category/closed/", None).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/category/missing/", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn profile_lists_every_post_of_the_author() {
    let app = setup().await;
    let author = app.user("author").await;
    let other = app.user("other").await;
    let closed = app.category("closed", false).await;
    app.post(&author, "Future post", Some(closed.id), Utc::now() + Duration::days(3))
        .await;
    let draft = app.post(&author, "Draft post", None, yesterday()).await;
    posts::set_published(app.pool(), draft.id, false).await.unwrap();
    app.post(&other, "Someone else", None, yesterday()).await;

    let response = app.get("/profile/author/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Future post"));
    assert!(html.contains("Draft post"));
    assert!(!html.contains("Someone else"));

    assert_eq!(
        app.get("/profile/nobody/", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn profile_shows_full_name() {
    let app = setup().await;
    let user = app.user("jo").await;
    let fields = users::ProfileFields {
        username: "jo".to_string(),
        first_name: "Jo".to_string(),
        last_name: "Ann".to_string(),
        email: String::new(),
    };
    users::update_profile(app.pool(), user.id, &fields).await.unwrap();

    let html = body_text(app.get("/profile/jo/", None).await).await;
    assert!(html.contains("Jo Ann"));
}

#[tokio::test]
async fn detail_requires_public_visibility() {
    let app = setup().await;
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    let visible = app.post(&author, "Readable", Some(open.id), yesterday()).await;
    let scheduled = app
        .post(&author, "Not yet", Some(open.id), Utc::now() + Duration::days(1))
        .await;
    comments::create(app.pool(), visible.id, author.id, "Nice one")
        .await
        .unwrap();

    let response = app.get(&format!("/posts/{}/", visible.id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Readable"));
    assert!(html.contains("Nice one"));

    // 作者本人访问定时文章也同样返回 404
    let cookie = app.login(&author).await;
    assert_eq!(
        app.get(&format!("/posts/{}/", scheduled.id), Some(&cookie))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.get("/posts/999/", None).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_users_are_sent_to_login() {
    let app = setup().await;

    let response = app.get("/posts/create/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/?next=%2Fposts%2Fcreate%2F");

    let response = app.post_form("/posts/1/comment/", None, &[("text", "hi")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login/"));
}

#[tokio::test]
async fn create_post_assigns_author_and_saves_image() {
    let app = setup().await;
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    let cookie = app.login(&author).await;
    let category = open.id.to_string();

    let form = app.get("/posts/create/", Some(&cookie)).await;
    assert_eq!(form.status(), StatusCode::OK);

    let response = app
        .post_multipart(
            "/posts/create/",
            &cookie,
            &[
                ("title", "Fresh post"),
                ("text", "Body"),
                ("pub_date", "2024-01-02T10:30"),
                ("location", ""),
                ("category", &category),
            ],
            Some(("photo.png", "image/png", PNG)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/author/");

    let created = posts::list(
        app.pool(),
        &blogicum::db::PostQuery::by_author(author.id),
        10,
        0,
    )
    .await
    .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "Fresh post");
    assert_eq!(created[0].author_id, author.id);
    assert!(created[0].is_published);

    let image = created[0].image.clone().unwrap();
    assert!(image.starts_with("posts_images/"));
    assert!(image.ends_with(".png"));
    assert!(app.media.path().join(&image).exists());
}

fn post_fields(category: &str) -> [(&'static str, &str); 5] {
    [
        ("title", "Fresh post"),
        ("text", "Body"),
        ("pub_date", "2024-01-02T10:30"),
        ("location", ""),
        ("category", category),
    ]
}

#[tokio::test]
async fn html_disguised_as_image_is_rejected() {
    let app = setup().await;
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    let cookie = app.login(&author).await;
    let category = open.id.to_string();

    for (filename, bytes) in [
        ("evil.html", &b"<script>alert(1)</script>"[..]),
        ("evil.png", &b"<script>alert(1)</script>"[..]),
        ("evil.html", PNG),
    ] {
        let response = app
            .post_multipart(
                "/posts/create/",
                &cookie,
                &post_fields(&category),
                Some((filename, "image/png", bytes)),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "{}", filename);
        let html = body_text(response).await;
        assert!(
            html.contains("Upload a valid image.") || html.contains("is not allowed"),
            "{}",
            filename
        );
    }

    let count = posts::count(app.pool(), &blogicum::db::PostQuery::by_author(author.id))
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert!(!app.media.path().join("posts_images").exists());
}

#[tokio::test]
async fn photos_above_the_default_body_limit_are_accepted() {
    let app = setup().await;
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    let cookie = app.login(&author).await;
    let category = open.id.to_string();

    let mut photo = JPEG.to_vec();
    photo.resize(3 * 1024 * 1024, 0);
    let response = app
        .post_multipart(
            "/posts/create/",
            &cookie,
            &post_fields(&category),
            Some(("photo.jpg", "image/jpeg", photo.as_slice())),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let created = posts::list(
        app.pool(),
        &blogicum::db::PostQuery::by_author(author.id),
        10,
        0,
    )
    .await
    .unwrap();
    assert_eq!(created.len(), 1);
    let image = created[0].image.clone().unwrap();
    assert!(image.ends_with(".jpg"));
    assert_eq!(
        std::fs::metadata(app.media.path().join(&image)).unwrap().len(),
        3 * 1024 * 1024
    );
}

#[tokio::test]
async fn uploads_over_the_configured_limit_are_refused() {
    let mut app = setup().await;
    let mut config = (*app.state.config).clone();
    config.max_upload_mb = 1;
    app.state.config = std::sync::Arc::new(config);
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    let cookie = app.login(&author).await;
    let category = open.id.to_string();

    let mut photo = JPEG.to_vec();
    photo.resize(2 * 1024 * 1024, 0);
    let response = app
        .post_multipart(
            "/posts/create/",
            &cookie,
            &post_fields(&category),
            Some(("photo.jpg", "image/jpeg", photo.as_slice())),
        )
        .await;
    assert_ne!(response.status(), StatusCode::SEE_OTHER);
    let count = posts::count(app.pool(), &blogicum::db::PostQuery::by_author(author.id))
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn replacing_an_image_removes_the_old_file_after_saving() {
    let app = setup().await;
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    let cookie = app.login(&author).await;
    let category = open.id.to_string();

    app.post_multipart(
        "/posts/create/",
        &cookie,
        &post_fields(&category),
        Some(("first.png", "image/png", PNG)),
    )
    .await;
    let post = posts::list(
        app.pool(),
        &blogicum::db::PostQuery::by_author(author.id),
        10,
        0,
    )
    .await
    .unwrap()
    .remove(0);
    let old = post.image.clone().unwrap();
    let edit_url = format!("/posts/{}/edit/", post.id);

    // 表单无效时旧图片原样保留
    let response = app
        .post_multipart(
            &edit_url,
            &cookie,
            &[
                ("title", ""),
                ("text", "Body"),
                ("pub_date", "2024-01-02T10:30"),
                ("category", category.as_str()),
            ],
            Some(("second.jpg", "image/jpeg", JPEG)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.media.path().join(&old).exists());

    let response = app
        .post_multipart(
            &edit_url,
            &cookie,
            &post_fields(&category),
            Some(("second.jpg", "image/jpeg", JPEG)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let updated = posts::get(app.pool(), post.id).await.unwrap().unwrap();
    let new = updated.image.unwrap();
    assert!(new.ends_with(".jpg"));
    assert!(app.media.path().join(&new).exists());
    assert!(!app.media.path().join(&old).exists());
}

#[tokio::test]
async fn create_post_without_category_rerenders_form() {
    let app = setup().await;
    let author = app.user("author").await;
    app.category("open", true).await;
    let cookie = app.login(&author).await;

    let response = app
        .post_multipart(
            "/posts/create/",
            &cookie,
            &[
                ("title", "No category"),
                ("text", "Body"),
                ("pub_date", "2024-01-02T10:30"),
                ("category", ""),
            ],
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Category is required."));
    assert!(html.contains("No category"));

    let count = posts::count(app.pool(), &blogicum::db::PostQuery::by_author(author.id))
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn only_the_author_can_edit_a_post() {
    let app = setup().await;
    let author = app.user("author").await;
    let intruder = app.user("intruder").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "Original", Some(open.id), yesterday()).await;
    let category = open.id.to_string();
    let edit_url = format!("/posts/{}/edit/", post.id);
    let fields = [
        ("title", "Changed"),
        ("text", "New body"),
        ("pub_date", "2024-01-02T10:30"),
        ("category", category.as_str()),
    ];

    let intruder_cookie = app.login(&intruder).await;
    let response = app.get(&edit_url, Some(&intruder_cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}/", post.id));

    let response = app
        .post_multipart(&edit_url, &intruder_cookie, &fields, None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let unchanged = posts::get(app.pool(), post.id).await.unwrap().unwrap();
    assert_eq!(unchanged.title, "Original");

    let author_cookie = app.login(&author).await;
    let response = app.get(&edit_url, Some(&author_cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Original"));

    let response = app
        .post_multipart(&edit_url, &author_cookie, &fields, None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}/", post.id));
    let changed = posts::get(app.pool(), post.id).await.unwrap().unwrap();
    assert_eq!(changed.title, "Changed");
    assert_eq!(changed.author_id, author.id);

    assert_eq!(
        app.get("/posts/999/edit/", Some(&author_cookie)).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn delete_post_is_owner_only_and_cascades_comments() {
    let app = setup().await;
    let author = app.user("author").await;
    let intruder = app.user("intruder").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "Doomed", Some(open.id), yesterday()).await;
    comments::create(app.pool(), post.id, intruder.id, "bye").await.unwrap();
    let delete_url = format!("/posts/{}/delete/", post.id);

    let intruder_cookie = app.login(&intruder).await;
    assert_eq!(
        app.get(&delete_url, Some(&intruder_cookie)).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.post_form(&delete_url, Some(&intruder_cookie), &[])
            .await
            .status(),
        StatusCode::NOT_FOUND
    );

    let author_cookie = app.login(&author).await;
    let confirm = app.get(&delete_url, Some(&author_cookie)).await;
    assert_eq!(confirm.status(), StatusCode::OK);
    assert!(body_text(confirm).await.contains("Delete post"));

    let response = app.post_form(&delete_url, Some(&author_cookie), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    assert!(posts::get(app.pool(), post.id).await.unwrap().is_none());
    assert_eq!(comments::count_for_post(app.pool(), post.id).await.unwrap(), 0);
}

#[tokio::test]
async fn empty_comment_is_dropped_silently() {
    let app = setup().await;
    let author = app.user("author").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "Quiet", Some(open.id), yesterday()).await;
    let cookie = app.login(&author).await;
    let url = format!("/posts/{}/comment/", post.id);

    let response = app.post_form(&url, Some(&cookie), &[("text", "   ")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}/", post.id));
    assert_eq!(comments::count_for_post(app.pool(), post.id).await.unwrap(), 0);

    let response = app.post_form(&url, Some(&cookie), &[("text", "Hello")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let saved = comments::list_for_post(app.pool(), post.id).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].text, "Hello");
    assert_eq!(saved[0].author_id, author.id);

    assert_eq!(
        app.post_form("/posts/999/comment/", Some(&cookie), &[("text", "x")])
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn comments_are_edited_and_deleted_by_their_author_only() {
    let app = setup().await;
    let author = app.user("author").await;
    let intruder = app.user("intruder").await;
    let open = app.category("open", true).await;
    let post = app.post(&author, "Discussed", Some(open.id), yesterday()).await;
    let other_post = app.post(&author, "Elsewhere", Some(open.id), yesterday()).await;
    let comment = comments::create(app.pool(), post.id, author.id, "Before")
        .await
        .unwrap();
    let edit_url = format!("/posts/{}/edit_comment/{}/", post.id, comment.id);
    let delete_url = format!("/posts/{}/delete_comment/{}/", post.id, comment.id);

    let intruder_cookie = app.login(&intruder).await;
    assert_eq!(
        app.get(&edit_url, Some(&intruder_cookie)).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.post_form(&edit_url, Some(&intruder_cookie), &[("text", "Hacked")])
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.post_form(&delete_url, Some(&intruder_cookie), &[])
            .await
            .status(),
        StatusCode::NOT_FOUND
    );

    let cookie = app.login(&author).await;
    // 评论不属于路径中的文章时同样是 404
    let wrong_post = format!("/posts/{}/edit_comment/{}/", other_post.id, comment.id);
    assert_eq!(
        app.get(&wrong_post, Some(&cookie)).await.status(),
        StatusCode::NOT_FOUND
    );

    let response = app.get(&edit_url, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Before"));

    let response = app.post_form(&edit_url, Some(&cookie), &[("text", "")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));

    let response = app.post_form(&edit_url, Some(&cookie), &[("text", "After")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}/", post.id));
    let saved = comments::list_for_post(app.pool(), post.id).await.unwrap();
    assert_eq!(saved[0].text, "After");

    let response = app.post_form(&delete_url, Some(&cookie), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(comments::count_for_post(app.pool(), post.id).await.unwrap(), 0);
}

#[tokio::test]
async fn profile_edit_renames_and_checks_uniqueness() {
    let app = setup().await;
    let user = app.user("jo").await;
    app.user("taken").await;
    let cookie = app.login(&user).await;

    let response = app.get("/profile/edit/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_form(
            "/profile/edit/",
            Some(&cookie),
            &[("username", "taken"), ("first_name", ""), ("last_name", ""), ("email", "")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("A user with that username already exists."));

    let response = app
        .post_form(
            "/profile/edit/",
            Some(&cookie),
            &[
                ("username", "joann"),
                ("first_name", "Jo"),
                ("last_name", "Ann"),
                ("email", "jo@example.com"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/joann/");

    let saved = users::get(app.pool(), user.id).await.unwrap().unwrap();
    assert_eq!(saved.username, "joann");
    assert_eq!(saved.email, "jo@example.com");
}

#[tokio::test]
async fn registration_login_and_logout() {
    let app = setup().await;

    let response = app
        .post_form(
            "/auth/registration/",
            None,
            &[
                ("username", "newbie"),
                ("first_name", "New"),
                ("last_name", "Bie"),
                ("email", "newbie@example.com"),
                ("password1", "long-enough-1"),
                ("password2", "long-enough-1"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/");
    assert!(users::get_by_username(app.pool(), "newbie")
        .await
        .unwrap()
        .is_some());

    let response = app
        .post_form(
            "/auth/login/",
            None,
            &[("username", "newbie"), ("password", "wrong-password")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Please enter a correct username and password."));

    let response = app
        .post_form(
            "/auth/login/",
            None,
            &[
                ("username", "newbie"),
                ("password", "long-enough-1"),
                ("next", "/posts/create/"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/posts/create/");

    for next in ["/\\evil.example/", "//evil.example/", "https://evil.example/"] {
        let response = app
            .post_form(
                "/auth/login/",
                None,
                &[
                    ("username", "newbie"),
                    ("password", "long-enough-1"),
                    ("next", next),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/", "{}", next);
    }
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("blogicum_session="));

    assert_eq!(
        app.get("/posts/create/", Some(&cookie)).await.status(),
        StatusCode::OK
    );

    let response = app.post_form("/auth/logout/", Some(&cookie), &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        app.get("/posts/create/", Some(&cookie)).await.status(),
        StatusCode::SEE_OTHER
    );
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = setup().await;
    app.user("taken").await;

    let response = app
        .post_form(
            "/auth/registration/",
            None,
            &[
                ("username", "taken"),
                ("first_name", "A"),
                ("last_name", "B"),
                ("email", ""),
                ("password1", "long-enough-1"),
                ("password2", "long-enough-1"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("A user with that username already exists."));
}

#[tokio::test]
async fn static_pages_and_unknown_routes() {
    let app = setup().await;
    assert_eq!(app.get("/pages/about/", None).await.status(), StatusCode::OK);
    assert_eq!(app.get("/pages/rules/", None).await.status(), StatusCode::OK);

    let response = app.get("/no/such/page/", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page not found"));
}

#[tokio::test]
async fn locations_are_offered_in_the_post_form() {
    let app = setup().await;
    let author = app.user("author").await;
    locations::create(app.pool(), "Island", true).await.unwrap();
    let cookie = app.login(&author).await;

    let html = body_text(app.get("/posts/create/", Some(&cookie)).await).await;
    assert!(html.contains("Island"));
}
