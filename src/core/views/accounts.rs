use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Duration;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{base_context, render, see_other};
use crate::core::auth::{
    hash_password, removal_cookie, session_cookie, verify_password, CurrentUser,
};
use crate::core::error::Result;
use crate::core::server::AppState;
use crate::db::users::{self, NewUser};
use crate::db::sessions;
use crate::forms::{FormErrors, LoginInput, RegistrationInput, INVALID_LOGIN, USERNAME_TAKEN};
use crate::models::User;
use crate::utils::safe_next;

fn render_registration(
    state: &AppState,
    form: &RegistrationInput,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let mut context = base_context(state, None);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "registration/registration_form.html", &context)
}

pub async fn registration_form(State(state): State<AppState>) -> Result<Html<String>> {
    render_registration(&state, &RegistrationInput::default(), &FormErrors::default())
}

/// 注册新用户，成功后跳转到登录页
pub async fn register(
    State(state): State<AppState>,
    Form(input): Form<RegistrationInput>,
) -> Result<Response> {
    let (fields, password) = match input.validate() {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            debug!("Registration rejected: {:?}", errors);
            return Ok(render_registration(&state, &input, &errors)?.into_response());
        }
    };

    if users::username_taken(&state.db.pool, &fields.username, None).await? {
        let mut errors = FormErrors::new();
        errors.add("username", USERNAME_TAKEN);
        return Ok(render_registration(&state, &input, &errors)?.into_response());
    }

    let password_hash = hash_password(&password)?;
    let created = users::create(
        &state.db.pool,
        &NewUser {
            username: &fields.username,
            first_name: &fields.first_name,
            last_name: &fields.last_name,
            email: &fields.email,
            password_hash: &password_hash,
        },
    )
    .await;
    let user = match created {
        Ok(user) => user,
        Err(e) if users::is_unique_violation(&e) => {
            debug!("Username {} was registered concurrently", fields.username);
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            return Ok(render_registration(&state, &input, &errors)?.into_response());
        }
        Err(e) => return Err(e.into()),
    };
    info!("Registered user {} ({})", user.username, user.id);

    Ok(see_other("/auth/login/").into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn render_login(
    state: &AppState,
    form: &LoginInput,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let mut context = base_context(state, None);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("next", form.next.as_deref().unwrap_or_default());
    render(state, "registration/login.html", &context)
}

pub async fn login_form(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
) -> Result<Html<String>> {
    let form = LoginInput {
        next: query.next,
        ..LoginInput::default()
    };
    render_login(&state, &form, &FormErrors::default())
}

async fn authenticate(state: &AppState, username: &str, password: &str) -> Result<Option<User>> {
    let user = users::get_by_username(&state.db.pool, username).await?;
    Ok(user.filter(|user| verify_password(password, &user.password_hash)))
}

/// 登录：校验密码后写入会话 cookie，跳转到 `next` 或首页
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<LoginInput>,
) -> Result<Response> {
    let (username, password) = match input.validate() {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(render_login(&state, &input, &errors)?.into_response()),
    };

    let Some(user) = authenticate(&state, &username, &password).await? else {
        warn!("Failed login attempt for {}", username);
        let mut errors = FormErrors::new();
        errors.add_non_field(INVALID_LOGIN);
        return Ok(render_login(&state, &input, &errors)?.into_response());
    };

    let purged = sessions::purge_expired(&state.db.pool).await?;
    if purged > 0 {
        debug!("Purged {} expired sessions", purged);
    }
    let ttl = Duration::days(state.config.session.ttl_days);
    let token = sessions::create(&state.db.pool, user.id, ttl).await?;
    info!("User {} logged in", user.username);

    let jar = jar.add(session_cookie(&state.config.session.cookie_name, token));
    let target = safe_next(input.next.as_deref());
    Ok((jar, see_other(&target)).into_response())
}

/// 退出登录，GET 和 POST 都接受
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response> {
    let cookie_name = state.config.session.cookie_name.clone();
    if let Some(cookie) = jar.get(&cookie_name) {
        sessions::delete(&state.db.pool, cookie.value()).await?;
    }
    if let Some(user) = &user {
        info!("User {} logged out", user.username);
    }

    let jar = jar.remove(removal_cookie(&cookie_name));
    let context = base_context(&state, None);
    let page = render(&state, "registration/logged_out.html", &context)?;
    Ok((jar, page).into_response())
}
