use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use tracing::{debug, info};

use super::listing::{render_listing, ProfileListing};
use super::{base_context, profile_url, render, see_other, PageQuery};
use crate::core::auth::{CurrentUser, RequireUser};
use crate::core::error::Result;
use crate::core::server::AppState;
use crate::db::users;
use crate::forms::{FormErrors, ProfileForm, ProfileInput, USERNAME_TAKEN};
use crate::models::User;

/// 用户主页：资料加上该用户的全部文章
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PageQuery>,
) -> Result<Html<String>> {
    let listing = ProfileListing {
        username,
        profile: None,
    };
    render_listing(&state, listing, params.page.as_deref(), user.as_ref()).await
}

fn render_profile_form(
    state: &AppState,
    user: &User,
    form: &ProfileInput,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let mut context = base_context(state, Some(user));
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "blog/user.html", &context)
}

pub async fn edit_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Html<String>> {
    let form = ProfileInput::from_user(&user);
    render_profile_form(&state, &user, &form, &FormErrors::default())
}

/// 保存个人资料，成功后跳转到（可能已改名的）主页
pub async fn edit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(input): Form<ProfileInput>,
) -> Result<Response> {
    let form = ProfileForm::new(input).with_request_user(user.id);

    let mut errors = FormErrors::new();
    let fields = match form.validate() {
        Ok(fields) => Some(fields),
        Err(e) => {
            errors = e;
            None
        }
    };
    if let Some(fields) = &fields {
        if users::username_taken(&state.db.pool, &fields.username, Some(user.id)).await? {
            errors.add("username", USERNAME_TAKEN);
        }
    }

    match fields {
        Some(fields) if errors.is_empty() => {
            match users::update_profile(&state.db.pool, user.id, &fields).await {
                Ok(()) => {
                    info!("Profile of user {} updated", user.id);
                    Ok(see_other(&profile_url(&fields.username)).into_response())
                }
                Err(e) if users::is_unique_violation(&e) => {
                    debug!("Username {} was taken concurrently", fields.username);
                    errors.add("username", USERNAME_TAKEN);
                    Ok(render_profile_form(&state, &user, &form.input, &errors)?.into_response())
                }
                Err(e) => Err(e.into()),
            }
        }
        _ => {
            debug!("Profile form rejected: {:?}", errors);
            Ok(render_profile_form(&state, &user, &form.input, &errors)?.into_response())
        }
    }
}
