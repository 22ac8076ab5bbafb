use serde::{Deserialize, Serialize};
use validator::Validate;

use super::FormErrors;
use crate::db::users::ProfileFields;
use crate::models::User;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// 用户字段的长度和邮箱格式
#[derive(Validate)]
struct UserLimits {
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    username: String,
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    first_name: String,
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    last_name: String,
    #[validate(email(message = "Enter a valid email address."))]
    email: Option<String>,
}

#[derive(Validate)]
struct PasswordLimits {
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    password2: String,
}

/// 用户名只允许字母、数字和 @/./+/-/_
fn check_username(errors: &mut FormErrors, username: &str) {
    if !username.is_empty()
        && !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

/// 校验四个资料字段，名和姓是否必填由调用方决定
fn clean_user_fields(
    errors: &mut FormErrors,
    username: &str,
    first_name: &str,
    last_name: &str,
    email: &str,
    names_required: bool,
) -> ProfileFields {
    let username = errors.required("username", username);
    check_username(errors, &username);

    let (first_name, last_name) = if names_required {
        (
            errors.required("first_name", first_name),
            errors.required("last_name", last_name),
        )
    } else {
        (first_name.trim().to_string(), last_name.trim().to_string())
    };
    let email = email.trim().to_string();

    let limits = UserLimits {
        username: username.clone(),
        first_name: first_name.clone(),
        last_name: last_name.clone(),
        email: (!email.is_empty()).then(|| email.clone()),
    };
    if let Err(e) = limits.validate() {
        errors.merge_validator(&e);
    }

    ProfileFields {
        username,
        first_name,
        last_name,
        email,
    }
}

/// 注册表单
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

impl RegistrationInput {
    /// 返回清洗后的资料和明文密码；用户名唯一性由视图检查
    pub fn validate(&self) -> Result<(ProfileFields, String), FormErrors> {
        let mut errors = FormErrors::new();
        let fields = clean_user_fields(
            &mut errors,
            &self.username,
            &self.first_name,
            &self.last_name,
            &self.email,
            true,
        );

        if self.password1.is_empty() {
            errors.add("password1", super::REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", super::REQUIRED);
        }
        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                let limits = PasswordLimits {
                    password2: self.password2.clone(),
                };
                if let Err(e) = limits.validate() {
                    errors.merge_validator(&e);
                }
                if self.password2.chars().all(|c| c.is_ascii_digit()) {
                    errors.add("password2", "This password is entirely numeric.");
                }
            }
        }

        let password = self.password1.clone();
        errors.into_result((fields, password))
    }
}

/// 个人资料表单的输入，不包含密码
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileInput {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// 个人资料表单
///
/// 可以附带发起请求的用户，仅作记录，不参与校验。
#[derive(Debug, Clone)]
pub struct ProfileForm {
    pub input: ProfileInput,
    pub request_user: Option<i64>,
}

impl ProfileForm {
    pub fn new(input: ProfileInput) -> Self {
        Self {
            input,
            request_user: None,
        }
    }

    pub fn with_request_user(mut self, user_id: i64) -> Self {
        self.request_user = Some(user_id);
        self
    }

    pub fn validate(&self) -> Result<ProfileFields, FormErrors> {
        let mut errors = FormErrors::new();
        let fields = clean_user_fields(
            &mut errors,
            &self.input.username,
            &self.input.first_name,
            &self.input.last_name,
            &self.input.email,
            false,
        );
        errors.into_result(fields)
    }
}

/// 登录表单
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginInput {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub next: Option<String>,
}

impl LoginInput {
    pub fn validate(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();
        let username = errors.required("username", &self.username);
        if self.password.is_empty() {
            errors.add("password", super::REQUIRED);
        }
        errors.into_result((username, self.password.clone()))
    }
}
