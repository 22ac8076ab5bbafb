//! 表单输入与校验
//!
//! 每个表单由一个可反序列化的 `*Input` 和一个 `validate` 方法组成：
//! 校验通过返回清洗后的数据，否则返回按字段归类的 [`FormErrors`]，
//! 视图再把输入和错误一起交给模板重新渲染。

use std::collections::BTreeMap;

use serde::Serialize;
use validator::ValidationErrors;

pub mod comment;
pub mod post;
pub mod user;

pub use comment::CommentInput;
pub use post::{CleanedPost, ImageAction, PostChoices, PostInput, Upload};
pub use user::{
    LoginInput, ProfileForm, ProfileInput, RegistrationInput, INVALID_LOGIN, USERNAME_TAKEN,
};

pub const REQUIRED: &str = "This field is required.";
pub const CATEGORY_REQUIRED: &str = "Category is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// 表单错误，按字段归类
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// 某个字段的错误信息
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.field(field).is_empty()
    }

    /// 必填字段为空（或只有空白）时记录错误，返回去掉首尾空白的值
    pub fn required(&mut self, field: &str, value: &str) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, REQUIRED);
        }
        trimmed.to_string()
    }

    /// 合并 `validator` 产生的错误
    pub fn merge_validator(&mut self, errors: &ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            let field = field.to_string();
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
                // 已经报过必填错误的字段不再重复提示
                if !self.field(&field).iter().any(|m| m == REQUIRED) {
                    self.add(&field, message);
                }
            }
        }
    }

    /// 没有错误时返回 `value`
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}
