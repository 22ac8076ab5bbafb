use serde::{Deserialize, Serialize};

use super::FormErrors;

/// 评论表单，只有正文一个字段
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CommentInput {
    pub text: String,
}

impl CommentInput {
    pub fn from_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    /// 返回去掉首尾空白的正文
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        let text = errors.required("text", &self.text);
        errors.into_result(text)
    }
}
