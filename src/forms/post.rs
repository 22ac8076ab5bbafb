use std::path::Path;

use chrono::{DateTime, Utc};
use image::ImageFormat;
use serde::Serialize;
use validator::Validate;

use super::{FormErrors, CATEGORY_REQUIRED, INVALID_CHOICE};
use crate::models::Post;
use crate::utils::parse_datetime;

/// 上传的文件
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 允许上传的图片扩展名
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

impl Upload {
    /// 文件名里的扩展名，小写
    pub fn declared_extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// 按文件头识别图片格式，返回保存时使用的扩展名
    pub fn image_extension(&self) -> Option<&'static str> {
        match image::guess_format(&self.bytes).ok()? {
            ImageFormat::Png => Some("png"),
            ImageFormat::Jpeg => Some("jpg"),
            ImageFormat::Gif => Some("gif"),
            ImageFormat::WebP => Some("webp"),
            _ => None,
        }
    }
}

/// 文章表单的原始输入，字段与 HTML 表单一致
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub location: String,
    pub category: String,
    #[serde(skip)]
    pub image: Option<Upload>,
    #[serde(skip)]
    pub image_clear: bool,
}

/// 下拉框里可选的分类和地点
#[derive(Debug, Clone, Default)]
pub struct PostChoices {
    pub category_ids: Vec<i64>,
    pub location_ids: Vec<i64>,
}

/// 对已保存图片的处理方式
#[derive(Debug, Clone)]
pub enum ImageAction {
    Keep,
    Replace(Upload),
    Clear,
}

/// 校验通过的文章数据
#[derive(Debug, Clone)]
pub struct CleanedPost {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub category_id: i64,
    pub image: ImageAction,
}

#[derive(Validate)]
struct PostLimits {
    #[validate(length(max = 256, message = "Ensure this value has at most 256 characters."))]
    title: String,
}

impl PostInput {
    /// 新建文章时的初始值：发布时间默认为当前时间
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            pub_date: now.format("%Y-%m-%dT%H:%M").to_string(),
            ..Self::default()
        }
    }

    /// 用已有文章填充表单
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date.format("%Y-%m-%dT%H:%M").to_string(),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            image: None,
            image_clear: false,
        }
    }

    pub fn validate(&self, choices: &PostChoices) -> Result<CleanedPost, FormErrors> {
        let mut errors = FormErrors::new();

        let title = errors.required("title", &self.title);
        if let Err(e) = (PostLimits { title: title.clone() }).validate() {
            errors.merge_validator(&e);
        }
        let text = errors.required("text", &self.text);

        let pub_date = match self.pub_date.trim() {
            "" => {
                errors.add("pub_date", super::REQUIRED);
                None
            }
            raw => {
                let parsed = parse_datetime(raw);
                if parsed.is_none() {
                    errors.add("pub_date", "Enter a valid date/time.");
                }
                parsed
            }
        };

        let location_id = match self.location.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(id) if choices.location_ids.contains(&id) => Some(id),
                _ => {
                    errors.add("location", INVALID_CHOICE);
                    None
                }
            },
        };

        let category_id = match self.category.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(id) if choices.category_ids.contains(&id) => Some(id),
                _ => {
                    errors.add("category", INVALID_CHOICE);
                    None
                }
            },
        };
        if category_id.is_none() {
            errors.add("category", CATEGORY_REQUIRED);
        }

        let image = match (&self.image, self.image_clear) {
            (Some(upload), _) => {
                let declared = upload.declared_extension().unwrap_or_default();
                if !IMAGE_EXTENSIONS.contains(&declared.as_str()) {
                    errors.add(
                        "image",
                        format!(
                            "File extension “{}” is not allowed. Allowed extensions are: {}.",
                            declared,
                            IMAGE_EXTENSIONS.join(", ")
                        ),
                    );
                } else if upload.image_extension().is_none() {
                    errors.add(
                        "image",
                        "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                    );
                }
                ImageAction::Replace(upload.clone())
            }
            (None, true) => ImageAction::Clear,
            (None, false) => ImageAction::Keep,
        };

        match (pub_date, category_id) {
            (Some(pub_date), Some(category_id)) if errors.is_empty() => Ok(CleanedPost {
                title,
                text,
                pub_date,
                location_id,
                category_id,
                image,
            }),
            _ => Err(errors),
        }
    }
}
