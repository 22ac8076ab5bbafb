use anyhow::{Context as _, Result};
use chrono::DateTime;
use std::collections::HashMap;
use std::path::Path;
use tera::{Context, Tera};
use tracing::{debug, error, info};

/// 内置模板，可被 `templates_dir` 中的同名文件覆盖
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("includes/post_card.html", include_str!("../../templates/includes/post_card.html")),
    ("includes/paginator.html", include_str!("../../templates/includes/paginator.html")),
    ("includes/form_errors.html", include_str!("../../templates/includes/form_errors.html")),
    ("blog/index.html", include_str!("../../templates/blog/index.html")),
    ("blog/category.html", include_str!("../../templates/blog/category.html")),
    ("blog/profile.html", include_str!("../../templates/blog/profile.html")),
    ("blog/detail.html", include_str!("../../templates/blog/detail.html")),
    ("blog/create.html", include_str!("../../templates/blog/create.html")),
    ("blog/comment.html", include_str!("../../templates/blog/comment.html")),
    ("blog/user.html", include_str!("../../templates/blog/user.html")),
    ("registration/registration_form.html", include_str!("../../templates/registration/registration_form.html")),
    ("registration/login.html", include_str!("../../templates/registration/login.html")),
    ("registration/logged_out.html", include_str!("../../templates/registration/logged_out.html")),
    ("pages/about.html", include_str!("../../templates/pages/about.html")),
    ("pages/rules.html", include_str!("../../templates/pages/rules.html")),
    ("pages/404.html", include_str!("../../templates/pages/404.html")),
];

#[derive(Clone)]
pub struct ThemeRenderer {
    /// 模板引擎
    pub tera: Tera,
}

impl ThemeRenderer {
    /// 创建渲染器；`override_dir` 中的模板优先于内置模板
    pub fn new(override_dir: Option<&Path>) -> Result<Self> {
        let mut tera = match override_dir {
            Some(dir) if dir.exists() => {
                info!("Loading template overrides from {}", dir.display());
                Tera::new(&format!("{}/**/*.html", dir.display()))
                    .with_context(|| format!("Failed to load templates from {}", dir.display()))?
            }
            _ => Tera::default(),
        };

        let mut embedded = Tera::default();
        embedded
            .add_raw_templates(EMBEDDED_TEMPLATES.iter().copied())
            .context("Failed to parse embedded templates")?;
        tera.extend(&embedded)?;

        Self::register_filters(&mut tera);
        debug!("{} templates loaded", tera.get_template_names().count());

        Ok(Self { tera })
    }

    /// 只使用内置模板
    pub fn embedded() -> Result<Self> {
        Self::new(None)
    }

    /// 注册模板过滤器
    fn register_filters(tera: &mut Tera) {
        tera.register_filter("date_format", Self::date_format_filter);
        tera.register_filter("linebreaksbr", Self::linebreaksbr_filter);
    }

    /// 渲染模板
    pub fn render(&self, template: &str, context: &Context) -> tera::Result<String> {
        self.tera.render(template, context).map_err(|e| {
            error!("模板渲染失败: {} ({:?})", template, e);
            e
        })
    }

    /// 检查模板是否存在
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    fn date_format_filter(value: &tera::Value, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        if let Some(date) = value.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok()) {
            let format = args.get("format")
                .and_then(|f| f.as_str())
                .unwrap_or("%d.%m.%Y %H:%M");
            Ok(tera::Value::String(date.format(format).to_string()))
        } else {
            Ok(value.clone())
        }
    }

    /// 转义 HTML 后把换行替换为 `<br>`，模板里需配合 `safe` 使用
    fn linebreaksbr_filter(value: &tera::Value, _args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        match value.as_str() {
            Some(text) => {
                let escaped = tera::escape_html(text);
                let html = escaped.replace("\r\n", "\n").replace('\n', "<br>");
                Ok(tera::Value::String(html))
            }
            None => Ok(value.clone()),
        }
    }
}
