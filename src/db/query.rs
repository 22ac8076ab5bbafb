use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::utils::start_of_day;

/// 文章可见性规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// 不做过滤，作者的个人主页使用
    All,
    /// 公开可见：文章已发布、分类已发布、发布日期早于 `before` 所在日
    Public { before: DateTime<Utc> },
}

impl Visibility {
    /// 以当前时间为准的公开可见规则，比较按日期截断
    pub fn public_at(now: DateTime<Utc>) -> Self {
        Visibility::Public {
            before: start_of_day(&now),
        }
    }
}

/// 文章查询条件
///
/// 各列表页和详情页共用同一套条件，`push_where` 把它渲染成 SQL。
/// 调用方的 FROM 子句需要把文章别名为 `p`、分类别名为 `cat`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub post_id: Option<i64>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub visibility: Visibility,
}

impl PostQuery {
    /// 首页：所有公开可见的文章
    pub fn public(now: DateTime<Utc>) -> Self {
        Self {
            post_id: None,
            author_id: None,
            category_id: None,
            visibility: Visibility::public_at(now),
        }
    }

    /// 分类页：该分类下公开可见的文章
    pub fn public_in_category(category_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::public(now)
        }
    }

    /// 详情页：单篇公开可见的文章
    pub fn public_post(post_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            post_id: Some(post_id),
            ..Self::public(now)
        }
    }

    /// 个人主页：作者的全部文章，包括草稿和定时发布
    pub fn by_author(author_id: i64) -> Self {
        Self {
            post_id: None,
            author_id: Some(author_id),
            category_id: None,
            visibility: Visibility::All,
        }
    }

    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        builder.push(" WHERE 1 = 1");
        if let Some(post_id) = self.post_id {
            builder.push(" AND p.id = ").push_bind(post_id);
        }
        if let Some(author_id) = self.author_id {
            builder.push(" AND p.author_id = ").push_bind(author_id);
        }
        if let Some(category_id) = self.category_id {
            builder.push(" AND p.category_id = ").push_bind(category_id);
        }
        if let Visibility::Public { before } = self.visibility {
            builder
                .push(" AND p.is_published = 1 AND cat.is_published = 1 AND p.pub_date < ")
                .push_bind(before);
        }
    }
}
