use serde::Serialize;

/// URL 中的 `?page=` 参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageParam {
    Number(i64),
    Last,
}

impl PageParam {
    /// 解析页码参数；缺省为第一页，无法解析时返回 None
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") => Some(PageParam::Number(1)),
            Some("last") => Some(PageParam::Last),
            Some(value) => value.parse::<i64>().ok().map(PageParam::Number),
        }
    }
}

/// 分页器
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    pub per_page: i64,
}

/// 一页数据及其导航信息
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<i64>,
    pub next_page_number: Option<i64>,
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1) as i64,
        }
    }

    /// 总页数，空结果也算一页
    pub fn num_pages(&self, count: i64) -> i64 {
        if count <= 0 {
            1
        } else {
            (count + self.per_page - 1) / self.per_page
        }
    }

    /// 把页码参数换算为 (页码, LIMIT, OFFSET)；页码越界时返回 None
    pub fn window(&self, param: PageParam, count: i64) -> Option<(i64, i64, i64)> {
        let num_pages = self.num_pages(count);
        let number = match param {
            PageParam::Last => num_pages,
            PageParam::Number(n) => n,
        };
        if number < 1 || number > num_pages {
            return None;
        }
        Some((number, self.per_page, (number - 1) * self.per_page))
    }

    pub fn page<T>(&self, items: Vec<T>, number: i64, count: i64) -> Page<T> {
        let num_pages = self.num_pages(count);
        let has_previous = number > 1;
        let has_next = number < num_pages;
        Page {
            items,
            number,
            num_pages,
            count,
            has_previous,
            has_next,
            previous_page_number: has_previous.then(|| number - 1),
            next_page_number: has_next.then(|| number + 1),
        }
    }
}
