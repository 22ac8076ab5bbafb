use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// 由名和姓生成展示用的全名
///
/// 两部分先去掉首尾空白；都为空时返回 `None`，否则用一个空格连接。
pub fn get_full_name(first_name: &str, last_name: &str) -> Option<String> {
    let first_name = first_name.trim();
    let last_name = last_name.trim();

    if first_name.is_empty() && last_name.is_empty() {
        return None;
    }

    Some(format!("{} {}", first_name, last_name))
}

/// 登录页地址，带上登录后返回的路径
pub fn login_url(next: &str) -> String {
    format!("/auth/login/?next={}", urlencoding::encode(next))
}

/// 只接受站内路径作为登录后的跳转目标
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if is_local_path(path) => path.to_string(),
        _ => "/".to_string(),
    }
}

/// 浏览器会把 `\` 当作 `/`，并丢弃制表符和换行，这些写法都可能变成 `//host`
fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/') | Some('\\'))
        && !path.chars().any(|c| c == '\\' || c.is_control())
}

/// 某个时间点所在的 UTC 日期的零点
pub fn start_of_day(now: &DateTime<Utc>) -> DateTime<Utc> {
    let date: NaiveDate = now.date_naive();
    date.and_hms_opt(0, 0, 0)
        .map(|naive: NaiveDateTime| naive.and_utc())
        .unwrap_or(*now)
}

/// 解析表单中的日期时间（按 UTC 处理）
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let value = value.trim();
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
