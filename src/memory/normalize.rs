/// 把自由文本查询规整为稳定的缓存 key
///
/// 去掉首尾空白，内部连续空白折叠为单个空格，再转小写。
/// 规整结果相同的两个查询必然命中同一条缓存。
pub fn normalize_query(raw: &str) -> String {
    raw.split(is_query_whitespace)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 与已有缓存文件的 key 保持一致：Unicode 空白加上 U+FEFF，但不含 U+0085
fn is_query_whitespace(c: char) -> bool {
    c == '\u{FEFF}' || (c.is_whitespace() && c != '\u{85}')
}

/// 缺失的查询规整为空字符串
pub fn normalize_optional_query(raw: Option<&str>) -> String {
    raw.map(normalize_query).unwrap_or_default()
}
