//! # SQL 工具函数

/// `LIKE` 子串匹配使用的转义字符，查询中需写作 `LIKE ? ESCAPE '\'`
pub const LIKE_ESCAPE: char = '\\';

/// 把用户输入转换为 `LIKE` 子串匹配模式
///
/// `%`、`_` 与转义字符本身按字面匹配，结果两端加上 `%`。
pub fn like_contains(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
