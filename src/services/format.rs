//! # 仪表盘显示格式化
//!
//! 内存大小、录音时长等数值的展示文本，前端直接渲染返回的字符串。

const MEMORY_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// 格式化内存大小
///
/// 小于 1024 字节时显示整数字节；其余按 1024 进制换算到 KB / MB / GB，
/// 保留至多两位小数并去掉末尾的 0。
///
/// # 示例
/// - `512` → `"512 B"`
/// - `1536` → `"1.5 KB"`
/// - `1048576` → `"1 MB"`
pub fn format_memory(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut exponent = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exponent < MEMORY_UNITS.len() - 1 {
        scaled /= 1024;
        exponent += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    format!("{} {}", trim_decimal(value), MEMORY_UNITS[exponent])
}

/// 两位小数，去掉无意义的尾随 0
fn trim_decimal(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

/// 格式化录音时长（秒）
///
/// - 不足 60 秒：`"45s"`
/// - 不足 1 小时：`"5m"`、`"2m 5s"`
/// - 1 小时以上：`"1h"`、`"1h 30m"`（不再显示秒）
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    if seconds < 3600 {
        let (minutes, rest) = (seconds / 60, seconds % 60);
        return if rest == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m {}s", minutes, rest)
        };
    }
    let (hours, minutes) = (seconds / 3600, seconds % 3600 / 60);
    if minutes == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}m", hours, minutes)
    }
}

/// 手动录音的最长时长：采集间隔的 80%（向下取整）
pub fn max_recording_duration(capture_interval_secs: u64) -> u64 {
    capture_interval_secs / 5 * 4 + capture_interval_secs % 5 * 4 / 5
}

/// 把请求的录音时长限制在 `[1, max_recording_duration]` 内
pub fn clamp_recording_duration(requested: u64, capture_interval_secs: u64) -> u64 {
    requested.clamp(1, max_recording_duration(capture_interval_secs).max(1))
}
