//! # 截图数据服务
//!
//! 截图仪表盘的分页列表与单张图片读取。
//!
//! ## 数据来源
//! - 截图目录下存在 `screen.db` 时，以数据库记录为准：
//!   每条记录只有时间戳，文件名由采集器配置的 `timestamp_format`（本地时间）+ `.png` 推导
//! - 没有数据库时退化为直接扫描目录中的图片文件，
//!   时间戳优先从文件名解析，解析不出时使用文件修改时间
//!
//! 两种来源都按时间倒序返回，页码从 1 开始。

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::UNIX_EPOCH;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use regex::Regex;
use rusqlite::{Connection, OpenFlags, params};
use tokio::task::JoinSet;

use crate::models::media::Screenshot;
use crate::models::settings::ScreenConfig;
use crate::services::cache::AppCache;
use crate::utils::path::resolve_within;

/// 截图采集器的数据库文件名
pub const SCREEN_DB_FILE: &str = "screen.db";

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// 文件名中的时间：`2024-05-01_13-45-10`，可带小数秒
static FILENAME_TIMESTAMP: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(\d{4})-(\d{2})-(\d{2})_(\d{2})-(\d{2})-(\d{2})(?:\.(\d{1,9}))?").ok()
});

/// 分页列出截图
///
/// # 参数
/// - `config` - 截图采集配置（输出目录与时间格式）
/// - `page` - 页码，从 1 开始
/// - `page_size` - 每页条数，必须大于 0
///
/// # 错误
/// 分页参数非法、数据库查询失败或目录无法读取时返回错误
pub async fn list_screenshots(
    config: &ScreenConfig,
    page: u32,
    page_size: u32,
) -> Result<Vec<Screenshot>, String> {
    let offset = page_offset(page, page_size)?;
    let output_dir = config.output_dir.clone();

    if !output_dir.exists() {
        log::warn!("截图目录不存在: {}", output_dir.display());
        return Ok(Vec::new());
    }

    let db_path = output_dir.join(SCREEN_DB_FILE);
    if db_path.exists() {
        let format = config.timestamp_format.clone();
        return tokio::task::spawn_blocking(move || {
            query_screen_db(&db_path, &format, page_size, offset)
        })
        .await
        .map_err(|e| format!("读取截图列表失败: {}", e))?;
    }

    let all = scan_screenshot_dir(&output_dir).await?;
    Ok(all
        .into_iter()
        .skip(offset as usize)
        .take(page_size as usize)
        .collect())
}

/// 页码转换为偏移量
pub fn page_offset(page: u32, page_size: u32) -> Result<u64, String> {
    if page == 0 {
        return Err("页码必须从 1 开始".to_string());
    }
    if page_size == 0 {
        return Err("每页条数必须大于 0".to_string());
    }
    Ok((page as u64 - 1) * page_size as u64)
}

fn query_screen_db(
    db_path: &Path,
    timestamp_format: &str,
    page_size: u32,
    offset: u64,
) -> Result<Vec<Screenshot>, String> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| format!("打开截图数据库失败: {}", e))?;

    let mut stmt = conn
        .prepare("SELECT rowid, timestamp FROM screen ORDER BY timestamp DESC LIMIT ? OFFSET ?")
        .map_err(|e| format!("查询截图失败: {}", e))?;

    let rows = stmt
        .query_map(params![page_size, offset as i64], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
        })
        .map_err(|e| format!("查询截图失败: {}", e))?;

    let mut screenshots = Vec::new();
    for row in rows {
        let (id, timestamp) = row.map_err(|e| format!("读取截图记录失败: {}", e))?;
        let Some(path) = timestamp_to_filename(timestamp, timestamp_format) else {
            log::warn!("无法按时间格式生成截图文件名: {} ({})", timestamp, timestamp_format);
            continue;
        };
        screenshots.push(Screenshot {
            id,
            timestamp,
            path,
        });
    }
    Ok(screenshots)
}

/// 按采集器的命名规则生成截图文件名
///
/// 时间格式非法（chrono 无法格式化）时返回 `None`。
pub fn timestamp_to_filename(timestamp: f64, format: &str) -> Option<String> {
    let nanos = (timestamp.fract() * 1_000_000_000.0) as u32;
    let utc = DateTime::from_timestamp(timestamp.trunc() as i64, nanos)?;
    let local = utc.with_timezone(&Local);

    let mut name = String::new();
    write!(name, "{}", local.format(format)).ok()?;
    name.push_str(".png");
    Some(name)
}

/// 从文件名中解析本地时间，返回 Unix 秒
pub fn timestamp_from_filename(filename: &str) -> Option<f64> {
    let regex = FILENAME_TIMESTAMP.as_ref()?;
    let caps = regex.captures(filename)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let date = NaiveDate::from_ymd_opt(caps.get(1)?.as_str().parse().ok()?, num(2)?, num(3)?)?;
    let naive = date.and_hms_opt(num(4)?, num(5)?, num(6)?)?;
    let local = Local.from_local_datetime(&naive).earliest()?;

    let fraction = caps
        .get(7)
        .and_then(|m| format!("0.{}", m.as_str()).parse::<f64>().ok())
        .unwrap_or(0.0);

    Some(local.timestamp() as f64 + fraction)
}

/// 扫描目录中的全部图片，按时间倒序，序号从 1 开始
async fn scan_screenshot_dir(dir: &Path) -> Result<Vec<Screenshot>, String> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| format!("读取截图目录失败: {}", e))?;

    let mut join_set = JoinSet::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| format!("遍历截图目录失败: {}", e))?
    {
        let path = entry.path();
        if !is_image(&path) {
            continue;
        }
        join_set.spawn(async move {
            let metadata = tokio::fs::metadata(&path).await.ok()?;
            if !metadata.is_file() {
                return None;
            }
            let filename = path.file_name()?.to_string_lossy().into_owned();
            let timestamp = timestamp_from_filename(&filename).or_else(|| {
                let mtime = metadata.modified().ok()?;
                Some(mtime.duration_since(UNIX_EPOCH).ok()?.as_secs_f64())
            })?;
            Some((timestamp, filename))
        });
    }

    let mut files = Vec::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Some(file)) => files.push(file),
            Ok(None) => {}
            Err(e) => log::warn!("读取截图元数据失败: {}", e),
        }
    }

    files.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(i, (timestamp, path))| Screenshot {
            id: i as i64 + 1,
            timestamp,
            path,
        })
        .collect())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// 按扩展名推断 MIME 类型
pub fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// 读取目录内的图片并编码为 `data:<mime>;base64,...`
///
/// 截图与摄像头帧共用。
///
/// # 参数
/// - `dir` - 图片所在的采集目录
/// - `filename` - 列表中返回的 `path`，可带前导 `/`
/// - `cache` - 图片缓存（按文件 mtime 校验）
///
/// # 错误
/// 文件不存在、路径逃逸出采集目录或读取失败时返回错误
pub async fn image_data_url(
    dir: &Path,
    filename: &str,
    cache: &AppCache,
) -> Result<String, String> {
    let path: PathBuf = resolve_within(dir, filename)?;

    if let Some(cached) = cache.get_image(&path) {
        return Ok(cached);
    }

    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("读取图片失败: {}", e))?;
    let data_url = format!("data:{};base64,{}", mime_for(&path), STANDARD.encode(&data));

    cache.set_image(&path, data_url.clone());
    Ok(data_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::DEFAULT_TIMESTAMP_FORMAT;

    fn config_for(dir: &Path) -> ScreenConfig {
        ScreenConfig {
            output_dir: dir.to_path_buf(),
            timestamp_format: "%Y-%m-%d_%H-%M-%S".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 20).unwrap(), 0);
        assert_eq!(page_offset(3, 20).unwrap(), 40);
        assert!(page_offset(0, 20).is_err());
        assert!(page_offset(1, 0).is_err());
    }

    #[test]
    fn test_filename_timestamp_round_trip() {
        let timestamp = 1_714_567_890.0;
        let name = timestamp_to_filename(timestamp, "%Y-%m-%d_%H-%M-%S").unwrap();
        assert!(name.ends_with(".png"));
        assert_eq!(timestamp_from_filename(&name), Some(timestamp));

        let with_millis = timestamp_to_filename(1_714_567_890.25, DEFAULT_TIMESTAMP_FORMAT).unwrap();
        assert!(with_millis.contains(".250"));
        assert_eq!(timestamp_from_filename("notes.png"), None);
    }

    #[test]
    fn test_invalid_format_does_not_panic() {
        assert_eq!(timestamp_to_filename(1_714_567_890.0, "%Q"), None);
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("a.bin")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_list_from_directory_pages_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "2024-01-01_10-00-00.png",
            "2024-01-01_12-00-00.png",
            "2024-01-01_11-00-00.jpg",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"img").unwrap();
        }
        let config = config_for(dir.path());

        let first = list_screenshots(&config, 1, 2).await.unwrap();
        assert_eq!(
            first.iter().map(|s| s.path.as_str()).collect::<Vec<_>>(),
            vec!["2024-01-01_12-00-00.png", "2024-01-01_11-00-00.jpg"]
        );
        assert_eq!(first[0].id, 1);

        let second = list_screenshots(&config, 2, 2).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, 3);

        assert!(list_screenshots(&config, 3, 2).await.unwrap().is_empty());
        assert!(list_screenshots(&config, 0, 2).await.is_err());
    }

    #[tokio::test]
    async fn test_list_from_screen_db() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join(SCREEN_DB_FILE)).unwrap();
        conn.execute_batch(
            "CREATE TABLE screen (timestamp REAL NOT NULL, PRIMARY KEY (timestamp));
             INSERT INTO screen VALUES (1714567800.0);
             INSERT INTO screen VALUES (1714567890.0);",
        )
        .unwrap();
        drop(conn);

        let config = config_for(dir.path());
        let page = list_screenshots(&config, 1, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].timestamp, 1_714_567_890.0);
        assert_eq!(
            page[0].path,
            timestamp_to_filename(1_714_567_890.0, &config.timestamp_format).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("missing"));
        assert!(list_screenshots(&config, 1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_data_url_and_containment() {
        let root = tempfile::tempdir().unwrap();
        let screens = root.path().join("screen");
        std::fs::create_dir(&screens).unwrap();
        std::fs::write(screens.join("shot.png"), [1u8, 2, 3]).unwrap();
        std::fs::write(root.path().join("secret.png"), [9u8]).unwrap();

        let cache = AppCache::new();
        let url = image_data_url(&screens, "/shot.png", &cache).await.unwrap();
        assert_eq!(url, "data:image/png;base64,AQID");
        // 第二次命中缓存
        let again = image_data_url(&screens, "shot.png", &cache).await.unwrap();
        assert_eq!(again, url);

        assert!(image_data_url(&screens, "../secret.png", &cache).await.is_err());
        assert!(image_data_url(&screens, "missing.png", &cache).await.is_err());
    }
}
