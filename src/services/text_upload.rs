//! # 文本上传服务
//!
//! 把用户选择的文本文件复制进文本上传目录，并在 `text_uploads.db` 中登记：
//! - 上传前校验文件大小与扩展名
//! - 存储文件名为 `<本地时间>_<SHA-256 前 8 位>.<扩展名>`
//! - 列表按上传时间倒序；搜索为文件名的 `LIKE` 子串匹配

use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::{Connection, OpenFlags, params};
use sha2::{Digest, Sha256};

use crate::models::media::TextFile;
use crate::models::settings::TextUploadConfig;
use crate::utils::sql::like_contains;

/// 上传索引数据库的文件名
pub const TEXT_UPLOAD_DB_FILE: &str = "text_uploads.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS text_uploads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp REAL NOT NULL,
        filename TEXT NOT NULL,
        original_path TEXT NOT NULL,
        file_type TEXT NOT NULL,
        file_size INTEGER NOT NULL,
        stored_path TEXT NOT NULL,
        content_hash TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_text_uploads_timestamp ON text_uploads(timestamp);
    CREATE INDEX IF NOT EXISTS idx_text_uploads_filename ON text_uploads(filename);
";

const SELECT_COLUMNS: &str =
    "SELECT filename, original_path, file_type, file_size, stored_path, content_hash FROM text_uploads";

/// 上传一个文本文件
///
/// # 参数
/// - `config` - 文本上传配置（输出目录、大小上限、允许的格式）
/// - `file_path` - 待上传文件的绝对路径
///
/// # 返回值
/// 返回登记后的文件信息
///
/// # 错误
/// 上传已停用、文件不存在、超过大小上限、格式不受支持或写入失败时返回错误
pub async fn upload_file(config: &TextUploadConfig, file_path: &Path) -> Result<TextFile, String> {
    if !config.enabled {
        return Err("文本上传已停用".to_string());
    }

    let metadata = tokio::fs::metadata(file_path)
        .await
        .map_err(|_| format!("文件不存在: {}", file_path.display()))?;
    if !metadata.is_file() {
        return Err(format!("不是普通文件: {}", file_path.display()));
    }

    let file_size = metadata.len();
    let max_size = config.max_file_size_mb as u64 * 1024 * 1024;
    if file_size > max_size {
        return Err(format!(
            "文件大小超过上限 {} MB",
            config.max_file_size_mb
        ));
    }

    let extension = file_path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !config
        .supported_formats
        .iter()
        .any(|format| format.eq_ignore_ascii_case(&extension))
    {
        return Err(format!(
            "不支持的文件格式: {}（支持: {}）",
            extension,
            config.supported_formats.join(", ")
        ));
    }

    let content = tokio::fs::read(file_path)
        .await
        .map_err(|e| format!("读取文件失败: {}", e))?;
    let content_hash = hex::encode(Sha256::digest(&content));

    let now = Local::now();
    let stored_name = format!(
        "{}_{}.{}",
        now.format("%Y-%m-%d_%H-%M-%S"),
        &content_hash[..8],
        extension
    );

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| format!("创建上传目录失败: {}", e))?;
    let stored_path = config.output_dir.join(&stored_name);
    tokio::fs::write(&stored_path, &content)
        .await
        .map_err(|e| format!("保存文件副本失败: {}", e))?;

    let file = TextFile {
        filename: file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown_file".to_string()),
        original_path: file_path.to_string_lossy().into_owned(),
        file_type: extension,
        file_size,
        stored_path: stored_path.to_string_lossy().into_owned(),
        content_hash,
    };

    let db_path = config.output_dir.join(TEXT_UPLOAD_DB_FILE);
    let timestamp = now.timestamp_micros() as f64 / 1_000_000.0;
    let record = file.clone();
    tokio::task::spawn_blocking(move || insert_record(&db_path, timestamp, &record))
        .await
        .map_err(|e| format!("登记上传记录失败: {}", e))??;

    log::info!("文件已上传: {} -> {}", file.filename, file.stored_path);
    Ok(file)
}

fn insert_record(db_path: &Path, timestamp: f64, file: &TextFile) -> Result<(), String> {
    let conn = Connection::open(db_path).map_err(|e| format!("打开上传数据库失败: {}", e))?;
    conn.execute_batch(SCHEMA)
        .map_err(|e| format!("初始化上传数据库失败: {}", e))?;

    conn.execute(
        "INSERT INTO text_uploads (timestamp, filename, original_path, file_type, file_size, \
         stored_path, content_hash) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            timestamp,
            file.filename,
            file.original_path,
            file.file_type,
            file.file_size as i64,
            file.stored_path,
            file.content_hash,
        ],
    )
    .map_err(|e| format!("登记上传记录失败: {}", e))?;
    Ok(())
}

/// 列出全部已上传文件（最新的在前）
pub async fn list_files(config: &TextUploadConfig) -> Result<Vec<TextFile>, String> {
    let db_path = config.output_dir.join(TEXT_UPLOAD_DB_FILE);
    run_query(db_path, None).await
}

/// 按文件名子串搜索已上传文件
pub async fn search_files(config: &TextUploadConfig, pattern: &str) -> Result<Vec<TextFile>, String> {
    let db_path = config.output_dir.join(TEXT_UPLOAD_DB_FILE);
    run_query(db_path, Some(like_contains(pattern))).await
}

async fn run_query(db_path: PathBuf, like: Option<String>) -> Result<Vec<TextFile>, String> {
    if !db_path.exists() {
        return Ok(Vec::new());
    }

    tokio::task::spawn_blocking(move || {
        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| format!("打开上传数据库失败: {}", e))?;

        let sql = match like {
            Some(_) => format!(
                "{} WHERE filename LIKE ?1 ESCAPE '\\' ORDER BY timestamp DESC",
                SELECT_COLUMNS
            ),
            None => format!("{} ORDER BY timestamp DESC", SELECT_COLUMNS),
        };
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| format!("查询上传记录失败: {}", e))?;

        let params: Vec<String> = like.into_iter().collect();
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params), |row| {
                Ok(TextFile {
                    filename: row.get(0)?,
                    original_path: row.get(1)?,
                    file_type: row.get(2)?,
                    file_size: row.get::<_, i64>(3)?.max(0) as u64,
                    stored_path: row.get(4)?,
                    content_hash: row.get(5)?,
                })
            })
            .map_err(|e| format!("查询上传记录失败: {}", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("读取上传记录失败: {}", e))
    })
    .await
    .map_err(|e| format!("查询上传记录失败: {}", e))?
}
