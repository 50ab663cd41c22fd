//! # 内存缓存管理服务
//!
//! 提供基于内存的缓存层，减少重复的网络调用与文件 I/O：
//! - **logger 状态缓存**：最近一次 `GetLoggerStatus` 的结果，带时间戳用于判断有效性
//! - **图片缓存**：LRU 缓存最近查看的截图与摄像头帧 data URL
//!
//! ## 缓存失效策略
//! - logger 状态：基于 TTL；切换 logger 或触发快照后立即失效
//! - 图片：基于文件 mtime，文件被替换时重新读取
//!
//! ## 线程安全
//! 使用 `std::sync::RwLock` / `Mutex`，临界区内不跨越 `.await`。

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant, SystemTime};

use lru::LruCache;

use crate::proto::LoggerStatusResponse;

/// logger 状态缓存的有效期
///
/// 多个面板同时轮询时，在此时间内共用一次查询结果。
pub const LOGGER_STATUS_TTL: Duration = Duration::from_secs(2);

/// 图片缓存的最大条目数
const IMAGE_CACHE_MAX_ENTRIES: usize = 32;

/// 应用全局缓存状态
pub struct AppCache {
    /// logger 状态缓存，key 为排序后的 logger 名列表（空列表表示全部）
    logger_status: RwLock<Option<LoggerStatusEntry>>,
    logger_status_ttl: Duration,

    /// 图片缓存：绝对路径 → data URL
    images: Mutex<LruCache<PathBuf, ImageEntry>>,
}

struct LoggerStatusEntry {
    names: Vec<String>,
    data: LoggerStatusResponse,
    cached_at: Instant,
}

struct ImageEntry {
    data_url: String,
    /// 文件的最后修改时间（用于判断缓存是否仍然有效）
    file_mtime: SystemTime,
}

impl AppCache {
    pub fn new() -> Self {
        Self::with_ttl(LOGGER_STATUS_TTL)
    }

    pub fn with_ttl(logger_status_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(IMAGE_CACHE_MAX_ENTRIES).unwrap_or(NonZeroUsize::MIN);
        Self {
            logger_status: RwLock::new(None),
            logger_status_ttl,
            images: Mutex::new(LruCache::new(capacity)),
        }
    }

    // ======== logger 状态缓存 ========

    /// 获取缓存的 logger 状态（同一组名字且仍在 TTL 内）
    pub fn get_logger_status(&self, names: &[String]) -> Option<LoggerStatusResponse> {
        let cache = self.logger_status.read().ok()?;
        let entry = cache.as_ref()?;

        if entry.names == normalized(names) && entry.cached_at.elapsed() <= self.logger_status_ttl
        {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    pub fn set_logger_status(&self, names: &[String], data: LoggerStatusResponse) {
        if let Ok(mut cache) = self.logger_status.write() {
            *cache = Some(LoggerStatusEntry {
                names: normalized(names),
                data,
                cached_at: Instant::now(),
            });
        }
    }

    /// 使 logger 状态缓存失效
    ///
    /// 在切换 logger、触发快照或录音控制后调用
    pub fn invalidate_logger_status(&self) {
        if let Ok(mut cache) = self.logger_status.write() {
            *cache = None;
        }
    }

    // ======== 图片缓存 ========

    /// 获取缓存的图片 data URL（文件 mtime 未变化时）
    pub fn get_image(&self, path: &Path) -> Option<String> {
        let current_mtime = std::fs::metadata(path).ok()?.modified().ok()?;
        let mut cache = self.images.lock().ok()?;

        let fresh = cache.get(path)?.file_mtime == current_mtime;
        if fresh {
            cache.get(path).map(|entry| entry.data_url.clone())
        } else {
            cache.pop(path);
            None
        }
    }

    /// 缓存图片 data URL；缓存满时淘汰最久未访问的条目
    pub fn set_image(&self, path: &Path, data_url: String) {
        let file_mtime = std::fs::metadata(path)
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        if let Ok(mut cache) = self.images.lock() {
            cache.put(
                path.to_path_buf(),
                ImageEntry {
                    data_url,
                    file_mtime,
                },
            );
        }
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

fn normalized(names: &[String]) -> Vec<String> {
    let mut names = names.to_vec();
    names.sort();
    names.dedup();
    names
}
