//! # 摄像头帧服务
//!
//! 摄像头采集器把每一帧保存为 JPEG。这里提供：
//! - 当前平台能否采集摄像头
//! - 输出目录中帧文件的分页列表（按修改时间倒序）
//!
//! 单帧图片的读取与截图共用 `screenshots::image_data_url`。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::media::CameraFrame;
use crate::models::settings::CameraConfig;
use crate::services::screenshots::page_offset;

/// 当前平台能否采集摄像头
///
/// Linux 直接使用 V4L2 设备；macOS 依赖 `imagesnap`，需要它列出至少一个视频设备；
/// 其他平台不支持。
pub async fn is_camera_supported() -> bool {
    if cfg!(target_os = "linux") {
        return true;
    }
    if cfg!(target_os = "macos") {
        return tokio::task::spawn_blocking(imagesnap_has_camera)
            .await
            .unwrap_or(false);
    }
    log::info!("当前平台不支持摄像头采集");
    false
}

fn imagesnap_has_camera() -> bool {
    match std::process::Command::new("imagesnap").arg("-l").output() {
        Ok(output) if output.status.success() => {
            lists_video_device(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            log::warn!(
                "imagesnap 列出设备失败: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            false
        }
        Err(e) => {
            log::warn!("无法运行 imagesnap（未安装？）: {}", e);
            false
        }
    }
}

/// `imagesnap -l` 的输出中，`Video Devices:` 之后是否至少有一个设备
fn lists_video_device(listing: &str) -> bool {
    let mut lines = listing.lines().map(str::trim);
    let has_section = lines.by_ref().any(|line| line.starts_with("Video Devices:"));
    has_section && lines.any(|line| !line.is_empty())
}

/// 分页列出摄像头帧
///
/// # 参数
/// - `config` - 摄像头采集配置（输出目录与分辨率）
/// - `page` - 页码，从 1 开始
/// - `page_size` - 每页条数，必须大于 0
///
/// # 返回值
/// `id` 为帧在完整列表中的序号（从 1 开始）；目录不存在时返回空列表
///
/// # 错误
/// 分页参数非法或目录无法读取时返回错误
pub async fn list_camera_frames(
    config: &CameraConfig,
    page: u32,
    page_size: u32,
) -> Result<Vec<CameraFrame>, String> {
    let offset = page_offset(page, page_size)?;
    let output_dir = config.output_dir.clone();
    let (width, height) = (config.resolution_x, config.resolution_y);

    tokio::task::spawn_blocking(move || {
        collect_frames(&output_dir, offset as usize, page_size as usize)
            .map(|frames| {
                frames
                    .into_iter()
                    .map(|(id, timestamp, path)| CameraFrame {
                        id,
                        timestamp,
                        path,
                        width,
                        height,
                    })
                    .collect()
            })
    })
    .await
    .map_err(|e| format!("读取摄像头帧列表失败: {}", e))?
}

fn is_frame(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}

/// 返回 `(序号, 修改时间, 文件名)`
fn collect_frames(
    dir: &Path,
    offset: usize,
    page_size: usize,
) -> Result<Vec<(u32, f64, String)>, String> {
    if !dir.exists() {
        log::warn!("摄像头目录不存在: {}", dir.display());
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|e| format!("读取摄像头目录失败: {}", e))?;

    let mut frames: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if !is_frame(&path) {
                return None;
            }
            let metadata = fs::metadata(&path).ok()?;
            if !metadata.is_file() {
                return None;
            }
            Some((metadata.modified().ok()?, path))
        })
        .collect();

    frames.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    Ok(frames
        .into_iter()
        .enumerate()
        .skip(offset)
        .take(page_size)
        .filter_map(|(index, (modified, path))| {
            let timestamp = modified.duration_since(UNIX_EPOCH).ok()?.as_secs_f64();
            let filename = path.file_name()?.to_string_lossy().into_owned();
            Some((index as u32 + 1, timestamp, filename))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::AppCache;
    use crate::services::screenshots::image_data_url;
    use std::time::Duration;

    fn write_frame(dir: &Path, name: &str, mtime: u64) {
        let path = dir.join(name);
        fs::write(&path, b"\xff\xd8\xff").unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(mtime))
            .unwrap();
    }

    fn config_for(dir: &Path) -> CameraConfig {
        CameraConfig {
            output_dir: dir.to_path_buf(),
            resolution_x: 1280,
            resolution_y: 720,
            ..Default::default()
        }
    }

    #[test]
    fn test_lists_video_device() {
        let listing = "Video Devices:\n=> FaceTime HD Camera\n";
        assert!(lists_video_device(listing));
        assert!(!lists_video_device("Video Devices:\n\n"));
        assert!(!lists_video_device("Audio Devices:\n=> Microphone\n"));
    }

    #[tokio::test]
    async fn test_frames_newest_first_with_global_ids() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "a.jpg", 1_000);
        write_frame(dir.path(), "b.JPEG", 3_000);
        write_frame(dir.path(), "c.jpg", 2_000);
        fs::write(dir.path().join("shot.png"), b"png").unwrap();
        let config = config_for(dir.path());

        let first = list_camera_frames(&config, 1, 2).await.unwrap();
        assert_eq!(
            first.iter().map(|f| f.path.as_str()).collect::<Vec<_>>(),
            vec!["b.JPEG", "c.jpg"]
        );
        assert_eq!(first[0].timestamp, 3_000.0);
        assert_eq!((first[0].width, first[0].height), (1280, 720));

        let second = list_camera_frames(&config, 2, 2).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, 3);
        assert_eq!(second[0].path, "a.jpg");
    }

    #[tokio::test]
    async fn test_missing_dir_and_bad_paging() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("missing"));
        assert!(list_camera_frames(&config, 1, 10).await.unwrap().is_empty());
        assert!(list_camera_frames(&config, 0, 10).await.is_err());
        assert!(list_camera_frames(&config, 1, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_frame_data_url_stays_in_camera_dir() {
        let root = tempfile::tempdir().unwrap();
        let frames = root.path().join("camera");
        fs::create_dir(&frames).unwrap();
        write_frame(&frames, "f.jpg", 1_000);
        fs::write(root.path().join("outside.jpg"), b"x").unwrap();
        let cache = AppCache::new();

        let url = image_data_url(&frames, "f.jpg", &cache).await.unwrap();
        assert_eq!(url, "data:image/jpeg;base64,/9j/");
        assert!(image_data_url(&frames, "../outside.jpg", &cache).await.is_err());
    }
}
