//! # 录音文件服务
//!
//! 列出麦克风输出目录中的 WAV 文件（按修改时间倒序分页），
//! 时长从 WAV 头读取：总采样帧数 / 采样率。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::models::media::AudioFile;
use crate::services::format::{format_duration, format_memory};
use crate::services::screenshots::page_offset;

/// 分页列出录音文件
///
/// # 参数
/// - `output_dir` - 麦克风采集器的输出目录
/// - `page` - 页码，从 1 开始
/// - `page_size` - 每页条数，必须大于 0
///
/// # 返回值
/// `id` 为文件在完整列表中的序号（从 1 开始），翻页后不会重复；
/// 目录不存在时返回空列表
///
/// # 错误
/// 分页参数非法或目录无法读取时返回错误
pub async fn list_audio_files(
    output_dir: PathBuf,
    page: u32,
    page_size: u32,
) -> Result<Vec<AudioFile>, String> {
    let offset = page_offset(page, page_size)?;

    tokio::task::spawn_blocking(move || {
        collect_audio_files(&output_dir, offset as usize, page_size as usize)
    })
    .await
    .map_err(|e| format!("读取录音列表失败: {}", e))?
}

fn collect_audio_files(
    dir: &Path,
    offset: usize,
    page_size: usize,
) -> Result<Vec<AudioFile>, String> {
    if !dir.exists() {
        log::warn!("录音目录不存在: {}", dir.display());
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|e| format!("读取录音目录失败: {}", e))?;

    let mut files: Vec<(PathBuf, fs::Metadata, SystemTime)> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let is_wav = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
            if !is_wav {
                return None;
            }
            let metadata = fs::metadata(&path).ok()?;
            if !metadata.is_file() {
                return None;
            }
            let modified = metadata.modified().ok()?;
            Some((path, metadata, modified))
        })
        .collect();

    // 最新的在前；修改时间相同时按文件名倒序，保证翻页稳定
    files.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| b.0.cmp(&a.0)));

    Ok(files
        .into_iter()
        .enumerate()
        .skip(offset)
        .take(page_size)
        .map(|(index, (path, metadata, modified))| {
            let created: DateTime<Local> = modified.into();
            let duration = wav_duration(&path);
            AudioFile {
                id: index as u32 + 1,
                timestamp: created.timestamp(),
                path: path.to_string_lossy().into_owned(),
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                duration,
                created_at: created.format("%Y-%m-%d %H:%M:%S").to_string(),
                size: metadata.len(),
                duration_text: format_duration(duration.round() as u64),
                size_text: format_memory(metadata.len()),
            }
        })
        .collect())
}

/// 读取 WAV 时长（秒）；文件头无法解析时记录警告并返回 0
pub fn wav_duration(path: &Path) -> f64 {
    match hound::WavReader::open(path) {
        Ok(reader) => {
            let rate = reader.spec().sample_rate;
            if rate == 0 {
                return 0.0;
            }
            reader.duration() as f64 / rate as f64
        }
        Err(e) => {
            log::warn!("无法读取 WAV 头 {}: {}", path.display(), e);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn write_wav(path: &Path, sample_rate: u32, frames: u32) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(0i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_wav_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, 8000, 16000);
        assert_eq!(wav_duration(&path), 2.0);

        let broken = dir.path().join("broken.wav");
        fs::write(&broken, b"not a wav").unwrap();
        assert_eq!(wav_duration(&broken), 0.0);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_global_ids() {
        let dir = tempfile::tempdir().unwrap();
        for (name, mtime) in [("old.wav", 1_000), ("mid.wav", 2_000), ("new.wav", 3_000)] {
            let path = dir.path().join(name);
            write_wav(&path, 8000, 800);
            set_mtime(&path, mtime);
        }
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let first = list_audio_files(dir.path().to_path_buf(), 1, 2).await.unwrap();
        assert_eq!(
            first.iter().map(|f| f.filename.as_str()).collect::<Vec<_>>(),
            vec!["new.wav", "mid.wav"]
        );
        assert_eq!(first[0].duration, 0.1);
        assert_eq!(first[0].timestamp, 3_000);

        let second = list_audio_files(dir.path().to_path_buf(), 2, 2).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, 3);
        assert_eq!(second[0].filename, "old.wav");
    }

    #[tokio::test]
    async fn test_list_carries_display_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.wav");
        // 100 Hz 双声道 16 位：125 秒，44 + 12500 * 4 字节
        write_wav(&path, 100, 12_500);

        let files = list_audio_files(dir.path().to_path_buf(), 1, 10).await.unwrap();
        assert_eq!(files[0].duration, 125.0);
        assert_eq!(files[0].duration_text, "2m 5s");
        assert_eq!(files[0].size, 50_044);
        assert_eq!(files[0].size_text, "48.87 KB");
    }

    #[tokio::test]
    async fn test_list_rejects_bad_paging_and_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_audio_files(dir.path().to_path_buf(), 0, 10).await.is_err());
        assert!(list_audio_files(dir.path().to_path_buf(), 1, 0).await.is_err());

        let missing = dir.path().join("missing");
        assert!(list_audio_files(missing, 1, 10).await.unwrap().is_empty());
    }
}
