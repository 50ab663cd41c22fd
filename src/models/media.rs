//! # 截图、摄像头帧、录音与文本上传的数据模型

use serde::{Deserialize, Serialize};

/// 截图列表项
///
/// `path` 为相对截图目录的文件名，前端用它调用 `get_screenshot_data`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Screenshot {
    pub id: i64,
    /// 截图时间（Unix 秒，可带小数）
    pub timestamp: f64,
    pub path: String,
}

/// 摄像头帧列表项
///
/// `path` 为相对摄像头输出目录的文件名，前端用它调用 `get_camera_frame_data`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraFrame {
    /// 在完整列表中的序号（从 1 开始）
    pub id: u32,
    /// 修改时间（Unix 秒，可带小数）
    pub timestamp: f64,
    pub path: String,
    /// 采集配置中的分辨率
    pub width: u32,
    pub height: u32,
}

/// 录音文件列表项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioFile {
    /// 在完整列表中的序号（从 1 开始）
    pub id: u32,
    /// 修改时间（Unix 秒）
    pub timestamp: i64,
    pub path: String,
    pub filename: String,
    /// 时长（秒）；WAV 头无法读取时为 0
    pub duration: f64,
    /// 本地时间 `%Y-%m-%d %H:%M:%S`
    pub created_at: String,
    /// 文件大小（字节）
    pub size: u64,
    /// 列表中直接显示的时长，如 `"2m 5s"`
    pub duration_text: String,
    /// 列表中直接显示的大小，如 `"1.5 MB"`
    pub size_text: String,
}

/// 录音控制状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RecordingStatus {
    pub is_recording: bool,
    pub is_paused: bool,
    pub auto_recording_enabled: bool,
}

/// 已上传的文本文件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextFile {
    /// 原始文件名
    pub filename: String,
    pub original_path: String,
    /// 小写扩展名
    pub file_type: String,
    pub file_size: u64,
    /// 存储副本的绝对路径
    pub stored_path: String,
    /// 内容的 SHA-256（十六进制）
    pub content_hash: String,
}
