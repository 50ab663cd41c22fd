//! # 配置数据模型
//!
//! 包含两类配置：
//! - **采集器配置**（`CollectorConfig`）：`~/.config/lifelog/config.toml`，
//!   由采集器与界面共享，界面只修改其中的 screen / microphone 段
//! - **界面设置**（`InterfaceSettings`）：`~/.config/lifelog/interface.json`，
//!   仅界面使用，决定服务地址、传输方式和终端录音命令
//!
//! 采集器配置字段使用 snake_case（与 TOML 文件及仪表盘一致），
//! 每个字段都有默认值，缺失字段不会导致解析失败。

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::{DEFAULT_API_URL, DEFAULT_CALL_TIMEOUT};

/// 采集器默认时间戳格式（文件命名）
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S.%3f%Z";

/// 截图间隔的允许范围（秒）
pub const SCREEN_INTERVAL_RANGE: std::ops::RangeInclusive<f64> = 30.0..=600.0;

/// 录音采集间隔的上限（秒）
pub const MAX_CAPTURE_INTERVAL_SECS: u64 = 24 * 60 * 60;

fn lifelog_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join("lifelog")
}

fn default_true() -> bool {
    true
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

/// 采集器配置文件的完整结构
///
/// 界面不认识的段（browser、hyprland 等）保存在 `extra` 中，
/// 写回文件时原样保留。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectorConfig {
    #[serde(default = "default_collector_id")]
    pub id: String,
    #[serde(default = "default_collector_host")]
    pub host: String,
    #[serde(default = "default_collector_port")]
    pub port: u32,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub microphone: MicrophoneConfig,
    #[serde(default)]
    pub processes: ProcessesConfig,
    #[serde(default)]
    pub text_upload: TextUploadConfig,
    /// 其余未建模的配置段
    #[serde(flatten)]
    pub extra: toml::Table,
}

fn default_collector_id() -> String {
    "laptop".to_string()
}

fn default_collector_host() -> String {
    "127.0.0.1".to_string()
}

fn default_collector_port() -> u32 {
    7190
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            id: default_collector_id(),
            host: default_collector_host(),
            port: default_collector_port(),
            timestamp_format: default_timestamp_format(),
            screen: ScreenConfig::default(),
            camera: CameraConfig::default(),
            microphone: MicrophoneConfig::default(),
            processes: ProcessesConfig::default(),
            text_upload: TextUploadConfig::default(),
            extra: toml::Table::new(),
        }
    }
}

/// 屏幕截图采集配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 截图间隔（秒），界面只允许 30-600
    #[serde(default = "default_screen_interval")]
    pub interval: f64,
    #[serde(default = "default_screen_output_dir")]
    pub output_dir: PathBuf,
    /// 截图程序（如 `gnome-screenshot`）
    #[serde(default = "default_screen_program")]
    pub program: String,
    /// 截图文件名的时间格式（chrono strftime）
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_screen_interval() -> f64 {
    60.0
}

fn default_screen_output_dir() -> PathBuf {
    lifelog_dir().join("screen")
}

fn default_screen_program() -> String {
    "gnome-screenshot".to_string()
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: default_screen_interval(),
            output_dir: default_screen_output_dir(),
            program: default_screen_program(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

/// 麦克风录音配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MicrophoneConfig {
    /// 自动录音开关
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_microphone_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// 单个录音片段时长（秒）
    #[serde(default = "default_chunk_duration_secs")]
    pub chunk_duration_secs: u64,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    #[serde(default = "default_bits_per_sample")]
    pub bits_per_sample: u32,
    #[serde(default = "default_channels")]
    pub channels: u32,
    /// 两次自动录音之间的间隔（秒）
    #[serde(default = "default_capture_interval_secs")]
    pub capture_interval_secs: u64,
}

fn default_microphone_output_dir() -> PathBuf {
    lifelog_dir().join("microphone")
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_chunk_duration_secs() -> u64 {
    300
}

fn default_bits_per_sample() -> u32 {
    16
}

fn default_channels() -> u32 {
    2
}

fn default_capture_interval_secs() -> u64 {
    300
}

impl Default for MicrophoneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: default_microphone_output_dir(),
            sample_rate: default_sample_rate(),
            chunk_duration_secs: default_chunk_duration_secs(),
            timestamp_format: default_timestamp_format(),
            bits_per_sample: default_bits_per_sample(),
            channels: default_channels(),
            capture_interval_secs: default_capture_interval_secs(),
        }
    }
}

/// 进程采集配置；`output_dir` 下的 `processes.db` 为进程历史数据库
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_processes_interval")]
    pub interval: f64,
    #[serde(default = "default_processes_output_dir")]
    pub output_dir: PathBuf,
}

fn default_processes_interval() -> f64 {
    60.0
}

fn default_processes_output_dir() -> PathBuf {
    lifelog_dir().join("processes")
}

impl Default for ProcessesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: default_processes_interval(),
            output_dir: default_processes_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_camera_interval")]
    pub interval: f64,
    #[serde(default = "default_camera_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_camera_device")]
    pub device: String,
    #[serde(default = "default_resolution_x")]
    pub resolution_x: u32,
    #[serde(default = "default_resolution_y")]
    pub resolution_y: u32,
    #[serde(default = "default_camera_fps")]
    pub fps: u32,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_camera_interval() -> f64 {
    10.0
}

fn default_camera_output_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join("lifelog_camera")
}

fn default_camera_device() -> String {
    "/dev/video0".to_string()
}

fn default_resolution_x() -> u32 {
    640
}

fn default_resolution_y() -> u32 {
    480
}

fn default_camera_fps() -> u32 {
    30
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_camera_interval(),
            output_dir: default_camera_output_dir(),
            device: default_camera_device(),
            resolution_x: default_resolution_x(),
            resolution_y: default_resolution_y(),
            fps: default_camera_fps(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

/// 文本上传配置；`output_dir` 下的 `text_uploads.db` 为上传索引
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextUploadConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_text_upload_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u32,
    /// 允许的扩展名（不含点，大小写不敏感）
    #[serde(default = "default_supported_formats")]
    pub supported_formats: Vec<String>,
}

fn default_text_upload_output_dir() -> PathBuf {
    lifelog_dir().join("text_upload")
}

fn default_max_file_size_mb() -> u32 {
    10
}

fn default_supported_formats() -> Vec<String> {
    ["txt", "md", "json", "csv", "log"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for TextUploadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: default_text_upload_output_dir(),
            max_file_size_mb: default_max_file_size_mb(),
            supported_formats: default_supported_formats(),
        }
    }
}

// ============ 界面设置 ============

/// 服务调用使用的传输方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// 原生 gRPC（HTTP/2）
    #[default]
    Grpc,
    /// gRPC-Web（HTTP/1.1）
    GrpcWeb,
    /// JSON REST 兜底
    Rest,
}

/// 界面设置
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface InterfaceSettings {
///   apiUrl: string;
///   transport: 'grpc' | 'grpc-web' | 'rest';
///   requestTimeoutSecs: number;
///   statusPollIntervalMs: number;
///   recorderCommand: string;
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InterfaceSettings {
    /// 服务地址；环境变量 `VITE_GRPC_API_URL` 优先
    pub api_url: String,
    pub transport: TransportKind,
    pub request_timeout_secs: u64,
    /// logger 状态轮询周期（毫秒）
    pub status_poll_interval_ms: u64,
    /// 在终端中执行的录音命令
    ///
    /// 支持占位符：`{duration}` 录音时长（秒），`{filename}` 带时间戳的 WAV 文件名
    pub recorder_command: String,
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            transport: TransportKind::default(),
            request_timeout_secs: DEFAULT_CALL_TIMEOUT.as_secs(),
            status_poll_interval_ms: 2000,
            recorder_command: default_recorder_command(),
        }
    }
}

#[cfg(target_os = "macos")]
fn default_recorder_command() -> String {
    "sox -d -c 2 -r 44100 {filename} trim 0 {duration}".to_string()
}

#[cfg(not(target_os = "macos"))]
fn default_recorder_command() -> String {
    "arecord -f cd -t wav -d {duration} {filename}".to_string()
}

impl InterfaceSettings {
    /// 单次调用超时，至少 1 秒
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// 状态轮询周期，至少 250 毫秒
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms.max(250))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CollectorConfig = toml::from_str(
            r#"
            id = "desk"
            [screen]
            interval = 120.0
            output_dir = "/tmp/screens"
            "#,
        )
        .unwrap();
        assert_eq!(config.id, "desk");
        assert_eq!(config.screen.interval, 120.0);
        assert_eq!(config.screen.program, "gnome-screenshot");
        assert_eq!(config.microphone.sample_rate, 44100);
        assert_eq!(config.microphone.capture_interval_secs, 300);
        assert!(!config.camera.enabled);
    }

    #[test]
    fn test_unknown_sections_survive_round_trip() {
        let source = r#"
            id = "desk"
            [hyprland]
            enabled = false
            interval = 1.0
        "#;
        let config: CollectorConfig = toml::from_str(source).unwrap();
        assert!(config.extra.contains_key("hyprland"));

        let written = toml::to_string(&config).unwrap();
        let reparsed: CollectorConfig = toml::from_str(&written).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_interface_settings_json_shape() {
        let settings: InterfaceSettings =
            serde_json::from_str(r#"{ "apiUrl": "http://10.0.0.2:50051", "transport": "grpc-web" }"#)
                .unwrap();
        assert_eq!(settings.transport, TransportKind::GrpcWeb);
        assert_eq!(settings.request_timeout_secs, 5);
        assert_eq!(settings.status_poll_interval(), Duration::from_secs(2));
    }
}
