//! # 配置读写服务
//!
//! 负责两份配置文件的加载与保存：
//! - 采集器配置 `config.toml`（TOML），界面只改写 screen / microphone / camera 段中变化的键
//! - 界面设置 `interface.json`（JSON，带缩进）
//!
//! ## 一致性
//! 所有"读取-修改-写回"操作在同一把异步锁内完成，
//! 避免两个设置面板同时保存时互相覆盖。
//!
//! ## 缺失与损坏
//! 文件不存在时返回默认配置（首次使用）；文件存在但无法解析时返回错误，
//! 不会用默认值覆盖用户的文件。

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use toml_edit::{DocumentMut, Item, Table, TableLike, value};

use crate::client::API_URL_ENV;
use crate::models::settings::{
    CameraConfig, CollectorConfig, InterfaceSettings, MAX_CAPTURE_INTERVAL_SECS,
    MicrophoneConfig, SCREEN_INTERVAL_RANGE, ScreenConfig,
};
use crate::utils::path;

/// 配置存储
pub struct ConfigStore {
    config_path: PathBuf,
    settings_path: PathBuf,
    /// 串行化写操作
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(config_path: PathBuf, settings_path: PathBuf) -> Self {
        Self {
            config_path,
            settings_path,
            write_lock: Mutex::new(()),
        }
    }

    /// 使用默认路径（`~/.config/lifelog/`，可被 `LIFELOG_CONFIG_PATH` 覆盖）
    ///
    /// # 错误
    /// 无法确定用户主目录时返回错误
    pub fn from_default_paths() -> Result<Self, String> {
        Ok(Self::new(
            path::get_collector_config_path()?,
            path::get_interface_settings_path()?,
        ))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    // ======== 采集器配置 ========

    /// 读取采集器配置
    ///
    /// 返回的各段 `output_dir` 中以 `~` 开头的路径已展开为绝对路径，
    /// 仅用于文件访问；写回时文件中的原值保持不变。
    ///
    /// # 错误
    /// 文件存在但无法读取或 TOML 解析失败时返回错误
    pub async fn load(&self) -> Result<CollectorConfig, String> {
        if !self.config_path.exists() {
            log::info!(
                "采集器配置文件不存在，使用默认配置: {}",
                self.config_path.display()
            );
            return Ok(CollectorConfig::default());
        }

        let content = self.read_config_text().await?;
        parse_config(&content)
    }

    async fn read_config_text(&self) -> Result<String, String> {
        if !self.config_path.exists() {
            return Ok(String::new());
        }
        tokio::fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| format!("读取配置文件失败: {}", e))
    }

    /// 在写锁内读取原文、修改部分键并写回
    ///
    /// 采集器与界面共用这份文件：只改动 `edit` 写入的键，
    /// 注释、键顺序与其余值按原文保留。
    ///
    /// # 参数
    /// - `edit` - 接收当前配置（路径已展开）与可编辑文档
    ///
    /// # 返回值
    /// 写回后的配置（路径已展开）
    async fn edit_config<F>(&self, edit: F) -> Result<CollectorConfig, String>
    where
        F: FnOnce(&CollectorConfig, &mut DocumentMut) -> Result<(), String>,
    {
        let _guard = self.write_lock.lock().await;

        let content = self.read_config_text().await?;
        let current = parse_config(&content)?;
        let mut document: DocumentMut = content
            .parse()
            .map_err(|e| format!("解析配置文件失败: {}", e))?;

        edit(&current, &mut document)?;

        let updated = document.to_string();
        let config = parse_config(&updated)?;

        if let Some(parent) = self.config_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("创建配置目录失败: {}", e))?;
        }
        tokio::fs::write(&self.config_path, updated)
            .await
            .map_err(|e| format!("写入配置文件失败: {}", e))?;

        Ok(config)
    }

    /// 更新截图开关与间隔
    ///
    /// # 参数
    /// - `enabled` - 是否启用截图
    /// - `interval` - 截图间隔（秒），必须在 30-600 之间
    ///
    /// # 返回值
    /// 返回更新后的完整截图配置
    ///
    /// # 错误
    /// 间隔越界时返回错误，配置文件保持不变
    pub async fn update_screenshot_settings(
        &self,
        enabled: bool,
        interval: f64,
    ) -> Result<ScreenConfig, String> {
        validate_screen_interval(interval)?;

        let config = self
            .edit_config(|current, document| {
                let screen = section(document, "screen")?;
                set_if_changed(screen, "enabled", current.screen.enabled, enabled);
                set_if_changed(screen, "interval", current.screen.interval, interval);
                Ok(())
            })
            .await?;

        log::info!("截图设置已更新: enabled={}, interval={}s", enabled, interval);
        Ok(config.screen)
    }

    /// 替换麦克风配置
    ///
    /// 只写回与当前值不同的键；前端回传的 `output_dir` 是展开后的路径，
    /// 未修改时文件中的 `~` 写法保持不变。
    ///
    /// # 错误
    /// 校验失败时返回错误（见 [`validate_microphone`]），配置文件保持不变
    pub async fn update_microphone(
        &self,
        microphone: MicrophoneConfig,
    ) -> Result<MicrophoneConfig, String> {
        validate_microphone(&microphone)?;

        let config = self
            .edit_config(|current, document| {
                let old = &current.microphone;
                let table = section(document, "microphone")?;
                set_if_changed(table, "enabled", old.enabled, microphone.enabled);
                set_if_changed(
                    table,
                    "output_dir",
                    path_text(&old.output_dir),
                    path_text(&microphone.output_dir),
                );
                set_if_changed(
                    table,
                    "sample_rate",
                    i64::from(old.sample_rate),
                    i64::from(microphone.sample_rate),
                );
                set_if_changed(
                    table,
                    "chunk_duration_secs",
                    toml_int(old.chunk_duration_secs)?,
                    toml_int(microphone.chunk_duration_secs)?,
                );
                set_if_changed(
                    table,
                    "timestamp_format",
                    old.timestamp_format.clone(),
                    microphone.timestamp_format.clone(),
                );
                set_if_changed(
                    table,
                    "bits_per_sample",
                    i64::from(old.bits_per_sample),
                    i64::from(microphone.bits_per_sample),
                );
                set_if_changed(
                    table,
                    "channels",
                    i64::from(old.channels),
                    i64::from(microphone.channels),
                );
                set_if_changed(
                    table,
                    "capture_interval_secs",
                    toml_int(old.capture_interval_secs)?,
                    toml_int(microphone.capture_interval_secs)?,
                );
                Ok(())
            })
            .await?;
        Ok(config.microphone)
    }

    /// 设置自动录音开关（麦克风配置的 `enabled`）
    pub async fn set_auto_recording(&self, enabled: bool) -> Result<MicrophoneConfig, String> {
        let config = self
            .edit_config(|current, document| {
                let table = section(document, "microphone")?;
                set_if_changed(table, "enabled", current.microphone.enabled, enabled);
                Ok(())
            })
            .await?;
        Ok(config.microphone)
    }

    /// 更新摄像头开关、采集间隔与帧率
    ///
    /// # 错误
    /// 间隔不是正数或帧率为 0 时返回错误，配置文件保持不变
    pub async fn update_camera_settings(
        &self,
        enabled: bool,
        interval: f64,
        fps: u32,
    ) -> Result<CameraConfig, String> {
        validate_camera(interval, fps)?;

        let config = self
            .edit_config(|current, document| {
                let old = &current.camera;
                let table = section(document, "camera")?;
                set_if_changed(table, "enabled", old.enabled, enabled);
                set_if_changed(table, "interval", old.interval, interval);
                set_if_changed(table, "fps", i64::from(old.fps), i64::from(fps));
                Ok(())
            })
            .await?;

        log::info!(
            "摄像头设置已更新: enabled={}, interval={}s, fps={}",
            enabled,
            interval,
            fps
        );
        Ok(config.camera)
    }

    // ======== 界面设置 ========

    /// 读取界面设置，并应用 `VITE_GRPC_API_URL` 环境变量
    ///
    /// # 错误
    /// 文件存在但无法读取或 JSON 解析失败时返回错误
    pub async fn load_interface_settings(&self) -> Result<InterfaceSettings, String> {
        let settings = if self.settings_path.exists() {
            let content = tokio::fs::read_to_string(&self.settings_path)
                .await
                .map_err(|e| format!("读取界面设置失败: {}", e))?;
            serde_json::from_str(&content).map_err(|e| format!("解析界面设置失败: {}", e))?
        } else {
            InterfaceSettings::default()
        };

        Ok(apply_env_override(settings, std::env::var(API_URL_ENV).ok()))
    }

    /// 保存界面设置（带缩进的 JSON）
    pub async fn save_interface_settings(&self, settings: &InterfaceSettings) -> Result<(), String> {
        crate::client::normalize_base_url(&settings.api_url).map_err(|e| e.to_string())?;

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.settings_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("创建配置目录失败: {}", e))?;
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| format!("序列化界面设置失败: {}", e))?;

        tokio::fs::write(&self.settings_path, content)
            .await
            .map_err(|e| format!("写入界面设置失败: {}", e))
    }
}

/// 解析采集器配置并展开各段 `output_dir` 中的 `~`
fn parse_config(content: &str) -> Result<CollectorConfig, String> {
    let mut config: CollectorConfig =
        toml::from_str(content).map_err(|e| format!("解析配置文件失败: {}", e))?;

    config.screen.output_dir = path::expand_home(&config.screen.output_dir);
    config.microphone.output_dir = path::expand_home(&config.microphone.output_dir);
    config.processes.output_dir = path::expand_home(&config.processes.output_dir);
    config.camera.output_dir = path::expand_home(&config.camera.output_dir);
    config.text_upload.output_dir = path::expand_home(&config.text_upload.output_dir);

    Ok(config)
}

/// 取出（必要时创建）配置段
fn section<'a>(document: &'a mut DocumentMut, name: &str) -> Result<&'a mut dyn TableLike, String> {
    let mut empty = Table::new();
    // 没有写入任何键时不输出空段头
    empty.set_implicit(true);
    document
        .entry(name)
        .or_insert(Item::Table(empty))
        .as_table_like_mut()
        .ok_or_else(|| format!("配置段 [{}] 不是表", name))
}

fn set_if_changed<T>(table: &mut dyn TableLike, key: &str, current: T, new: T)
where
    T: PartialEq + Into<toml_edit::Value>,
{
    if current != new {
        table.insert(key, value(new));
    }
}

fn toml_int(number: u64) -> Result<i64, String> {
    i64::try_from(number).map_err(|_| format!("数值 {} 超出 TOML 整数范围", number))
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// 环境变量中的服务地址优先于设置文件
pub fn apply_env_override(
    mut settings: InterfaceSettings,
    env_value: Option<String>,
) -> InterfaceSettings {
    if let Some(url) = env_value {
        let url = url.trim();
        if !url.is_empty() {
            settings.api_url = url.to_string();
        }
    }
    settings
}

/// 截图间隔必须在 30 秒到 10 分钟之间
pub fn validate_screen_interval(interval: f64) -> Result<(), String> {
    if !SCREEN_INTERVAL_RANGE.contains(&interval) {
        return Err("截图间隔必须在 30 秒到 10 分钟之间".to_string());
    }
    Ok(())
}

/// 摄像头采集间隔必须为正数，帧率大于 0
pub fn validate_camera(interval: f64, fps: u32) -> Result<(), String> {
    if !(interval.is_finite() && interval > 0.0) {
        return Err("摄像头采集间隔必须大于 0".to_string());
    }
    if fps == 0 {
        return Err("摄像头帧率必须大于 0".to_string());
    }
    Ok(())
}

pub fn validate_microphone(config: &MicrophoneConfig) -> Result<(), String> {
    if config.chunk_duration_secs == 0 {
        return Err("录音片段时长必须大于 0".to_string());
    }
    if config.capture_interval_secs == 0 {
        return Err("录音采集间隔必须大于 0".to_string());
    }
    if config.capture_interval_secs > MAX_CAPTURE_INTERVAL_SECS {
        return Err("录音采集间隔不能超过 24 小时".to_string());
    }
    if config.chunk_duration_secs > config.capture_interval_secs {
        return Err(format!(
            "录音片段时长（{} 秒）不能超过采集间隔（{} 秒）",
            config.chunk_duration_secs, config.capture_interval_secs
        ));
    }
    if config.sample_rate == 0 || config.channels == 0 {
        return Err("采样率与声道数必须大于 0".to_string());
    }
    Ok(())
}
