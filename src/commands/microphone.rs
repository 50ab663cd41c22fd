//! # 麦克风仪表盘 Tauri Commands
//!
//! 提供录音配置、录音列表与录音控制：
//! - `get_microphone_config` / `update_microphone_config` - 麦克风配置读写
//! - `set_auto_recording` - 自动录音开关
//! - `get_audio_files` - 分页列出 WAV 文件
//! - `start_recording` / `pause_recording` / `resume_recording` / `stop_recording` - 录音控制
//! - `get_recording_status` - 当前录音状态
//! - `open_terminal_for_recording` - 在系统终端中执行录音命令
//!
//! 录音控制的四个 command 都返回转换后的完整状态，前端无需再查询一次。

use tauri::State;

use crate::models::media::{AudioFile, RecordingStatus};
use crate::models::settings::MicrophoneConfig;
use crate::services::{audio, terminal};
use crate::state::AppState;

#[tauri::command]
pub async fn get_microphone_config(state: State<'_, AppState>) -> Result<MicrophoneConfig, String> {
    Ok(state.config.load().await?.microphone)
}

/// 保存麦克风配置
///
/// # 错误
/// 片段时长超过采集间隔（或任一为 0）时返回错误
#[tauri::command]
pub async fn update_microphone_config(
    config: MicrophoneConfig,
    state: State<'_, AppState>,
) -> Result<MicrophoneConfig, String> {
    state.config.update_microphone(config).await
}

#[tauri::command]
pub async fn set_auto_recording(
    enabled: bool,
    state: State<'_, AppState>,
) -> Result<RecordingStatus, String> {
    let microphone = state.config.set_auto_recording(enabled).await?;
    Ok(state.recorder.status(microphone.enabled).await)
}

#[tauri::command]
pub async fn get_audio_files(
    page: u32,
    page_size: u32,
    state: State<'_, AppState>,
) -> Result<Vec<AudioFile>, String> {
    let config = state.config.load().await?;
    audio::list_audio_files(config.microphone.output_dir, page, page_size).await
}

#[tauri::command]
pub async fn start_recording(state: State<'_, AppState>) -> Result<RecordingStatus, String> {
    let client = state.client().await?;
    state.recorder.start(client.as_ref()).await?;
    state.cache.invalidate_logger_status();
    recording_status(&state).await
}

#[tauri::command]
pub async fn pause_recording(state: State<'_, AppState>) -> Result<RecordingStatus, String> {
    let client = state.client().await?;
    state.recorder.pause(client.as_ref()).await?;
    state.cache.invalidate_logger_status();
    recording_status(&state).await
}

#[tauri::command]
pub async fn resume_recording(state: State<'_, AppState>) -> Result<RecordingStatus, String> {
    let client = state.client().await?;
    state.recorder.resume(client.as_ref()).await?;
    state.cache.invalidate_logger_status();
    recording_status(&state).await
}

#[tauri::command]
pub async fn stop_recording(state: State<'_, AppState>) -> Result<RecordingStatus, String> {
    let client = state.client().await?;
    state.recorder.stop(client.as_ref()).await?;
    state.cache.invalidate_logger_status();
    recording_status(&state).await
}

#[tauri::command]
pub async fn get_recording_status(state: State<'_, AppState>) -> Result<RecordingStatus, String> {
    recording_status(&state).await
}

async fn recording_status(state: &AppState) -> Result<RecordingStatus, String> {
    let microphone = state.config.load().await?.microphone;
    Ok(state.recorder.status(microphone.enabled).await)
}

/// 打开系统终端录音
///
/// # 参数
/// - `duration` - 录音时长（秒），可选；超过采集间隔 80% 的部分会被截断
///
/// # 返回值
/// 返回在终端中执行的命令
#[tauri::command]
pub async fn open_terminal_for_recording(
    duration: Option<u64>,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let config = state.config.load().await?;
    let settings = state.config.load_interface_settings().await?;
    terminal::open_terminal_for_recording(&config.microphone, &settings.recorder_command, duration)
        .await
}
