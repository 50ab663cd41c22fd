//! # 摄像头仪表盘 Tauri Commands
//!
//! - `is_camera_supported` - 当前平台能否采集摄像头
//! - `get_camera_settings` / `update_camera_settings` - 摄像头开关、间隔与帧率
//! - `list_camera_frames` - 分页列出本地保存的帧（页码从 1 开始）
//! - `get_camera_frame_data` - 读取单帧为 data URL
//!
//! 服务端的帧数据由 `service::get_camera_frames` 提供。

use tauri::State;

use crate::models::media::CameraFrame;
use crate::models::settings::CameraConfig;
use crate::services::{camera, screenshots};
use crate::state::AppState;

#[tauri::command]
pub async fn is_camera_supported() -> Result<bool, String> {
    Ok(camera::is_camera_supported().await)
}

#[tauri::command]
pub async fn get_camera_settings(state: State<'_, AppState>) -> Result<CameraConfig, String> {
    Ok(state.config.load().await?.camera)
}

/// 更新摄像头开关、采集间隔与帧率
///
/// # 错误
/// 间隔不是正数或帧率为 0 时返回错误，配置保持不变
#[tauri::command]
pub async fn update_camera_settings(
    enabled: bool,
    interval: f64,
    fps: u32,
    state: State<'_, AppState>,
) -> Result<CameraConfig, String> {
    state
        .config
        .update_camera_settings(enabled, interval, fps)
        .await
}

#[tauri::command]
pub async fn list_camera_frames(
    page: u32,
    page_size: u32,
    state: State<'_, AppState>,
) -> Result<Vec<CameraFrame>, String> {
    let config = state.config.load().await?;
    camera::list_camera_frames(&config.camera, page, page_size).await
}

/// 读取单帧并返回 `data:image/jpeg;base64,...`
///
/// # 参数
/// - `filename` - `list_camera_frames` 返回的 `path`
///
/// # 错误
/// 文件不在摄像头目录内、不存在或无法读取时返回错误
#[tauri::command]
pub async fn get_camera_frame_data(
    filename: String,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let config = state.config.load().await?;
    screenshots::image_data_url(&config.camera.output_dir, &filename, &state.cache).await
}
