//! # 设置 Tauri Commands
//!
//! - `get_interface_settings` / `save_interface_settings` - 界面设置（服务地址、传输方式等）
//! - `get_collector_config` - 完整的采集器配置（只读展示）
//! - `get_config_path` - 采集器配置文件路径
//!
//! 保存界面设置后服务客户端会被重新创建，原有会话令牌随之失效。

use tauri::State;

use crate::models::settings::{CollectorConfig, InterfaceSettings};
use crate::state::AppState;

/// 读取界面设置
///
/// 文件不存在时返回默认设置；环境变量 `VITE_GRPC_API_URL` 覆盖服务地址。
#[tauri::command]
pub async fn get_interface_settings(
    state: State<'_, AppState>,
) -> Result<InterfaceSettings, String> {
    state.config.load_interface_settings().await
}

/// 保存界面设置
///
/// # 错误
/// 服务地址不是 http(s) URL 或写入失败时返回错误
#[tauri::command]
pub async fn save_interface_settings(
    settings: InterfaceSettings,
    state: State<'_, AppState>,
) -> Result<(), String> {
    state.update_interface_settings(&settings).await
}

#[tauri::command]
pub async fn get_collector_config(state: State<'_, AppState>) -> Result<CollectorConfig, String> {
    state.config.load().await
}

#[tauri::command]
pub async fn get_config_path(state: State<'_, AppState>) -> Result<String, String> {
    Ok(state.config.config_path().to_string_lossy().to_string())
}
