//! # 截图仪表盘 Tauri Commands
//!
//! - `get_screenshots` - 分页列出截图（页码从 1 开始）
//! - `get_screenshot_data` - 读取单张截图为 data URL
//! - `get_screenshot_settings` / `update_screenshot_settings` - 截图开关与间隔

use tauri::State;

use crate::models::media::Screenshot;
use crate::models::settings::ScreenConfig;
use crate::services::screenshots;
use crate::state::AppState;

#[tauri::command]
pub async fn get_screenshots(
    page: u32,
    page_size: u32,
    state: State<'_, AppState>,
) -> Result<Vec<Screenshot>, String> {
    let config = state.config.load().await?;
    screenshots::list_screenshots(&config.screen, page, page_size).await
}

/// 读取截图文件并返回 `data:<mime>;base64,...`
///
/// # 参数
/// - `filename` - `get_screenshots` 返回的 `path`
///
/// # 错误
/// 文件不在截图目录内、不存在或无法读取时返回错误
#[tauri::command]
pub async fn get_screenshot_data(
    filename: String,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let config = state.config.load().await?;
    screenshots::image_data_url(&config.screen.output_dir, &filename, &state.cache).await
}

#[tauri::command]
pub async fn get_screenshot_settings(state: State<'_, AppState>) -> Result<ScreenConfig, String> {
    Ok(state.config.load().await?.screen)
}

/// 更新截图开关与间隔
///
/// # 错误
/// 间隔不在 30-600 秒之间时返回错误，配置保持不变
#[tauri::command]
pub async fn update_screenshot_settings(
    enabled: bool,
    interval: f64,
    state: State<'_, AppState>,
) -> Result<ScreenConfig, String> {
    state.config.update_screenshot_settings(enabled, interval).await
}
