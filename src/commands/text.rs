//! # 文本上传 Tauri Commands
//!
//! - `get_all_text_files` - 全部已上传文件
//! - `search_text_files` - 按文件名子串搜索
//! - `upload_text_file` - 上传一个文件（前端通过对话框插件选择路径）

use std::path::PathBuf;

use tauri::State;

use crate::models::media::TextFile;
use crate::services::text_upload;
use crate::state::AppState;

#[tauri::command]
pub async fn get_all_text_files(state: State<'_, AppState>) -> Result<Vec<TextFile>, String> {
    let config = state.config.load().await?;
    text_upload::list_files(&config.text_upload).await
}

#[tauri::command]
pub async fn search_text_files(
    pattern: String,
    state: State<'_, AppState>,
) -> Result<Vec<TextFile>, String> {
    let config = state.config.load().await?;
    text_upload::search_files(&config.text_upload, &pattern).await
}

/// 上传文本文件
///
/// # 参数
/// - `file_path` - 待上传文件的绝对路径
///
/// # 错误
/// 文件不存在、超过大小上限或格式不受支持时返回错误
#[tauri::command]
pub async fn upload_text_file(
    file_path: String,
    state: State<'_, AppState>,
) -> Result<TextFile, String> {
    let config = state.config.load().await?;
    text_upload::upload_file(&config.text_upload, &PathBuf::from(file_path)).await
}
