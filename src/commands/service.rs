//! # 服务端调用 Tauri Commands
//!
//! 把 `lifelog.LifelogService` 的查询类 RPC 暴露给前端：
//! - `search` - 全文 / 语义搜索
//! - `get_logger_status` / `toggle_logger` / `take_snapshot` - 模块面板
//! - `get_activity_summary` / `get_process_stats` - 活动统计
//! - `get_remote_screenshots` / `get_remote_processes` / `get_camera_frames` - 服务端流式数据
//! - `watch_logger_status` / `unwatch_logger_status` - 定时推送 logger 状态事件
//!
//! 服务端返回的 `success: false` 作为数据原样交给前端，只有调用失败才返回错误。

use std::collections::HashMap;

use serde::Serialize;
use tauri::{AppHandle, Emitter, Manager, State};

use crate::proto::{
    ActivitySummary, CameraFrameData, LoggerStatusResponse, ProcessData, ProcessStatsRequest,
    ProcessStatsResponse, ScreenshotData, SearchRequest, SearchResponse, SnapshotResponse,
    TimeRangeRequest, ToggleLoggerResponse,
};
use crate::services::loggers;
use crate::services::poller::Poller;
use crate::state::AppState;

/// logger 状态推送的事件名
pub const LOGGER_STATUS_EVENT: &str = "logger-status";

#[tauri::command]
pub async fn search(
    request: SearchRequest,
    state: State<'_, AppState>,
) -> Result<SearchResponse, String> {
    let client = state.client().await?;
    client.search(request).await.map_err(|e| e.to_string())
}

/// 查询 logger 状态
///
/// # 参数
/// - `logger_names` - 要查询的 logger；为空或省略时查询全部
#[tauri::command]
pub async fn get_logger_status(
    logger_names: Option<Vec<String>>,
    state: State<'_, AppState>,
) -> Result<LoggerStatusResponse, String> {
    let client = state.client().await?;
    loggers::logger_status(&client, &state.cache, logger_names.unwrap_or_default())
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn toggle_logger(
    logger_name: String,
    enable: bool,
    state: State<'_, AppState>,
) -> Result<ToggleLoggerResponse, String> {
    let client = state.client().await?;
    loggers::toggle_logger(&client, &state.cache, &logger_name, enable)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn take_snapshot(
    loggers: Vec<String>,
    options: Option<HashMap<String, String>>,
    state: State<'_, AppState>,
) -> Result<SnapshotResponse, String> {
    let client = state.client().await?;
    loggers::take_snapshot(&client, &state.cache, loggers, options.unwrap_or_default())
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_activity_summary(
    range: TimeRangeRequest,
    state: State<'_, AppState>,
) -> Result<ActivitySummary, String> {
    let client = state.client().await?;
    client
        .get_activity_summary(range)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_process_stats(
    request: ProcessStatsRequest,
    state: State<'_, AppState>,
) -> Result<ProcessStatsResponse, String> {
    let client = state.client().await?;
    client
        .get_process_stats(request)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_remote_screenshots(
    range: TimeRangeRequest,
    state: State<'_, AppState>,
) -> Result<Vec<ScreenshotData>, String> {
    let client = state.client().await?;
    client.get_screenshots(range).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_remote_processes(
    range: TimeRangeRequest,
    state: State<'_, AppState>,
) -> Result<Vec<ProcessData>, String> {
    let client = state.client().await?;
    client.get_processes(range).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_camera_frames(
    range: TimeRangeRequest,
    state: State<'_, AppState>,
) -> Result<Vec<CameraFrameData>, String> {
    let client = state.client().await?;
    client
        .get_camera_frames(range)
        .await
        .map_err(|e| e.to_string())
}

/// `logger-status` 事件的负载
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerStatusEvent {
    pub watcher_id: String,
    pub status: Option<LoggerStatusResponse>,
    pub error: Option<String>,
}

/// 开始定时推送 logger 状态
///
/// 每个周期查询一次，结果以 `logger-status` 事件发给前端。
/// 同一 `watcher_id` 重复调用时替换旧任务；组件卸载时应调用 `unwatch_logger_status`。
///
/// # 参数
/// - `watcher_id` - 前端组件自选的标识
/// - `logger_names` - 要查询的 logger；为空或省略时查询全部
#[tauri::command]
pub async fn watch_logger_status(
    app: AppHandle,
    watcher_id: String,
    logger_names: Option<Vec<String>>,
    state: State<'_, AppState>,
) -> Result<(), String> {
    let period = state.config.load_interface_settings().await?.status_poll_interval();
    let names = logger_names.unwrap_or_default();

    let fetch_app = app.clone();
    let fetch = move || {
        let app = fetch_app.clone();
        let names = names.clone();
        async move {
            let state = app.state::<AppState>();
            let client = state.client().await?;
            loggers::logger_status(&client, &state.cache, names)
                .await
                .map_err(|e| e.to_string())
        }
    };

    let id = watcher_id.clone();
    let sink = move |result: Result<LoggerStatusResponse, String>| {
        let (status, error) = match result {
            Ok(status) => (Some(status), None),
            Err(e) => (None, Some(e)),
        };
        let event = LoggerStatusEvent {
            watcher_id: id.clone(),
            status,
            error,
        };
        if let Err(e) = app.emit(LOGGER_STATUS_EVENT, event) {
            log::warn!("推送 logger 状态失败: {}", e);
        }
    };

    state
        .watchers
        .insert(watcher_id, Poller::spawn(period, fetch, sink));
    Ok(())
}

/// 停止推送；返回该 watcher 是否存在
#[tauri::command]
pub async fn unwatch_logger_status(
    watcher_id: String,
    state: State<'_, AppState>,
) -> Result<bool, String> {
    Ok(state.watchers.remove(&watcher_id))
}
