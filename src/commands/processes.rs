//! # 进程仪表盘 Tauri Commands
//!
//! - `get_current_processes` - 本机当前进程快照
//! - `get_process_history` - 采集器 `processes.db` 中的历史记录
//! - `query_processes` - 取数后按过滤词与排序字段整理，前端只负责渲染

use tauri::State;

use crate::models::process::{ProcessHistoryQuery, ProcessInfo, ProcessView};
use crate::services::processes;
use crate::state::AppState;

#[tauri::command]
pub async fn get_current_processes() -> Result<Vec<ProcessInfo>, String> {
    processes::current_processes().await
}

/// 查询进程历史
///
/// # 参数
/// - `start_time` / `end_time` - 采集时间范围（Unix 秒），可选
/// - `limit` - 最多返回条数，可选
/// - `process_name` - 进程名子串，可选
///
/// # 返回值
/// 按采集时间倒序的进程记录；数据库尚未创建时为空
#[tauri::command]
pub async fn get_process_history(
    start_time: Option<f64>,
    end_time: Option<f64>,
    limit: Option<u32>,
    process_name: Option<String>,
    state: State<'_, AppState>,
) -> Result<Vec<ProcessInfo>, String> {
    let config = state.config.load().await?;
    let query = ProcessHistoryQuery {
        start_time,
        end_time,
        limit,
        process_name,
    };
    processes::process_history(config.processes.output_dir, query).await
}

/// 获取过滤、排序后的进程表
///
/// # 参数
/// - `view` - 过滤词与排序状态
/// - `history` - 为空时使用当前快照，否则按条件查询历史
#[tauri::command]
pub async fn query_processes(
    view: ProcessView,
    history: Option<ProcessHistoryQuery>,
    state: State<'_, AppState>,
) -> Result<Vec<ProcessInfo>, String> {
    let list = match history {
        Some(query) => {
            let config = state.config.load().await?;
            processes::process_history(config.processes.output_dir, query).await?
        }
        None => processes::current_processes().await?,
    };
    Ok(processes::query_processes(list, &view))
}
