//! # 进程数据模型
//!
//! 进程仪表盘的统一数据形状：当前进程快照与历史数据库记录使用同一结构，
//! 历史记录额外带有采集时间戳。

use serde::{Deserialize, Serialize};

/// 单个进程的信息
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface Process {
///   pid: number; ppid: number; name: string;
///   exe: string | null; cmdline: string | null; status: string;
///   cpu_usage: number | null; memory_usage: number | null;
///   threads: number; user: string | null; start_time: number;
///   timestamp?: number;
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessInfo {
    pub pid: i32,
    /// 父进程 PID，无父进程时为 0
    pub ppid: i32,
    pub name: String,
    pub exe: Option<String>,
    pub cmdline: Option<String>,
    pub status: String,
    /// CPU 占用（百分比）
    pub cpu_usage: Option<f64>,
    /// 常驻内存（字节）
    pub memory_usage: Option<i64>,
    pub threads: i32,
    pub user: Option<String>,
    /// 进程启动时间（Unix 秒）
    pub start_time: f64,
    /// 采集时间（Unix 秒），仅历史记录有值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// 进程历史查询条件
///
/// 全部条件可选；结果按采集时间倒序。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessHistoryQuery {
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub limit: Option<u32>,
    /// 进程名子串（SQL LIKE）
    pub process_name: Option<String>,
}

/// 进程表的排序字段
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessSortField {
    Pid,
    Name,
    #[default]
    CpuUsage,
    MemoryUsage,
    Threads,
    StartTime,
    Status,
    User,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// 进程表的视图状态：过滤词 + 排序
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessView {
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub sort_field: ProcessSortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

impl ProcessView {
    /// 点击表头：同一字段翻转方向，新字段从降序开始
    pub fn toggle_sort(&mut self, field: ProcessSortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.reversed();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Desc;
        }
    }
}
