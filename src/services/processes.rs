//! # 进程数据服务
//!
//! 进程仪表盘的两类数据来源：
//! - **当前快照**：通过 `sysinfo` 读取本机进程表
//! - **历史记录**：采集器写入的 `processes.db`（SQLite，只读打开）
//!
//! 两者返回同一形状的 `ProcessInfo`，前端表格的过滤与排序也在这里完成
//! （`query_processes`），避免在 IPC 上来回传输整张进程表。
//!
//! ## 阻塞操作
//! 进程表刷新需要间隔一次最短 CPU 采样周期才能得到有效的 CPU 占用，
//! SQLite 查询同样是同步 I/O，两者都放在 `spawn_blocking` 中执行。

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, Users};

use crate::models::process::{
    ProcessHistoryQuery, ProcessInfo, ProcessSortField, ProcessView, SortDirection,
};
use crate::utils::sql::like_contains;

/// 采集器进程数据库的文件名
pub const PROCESS_DB_FILE: &str = "processes.db";

/// 读取本机当前的全部进程
///
/// # 错误
/// 后台任务异常退出时返回错误
pub async fn current_processes() -> Result<Vec<ProcessInfo>, String> {
    tokio::task::spawn_blocking(snapshot_processes)
        .await
        .map_err(|e| format!("读取进程列表失败: {}", e))
}

fn snapshot_processes() -> Vec<ProcessInfo> {
    let mut system = System::new();
    let refresh = ProcessRefreshKind::everything();

    // 两次刷新之间至少间隔一个采样周期，CPU 占用才有意义
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, refresh);
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, refresh);

    let users = Users::new_with_refreshed_list();

    system
        .processes()
        .values()
        .map(|process| {
            let cmdline = process
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");

            ProcessInfo {
                pid: process.pid().as_u32() as i32,
                ppid: process.parent().map(|p| p.as_u32() as i32).unwrap_or(0),
                name: process.name().to_string_lossy().into_owned(),
                exe: process.exe().map(|p| p.to_string_lossy().into_owned()),
                cmdline: (!cmdline.is_empty()).then_some(cmdline),
                status: process.status().to_string(),
                cpu_usage: Some(process.cpu_usage() as f64),
                memory_usage: Some(process.memory() as i64),
                threads: process.tasks().map(|t| t.len().max(1) as i32).unwrap_or(1),
                user: process
                    .user_id()
                    .and_then(|uid| users.get_user_by_id(uid))
                    .map(|user| user.name().to_string()),
                start_time: process.start_time() as f64,
                timestamp: None,
            }
        })
        .collect()
}

/// 查询进程历史
///
/// # 参数
/// - `output_dir` - 进程采集器的输出目录（包含 `processes.db`）
/// - `query` - 时间范围、进程名子串与条数限制
///
/// # 返回值
/// 按采集时间倒序的记录；数据库尚未创建时返回空列表
///
/// # 错误
/// 数据库无法打开或查询失败时返回错误
pub async fn process_history(
    output_dir: PathBuf,
    query: ProcessHistoryQuery,
) -> Result<Vec<ProcessInfo>, String> {
    let db_path = output_dir.join(PROCESS_DB_FILE);
    if !db_path.exists() {
        log::warn!("进程数据库不存在: {}", db_path.display());
        return Ok(Vec::new());
    }

    tokio::task::spawn_blocking(move || query_history(&db_path, &query))
        .await
        .map_err(|e| format!("查询进程历史失败: {}", e))?
}

fn query_history(db_path: &Path, query: &ProcessHistoryQuery) -> Result<Vec<ProcessInfo>, String> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| format!("打开进程数据库失败: {}", e))?;

    let mut sql = String::from(
        "SELECT timestamp, pid, ppid, name, exe, cmdline, status, cpu_usage, memory_usage, \
         threads, user, start_time FROM processes WHERE 1=1",
    );
    let mut params: Vec<Value> = Vec::new();

    if let Some(start) = query.start_time {
        sql.push_str(" AND timestamp >= ?");
        params.push(Value::Real(start));
    }
    if let Some(end) = query.end_time {
        sql.push_str(" AND timestamp <= ?");
        params.push(Value::Real(end));
    }
    if let Some(name) = query.process_name.as_deref().filter(|n| !n.is_empty()) {
        sql.push_str(" AND name LIKE ? ESCAPE '\\'");
        params.push(Value::Text(like_contains(name)));
    }
    sql.push_str(" ORDER BY timestamp DESC");
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(limit as i64));
    }

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| format!("查询进程历史失败: {}", e))?;

    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(ProcessInfo {
                timestamp: Some(row.get(0)?),
                pid: row.get(1)?,
                ppid: row.get(2)?,
                name: row.get(3)?,
                exe: row.get(4)?,
                cmdline: row.get(5)?,
                status: row.get(6)?,
                cpu_usage: row.get(7)?,
                memory_usage: row.get(8)?,
                threads: row.get::<_, Option<i32>>(9)?.unwrap_or(0),
                user: row.get(10)?,
                start_time: row.get::<_, Option<f64>>(11)?.unwrap_or(0.0),
            })
        })
        .map_err(|e| format!("查询进程历史失败: {}", e))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("读取进程记录失败: {}", e))
}

/// 按视图状态过滤并排序进程列表
pub fn query_processes(processes: Vec<ProcessInfo>, view: &ProcessView) -> Vec<ProcessInfo> {
    let mut result = filter_processes(processes, &view.filter);
    sort_processes(&mut result, view.sort_field, view.sort_direction);
    result
}

/// 大小写不敏感的子串过滤：名称、可执行路径、命令行或 PID
///
/// 过滤词为空（或全是空白）时原样返回。
pub fn filter_processes(processes: Vec<ProcessInfo>, filter: &str) -> Vec<ProcessInfo> {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return processes;
    }
    let finder = memchr::memmem::Finder::new(needle.as_bytes());
    let contains = |text: &str| finder.find(text.to_lowercase().as_bytes()).is_some();

    processes
        .into_par_iter()
        .filter(|p| {
            contains(&p.name)
                || p.exe.as_deref().is_some_and(contains)
                || p.cmdline.as_deref().is_some_and(contains)
                || p.pid.to_string().contains(&needle)
        })
        .collect()
}

/// 按字段排序；数值字段比较数值，其余字段比较字符串
pub fn sort_processes(
    processes: &mut [ProcessInfo],
    field: ProcessSortField,
    direction: SortDirection,
) {
    processes.sort_by(|a, b| {
        let ordering = compare_by(a, b, field);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_by(a: &ProcessInfo, b: &ProcessInfo, field: ProcessSortField) -> Ordering {
    match field {
        ProcessSortField::Pid => a.pid.cmp(&b.pid),
        ProcessSortField::CpuUsage => a
            .cpu_usage
            .unwrap_or(0.0)
            .total_cmp(&b.cpu_usage.unwrap_or(0.0)),
        ProcessSortField::MemoryUsage => a
            .memory_usage
            .unwrap_or(0)
            .cmp(&b.memory_usage.unwrap_or(0)),
        ProcessSortField::Threads => a.threads.cmp(&b.threads),
        ProcessSortField::StartTime => a.start_time.total_cmp(&b.start_time),
        ProcessSortField::Name => a.name.cmp(&b.name),
        ProcessSortField::Status => a.status.cmp(&b.status),
        ProcessSortField::User => a
            .user
            .as_deref()
            .unwrap_or("")
            .cmp(b.user.as_deref().unwrap_or("")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(pid: i32, name: &str, cpu: f64, memory: i64) -> ProcessInfo {
        ProcessInfo {
            pid,
            ppid: 1,
            name: name.to_string(),
            exe: Some(format!("/usr/bin/{}", name)),
            cmdline: Some(format!("{} --flag", name)),
            status: "Run".to_string(),
            cpu_usage: Some(cpu),
            memory_usage: Some(memory),
            threads: 4,
            user: Some("alice".to_string()),
            start_time: 1_700_000_000.0,
            timestamp: None,
        }
    }

    fn sample() -> Vec<ProcessInfo> {
        vec![
            process(10, "Firefox", 12.5, 900),
            process(200, "bash", 0.1, 10_000),
            process(31, "code", 3.0, 5_000),
        ]
    }

    #[test]
    fn test_filter_matches_name_exe_cmdline_and_pid() {
        let names = |v: Vec<ProcessInfo>| v.into_iter().map(|p| p.name).collect::<Vec<_>>();

        assert_eq!(names(filter_processes(sample(), "FIRE")), vec!["Firefox"]);
        assert_eq!(names(filter_processes(sample(), "/usr/bin/ba")), vec!["bash"]);
        assert_eq!(names(filter_processes(sample(), "--flag")).len(), 3);
        assert_eq!(names(filter_processes(sample(), "20")), vec!["bash"]);
        assert_eq!(filter_processes(sample(), "  ").len(), 3);
        assert!(filter_processes(sample(), "zzz").is_empty());
    }

    #[test]
    fn test_sort_numeric_and_text() {
        let mut list = sample();
        sort_processes(&mut list, ProcessSortField::CpuUsage, SortDirection::Desc);
        assert_eq!(list[0].name, "Firefox");

        sort_processes(&mut list, ProcessSortField::MemoryUsage, SortDirection::Asc);
        assert_eq!(list[0].name, "Firefox");
        assert_eq!(list[2].name, "bash");

        // 数值比较而非字符串比较：10 < 31 < 200
        sort_processes(&mut list, ProcessSortField::Pid, SortDirection::Asc);
        assert_eq!(
            list.iter().map(|p| p.pid).collect::<Vec<_>>(),
            vec![10, 31, 200]
        );

        sort_processes(&mut list, ProcessSortField::Name, SortDirection::Asc);
        assert_eq!(list[0].name, "Firefox");
    }

    #[test]
    fn test_query_uses_view_state() {
        let mut view = ProcessView::default();
        view.toggle_sort(ProcessSortField::Pid);
        assert_eq!(view.sort_direction, SortDirection::Desc);
        view.toggle_sort(ProcessSortField::Pid);
        assert_eq!(view.sort_direction, SortDirection::Asc);

        view.filter = "o".to_string();
        let result = query_processes(sample(), &view);
        assert_eq!(
            result.iter().map(|p| p.pid).collect::<Vec<_>>(),
            vec![10, 31]
        );
    }

    fn create_history_db(dir: &Path) -> PathBuf {
        let conn = Connection::open(dir.join(PROCESS_DB_FILE)).unwrap();
        conn.execute_batch(
            "CREATE TABLE processes (
                timestamp REAL NOT NULL, pid INTEGER NOT NULL, ppid INTEGER NOT NULL,
                name TEXT NOT NULL, exe TEXT, cmdline TEXT, status TEXT NOT NULL,
                cpu_usage REAL, memory_usage INTEGER, threads INTEGER, user TEXT,
                start_time REAL, PRIMARY KEY (timestamp, pid));
             INSERT INTO processes VALUES (100.0, 1, 0, 'systemd', NULL, NULL, 'Sleep', 0.0, 1024, 1, 'root', 1.0);
             INSERT INTO processes VALUES (200.0, 42, 1, 'firefox', '/usr/bin/firefox', 'firefox', 'Run', 15.5, 900000, 80, 'alice', 150.0);
             INSERT INTO processes VALUES (300.0, 43, 1, 'firefox-bin', NULL, NULL, 'Run', NULL, NULL, NULL, NULL, NULL);",
        )
        .unwrap();
        dir.to_path_buf()
    }

    #[tokio::test]
    async fn test_history_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = create_history_db(dir.path());

        let all = process_history(output_dir.clone(), ProcessHistoryQuery::default())
            .await
            .unwrap();
        assert_eq!(
            all.iter().map(|p| p.timestamp).collect::<Vec<_>>(),
            vec![Some(300.0), Some(200.0), Some(100.0)]
        );
        assert_eq!(all[0].threads, 0);
        assert_eq!(all[0].cpu_usage, None);

        let query = ProcessHistoryQuery {
            start_time: Some(150.0),
            process_name: Some("fire".to_string()),
            limit: Some(1),
            ..Default::default()
        };
        let found = process_history(output_dir, query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "firefox-bin");
    }

    #[tokio::test]
    async fn test_history_name_wildcards_are_literal() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = create_history_db(dir.path());
        let conn = Connection::open(output_dir.join(PROCESS_DB_FILE)).unwrap();
        conn.execute_batch(
            "INSERT INTO processes VALUES (400.0, 50, 1, 'fire_fox', NULL, NULL, 'Run', NULL, NULL, NULL, NULL, NULL);",
        )
        .unwrap();

        let query = ProcessHistoryQuery {
            process_name: Some("e_f".to_string()),
            ..Default::default()
        };
        let found = process_history(output_dir.clone(), query).await.unwrap();
        assert_eq!(
            found.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["fire_fox"]
        );

        let query = ProcessHistoryQuery {
            process_name: Some("%".to_string()),
            ..Default::default()
        };
        assert!(process_history(output_dir, query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_missing_db_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let result = process_history(dir.path().to_path_buf(), ProcessHistoryQuery::default())
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_current_processes_contains_self() {
        let processes = current_processes().await.unwrap();
        let own_pid = std::process::id() as i32;
        assert!(processes.iter().any(|p| p.pid == own_pid));
    }
}
