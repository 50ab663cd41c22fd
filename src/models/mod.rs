//! # 数据模型模块
//!
//! 定义了与前端 TypeScript 类型一一对应的 Rust 数据结构。
//! 所有结构体均派生 `Serialize` 和 `Deserialize`，用于 Tauri IPC 传输和配置文件读写。
//! - `process` - 进程快照、进程历史查询与表格视图状态
//! - `media` - 截图、录音、文本上传的列表项
//! - `settings` - 采集器配置（TOML）与界面设置（JSON）

pub mod media;
pub mod process;
pub mod settings;
