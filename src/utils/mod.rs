//! # 通用工具模块
//!
//! - `path` - 配置文件路径、`~` 展开与目录包含校验
//! - `sql` - `LIKE` 模式转义

pub mod path;
pub mod sql;
