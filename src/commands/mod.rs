//! # Tauri Command 处理模块
//!
//! 本模块包含所有注册到 Tauri 的 command 处理函数。
//! 每个子模块对应一个仪表盘：
//! - `processes` - 进程快照、历史与表格查询
//! - `screenshots` - 截图列表、图片数据与截图设置
//! - `camera` - 摄像头支持检测、帧列表、帧数据与摄像头设置
//! - `microphone` - 麦克风配置、录音列表与录音控制
//! - `text` - 文本上传
//! - `service` - 服务端查询、模块面板与状态推送
//! - `account` - 登录、注册与用户资料
//! - `settings` - 界面设置与采集器配置

pub mod account;
pub mod camera;
pub mod microphone;
pub mod processes;
pub mod screenshots;
pub mod service;
pub mod settings;
pub mod text;
