//! # 业务逻辑服务模块
//!
//! 仪表盘背后的逻辑，与 Tauri command 层解耦，可以脱离桌面运行时单独测试：
//! - `config_store` - 采集器配置与界面设置的读写
//! - `cache` - 内存缓存（logger 状态 TTL 缓存和图片 LRU 缓存）
//! - `processes` - 当前进程快照、进程历史查询、过滤与排序
//! - `screenshots` - 截图分页列表与 data URL 读取
//! - `camera` - 摄像头支持检测与帧分页列表
//! - `audio` - 录音文件列表与 WAV 时长
//! - `recorder` - 录音控制状态机（同步到服务端 microphone logger）
//! - `terminal` - 在系统终端中执行录音命令
//! - `text_upload` - 文本文件上传、列表与搜索
//! - `loggers` - logger 状态查询、切换与快照
//! - `poller` - 定时轮询任务
//! - `format` - 内存大小、时长等显示格式化

pub mod audio;
pub mod cache;
pub mod camera;
pub mod config_store;
pub mod format;
pub mod loggers;
pub mod poller;
pub mod processes;
pub mod recorder;
pub mod screenshots;
pub mod terminal;
pub mod text_upload;
