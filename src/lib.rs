//! # Lifelog Interface - 应用核心库
//!
//! 个人生活记录系统的界面端原生层，包括：
//! - `lifelog.LifelogService` 的协议消息与客户端（原生 gRPC / gRPC-Web / REST）
//! - 各仪表盘（进程、截图、摄像头、麦克风、文本上传、模块面板、账户）背后的数据逻辑
//! - 桌面端的 Tauri 初始化与 IPC commands（`desktop` feature）
//!
//! ## 架构说明
//! 通过将核心逻辑放在 `lib.rs` 而非 `main.rs` 中，
//! Tauri 可以在桌面端（`main.rs`）和移动端入口之间共享此初始化代码。
//! 关闭 `desktop` feature 时只编译库层，可以在无 GUI 的环境中测试。
//!
//! ## 模块结构
//! - `proto/` - 协议消息（prost + serde）
//! - `client/` - 服务客户端与三种传输
//! - `models/` - 数据模型（对应前端 TypeScript 类型）
//! - `services/` - 核心业务逻辑（配置、进程、截图、录音、缓存、轮询）
//! - `commands/` - Tauri command 处理函数（IPC 接口层）
//! - `utils/` - 通用工具函数

pub mod client;
pub mod models;
pub mod proto;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
use services::config_store::ConfigStore;
#[cfg(feature = "desktop")]
use state::AppState;

// 移动端（Android/iOS）时将 `run()` 标记为 Tauri 移动端入口点，
// 桌面端由 `main.rs` 直接调用。
#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
/// Tauri 应用启动函数
///
/// 1. 注册所需的 Tauri 插件（对话框、Shell）
/// 2. 初始化应用全局状态（配置存储、缓存、录音控制、推送任务）
/// 3. 注册所有自定义 Tauri commands
/// 4. 在 `setup` 钩子中按需注册调试专用插件（日志）
/// 5. 生成应用上下文并启动主事件循环
///
/// # Panics
/// 无法确定用户主目录，或 Tauri 应用启动失败（例如窗口创建失败）时 panic。
pub fn run() {
    let config = ConfigStore::from_default_paths().expect("failed to resolve lifelog config path");

    tauri::Builder::default()
        // === 官方插件注册 ===
        // 对话框插件：文本上传时选择文件
        .plugin(tauri_plugin_dialog::init())
        // Shell 插件：打开外部链接
        .plugin(tauri_plugin_shell::init())
        // === 应用全局状态初始化 ===
        .manage(AppState::new(config))
        // === 自定义 Tauri Commands 注册 ===
        .invoke_handler(tauri::generate_handler![
            // 进程仪表盘
            commands::processes::get_current_processes,
            commands::processes::get_process_history,
            commands::processes::query_processes,
            // 截图仪表盘
            commands::screenshots::get_screenshots,
            commands::screenshots::get_screenshot_data,
            commands::screenshots::get_screenshot_settings,
            commands::screenshots::update_screenshot_settings,
            // 摄像头仪表盘
            commands::camera::is_camera_supported,
            commands::camera::get_camera_settings,
            commands::camera::update_camera_settings,
            commands::camera::list_camera_frames,
            commands::camera::get_camera_frame_data,
            // 麦克风仪表盘
            commands::microphone::get_microphone_config,
            commands::microphone::update_microphone_config,
            commands::microphone::set_auto_recording,
            commands::microphone::get_audio_files,
            commands::microphone::start_recording,
            commands::microphone::pause_recording,
            commands::microphone::resume_recording,
            commands::microphone::stop_recording,
            commands::microphone::get_recording_status,
            commands::microphone::open_terminal_for_recording,
            // 文本上传
            commands::text::get_all_text_files,
            commands::text::search_text_files,
            commands::text::upload_text_file,
            // 服务端查询与模块面板
            commands::service::search,
            commands::service::get_logger_status,
            commands::service::toggle_logger,
            commands::service::take_snapshot,
            commands::service::get_activity_summary,
            commands::service::get_process_stats,
            commands::service::get_remote_screenshots,
            commands::service::get_remote_processes,
            commands::service::get_camera_frames,
            commands::service::watch_logger_status,
            commands::service::unwatch_logger_status,
            // 账户
            commands::account::login,
            commands::account::register,
            commands::account::get_user_profile,
            commands::account::logout,
            // 设置
            commands::settings::get_interface_settings,
            commands::settings::save_interface_settings,
            commands::settings::get_collector_config,
            commands::settings::get_config_path,
        ])
        .setup(|app| {
            // 仅在开发调试模式下启用日志插件
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
