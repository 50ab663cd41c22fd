//! # Lifelog Interface - Cargo 构建脚本
//!
//! 仅在启用 `desktop` feature 时调用 `tauri_build::build()`，
//! 生成 Tauri 运行时所需的资源绑定代码、权限清单以及 Windows 资源文件。
//! 纯库构建（默认 feature）不需要任何构建前处理。

/// 构建脚本入口函数
fn main() {
    #[cfg(feature = "desktop")]
    tauri_build::build()
}
