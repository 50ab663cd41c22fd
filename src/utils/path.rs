//! # 路径工具函数
//!
//! 提供与文件路径相关的工具函数，包括：
//! - 获取 lifelog 配置目录路径（`~/.config/lifelog/`）
//! - 展开配置文件中以 `~` 开头的路径
//! - 校验目标文件位于指定目录内（防止路径遍历）

use std::path::{Component, Path, PathBuf};

/// 采集器配置路径的环境变量覆盖
pub const CONFIG_PATH_ENV: &str = "LIFELOG_CONFIG_PATH";

/// 获取 lifelog 配置目录的绝对路径
///
/// 采集器与界面共用 `~/.config/lifelog/` 目录。
///
/// # 错误
/// 如果无法确定用户主目录（极端情况，如无 HOME 环境变量），返回错误信息。
pub fn get_lifelog_config_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or_else(|| "无法获取用户主目录".to_string())?;
    Ok(home.join(".config").join("lifelog"))
}

/// 采集器配置文件路径
///
/// 环境变量 `LIFELOG_CONFIG_PATH` 非空时优先使用，
/// 否则为 `~/.config/lifelog/config.toml`。
pub fn get_collector_config_path() -> Result<PathBuf, String> {
    if let Ok(custom) = std::env::var(CONFIG_PATH_ENV) {
        if !custom.trim().is_empty() {
            return Ok(expand_home(Path::new(custom.trim())));
        }
    }
    Ok(get_lifelog_config_dir()?.join("config.toml"))
}

/// 界面设置文件路径：`~/.config/lifelog/interface.json`
pub fn get_interface_settings_path() -> Result<PathBuf, String> {
    Ok(get_lifelog_config_dir()?.join("interface.json"))
}

/// 展开以 `~` 开头的路径
///
/// 只处理独立的 `~` 组件（`~/lifelog`），`~user/...` 形式原样返回。
pub fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// 解析目录内的相对文件名，并确认结果仍在目录内
///
/// 使用 `std::fs::canonicalize` 解析符号链接和 `..` 等路径组件，
/// 确保最终路径确实位于 `base_dir` 内。
///
/// # 参数
/// - `base_dir` - 允许访问的根目录
/// - `relative` - 前端传入的文件名（可带前导 `/`）
///
/// # 错误
/// 文件不存在或路径逃逸出 `base_dir` 时返回错误
pub fn resolve_within(base_dir: &Path, relative: &str) -> Result<PathBuf, String> {
    let clean = relative.trim_start_matches(['/', '\\']);
    if clean.is_empty() {
        return Err("文件名不能为空".to_string());
    }

    let candidate = base_dir.join(clean);
    let canonical = std::fs::canonicalize(&candidate)
        .map_err(|e| format!("文件不存在或无法访问 {}: {}", clean, e))?;
    let base_canonical = std::fs::canonicalize(base_dir)
        .map_err(|e| format!("目录解析失败 {}: {}", base_dir.display(), e))?;

    if !canonical.starts_with(&base_canonical) {
        return Err(format!(
            "安全检查失败：路径 {} 不在目录 {} 下",
            clean,
            base_dir.display()
        ));
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home(Path::new("~/lifelog/screen")), home.join("lifelog/screen"));
        assert_eq!(expand_home(Path::new("/var/lifelog")), PathBuf::from("/var/lifelog"));
        assert_eq!(expand_home(Path::new("~bob/x")), PathBuf::from("~bob/x"));
    }

    #[test]
    fn test_resolve_within_accepts_child() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();

        let resolved = resolve_within(dir.path(), "/a.png").unwrap();
        assert!(resolved.ends_with("a.png"));
    }

    #[test]
    fn test_resolve_within_rejects_escape() {
        let root = tempfile::tempdir().unwrap();
        let inner = root.path().join("screens");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(root.path().join("secret.txt"), b"x").unwrap();

        assert!(resolve_within(&inner, "../secret.txt").is_err());
        assert!(resolve_within(&inner, "missing.png").is_err());
        assert!(resolve_within(&inner, "").is_err());
    }
}
