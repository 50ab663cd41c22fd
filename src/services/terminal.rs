//! # 终端录音
//!
//! 在系统终端中执行用户配置的录音命令（默认 `arecord` / `sox`），
//! 录音文件直接写入麦克风输出目录，随后出现在录音列表中。

use std::path::Path;

use chrono::Local;

use crate::models::settings::MicrophoneConfig;
use crate::services::format::clamp_recording_duration;

/// 终端录音的文件名格式
const RECORDING_FILENAME_FORMAT: &str = "recording_%Y-%m-%d_%H-%M-%S.wav";

/// 展开录音命令模板
///
/// # 参数
/// - `template` - 含 `{duration}` 与 `{filename}` 占位符的命令
/// - `duration` - 录音时长（秒）
/// - `filename` - WAV 文件名，会被单引号包裹
pub fn build_recorder_command(template: &str, duration: u64, filename: &str) -> String {
    template
        .replace("{duration}", &duration.to_string())
        .replace("{filename}", &shell_quote(filename))
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// 打开终端执行一次手动录音
///
/// 时长被限制在采集间隔的 80% 以内，避免与自动录音重叠。
///
/// # 参数
/// - `config` - 麦克风配置（输出目录与采集间隔）
/// - `template` - 录音命令模板
/// - `requested_secs` - 期望时长；`None` 表示使用允许的最长时长
///
/// # 返回值
/// 返回实际在终端中执行的命令
///
/// # 错误
/// 输出目录无法创建或终端启动失败时返回错误
pub async fn open_terminal_for_recording(
    config: &MicrophoneConfig,
    template: &str,
    requested_secs: Option<u64>,
) -> Result<String, String> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| format!("创建录音目录失败: {}", e))?;

    let duration = clamp_recording_duration(
        requested_secs.unwrap_or(u64::MAX),
        config.capture_interval_secs,
    );
    let filename = Local::now().format(RECORDING_FILENAME_FORMAT).to_string();
    let command = build_recorder_command(template, duration, &filename);

    log::info!("在终端中开始录音: {}", command);
    open_terminal_with_command(&config.output_dir, &command)?;
    Ok(command)
}

/// 一个可尝试的终端启动方式
#[derive(Debug, Clone, PartialEq)]
struct TerminalLaunch {
    program: &'static str,
    args: Vec<String>,
}

/// Linux 下依次尝试的终端及其"执行命令"参数
const LINUX_TERMINALS: [(&str, &str); 5] = [
    ("x-terminal-emulator", "-e"),
    ("gnome-terminal", "--"),
    ("konsole", "-e"),
    ("xfce4-terminal", "-x"),
    ("xterm", "-e"),
];

/// 录音结束后保留终端，便于查看 arecord / sox 的输出
fn recording_script(working_dir: &Path, command: &str) -> String {
    format!(
        "cd {} && {} ; exec $SHELL",
        shell_quote(&working_dir.display().to_string()),
        command
    )
}

fn apple_script(working_dir: &Path, command: &str) -> String {
    let script = recording_script(working_dir, command);
    format!(
        "tell application \"Terminal\" to do script \"{}\"",
        script.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// 当前平台的终端启动候选，按优先级排列
fn terminal_launches(working_dir: &Path, command: &str) -> Vec<TerminalLaunch> {
    if cfg!(target_os = "windows") {
        return vec![TerminalLaunch {
            program: "cmd",
            args: vec!["/k".to_string(), command.to_string()],
        }];
    }
    if cfg!(target_os = "macos") {
        return vec![TerminalLaunch {
            program: "osascript",
            args: vec![
                "-e".to_string(),
                apple_script(working_dir, command),
                "-e".to_string(),
                "tell application \"Terminal\" to activate".to_string(),
            ],
        }];
    }

    let script = recording_script(working_dir, command);
    LINUX_TERMINALS
        .iter()
        .map(|&(program, exec_flag)| TerminalLaunch {
            program,
            args: vec![
                exec_flag.to_string(),
                "sh".to_string(),
                "-c".to_string(),
                script.clone(),
            ],
        })
        .collect()
}

fn spawn_launch(launch: &TerminalLaunch, working_dir: &Path) -> std::io::Result<()> {
    let mut process = std::process::Command::new(launch.program);
    process.current_dir(working_dir);

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NEW_CONSOLE: u32 = 0x00000010;
        // cmd.exe 自行解析引号，整条命令原样传入
        process
            .raw_arg(launch.args.join(" "))
            .creation_flags(CREATE_NEW_CONSOLE);
    }
    #[cfg(not(target_os = "windows"))]
    {
        process.args(&launch.args);
    }

    process.spawn().map(|_| ())
}

/// 在新终端窗口中执行录音命令
///
/// Linux 按 `LINUX_TERMINALS` 顺序尝试，第一个成功启动的终端生效。
pub fn open_terminal_with_command(working_dir: &Path, command: &str) -> Result<(), String> {
    let launches = terminal_launches(working_dir, command);
    for launch in &launches {
        match spawn_launch(launch, working_dir) {
            Ok(()) => {
                log::debug!("已通过 {} 打开录音终端", launch.program);
                return Ok(());
            }
            Err(e) => log::debug!("无法启动 {}: {}", launch.program, e),
        }
    }

    let tried: Vec<&str> = launches.iter().map(|l| l.program).collect();
    Err(format!("无法打开终端（已尝试 {}）", tried.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_recorder_command() {
        let command = build_recorder_command(
            "arecord -f cd -t wav -d {duration} {filename}",
            240,
            "recording_2024-01-01_10-00-00.wav",
        );
        assert_eq!(
            command,
            "arecord -f cd -t wav -d 240 'recording_2024-01-01_10-00-00.wav'"
        );
    }

    #[test]
    fn test_filename_is_quoted() {
        let command = build_recorder_command("rec {filename}", 1, "it's.wav");
        assert_eq!(command, "rec 'it'\\''s.wav'");
    }

    #[test]
    fn test_recording_script_quotes_dir() {
        let script = recording_script(Path::new("/tmp/my mic"), "rec 'a.wav'");
        assert_eq!(script, "cd '/tmp/my mic' && rec 'a.wav' ; exec $SHELL");
    }

    #[test]
    fn test_apple_script_escapes_quotes() {
        let script = apple_script(Path::new("/a"), "echo \"hi\"");
        assert_eq!(
            script,
            "tell application \"Terminal\" to do script \"cd '/a' && echo \\\"hi\\\" ; exec $SHELL\""
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_launch_order() {
        let launches = terminal_launches(Path::new("/rec"), "rec");
        assert_eq!(
            launches.iter().map(|l| l.program).collect::<Vec<_>>(),
            vec!["x-terminal-emulator", "gnome-terminal", "konsole", "xfce4-terminal", "xterm"]
        );
        assert_eq!(
            launches[1].args,
            vec!["--", "sh", "-c", "cd '/rec' && rec ; exec $SHELL"]
        );
    }

    #[test]
    fn test_template_without_placeholders() {
        assert_eq!(build_recorder_command("rec", 10, "a.wav"), "rec");
    }
}
