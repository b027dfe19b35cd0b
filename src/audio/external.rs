//! 外部程序桥接
//!
//! 所有编解码工作都交给 `flac` / `metaflac` / `lame` 子进程完成。
//! 进程调用通过 [`ProcessRunner`] trait 抽象，测试中可替换为记录型假实现。

use crate::error::{ConvertError, ConvertResult};
use crate::tools::constants::programs;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 外部程序安装指南
const INSTALL_GUIDE: &str = r#"
flac/metaflac and lame are required / 需要安装 flac、metaflac 与 lame

Installation / 安装方法:
  macOS:   brew install flac lame
  Linux:
    - Ubuntu/Debian: sudo apt install flac lame
    - Fedora/RHEL:   sudo dnf install flac lame
    - Arch:          sudo pacman -S flac lame
"#;

/// 一次外部程序调用（程序 + 参数）
///
/// 参数保存为 `OsString`，非UTF-8文件名按原始字节传给子进程。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// `--name=<path>` 形式的参数，路径部分保持原始字节
    pub fn prefixed_path_arg(self, prefix: &str, path: &Path) -> Self {
        self.arg(prefixed_os_arg(prefix, path.as_os_str()))
    }

    /// 是否包含某个参数
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

/// 拼接 `prefix` 与原始路径字节
pub fn prefixed_os_arg(prefix: &str, value: &OsStr) -> OsString {
    let mut arg = OsString::from(prefix);
    arg.push(value);
    arg
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// 子进程执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// 退出码（被信号终止时为None）
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// 外部程序执行器
///
/// 每次调用都同步阻塞到子进程退出。
pub trait ProcessRunner {
    /// 执行命令并收集输出；程序无法启动时返回错误，非零退出码不算错误
    fn run(&self, command: &ToolCommand) -> ConvertResult<ToolOutput>;

    /// 执行命令，非零退出码转换为 [`ConvertError::ToolFailed`]
    fn run_checked(&self, command: &ToolCommand) -> ConvertResult<ToolOutput> {
        let output = self.run(command)?;
        if output.success() {
            Ok(output)
        } else {
            Err(ConvertError::ToolFailed {
                program: command.program.clone(),
                code: output.code,
                stderr: output.stderr,
            })
        }
    }
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, command: &ToolCommand) -> ConvertResult<ToolOutput> {
        (**self).run(command)
    }
}

/// 基于 `std::process::Command` 的真实执行器
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> ConvertResult<ToolOutput> {
        tracing::debug!(command = %command, "spawning external program");

        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::ToolUnavailable(command.program.clone())
                } else {
                    ConvertError::Io(e)
                }
            })?;

        let result = ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            tracing::debug!(
                program = %command.program,
                code = ?result.code,
                "external program exited with failure"
            );
        }

        Ok(result)
    }
}

/// 外部程序路径配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub flac: String,
    pub metaflac: String,
    pub lame: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            flac: programs::FLAC.to_string(),
            metaflac: programs::METAFLAC.to_string(),
            lame: programs::LAME.to_string(),
        }
    }
}

impl ToolPaths {
    /// 读取 `ANARKY_FLAC` / `ANARKY_METAFLAC` / `ANARKY_LAME` 覆盖默认程序名
    pub fn from_env() -> Self {
        let pick = |var: &str, default: &str| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            flac: pick(programs::FLAC_ENV, programs::FLAC),
            metaflac: pick(programs::METAFLAC_ENV, programs::METAFLAC),
            lame: pick(programs::LAME_ENV, programs::LAME),
        }
    }
}

/// 在PATH中查找可执行文件
///
/// 带路径分隔符的程序名直接检查该文件。
pub fn find_program(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(target_os = "windows")]
        {
            let exe = dir.join(format!("{program}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

/// 检查一组外部程序是否都可用
pub fn ensure_programs_available<'a, I>(programs: I) -> ConvertResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for program in programs {
        if find_program(program).is_none() {
            tracing::error!("{}", INSTALL_GUIDE.trim_end());
            return Err(ConvertError::ToolUnavailable(program.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_and_display() {
        let cmd = ToolCommand::new("lame")
            .args(["-b", "320"])
            .arg("--tt")
            .arg("Hello World")
            .path_arg(Path::new("/tmp/a.wav"));
        assert_eq!(cmd.args, vec!["-b", "320", "--tt", "Hello World", "/tmp/a.wav"]);
        assert!(cmd.has_arg("--tt"));
        assert_eq!(
            cmd.to_string(),
            "lame -b 320 --tt \"Hello World\" /tmp/a.wav"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_kept_verbatim() {
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/music/caf\xe9.flac"));
        let cmd = ToolCommand::new("metaflac")
            .prefixed_path_arg("--export-picture-to=", Path::new(OsStr::from_bytes(b"/out/\xe9.jpg")))
            .path_arg(path);
        assert_eq!(cmd.args[1].as_bytes(), b"/music/caf\xe9.flac");
        assert_eq!(cmd.args[0].as_bytes(), b"--export-picture-to=/out/\xe9.jpg");
        assert!(cmd.to_string().starts_with("metaflac --export-picture-to="));
    }

    #[test]
    fn test_missing_program_not_found() {
        assert!(find_program("anarky-definitely-not-installed-9f8e7d").is_none());
        let result = ensure_programs_available(["anarky-definitely-not-installed-9f8e7d"]);
        assert!(matches!(result, Err(ConvertError::ToolUnavailable(_))));
    }

    #[test]
    fn test_system_runner_reports_unavailable_program() {
        let cmd = ToolCommand::new("anarky-definitely-not-installed-9f8e7d");
        let result = SystemRunner.run(&cmd);
        assert!(matches!(result, Err(ConvertError::ToolUnavailable(_))));
    }

    #[test]
    fn test_default_tool_paths() {
        let paths = ToolPaths::default();
        assert_eq!(paths.flac, "flac");
        assert_eq!(paths.metaflac, "metaflac");
        assert_eq!(paths.lame, "lame");
    }
}
