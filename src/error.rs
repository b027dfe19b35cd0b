//! 统一错误处理框架
//!
//! 转换流程中所有失败都落到 `ConvertError`，批处理统计与退出码再按
//! `ErrorCategory` 归类。

use std::fmt;
use std::io;

/// 音频转换相关的统一错误类型
#[derive(Debug)]
pub enum ConvertError {
    /// 命令行用法错误（未知选项、缺少参数值等）
    Usage(String),

    /// 输入验证错误（路径不存在、扩展名不符、格式探测失败）
    InvalidInput(String),

    /// 文件I/O错误
    Io(io::Error),

    /// 外部程序不可用（PATH中找不到或无法启动）
    ToolUnavailable(String),

    /// 外部程序以非零状态退出
    ToolFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// 标签/封面元数据错误（side-car文件损坏、工具输出无法解析）
    Metadata(String),

    /// 用户中断（Ctrl-C）
    Interrupted,
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Usage(msg) => write!(f, "用法错误 / Usage error: {msg}"),
            ConvertError::InvalidInput(msg) => write!(f, "输入验证失败 / Invalid input: {msg}"),
            ConvertError::Io(err) => write!(f, "文件I/O错误 / I/O error: {err}"),
            ConvertError::ToolUnavailable(program) => {
                write!(f, "Program '{program}' was not found! / 未找到外部程序")
            }
            ConvertError::ToolFailed {
                program,
                code,
                stderr,
            } => {
                match code {
                    Some(code) => write!(f, "'{program}' 执行失败 / failed (exit code {code})")?,
                    None => write!(f, "'{program}' 被信号终止 / terminated by signal")?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            ConvertError::Metadata(msg) => write!(f, "元数据错误 / Metadata error: {msg}"),
            ConvertError::Interrupted => write!(f, "The program execution was interrupted!"),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ConvertError {
    fn from(err: io::Error) -> Self {
        ConvertError::Io(err)
    }
}

impl From<hound::Error> for ConvertError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => ConvertError::Io(e),
            other => ConvertError::InvalidInput(format!("WAV头解析失败 / bad WAV header: {other}")),
        }
    }
}

impl From<walkdir::Error> for ConvertError {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(e) => ConvertError::Io(e),
            None => ConvertError::InvalidInput("目录遍历出现循环链接 / filesystem loop".to_string()),
        }
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::Metadata(format!("JSON: {err}"))
    }
}

/// 音频转换操作的标准Result类型
pub type ConvertResult<T> = Result<T, ConvertError>;

// ==================== 错误转换Helper函数 ====================

/// 创建用法错误的helper函数
#[inline]
pub fn usage_error(msg: impl Into<String>) -> ConvertError {
    ConvertError::Usage(msg.into())
}

/// 创建元数据错误的helper函数
#[inline]
pub fn metadata_error<E: fmt::Display>(context: &str, err: E) -> ConvertError {
    ConvertError::Metadata(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================
// 用于批量处理中的错误统计和退出码选择

/// 错误类别枚举
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// 命令行用法
    Usage,
    /// 输入文件无效
    Input,
    /// I/O相关错误
    Io,
    /// 外部程序缺失或执行失败
    Tool,
    /// 标签/封面元数据
    Metadata,
    /// 其他（中断等）
    Other,
}

impl ErrorCategory {
    /// 从ConvertError提取错误类别
    pub fn from_error(e: &ConvertError) -> Self {
        match e {
            ConvertError::Usage(_) => Self::Usage,
            ConvertError::InvalidInput(_) => Self::Input,
            ConvertError::Io(_) => Self::Io,
            ConvertError::ToolUnavailable(_) | ConvertError::ToolFailed { .. } => Self::Tool,
            ConvertError::Metadata(_) => Self::Metadata,
            ConvertError::Interrupted => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Usage => "用法错误 / usage",
            Self::Input => "输入无效 / input",
            Self::Io => "I/O错误 / io",
            Self::Tool => "外部程序 / tool",
            Self::Metadata => "元数据 / metadata",
            Self::Other => "其他 / other",
        }
    }
}
