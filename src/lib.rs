//! anarky - FLAC / WAV / MP3 转换命令行工具
//!
//! 编解码完全交给外部程序 `flac`、`metaflac`、`lame`，本库负责：
//! - 命令行选项的分词与校验
//! - 输入文件解析（显式文件 + 递归目录扫描）
//! - 外部程序调用门面，含封面与标签的提取（进程内解析工具输出）
//! - 标签side-car文件、`.m3u` 播放列表与批处理汇总
//!
//! 可执行文件：`flac2wav`、`flac2mp3`、`wav2flac`、`wav2mp3`。

pub mod audio;
pub mod error;
pub mod tools;

// 重新导出核心类型
pub use audio::{AudioFileKind, Codec, ConversionResult, Converter, Tag, TagMap};
pub use error::{ConvertError, ConvertResult, ErrorCategory};
pub use tools::Workflow;
