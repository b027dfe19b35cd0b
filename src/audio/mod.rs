//! 音频转换模块
//!
//! 编解码全部委托给外部程序；本模块负责命令构建、输入探测、元数据解析与
//! 播放列表生成。

pub mod codec;
pub mod external;
pub mod facade;
pub mod format;
pub mod metadata;
pub mod playlist;

pub use codec::{Codec, TagFlag};
pub use external::{ProcessRunner, SystemRunner, ToolCommand, ToolOutput, ToolPaths};
pub use facade::{ConversionResult, Converter};
pub use format::AudioFileKind;
pub use metadata::{Tag, TagMap, TagSource};
