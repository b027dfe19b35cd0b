//! 音频文件类型模块
//!
//! 定义工具链涉及的三种容器（FLAC / WAV / MP3）及其扩展名。

use std::fmt;

/// 音频文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFileKind {
    Flac,
    Wav,
    Mp3,
}

impl AudioFileKind {
    /// 扩展名（不含点）
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFileKind::Flac => "flac",
            AudioFileKind::Wav => "wav",
            AudioFileKind::Mp3 => "mp3",
        }
    }

    /// 大写显示名
    pub fn display_name(&self) -> &'static str {
        match self {
            AudioFileKind::Flac => "FLAC",
            AudioFileKind::Wav => "WAV",
            AudioFileKind::Mp3 => "MP3",
        }
    }
}

impl fmt::Display for AudioFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
