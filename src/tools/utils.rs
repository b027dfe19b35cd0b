//! 工具函数模块
//!
//! 文件路径处理等通用工具函数。

/// 文件路径处理工具函数
pub mod path {
    use std::ffi::OsStr;
    use std::path::{Path, PathBuf};

    /// 提取文件名（返回String，用于日志显示）
    #[inline]
    pub fn extract_filename_lossy(path: &Path) -> String {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// 安全提取文件stem（返回String）
    #[inline]
    pub fn extract_file_stem_string(path: &Path) -> String {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("audio")
            .to_string()
    }

    /// 扩展名是否匹配（忽略大小写）
    #[inline]
    pub fn has_extension(path: &Path, extension: &str) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// 把输入文件重定位到目标目录并替换扩展名
    ///
    /// `/music/a/track.flac` + `/out` + `wav` → `/out/track.wav`
    pub fn update_path(file: &Path, directory: &Path, extension: &str) -> PathBuf {
        let mut name = file
            .file_stem()
            .unwrap_or_else(|| OsStr::new("audio"))
            .to_os_string();
        name.push(".");
        name.push(extension);
        directory.join(name)
    }

    /// 把任意文本清理为可用的单个文件名
    ///
    /// 路径分隔符与Windows保留字符替换为 `_`，首尾空白和点被去掉。
    pub fn sanitize_file_name(name: &str) -> String {
        let cleaned: String = name
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        cleaned.trim().trim_matches('.').trim().to_string()
    }
}

pub use path::{
    extract_file_stem_string, extract_filename_lossy, has_extension, sanitize_file_name,
    update_path,
};
