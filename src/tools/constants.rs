//! 常量和默认配置集中管理
//!
//! 外部程序名、编码预设、文件名约定和退出码都在这里定义，避免散落在各模块。

/// 外部程序
pub mod programs {
    /// FLAC编解码器
    pub const FLAC: &str = "flac";
    /// FLAC元数据工具
    pub const METAFLAC: &str = "metaflac";
    /// MP3编码器
    pub const LAME: &str = "lame";

    /// 覆盖 `flac` 路径的环境变量
    pub const FLAC_ENV: &str = "ANARKY_FLAC";
    /// 覆盖 `metaflac` 路径的环境变量
    pub const METAFLAC_ENV: &str = "ANARKY_METAFLAC";
    /// 覆盖 `lame` 路径的环境变量
    pub const LAME_ENV: &str = "ANARKY_LAME";
}

/// 编码器参数预设（固定为最高质量）
pub mod presets {
    /// `flac -d -f`：解码并强制覆盖输出
    pub const FLAC_DECODE: &[&str] = &["-d", "-f"];

    /// `flac -f8V`：强制覆盖、最高压缩级别（-l 12 -b 4096 -m -e -r 6）、编码后校验
    pub const FLAC_ENCODE: &[&str] = &["-f8V"];

    /// `lame`：320 kbps、最高质量、insane预设、仅写ID3v2标签
    pub const LAME_ENCODE: &[&str] = &[
        "-b",
        "320",
        "-q",
        "0",
        "--preset",
        "insane",
        "--id3v2-only",
    ];

    /// FLAC PICTURE块类型 3 = 封面（正面）
    pub const FLAC_FRONT_COVER_TYPE: u8 = 3;
}

/// 文件命名约定
pub mod naming {
    /// 标签side-car文件扩展名
    pub const TAGS_EXTENSION: &str = "json";

    /// 播放列表扩展名
    pub const PLAYLIST_EXTENSION: &str = "m3u";

    /// 未知艺术家占位
    pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

    /// 未知专辑占位
    pub const UNKNOWN_ALBUM: &str = "Unknown Album";

    /// 目标目录写权限探测文件前缀
    pub const WRITE_PROBE_PREFIX: &str = ".anarky-write-probe";
}

/// 用户可见消息
pub mod messages {
    /// 中断提示
    pub const ERROR_INTERRUPTED: &str = "The program execution was interrupted!";

    /// 请求了标签但没有找到side-car
    pub const WARNING_NO_TAGS: &str =
        "没有找到该文件的标签，继续编码但不写入标签 / No tags found for this file, encoding without tags";
}

/// 进程退出码
pub mod exit_codes {
    /// 全部成功
    pub const SUCCESS: i32 = 0;
    /// 通用错误（含部分文件转换失败）
    pub const GENERAL_ERROR: i32 = 1;
    /// 命令行用法/输入错误
    pub const USAGE_ERROR: i32 = 2;
    /// 外部程序缺失或失败
    pub const TOOL_ERROR: i32 = 3;
    /// 元数据错误
    pub const METADATA_ERROR: i32 = 4;
    /// 用户中断（128 + SIGINT）
    pub const INTERRUPTED: i32 = 130;
}
