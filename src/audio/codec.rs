//! 编码器参数构建
//!
//! 把输入/输出路径、标签和封面翻译成 `flac` / `lame` 的命令行。
//! MP3 的标签映射是一张显式的枚举表（[`TagFlag`]），FLAC 统一使用 `-T NAME=value`。

use super::external::{self, ToolCommand, ToolPaths};
use super::format::AudioFileKind;
use super::metadata::{Tag, TagMap};
use crate::tools::constants::presets;
use std::ffi::OsString;
use std::path::Path;

/// 目标编码格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Flac,
    Mp3,
}

impl Codec {
    /// 编码输出的文件类型
    pub fn output_kind(&self) -> AudioFileKind {
        match self {
            Codec::Flac => AudioFileKind::Flac,
            Codec::Mp3 => AudioFileKind::Mp3,
        }
    }

    /// 编码器程序
    pub fn program<'a>(&self, paths: &'a ToolPaths) -> &'a str {
        match self {
            Codec::Flac => &paths.flac,
            Codec::Mp3 => &paths.lame,
        }
    }
}

/// 规范标签到 `lame` 参数的映射方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFlag {
    /// `--flag value`
    Single(&'static str),
    /// `--flag PREFIXvalue`，如 `--tv TPE2=value`
    Prefixed {
        flag: &'static str,
        prefix: &'static str,
    },
    /// `--flag value[/total]`，total 取自另一个标签
    Composite { flag: &'static str, total: Tag },
    /// 没有独立参数，并入另一个标签的 Composite 参数
    FoldedInto(Tag),
}

/// MP3（ID3v2）标签映射表
pub fn mp3_tag_flag(tag: Tag) -> TagFlag {
    match tag {
        Tag::Title => TagFlag::Single("--tt"),
        Tag::Artist => TagFlag::Single("--ta"),
        Tag::Album => TagFlag::Single("--tl"),
        Tag::Date => TagFlag::Single("--ty"),
        Tag::Genre => TagFlag::Single("--tg"),
        Tag::TrackNumber => TagFlag::Composite {
            flag: "--tn",
            total: Tag::TrackTotal,
        },
        Tag::AlbumArtist => TagFlag::Prefixed {
            flag: "--tv",
            prefix: "TPE2=",
        },
        Tag::DiscTotal => TagFlag::Prefixed {
            flag: "--tv",
            prefix: "TPOS=",
        },
        Tag::TrackTotal => TagFlag::FoldedInto(Tag::TrackNumber),
    }
}

/// 生成 `lame` 的标签参数
///
/// TRACKNUMBER=3 与 TRACKTOTAL=12 合并为 `--tn 3/12`；只有TRACKTOTAL时不输出。
pub fn lame_tag_args(tags: &TagMap) -> Vec<String> {
    let mut args = Vec::new();
    for (tag, value) in tags.iter() {
        match mp3_tag_flag(tag) {
            TagFlag::Single(flag) => {
                args.push(flag.to_string());
                args.push(value.to_string());
            }
            TagFlag::Prefixed { flag, prefix } => {
                args.push(flag.to_string());
                args.push(format!("{prefix}{value}"));
            }
            TagFlag::Composite { flag, total } => {
                args.push(flag.to_string());
                match tags.get(total) {
                    Some(total) => args.push(format!("{value}/{total}")),
                    None => args.push(value.to_string()),
                }
            }
            TagFlag::FoldedInto(target) => {
                if !tags.contains(target) {
                    tracing::debug!("{tag} 没有可并入的 {target}，忽略 / dropped without {target}");
                }
            }
        }
    }
    args
}

/// 生成 `flac` 的标签参数（`-T NAME=value`）
pub fn flac_tag_args(tags: &TagMap) -> Vec<String> {
    tags.iter()
        .flat_map(|(tag, value)| ["-T".to_string(), format!("{}={value}", tag.name())])
        .collect()
}

/// FLAC 封面参数：`--picture=3||<文件名>||<路径>`
///
/// 描述字段写入封面文件名（文本，按lossy转换），提取时据此还原文件名；
/// 图片路径保持原始字节。
pub fn flac_picture_arg(cover: &Path) -> OsString {
    let name = cover
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!("--picture={}||{name}||", presets::FLAC_FRONT_COVER_TYPE);
    external::prefixed_os_arg(&prefix, cover.as_os_str())
}

/// FLAC → WAV 解码命令：`flac -d -f <input> -o <output>`
pub fn decode_command(paths: &ToolPaths, input: &Path, output: &Path) -> ToolCommand {
    ToolCommand::new(&paths.flac)
        .args(presets::FLAC_DECODE.iter().copied())
        .path_arg(input)
        .arg("-o")
        .path_arg(output)
}

/// WAV → FLAC/MP3 编码命令
pub fn encode_command(
    codec: Codec,
    paths: &ToolPaths,
    input: &Path,
    output: &Path,
    tags: Option<&TagMap>,
    cover: Option<&Path>,
) -> ToolCommand {
    match codec {
        Codec::Flac => {
            let mut cmd = ToolCommand::new(codec.program(paths))
                .args(presets::FLAC_ENCODE.iter().copied())
                .arg("-o")
                .path_arg(output);
            if let Some(cover) = cover {
                cmd = cmd.arg(flac_picture_arg(cover));
            }
            if let Some(tags) = tags {
                cmd = cmd.args(flac_tag_args(tags));
            }
            cmd.path_arg(input)
        }
        Codec::Mp3 => {
            let mut cmd = ToolCommand::new(codec.program(paths))
                .args(presets::LAME_ENCODE.iter().copied());
            if let Some(cover) = cover {
                cmd = cmd.arg("--ti").path_arg(cover);
            }
            if let Some(tags) = tags {
                cmd = cmd.args(lame_tag_args(tags));
            }
            cmd.path_arg(input).path_arg(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(Tag, &str)]) -> TagMap {
        pairs.iter().map(|(t, v)| (*t, v.to_string())).collect()
    }

    #[test]
    fn test_track_number_joined_with_total() {
        let args = lame_tag_args(&tags(&[(Tag::TrackNumber, "3"), (Tag::TrackTotal, "12")]));
        assert_eq!(args, vec!["--tn", "3/12"]);
    }

    #[test]
    fn test_track_total_alone_is_dropped() {
        let args = lame_tag_args(&tags(&[(Tag::TrackTotal, "12")]));
        assert!(args.is_empty());
    }

    #[test]
    fn test_prefixed_flags() {
        let args = lame_tag_args(&tags(&[(Tag::AlbumArtist, "Band"), (Tag::DiscTotal, "2")]));
        assert_eq!(args, vec!["--tv", "TPE2=Band", "--tv", "TPOS=2"]);
    }

    #[test]
    fn test_every_tag_has_a_mapping() {
        for tag in Tag::ALL {
            match mp3_tag_flag(tag) {
                TagFlag::FoldedInto(target) => assert!(matches!(
                    mp3_tag_flag(target),
                    TagFlag::Composite { total, .. } if total == tag
                )),
                TagFlag::Single(flag)
                | TagFlag::Prefixed { flag, .. }
                | TagFlag::Composite { flag, .. } => assert!(flag.starts_with("--")),
            }
        }
    }

    #[test]
    fn test_flac_tag_args() {
        let args = flac_tag_args(&tags(&[(Tag::Title, "A=B"), (Tag::TrackTotal, "9")]));
        assert_eq!(args, vec!["-T", "TITLE=A=B", "-T", "TRACKTOTAL=9"]);
    }

    #[test]
    fn test_lame_command_layout() {
        let cmd = encode_command(
            Codec::Mp3,
            &ToolPaths::default(),
            Path::new("/out/a.wav"),
            Path::new("/out/a.mp3"),
            Some(&tags(&[(Tag::Title, "T")])),
            Some(Path::new("/img/front.jpg")),
        );
        assert_eq!(cmd.program, "lame");
        assert_eq!(
            cmd.args,
            vec![
                "-b", "320", "-q", "0", "--preset", "insane", "--id3v2-only", "--ti",
                "/img/front.jpg", "--tt", "T", "/out/a.wav", "/out/a.mp3"
            ]
        );
    }

    #[test]
    fn test_flac_command_layout() {
        let cmd = encode_command(
            Codec::Flac,
            &ToolPaths::default(),
            Path::new("/in/a.wav"),
            Path::new("/out/a.flac"),
            None,
            Some(Path::new("/img/front.jpg")),
        );
        assert_eq!(
            cmd.args,
            vec![
                "-f8V",
                "-o",
                "/out/a.flac",
                "--picture=3||front.jpg||/img/front.jpg",
                "/in/a.wav"
            ]
        );
    }

    #[test]
    fn test_decode_command_layout() {
        let cmd = decode_command(
            &ToolPaths::default(),
            Path::new("/in/a.flac"),
            Path::new("/out/a.wav"),
        );
        assert_eq!(cmd.program, "flac");
        assert_eq!(cmd.args, vec!["-d", "-f", "/in/a.flac", "-o", "/out/a.wav"]);
    }
}
