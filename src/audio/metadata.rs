//! 标签与封面元数据模块
//!
//! - 规范标签集合 [`Tag`] 与有序、不可变的 [`TagMap`]
//! - `metaflac` 文本输出的进程内解析（取代 grep/sed 管道）
//! - 标签 side-car 文件的读写（JSON 或 `name|TAG=value|...` 行格式）

use crate::error::{ConvertResult, metadata_error};
use crate::tools::constants::naming;
use crate::tools::utils;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// 规范标签名
///
/// 枚举顺序即规范顺序，`TagMap` 按此顺序迭代。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    /// 曲目名
    Title,
    /// 艺术家
    Artist,
    /// 专辑名
    Album,
    /// 曲目序号
    TrackNumber,
    /// 专辑艺术家（流行音乐中通常与ARTIST相同而省略）
    AlbumArtist,
    /// 流派
    Genre,
    /// 录制日期
    Date,
    /// 碟片总数
    DiscTotal,
    /// 专辑曲目总数
    TrackTotal,
}

impl Tag {
    /// 全部规范标签（规范顺序）
    pub const ALL: [Tag; 9] = [
        Tag::Title,
        Tag::Artist,
        Tag::Album,
        Tag::TrackNumber,
        Tag::AlbumArtist,
        Tag::Genre,
        Tag::Date,
        Tag::DiscTotal,
        Tag::TrackTotal,
    ];

    /// Vorbis comment 字段名
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Title => "TITLE",
            Tag::Artist => "ARTIST",
            Tag::Album => "ALBUM",
            Tag::TrackNumber => "TRACKNUMBER",
            Tag::AlbumArtist => "ALBUMARTIST",
            Tag::Genre => "GENRE",
            Tag::Date => "DATE",
            Tag::DiscTotal => "DISCTOTAL",
            Tag::TrackTotal => "TRACKTOTAL",
        }
    }

    /// 按字段名查找（忽略大小写）
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|tag| tag.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 标签名 → 值 的有序映射
///
/// 构造后不可修改，只能整体替换。空值在构造时被丢弃。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    entries: BTreeMap<Tag, String>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: Tag) -> Option<&str> {
        self.entries.get(&tag).map(String::as_str)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按规范顺序迭代
    pub fn iter(&self) -> impl Iterator<Item = (Tag, &str)> {
        self.entries.iter().map(|(tag, value)| (*tag, value.as_str()))
    }

    /// 序列化为4空格缩进的JSON
    pub fn to_json_string(&self) -> ConvertResult<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buffer).map_err(|e| metadata_error("JSON编码 / JSON encoding", e))
    }
}

impl FromIterator<(Tag, String)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (Tag, String)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();
        Self { entries }
    }
}

impl Serialize for TagMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (tag, value) in &self.entries {
            map.serialize_entry(tag.name(), value)?;
        }
        map.end()
    }
}

// ==================== metaflac 输出解析 ====================

/// 解析 `metaflac --show-tag=NAME` 的输出
///
/// 输出为零到多行 `NAME=value`；只取第一个非空值，值中的 `=` 原样保留。
pub fn parse_show_tag_output(tag: Tag, stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let (name, value) = line.split_once('=')?;
        let value = value.trim_end_matches('\r');
        (name.trim().eq_ignore_ascii_case(tag.name()) && !value.trim().is_empty())
            .then(|| value.to_string())
    })
}

/// `metaflac --list --block-type=PICTURE` 中第一个PICTURE块的描述字段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PictureBlock {
    pub description: Option<String>,
}

impl PictureBlock {
    /// 导出封面使用的文件名：描述字段的最后一个路径分量
    ///
    /// 描述为空（或清理后为空）时不导出。
    pub fn cover_file_name(&self) -> Option<String> {
        self.description
            .as_deref()
            .and_then(|d| Path::new(d).file_name())
            .map(|name| utils::sanitize_file_name(&name.to_string_lossy()))
            .filter(|name| !name.is_empty())
    }
}

/// 解析PICTURE块列表；没有任何元数据块时返回None
pub fn parse_picture_listing(stdout: &str) -> Option<PictureBlock> {
    let mut lines = stdout.lines().map(str::trim);
    lines.find(|line| line.starts_with("METADATA block #"))?;

    let mut block = PictureBlock::default();
    for line in lines {
        if line.starts_with("METADATA block #") {
            break;
        }
        if let Some(rest) = line.strip_prefix("description:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                block.description = Some(rest.to_string());
            }
        }
    }
    Some(block)
}

// ==================== side-car 标签文件 ====================

/// side-car文件提供的标签来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSource {
    /// 同一组标签应用于所有输入文件
    Shared(TagMap),
    /// 按输入文件名（或文件stem）索引的标签
    PerFile(BTreeMap<String, TagMap>),
}

impl TagSource {
    /// 查找某个输入文件对应的标签
    pub fn tags_for(&self, input: &Path) -> Option<TagMap> {
        match self {
            TagSource::Shared(tags) => Some(tags.clone()),
            TagSource::PerFile(map) => {
                let name = utils::extract_filename_lossy(input);
                let stem = utils::extract_file_stem_string(input);
                map.get(&name).or_else(|| map.get(&stem)).cloned()
            }
        }
    }
}

/// 输出目录中与输入文件对应的side-car路径：`<dest>/<stem>.json`
pub fn sidecar_path(input: &Path, destination: &Path) -> PathBuf {
    utils::update_path(input, destination, naming::TAGS_EXTENSION)
}

/// 写出标签side-car文件
pub fn write_tag_file(path: &Path, tags: &TagMap) -> ConvertResult<()> {
    let mut json = tags.to_json_string()?;
    json.push('\n');
    std::fs::write(path, json)?;
    Ok(())
}

/// 读取标签side-car文件（自动识别JSON或行格式）
pub fn read_tag_file(path: &Path) -> ConvertResult<TagSource> {
    let content = std::fs::read_to_string(path)?;
    parse_tag_file(&content).map_err(|e| metadata_error(&path.display().to_string(), e))
}

/// 解析side-car文件内容
pub fn parse_tag_file(content: &str) -> ConvertResult<TagSource> {
    if content.trim_start().starts_with('{') {
        parse_json_tags(content)
    } else {
        parse_line_tags(content)
    }
}

fn parse_json_tags(content: &str) -> ConvertResult<TagSource> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let object = value
        .as_object()
        .ok_or_else(|| metadata_error("JSON", "顶层必须是对象 / top level must be an object"))?;

    let per_file = !object.is_empty() && object.values().all(serde_json::Value::is_object);
    if per_file {
        let files = object
            .iter()
            .filter_map(|(name, inner)| {
                inner
                    .as_object()
                    .map(|fields| (name.clone(), json_fields_to_tags(fields)))
            })
            .collect();
        Ok(TagSource::PerFile(files))
    } else {
        Ok(TagSource::Shared(json_fields_to_tags(object)))
    }
}

fn json_fields_to_tags(fields: &serde_json::Map<String, serde_json::Value>) -> TagMap {
    fields
        .iter()
        .filter_map(|(name, value)| {
            let Some(tag) = Tag::from_name(name) else {
                tracing::warn!("忽略未知标签 / ignoring unknown tag: {name}");
                return None;
            };
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Null => return None,
                other => {
                    tracing::warn!("忽略非标量标签值 / ignoring non-scalar value for {tag}: {other}");
                    return None;
                }
            };
            Some((tag, text))
        })
        .collect()
}

fn parse_line_tags(content: &str) -> ConvertResult<TagSource> {
    let mut files = BTreeMap::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('|');
        let name = fields.next().unwrap_or_default().trim();
        if name.is_empty() || name.contains('=') {
            return Err(metadata_error(
                &format!("第{}行 / line {}", index + 1, index + 1),
                "缺少文件名字段 / missing file name field",
            ));
        }

        let tags: TagMap = fields
            .filter_map(|field| {
                let (key, value) = field.split_once('=')?;
                match Tag::from_name(key) {
                    Some(tag) => Some((tag, value.to_string())),
                    None => {
                        tracing::warn!("忽略未知标签 / ignoring unknown tag: {}", key.trim());
                        None
                    }
                }
            })
            .collect();

        files.insert(name.to_string(), tags);
    }

    Ok(TagSource::PerFile(files))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(Tag, &str)]) -> TagMap {
        pairs.iter().map(|(t, v)| (*t, v.to_string())).collect()
    }

    #[test]
    fn test_tag_map_drops_empty_values_and_keeps_order() {
        let map = tags(&[
            (Tag::TrackTotal, "12"),
            (Tag::Title, "Song"),
            (Tag::Genre, "  "),
        ]);
        assert_eq!(map.len(), 2);
        let order: Vec<Tag> = map.iter().map(|(t, _)| t).collect();
        assert_eq!(order, vec![Tag::Title, Tag::TrackTotal]);
    }

    #[test]
    fn test_parse_show_tag_output() {
        assert_eq!(
            parse_show_tag_output(Tag::Title, "TITLE=a=b\n"),
            Some("a=b".to_string())
        );
        assert_eq!(
            parse_show_tag_output(Tag::Artist, "artist=X\nARTIST=Y\n"),
            Some("X".to_string())
        );
        assert_eq!(parse_show_tag_output(Tag::Album, ""), None);
        assert_eq!(parse_show_tag_output(Tag::Album, "ALBUM=\n"), None);
    }

    #[test]
    fn test_parse_picture_listing() {
        let listing = "METADATA block #2\n  type: 6 (PICTURE)\n  is last: false\n  length: 4242\n  type: 3 (Cover (front))\n  MIME type: image/png\n  description: Front.png\n  width: 500\n";
        let block = parse_picture_listing(listing).expect("block");
        assert_eq!(block.description.as_deref(), Some("Front.png"));
        assert_eq!(block.cover_file_name().as_deref(), Some("Front.png"));

        assert_eq!(parse_picture_listing(""), None);
    }

    #[test]
    fn test_cover_name_requires_description() {
        let listing = "METADATA block #2\n  type: 6 (PICTURE)\n  MIME type: image/png\n  description: \n";
        let block = parse_picture_listing(listing).expect("block");
        assert_eq!(block.cover_file_name(), None);
        assert_eq!(PictureBlock::default().cover_file_name(), None);

        let traversal = PictureBlock {
            description: Some("../../etc/passwd".to_string()),
        };
        assert_eq!(traversal.cover_file_name().as_deref(), Some("passwd"));
    }

    #[test]
    fn test_json_shared_and_per_file() {
        let shared = parse_tag_file(r#"{"TITLE": "A", "tracknumber": 3, "FOO": "x"}"#).unwrap();
        let TagSource::Shared(map) = shared else {
            panic!("应为共享标签 / expected shared tags");
        };
        assert_eq!(map.get(Tag::Title), Some("A"));
        assert_eq!(map.get(Tag::TrackNumber), Some("3"));
        assert_eq!(map.len(), 2);

        let per_file = parse_tag_file(r#"{"a.wav": {"TITLE": "A"}, "b": {"TITLE": "B"}}"#).unwrap();
        assert_eq!(
            per_file
                .tags_for(Path::new("/x/a.wav"))
                .and_then(|m| m.get(Tag::Title).map(str::to_string)),
            Some("A".to_string())
        );
        assert_eq!(
            per_file
                .tags_for(Path::new("/x/b.wav"))
                .and_then(|m| m.get(Tag::Title).map(str::to_string)),
            Some("B".to_string())
        );
        assert!(per_file.tags_for(Path::new("/x/c.wav")).is_none());
    }

    #[test]
    fn test_line_format() {
        let source =
            parse_tag_file("# comment\ntrack.wav|TITLE=Intro|TRACKNUMBER=1|TRACKTOTAL=9\n").unwrap();
        let map = source.tags_for(Path::new("track.wav")).unwrap();
        assert_eq!(map.get(Tag::Title), Some("Intro"));
        assert_eq!(map.get(Tag::TrackTotal), Some("9"));

        assert!(parse_tag_file("TITLE=x|ARTIST=y\n").is_err());
    }

    #[test]
    fn test_json_written_in_canonical_order() {
        let map = tags(&[(Tag::Date, "1999"), (Tag::Title, "T")]);
        let json = map.to_json_string().unwrap();
        let title = json.find("TITLE").unwrap();
        let date = json.find("DATE").unwrap();
        assert!(title < date);
        assert!(json.contains("    \"TITLE\": \"T\""));
    }
}
