//! M3U播放列表
//!
//! 文件名约定：`00. {artist} - {album}.m3u`，每行一个输出文件名（与播放列表同目录）。

use super::metadata::{Tag, TagMap};
use crate::error::ConvertResult;
use crate::tools::constants::naming;
use crate::tools::utils;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// 从已收集的标签中选出艺术家和专辑名
///
/// 取第一个带有对应标签的文件；艺术家优先ALBUMARTIST，其次ARTIST。
pub fn playlist_identity<'a, I>(tag_maps: I) -> (String, String)
where
    I: IntoIterator<Item = &'a TagMap>,
{
    let mut artist = None;
    let mut album = None;
    for tags in tag_maps {
        if artist.is_none() {
            artist = tags
                .get(Tag::AlbumArtist)
                .or_else(|| tags.get(Tag::Artist))
                .map(str::to_string);
        }
        if album.is_none() {
            album = tags.get(Tag::Album).map(str::to_string);
        }
        if artist.is_some() && album.is_some() {
            break;
        }
    }
    (
        artist.unwrap_or_else(|| naming::UNKNOWN_ARTIST.to_string()),
        album.unwrap_or_else(|| naming::UNKNOWN_ALBUM.to_string()),
    )
}

/// 播放列表文件路径
pub fn playlist_path(destination: &Path, artist: &str, album: &str) -> PathBuf {
    let name = utils::sanitize_file_name(&format!("00. {artist} - {album}"));
    destination.join(format!("{name}.{}", naming::PLAYLIST_EXTENSION))
}

/// 渲染播放列表内容
pub fn render_playlist(outputs: &[PathBuf]) -> String {
    let mut content = String::new();
    for output in outputs {
        let _ = writeln!(content, "{}", utils::extract_filename_lossy(output));
    }
    content
}

/// 写出播放列表，返回其路径
pub fn write_playlist(
    destination: &Path,
    outputs: &[PathBuf],
    artist: &str,
    album: &str,
) -> ConvertResult<PathBuf> {
    let path = playlist_path(destination, artist, album);
    std::fs::write(&path, render_playlist(outputs))?;
    tracing::debug!(playlist = %path.display(), entries = outputs.len(), "playlist written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_prefers_album_artist() {
        let first: TagMap = [(Tag::Artist, "Singer".to_string())].into_iter().collect();
        let second: TagMap = [
            (Tag::AlbumArtist, "Band".to_string()),
            (Tag::Album, "Record".to_string()),
        ]
        .into_iter()
        .collect();
        let (artist, album) = playlist_identity([&first, &second]);
        assert_eq!(artist, "Singer");
        assert_eq!(album, "Record");
    }

    #[test]
    fn test_identity_defaults() {
        let (artist, album) = playlist_identity(std::iter::empty());
        assert_eq!(artist, "Unknown Artist");
        assert_eq!(album, "Unknown Album");
    }

    #[test]
    fn test_playlist_name_and_content() {
        let path = playlist_path(Path::new("/out"), "AC/DC", "Back in Black");
        assert_eq!(path, PathBuf::from("/out/00. AC_DC - Back in Black.m3u"));

        let content = render_playlist(&[
            PathBuf::from("/out/01 Hells Bells.mp3"),
            PathBuf::from("/out/02 Shoot to Thrill.mp3"),
        ]);
        assert_eq!(content, "01 Hells Bells.mp3\n02 Shoot to Thrill.mp3\n");
    }
}
