//! 文件扫描模块
//!
//! 把命令行给出的文件与目录解析为待转换的绝对路径列表。目录递归遍历，
//! 按文件名排序以保证顺序稳定。

use crate::audio::AudioFileKind;
use crate::error::{ConvertError, ConvertResult};
use crate::tools::utils;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 解析 `-f/--files` 的取值
///
/// - 已存在且扩展名匹配的文件直接收录，扩展名不符的跳过并警告；
/// - 目录递归收录所有扩展名匹配的文件；
/// - 既不是文件也不是目录的条目警告后跳过。
pub fn resolve_input_files<S: AsRef<Path>>(entries: &[S], kind: AudioFileKind) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in entries.iter().map(AsRef::as_ref) {
        if path.is_file() {
            if utils::has_extension(path, kind.extension()) {
                push_absolute(&mut files, path);
            } else {
                tracing::warn!(
                    "跳过非{kind}文件 / skipping '{}': not a .{} file",
                    path.display(),
                    kind.extension()
                );
            }
        } else if path.is_dir() {
            files.extend(walk_directory(path, kind));
        } else {
            tracing::warn!(
                "跳过不存在的路径 / skipping '{}': no such file or directory",
                path.display()
            );
        }
    }

    dedup_preserving_order(files)
}

/// 解析 `-d/--dir` 的取值：必须是已存在的目录
pub fn scan_directory(dir: &Path, kind: AudioFileKind) -> ConvertResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(ConvertError::InvalidInput(format!(
            "目录不存在 / no such directory: {}",
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(ConvertError::InvalidInput(format!(
            "路径不是目录 / not a directory: {}",
            dir.display()
        )));
    }

    Ok(dedup_preserving_order(walk_directory(dir, kind)))
}

/// 递归遍历目录，返回扩展名匹配的文件（遍历顺序）
fn walk_directory(dir: &Path, kind: AudioFileKind) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("目录遍历出错 / walk error under '{}': {e}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if utils::has_extension(entry.path(), kind.extension()) {
            push_absolute(&mut files, entry.path());
        } else {
            tracing::debug!(file = %entry.path().display(), "skipped (extension)");
        }
    }

    files
}

fn push_absolute(files: &mut Vec<PathBuf>, path: &Path) {
    match std::path::absolute(path) {
        Ok(abs) => files.push(abs),
        Err(e) => tracing::warn!("无法解析绝对路径 / cannot resolve '{}': {e}", path.display()),
    }
}

/// 去重，保留首次出现的位置
pub fn dedup_preserving_order(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// 显示文件扫描结果
pub fn show_scan_results(files: &[PathBuf], kind: AudioFileKind, verbose: bool) {
    println!("[INFO] 找到 {} 个{kind}文件 / found {} file(s)", files.len(), files.len());
    if verbose {
        for (i, file) in files.iter().enumerate() {
            println!("   {}. {}", i + 1, utils::extract_filename_lossy(file));
        }
    }
    println!();
}
