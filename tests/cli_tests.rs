//! 命令行层集成测试
//!
//! 选项分词、文件解析与启动前校验。这里的失败都发生在调用任何外部程序之前。

use anarky::AudioFileKind;
use anarky::error::ConvertError;
use anarky::tools::constants::exit_codes;
use anarky::tools::{self, CliAction, OptionRole, Workflow};
use std::fs;
use std::path::{Path, PathBuf};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("anarky_cli_it_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn arg(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

// ============================================================================
// 文件解析
// ============================================================================

/// N个匹配文件 + M个不匹配文件 → 恰好N个路径，按遍历顺序
#[test]
fn test_resolver_returns_only_matching_files() {
    let dir = scratch_dir("resolver");
    fs::create_dir_all(dir.join("cd1")).unwrap();
    fs::create_dir_all(dir.join("cd2")).unwrap();
    let matching = ["cd1/01.wav", "cd1/02.WAV", "cd2/01.wav"];
    let other = ["cd1/cover.jpg", "cd2/01.flac", "notes.txt", "cd2/wav"];
    for name in matching.iter().chain(other.iter()) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    let files = tools::scan_directory(&dir, AudioFileKind::Wav).unwrap();
    assert_eq!(files.len(), matching.len());
    let expected: Vec<PathBuf> = matching.iter().map(|n| dir.join(n)).collect();
    assert_eq!(files, expected);

    // -f 同时给出目录和其中的文件时去重
    let entries = vec![arg(&dir.join("cd1/01.wav")), arg(&dir)];
    let files = tools::resolve_input_files(&entries, AudioFileKind::Wav);
    assert_eq!(files.len(), matching.len());
    assert_eq!(files[0], dir.join("cd1/01.wav"));

    let _ = fs::remove_dir_all(&dir);
}

// ============================================================================
// 启动前校验
// ============================================================================

/// 空目录、无有效文件时在调用外部程序之前退出
#[test]
fn test_empty_inputs_exit_before_any_tool() {
    let dir = scratch_dir("empty");
    let input = dir.join("input");
    let out = dir.join("out");
    fs::create_dir_all(&input).unwrap();
    fs::create_dir_all(&out).unwrap();
    fs::write(input.join("readme.txt"), b"x").unwrap();

    let empty_dir = vec!["-d".to_string(), arg(&input), "-o".to_string(), arg(&out)];
    assert!(matches!(
        tools::parse_args(Workflow::FlacToMp3, &empty_dir),
        Err(ConvertError::InvalidInput(_))
    ));
    assert_eq!(tools::run(Workflow::FlacToMp3, &empty_dir), exit_codes::USAGE_ERROR);

    let no_valid_files = vec![
        "-f".to_string(),
        arg(&input.join("readme.txt")),
        "-o".to_string(),
        arg(&out),
    ];
    assert_eq!(tools::run(Workflow::WavToMp3, &no_valid_files), exit_codes::USAGE_ERROR);

    let empty_files = vec!["-f".to_string(), "-o".to_string(), arg(&out)];
    assert_eq!(tools::run(Workflow::WavToFlac, &empty_files), exit_codes::USAGE_ERROR);

    assert_eq!(fs::read_dir(&out).unwrap().count(), 0, "不应产生任何输出");
    let _ = fs::remove_dir_all(&dir);
}

/// side-car 标签文件损坏属于元数据错误
#[test]
fn test_bad_tags_file_is_metadata_error() {
    let dir = scratch_dir("badtags");
    fs::write(dir.join("a.wav"), b"x").unwrap();
    fs::write(dir.join("tags.json"), b"{ not json").unwrap();

    let args = vec![
        "-f".to_string(),
        arg(&dir.join("a.wav")),
        "-o".to_string(),
        arg(&dir),
        "-t".to_string(),
        arg(&dir.join("tags.json")),
    ];
    assert!(matches!(
        tools::parse_args(Workflow::WavToMp3, &args),
        Err(ConvertError::Metadata(_))
    ));
    assert_eq!(tools::run(Workflow::WavToMp3, &args), exit_codes::METADATA_ERROR);

    let _ = fs::remove_dir_all(&dir);
}

// ============================================================================
// 分词
// ============================================================================

/// 未知选项中止，重复选项与别名合并
#[test]
fn test_tokenizer_rules_for_every_workflow() {
    for workflow in Workflow::ALL {
        let registry = workflow.registry();

        assert!(tools::tokenize(&registry, &["-f", "a", "--nope"]).is_err());

        let parsed = tools::tokenize(&registry, &["-f", "a", "-o", "x", "-f", "b", "-e", "y"]).unwrap();
        assert_eq!(parsed.values(OptionRole::Files).unwrap(), &["a", "b"]);
        assert_eq!(parsed.values(OptionRole::Destination).unwrap(), &["x", "y"]);

        assert_eq!(
            registry.spec(OptionRole::Playlist).is_some(),
            workflow != Workflow::FlacToWav
        );
    }
}

/// 帮助与版本不需要任何输入
#[test]
fn test_help_and_version() {
    for workflow in Workflow::ALL {
        match tools::parse_args(workflow, &["-v"]).unwrap() {
            CliAction::Print(text) => assert!(text.starts_with(workflow.program_name())),
            CliAction::Run(_) => panic!("-v 应只打印版本"),
        }
        match tools::parse_args(workflow, &["--version", "--help"]).unwrap() {
            CliAction::Print(text) => assert!(text.contains("--output")),
            CliAction::Run(_) => panic!("--help 应只打印帮助"),
        }
    }
}
