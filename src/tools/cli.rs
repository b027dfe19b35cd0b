//! 命令行接口模块
//!
//! 负责每个转换程序的选项注册、参数校验、配置构建和程序信息展示。
//! 校验在调用任何外部程序之前完成，失败即终止整个运行。

use super::options::{self, OptionRegistry, OptionRole, OptionSpec, ParsedOptions, ValueArity, VERSION};
use super::scanner;
use crate::audio::metadata::{self, TagSource};
use crate::audio::{AudioFileKind, Codec, ToolPaths};
use crate::error::{ConvertError, ConvertResult, usage_error};
use crate::tools::constants::naming;
use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// 转换流程
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    FlacToWav,
    FlacToMp3,
    WavToFlac,
    WavToMp3,
}

/// 封面/标签选项的语义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataMode {
    /// 从源文件提取到输出目录（flac2wav）
    Extract,
    /// 从源文件带入输出文件（flac2mp3）
    Transfer,
    /// 由用户提供文件并写入输出（wav2flac, wav2mp3）
    Add,
}

impl Workflow {
    pub const ALL: [Workflow; 4] = [
        Workflow::FlacToWav,
        Workflow::FlacToMp3,
        Workflow::WavToFlac,
        Workflow::WavToMp3,
    ];

    pub fn program_name(&self) -> &'static str {
        match self {
            Workflow::FlacToWav => "flac2wav",
            Workflow::FlacToMp3 => "flac2mp3",
            Workflow::WavToFlac => "wav2flac",
            Workflow::WavToMp3 => "wav2mp3",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Workflow::FlacToWav => "Convert FLAC files to WAV / 将FLAC解码为WAV",
            Workflow::FlacToMp3 => "Convert FLAC files to MP3 / 将FLAC转换为MP3",
            Workflow::WavToFlac => "Convert WAV files to FLAC / 将WAV编码为FLAC",
            Workflow::WavToMp3 => "Convert WAV files to MP3 / 将WAV编码为MP3",
        }
    }

    pub fn input_kind(&self) -> AudioFileKind {
        match self {
            Workflow::FlacToWav | Workflow::FlacToMp3 => AudioFileKind::Flac,
            Workflow::WavToFlac | Workflow::WavToMp3 => AudioFileKind::Wav,
        }
    }

    /// 编码目标；flac2wav 只解码，没有编码目标
    pub fn target_codec(&self) -> Option<Codec> {
        match self {
            Workflow::FlacToWav => None,
            Workflow::FlacToMp3 | Workflow::WavToMp3 => Some(Codec::Mp3),
            Workflow::WavToFlac => Some(Codec::Flac),
        }
    }

    pub fn output_kind(&self) -> AudioFileKind {
        self.target_codec()
            .map(|c| c.output_kind())
            .unwrap_or(AudioFileKind::Wav)
    }

    pub fn metadata_mode(&self) -> MetadataMode {
        match self {
            Workflow::FlacToWav => MetadataMode::Extract,
            Workflow::FlacToMp3 => MetadataMode::Transfer,
            Workflow::WavToFlac | Workflow::WavToMp3 => MetadataMode::Add,
        }
    }

    /// 播放列表只对编码流程开放
    pub fn supports_playlist(&self) -> bool {
        self.target_codec().is_some()
    }

    /// 运行本流程需要的外部程序
    pub fn required_programs<'a>(&self, paths: &'a ToolPaths) -> Vec<&'a str> {
        match self {
            Workflow::FlacToWav => vec![paths.metaflac.as_str(), paths.flac.as_str()],
            Workflow::FlacToMp3 => vec![
                paths.metaflac.as_str(),
                paths.flac.as_str(),
                paths.lame.as_str(),
            ],
            Workflow::WavToFlac => vec![paths.flac.as_str()],
            Workflow::WavToMp3 => vec![paths.lame.as_str()],
        }
    }

    /// 本流程的选项注册表
    pub fn registry(&self) -> OptionRegistry {
        let mut specs = vec![
            OptionSpec::new(OptionRole::Files, Some('f'), "files")
                .takes(ValueArity::Many, "FILE|DIR")
                .help("Input files or directories / 输入文件或目录"),
            OptionSpec::new(OptionRole::Directory, Some('d'), "dir")
                .takes(ValueArity::One, "DIR")
                .help("Input directory, scanned recursively / 输入目录（递归扫描）"),
            OptionSpec::new(OptionRole::Destination, Some('o'), "output")
                .alias(Some('e'), "dest")
                .takes(ValueArity::One, "DEST")
                .help("Destination directory (required) / 输出目录（必填）"),
        ];

        let (cover, tags) = match self.metadata_mode() {
            MetadataMode::Extract => (
                OptionSpec::new(OptionRole::Cover, Some('c'), "cover")
                    .help("Extract the embedded cover art / 提取内嵌封面"),
                OptionSpec::new(OptionRole::Tags, Some('t'), "tags")
                    .help("Extract tags to <stem>.json / 提取标签到side-car文件"),
            ),
            MetadataMode::Transfer => (
                OptionSpec::new(OptionRole::Cover, Some('c'), "cover")
                    .help("Carry the cover art into the MP3 / 保留封面"),
                OptionSpec::new(OptionRole::Tags, Some('t'), "tags")
                    .help("Carry the tags into the MP3 / 保留标签"),
            ),
            MetadataMode::Add => (
                OptionSpec::new(OptionRole::Cover, Some('c'), "cover")
                    .takes(ValueArity::One, "IMG")
                    .help("Embed this image as cover art / 嵌入封面图片"),
                OptionSpec::new(OptionRole::Tags, Some('t'), "tags")
                    .takes(ValueArity::One, "FILE")
                    .help("Apply tags from a side-car file / 从side-car文件写入标签"),
            ),
        };
        specs.push(cover);
        specs.push(tags);

        if self.supports_playlist() {
            specs.push(
                OptionSpec::new(OptionRole::Playlist, Some('p'), "playlist")
                    .help("Write an .m3u playlist / 生成播放列表"),
            );
        }

        specs.extend([
            OptionSpec::new(OptionRole::StopOnError, None, "stop-on-error")
                .help("Stop at the first failed file / 遇到失败立即停止"),
            OptionSpec::new(OptionRole::Verbose, None, "verbose")
                .help("Show detailed progress / 显示详细信息"),
            OptionSpec::new(OptionRole::Help, Some('h'), "help").help("Print help / 显示帮助"),
            OptionSpec::new(OptionRole::Version, Some('v'), "version")
                .help("Print version / 显示版本"),
        ]);

        OptionRegistry::new(self.program_name(), self.description(), specs)
    }
}

/// 封面处理请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverRequest {
    None,
    /// 提取（flac2wav）或带入（flac2mp3）源文件的封面
    Extract,
    /// 嵌入用户提供的图片
    Embed(PathBuf),
}

/// 标签处理请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRequest {
    None,
    Extract,
    Apply(TagSource),
}

/// 单个文件失败后的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 记录失败并继续下一个文件
    #[default]
    Continue,
    /// 立即停止整个批次
    Abort,
}

/// 已校验的输入文件：存在的普通文件的绝对路径 + 推断出的类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub kind: AudioFileKind,
}

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub workflow: Workflow,

    /// 待转换文件（绝对路径，已去重）
    pub inputs: Vec<ResolvedInput>,

    /// 输出目录（已存在且可写）
    pub destination: PathBuf,

    pub cover: CoverRequest,
    pub tags: TagRequest,
    pub playlist: bool,
    pub policy: FailurePolicy,
    pub verbose: bool,

    /// 外部程序路径
    pub tools: ToolPaths,
}

/// 命令行解析结果
#[derive(Debug)]
pub enum CliAction {
    /// 打印文本后以成功状态退出（帮助、版本）
    Print(String),
    Run(Box<AppConfig>),
}

/// 解析命令行参数（不含程序名）
pub fn parse_args<S: AsRef<OsStr>>(workflow: Workflow, args: &[S]) -> ConvertResult<CliAction> {
    let registry = workflow.registry();

    if args.is_empty() {
        return Ok(CliAction::Print(format!(
            "{}\n{}",
            registry.render_version().trim_end(),
            registry.render_help()
        )));
    }

    match options::info_request(&registry, args) {
        Some(OptionRole::Help) => return Ok(CliAction::Print(registry.render_help())),
        Some(OptionRole::Version) => return Ok(CliAction::Print(registry.render_version())),
        _ => {}
    }

    let parsed = options::tokenize(&registry, args)?;

    let config = build_config(workflow, &registry, &parsed, ToolPaths::from_env())?;
    Ok(CliAction::Run(Box::new(config)))
}

/// 逐角色校验并构建配置
pub fn build_config(
    workflow: Workflow,
    registry: &OptionRegistry,
    parsed: &ParsedOptions,
    tools: ToolPaths,
) -> ConvertResult<AppConfig> {
    let flag_name = |role: OptionRole| {
        registry
            .spec(role)
            .map(OptionSpec::display_flag)
            .unwrap_or_default()
    };

    for role in [
        OptionRole::Playlist,
        OptionRole::Verbose,
        OptionRole::StopOnError,
    ] {
        expect_no_values(parsed, role, &flag_name(role))?;
    }

    let inputs = resolve_inputs(workflow, parsed, &flag_name)?;

    let destination = match single_value(parsed, OptionRole::Destination, &flag_name(OptionRole::Destination))? {
        Some(dest) => validate_destination(Path::new(dest))?,
        None => {
            return Err(usage_error(format!(
                "Missing required option {} / 缺少输出目录",
                flag_name(OptionRole::Destination)
            )));
        }
    };

    let (cover, tags) = match workflow.metadata_mode() {
        MetadataMode::Extract | MetadataMode::Transfer => {
            expect_no_values(parsed, OptionRole::Cover, &flag_name(OptionRole::Cover))?;
            expect_no_values(parsed, OptionRole::Tags, &flag_name(OptionRole::Tags))?;
            let cover = if parsed.contains(OptionRole::Cover) {
                CoverRequest::Extract
            } else {
                CoverRequest::None
            };
            let tags = if parsed.contains(OptionRole::Tags) {
                TagRequest::Extract
            } else {
                TagRequest::None
            };
            (cover, tags)
        }
        MetadataMode::Add => {
            let cover = match single_value(parsed, OptionRole::Cover, &flag_name(OptionRole::Cover))? {
                Some(image) => CoverRequest::Embed(validate_existing_file(Path::new(image), "cover")?),
                None => CoverRequest::None,
            };
            let tags = match single_value(parsed, OptionRole::Tags, &flag_name(OptionRole::Tags))? {
                Some(file) => {
                    let file = validate_existing_file(Path::new(file), "tags")?;
                    TagRequest::Apply(metadata::read_tag_file(&file)?)
                }
                None => TagRequest::None,
            };
            (cover, tags)
        }
    };

    Ok(AppConfig {
        workflow,
        inputs,
        destination,
        cover,
        tags,
        playlist: parsed.contains(OptionRole::Playlist),
        policy: if parsed.contains(OptionRole::StopOnError) {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        },
        verbose: parsed.contains(OptionRole::Verbose),
        tools,
    })
}

/// 合并 `-f` 与 `-d` 的结果；两者都没给出或结果为空都是致命错误
fn resolve_inputs(
    workflow: Workflow,
    parsed: &ParsedOptions,
    flag_name: &dyn Fn(OptionRole) -> String,
) -> ConvertResult<Vec<ResolvedInput>> {
    let kind = workflow.input_kind();
    let files_given = parsed.contains(OptionRole::Files);
    let dir_given = parsed.contains(OptionRole::Directory);

    if !files_given && !dir_given {
        return Err(usage_error(format!(
            "No input given, use {} or {} / 未指定输入",
            flag_name(OptionRole::Files),
            flag_name(OptionRole::Directory)
        )));
    }

    let mut paths = Vec::new();

    if let Some(entries) = parsed.values(OptionRole::Files) {
        if entries.is_empty() {
            return Err(usage_error(format!(
                "Option {} requires at least one value / 缺少参数值",
                flag_name(OptionRole::Files)
            )));
        }
        let files = scanner::resolve_input_files(entries, kind);
        if files.is_empty() {
            return Err(ConvertError::InvalidInput(format!(
                "No valid {kind} files were given! / 没有有效的{kind}文件"
            )));
        }
        paths.extend(files);
    }

    if let Some(dir) = single_value(parsed, OptionRole::Directory, &flag_name(OptionRole::Directory))? {
        let dir = Path::new(dir);
        let files = scanner::scan_directory(dir, kind)?;
        if files.is_empty() {
            return Err(ConvertError::InvalidInput(format!(
                "No {kind} files found in '{}' / 目录中没有{kind}文件",
                dir.display()
            )));
        }
        paths.extend(files);
    }

    Ok(scanner::dedup_preserving_order(paths)
        .into_iter()
        .map(|path| ResolvedInput { path, kind })
        .collect())
}

/// 布尔选项不接受值
fn expect_no_values(parsed: &ParsedOptions, role: OptionRole, flag: &str) -> ConvertResult<()> {
    match parsed.values(role) {
        Some(values) if !values.is_empty() => {
            let shown: Vec<_> = values.iter().map(|v| v.to_string_lossy()).collect();
            Err(usage_error(format!(
                "Option {flag} takes no value, got '{}' / 该选项不接受参数",
                shown.join(" ")
            )))
        }
        _ => Ok(()),
    }
}

/// 单值选项：取最后一次出现，且那一次恰好带一个值
fn single_value<'a>(parsed: &'a ParsedOptions, role: OptionRole, flag: &str) -> ConvertResult<Option<&'a OsStr>> {
    match parsed.last_occurrence(role) {
        None => Ok(None),
        Some([value]) => Ok(Some(value.as_os_str())),
        Some([]) => Err(usage_error(format!("Option {flag} requires a value / 缺少参数值"))),
        Some(values) => Err(usage_error(format!(
            "Option {flag} takes exactly one value, got {} / 只接受一个参数值",
            values.len()
        ))),
    }
}

fn validate_existing_file(path: &Path, what: &str) -> ConvertResult<PathBuf> {
    if !path.is_file() {
        return Err(ConvertError::InvalidInput(format!(
            "The {what} file '{}' does not exist! / 文件不存在",
            path.display()
        )));
    }
    Ok(std::path::absolute(path)?)
}

/// 输出目录必须存在且可写（创建再删除一个探测文件）
pub fn validate_destination(path: &Path) -> ConvertResult<PathBuf> {
    if !path.is_dir() {
        return Err(ConvertError::InvalidInput(format!(
            "The destination '{}' is not an existing directory! / 输出目录不存在",
            path.display()
        )));
    }

    let probe = path.join(format!("{}-{}", naming::WRITE_PROBE_PREFIX, std::process::id()));
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .map_err(|e| {
            ConvertError::InvalidInput(format!(
                "The destination '{}' is not writable! / 输出目录不可写: {e}",
                path.display()
            ))
        })?;
    std::fs::remove_file(&probe)?;

    Ok(std::path::absolute(path)?)
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig) {
    let workflow = config.workflow;
    println!("[INFO] {} v{VERSION}", workflow.program_name());
    println!("[INFO] {}", workflow.description());
    println!("[INFO] {} → {}", workflow.input_kind(), workflow.output_kind());
    if config.verbose {
        println!("[INFO] 输出目录 / destination: {}", config.destination.display());
        println!(
            "[INFO] 失败策略 / failure policy: {}",
            match config.policy {
                FailurePolicy::Continue => "continue",
                FailurePolicy::Abort => "stop on error",
            }
        );
    }
    println!();
}

/// 显示程序完成信息
pub fn show_completion_info(config: &AppConfig) {
    if config.verbose {
        println!("[INFO] 所有任务处理完成 / all done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("anarky_cli_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn s(p: &Path) -> String {
        p.to_string_lossy().into_owned()
    }

    #[test]
    fn test_empty_args_print_version_and_help() {
        let action = parse_args::<&str>(Workflow::FlacToMp3, &[]).unwrap();
        match action {
            CliAction::Print(text) => {
                assert!(text.starts_with("flac2mp3"));
                assert!(text.contains("--playlist"));
            }
            CliAction::Run(_) => panic!("expected help output"),
        }
    }

    #[test]
    fn test_help_wins_over_bad_values() {
        let action = parse_args(Workflow::WavToFlac, &["-f", "-h"]).unwrap();
        assert!(matches!(action, CliAction::Print(_)));
    }

    #[test]
    fn test_help_wins_over_unknown_option() {
        let action = parse_args(Workflow::FlacToMp3, &["-x", "-h"]).unwrap();
        assert!(matches!(action, CliAction::Print(text) if text.contains("--output")));
        let action = parse_args(Workflow::FlacToMp3, &["--bogus", "--version"]).unwrap();
        assert!(matches!(action, CliAction::Print(text) if text.starts_with("flac2mp3")));
        assert!(parse_args(Workflow::FlacToMp3, &["-x"]).is_err());
    }

    #[test]
    fn test_playlist_not_registered_for_flac2wav() {
        assert!(Workflow::FlacToWav.registry().spec(OptionRole::Playlist).is_none());
        let err = parse_args(Workflow::FlacToWav, &["-f", "a.flac", "-p"]).unwrap_err();
        assert!(matches!(err, ConvertError::Usage(_)));
    }

    #[test]
    fn test_build_config_extract_mode() {
        let dir = scratch_dir("extract");
        let out = dir.join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(dir.join("a.flac"), b"x").unwrap();

        let workflow = Workflow::FlacToWav;
        let registry = workflow.registry();
        let args = ["-d", &s(&dir), "-e", &s(&out), "-c", "-t", "--stop-on-error"];
        let parsed = options::tokenize(&registry, &args).unwrap();
        let config = build_config(workflow, &registry, &parsed, ToolPaths::default()).unwrap();

        assert_eq!(
            config.inputs,
            vec![ResolvedInput {
                path: dir.join("a.flac"),
                kind: AudioFileKind::Flac,
            }]
        );
        assert_eq!(config.cover, CoverRequest::Extract);
        assert_eq!(config.tags, TagRequest::Extract);
        assert_eq!(config.policy, FailurePolicy::Abort);
        assert!(!config.playlist);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_boolean_cover_rejects_value() {
        let dir = scratch_dir("boolcover");
        fs::write(dir.join("a.flac"), b"x").unwrap();
        let workflow = Workflow::FlacToMp3;
        let registry = workflow.registry();
        let args = ["-d", &s(&dir), "-o", &s(&dir), "-c", "front.jpg"];
        let parsed = options::tokenize(&registry, &args).unwrap();
        let err = build_config(workflow, &registry, &parsed, ToolPaths::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Usage(_)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_add_mode_requires_existing_cover() {
        let dir = scratch_dir("addcover");
        fs::write(dir.join("a.wav"), b"x").unwrap();
        let workflow = Workflow::WavToMp3;
        let registry = workflow.registry();
        let missing = dir.join("missing.jpg");
        let args = ["-f", &s(&dir.join("a.wav")), "-o", &s(&dir), "-c", &s(&missing)];
        let parsed = options::tokenize(&registry, &args).unwrap();
        let err = build_config(workflow, &registry, &parsed, ToolPaths::default()).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidInput(_)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_destination_and_inputs() {
        let dir = scratch_dir("missing");
        fs::write(dir.join("a.wav"), b"x").unwrap();
        let workflow = Workflow::WavToFlac;
        let registry = workflow.registry();

        let parsed = options::tokenize(&registry, &["-f", &s(&dir.join("a.wav"))]).unwrap();
        assert!(build_config(workflow, &registry, &parsed, ToolPaths::default()).is_err());

        let parsed = options::tokenize(&registry, &["-o", &s(&dir)]).unwrap();
        assert!(build_config(workflow, &registry, &parsed, ToolPaths::default()).is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_last_destination_wins() {
        let dir = scratch_dir("lastdest");
        let first = dir.join("first");
        let second = dir.join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(dir.join("a.wav"), b"x").unwrap();

        let workflow = Workflow::WavToFlac;
        let registry = workflow.registry();
        let args = ["-f", &s(&dir.join("a.wav")), "-o", &s(&first), "--dest", &s(&second)];
        let parsed = options::tokenize(&registry, &args).unwrap();
        let config = build_config(workflow, &registry, &parsed, ToolPaths::default()).unwrap();
        assert_eq!(config.destination, second);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_destination_must_be_directory() {
        let dir = scratch_dir("destfile");
        let file = dir.join("plain.txt");
        fs::write(&file, b"x").unwrap();
        assert!(validate_destination(&file).is_err());
        assert!(validate_destination(&dir).is_ok());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1, "探测文件应被删除");
        let _ = fs::remove_dir_all(&dir);
    }
}
