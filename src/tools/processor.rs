//! 转换处理模块
//!
//! 串行处理已解析的输入文件：每个文件跑完整条外部程序链后才处理下一个。
//! 单个文件失败按 [`FailurePolicy`] 决定继续还是停止；中断只在文件之间生效。

use super::batch_state::{BatchStatsSnapshot, SerialBatchStats};
use super::cli::{AppConfig, CoverRequest, FailurePolicy, ResolvedInput, TagRequest, Workflow};
use super::constants::messages;
use super::formatter;
use super::interrupt::InterruptFlag;
use super::utils;
use crate::audio::metadata::{self, TagMap};
use crate::audio::{AudioFileKind, Codec, ConversionResult, Converter, ProcessRunner, playlist};
use crate::error::{ConvertError, ConvertResult};
use std::path::{Path, PathBuf};

/// 一次批处理的结果
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub snapshot: BatchStatsSnapshot,
    /// 生成的播放列表
    pub playlist: Option<PathBuf>,
    /// 因Ctrl-C提前结束
    pub interrupted: bool,
    /// 因 `--stop-on-error` 提前结束
    pub aborted: bool,
}

/// 处理单个输入文件
///
/// 按 流程 × 输入类型 分派；类型与流程不符的输入直接拒绝，不调用任何外部程序。
pub fn convert_single_file<R: ProcessRunner>(
    config: &AppConfig,
    converter: &Converter<R>,
    input: &ResolvedInput,
) -> ConvertResult<ConversionResult> {
    let path = input.path.as_path();
    let dest = config.destination.as_path();
    let want_cover = config.cover == CoverRequest::Extract;
    let want_tags = config.tags == TagRequest::Extract;

    match (config.workflow, input.kind) {
        (Workflow::FlacToWav, AudioFileKind::Flac) => {
            let result = converter.flac_to_wav(path, dest, want_cover, want_tags)?;
            if let Some(tags) = &result.tags {
                save_tag_sidecar(config, path, tags)?;
            }
            Ok(result)
        }
        (Workflow::FlacToMp3, AudioFileKind::Flac) => {
            converter.flac_to_mp3(path, dest, want_cover, want_tags)
        }
        (Workflow::WavToFlac, AudioFileKind::Wav) => add_mode_encode(config, converter, path, Codec::Flac),
        (Workflow::WavToMp3, AudioFileKind::Wav) => add_mode_encode(config, converter, path, Codec::Mp3),
        (workflow, kind) => Err(ConvertError::InvalidInput(format!(
            "{} 不接受{kind}输入 / {} does not accept {kind} input: {}",
            workflow.program_name(),
            workflow.program_name(),
            path.display()
        ))),
    }
}

/// flac2wav：标签写到 `<dest>/<stem>.json`
fn save_tag_sidecar(config: &AppConfig, input: &Path, tags: &TagMap) -> ConvertResult<()> {
    if tags.is_empty() {
        tracing::warn!("{} 没有可提取的标签 / has no tags", input.display());
    }
    let sidecar = metadata::sidecar_path(input, &config.destination);
    metadata::write_tag_file(&sidecar, tags)?;
    if config.verbose {
        println!("   tags  -> {}", sidecar.display());
    }
    Ok(())
}

/// wav2flac / wav2mp3：封面和标签来自用户提供的文件
fn add_mode_encode<R: ProcessRunner>(
    config: &AppConfig,
    converter: &Converter<R>,
    input: &Path,
    codec: Codec,
) -> ConvertResult<ConversionResult> {
    let tags = match &config.tags {
        TagRequest::Apply(source) => {
            let tags = source.tags_for(input);
            if tags.is_none() {
                tracing::warn!(
                    "{} ({})",
                    messages::WARNING_NO_TAGS,
                    utils::extract_filename_lossy(input)
                );
            }
            tags
        }
        TagRequest::None | TagRequest::Extract => None,
    };
    let cover = match &config.cover {
        CoverRequest::Embed(image) => Some(image.as_path()),
        CoverRequest::None | CoverRequest::Extract => None,
    };

    converter.wav_to_codec(codec, input, &config.destination, tags, cover)
}

/// 批量处理全部输入文件
pub fn process_batch<R: ProcessRunner>(
    config: &AppConfig,
    converter: &Converter<R>,
    interrupt: &InterruptFlag,
) -> ConvertResult<BatchOutcome> {
    let total = config.inputs.len();
    let mut stats = SerialBatchStats::new();
    let mut collected_tags: Vec<TagMap> = Vec::new();
    let mut outcome = BatchOutcome::default();

    for (index, input) in config.inputs.iter().enumerate() {
        if interrupt.is_set() {
            stats.add_skipped(total - index);
            outcome.interrupted = true;
            break;
        }

        println!("{}", formatter::format_progress(index + 1, total, &input.path));
        let name = utils::extract_filename_lossy(&input.path);

        match convert_single_file(config, converter, input) {
            Ok(result) => {
                println!("   -> {}", result.output.display());
                if config.verbose
                    && let Some(cover) = &result.cover
                {
                    println!("   cover -> {}", cover.display());
                }
                if let Some(tags) = result.tags {
                    collected_tags.push(tags);
                }
                stats.inc_processed(result.output);
            }
            Err(_) if interrupt.is_set() => {
                // 外部程序与本进程一起收到了SIGINT
                stats.add_skipped(total - index);
                outcome.interrupted = true;
                break;
            }
            Err(e) => {
                eprintln!("[ERROR] {name}: {e}");
                tracing::debug!(file = %input.path.display(), error = ?e, "conversion failed");
                stats.record_error(&e, name);

                if config.policy == FailurePolicy::Abort {
                    stats.add_skipped(total - index - 1);
                    outcome.aborted = true;
                    break;
                }
            }
        }
    }

    if config.playlist && !stats.outputs().is_empty() && !outcome.interrupted {
        let (artist, album) = playlist::playlist_identity(&collected_tags);
        let path = playlist::write_playlist(&config.destination, stats.outputs(), &artist, &album)?;
        println!("[INFO] 播放列表 / playlist: {}", path.display());
        outcome.playlist = Some(path);
    }

    outcome.snapshot = stats.snapshot();
    Ok(outcome)
}

/// 打印汇总报告并给出本次批处理的结论
pub fn finish_batch(config: &AppConfig, outcome: &BatchOutcome) -> ConvertResult<()> {
    println!();
    print!(
        "{}",
        formatter::format_batch_summary(config.workflow, &config.destination, &outcome.snapshot)
    );

    if outcome.interrupted {
        return Err(ConvertError::Interrupted);
    }
    if outcome.aborted {
        println!("[INFO] 已在第一个失败处停止 / stopped at the first failure (--stop-on-error)");
    }
    Ok(())
}
