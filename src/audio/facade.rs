//! 转换门面
//!
//! 对外暴露解码、编码、封面提取、标签提取四个操作，每个操作都是一到多次
//! 同步的外部程序调用。任何一步失败只影响当前文件，由调用方决定是否继续。

use super::codec::{self, Codec};
use super::external::{ProcessRunner, ToolCommand, ToolPaths};
use super::format::AudioFileKind;
use super::metadata::{self, Tag, TagMap};
use crate::error::{ConvertError, ConvertResult};
use crate::tools::utils;
use std::path::{Path, PathBuf};

/// 单个文件的转换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// 输出音频文件
    pub output: PathBuf,
    /// 提取出的封面文件
    pub cover: Option<PathBuf>,
    /// 提取出的标签
    pub tags: Option<TagMap>,
}

/// 外部程序门面
pub struct Converter<R: ProcessRunner> {
    runner: R,
    paths: ToolPaths,
}

impl<R: ProcessRunner> Converter<R> {
    pub fn new(runner: R, paths: ToolPaths) -> Self {
        Self { runner, paths }
    }

    // ==================== 输入探测 ====================

    /// FLAC有效性探测：`metaflac --show-md5sum` 成功且输出为十六进制串
    pub fn is_flac_file(&self, input: &Path) -> ConvertResult<bool> {
        let cmd = ToolCommand::new(&self.paths.metaflac)
            .arg("--show-md5sum")
            .path_arg(input);
        let output = self.runner.run(&cmd)?;
        if !output.success() {
            return Ok(false);
        }
        let digest = output.stdout.trim();
        Ok(!digest.is_empty() && digest.chars().all(|c| c.is_ascii_hexdigit()))
    }

    /// WAV有效性探测：进程内读取RIFF/WAVE头
    pub fn is_wav_file(&self, input: &Path) -> bool {
        match hound::WavReader::open(input) {
            Ok(reader) => {
                let spec = reader.spec();
                tracing::debug!(
                    file = %input.display(),
                    channels = spec.channels,
                    sample_rate = spec.sample_rate,
                    bits = spec.bits_per_sample,
                    "WAV header ok"
                );
                true
            }
            Err(e) => {
                tracing::debug!(file = %input.display(), "WAV probe failed: {e}");
                false
            }
        }
    }

    fn invalid_input(input: &Path, kind: AudioFileKind) -> ConvertError {
        ConvertError::InvalidInput(format!(
            "The file '{}' is not a valid {kind} file! / 不是有效的{kind}文件",
            input.display()
        ))
    }

    // ==================== 解码 / 编码 ====================

    /// FLAC → WAV，输出 `<dest>/<stem>.wav`
    ///
    /// 探测失败时不调用解码器。
    pub fn decode_to_intermediate(&self, input: &Path, destination: &Path) -> ConvertResult<PathBuf> {
        if !self.is_flac_file(input)? {
            return Err(Self::invalid_input(input, AudioFileKind::Flac));
        }

        let output = utils::update_path(input, destination, AudioFileKind::Wav.extension());
        let cmd = codec::decode_command(&self.paths, input, &output);
        self.runner.run_checked(&cmd)?;

        tracing::debug!(output = %output.display(), "decoded");
        Ok(output)
    }

    /// WAV → FLAC/MP3，输出 `<dest>/<stem>.<ext>`
    pub fn encode_intermediate_to_codec(
        &self,
        codec: Codec,
        input: &Path,
        destination: &Path,
        tags: Option<&TagMap>,
        cover: Option<&Path>,
    ) -> ConvertResult<PathBuf> {
        if !self.is_wav_file(input) {
            return Err(Self::invalid_input(input, AudioFileKind::Wav));
        }

        let output = utils::update_path(input, destination, codec.output_kind().extension());
        if output == input {
            return Err(ConvertError::InvalidInput(format!(
                "输出会覆盖输入 / output would overwrite input: {}",
                input.display()
            )));
        }

        let tags = tags.filter(|t| !t.is_empty());
        let cmd = codec::encode_command(codec, &self.paths, input, &output, tags, cover);
        self.runner.run_checked(&cmd)?;

        tracing::debug!(output = %output.display(), "encoded");
        Ok(output)
    }

    // ==================== 元数据 ====================

    /// 提取内嵌封面到目标目录
    ///
    /// 没有PICTURE块，或块的描述字段为空时返回None，不导出任何文件。
    pub fn extract_cover_art(&self, input: &Path, destination: &Path) -> ConvertResult<Option<PathBuf>> {
        let list = ToolCommand::new(&self.paths.metaflac)
            .args(["--list", "--block-type=PICTURE"])
            .path_arg(input);
        let output = self.runner.run_checked(&list)?;

        let Some(block) = metadata::parse_picture_listing(&output.stdout) else {
            tracing::debug!(file = %input.display(), "no PICTURE block");
            return Ok(None);
        };
        let Some(name) = block.cover_file_name() else {
            tracing::debug!(file = %input.display(), "PICTURE block without description");
            return Ok(None);
        };

        let cover = destination.join(name);
        let export = ToolCommand::new(&self.paths.metaflac)
            .prefixed_path_arg("--export-picture-to=", &cover)
            .path_arg(input);
        self.runner.run_checked(&export)?;

        Ok(Some(cover))
    }

    /// 提取规范标签；源文件中缺失或为空的标签直接省略
    pub fn extract_tags(&self, input: &Path) -> ConvertResult<TagMap> {
        let mut pairs = Vec::new();
        for tag in Tag::ALL {
            let cmd = ToolCommand::new(&self.paths.metaflac)
                .arg(format!("--show-tag={}", tag.name()))
                .path_arg(input);
            let output = self.runner.run_checked(&cmd)?;
            if let Some(value) = metadata::parse_show_tag_output(tag, &output.stdout) {
                pairs.push((tag, value));
            }
        }
        Ok(pairs.into_iter().collect())
    }

    // ==================== 组合流程 ====================

    /// 按需提取源文件的封面与标签
    fn extract_source_metadata(
        &self,
        input: &Path,
        destination: &Path,
        cover: bool,
        tags: bool,
    ) -> ConvertResult<(Option<PathBuf>, Option<TagMap>)> {
        let cover = if cover {
            self.extract_cover_art(input, destination)?
        } else {
            None
        };
        let tags = if tags { Some(self.extract_tags(input)?) } else { None };
        Ok((cover, tags))
    }

    /// FLAC → WAV，可选同时提取封面与标签
    pub fn flac_to_wav(
        &self,
        input: &Path,
        destination: &Path,
        extract_cover: bool,
        extract_tags: bool,
    ) -> ConvertResult<ConversionResult> {
        let output = self.decode_to_intermediate(input, destination)?;
        let (cover, tags) = self.extract_source_metadata(input, destination, extract_cover, extract_tags)?;
        Ok(ConversionResult { output, cover, tags })
    }

    /// FLAC → WAV → MP3，可选把源文件的封面与标签带入MP3
    ///
    /// 解码成功后，无论提取或编码是否失败，中间WAV都会被删除。
    pub fn flac_to_mp3(
        &self,
        input: &Path,
        destination: &Path,
        transfer_cover: bool,
        transfer_tags: bool,
    ) -> ConvertResult<ConversionResult> {
        let intermediate = self.decode_to_intermediate(input, destination)?;

        let result = self
            .extract_source_metadata(input, destination, transfer_cover, transfer_tags)
            .and_then(|(cover, tags)| {
                let output = self.encode_intermediate_to_codec(
                    Codec::Mp3,
                    &intermediate,
                    destination,
                    tags.as_ref(),
                    cover.as_deref(),
                )?;
                Ok(ConversionResult { output, cover, tags })
            });

        if let Err(e) = std::fs::remove_file(&intermediate) {
            tracing::warn!(
                "无法删除中间文件 / could not remove intermediate {}: {e}",
                intermediate.display()
            );
        }

        result
    }

    /// WAV → FLAC/MP3，使用外部提供的封面与标签
    pub fn wav_to_codec(
        &self,
        codec: Codec,
        input: &Path,
        destination: &Path,
        tags: Option<TagMap>,
        cover: Option<&Path>,
    ) -> ConvertResult<ConversionResult> {
        let output = self.encode_intermediate_to_codec(codec, input, destination, tags.as_ref(), cover)?;
        Ok(ConversionResult {
            output,
            cover: cover.map(Path::to_path_buf),
            tags,
        })
    }
}
