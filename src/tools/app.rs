//! 程序入口流程
//!
//! 四个可执行文件共用同一套流程：解析参数、初始化日志、检查外部程序、
//! 安装中断监听、逐个转换、打印汇总，最后把结果映射为退出码。

use super::cli::{self, AppConfig, CliAction, Workflow};
use super::constants::{exit_codes, messages};
use super::interrupt::{self, InterruptFlag};
use super::processor::{self, BatchOutcome};
use super::scanner;
use crate::audio::external;
use crate::audio::{Converter, ProcessRunner, SystemRunner};
use crate::error::{ConvertError, ConvertResult, ErrorCategory};
use std::ffi::{OsStr, OsString};
use tracing_subscriber::EnvFilter;

/// 初始化tracing日志（输出到stderr，`RUST_LOG` 优先）
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    // 测试中可能重复初始化
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 获取错误建议文本
fn get_error_suggestion(error: &ConvertError, workflow: Workflow) -> String {
    match ErrorCategory::from_error(error) {
        ErrorCategory::Usage | ErrorCategory::Input => format!(
            "使用 {} --help 查看完整用法 / Try '{} --help' for more information",
            workflow.program_name(),
            workflow.program_name()
        ),
        ErrorCategory::Tool => {
            "确认 flac / metaflac / lame 已安装并在PATH中 / Make sure flac, metaflac and lame are installed"
                .to_string()
        }
        ErrorCategory::Metadata => {
            "检查标签文件的格式 / Check the format of the tags file".to_string()
        }
        ErrorCategory::Io => {
            "检查文件路径与权限 / Check file paths and permissions".to_string()
        }
        ErrorCategory::Other => String::new(),
    }
}

/// 错误 → 退出码，并打印诊断
pub fn handle_error(error: &ConvertError, workflow: Workflow) -> i32 {
    if matches!(error, ConvertError::Interrupted) {
        eprintln!("{}", messages::ERROR_INTERRUPTED);
        return exit_codes::INTERRUPTED;
    }

    eprintln!("[ERROR] {error}");
    let suggestion = get_error_suggestion(error, workflow);
    if !suggestion.is_empty() {
        eprintln!("[INFO] 建议 / Suggestion: {suggestion}");
    }

    match ErrorCategory::from_error(error) {
        ErrorCategory::Usage | ErrorCategory::Input => exit_codes::USAGE_ERROR,
        ErrorCategory::Tool => exit_codes::TOOL_ERROR,
        ErrorCategory::Metadata => exit_codes::METADATA_ERROR,
        ErrorCategory::Io | ErrorCategory::Other => exit_codes::GENERAL_ERROR,
    }
}

/// 用给定的执行器跑完整个批次（不含外部程序检查与中断监听的安装）
pub fn run_batch<R: ProcessRunner>(
    config: &AppConfig,
    runner: R,
    interrupt: &InterruptFlag,
) -> ConvertResult<BatchOutcome> {
    cli::show_startup_info(config);
    let inputs: Vec<_> = config.inputs.iter().map(|i| i.path.clone()).collect();
    scanner::show_scan_results(&inputs, config.workflow.input_kind(), config.verbose);

    let converter = Converter::new(runner, config.tools.clone());
    let outcome = processor::process_batch(config, &converter, interrupt)?;
    processor::finish_batch(config, &outcome)?;
    cli::show_completion_info(config);
    Ok(outcome)
}

/// 批处理结果 → 退出码
pub fn outcome_exit_code(outcome: &BatchOutcome) -> i32 {
    if outcome.snapshot.has_failures() {
        exit_codes::GENERAL_ERROR
    } else {
        exit_codes::SUCCESS
    }
}

fn execute<S: AsRef<OsStr>>(workflow: Workflow, args: &[S]) -> ConvertResult<i32> {
    init_logging(args.iter().any(|a| a.as_ref() == "--verbose"));

    let config = match cli::parse_args(workflow, args)? {
        CliAction::Print(text) => {
            print!("{text}");
            return Ok(exit_codes::SUCCESS);
        }
        CliAction::Run(config) => config,
    };

    external::ensure_programs_available(workflow.required_programs(&config.tools))?;
    let interrupt = interrupt::install_ctrl_c_watcher()?;

    let outcome = run_batch(&config, SystemRunner, &interrupt)?;
    Ok(outcome_exit_code(&outcome))
}

/// 运行某个转换流程，返回进程退出码
pub fn run<S: AsRef<OsStr>>(workflow: Workflow, args: &[S]) -> i32 {
    match execute(workflow, args) {
        Ok(code) => code,
        Err(e) => handle_error(&e, workflow),
    }
}

/// 可执行文件入口
///
/// 参数按 `OsString` 读取，非UTF-8文件名不会导致panic。
pub fn main_for(workflow: Workflow) -> ! {
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    std::process::exit(run(workflow, &args))
}
