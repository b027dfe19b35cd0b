//! 工具模块集合
//!
//! 包含CLI、文件扫描、批处理、格式化等工具模块，四个可执行文件共用。

pub mod app;
pub mod batch_state;
pub mod cli;
pub mod constants;
pub mod formatter;
pub mod interrupt;
pub mod options;
pub mod processor;
pub mod scanner;
pub mod utils;

// 重新导出主要的公共接口
pub use app::{handle_error, main_for, run, run_batch};
pub use batch_state::{BatchStatsSnapshot, SerialBatchStats};
pub use cli::{
    AppConfig, CliAction, CoverRequest, FailurePolicy, MetadataMode, ResolvedInput, TagRequest,
    Workflow, parse_args,
};
pub use interrupt::InterruptFlag;
pub use options::{OptionRegistry, OptionRole, ParsedOptions, tokenize};
pub use processor::{BatchOutcome, convert_single_file, process_batch};
pub use scanner::{resolve_input_files, scan_directory};
pub use utils::path;
