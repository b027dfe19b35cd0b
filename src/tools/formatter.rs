//! 输出格式化模块
//!
//! 批处理结束后的汇总报告：时间戳头部、计数表格与按错误类别分组的失败文件。

use super::batch_state::BatchStatsSnapshot;
use super::cli::Workflow;
use super::options::VERSION;
use super::utils;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use std::fmt::Write as _;
use std::path::Path;

/// 报告头部
pub fn create_report_header(workflow: Workflow, destination: &Path) -> String {
    let mut output = String::new();
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let _ = writeln!(output, "{} v{VERSION} / Conversion Report / 转换报告", workflow.program_name());
    let _ = writeln!(output, "log date: {now}");
    let _ = writeln!(output, "destination / 输出目录: {}", destination.display());
    output
}

/// 计数表格
pub fn create_summary_table(snapshot: &BatchStatsSnapshot) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Item / 项目", "Count / 数量"]);

    let rows = [
        ("Converted / 成功", snapshot.processed.to_string()),
        ("Failed / 失败", snapshot.failed.to_string()),
        ("Not processed / 未处理", snapshot.skipped.to_string()),
        ("Total / 总计", snapshot.total().to_string()),
        ("Success rate / 成功率", format!("{:.1}%", snapshot.success_rate())),
    ];
    for (name, value) in rows {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// 失败文件表格；没有失败时返回None
pub fn create_failure_table(snapshot: &BatchStatsSnapshot) -> Option<Table> {
    if snapshot.error_stats.is_empty() {
        return None;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Category / 类别", "Files / 文件"]);
    for (category, files) in &snapshot.error_stats {
        table.add_row(vec![Cell::new(category.display_name()), Cell::new(files.join("\n"))]);
    }
    Some(table)
}

/// 完整的批处理汇总文本
pub fn format_batch_summary(workflow: Workflow, destination: &Path, snapshot: &BatchStatsSnapshot) -> String {
    let mut output = create_report_header(workflow, destination);
    let _ = writeln!(output, "{}", create_summary_table(snapshot));
    if let Some(failures) = create_failure_table(snapshot) {
        let _ = writeln!(output, "{failures}");
    }
    output
}

/// 单个文件的进度行：`[n/N] name`
pub fn format_progress(index: usize, total: usize, input: &Path) -> String {
    format!("[{index}/{total}] {}", utils::extract_filename_lossy(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use std::path::PathBuf;

    #[test]
    fn test_summary_lists_counts_and_failures() {
        let mut snapshot = BatchStatsSnapshot {
            processed: 3,
            failed: 1,
            ..Default::default()
        };
        snapshot
            .error_stats
            .insert(ErrorCategory::Tool, vec!["broken.flac".to_string()]);

        let text = format_batch_summary(Workflow::FlacToMp3, Path::new("/out"), &snapshot);
        assert!(text.starts_with("flac2mp3 v"));
        assert!(text.contains("log date: "));
        assert!(text.contains("75.0%"));
        assert!(text.contains("broken.flac"));
    }

    #[test]
    fn test_no_failure_table_when_clean() {
        let snapshot = BatchStatsSnapshot {
            processed: 1,
            outputs: vec![PathBuf::from("/out/a.flac")],
            ..Default::default()
        };
        assert!(create_failure_table(&snapshot).is_none());
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(
            format_progress(2, 5, Path::new("/music/02 Song.flac")),
            "[2/5] 02 Song.flac"
        );
    }
}
