//! 批处理状态管理模块
//!
//! 单线程转换循环的成功/失败计数与错误分类统计。

use crate::error::{ConvertError, ErrorCategory};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 批处理统计快照
///
/// 包含处理成功/失败计数和错误分类统计
#[derive(Debug, Clone, Default)]
pub struct BatchStatsSnapshot {
    /// 成功处理的文件数
    pub processed: usize,
    /// 失败的文件数
    pub failed: usize,
    /// 因中断或提前停止而未处理的文件数
    pub skipped: usize,
    /// 错误分类统计（错误类型 -> 失败文件列表）
    pub error_stats: BTreeMap<ErrorCategory, Vec<String>>,
    /// 成功生成的输出文件（按处理顺序）
    pub outputs: Vec<PathBuf>,
}

impl BatchStatsSnapshot {
    pub fn total(&self) -> usize {
        self.processed + self.failed + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// 成功率（百分比）；没有文件时为0
    pub fn success_rate(&self) -> f64 {
        let attempted = self.processed + self.failed;
        if attempted == 0 {
            0.0
        } else {
            self.processed as f64 / attempted as f64 * 100.0
        }
    }
}

/// 串行批处理统计
#[derive(Debug, Default)]
pub struct SerialBatchStats {
    processed: usize,
    failed: usize,
    skipped: usize,
    error_stats: BTreeMap<ErrorCategory, Vec<String>>,
    outputs: Vec<PathBuf>,
}

impl SerialBatchStats {
    /// 创建新的串行统计实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个成功的输出文件
    #[inline]
    pub fn inc_processed(&mut self, output: PathBuf) -> usize {
        self.processed += 1;
        self.outputs.push(output);
        self.processed
    }

    /// 增加失败计数并记录错误分类
    #[inline]
    pub fn inc_failed(&mut self, category: ErrorCategory, filename: String) -> usize {
        self.failed += 1;
        self.error_stats.entry(category).or_default().push(filename);
        self.failed
    }

    /// 按错误记录失败
    pub fn record_error(&mut self, error: &ConvertError, filename: String) -> usize {
        self.inc_failed(ErrorCategory::from_error(error), filename)
    }

    /// 记录未处理的剩余文件
    pub fn add_skipped(&mut self, count: usize) {
        self.skipped += count;
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// 获取统计快照
    pub fn snapshot(&self) -> BatchStatsSnapshot {
        BatchStatsSnapshot {
            processed: self.processed,
            failed: self.failed,
            skipped: self.skipped,
            error_stats: self.error_stats.clone(),
            outputs: self.outputs.clone(),
        }
    }
}
