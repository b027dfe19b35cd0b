//! Ctrl-C 监听
//!
//! 在独立线程上运行单线程tokio运行时等待 `ctrl_c`，收到信号后只设置标志位。
//! 转换循环在每个文件之间检查标志位；正在运行的外部程序与本进程同属一个
//! 进程组，会一并收到SIGINT。

use crate::error::ConvertResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 可在线程间共享的中断标志
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// 安装Ctrl-C监听线程，返回共享标志
pub fn install_ctrl_c_watcher() -> ConvertResult<InterruptFlag> {
    let flag = InterruptFlag::new();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let watcher = flag.clone();
    std::thread::Builder::new()
        .name("ctrl-c-watcher".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::debug!("received Ctrl-C");
                        watcher.trigger();
                    }
                    Err(e) => tracing::warn!("无法监听Ctrl-C / cannot listen for Ctrl-C: {e}"),
                }
            });
        })?;

    Ok(flag)
}
