//! # watch 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/watch.rs`

use clap::Args;

/// watch 子命令参数
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Job directories or glob patterns (default: current directory)
    pub dirs: Vec<String>,

    /// Seconds between two scans (overrides the rc file)
    #[arg(short, long)]
    pub interval: Option<f64>,

    /// Maximum number of jobs running at once, 0 = only monitor
    #[arg(short = 'j', long)]
    pub max_jobs: Option<usize>,

    /// Email address notified on every completed or failed job
    #[arg(long)]
    pub email: Option<String>,

    /// Which of the configured ONETEP executables to launch (1-based)
    #[arg(short = 'n', long, default_value_t = 1)]
    pub onetep_version: usize,

    /// Search job directories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Keep watching and pick up new directories instead of stopping when all jobs finished
    #[arg(short, long, default_value_t = false)]
    pub follow: bool,
}
