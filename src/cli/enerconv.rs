//! # enerconv 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/enerconv.rs`

use clap::Args;

/// enerconv 子命令参数
#[derive(Args, Debug)]
pub struct EnerconvArgs {
    /// Output files, directories or glob patterns (default: current directory)
    pub files: Vec<String>,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,
}
