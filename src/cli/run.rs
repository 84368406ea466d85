//! # run 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/run.rs`

use clap::Args;
use std::path::PathBuf;

/// run 子命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    /// ONETEP input file (default: first input file in the current directory)
    pub input: Option<PathBuf>,

    /// Which of the configured ONETEP executables to use (1-based)
    #[arg(short = 'n', long, default_value_t = 1)]
    pub onetep_version: usize,

    /// Write stdout and stderr to <input>.<outfile_ext> instead of the terminal
    #[arg(long, default_value_t = false)]
    pub output: bool,
}
