//! # install 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/install.rs`

use clap::Args;

/// install 子命令参数
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Install prefix, teptools is installed to $PREFIX/.teptools
    #[arg(long, default_value = "~")]
    pub prefix: String,

    /// Install without confirmation
    #[arg(short, long, default_value_t = false)]
    pub yes: bool,
}
