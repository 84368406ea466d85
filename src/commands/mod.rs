//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `config.rs`, `parsers/`, `models/`, `utils/`
//! - 子模块: create, check, enerconv, geomconv, run, watch, install

pub mod check;
pub mod create;
pub mod enerconv;
pub mod geomconv;
pub mod install;
pub mod run;
pub mod watch;

use crate::cli::Commands;
use crate::error::Result;
use std::path::Path;

/// 执行命令
pub fn run(cmd: Commands, rcfile: &Path) -> Result<()> {
    match cmd {
        Commands::Create(args) => create::execute(args, rcfile),
        Commands::Check(args) => check::execute(args, rcfile),
        Commands::Enerconv(args) => enerconv::execute(args, rcfile),
        Commands::Geomconv(args) => geomconv::execute(args, rcfile),
        Commands::Run(args) => run::execute(args, rcfile),
        Commands::Watch(args) => watch::execute(args, rcfile),
        Commands::Install(args) => install::execute(args, rcfile),
    }
}
