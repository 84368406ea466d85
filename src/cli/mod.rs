//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `create`: 由模板生成输入文件（可生成收敛测试）
//! - `check`: 检查输入文件
//! - `enerconv`: 提取最终能量
//! - `geomconv`: 几何优化收敛过程
//! - `run`: 运行单个 ONETEP 计算
//! - `watch`: 监控并调度作业目录
//! - `install`: 安装 teptools
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: create, check, enerconv, geomconv, run, watch, install

pub mod check;
pub mod create;
pub mod enerconv;
pub mod geomconv;
pub mod install;
pub mod run;
pub mod watch;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// teptools - ONETEP 计算辅助工具集
#[derive(Parser)]
#[command(name = "teptools")]
#[command(version)]
#[command(about = "Prepare, launch and monitor ONETEP calculations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: ~/.teptoolsrc)
    #[arg(long, global = true, env = "TEPTOOLSRC")]
    pub rcfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Create an input file from a template, optionally with convergence tests
    Create(create::CreateArgs),

    /// Check input files for common mistakes
    Check(check::CheckArgs),

    /// Print the final energy of each output file
    Enerconv(enerconv::EnerconvArgs),

    /// Show the geometry optimisation convergence of output files
    Geomconv(geomconv::GeomconvArgs),

    /// Run a single ONETEP calculation
    Run(run::RunArgs),

    /// Watch job directories, launch queued jobs and log their outcome
    Watch(watch::WatchArgs),

    /// Install teptools into a prefix directory
    Install(install::InstallArgs),
}
