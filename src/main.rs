//! # teptools - ONETEP 计算辅助工具集
//!
//! 准备、运行和监控 ONETEP 线性标度 DFT 计算，统一成单一可执行文件。
//!
//! ## 子命令
//! - `create`   - 由模板生成输入文件，可生成收敛测试目录
//! - `check`    - 检查输入文件的常见错误
//! - `enerconv` - 提取最终能量
//! - `geomconv` - 几何优化收敛过程
//! - `run`      - 运行单个 ONETEP 计算
//! - `watch`    - 监控作业目录、启动排队作业并记录结果
//! - `install`  - 安装 teptools
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (输入/输出文件解析)
//!   │     ├── models/    (数据模型)
//!   │     └── batch/     (文件收集与并行处理)
//!   ├── config.rs   (rc 配置文件)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod config;
mod error;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;
use env_logger::Env;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let rcfile = cli.rcfile.unwrap_or_else(config::default_rcfile);

    if let Err(e) = commands::run(cli.command, &rcfile) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
