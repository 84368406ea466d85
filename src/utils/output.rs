//! # 美化输出工具
//!
//! 提供统一的终端状态输出样式；数据本身（能量、检查结果、表格）直接写 stdout。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块使用
//! - 使用 `colored` crate，`models/job.rs` 的作业状态

use crate::models::JobState;
use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印作业状态（watch 记录作业结束时）
pub fn print_job_state(dir: &str, state: JobState) {
    let tag = match state {
        JobState::Done => "[DONE]".green().bold(),
        JobState::Error => "[FAIL]".red().bold(),
        JobState::Running => "[RUN]".cyan().bold(),
        JobState::Pending => "[WAIT]".dimmed(),
    };
    println!("{} {} {}", tag, dir, state);
}

/// 打印文件标题（多文件输出时分隔各文件）
pub fn print_file_header(path: &str) {
    println!("{}", format!("==> {} <==", path).bold());
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}
