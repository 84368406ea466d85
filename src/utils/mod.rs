//! # 工具函数模块
//!
//! 提供美化输出、进度条、交互输入与 ONETEP 进程构造等工具。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 子模块: output, progress, prompt, process

pub mod output;
pub mod process;
pub mod progress;
pub mod prompt;
