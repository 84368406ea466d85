//! # 批量处理模块
//!
//! 提供统一的文件收集与批量解析能力。
//!
//! ## 功能
//! - 自动识别输入类型（文件/目录/glob 模式）
//! - 收集匹配文件或作业目录列表
//! - 并行解析
//!
//! ## 依赖关系
//! - 被各命令模块使用
//! - 使用 `glob`/`walkdir` 收集文件
//! - 使用 `rayon` 进行并行处理

pub mod collector;
pub mod runner;

pub use collector::{find_files, first_file_in, unique_path, FileCollector};
pub use runner::BatchRunner;
