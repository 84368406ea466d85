//! # 统一错误处理模块
//!
//! 定义 teptools 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// teptools 统一错误类型
#[derive(Error, Debug)]
pub enum TeptoolsError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} does not exists")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 配置错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid value '{value}' for option '{option}' in section [{section}]")]
    ConfigError {
        section: String,
        option: String,
        value: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed block in {path} at line {line}: {reason}")]
    MalformedBlock {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unknown element symbol: {0}")]
    UnknownElement(String),

    // ─────────────────────────────────────────────────────────────
    // create 相关
    // ─────────────────────────────────────────────────────────────
    #[error("No pseudopotential file found for {element} in {potdir}")]
    PseudopotentialNotFound { element: String, potdir: String },

    // ─────────────────────────────────────────────────────────────
    // run / watch 相关
    // ─────────────────────────────────────────────────────────────
    #[error("ONETEP path not set")]
    ExecutableNotSet,

    #[error("No ONETEP input file found or supplied")]
    NoInputFile,

    #[error("Failed to start '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, TeptoolsError>;
