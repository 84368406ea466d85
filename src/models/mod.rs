//! # 数据模型模块
//!
//! 定义输入文件、收敛数据和作业状态的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `commands/` 使用
//! - 子模块: deck, convergence, elements, job

pub mod convergence;
pub mod deck;
pub mod elements;
pub mod job;

pub use convergence::{Criterion, EnergyReport, GeomIteration, GeomSeries};
pub use deck::{Entry, InputDeck};
pub use job::{classify, JobState, Markers};
