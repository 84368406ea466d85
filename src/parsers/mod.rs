//! # 解析器模块
//!
//! ONETEP 输入文件、`.cell` 几何块和输出文件的解析器。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: deck, cell, onetep_out

pub mod cell;
pub mod deck;
pub mod onetep_out;
