//! # 晶胞几何块提取
//!
//! 从 CASTEP/ONETEP `.cell` 文件中读取 `create` 需要的几何块，
//! 块内容原样保留（包括单位行和行内注释）。
//!
//! ## 依赖关系
//! - 被 `commands/create.rs` 使用
//! - 使用 `parsers/deck.rs`

use crate::error::{Result, TeptoolsError};
use crate::parsers::deck::parse_deck_file;
use std::collections::BTreeMap;
use std::path::Path;

/// create 写入输入文件的几何块
pub const CELL_BLOCKS: [&str; 2] = ["lattice_cart", "positions_abs"];

/// 读取 `.cell` 文件中的几何块（块名 -> 行）
pub fn read_cell_blocks(path: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let deck = parse_deck_file(path)?;
    let mut blocks = BTreeMap::new();

    for name in CELL_BLOCKS {
        let lines = deck.block(name).ok_or_else(|| TeptoolsError::ParseError {
            format: "cell".to_string(),
            path: path.display().to_string(),
            reason: format!("Missing {} block", name.to_uppercase()),
        })?;
        blocks.insert(name.to_string(), lines.to_vec());
    }

    Ok(blocks)
}

/// `positions_abs` 中按出现顺序去重的物种标签
pub fn species_labels(positions: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();

    for line in positions {
        let parts: Vec<&str> = line.split_whitespace().collect();
        // 单位行只有一个字段
        if parts.len() < 4 || parts[0].starts_with('#') || parts[0].starts_with('!') {
            continue;
        }
        if !labels.iter().any(|l| l == parts[0]) {
            labels.push(parts[0].to_string());
        }
    }

    labels
}
