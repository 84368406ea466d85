//! # ONETEP 输入文件解析器
//!
//! ## 格式说明
//! ```text
//! ! comment
//! task : geometryoptimization
//! cutoff_energy : 800 eV
//!
//! %block lattice_cart
//! ang
//!   10.0 0.0 0.0
//!   ...
//! %endblock lattice_cart
//! ```
//!
//! 关键字可写作 `key : value`、`key = value` 或 `key value`，
//! 关键字名和块名大小写不敏感。
//!
//! ## 依赖关系
//! - 被 `parsers/cell.rs`, `commands/create.rs`, `commands/check.rs` 使用
//! - 使用 `models/deck.rs`

use crate::error::{Result, TeptoolsError};
use crate::models::{Entry, InputDeck};
use log::trace;
use std::fs;
use std::path::Path;

/// 解析输入文件
pub fn parse_deck_file(path: &Path) -> Result<InputDeck> {
    let content = fs::read_to_string(path).map_err(|e| TeptoolsError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_deck_content(&content, &path.display().to_string())
}

/// 从字符串内容解析输入文件，`source` 仅用于错误信息
pub fn parse_deck_content(content: &str, source: &str) -> Result<InputDeck> {
    let mut deck = InputDeck::new();
    // 当前打开的块：(块名, 起始行号, 块内行)
    let mut open: Option<(String, usize, Vec<String>)> = None;

    for (idx, raw) in content.lines().enumerate() {
        let lineno = idx + 1;
        let trimmed = raw.trim();

        if let Some(name) = directive(trimmed, "%endblock") {
            let Some((open_name, _, lines)) = open.take() else {
                return Err(malformed(source, lineno, "%endblock without matching %block"));
            };
            if !name.is_empty() && name != open_name {
                return Err(malformed(
                    source,
                    lineno,
                    &format!("%endblock {} does not close %block {}", name, open_name),
                ));
            }
            trace!("block {} ({} lines)", open_name, lines.len());
            deck.push(Entry::Block {
                name: open_name,
                lines,
            });
            continue;
        }

        if let Some((_, _, lines)) = open.as_mut() {
            lines.push(raw.to_string());
            continue;
        }

        if let Some(name) = directive(trimmed, "%block") {
            if name.is_empty() {
                return Err(malformed(source, lineno, "%block without a name"));
            }
            open = Some((name, lineno, Vec::new()));
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            deck.push(Entry::Verbatim(raw.to_string()));
            continue;
        }

        let (key, value) = split_keyword(trimmed);
        deck.set_keyword(key, value);
    }

    if let Some((name, start, _)) = open {
        return Err(malformed(
            source,
            start,
            &format!("%block {} is missing %endblock {}", name, name),
        ));
    }

    Ok(deck)
}

/// 识别 `%block x` / `%endblock x`，返回小写块名
fn directive(line: &str, keyword: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    Some(parts.next().unwrap_or("").to_lowercase())
}

/// 拆分 `key : value` / `key = value` / `key value`
fn split_keyword(line: &str) -> (&str, &str) {
    if let Some(pos) = line.find([':', '=']) {
        let key = line[..pos].trim();
        if !key.is_empty() && !key.contains(char::is_whitespace) {
            return (key, line[pos + 1..].trim());
        }
    }

    match line.split_once(char::is_whitespace) {
        Some((key, value)) => (key, value.trim()),
        None => (line, ""),
    }
}

fn malformed(source: &str, line: usize, reason: &str) -> TeptoolsError {
    TeptoolsError::MalformedBlock {
        path: source.to_string(),
        line,
        reason: reason.to_string(),
    }
}
