//! # ONETEP 输入文件数据模型
//!
//! 输入文件由关键字（`key : value`）和块（`%block x` … `%endblock x`）组成。
//! 条目按原文件顺序保存，注释和空行原样保留，以便重新写出。
//!
//! ## 依赖关系
//! - 被 `parsers/deck.rs` 构造
//! - 被 `commands/create.rs`, `commands/check.rs` 使用

use std::fmt;

/// 输入文件中的一个条目
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// `key: value`，key 已转为小写
    Keyword { key: String, value: String },
    /// `%block name` … `%endblock name`，块内各行原样保存
    Block { name: String, lines: Vec<String> },
    /// 注释或空行
    Verbatim(String),
}

/// ONETEP 输入文件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputDeck {
    entries: Vec<Entry>,
}

impl InputDeck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// 查询关键字（大小写不敏感）
    pub fn keyword(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.entries.iter().find_map(|e| match e {
            Entry::Keyword { key: k, value } if *k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// 查询块内容（大小写不敏感）
    pub fn block(&self, name: &str) -> Option<&[String]> {
        let name = name.to_lowercase();
        self.entries.iter().find_map(|e| match e {
            Entry::Block { name: n, lines } if *n == name => Some(lines.as_slice()),
            _ => None,
        })
    }

    /// 所有关键字 (key, value)
    #[cfg(test)]
    pub fn keywords(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Keyword { key, value } => Some((key.as_str(), value.as_str())),
            _ => None,
        })
    }

    /// 设置关键字：已存在则原位替换，否则追加
    pub fn set_keyword(&mut self, key: &str, value: impl Into<String>) {
        let key = key.to_lowercase();
        let value = value.into();
        for entry in self.entries.iter_mut() {
            if let Entry::Keyword { key: k, value: v } = entry {
                if *k == key {
                    *v = value;
                    return;
                }
            }
        }
        self.entries.push(Entry::Keyword { key, value });
    }

    /// 设置块：已存在则原位替换，否则追加
    pub fn set_block(&mut self, name: &str, lines: Vec<String>) {
        let name = name.to_lowercase();
        for entry in self.entries.iter_mut() {
            if let Entry::Block { name: n, lines: l } = entry {
                if *n == name {
                    *l = lines;
                    return;
                }
            }
        }
        self.entries.push(Entry::Block { name, lines });
    }

    pub fn remove_keyword(&mut self, key: &str) -> Option<String> {
        let key = key.to_lowercase();
        let pos = self
            .entries
            .iter()
            .position(|e| matches!(e, Entry::Keyword { key: k, .. } if *k == key))?;
        match self.entries.remove(pos) {
            Entry::Keyword { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn remove_block(&mut self, name: &str) -> Option<Vec<String>> {
        let name = name.to_lowercase();
        let pos = self
            .entries
            .iter()
            .position(|e| matches!(e, Entry::Block { name: n, .. } if *n == name))?;
        match self.entries.remove(pos) {
            Entry::Block { lines, .. } => Some(lines),
            _ => None,
        }
    }
}

impl fmt::Display for InputDeck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match entry {
                Entry::Keyword { key, value } => writeln!(f, "{}: {}", key, value)?,
                Entry::Block { name, lines } => {
                    writeln!(f, "%block {}", name)?;
                    for line in lines {
                        writeln!(f, "{}", line)?;
                    }
                    writeln!(f, "%endblock {}", name)?;
                }
                Entry::Verbatim(line) => writeln!(f, "{}", line)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut deck = InputDeck::new();
        deck.set_keyword("task", "singlepoint");
        deck.set_block("species", vec!["W W 74 -1 8.0".to_string()]);
        deck.set_keyword("cutoff_energy", "800 eV");

        deck.set_keyword("TASK", "geometryoptimization");
        deck.set_block("Species", vec!["S S 16 -1 8.0".to_string()]);

        let keys: Vec<_> = deck.keywords().map(|(k, _)| k).collect();
        assert_eq!(keys, ["task", "cutoff_energy"]);
        assert_eq!(deck.keyword("task"), Some("geometryoptimization"));
        assert_eq!(deck.block("species").unwrap(), ["S S 16 -1 8.0"]);
    }

    #[test]
    fn test_remove() {
        let mut deck = InputDeck::new();
        deck.set_keyword("cutoff_energy", "800 eV");
        deck.set_block("species", vec![]);

        assert_eq!(deck.remove_keyword("cutoff_energy").as_deref(), Some("800 eV"));
        assert!(deck.remove_keyword("cutoff_energy").is_none());
        assert!(deck.remove_block("species").is_some());
        assert!(deck.to_string().is_empty());
    }

    #[test]
    fn test_display() {
        let mut deck = InputDeck::new();
        deck.push(Entry::Verbatim("! generated".to_string()));
        deck.set_keyword("task", "singlepoint");
        deck.set_block("lattice_cart", vec!["ang".to_string()]);

        assert_eq!(
            deck.to_string(),
            "! generated\ntask: singlepoint\n%block lattice_cart\nang\n%endblock lattice_cart\n"
        );
    }
}
