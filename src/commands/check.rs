//! # check 命令实现
//!
//! 对输入文件及其所在目录执行一组语义检查，累积所有错误后输出。
//!
//! ## 检查规则
//! - 续算一致性：`geom_continuation` 与目录中的 `*.continuation` 文件
//! - `species_pot` 中的赝势文件存在
//! - `positions_abs` 中的物种均在 `species` 块中定义
//!
//! ## 依赖关系
//! - 使用 `cli/check.rs` 定义的参数
//! - 使用 `parsers/deck.rs`, `batch/collector.rs`

use crate::batch::find_files;
use crate::cli::check::CheckArgs;
use crate::config::{self, check_defaults};
use crate::error::Result;
use crate::models::InputDeck;
use crate::parsers::deck::parse_deck_file;
use crate::utils::output;

use log::info;
use std::fs;
use std::path::Path;

/// 需要续算文件的任务类型
const GEOMETRY_TASKS: [&str; 4] = [
    "geometryoptimization",
    "transitionstatesearch",
    "moleculardynamics",
    "phonon",
];

/// 执行 check 命令
pub fn execute(args: CheckArgs, rcfile: &Path) -> Result<()> {
    let cfg = config::load_config(rcfile, check_defaults())?;
    let files = find_files(&args.files, cfg.get_str("inpfile_ext"))?;

    if files.is_empty() {
        output::print_warning("No input files found.");
        return Ok(());
    }

    let multiple = files.len() > 1;
    for file in &files {
        let deck = parse_deck_file(file)?;
        let dir = match file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let errors = check_deck(dir, &deck);
        if errors.is_empty() {
            info!("{}: no problems found", file.display());
            continue;
        }

        if multiple {
            output::print_file_header(&file.display().to_string());
        }
        for error in &errors {
            println!("{}", error);
        }
    }

    Ok(())
}

/// 对一个输入文件执行所有规则
pub fn check_deck(dir: &Path, deck: &InputDeck) -> Vec<String> {
    let mut check = Check::new(dir, deck);
    check.check_continuation();
    check.check_pseudopotentials();
    check.check_species();
    check.into_errors()
}

/// 检查上下文：输入文件、所在目录和累积的错误
pub struct Check<'a> {
    dir: &'a Path,
    deck: &'a InputDeck,
    errors: Vec<String>,
}

impl<'a> Check<'a> {
    pub fn new(dir: &'a Path, deck: &'a InputDeck) -> Self {
        Check {
            dir,
            deck,
            errors: Vec::new(),
        }
    }

    /// 按检查顺序累积的错误
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// `geom_continuation` 与续算文件是否一致
    pub fn check_continuation(&mut self) {
        if let Some(task) = self.deck.keyword("task") {
            if !GEOMETRY_TASKS.contains(&task.to_lowercase().as_str()) {
                return;
            }
        }

        let has_file = has_continuation_file(self.dir);

        match self.deck.keyword("geom_continuation") {
            Some(value) => match parse_logical(value) {
                Some(true) if !has_file => self
                    .errors
                    .push("geom_continuation is true but continuation file not found.".to_string()),
                Some(false) if has_file => self
                    .errors
                    .push("geom_continuation is false but a continuation file exists.".to_string()),
                Some(_) => {}
                None => self
                    .errors
                    .push(format!("geom_continuation has an invalid value: {}", value)),
            },
            None if has_file => self.errors.push(
                "geom_continuation keyword not found but a continuation file exists.".to_string(),
            ),
            None => {}
        }
    }

    /// `species_pot` 块中的文件必须存在
    pub fn check_pseudopotentials(&mut self) {
        let Some(lines) = self.deck.block("species_pot") else {
            return;
        };

        let base = match self.deck.keyword("pseudo_path") {
            Some(p) => self.dir.join(p.trim_matches(|c| c == '"' || c == '\'')),
            None => self.dir.to_path_buf(),
        };

        for line in lines {
            let mut parts = line.split_whitespace();
            let (Some(_label), Some(file)) = (parts.next(), parts.next()) else {
                continue;
            };
            let file = file.trim_matches(|c| c == '"' || c == '\'');
            let path = base.join(file);
            if !path.is_file() {
                self.errors
                    .push(format!("pseudopotential file not found: {}", path.display()));
            }
        }
    }

    /// `positions_abs` 使用的物种必须在 `species` 块中定义
    pub fn check_species(&mut self) {
        let (Some(species), Some(positions)) =
            (self.deck.block("species"), self.deck.block("positions_abs"))
        else {
            return;
        };

        let defined: Vec<&str> = species
            .iter()
            .filter_map(|l| l.split_whitespace().next())
            .collect();

        let mut reported: Vec<&str> = Vec::new();
        for line in positions {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                continue;
            }
            let label = parts[0];
            if !defined.contains(&label) && !reported.contains(&label) {
                reported.push(label);
                self.errors.push(format!(
                    "species {} used in positions_abs but not defined in species block",
                    label
                ));
            }
        }
    }
}

/// Fortran 风格逻辑值
pub fn parse_logical(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "t" | "true" | ".true." | ".t." => Some(true),
        "f" | "false" | ".false." | ".f." => Some(false),
        _ => None,
    }
}

/// 目录中是否存在 `*.continuation` 文件
fn has_continuation_file(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                let path = e.path();
                path.is_file() && path.extension().and_then(|x| x.to_str()) == Some("continuation")
            })
        })
        .unwrap_or(false)
}
