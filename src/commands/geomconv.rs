//! # geomconv 命令实现
//!
//! 以表格显示几何优化每次迭代的焓和收敛判据。
//! 两个文件时并排显示，按迭代序号对齐。
//! 表格之后列出未完成、没有迭代记录或未收敛的文件：
//! ```text
//! relax/WS.out <-- not finished
//! ```
//!
//! ## 依赖关系
//! - 使用 `cli/geomconv.rs` 定义的参数
//! - 使用 `parsers/onetep_out.rs`, `batch/`
//! - 使用 `tabled` 生成表格

use crate::batch::{find_files, BatchRunner};
use crate::cli::geomconv::GeomconvArgs;
use crate::config::{self, geomconv_defaults};
use crate::error::Result;
use crate::models::{GeomIteration, GeomSeries};
use crate::parsers::onetep_out::parse_geometry_file;
use crate::utils::output;

use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::Style;

/// 表格中显示的判据（按此顺序）
const CRITERIA: [&str; 3] = ["dE/ion", "|F|max", "|dR|max"];

/// 执行 geomconv 命令
pub fn execute(args: GeomconvArgs, rcfile: &Path) -> Result<()> {
    let cfg = config::load_config(rcfile, geomconv_defaults())?;
    let files = find_files(&args.files, cfg.get_str("outfile_ext"))?;

    if files.is_empty() {
        output::print_warning("No output files found.");
        return Ok(());
    }

    let parsed = BatchRunner::new(args.jobs).run(&files, parse_geometry_file);

    let mut series: Vec<(PathBuf, Vec<GeomIteration>)> = Vec::new();
    let mut notes = Vec::new();
    for (file, result) in files.into_iter().zip(parsed) {
        match result {
            Ok(parsed) => {
                notes.extend(status_line(&file, &parsed));
                if !parsed.iterations.is_empty() {
                    series.push((file, parsed.iterations));
                }
            }
            Err(e) => output::print_warning(&e.to_string()),
        }
    }

    if series.len() == 2 {
        println!("{}", side_by_side(&series[0], &series[1]));
    } else {
        let multiple = series.len() > 1;
        for (file, iters) in &series {
            if multiple {
                output::print_file_header(&file.display().to_string());
            }
            println!("{}", single_table(iters));
        }
    }

    for note in notes {
        println!("{}", note);
    }
    Ok(())
}

/// 需要提示的文件状态；已完成且最后一次迭代收敛时返回 `None`
pub fn status_line(file: &Path, series: &GeomSeries) -> Option<String> {
    let status = if !series.finished {
        "not finished"
    } else if series.iterations.is_empty() {
        "no geometry iterations"
    } else if !series.is_converged() {
        "not converged"
    } else {
        return None;
    };
    Some(format!("{} <-- {}", file.display(), status))
}

/// 单个文件的收敛表
pub fn single_table(iters: &[GeomIteration]) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["Iter".to_string(), "Enthalpy (Eh)".to_string()];
    header.extend(CRITERIA.iter().map(|c| c.to_string()));
    builder.push_record(header);

    for it in iters {
        let mut row = vec![it.iteration.to_string()];
        row.extend(iteration_cells(Some(it)));
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
}

/// 两个文件并排，按迭代序号对齐；较短的一侧留空
pub fn side_by_side(
    left: &(PathBuf, Vec<GeomIteration>),
    right: &(PathBuf, Vec<GeomIteration>),
) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["Iter".to_string()];
    for (file, _) in [left, right] {
        header.push(format!("{} Enthalpy", short_name(file)));
        header.extend(CRITERIA.iter().map(|c| c.to_string()));
    }
    builder.push_record(header);

    let mut iterations: Vec<usize> = left
        .1
        .iter()
        .chain(right.1.iter())
        .map(|it| it.iteration)
        .collect();
    iterations.sort_unstable();
    iterations.dedup();

    for n in iterations {
        let mut row = vec![n.to_string()];
        row.extend(iteration_cells(left.1.iter().find(|it| it.iteration == n)));
        row.extend(iteration_cells(right.1.iter().find(|it| it.iteration == n)));
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
}

/// 焓和各判据单元格；已收敛的判据加 `*`
fn iteration_cells(it: Option<&GeomIteration>) -> Vec<String> {
    let Some(it) = it else {
        return vec![String::new(); CRITERIA.len() + 1];
    };

    let mut cells = vec![format!("{:.8}", it.enthalpy)];
    for name in CRITERIA {
        cells.push(match it.criterion(name) {
            Some(c) if c.converged => format!("{:.6e} *", c.value),
            Some(c) => format!("{:.6e}", c.value),
            None => String::new(),
        });
    }
    cells
}

fn short_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string())
}
