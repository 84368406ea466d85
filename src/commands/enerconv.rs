//! # enerconv 命令实现
//!
//! 输出每个 ONETEP 输出文件的最终能量，用于比较收敛测试。
//!
//! ## 输出格式
//! ```text
//! 1000 -14338.56459039093170
//! 1100 -14348.98291773412348
//! 1200/WS.out <-- not finished
//! ```
//! 标签为输出文件所在目录名。
//!
//! ## 依赖关系
//! - 使用 `cli/enerconv.rs` 定义的参数
//! - 使用 `parsers/onetep_out.rs`, `batch/`

use crate::batch::{find_files, BatchRunner};
use crate::cli::enerconv::EnerconvArgs;
use crate::config::{self, enerconv_defaults};
use crate::error::Result;
use crate::models::EnergyReport;
use crate::parsers::onetep_out::parse_energy_file;
use crate::utils::output;

use log::info;
use std::path::{Path, PathBuf};

/// 执行 enerconv 命令
pub fn execute(args: EnerconvArgs, rcfile: &Path) -> Result<()> {
    let cfg = config::load_config(rcfile, enerconv_defaults())?;
    let files = find_files(&args.files, cfg.get_str("outfile_ext"))?;

    if files.is_empty() {
        output::print_warning("No output files found.");
        return Ok(());
    }

    let reports = BatchRunner::new(args.jobs).run(&files, parse_energy_file);

    let mut energies = Vec::new();
    for (file, report) in files.iter().zip(reports) {
        match report {
            Ok(report) => {
                println!("{}", format_report(file, &report));
                energies.extend(report.value());
            }
            Err(e) => output::print_warning(&e.to_string()),
        }
    }

    if let Some(spread) = energy_spread(&energies) {
        info!("Energy spread over {} files: {:.8} Eh", energies.len(), spread);
    }
    Ok(())
}

/// 最大与最小能量之差；少于两个能量时为 `None`
pub fn energy_spread(energies: &[f64]) -> Option<f64> {
    if energies.len() < 2 {
        return None;
    }
    let max = energies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = energies.iter().copied().fold(f64::INFINITY, f64::min);
    Some(max - min)
}

/// 单个文件的输出行
pub fn format_report(file: &Path, report: &EnergyReport) -> String {
    match report {
        EnergyReport::Finished { text, .. } => format!("{} {}", label(file), text),
        EnergyReport::NotFinished => format!("{} <-- not finished", file.display()),
        EnergyReport::NoEnergy => format!("{} <-- no energy found", file.display()),
    }
}

/// 输出文件所在目录名（相对路径按当前目录解析）
fn label(file: &Path) -> String {
    let parent = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let resolved = parent.canonicalize().unwrap_or(parent);
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| resolved.display().to_string())
}
