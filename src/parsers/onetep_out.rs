//! # ONETEP 输出文件解析器
//!
//! 从 ONETEP 输出文件中提取最终能量和几何优化收敛过程。
//!
//! ## 输出格式片段
//! ```text
//! | Total                      :   -14338.56459039093170 |
//!
//!  BFGS: finished iteration     1 with enthalpy= -1.43385646E+004 Eh
//! |  dE/ion   |   1.234567E-004 |   2.000000E-005 |              Eh | No        | <-- BFGS
//! |  |F|max   |   5.307013E-002 |   2.000000E-003 |         Eh/bohr | No        | <-- BFGS
//! |  |dR|max  |   1.234567E-002 |   1.000000E-002 |            bohr | No        | <-- BFGS
//!
//! Job completed: 2016-02-15 11:32:40
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/enerconv.rs`, `commands/geomconv.rs`, `commands/watch.rs` 使用
//! - 使用 `models/convergence.rs`

use crate::error::{Result, TeptoolsError};
use crate::models::{Criterion, EnergyReport, GeomIteration, GeomSeries};
use log::debug;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// 计算正常结束的标记
pub const COMPLETION_MARKER: &str = "Job completed";

/// 判断完成标记时检查的末尾行数
const TAIL_LINES: usize = 20;

fn energy_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\|?\s*Total\s*:\s*(-?\d+\.\d+(?:[eEdD][-+]?\d+)?)")
            .expect("energy regex")
    })
}

fn iteration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"BFGS\s*:\s*finished iteration\s+(\d+)\s+with enthalpy\s*=\s*(\S+)")
            .expect("iteration regex")
    })
}

fn criterion_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*\|\s*(dE/ion|\|F\|max|\|dR\|max|\|Smax\|)\s*\|\s*(\S+)\s*\|\s*(\S+)\s*\|\s*(\S+)\s*\|\s*(Yes|No)\s*\|\s*<--\s*BFGS",
        )
        .expect("criterion regex")
    })
}

/// 解析 Fortran 风格浮点数（允许 `D` 指数）
fn parse_fortran_float(s: &str) -> Option<f64> {
    s.replace(['D', 'd'], "E").parse().ok()
}

fn read_output(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| TeptoolsError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// 内容中是否含有完成标记
pub fn is_finished(content: &str) -> bool {
    content.lines().any(|l| l.contains(COMPLETION_MARKER))
}

/// 输出文件末尾是否含有完成标记（文件不可读视为未完成）
pub fn is_completed_output(path: &Path) -> bool {
    match read_output(path) {
        Ok(content) => {
            let lines: Vec<&str> = content.lines().collect();
            lines
                .iter()
                .rev()
                .take(TAIL_LINES)
                .any(|l| l.contains(COMPLETION_MARKER))
        }
        Err(e) => {
            debug!("{}", e);
            false
        }
    }
}

/// 提取最终能量
pub fn parse_energy_file(path: &Path) -> Result<EnergyReport> {
    Ok(energy_from_content(&read_output(path)?))
}

/// 取最后一行格式正确的 `Total : <number>`
pub fn energy_from_content(content: &str) -> EnergyReport {
    if !is_finished(content) {
        return EnergyReport::NotFinished;
    }

    let re = energy_regex();
    content
        .lines()
        .rev()
        .filter_map(|line| re.captures(line))
        .find_map(|caps| {
            let text = caps[1].to_string();
            parse_fortran_float(&text).map(|value| EnergyReport::Finished { value, text })
        })
        .unwrap_or(EnergyReport::NoEnergy)
}

/// 提取几何优化迭代记录及完成状态
pub fn parse_geometry_file(path: &Path) -> Result<GeomSeries> {
    Ok(geometry_from_content(&read_output(path)?))
}

pub fn geometry_from_content(content: &str) -> GeomSeries {
    GeomSeries {
        iterations: geometry_iterations(content),
        finished: is_finished(content),
    }
}

/// 每条 `finished iteration` 记录之后的收敛表归属于该迭代
fn geometry_iterations(content: &str) -> Vec<GeomIteration> {
    let mut iterations: Vec<GeomIteration> = Vec::new();

    for line in content.lines() {
        if let Some(caps) = iteration_regex().captures(line) {
            let iteration = caps[1].parse().unwrap_or(iterations.len());
            match parse_fortran_float(&caps[2]) {
                Some(enthalpy) => iterations.push(GeomIteration::new(iteration, enthalpy)),
                None => debug!("skipping malformed iteration line: {}", line.trim()),
            }
            continue;
        }

        let Some(current) = iterations.last_mut() else {
            continue;
        };

        if let Some(caps) = criterion_regex().captures(line) {
            let (Some(value), Some(tolerance)) =
                (parse_fortran_float(&caps[2]), parse_fortran_float(&caps[3]))
            else {
                continue;
            };
            let name = caps[1].to_string();
            // 同一迭代重复打印的表格以最后一次为准
            current.criteria.retain(|c| c.name != name);
            current.criteria.push(Criterion {
                name,
                value,
                tolerance,
                units: caps[4].to_string(),
                converged: &caps[5] == "Yes",
            });
        }
    }

    iterations
}
