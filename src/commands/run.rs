//! # run 命令实现
//!
//! 运行单个 ONETEP 计算。
//!
//! ## 功能
//! - 从 rc 文件解析 ONETEP 可执行文件（可选版本）
//! - 检查或自动查找输入文件
//! - 可选将输出写入 `<输入文件名>.<outfile_ext>`
//!
//! ## 依赖关系
//! - 使用 `cli/run.rs` 定义的参数
//! - 使用 `utils/process.rs`, `batch/collector.rs`

use crate::batch::{find_files, unique_path};
use crate::cli::run::RunArgs;
use crate::config::{self, run_defaults, Section};
use crate::error::{Result, TeptoolsError};
use crate::utils::output;
use crate::utils::process::{onetep_command, resolve_executable};

use log::info;
use std::path::{Path, PathBuf};

/// 执行 run 命令
pub fn execute(args: RunArgs, rcfile: &Path) -> Result<()> {
    let cfg = config::load_config(rcfile, run_defaults())?;
    run_onetep(&args, &cfg)
}

/// 解析可执行文件和输入文件后运行，等待结束
pub fn run_onetep(args: &RunArgs, cfg: &Section) -> Result<()> {
    let exe = resolve_executable(cfg.get_list("onetep"), args.onetep_version)?;
    let input = resolve_input(args.input.as_deref(), cfg.get_str("inpfile_ext"))?;

    let outfile = if args.output {
        let stem = input
            .file_stem()
            .map(PathBuf::from)
            .ok_or_else(|| TeptoolsError::InvalidArgument(input.display().to_string()))?;
        Some(unique_path(&stem, cfg.get_str("outfile_ext")))
    } else {
        None
    };

    let mut cmd = onetep_command(&exe, &input, None, outfile.as_deref())?;
    info!("Running {} {}", exe.display(), input.display());
    if let Some(out) = &outfile {
        output::print_info(&format!("Writing output to {}", out.display()));
    }

    let status = cmd.status().map_err(|e| TeptoolsError::SpawnFailed {
        command: exe.display().to_string(),
        source: e,
    })?;

    if !status.success() {
        return Err(TeptoolsError::CommandFailed {
            command: format!("{} {}", exe.display(), input.display()),
            stderr: format!("exited with {}", status),
        });
    }

    Ok(())
}

/// 指定的输入文件必须存在；未指定时取当前目录第一个输入文件
fn resolve_input(input: Option<&Path>, extension: &str) -> Result<PathBuf> {
    match input {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(TeptoolsError::FileNotFound {
            path: path.display().to_string(),
        }),
        None => find_files(&[], extension)?
            .into_iter()
            .next()
            .ok_or(TeptoolsError::NoInputFile),
    }
}
