//! # ONETEP 进程工具
//!
//! 解析 ONETEP 可执行文件路径并构造运行命令，`run` 和 `watch` 共用。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs`, `commands/watch.rs` 使用
//! - 使用 `config.rs` 展开路径

use crate::config::expand_path;
use crate::error::{Result, TeptoolsError};
use log::debug;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 从 rc 中的可执行文件列表选择第 `version` 个（1 起始）
pub fn resolve_executable(onetep: &[String], version: usize) -> Result<PathBuf> {
    if onetep.is_empty() {
        return Err(TeptoolsError::ExecutableNotSet);
    }

    let entry = version
        .checked_sub(1)
        .and_then(|i| onetep.get(i))
        .ok_or_else(|| {
            TeptoolsError::InvalidArgument(format!(
                "ONETEP version {} requested but only {} configured",
                version,
                onetep.len()
            ))
        })?;

    let path = expand_path(entry);
    if path.components().count() > 1 {
        if path.is_file() {
            return Ok(path);
        }
        return Err(TeptoolsError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    // 裸命令名在 PATH 中查找
    find_in_path(&path).ok_or_else(|| TeptoolsError::FileNotFound {
        path: path.display().to_string(),
    })
}

fn find_in_path(name: &Path) -> Option<PathBuf> {
    if name.is_file() {
        return Some(name.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// 构造 ONETEP 命令：`<exe> <input>`
///
/// `workdir` 为作业目录；`output` 给出时 stdout 和 stderr 都写入该文件。
pub fn onetep_command(
    exe: &Path,
    input: &Path,
    workdir: Option<&Path>,
    output: Option<&Path>,
) -> Result<Command> {
    let mut cmd = Command::new(exe);
    cmd.arg(input);

    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }

    if let Some(out_path) = output {
        let write_err = |e| TeptoolsError::FileWriteError {
            path: out_path.display().to_string(),
            source: e,
        };
        let stdout = File::create(out_path).map_err(write_err)?;
        let stderr = stdout.try_clone().map_err(write_err)?;
        cmd.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));
    }

    cmd.stdin(Stdio::null());
    debug!("command: {:?}", cmd);
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_executable_not_set() {
        assert!(matches!(
            resolve_executable(&[], 1),
            Err(TeptoolsError::ExecutableNotSet)
        ));
    }

    #[test]
    fn test_executable_selection() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("onetep");
        fs::write(&exe, "").unwrap();

        let missing = dir.path().join("not_exists");
        let list = vec![missing.display().to_string(), exe.display().to_string()];

        match resolve_executable(&list, 1) {
            Err(e) => assert_eq!(e.to_string(), format!("{} does not exists", missing.display())),
            Ok(p) => panic!("unexpected {:?}", p),
        }
        assert_eq!(resolve_executable(&list, 2).unwrap(), exe);
        assert!(matches!(
            resolve_executable(&list, 3),
            Err(TeptoolsError::InvalidArgument(_))
        ));
        assert!(resolve_executable(&list, 0).is_err());
    }

    #[test]
    fn test_command_redirects_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("onetep.out");

        let cmd = onetep_command(
            Path::new("/bin/echo"),
            Path::new("onetep.dat"),
            Some(dir.path()),
            Some(&out),
        )
        .unwrap();

        assert_eq!(cmd.get_program(), "/bin/echo");
        assert_eq!(cmd.get_args().collect::<Vec<_>>(), ["onetep.dat"]);
        assert_eq!(cmd.get_current_dir(), Some(dir.path()));
        assert!(out.is_file());
    }
}
