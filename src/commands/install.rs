//! # install 命令实现
//!
//! 将当前可执行文件安装到 `<prefix>/.teptools`，生成 `tep.sh`
//! （加入 PATH 并定义各子命令的简写），首次安装时写入默认 rc 文件。
//!
//! ## 依赖关系
//! - 使用 `cli/install.rs` 定义的参数
//! - 使用 `config.rs` 的默认 rc 内容和路径展开
//! - 使用 `utils/prompt.rs` 确认安装

use crate::cli::install::InstallArgs;
use crate::config::{expand_path, DEFAULT_RC};
use crate::error::{Result, TeptoolsError};
use crate::utils::output;
use crate::utils::prompt::{InputProvider, StdinInput};

use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// 安装目录名
pub const INSTALL_DIR: &str = ".teptools";

/// 环境脚本名
pub const ENV_SCRIPT: &str = "tep.sh";

/// 定义简写的子命令（`tep<cmd>` -> `teptools <cmd>`）
const ALIASES: [&str; 6] = ["create", "check", "enerconv", "geomconv", "run", "watch"];

/// 执行 install 命令
pub fn execute(args: InstallArgs, rcfile: &Path) -> Result<()> {
    let exe = std::env::current_exe().map_err(|e| {
        TeptoolsError::Other(format!("Cannot locate the teptools executable: {}", e))
    })?;

    if let Some(dir) = install(&args, &exe, rcfile, &mut StdinInput)? {
        output::print_success(&format!("teptools installed to {}", dir.display()));
        println!("To use teptools, add the following line to your shell configuration file:");
        println!("    source {}", dir.join(ENV_SCRIPT).display());
    }
    Ok(())
}

/// 安装到 `<prefix>/.teptools`；用户拒绝时返回 `None`
pub fn install(
    args: &InstallArgs,
    exe: &Path,
    rcfile: &Path,
    input: &mut dyn InputProvider,
) -> Result<Option<PathBuf>> {
    let dir = expand_path(&args.prefix).join(INSTALL_DIR);

    if !args.yes {
        let answer = input.ask(&format!(
            "Are you sure you want to install teptools to {} [y/N]? ",
            dir.display()
        ))?;
        if !matches!(answer.to_lowercase().as_str(), "y" | "yes") {
            println!("teptools will not be installed.");
            return Ok(None);
        }
    }

    fs::create_dir_all(&dir).map_err(|e| TeptoolsError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })?;

    let target = dir.join(exe.file_name().unwrap_or_else(|| "teptools".as_ref()));
    if target != exe {
        fs::copy(exe, &target).map_err(|e| TeptoolsError::FileWriteError {
            path: target.display().to_string(),
            source: e,
        })?;
        info!("Copied {} to {}", exe.display(), target.display());
    }

    write_file(&dir.join(ENV_SCRIPT), &env_script(&dir))?;

    if rcfile.exists() {
        info!("Keeping existing {}", rcfile.display());
    } else {
        write_file(rcfile, DEFAULT_RC)?;
        output::print_info(&format!("Default configuration written to {}", rcfile.display()));
    }

    Ok(Some(dir))
}

/// `tep.sh` 内容
pub fn env_script(dir: &Path) -> String {
    let mut script = String::from("# teptools environment, source this file from your shell rc\n");
    script.push_str(&format!("export PATH=\"{}:$PATH\"\n", dir.display()));
    for cmd in ALIASES {
        script.push_str(&format!("alias tep{}='teptools {}'\n", cmd, cmd));
    }
    script
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| TeptoolsError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::prompt::ScriptedInput;
    use tempfile::TempDir;

    /// 临时目录中的伪可执行文件、安装前缀和 rc 文件路径
    fn setup() -> (TempDir, PathBuf, InstallArgs, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let exe = root.path().join("teptools");
        fs::write(&exe, "binary").unwrap();
        let args = InstallArgs {
            prefix: root.path().join("prefix").display().to_string(),
            yes: false,
        };
        let rcfile = root.path().join(".teptoolsrc");
        (root, exe, args, rcfile)
    }

    #[test]
    fn test_install_after_confirmation() {
        let (root, exe, args, rcfile) = setup();
        let mut input = ScriptedInput::new(["Y"]);

        let dir = install(&args, &exe, &rcfile, &mut input).unwrap().unwrap();
        assert_eq!(dir, root.path().join("prefix").join(".teptools"));
        assert_eq!(fs::read_to_string(dir.join("teptools")).unwrap(), "binary");

        let script = fs::read_to_string(dir.join(ENV_SCRIPT)).unwrap();
        assert!(script.contains(&format!("export PATH=\"{}:$PATH\"", dir.display())));
        assert!(script.contains("alias tepwatch='teptools watch'"));
        assert!(!script.contains("tepinstall"));

        assert_eq!(fs::read_to_string(&rcfile).unwrap(), DEFAULT_RC);
    }

    #[test]
    fn test_declined() {
        let (root, exe, args, rcfile) = setup();
        let mut input = ScriptedInput::new(["n"]);

        assert!(install(&args, &exe, &rcfile, &mut input).unwrap().is_none());
        assert!(!root.path().join("prefix").exists());
        assert!(!rcfile.exists());

        // 空回答同样视为拒绝
        let mut input = ScriptedInput::new([""]);
        assert!(install(&args, &exe, &rcfile, &mut input).unwrap().is_none());
    }

    #[test]
    fn test_yes_skips_prompt_and_keeps_rcfile() {
        let (_root, exe, mut args, rcfile) = setup();
        args.yes = true;
        fs::write(&rcfile, "[run]\nonetep = /opt/onetep\n").unwrap();

        let mut input = ScriptedInput::new(Vec::<String>::new());
        assert!(install(&args, &exe, &rcfile, &mut input).unwrap().is_some());
        assert_eq!(
            fs::read_to_string(&rcfile).unwrap(),
            "[run]\nonetep = /opt/onetep\n"
        );
    }
}
