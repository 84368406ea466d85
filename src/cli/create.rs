//! # create 子命令 CLI 定义
//!
//! 由模板生成 ONETEP 输入文件，可选生成截断能/NGWF 半径收敛测试
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/create.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 收敛测试扫描的参数
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConvAxis {
    /// Kinetic energy cutoff (cutoff_energy keyword)
    Cutoff,
    /// NGWF radius (species block)
    Radius,
}

impl std::fmt::Display for ConvAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvAxis::Cutoff => write!(f, "cutoff"),
            ConvAxis::Radius => write!(f, "radius"),
        }
    }
}

/// create 子命令参数
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Name of the new input file, without extension
    pub name: String,

    /// Element symbols (default: species found in the cell file)
    #[arg(short, long, num_args = 1..)]
    pub elements: Vec<String>,

    /// .cell file providing LATTICE_CART and POSITIONS_ABS blocks
    #[arg(long)]
    pub cell: Option<PathBuf>,

    /// Template input file (default: first entry of `templates` in the rc file)
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Directory containing pseudopotential files
    #[arg(long)]
    pub potdir: Option<PathBuf>,

    /// Kinetic energy cutoff in eV
    #[arg(long)]
    pub cutoff: Option<f64>,

    /// NGWF radius in bohr
    #[arg(long)]
    pub radius: Option<f64>,

    /// Generate convergence tests for the given parameters
    #[arg(long, value_enum, num_args = 1..)]
    pub conv_test: Vec<ConvAxis>,

    /// Answers for the interactive prompts, used in order before asking
    #[arg(long = "answer", value_name = "ANSWER")]
    pub answers: Vec<String>,
}
