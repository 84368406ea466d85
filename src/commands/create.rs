//! # create 命令实现
//!
//! 由模板生成 ONETEP 输入文件。
//!
//! ## 功能
//! - 填写 `species`、`species_pot` 块和 `cutoff_energy`
//! - 从 `.cell` 文件复制 `lattice_cart` / `positions_abs`
//! - 在赝势目录中按元素符号查找赝势文件，多个候选时交互选择
//! - 可选生成截断能 / NGWF 半径收敛测试目录
//!
//! ## 收敛测试目录结构
//! ```text
//! WS.dat
//! cutoff/WS.dat            (不含 cutoff_energy)
//! cutoff/1000/WS.dat       includefile: ../WS.dat + cutoff_energy: 1000 eV
//! cutoff/1100/WS.dat
//! ```
//!
//! ## 依赖关系
//! - 使用 `cli/create.rs` 定义的参数
//! - 使用 `parsers/deck.rs`, `parsers/cell.rs`, `models/elements.rs`
//! - 使用 `utils/prompt.rs` 获取用户输入

use crate::cli::create::{ConvAxis, CreateArgs};
use crate::config::{self, create_defaults, expand_path, Section};
use crate::error::{Result, TeptoolsError};
use crate::models::elements::{atomic_number, canonical_symbol};
use crate::models::InputDeck;
use crate::parsers::cell::{read_cell_blocks, species_labels};
use crate::parsers::deck::parse_deck_file;
use crate::utils::output;
use crate::utils::prompt::{
    ask_index, ask_number, ChainedInput, InputProvider, ScriptedInput, StdinInput,
};

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// 执行 create 命令
pub fn execute(args: CreateArgs, rcfile: &Path) -> Result<()> {
    let cfg = config::load_config(rcfile, create_defaults())?;
    let mut input = ChainedInput::new(ScriptedInput::new(args.answers.clone()), StdinInput);

    let written = create(&args, &cfg, Path::new("."), &mut input)?;
    for path in &written {
        output::print_success(&format!("Written {}", path.display()));
    }
    Ok(())
}

/// 一个物种：标签（`species` 块第一列）和元素符号
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub label: String,
    pub element: &'static str,
}

impl Species {
    /// 标签开头的字母部分为元素符号（`W1` -> `W`）
    pub fn from_label(label: &str) -> Result<Self> {
        let symbol: String = label
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        Ok(Species {
            label: label.to_string(),
            element: canonical_symbol(&symbol)
                .map_err(|_| TeptoolsError::UnknownElement(label.to_string()))?,
        })
    }
}

/// 生成输入文件（和收敛测试目录），返回写出的文件
pub fn create(
    args: &CreateArgs,
    cfg: &Section,
    outdir: &Path,
    input: &mut dyn InputProvider,
) -> Result<Vec<PathBuf>> {
    let template = template_path(args, cfg)?;
    let mut deck = parse_deck_file(&template)?;
    info!("Using template {}", template.display());

    if let Some(cell) = &args.cell {
        for (name, lines) in read_cell_blocks(cell)? {
            deck.set_block(&name, lines);
        }
    }

    let labels = if args.elements.is_empty() {
        deck.block("positions_abs")
            .map(species_labels)
            .unwrap_or_default()
    } else {
        args.elements.clone()
    };
    if labels.is_empty() {
        return Err(TeptoolsError::InvalidArgument(
            "No elements given and none found in positions_abs".to_string(),
        ));
    }
    let species = labels
        .iter()
        .map(|l| Species::from_label(l))
        .collect::<Result<Vec<_>>>()?;

    let potdir = match &args.potdir {
        Some(dir) => dir.clone(),
        None => match cfg.get_str("potdir") {
            "" => PathBuf::from("."),
            dir => expand_path(dir),
        },
    };
    let cutoff = args.cutoff.unwrap_or_else(|| cfg.get_number("cutoff_energy"));
    let radius = args.radius.unwrap_or_else(|| cfg.get_number("ngwf_radius"));

    let mut pot_lines = Vec::new();
    for sp in &species {
        let pot = resolve_pseudopotential(&potdir, sp.element, input)?;
        pot_lines.push(format!("{:<4}\"{}\"", sp.label, pot.display()));
    }

    deck.set_block("species", species_lines(&species, radius)?);
    deck.set_block("species_pot", pot_lines);
    deck.set_keyword("cutoff_energy", format!("{} eV", format_cutoff(cutoff)));

    let ext = cfg.get_str("inpfile_ext");
    let filename = format!("{}.{}", args.name, ext);

    let mut written = vec![write_file(&outdir.join(&filename), &deck.to_string())?];

    let mut axes = args.conv_test.clone();
    axes.sort();
    axes.dedup();
    for axis in axes {
        let values = ask_sweep(input, axis)?;
        written.extend(write_sweep(outdir, &filename, &deck, axis, &values, &species)?);
    }

    Ok(written)
}

/// `--template`，否则 rc 中 `templates` 的第一项
fn template_path(args: &CreateArgs, cfg: &Section) -> Result<PathBuf> {
    let path = match (&args.template, cfg.get_list("templates").first()) {
        (Some(t), _) => t.clone(),
        (None, Some(t)) => expand_path(t),
        (None, None) => {
            return Err(TeptoolsError::InvalidArgument(
                "No template given and no templates configured".to_string(),
            ))
        }
    };

    if !path.is_file() {
        return Err(TeptoolsError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(path)
}

/// `species` 块：`label element Z -1 radius`
pub fn species_lines(species: &[Species], radius: f64) -> Result<Vec<String>> {
    species
        .iter()
        .map(|sp| {
            let z = atomic_number(sp.element)?;
            Ok(format!(
                "{:<4}{:<4}{:>3} -1 {}",
                sp.label,
                sp.element,
                z,
                format_radius(radius)
            ))
        })
        .collect()
}

/// 文件名以元素符号开头（大小写不敏感），且其后不是字母
pub fn matches_element(file_name: &str, symbol: &str) -> bool {
    let name = file_name.to_lowercase();
    let symbol = symbol.to_lowercase();
    match name.strip_prefix(&symbol) {
        Some(rest) => !rest.starts_with(|c: char| c.is_ascii_alphabetic()),
        None => false,
    }
}

/// 在 `potdir` 中查找元素的赝势文件
///
/// 唯一匹配直接使用；多个匹配时询问序号；没有匹配时询问文件名，
/// 空回答返回 `PseudopotentialNotFound`。
pub fn resolve_pseudopotential(
    potdir: &Path,
    element: &str,
    input: &mut dyn InputProvider,
) -> Result<PathBuf> {
    let entries = fs::read_dir(potdir).map_err(|e| TeptoolsError::FileReadError {
        path: potdir.display().to_string(),
        source: e,
    })?;

    let mut candidates: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| matches_element(name, element))
        .collect();
    candidates.sort();
    debug!("pseudopotentials for {}: {:?}", element, candidates);

    let chosen = match candidates.len() {
        0 => {
            let answer = input.ask(&format!(
                "No pseudopotential found for {} in {}. File name: ",
                element,
                potdir.display()
            ))?;
            if answer.is_empty() {
                return Err(TeptoolsError::PseudopotentialNotFound {
                    element: element.to_string(),
                    potdir: potdir.display().to_string(),
                });
            }
            answer
        }
        1 => candidates.remove(0),
        n => {
            println!("Pseudopotentials for {}:", element);
            for (i, name) in candidates.iter().enumerate() {
                println!("  {}) {}", i + 1, name);
            }
            let idx = ask_index(input, &format!("Choose one [1-{}, default 1]: ", n), n)?;
            candidates.swap_remove(idx)
        }
    };

    Ok(potdir.join(chosen))
}

/// 单次收敛测试最多生成的目录数
pub const MAX_SWEEP_POINTS: usize = 1000;

/// `start + i*step`，`i = 0..=round((end-start)/step)`
pub fn sweep_values(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if step.is_nan() || step <= 0.0 || end < start {
        return Err(TeptoolsError::InvalidArgument(format!(
            "Invalid range: start {} end {} step {}",
            start, end, step
        )));
    }
    let steps = ((end - start) / step).round();
    if !steps.is_finite() || steps >= MAX_SWEEP_POINTS as f64 {
        return Err(TeptoolsError::InvalidArgument(format!(
            "Range {}..{} with step {} gives more than {} values",
            start, end, step, MAX_SWEEP_POINTS
        )));
    }
    let n = steps as usize;
    Ok((0..=n).map(|i| start + i as f64 * step).collect())
}

/// 依次询问起点、终点和步长
fn ask_sweep(input: &mut dyn InputProvider, axis: ConvAxis) -> Result<Vec<f64>> {
    let unit = match axis {
        ConvAxis::Cutoff => "eV",
        ConvAxis::Radius => "bohr",
    };
    let start = ask_number(input, &format!("{} start ({}): ", axis, unit))?;
    let end = ask_number(input, &format!("{} end ({}): ", axis, unit))?;
    let step = ask_number(input, &format!("{} step ({}): ", axis, unit))?;
    sweep_values(start, end, step)
}

/// 截断能不带多余的零（`1000`、`1100.5`）
pub fn format_cutoff(value: f64) -> String {
    format!("{}", (value * 1e6).round() / 1e6)
}

/// 半径至少保留一位小数且不截断（`7.0`、`7.25`）
pub fn format_radius(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{}", rounded)
    }
}

/// 写出收敛测试：`<axis>/<file>` 为去掉扫描项的基础文件，
/// `<axis>/<value>/<file>` 引用基础文件并覆盖扫描项
fn write_sweep(
    outdir: &Path,
    filename: &str,
    deck: &InputDeck,
    axis: ConvAxis,
    values: &[f64],
    species: &[Species],
) -> Result<Vec<PathBuf>> {
    let axis_dir = outdir.join(axis.to_string());

    let mut base = deck.clone();
    match axis {
        ConvAxis::Cutoff => {
            base.remove_keyword("cutoff_energy");
        }
        ConvAxis::Radius => {
            base.remove_block("species");
        }
    }

    let mut written = vec![write_file(&axis_dir.join(filename), &base.to_string())?];

    for &value in values {
        let (label, entry) = match axis {
            ConvAxis::Cutoff => {
                let v = format_cutoff(value);
                let line = format!("cutoff_energy: {} eV\n", v);
                (v, line)
            }
            ConvAxis::Radius => {
                let mut block = InputDeck::new();
                block.set_block("species", species_lines(species, value)?);
                (format_radius(value), block.to_string())
            }
        };

        let content = format!("includefile: ../{}\n\n{}", filename, entry);
        written.push(write_file(&axis_dir.join(label).join(filename), &content)?);
    }

    Ok(written)
}

fn write_file(path: &Path, content: &str) -> Result<PathBuf> {
    let write_err = |e| TeptoolsError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, content).map_err(write_err)?;
    debug!("wrote {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigValue;
    use crate::parsers::deck::parse_deck_content;
    use tempfile::TempDir;

    const TEMPLATE: &str = r#"! WS monolayer
task : singlepoint
cutoff_energy : 500 eV
%block lattice_cart
ang
  10.0 0.0 0.0
  0.0 10.0 0.0
  0.0 0.0 10.0
%endblock lattice_cart
%block positions_abs
ang
W   0.0 0.0 0.0
S   1.0 0.0 0.0
S   2.0 0.0 0.0
%endblock positions_abs
"#;

    /// 模板、赝势目录和输出目录
    fn setup(pots: &[&str]) -> (TempDir, Section) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("template.dat"), TEMPLATE).unwrap();
        fs::create_dir(dir.path().join("pot")).unwrap();
        for pot in pots {
            fs::write(dir.path().join("pot").join(pot), "").unwrap();
        }
        fs::create_dir(dir.path().join("out")).unwrap();

        let mut cfg = create_defaults();
        cfg.set(
            "templates",
            ConfigValue::List(vec![dir.path().join("template.dat").display().to_string()]),
        );
        cfg.set("potdir", dir.path().join("pot").display().to_string().as_str());
        (dir, cfg)
    }

    fn args(conv_test: Vec<ConvAxis>) -> CreateArgs {
        CreateArgs {
            name: "WS".to_string(),
            elements: vec![],
            cell: None,
            template: None,
            potdir: None,
            cutoff: None,
            radius: None,
            conv_test,
            answers: vec![],
        }
    }

    fn subdirs(dir: &Path) -> Vec<f64> {
        let mut values: Vec<f64> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().parse().unwrap())
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values
    }

    #[test]
    fn test_matches_element() {
        assert!(matches_element("s1.pot", "S"));
        assert!(matches_element("S2.pot", "S"));
        assert!(matches_element("S.recpot", "S"));
        assert!(!matches_element("Se.pot", "S"));
        assert!(!matches_element("Sn_hard.pot", "S"));
        assert!(matches_element("w1.pot", "W"));
    }

    #[test]
    fn test_species_lines() {
        let species = vec![
            Species::from_label("W").unwrap(),
            Species::from_label("S1").unwrap(),
        ];
        assert_eq!(
            species_lines(&species, 10.0).unwrap(),
            ["W   W    74 -1 10.0", "S1  S    16 -1 10.0"]
        );
        assert!(Species::from_label("Xx").is_err());
    }

    #[test]
    fn test_sweep_values() {
        assert_eq!(sweep_values(1000.0, 1200.0, 100.0).unwrap(), [1000.0, 1100.0, 1200.0]);
        assert_eq!(sweep_values(7.0, 7.0, 0.5).unwrap(), [7.0]);
        assert!(sweep_values(1000.0, 1200.0, 0.0).is_err());
        assert!(sweep_values(1200.0, 1000.0, 100.0).is_err());
        assert_eq!(sweep_values(0.0, 999.0, 1.0).unwrap().len(), MAX_SWEEP_POINTS);
    }

    #[test]
    fn test_sweep_too_many_values() {
        assert!(matches!(
            sweep_values(7.0, 8.0, 1e-9),
            Err(TeptoolsError::InvalidArgument(_))
        ));
        assert!(sweep_values(0.0, f64::MAX, f64::MIN_POSITIVE).is_err());
    }

    #[test]
    fn test_format_radius() {
        assert_eq!(format_radius(7.0), "7.0");
        assert_eq!(format_radius(7.25), "7.25");
        assert_eq!(format_radius(7.0 + 3.0 * 0.05), "7.15");
        assert_eq!(format_radius(10.0), "10.0");
    }

    #[test]
    fn test_format_cutoff() {
        assert_eq!(format_cutoff(1000.0), "1000");
        assert_eq!(format_cutoff(1100.5), "1100.5");
        assert_eq!(format_cutoff(0.1 + 0.2), "0.3");
    }

    #[test]
    fn test_create_input_file() {
        let (dir, cfg) = setup(&["w1.pot", "S2.pot", "Se.pot"]);
        let out = dir.path().join("out");
        let mut input = ScriptedInput::new(Vec::<String>::new());

        let written = create(&args(vec![]), &cfg, &out, &mut input).unwrap();
        assert_eq!(written, [out.join("WS.dat")]);

        let deck = parse_deck_file(&out.join("WS.dat")).unwrap();
        assert_eq!(deck.keyword("task"), Some("singlepoint"));
        assert_eq!(deck.keyword("cutoff_energy"), Some("800 eV"));
        assert_eq!(
            deck.block("species").unwrap(),
            ["W   W    74 -1 8.0", "S   S    16 -1 8.0"]
        );

        let pot = dir.path().join("pot");
        assert_eq!(
            deck.block("species_pot").unwrap(),
            [
                format!("W   \"{}\"", pot.join("w1.pot").display()),
                format!("S   \"{}\"", pot.join("S2.pot").display()),
            ]
        );
        assert_eq!(deck.block("lattice_cart").unwrap().len(), 4);
    }

    #[test]
    fn test_cutoff_convergence_test() {
        let (dir, cfg) = setup(&["w1.pot", "S2.pot"]);
        let out = dir.path().join("out");
        let mut input = ScriptedInput::new(["1000", "1200", "100"]);

        create(&args(vec![ConvAxis::Cutoff]), &cfg, &out, &mut input).unwrap();

        let axis_dir = out.join("cutoff");
        assert_eq!(subdirs(&axis_dir), [1000.0, 1100.0, 1200.0]);

        // 基础文件不含扫描项
        let base = parse_deck_file(&axis_dir.join("WS.dat")).unwrap();
        assert!(base.keyword("cutoff_energy").is_none());
        assert!(base.block("species").is_some());

        for value in ["1000", "1100", "1200"] {
            let content = fs::read_to_string(axis_dir.join(value).join("WS.dat")).unwrap();
            assert_eq!(
                content,
                format!("includefile: ../WS.dat\n\ncutoff_energy: {} eV\n", value)
            );
            let deck = parse_deck_content(&content, value).unwrap();
            assert_eq!(deck.keyword("includefile"), Some("../WS.dat"));
        }
    }

    #[test]
    fn test_radius_convergence_test() {
        let (dir, cfg) = setup(&["w1.pot", "S2.pot"]);
        let out = dir.path().join("out");
        let mut input = ScriptedInput::new(["7", "8", "0.5"]);

        create(&args(vec![ConvAxis::Radius]), &cfg, &out, &mut input).unwrap();

        let axis_dir = out.join("radius");
        assert_eq!(subdirs(&axis_dir), [7.0, 7.5, 8.0]);

        let base = parse_deck_file(&axis_dir.join("WS.dat")).unwrap();
        assert!(base.block("species").is_none());
        assert_eq!(base.keyword("cutoff_energy"), Some("800 eV"));

        let deck = parse_deck_file(&axis_dir.join("7.5").join("WS.dat")).unwrap();
        assert_eq!(
            deck.block("species").unwrap(),
            ["W   W    74 -1 7.5", "S   S    16 -1 7.5"]
        );
    }

    #[test]
    fn test_radius_sweep_keeps_precision() {
        let (dir, cfg) = setup(&["w1.pot", "S2.pot"]);
        let out = dir.path().join("out");
        let mut input = ScriptedInput::new(["7", "7.5", "0.25"]);

        create(&args(vec![ConvAxis::Radius]), &cfg, &out, &mut input).unwrap();

        let axis_dir = out.join("radius");
        assert_eq!(subdirs(&axis_dir), [7.0, 7.25, 7.5]);
        assert!(axis_dir.join("7.0").is_dir());
        assert!(axis_dir.join("7.25").is_dir());

        let deck = parse_deck_file(&axis_dir.join("7.25").join("WS.dat")).unwrap();
        assert_eq!(
            deck.block("species").unwrap(),
            ["W   W    74 -1 7.25", "S   S    16 -1 7.25"]
        );
    }

    #[test]
    fn test_ambiguous_pseudopotential_asks() {
        let (dir, _) = setup(&["S_hard.pot", "S_soft.pot"]);
        let pot = dir.path().join("pot");

        let mut input = ScriptedInput::new(["2"]);
        assert_eq!(
            resolve_pseudopotential(&pot, "S", &mut input).unwrap(),
            pot.join("S_soft.pot")
        );

        // 空回答选第一个
        let mut input = ScriptedInput::new([""]);
        assert_eq!(
            resolve_pseudopotential(&pot, "S", &mut input).unwrap(),
            pot.join("S_hard.pot")
        );
    }

    #[test]
    fn test_missing_pseudopotential() {
        let (dir, _) = setup(&["Se.pot"]);
        let pot = dir.path().join("pot");

        let mut input = ScriptedInput::new([""]);
        assert!(matches!(
            resolve_pseudopotential(&pot, "S", &mut input),
            Err(TeptoolsError::PseudopotentialNotFound { .. })
        ));

        let mut input = ScriptedInput::new(["custom.recpot"]);
        assert_eq!(
            resolve_pseudopotential(&pot, "S", &mut input).unwrap(),
            pot.join("custom.recpot")
        );
    }

    #[test]
    fn test_cell_file_and_explicit_elements() {
        let (dir, cfg) = setup(&["Mo.pot", "S1.pot"]);
        let cell = dir.path().join("MoS2.cell");
        fs::write(
            &cell,
            "%BLOCK LATTICE_CART\nang\n3.2 0 0\n0 3.2 0\n0 0 20\n%ENDBLOCK LATTICE_CART\n\
             %BLOCK POSITIONS_ABS\nang\nMo 0 0 0\nS 1 1 1\n%ENDBLOCK POSITIONS_ABS\n",
        )
        .unwrap();

        let mut a = args(vec![]);
        a.cell = Some(cell);
        a.elements = vec!["Mo".to_string(), "S".to_string()];
        a.cutoff = Some(1000.0);
        a.radius = Some(9.0);

        let out = dir.path().join("out");
        let mut input = ScriptedInput::new(Vec::<String>::new());
        create(&a, &cfg, &out, &mut input).unwrap();

        let deck = parse_deck_file(&out.join("WS.dat")).unwrap();
        assert_eq!(deck.keyword("cutoff_energy"), Some("1000 eV"));
        assert_eq!(deck.block("lattice_cart").unwrap()[1], "3.2 0 0");
        assert_eq!(deck.block("positions_abs").unwrap()[1], "Mo 0 0 0");
        assert_eq!(deck.block("species").unwrap()[0], "Mo  Mo   42 -1 9.0");
    }

    #[test]
    fn test_missing_template() {
        let cfg = create_defaults();
        let mut input = ScriptedInput::new(Vec::<String>::new());
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            create(&args(vec![]), &cfg, dir.path(), &mut input),
            Err(TeptoolsError::InvalidArgument(_))
        ));
    }
}
