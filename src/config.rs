//! # rc 配置文件加载
//!
//! 读取 `~/.teptoolsrc`（ini 风格，每个子命令一个 section），
//! 与各子命令的内置默认值合并。
//!
//! ## rc 文件格式
//! ```text
//! # comment
//! [run]
//! onetep = /opt/onetep/bin/onetep.v4 /opt/onetep/bin/onetep.v5
//! outfile_ext = out
//!
//! [watch]
//! interval = 30
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `error.rs`

use crate::error::{Result, TeptoolsError};
use log::{debug, trace};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 随程序分发的默认 rc 文件
pub const DEFAULT_RC: &str = include_str!("../teptoolsrc.default");

/// rc 文件名
pub const RC_FILENAME: &str = ".teptoolsrc";

/// 配置项取值，类型由默认值决定
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Str(String),
    List(Vec<String>),
    Bool(bool),
    Number(f64),
}

impl ConfigValue {
    /// 按当前值的类型转换 rc 文件中的原始字符串
    fn coerce(&self, raw: &str) -> Option<ConfigValue> {
        let raw = raw.trim();
        match self {
            ConfigValue::Str(_) => Some(ConfigValue::Str(raw.to_string())),
            ConfigValue::List(_) => Some(ConfigValue::List(
                raw.split_whitespace().map(|s| s.to_string()).collect(),
            )),
            ConfigValue::Bool(_) => match raw.to_lowercase().as_str() {
                "yes" | "true" | "on" | "1" => Some(ConfigValue::Bool(true)),
                "no" | "false" | "off" | "0" => Some(ConfigValue::Bool(false)),
                _ => None,
            },
            ConfigValue::Number(_) => raw.parse().ok().map(ConfigValue::Number),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Str(s.to_string())
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Number(v)
    }
}

/// 某个子命令的配置（选项名 -> 值）
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    name: String,
    values: BTreeMap<String, ConfigValue>,
}

impl Section {
    /// 用默认值创建 section
    pub fn new<I, V>(name: &str, defaults: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<ConfigValue>,
    {
        Section {
            name: name.to_string(),
            values: defaults
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        }
    }

    /// 所有选项名（有序）
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// 覆盖某一选项
    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get_str(&self, key: &str) -> &str {
        match self.values.get(key) {
            Some(ConfigValue::Str(s)) => s,
            _ => "",
        }
    }

    pub fn get_list(&self, key: &str) -> &[String] {
        match self.values.get(key) {
            Some(ConfigValue::List(v)) => v,
            _ => &[],
        }
    }

    #[cfg(test)]
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(ConfigValue::Bool(true)))
    }

    pub fn get_number(&self, key: &str) -> f64 {
        match self.values.get(key) {
            Some(ConfigValue::Number(v)) => *v,
            _ => 0.0,
        }
    }
}

/// 默认 rc 文件路径 `$HOME/.teptoolsrc`（`--rcfile` / `TEPTOOLSRC` 可覆盖）
pub fn default_rcfile() -> PathBuf {
    home_dir().join(RC_FILENAME)
}

/// 用户主目录（未设置 HOME 时退回当前目录）
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 展开路径开头的 `~` 和其中的 `$VAR` / `${VAR}`；未定义的变量保持原样
pub fn expand_path(raw: &str) -> PathBuf {
    let mut expanded = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            expanded.push(c);
            continue;
        }
        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }
        let mut name = String::new();
        while let Some(&n) = chars.peek() {
            if n.is_ascii_alphanumeric() || n == '_' {
                name.push(n);
                chars.next();
            } else {
                break;
            }
        }
        if braced && chars.peek() == Some(&'}') {
            chars.next();
        }
        match std::env::var(&name) {
            Ok(value) if !name.is_empty() => expanded.push_str(&value),
            _ if braced => expanded.push_str(&format!("${{{}}}", name)),
            _ => expanded.push_str(&format!("${}", name)),
        }
    }

    if expanded == "~" {
        return home_dir();
    }
    match expanded.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(expanded),
    }
}

/// 读取 rc 文件中的 `section`，覆盖默认值
///
/// rc 文件不存在时原样返回默认值；未知 section 同样返回默认值；
/// 默认值中没有的选项被忽略。
pub fn load_config(rcfile: &Path, defaults: Section) -> Result<Section> {
    if !rcfile.is_file() {
        debug!("rc file {} not found, using defaults", rcfile.display());
        return Ok(defaults);
    }

    let content = fs::read_to_string(rcfile).map_err(|e| TeptoolsError::FileReadError {
        path: rcfile.display().to_string(),
        source: e,
    })?;

    merge_section(&parse_rc(&content), defaults)
}

/// 将解析后的 rc 内容合并进默认 section
pub fn merge_section(
    rc: &BTreeMap<String, BTreeMap<String, String>>,
    mut defaults: Section,
) -> Result<Section> {
    let Some(options) = rc.get(&defaults.name) else {
        return Ok(defaults);
    };

    for (key, current) in defaults.values.iter_mut() {
        if let Some(raw) = options.get(key) {
            *current = current.coerce(raw).ok_or_else(|| TeptoolsError::ConfigError {
                section: defaults.name.clone(),
                option: key.clone(),
                value: raw.clone(),
            })?;
            trace!("[{}] {} = {:?}", defaults.name, key, current);
        }
    }

    Ok(defaults)
}

/// 解析 ini 风格文本：section -> (option -> 原始值)
pub fn parse_rc(content: &str) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_lowercase();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some(section) = current.as_ref() else {
            continue;
        };

        let split_at = line.find(['=', ':']);
        let (key, value) = match split_at {
            Some(pos) => (&line[..pos], &line[pos + 1..]),
            None => (line, ""),
        };

        if let Some(options) = sections.get_mut(section) {
            options.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    sections
}

// ─────────────────────────────────────────────────────────────
// 各子命令的内置默认值
// ─────────────────────────────────────────────────────────────

pub fn create_defaults() -> Section {
    let mut s = Section::new("create", [("potdir", ""), ("inpfile_ext", "dat")]);
    s.set("templates", ConfigValue::List(vec![]));
    s.set("cutoff_energy", 800.0);
    s.set("ngwf_radius", 8.0);
    s
}

pub fn check_defaults() -> Section {
    Section::new("check", [("inpfile_ext", "dat")])
}

pub fn enerconv_defaults() -> Section {
    Section::new("enerconv", [("outfile_ext", "out")])
}

pub fn geomconv_defaults() -> Section {
    Section::new("geomconv", [("outfile_ext", "out")])
}

pub fn run_defaults() -> Section {
    let mut s = Section::new("run", [("inpfile_ext", "dat"), ("outfile_ext", "out")]);
    s.set("onetep", ConfigValue::List(vec![]));
    s
}

pub fn watch_defaults() -> Section {
    let mut s = Section::new(
        "watch",
        [
            ("inpfile_ext", "dat"),
            ("outfile_ext", "out"),
            ("errfile_ext", "error_message"),
            ("email", ""),
        ],
    );
    s.set("interval", 60.0);
    s.set("max_jobs", 0.0);
    s.set("onetep", ConfigValue::List(vec![]));
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RC: &str = r#"
# user configuration
[summarise]
options = --vimdiff -wo
outfile_ext = ext

[geomconv]
outfile_ext: ext

[emptysection]
empty_setting = empty

[create]
templates = create.dat
potdir = pot
unknown_option = ignored

[watch]
interval = 0.5
Email = someone@example.com
"#;

    fn write_rc(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_overrides_keep_default_keys() {
        let rc = write_rc(RC);

        let mut defaults = Section::new("summarise", [("outfile_ext", "out")]);
        defaults.set("options", ConfigValue::List(vec![]));
        let cfg = load_config(rc.path(), defaults.clone()).unwrap();

        assert_eq!(cfg.keys().collect::<Vec<_>>(), defaults.keys().collect::<Vec<_>>());
        assert_eq!(cfg.get_list("options"), ["--vimdiff", "-wo"]);
        assert_eq!(cfg.get_str("outfile_ext"), "ext");
    }

    #[test]
    fn test_colon_separator_and_empty_default() {
        let rc = write_rc(RC);

        let cfg = load_config(rc.path(), geomconv_defaults()).unwrap();
        assert_eq!(cfg.get_str("outfile_ext"), "ext");

        let cfg = load_config(rc.path(), Section::new("emptysection", [("empty_setting", "")]))
            .unwrap();
        assert_eq!(cfg.get_str("empty_setting"), "empty");
    }

    #[test]
    fn test_unknown_rc_options_are_ignored() {
        let rc = write_rc(RC);
        let cfg = load_config(rc.path(), create_defaults()).unwrap();

        assert_eq!(cfg.get_list("templates"), ["create.dat"]);
        assert_eq!(cfg.get_str("potdir"), "pot");
        assert_eq!(cfg.get_number("cutoff_energy"), 800.0);
        assert!(cfg.get("unknown_option").is_none());
    }

    #[test]
    fn test_number_coercion_and_case_insensitive_keys() {
        let rc = write_rc(RC);
        let cfg = load_config(rc.path(), watch_defaults()).unwrap();

        assert_eq!(cfg.get_number("interval"), 0.5);
        assert_eq!(cfg.get_str("email"), "someone@example.com");
        assert_eq!(cfg.get_number("max_jobs"), 0.0);
    }

    #[test]
    fn test_missing_rc_and_unknown_section_give_defaults() {
        let cfg = load_config(Path::new("/nonexistent/teptoolsrc"), run_defaults()).unwrap();
        assert_eq!(cfg, run_defaults());

        let rc = write_rc(RC);
        let cfg = load_config(rc.path(), check_defaults()).unwrap();
        assert_eq!(cfg, check_defaults());
    }

    #[test]
    fn test_bool_coercion() {
        let rc = write_rc("[flags]\nverbose = Yes\nquiet = off\nbroken = maybe\n");

        let cfg = load_config(
            rc.path(),
            Section::new("flags", [("verbose", false), ("quiet", true)]),
        )
        .unwrap();
        assert!(cfg.get_bool("verbose"));
        assert!(!cfg.get_bool("quiet"));

        let err = load_config(rc.path(), Section::new("flags", [("broken", true)]));
        assert!(matches!(err, Err(TeptoolsError::ConfigError { .. })));
    }

    #[test]
    fn test_expand_path() {
        let home = home_dir();
        assert_eq!(expand_path("~"), home);
        assert_eq!(expand_path("~/.teptools"), home.join(".teptools"));
        assert_eq!(expand_path("/opt/onetep"), PathBuf::from("/opt/onetep"));
        assert_eq!(
            expand_path("$TEPTOOLS_SURELY_UNDEFINED_VAR/x"),
            PathBuf::from("$TEPTOOLS_SURELY_UNDEFINED_VAR/x")
        );
        if let Ok(raw_home) = std::env::var("HOME") {
            assert_eq!(expand_path("${HOME}/bin"), PathBuf::from(format!("{}/bin", raw_home)));
        }
    }

    #[test]
    fn test_default_rc_is_parseable() {
        let rc = parse_rc(DEFAULT_RC);
        for section in ["create", "check", "enerconv", "geomconv", "run", "watch"] {
            assert!(rc.contains_key(section), "missing [{}]", section);
        }
        assert!(merge_section(&rc, watch_defaults()).is_ok());
        assert!(merge_section(&rc, create_defaults()).is_ok());
    }
}
