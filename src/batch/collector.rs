//! # 文件收集器
//!
//! 根据命令行参数（文件、目录、glob 模式）收集待处理文件或作业目录。
//!
//! ## 功能
//! - 单文件原样保留
//! - 目录展开为 `<dir>/*.<ext>`
//! - glob 模式匹配（匹配到的目录同样展开）
//! - 查找含输入文件的作业目录，可递归
//! - 生成不覆盖已有文件的输出文件名
//!
//! ## 依赖关系
//! - 被 `commands/` 各模块调用
//! - 使用 `glob` 匹配模式，`walkdir` 递归遍历目录

use crate::error::{Result, TeptoolsError};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 命令行参数（路径或 glob 模式）
    args: Vec<String>,
    /// 要求的扩展名（不含点）
    extension: String,
    /// 查找作业目录时是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器；没有参数时使用当前目录
    pub fn new(args: &[String], extension: &str) -> Self {
        Self {
            args: args.to_vec(),
            extension: extension.trim_start_matches('.').to_string(),
            recursive: false,
        }
    }

    /// 设置是否递归搜索作业目录
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件（排序、去重）
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        if self.args.is_empty() {
            files.extend(self.files_in_dir(Path::new(".")));
        }

        for arg in &self.args {
            let path = Path::new(arg);
            if path.is_file() {
                files.push(path.to_path_buf());
                continue;
            }
            if path.is_dir() {
                files.extend(self.files_in_dir(path));
                continue;
            }

            let explicit_ext = pattern_has_extension(arg);
            for matched in expand_glob(arg)? {
                if matched.is_dir() {
                    files.extend(self.files_in_dir(&matched));
                } else if matched.is_file() && (explicit_ext || self.has_extension(&matched)) {
                    files.push(matched);
                }
            }
        }

        files.sort();
        files.dedup();
        debug!("collected {} .{} files", files.len(), self.extension);
        Ok(files)
    }

    /// 收集含有 `*.<ext>` 输入文件的作业目录（排序、去重）
    ///
    /// 没有参数时只考虑当前目录，并以 `./` 表示。
    pub fn collect_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut candidates = Vec::new();

        if self.args.is_empty() {
            candidates.push(PathBuf::from("./"));
        }

        for arg in &self.args {
            let path = Path::new(arg);
            if path.is_dir() {
                candidates.push(path.to_path_buf());
                continue;
            }
            if path.exists() {
                continue;
            }
            candidates.extend(expand_glob(arg)?.into_iter().filter(|p| p.is_dir()));
        }

        let mut dirs = Vec::new();
        for candidate in candidates {
            if self.recursive {
                dirs.extend(
                    WalkDir::new(&candidate)
                        .into_iter()
                        .filter_map(|e| e.ok())
                        .filter(|e| e.file_type().is_dir())
                        .map(|e| e.into_path())
                        .filter(|p| self.has_input(p)),
                );
            } else if self.has_input(&candidate) {
                dirs.push(candidate);
            }
        }

        dirs.sort();
        dirs.dedup();
        Ok(dirs)
    }

    /// 目录下（不递归）扩展名匹配的文件
    fn files_in_dir(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read directory {}: {}", dir.display(), e);
                return vec![];
            }
        };

        let bare = dir == Path::new(".");
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && self.has_extension(p))
            .map(|p| match (bare, p.file_name()) {
                (true, Some(name)) => PathBuf::from(name),
                _ => p,
            })
            .collect()
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
    }

    fn has_input(&self, dir: &Path) -> bool {
        !self.files_in_dir(dir).is_empty()
    }
}

/// 收集匹配扩展名的文件（`FileCollector` 的便捷入口）
pub fn find_files(args: &[String], extension: &str) -> Result<Vec<PathBuf>> {
    FileCollector::new(args, extension).collect_files()
}

/// 目录下第一个（按名称排序）扩展名匹配的文件
pub fn first_file_in(dir: &Path, extension: &str) -> Option<PathBuf> {
    let mut files = FileCollector::new(&[], extension).files_in_dir(dir);
    files.sort();
    files.into_iter().next()
}

/// 返回不存在的文件名：`stem.ext`、`stem_1.ext`、`stem_2.ext` …
pub fn unique_path(stem: &Path, extension: &str) -> PathBuf {
    let name = stem
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let first = stem.with_file_name(format!("{}.{}", name, extension));
    if !first.exists() {
        return first;
    }

    (1..)
        .map(|i| stem.with_file_name(format!("{}_{}.{}", name, i, extension)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// glob 展开；无法读取的条目被跳过
fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| TeptoolsError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let matched: Vec<PathBuf> = paths.filter_map(|p| p.ok()).collect();
    if matched.is_empty() {
        warn!("No match for '{}'", pattern);
    }
    Ok(matched)
}

/// 模式的最后一段是否显式给出扩展名（如 `*.in`）
fn pattern_has_extension(pattern: &str) -> bool {
    Path::new(pattern)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.contains('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// tests/fixtures/{one.out, two.in, three.dat} 以及 tests/helpers.txt
    fn fixtures() -> (TempDir, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let tests = root.path().join("tests");
        let fixtures = tests.join("fixtures");
        fs::create_dir_all(&fixtures).unwrap();
        for name in ["one.out", "two.in", "three.dat"] {
            fs::write(fixtures.join(name), "").unwrap();
        }
        fs::write(tests.join("helpers.txt"), "").unwrap();
        (root, fixtures)
    }

    fn arg(p: &Path) -> String {
        p.display().to_string()
    }

    #[test]
    fn test_directory_expands_to_extension() {
        let (_root, fixtures) = fixtures();
        let files = find_files(&[arg(&fixtures)], "out").unwrap();
        assert_eq!(files, [fixtures.join("one.out")]);
    }

    #[test]
    fn test_explicit_extension_in_pattern() {
        let (_root, fixtures) = fixtures();
        let files = find_files(&[arg(&fixtures.join("*.in"))], "out").unwrap();
        assert_eq!(files, [fixtures.join("two.in")]);
    }

    #[test]
    fn test_wildcard_matches_directories_only_by_extension() {
        let (root, fixtures) = fixtures();
        let files = find_files(&[arg(&root.path().join("tests").join("*"))], "out").unwrap();
        assert_eq!(files, [fixtures.join("one.out")]);
    }

    #[test]
    fn test_overlapping_arguments_are_deduplicated() {
        let (_root, fixtures) = fixtures();
        fs::write(fixtures.join("four.out"), "").unwrap();

        let args = [
            arg(&fixtures),
            arg(&fixtures.join("*.out")),
            arg(&fixtures.join("one.out")),
        ];
        let files = find_files(&args, "out").unwrap();
        assert_eq!(files, [fixtures.join("four.out"), fixtures.join("one.out")]);
    }

    #[test]
    fn test_explicit_file_kept_regardless_of_extension() {
        let (_root, fixtures) = fixtures();
        let files = find_files(&[arg(&fixtures.join("three.dat"))], "out").unwrap();
        assert_eq!(files, [fixtures.join("three.dat")]);
    }

    #[test]
    fn test_collect_dirs() {
        let root = tempfile::tempdir().unwrap();
        let watch1 = root.path().join("watch1");
        let watch2 = root.path().join("watch2");
        fs::create_dir(&watch1).unwrap();
        fs::create_dir(&watch2).unwrap();
        fs::write(watch1.join("onetep.dat"), "").unwrap();
        fs::write(root.path().join("watch3"), "").unwrap();

        for pattern in ["*", "watch*", "watch1"] {
            let dirs = FileCollector::new(&[arg(&root.path().join(pattern))], "dat")
                .collect_dirs()
                .unwrap();
            assert_eq!(dirs, [watch1.clone()], "pattern {}", pattern);
        }
    }

    #[test]
    fn test_collect_dirs_recursive() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("cutoff").join("1000");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("WS.dat"), "").unwrap();

        let flat = FileCollector::new(&[arg(root.path())], "dat")
            .collect_dirs()
            .unwrap();
        assert!(flat.is_empty());

        let deep = FileCollector::new(&[arg(root.path())], "dat")
            .recursive(true)
            .collect_dirs()
            .unwrap();
        assert_eq!(deep, [nested]);
    }

    #[test]
    fn test_unique_path() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("one");

        let first = unique_path(&stem, "summary");
        assert_eq!(first, dir.path().join("one.summary"));
        fs::write(&first, "").unwrap();

        let second = unique_path(&stem, "summary");
        assert_eq!(second, dir.path().join("one_1.summary"));
        fs::write(&second, "").unwrap();

        assert_eq!(unique_path(&stem, "summary"), dir.path().join("one_2.summary"));
    }

    #[test]
    fn test_first_file_in() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.dat"), "").unwrap();
        fs::write(dir.path().join("a.dat"), "").unwrap();

        assert_eq!(first_file_in(dir.path(), "dat"), Some(dir.path().join("a.dat")));
        assert_eq!(first_file_in(dir.path(), "out"), None);
    }
}
