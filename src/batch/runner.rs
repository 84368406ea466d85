//! # 批量执行器
//!
//! 并行解析多个输出文件，结果保持输入顺序。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代
//! - 进度条显示
//!
//! ## 依赖关系
//! - 被 `commands/enerconv.rs`, `commands/geomconv.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::utils::progress;

use log::warn;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器（0 = CPU 核数）
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    /// 对每个文件执行 `processor`，返回值与 `files` 一一对应
    pub fn run<T, F>(&self, files: &[PathBuf], processor: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Path) -> T + Sync + Send,
    {
        let pb = progress::create_progress_bar(files.len() as u64, "Parsing");

        let task = || {
            files
                .par_iter()
                .map(|file| {
                    let result = processor(file.as_path());
                    pb.inc(1);
                    result
                })
                .collect::<Vec<T>>()
        };

        // 配置 rayon 线程池
        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
        {
            Ok(pool) => pool.install(task),
            Err(e) => {
                warn!("Cannot build thread pool ({}), using the global pool", e);
                task()
            }
        };

        pb.finish_and_clear();
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_keep_input_order() {
        let files: Vec<PathBuf> = (0..50).map(|i| PathBuf::from(format!("{}.out", i))).collect();

        let names = BatchRunner::new(4).run(&files, |p| p.display().to_string());

        let expected: Vec<String> = (0..50).map(|i| format!("{}.out", i)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_zero_jobs_uses_all_cpus() {
        assert_eq!(BatchRunner::new(0).jobs, num_cpus::get());
        assert_eq!(BatchRunner::new(3).jobs, 3);
    }
}
