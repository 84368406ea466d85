//! # 作业状态模型
//!
//! 作业目录的状态由标记文件推导：错误标记文件（`*.error_message`）
//! 和带有 `Job completed` 结尾的输出文件。状态判定是纯函数，不涉及 I/O。
//!
//! ## 依赖关系
//! - 被 `commands/watch.rs` 使用

use std::fmt;

/// 作业目录中的标记文件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Markers {
    /// 存在错误标记文件
    pub have_errfile: bool,
    /// 存在已完成的输出文件
    pub have_outfile: bool,
    /// 任一标记存在
    pub completed: bool,
}

impl Markers {
    pub fn new(have_errfile: bool, have_outfile: bool) -> Self {
        Markers {
            have_errfile,
            have_outfile,
            completed: have_errfile || have_outfile,
        }
    }
}

/// 作业状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// 没有标记，等待运行
    Pending,
    /// 已启动（由本程序或外部启动），尚无标记
    Running,
    /// 存在错误标记
    Error,
    /// 输出文件已完成
    Done,
}

impl JobState {
    /// 是否为终止状态
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Error | JobState::Done)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Running => write!(f, "running"),
            JobState::Error => write!(f, "failed"),
            JobState::Done => write!(f, "successfully completed"),
        }
    }
}

/// 由标记文件判定状态；错误标记优先
pub fn classify(markers: Markers, launched: bool) -> JobState {
    if markers.have_errfile {
        JobState::Error
    } else if markers.have_outfile {
        JobState::Done
    } else if launched {
        JobState::Running
    } else {
        JobState::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_completed() {
        assert!(Markers::new(true, false).completed);
        assert!(Markers::new(false, true).completed);
        assert!(!Markers::new(false, false).completed);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(Markers::new(false, false), false), JobState::Pending);
        assert_eq!(classify(Markers::new(false, false), true), JobState::Running);
        assert_eq!(classify(Markers::new(true, false), true), JobState::Error);
        assert_eq!(classify(Markers::new(false, true), false), JobState::Done);
        // 错误标记优先于输出文件
        assert_eq!(classify(Markers::new(true, true), true), JobState::Error);
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Error.is_terminal());
        assert!(JobState::Done.is_terminal());
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
    }
}
