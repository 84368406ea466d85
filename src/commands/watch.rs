//! # watch 命令实现
//!
//! 监控一组作业目录：启动等待中的作业（不超过 `max_jobs` 个），
//! 记录每个作业的结束状态，可选发送邮件通知。
//!
//! ## 作业状态
//! ```text
//! Pending ──launch──> Running ──*.error_message──> Error
//!                            └──*.out + Job completed──> Done
//! ```
//! 本程序启动的进程结束时没有留下任何标记，视为失败。
//! 进程在写出标记后仍可能运行一段时间：在被回收之前它继续占用
//! `max_jobs` 的名额，监控也不会结束。
//!
//! ## 日志文件
//! `teptools-<DDMMYYYY-HHMM>.log`，每个结束的作业一行：
//! ```text
//! [2024-03-01 12:00:00] cutoff/1000 successfully completed
//! [2024-03-01 12:05:00] cutoff/1100 failed
//! ```
//!
//! ## 依赖关系
//! - 使用 `cli/watch.rs` 定义的参数
//! - 使用 `models/job.rs` 判定状态，`utils/process.rs` 启动 ONETEP
//! - 使用 `batch/collector.rs` 查找作业目录
//! - 使用 `chrono` 生成时间戳

use crate::batch::{first_file_in, unique_path, FileCollector};
use crate::cli::watch::WatchArgs;
use crate::config::{self, watch_defaults, Section};
use crate::error::{Result, TeptoolsError};
use crate::models::{classify, JobState, Markers};
use crate::parsers::onetep_out::is_completed_output;
use crate::utils::output;
use crate::utils::process::{onetep_command, resolve_executable};
use crate::utils::progress::create_spinner;

use chrono::Local;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// 执行 watch 命令
pub fn execute(args: WatchArgs, rcfile: &Path) -> Result<()> {
    let mut cfg = config::load_config(rcfile, watch_defaults())?;
    if let Some(interval) = args.interval {
        cfg.set("interval", interval);
    }
    if let Some(max_jobs) = args.max_jobs {
        cfg.set("max_jobs", max_jobs as f64);
    }
    if let Some(email) = &args.email {
        cfg.set("email", email.as_str());
    }

    output::print_header("ONETEP Job Watch");
    let settings = WatchSettings::from_section(&cfg)?;

    // 只监控时不需要可执行文件
    let exe = if settings.max_jobs > 0 {
        Some(resolve_executable(cfg.get_list("onetep"), args.onetep_version)?)
    } else {
        None
    };
    let launcher = ProcessLauncher::new(exe, &settings.outfile_ext);

    let notifier: Box<dyn Notifier> = match cfg.get_str("email") {
        "" => Box::new(Silent),
        address => Box::new(MailNotifier::new(address)),
    };

    let collector =
        FileCollector::new(&args.dirs, &settings.inpfile_ext).recursive(args.recursive);
    let dirs = collector.collect_dirs()?;
    if dirs.is_empty() && !args.follow {
        output::print_warning("No job directories found.");
        return Ok(());
    }

    let log_path = PathBuf::from(Local::now().format("teptools-%d%m%Y-%H%M.log").to_string());
    output::print_info(&format!(
        "Watching {} directories, logging to {}",
        dirs.len(),
        log_path.display()
    ));

    let mut watch = Watch::new(dirs, settings, launcher, notifier, log_path);
    if args.follow {
        watch = watch.follow(collector);
    }
    watch.run()
}

// ─────────────────────────────────────────────────────────────
// 设置
// ─────────────────────────────────────────────────────────────

/// watch 的运行参数（由 rc 和命令行合并而来）
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub inpfile_ext: String,
    pub outfile_ext: String,
    pub errfile_ext: String,
    pub interval: Duration,
    pub max_jobs: usize,
}

impl WatchSettings {
    pub fn from_section(cfg: &Section) -> Result<Self> {
        let interval = cfg.get_number("interval");
        if !interval.is_finite() || interval < 0.0 {
            return Err(TeptoolsError::InvalidArgument(format!(
                "interval must be a non-negative number of seconds, got {}",
                interval
            )));
        }
        let interval = Duration::try_from_secs_f64(interval).map_err(|e| {
            TeptoolsError::InvalidArgument(format!("interval {} is out of range: {}", interval, e))
        })?;
        let max_jobs = cfg.get_number("max_jobs");
        if !max_jobs.is_finite() || max_jobs < 0.0 {
            return Err(TeptoolsError::InvalidArgument(format!(
                "max_jobs must be a non-negative integer, got {}",
                max_jobs
            )));
        }

        Ok(WatchSettings {
            inpfile_ext: cfg.get_str("inpfile_ext").to_string(),
            outfile_ext: cfg.get_str("outfile_ext").to_string(),
            errfile_ext: cfg.get_str("errfile_ext").to_string(),
            interval,
            max_jobs: max_jobs as usize,
        })
    }
}

// ─────────────────────────────────────────────────────────────
// 启动与通知
// ─────────────────────────────────────────────────────────────

/// 启动作业并查询其进程是否结束
pub trait JobLauncher {
    /// 在 `dir` 中以 `input` 启动作业
    fn launch(&mut self, dir: &Path, input: &Path) -> Result<()>;

    /// 作业进程已结束时返回是否成功退出；仍在运行或未知返回 `None`
    fn exited(&mut self, dir: &Path) -> Option<bool>;
}

/// 以子进程运行 ONETEP，输出写入作业目录下的 `<input>.<outfile_ext>`
pub struct ProcessLauncher {
    exe: Option<PathBuf>,
    outfile_ext: String,
    children: HashMap<PathBuf, Child>,
}

impl ProcessLauncher {
    pub fn new(exe: Option<PathBuf>, outfile_ext: &str) -> Self {
        ProcessLauncher {
            exe,
            outfile_ext: outfile_ext.to_string(),
            children: HashMap::new(),
        }
    }
}

impl JobLauncher for ProcessLauncher {
    fn launch(&mut self, dir: &Path, input: &Path) -> Result<()> {
        let exe = self.exe.as_ref().ok_or(TeptoolsError::ExecutableNotSet)?;
        let name = input
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| TeptoolsError::InvalidArgument(input.display().to_string()))?;
        let stem = input
            .file_stem()
            .map(|s| dir.join(s))
            .ok_or_else(|| TeptoolsError::InvalidArgument(input.display().to_string()))?;
        let outfile = unique_path(&stem, &self.outfile_ext);

        let child = onetep_command(exe, &name, Some(dir), Some(&outfile))?
            .spawn()
            .map_err(|e| TeptoolsError::SpawnFailed {
                command: format!("{} {}", exe.display(), name.display()),
                source: e,
            })?;

        debug!("started pid {} in {}", child.id(), dir.display());
        self.children.insert(dir.to_path_buf(), child);
        Ok(())
    }

    fn exited(&mut self, dir: &Path) -> Option<bool> {
        let child = self.children.get_mut(dir)?;
        let success = match child.try_wait() {
            Ok(Some(status)) => {
                debug!("{} exited with {}", dir.display(), status);
                status.success()
            }
            Ok(None) => return None,
            Err(e) => {
                warn!("Cannot query job in {}: {}", dir.display(), e);
                false
            }
        };
        self.children.remove(dir);
        Some(success)
    }
}

/// 作业结束通知
pub trait Notifier {
    fn notify(&mut self, subject: &str, body: &str) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self, subject: &str, body: &str) -> Result<()> {
        (**self).notify(subject, body)
    }
}

/// 不发送通知
pub struct Silent;

impl Notifier for Silent {
    fn notify(&mut self, _subject: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}

/// 通过系统 `mail` 命令发送邮件
pub struct MailNotifier {
    address: String,
}

impl MailNotifier {
    pub fn new(address: &str) -> Self {
        MailNotifier {
            address: address.to_string(),
        }
    }
}

impl Notifier for MailNotifier {
    fn notify(&mut self, subject: &str, body: &str) -> Result<()> {
        let command = format!("mail -s \"{}\" {}", subject, self.address);
        let mut child = Command::new("mail")
            .arg("-s")
            .arg(subject)
            .arg(&self.address)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TeptoolsError::SpawnFailed {
                command: command.clone(),
                source: e,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            writeln!(stdin, "{}", body).map_err(|e| TeptoolsError::SpawnFailed {
                command: command.clone(),
                source: e,
            })?;
        }

        let out = child
            .wait_with_output()
            .map_err(|e| TeptoolsError::SpawnFailed {
                command: command.clone(),
                source: e,
            })?;
        if !out.status.success() {
            return Err(TeptoolsError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// 监控循环
// ─────────────────────────────────────────────────────────────

/// 一次扫描的结果
#[derive(Debug, Default)]
pub struct Poll {
    /// 本次新结束的作业
    pub events: Vec<(PathBuf, JobState)>,
    pub running: usize,
    pub pending: usize,
}

impl Poll {
    /// 所有作业均已结束
    pub fn all_finished(&self) -> bool {
        self.running == 0 && self.pending == 0
    }
}

/// 作业目录监控器
pub struct Watch<L, N> {
    dirs: Vec<PathBuf>,
    settings: WatchSettings,
    launcher: L,
    notifier: N,
    log_path: PathBuf,
    /// 本程序启动的作业
    launched: HashSet<PathBuf>,
    /// 已启动但进程尚未回收的作业
    alive: HashSet<PathBuf>,
    /// 已处于终止状态的作业（不再检查）
    finished: HashSet<PathBuf>,
    /// `--follow` 时每次扫描重新查找目录
    discover: Option<FileCollector>,
}

impl<L: JobLauncher, N: Notifier> Watch<L, N> {
    /// 创建监控器；此时已结束的作业不会被记录
    pub fn new(
        dirs: Vec<PathBuf>,
        settings: WatchSettings,
        launcher: L,
        notifier: N,
        log_path: PathBuf,
    ) -> Self {
        let mut watch = Watch {
            dirs: Vec::new(),
            settings,
            launcher,
            notifier,
            log_path,
            launched: HashSet::new(),
            alive: HashSet::new(),
            finished: HashSet::new(),
            discover: None,
        };
        for dir in dirs {
            watch.track(dir);
        }
        watch
    }

    /// 每次扫描时重新查找作业目录，永不自行结束
    pub fn follow(mut self, collector: FileCollector) -> Self {
        self.discover = Some(collector);
        self
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn track(&mut self, dir: PathBuf) {
        if self.dirs.contains(&dir) {
            return;
        }
        let markers = dir_markers(&dir, &self.settings);
        if classify(markers, false).is_terminal() {
            debug!("{} already finished", dir.display());
            self.finished.insert(dir.clone());
        }
        self.dirs.push(dir);
    }

    /// 每个目录的标记文件（按目录顺序）
    pub fn process_dirs(&self) -> Vec<Markers> {
        self.dirs
            .iter()
            .map(|dir| dir_markers(dir, &self.settings))
            .collect()
    }

    /// 扫描一次：记录新结束的作业，然后启动等待中的作业
    pub fn poll(&mut self) -> Result<Poll> {
        if let Some(collector) = &self.discover {
            let found = collector.collect_dirs()?;
            for dir in found {
                if !self.dirs.contains(&dir) {
                    info!("New job directory {}", dir.display());
                    self.track(dir);
                }
            }
        }

        // 先查询进程再读标记，避免进程刚写完输出就被判为失败
        let mut exited = HashSet::new();
        let alive: Vec<PathBuf> = self.alive.iter().cloned().collect();
        for dir in alive {
            if self.launcher.exited(&dir).is_some() {
                self.alive.remove(&dir);
                exited.insert(dir);
            }
        }

        let mut poll = Poll::default();
        let mut pending = Vec::new();

        let dirs = self.dirs.clone();
        for (dir, markers) in dirs.iter().zip(self.process_dirs()) {
            if self.finished.contains(dir) {
                continue;
            }

            let mut state = classify(markers, self.launched.contains(dir));
            if state == JobState::Running && exited.contains(dir) {
                state = JobState::Error;
            }

            match state {
                JobState::Error | JobState::Done => self.finish(dir, state, &mut poll)?,
                JobState::Running => poll.running += 1,
                JobState::Pending => pending.push(dir.clone()),
            }
        }

        // 已有标记但进程仍在运行
        poll.running += self.alive.iter().filter(|d| self.finished.contains(*d)).count();

        // max_jobs = 0 时等待中的作业视为由外部运行
        if self.settings.max_jobs == 0 {
            poll.running += pending.len();
            return Ok(poll);
        }

        for dir in pending {
            if poll.running >= self.settings.max_jobs {
                poll.pending += 1;
                continue;
            }
            match self.start(&dir) {
                Ok(()) => {
                    self.launched.insert(dir.clone());
                    self.alive.insert(dir);
                    poll.running += 1;
                }
                Err(e) => {
                    warn!("{}: {}", dir.display(), e);
                    self.finish(&dir, JobState::Error, &mut poll)?;
                }
            }
        }

        Ok(poll)
    }

    fn start(&mut self, dir: &Path) -> Result<()> {
        let input = first_file_in(dir, &self.settings.inpfile_ext).ok_or(TeptoolsError::NoInputFile)?;
        info!("Launching {} in {}", input.display(), dir.display());
        self.launcher.launch(dir, &input)
    }

    /// 记录结束的作业：写日志、发送通知
    fn finish(&mut self, dir: &Path, state: JobState, poll: &mut Poll) -> Result<()> {
        self.finished.insert(dir.to_path_buf());

        let line = format!(
            "[{}] {} {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            dir.display(),
            state
        );
        append_line(&self.log_path, &line)?;

        let subject = format!("teptools: {} {}", dir.display(), state);
        if let Err(e) = self.notifier.notify(&subject, &line) {
            output::print_warning(&format!("Notification failed: {}", e));
        }

        poll.events.push((dir.to_path_buf(), state));
        Ok(())
    }

    /// 扫描直到所有作业结束（`--follow` 时一直运行）
    pub fn run(&mut self) -> Result<()> {
        let pb = create_spinner("Watching jobs");

        loop {
            let poll = self.poll()?;
            for (dir, state) in &poll.events {
                pb.suspend(|| output::print_job_state(&dir.display().to_string(), *state));
            }
            pb.set_message(format!(
                "{} running, {} pending, {} finished",
                poll.running,
                poll.pending,
                self.finished.len()
            ));

            if self.discover.is_none() && poll.all_finished() {
                break;
            }
            std::thread::sleep(self.settings.interval);
        }

        pb.finish_and_clear();
        output::print_success("All jobs finished.");
        Ok(())
    }
}

/// 目录中的错误标记和已完成的输出文件
pub fn dir_markers(dir: &Path, settings: &WatchSettings) -> Markers {
    let have_errfile = !files_with_extension(dir, &settings.errfile_ext).is_empty();
    let have_outfile = files_with_extension(dir, &settings.outfile_ext)
        .iter()
        .any(|p| is_completed_output(p));
    Markers::new(have_errfile, have_outfile)
}

fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().and_then(|x| x.to_str()) == Some(extension))
            .collect(),
        Err(e) => {
            debug!("Cannot read {}: {}", dir.display(), e);
            Vec::new()
        }
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let write_err = |e| TeptoolsError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    writeln!(file, "{}", line).map_err(write_err)
}
