//! Centralized logging for the video subsystem.
//!
//! # Architecture
//!
//! - **LogConfig**: process-wide configuration held in atomics
//! - **LogLevel**: Off < Error < Warn < Info < Debug < Trace
//! - **LogCategory**: Timing, Sprites, Registers, Interrupts, Frame
//! - **log()**: the single entry point; the message closure only runs when the
//!   category is enabled and under its rate limit
//!
//! A category level set to `Off` defers to the global level.
//!
//! # Configuration
//!
//! Levels can be set one by one or from a filter string, the same syntax a
//! config file or command line would carry:
//!
//! ```rust
//! use emu_core::logging::{LogCategory, LogConfig, LogLevel};
//!
//! let config = LogConfig::global();
//! config.apply_filter("warn,timing=debug,sprites=trace").unwrap();
//! assert!(config.should_log(LogCategory::Timing, LogLevel::Debug));
//! assert!(!config.should_log(LogCategory::Frame, LogLevel::Info));
//! config.reset();
//! ```
//!
//! # Output
//!
//! Messages go to stderr, or to a file written by a background thread once
//! `set_log_file` succeeds. The emulation thread only pushes into a channel.
//!
//! ```rust
//! use emu_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Timing, LogLevel::Debug, || {
//!     format!("line {} dot {}", 144, 0)
//! });
//! ```

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

const CATEGORY_COUNT: usize = 5;

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// What part of the video pipeline a message comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Mode transitions, line/dot sequencing, latches
    Timing,
    /// OAM scan and per-line sprite selection
    Sprites,
    /// Register store reads/writes, unmapped accesses
    Registers,
    /// VBlank / LCD-status requests
    Interrupts,
    /// Frame presentation
    Frame,
}

impl LogCategory {
    pub const ALL: [LogCategory; CATEGORY_COUNT] = [
        LogCategory::Timing,
        LogCategory::Sprites,
        LogCategory::Registers,
        LogCategory::Interrupts,
        LogCategory::Frame,
    ];

    fn index(self) -> usize {
        match self {
            LogCategory::Timing => 0,
            LogCategory::Sprites => 1,
            LogCategory::Registers => 2,
            LogCategory::Interrupts => 3,
            LogCategory::Frame => 4,
        }
    }

    /// Parse the lowercase name used in filter strings.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "timing" | "ppu" => Some(LogCategory::Timing),
            "sprites" | "oam" => Some(LogCategory::Sprites),
            "registers" | "regs" | "bus" => Some(LogCategory::Registers),
            "interrupts" | "irq" => Some(LogCategory::Interrupts),
            "frame" => Some(LogCategory::Frame),
            _ => None,
        }
    }
}

/// Problems parsing a log filter string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LogFilterError {
    #[error("unknown log category `{0}`")]
    UnknownCategory(String),
    #[error("unknown log level `{0}`")]
    UnknownLevel(String),
}

/// Sliding one-second window per category.
struct RateLimiter {
    max_per_second: AtomicUsize,
    window: Duration,
    state: Mutex<[WindowState; CATEGORY_COUNT]>,
}

#[derive(Default)]
struct WindowState {
    stamps: VecDeque<Instant>,
    dropped: usize,
    last_drop_report: Option<Instant>,
}

impl RateLimiter {
    fn new(max_per_second: usize) -> Self {
        Self {
            max_per_second: AtomicUsize::new(max_per_second),
            window: Duration::from_secs(1),
            state: Mutex::new(Default::default()),
        }
    }

    /// Returns (allowed, dropped count to report).
    fn admit(&self, category: LogCategory) -> (bool, Option<usize>) {
        let now = Instant::now();
        let max = self.max_per_second.load(Ordering::Relaxed);
        let mut guard = match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let slot = &mut guard[category.index()];

        while let Some(&front) = slot.stamps.front() {
            if now.duration_since(front) > self.window {
                slot.stamps.pop_front();
            } else {
                break;
            }
        }

        if slot.stamps.len() < max {
            slot.stamps.push_back(now);
            if slot.dropped > 0 {
                let dropped = std::mem::take(&mut slot.dropped);
                slot.last_drop_report = Some(now);
                return (true, Some(dropped));
            }
            return (true, None);
        }

        slot.dropped += 1;
        let report_due = slot
            .last_drop_report
            .map_or(true, |last| now.duration_since(last) >= self.window);
        if report_due {
            let dropped = std::mem::take(&mut slot.dropped);
            slot.last_drop_report = Some(now);
            (false, Some(dropped))
        } else {
            (false, None)
        }
    }
}

/// Process-wide logging configuration.
pub struct LogConfig {
    global_level: AtomicU8,
    levels: [AtomicU8; CATEGORY_COUNT],
    file_sender: Mutex<Option<Sender<String>>>,
    limiter: RateLimiter,
}

impl LogConfig {
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            levels: Default::default(),
            file_sender: Mutex::new(None),
            limiter: RateLimiter::new(60),
        }
    }

    /// The global singleton.
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.levels[category.index()].load(Ordering::Relaxed))
    }

    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        match self.level(category) {
            LogLevel::Off => level <= self.global_level(),
            specific => level <= specific,
        }
    }

    /// Turn everything off.
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    /// Apply a filter like `"warn,timing=debug,interrupts=trace"`.
    ///
    /// A bare level sets the global level; `category=level` sets one category.
    /// Nothing is applied if any directive fails to parse.
    pub fn apply_filter(&self, filter: &str) -> Result<(), LogFilterError> {
        let mut global = None;
        let mut per_category = Vec::new();

        for directive in filter.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.split_once('=') {
                Some((name, level)) => {
                    let category = LogCategory::from_name(name)
                        .ok_or_else(|| LogFilterError::UnknownCategory(name.trim().to_string()))?;
                    let level = LogLevel::from_str(level)
                        .ok_or_else(|| LogFilterError::UnknownLevel(level.trim().to_string()))?;
                    per_category.push((category, level));
                }
                None => {
                    let level = LogLevel::from_str(directive)
                        .ok_or_else(|| LogFilterError::UnknownLevel(directive.to_string()))?;
                    global = Some(level);
                }
            }
        }

        if let Some(level) = global {
            self.set_global_level(level);
        }
        for (category, level) in per_category {
            self.set_level(category, level);
        }
        Ok(())
    }

    pub fn set_rate_limit(&self, max_per_second: usize) {
        self.limiter
            .max_per_second
            .store(max_per_second, Ordering::Relaxed);
    }

    pub fn rate_limit(&self) -> usize {
        self.limiter.max_per_second.load(Ordering::Relaxed)
    }

    /// Send output to `path` (appending) through a writer thread.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel::<String>();

        thread::Builder::new()
            .name("video-log-writer".to_string())
            .spawn(move || {
                while let Ok(line) = receiver.recv() {
                    let _ = writeln!(file, "{}", line);
                    let _ = file.flush();
                }
            })?;

        if let Ok(mut slot) = self.file_sender.lock() {
            *slot = Some(sender);
        }
        Ok(())
    }

    /// Stop writing to the log file; output returns to stderr.
    pub fn clear_log_file(&self) {
        if let Ok(mut slot) = self.file_sender.lock() {
            *slot = None;
        }
    }

    fn emit(&self, message: String) {
        let message = match self.file_sender.lock() {
            Ok(slot) => match slot.as_ref() {
                Some(sender) => match sender.send(message) {
                    Ok(()) => return,
                    Err(failed) => failed.0,
                },
                None => message,
            },
            Err(_) => message,
        };
        eprintln!("{}", message);
    }
}

/// Log a lazily built message under `category` at `level`.
///
/// The closure is not called when the level is filtered out or the category
/// is over its rate limit.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if !config.should_log(category, level) {
        return;
    }

    let (allowed, dropped) = config.limiter.admit(category);
    if let Some(count) = dropped.filter(|&n| n > 0) {
        config.emit(format!(
            "[{:?}] rate limit exceeded, {} message(s) dropped",
            category, count
        ));
    }
    if allowed {
        config.emit(format!("[{:?}] {}", category, message_fn()));
    }
}
