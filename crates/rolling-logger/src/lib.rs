//! Rolling Logger
//!
//! Size-rotated log files plus an in-memory ring of the most recent lines,
//! installed as the global `tracing` subscriber. Records emitted through
//! the `log` facade are bridged into the same output.
//!
//! Files live in one directory: `<app>.log` is current, `<app>.1.log` the
//! previous one, and so on up to `max_files` in total.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

static LOGGER: OnceLock<LogSink> = OnceLock::new();

// ========================
// Configuration
// ========================

#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
    pub dir: PathBuf,
    pub app_name: String,
    pub level: log::LevelFilter,
    pub max_file_bytes: u64,
    /// Current file included
    pub max_files: usize,
    pub ring_capacity: usize,
}

impl LoggerConfig {
    pub fn new(dir: impl Into<PathBuf>, app_name: &str) -> Self {
        Self {
            dir: dir.into(),
            app_name: app_name.to_string(),
            level: log::LevelFilter::Info,
            max_file_bytes: 1024 * 1024,
            max_files: 5,
            ring_capacity: 200,
        }
    }
}

#[derive(Debug)]
pub enum LoggerError {
    Io(io::Error),
    AlreadyInitialized,
    NotInitialized,
    Subscriber(String),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerError::Io(e) => write!(f, "Log file error: {}", e),
            LoggerError::AlreadyInitialized => f.write_str("Logger already initialized"),
            LoggerError::NotInitialized => f.write_str("Logger not initialized"),
            LoggerError::Subscriber(msg) => write!(f, "Cannot install subscriber: {}", msg),
        }
    }
}

impl std::error::Error for LoggerError {}

impl From<io::Error> for LoggerError {
    fn from(e: io::Error) -> Self {
        LoggerError::Io(e)
    }
}

// ========================
// Rolling File
// ========================

struct RollingFile {
    dir: PathBuf,
    stem: String,
    max_bytes: u64,
    max_files: usize,
    file: File,
    written: u64,
}

impl RollingFile {
    fn open(dir: &Path, stem: &str, max_bytes: u64, max_files: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", stem));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            stem: stem.to_string(),
            max_bytes,
            max_files: max_files.max(1),
            file,
            written,
        })
    }

    fn path(&self, index: usize) -> PathBuf {
        if index == 0 {
            self.dir.join(format!("{}.log", self.stem))
        } else {
            self.dir.join(format!("{}.{}.log", self.stem, index))
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        let oldest = self.path(self.max_files - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (0..self.max_files - 1).rev() {
            let from = self.path(index);
            if from.exists() {
                fs::rename(&from, self.path(index + 1))?;
            }
        }
        self.file = OpenOptions::new().create(true).append(true).truncate(false).open(self.path(0))?;
        self.written = 0;
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let len = chunk.len() as u64;
        if self.written > 0 && self.written + len > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(chunk)?;
        self.written += len;
        Ok(())
    }
}

// ========================
// Recent Lines
// ========================

struct RecentLines {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RecentLines {
    fn new(capacity: usize) -> Self {
        Self { lines: VecDeque::with_capacity(capacity), capacity }
    }

    fn push(&mut self, line: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }
}

// ========================
// Sink
// ========================

struct SinkState {
    file: RollingFile,
    recent: RecentLines,
}

impl SinkState {
    fn record(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_chunk(chunk)?;
        for line in String::from_utf8_lossy(chunk).lines() {
            self.recent.push(line);
        }
        Ok(())
    }
}

/// Shared writer target for the fmt subscriber
#[derive(Clone)]
pub struct LogSink {
    state: Arc<Mutex<SinkState>>,
}

impl LogSink {
    pub fn open(config: &LoggerConfig) -> Result<Self, LoggerError> {
        let file = RollingFile::open(&config.dir, &config.app_name, config.max_file_bytes, config.max_files)?;
        let state = SinkState { file, recent: RecentLines::new(config.ring_capacity) };
        Ok(Self { state: Arc::new(Mutex::new(state)) })
    }

    /// Oldest first
    pub fn recent(&self) -> Vec<String> {
        match self.state.lock() {
            Ok(state) => state.recent.lines.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub struct SinkWriter {
    state: Arc<Mutex<SinkState>>,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log sink lock poisoned"))?;
        state.record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log sink lock poisoned"))?;
        state.file.file.flush()
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter { state: Arc::clone(&self.state) }
    }
}

/// Local wall-clock timestamps, millisecond precision
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

fn tracing_level(level: log::LevelFilter) -> LevelFilter {
    match level {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    }
}

// ========================
// Global API
// ========================

/// Install the global file logger; `log` records are bridged into it
pub fn init_with(config: LoggerConfig) -> Result<(), LoggerError> {
    let sink = LogSink::open(&config)?;
    LOGGER.set(sink.clone()).map_err(|_| LoggerError::AlreadyInitialized)?;

    tracing_subscriber::fmt()
        .with_writer(sink)
        .with_ansi(false)
        .with_timer(LocalTime)
        .with_max_level(tracing_level(config.level))
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))?;

    log::info!("Logger started for {} in {}", config.app_name, config.dir.display());
    Ok(())
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::error!("{}", message);
    Ok(())
}

/// Most recent formatted lines, oldest first. Empty before init.
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(LogSink::recent).unwrap_or_default()
}
