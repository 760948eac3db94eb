//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes every event to stderr and to a
//! bounded set of log files:
//! - `<app>.log` is the active file
//! - `<app>.log.1` .. `<app>.log.N` hold older output, oldest dropped first
//!
//! Level filtering honours `RUST_LOG` and defaults to `info`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Size and retention limits for the rolling file set
#[derive(Debug, Clone, Copy)]
pub struct RollingConfig {
    /// Rotate once the active file would grow past this many bytes
    pub max_bytes: u64,
    /// Number of rotated files kept besides the active one
    pub max_files: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            max_files: 5,
        }
    }
}

/// A log file that rotates itself when it gets too large
pub struct RollingFile {
    dir: PathBuf,
    base_name: String,
    config: RollingConfig,
    file: File,
    written: u64,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, config: RollingConfig) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let base_name = format!("{}.log", app_name);
        let path = dir.join(&base_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir: dir.to_path_buf(),
            base_name,
            config,
            file,
            written,
        })
    }

    /// Path of the active file (index 0) or of a rotated file
    pub fn path_for(&self, index: usize) -> PathBuf {
        if index == 0 {
            self.dir.join(&self.base_name)
        } else {
            self.dir.join(format!("{}.{}", self.base_name, index))
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.config.max_files == 0 {
            // Nothing is retained, start the active file over
            self.file = File::create(self.path_for(0))?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.path_for(self.config.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (0..self.config.max_files).rev() {
            let from = self.path_for(index);
            if from.exists() {
                fs::rename(&from, self.path_for(index + 1))?;
            }
        }

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(0))?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.config.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Cloneable handle handed to the fmt layer
#[derive(Clone)]
pub struct SharedWriter(Arc<Mutex<RollingFile>>);

impl SharedWriter {
    pub fn new(file: RollingFile) -> Self {
        Self(Arc::new(Mutex::new(file)))
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        file.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber with default rolling limits
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), String> {
    init_logger_with(log_dir, app_name, RollingConfig::default())
}

pub fn init_logger_with(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    config: RollingConfig,
) -> Result<(), String> {
    let file = RollingFile::open(log_dir.as_ref(), app_name, config)
        .map_err(|e| format!("Failed to open log file: {}", e))?;
    let writer = SharedWriter::new(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_timer(LocalTimer).with_writer(io::stderr))
        .with(
            fmt::layer()
                .with_timer(LocalTimer)
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))
}

pub fn info(msg: &str) {
    tracing::info!(target: "rolling_logger", "{}", msg);
}

pub fn warn(msg: &str) {
    tracing::warn!(target: "rolling_logger", "{}", msg);
}

pub fn error(msg: &str) {
    tracing::error!(target: "rolling_logger", "{}", msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> RollingConfig {
        RollingConfig {
            max_bytes: 16,
            max_files: 2,
        }
    }

    #[test]
    fn test_writes_to_active_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "app", RollingConfig::default()).unwrap();

        file.write_all(b"hello\n").unwrap();
        file.flush().unwrap();

        let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(content, "hello\n");
    }

    #[test]
    fn test_rotates_when_full() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "app", small_config()).unwrap();

        file.write_all(b"0123456789\n").unwrap();
        file.write_all(b"abcdefghij\n").unwrap();
        file.flush().unwrap();

        let rotated = fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        let active = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(rotated, "0123456789\n");
        assert_eq!(active, "abcdefghij\n");
    }

    #[test]
    fn test_oldest_file_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "app", small_config()).unwrap();

        for line in ["first-line-xx\n", "second-line-x\n", "third-line-xx\n", "fourth-line-x\n"] {
            file.write_all(line.as_bytes()).unwrap();
        }
        file.flush().unwrap();

        assert!(!dir.path().join("app.log.3").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.2")).unwrap(),
            "second-line-x\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log")).unwrap(),
            "fourth-line-x\n"
        );
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut file = RollingFile::open(dir.path(), "app", RollingConfig::default()).unwrap();
            file.write_all(b"one\n").unwrap();
        }
        let mut file = RollingFile::open(dir.path(), "app", RollingConfig::default()).unwrap();
        file.write_all(b"two\n").unwrap();
        file.flush().unwrap();

        let content = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(content, "one\ntwo\n");
    }
}
