//! Rolling File Logger
//!
//! Writes formatted log lines to `<dir>/<app>.log`, rotating to
//! `<app>.log.1 .. <app>.log.N` once the active file grows past a size cap.
//! The most recent lines are also kept in a circular buffer so a running
//! process can report what it logged without touching the disk.
//!
//! `init_logger` installs a `tracing-subscriber` fmt subscriber that writes
//! through the rolling file. Records emitted with the `log` facade are
//! bridged into the same subscriber.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Active file size that triggers a rotation
pub const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024;
/// Number of rotated files kept next to the active one
pub const DEFAULT_KEEP_FILES: usize = 3;
/// Lines retained in memory
pub const DEFAULT_BUFFER_LINES: usize = 500;

static GLOBAL: OnceLock<RollingFile> = OnceLock::new();

struct Inner {
    file: File,
    written: u64,
    recent: VecDeque<String>,
    partial: String,
}

/// A size-rotated log file plus an in-memory tail.
#[derive(Clone)]
pub struct RollingFile {
    path: PathBuf,
    max_bytes: u64,
    keep_files: usize,
    buffer_lines: usize,
    inner: Arc<Mutex<Inner>>,
}

impl RollingFile {
    /// Open (or create) `<dir>/<app_name>.log`.
    pub fn open(
        dir: &Path,
        app_name: &str,
        max_bytes: u64,
        keep_files: usize,
        buffer_lines: usize,
    ) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", app_name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            keep_files,
            buffer_lines,
            inner: Arc::new(Mutex::new(Inner {
                file,
                written,
                recent: VecDeque::with_capacity(buffer_lines),
                partial: String::new(),
            })),
        })
    }

    /// Path of the active log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one complete line prefixed with a local timestamp and level.
    pub fn write_line(&self, level: &str, message: &str) -> io::Result<()> {
        let line = format!(
            "{} {:>5} {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            message
        );
        self.append(line.as_bytes())
    }

    /// The last `n` lines written, oldest first.
    pub fn recent_lines(&self, n: usize) -> Vec<String> {
        let inner = self.lock();
        let skip = inner.recent.len().saturating_sub(n);
        inner.recent.iter().skip(skip).cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn append(&self, bytes: &[u8]) -> io::Result<()> {
        let mut inner = self.lock();

        if inner.written > 0 && inner.written + bytes.len() as u64 > self.max_bytes {
            self.rotate(&mut inner)?;
        }

        inner.file.write_all(bytes)?;
        inner.written += bytes.len() as u64;

        // Buffer complete lines only; the fmt layer may hand us fragments.
        let text = String::from_utf8_lossy(bytes);
        let mut pending = std::mem::take(&mut inner.partial);
        pending.push_str(&text);
        let mut lines: Vec<&str> = pending.split('\n').collect();
        let tail = lines.pop().unwrap_or_default().to_string();
        for line in lines {
            if inner.recent.len() == self.buffer_lines {
                inner.recent.pop_front();
            }
            if self.buffer_lines > 0 {
                inner.recent.push_back(line.to_string());
            }
        }
        inner.partial = tail;
        Ok(())
    }

    fn rotate(&self, inner: &mut Inner) -> io::Result<()> {
        inner.file.flush()?;

        if self.keep_files == 0 {
            inner.file = File::create(&self.path)?;
            inner.written = 0;
            return Ok(());
        }

        let oldest = rotated_path(&self.path, self.keep_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.keep_files).rev() {
            let from = rotated_path(&self.path, index);
            if from.exists() {
                fs::rename(&from, rotated_path(&self.path, index + 1))?;
            }
        }
        fs::rename(&self.path, rotated_path(&self.path, 1))?;

        inner.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        inner.written = 0;
        Ok(())
    }
}

fn rotated_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// Writer handed to the fmt layer for each event
pub struct RollingWriter {
    file: RollingFile,
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.append(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.lock().file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter { file: self.clone() }
    }
}

/// Initialize the global logger in `log_dir` for `app_name`.
///
/// Installs the tracing subscriber once; later calls return an error.
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), String> {
    let file = RollingFile::open(
        &log_dir,
        app_name,
        DEFAULT_MAX_BYTES,
        DEFAULT_KEEP_FILES,
        DEFAULT_BUFFER_LINES,
    )
    .map_err(|e| format!("Failed to open log file: {}", e))?;

    GLOBAL
        .set(file.clone())
        .map_err(|_| "Logger already initialized".to_string())?;

    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_max_level(Level::DEBUG)
        .try_init()
        .map_err(|e| format!("Failed to install subscriber: {}", e))?;

    log::info!("{} logging to {}", app_name, log_dir.display());
    Ok(())
}

fn global() -> Result<&'static RollingFile, String> {
    GLOBAL.get().ok_or_else(|| "Logger not initialized".to_string())
}

/// Write an info line directly to the active log file
pub fn info(message: &str) -> Result<(), String> {
    global()?.write_line("INFO", message).map_err(|e| e.to_string())
}

/// Write an error line directly to the active log file
pub fn error(message: &str) -> Result<(), String> {
    global()?.write_line("ERROR", message).map_err(|e| e.to_string())
}

/// The last `n` lines logged by the global logger
pub fn recent_lines(n: usize) -> Vec<String> {
    GLOBAL.get().map(|f| f.recent_lines(n)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_recent() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "Test", 1024, 2, 10).unwrap();

        file.write_line("INFO", "first").unwrap();
        file.write_line("WARN", "second").unwrap();

        let recent = file.recent_lines(10);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].ends_with("first"));
        assert!(recent[1].contains("WARN"));

        let on_disk = fs::read_to_string(file.path()).unwrap();
        assert_eq!(on_disk.lines().count(), 2);
    }

    #[test]
    fn test_buffer_is_circular() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "Test", 1024 * 1024, 2, 3).unwrap();

        for i in 0..5 {
            file.write_line("INFO", &format!("line {}", i)).unwrap();
        }

        let recent = file.recent_lines(10);
        assert_eq!(recent.len(), 3);
        assert!(recent[0].ends_with("line 2"));
        assert!(recent[2].ends_with("line 4"));
        assert_eq!(file.recent_lines(1).len(), 1);
    }

    #[test]
    fn test_rotation_keeps_bounded_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "Test", 64, 2, 10).unwrap();

        for i in 0..20 {
            file.write_line("INFO", &format!("rotating line number {}", i)).unwrap();
        }

        assert!(dir.path().join("Test.log").exists());
        assert!(dir.path().join("Test.log.1").exists());
        assert!(dir.path().join("Test.log.2").exists());
        assert!(!dir.path().join("Test.log.3").exists());
    }

    #[test]
    fn test_fragments_are_joined() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "Test", 1024, 1, 10).unwrap();
        let mut writer = file.make_writer();

        writer.write_all(b"half ").unwrap();
        assert!(file.recent_lines(5).is_empty());
        writer.write_all(b"line\nnext").unwrap();

        assert_eq!(file.recent_lines(5), vec!["half line".to_string()]);
    }
}
