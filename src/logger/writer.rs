//! Log writer module
//!
//! Process-wide sink for the access and error channels, writing to
//! stdout/stderr or to append-mode files.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Severity threshold from `logging.level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    /// Parse a level name; unknown names fall back to `Info`
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "debug" | "trace" => Self::Debug,
            _ => Self::Info,
        }
    }
}

enum LogTarget {
    Stdout,
    Stderr,
    File(File),
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(p) => open_log_file(p).map(Self::File),
            None => Ok(fallback),
        }
    }

    fn write_line(&mut self, message: &str) -> io::Result<()> {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => writeln!(file, "{message}")?,
        }
        Ok(())
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    level: Level,
    access: Mutex<LogTarget>,
    error: Mutex<LogTarget>,
}

impl LogWriter {
    fn new(level: Level, access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        Ok(Self {
            level,
            access: Mutex::new(LogTarget::open(access_log_file, LogTarget::Stdout)?),
            error: Mutex::new(LogTarget::open(error_log_file, LogTarget::Stderr)?),
        })
    }

    pub const fn level(&self) -> Level {
        self.level
    }

    /// Write to the access channel (access lines and info messages)
    pub fn write_access(&self, message: &str) {
        write_or_stderr(&self.access, message);
    }

    /// Write to the error channel
    pub fn write_error(&self, message: &str) {
        write_or_stderr(&self.error, message);
    }
}

/// A failed file write falls back to stderr so the line is not lost
fn write_or_stderr(target: &Mutex<LogTarget>, message: &str) {
    let result = target
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .write_line(message);
    if let Err(e) = result {
        eprintln!("[ERROR] Failed to write log file: {e}");
        eprintln!("{message}");
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer
///
/// Called once at startup. Fails if a log file cannot be opened or the
/// writer was already initialized.
pub fn init(level: Level, access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(level, access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// The global log writer, if `init` has run
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("error"), Level::Error);
        assert_eq!(Level::parse("WARN"), Level::Warn);
        assert_eq!(Level::parse(" debug "), Level::Debug);
        assert_eq!(Level::parse("verbose"), Level::Info);
        assert!(Level::Error < Level::Info);
    }

    #[test]
    fn test_file_target_appends() {
        let path = std::env::temp_dir().join(format!(
            "carstore-writer-{}/access.log",
            std::process::id()
        ));
        let path_str = path.to_str().unwrap();
        let writer = LogWriter::new(Level::Info, Some(path_str), None).unwrap();
        writer.write_access("first");
        writer.write_access("second");

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert!(contents.ends_with("first\nsecond\n"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_write_failure_is_reported() {
        let path = std::env::temp_dir().join(format!("carstore-readonly-{}.log", std::process::id()));
        File::create(&path).unwrap();
        let mut target = LogTarget::File(File::open(&path).unwrap());

        assert!(target.write_line("lost").is_err());
        assert!(LogTarget::Stderr.write_line("kept").is_ok());

        let _ = std::fs::remove_file(&path);
    }
}
