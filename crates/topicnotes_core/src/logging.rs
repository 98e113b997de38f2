//! Process logging bootstrap.
//!
//! # Responsibility
//! - Start one `flexi_logger` backend per process, writing rotated files
//!   under a log directory or plain lines to stderr.
//! - Emit `event=… module=… status=…` diagnostic lines from every layer.
//!
//! # Invariants
//! - Repeating `init_logging` with the same level and sink is a no-op.
//! - A different level or sink after the first call is an error, never a
//!   silent reconfiguration.
//! - Panics are logged with their location only; payloads can hold note text.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "topicnotes";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    Directory(PathBuf),
}

impl LogSink {
    /// Resolves an optional directory; relative paths are taken from the
    /// current working directory.
    pub fn resolve(log_dir: Option<&str>) -> Result<Self, LoggingError> {
        let Some(raw) = log_dir.map(str::trim) else {
            return Ok(Self::Stderr);
        };
        if raw.is_empty() {
            return Err(LoggingError::EmptyDirectory);
        }
        let path = Path::new(raw);
        if path.is_absolute() {
            return Ok(Self::Directory(path.to_path_buf()));
        }
        let cwd = std::env::current_dir().map_err(|source| LoggingError::Directory {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::Directory(cwd.join(path)))
    }
}

impl Display for LogSink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => f.write_str("stderr"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    EmptyDirectory,
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
    Backend(String),
    Conflict {
        active: String,
        requested: String,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected one of {}",
                LEVELS.join("|")
            ),
            Self::EmptyDirectory => f.write_str("log directory cannot be empty"),
            Self::Directory { path, source } => {
                write!(f, "log directory `{}` unusable: {source}", path.display())
            }
            Self::Backend(detail) => write!(f, "failed to start logger: {detail}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already runs as `{active}`; cannot switch to `{requested}`"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory { source, .. } => Some(source),
            _ => None,
        }
    }
}

struct ActiveLogger {
    level: &'static str,
    sink: LogSink,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn describe(level: &str, sink: &LogSink) -> String {
        format!("{level}@{sink}")
    }
}

/// Starts process logging at `level`, to `log_dir` when given, else stderr.
pub fn init_logging(level: &str, log_dir: Option<&str>) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let sink = LogSink::resolve(log_dir)?;

    let active = ACTIVE.get_or_try_init(|| -> Result<ActiveLogger, LoggingError> {
        let handle = start_backend(level, &sink)?;
        install_panic_hook();
        info!(
            "event=logging_init module=core status=ok level={} sink={} version={}",
            level,
            sink,
            env!("CARGO_PKG_VERSION")
        );
        Ok(ActiveLogger {
            level,
            sink: sink.clone(),
            _handle: handle,
        })
    })?;

    if active.level != level || active.sink != sink {
        return Err(LoggingError::Conflict {
            active: ActiveLogger::describe(active.level, &active.sink),
            requested: ActiveLogger::describe(level, &sink),
        });
    }
    Ok(())
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn parse_level(level: &str) -> Result<&'static str, LoggingError> {
    let lowered = level.trim().to_ascii_lowercase();
    let lowered = if lowered == "warning" { "warn".to_string() } else { lowered };
    LEVELS
        .iter()
        .copied()
        .find(|known| *known == lowered)
        .ok_or(LoggingError::UnknownLevel(lowered))
}

fn start_backend(level: &str, sink: &LogSink) -> Result<LoggerHandle, LoggingError> {
    let logger =
        Logger::try_with_str(level).map_err(|err| LoggingError::Backend(err.to_string()))?;
    let logger = match sink {
        LogSink::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format),
        LogSink::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::Directory {
                path: dir.clone(),
                source,
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };
    logger
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))
}

// Runs once, from inside the ACTIVE initializer.
fn install_panic_hook() {
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let thread = std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_string();
        error!(
            "event=panic module=core status=error location={} thread={}",
            location, thread
        );
        previous_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::{init_logging, parse_level, LogSink, LoggingError};
    use std::path::PathBuf;

    #[test]
    fn levels_are_case_insensitive_and_accept_warning() {
        assert_eq!(parse_level(" DEBUG ").unwrap(), "debug");
        assert_eq!(parse_level("Warning").unwrap(), "warn");
        assert!(matches!(
            parse_level("verbose"),
            Err(LoggingError::UnknownLevel(level)) if level == "verbose"
        ));
    }

    #[test]
    fn sink_defaults_to_stderr_and_anchors_relative_dirs() {
        assert_eq!(LogSink::resolve(None).unwrap(), LogSink::Stderr);
        assert!(matches!(
            LogSink::resolve(Some("  ")),
            Err(LoggingError::EmptyDirectory)
        ));

        let expected = std::env::current_dir().unwrap().join("logs");
        assert_eq!(
            LogSink::resolve(Some("logs")).unwrap(),
            LogSink::Directory(expected)
        );
        assert_eq!(
            LogSink::resolve(Some("/var/log/topicnotes")).unwrap(),
            LogSink::Directory(PathBuf::from("/var/log/topicnotes"))
        );
    }

    // The only test that starts the backend: the logger is process-global.
    #[test]
    fn repeated_init_must_match_the_running_logger() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap().to_string();

        init_logging("info", Some(&dir_str)).unwrap();
        init_logging("INFO", Some(&dir_str)).unwrap();

        let err = init_logging("debug", Some(&dir_str)).unwrap_err();
        assert!(matches!(err, LoggingError::Conflict { .. }));
        let err = init_logging("info", None).unwrap_err();
        assert!(err.to_string().contains("cannot switch to `info@stderr`"));
    }
}
