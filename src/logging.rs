/// Structured logging for the flood-alert service.
///
/// Provides context-rich logging with source tags and station identifiers,
/// timestamps, and severity levels. Supports both console output and
/// file-based logging for daemon operation.

use crate::model::FetchError;
use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Telemetry,
    Forecast,
    Auth,
    Database,
    Broadcast,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Telemetry => write!(f, "TELEM"),
            DataSource::Forecast => write!(f, "FCST"),
            DataSource::Auth => write!(f, "AUTH"),
            DataSource::Database => write!(f, "DB"),
            DataSource::Broadcast => write!(f, "BCAST"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - a station may simply have no recent data
    Expected,
    /// Unexpected failure - indicates service degradation or a configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classify a fetch failure by error kind.
pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        // Gaps in a station's series happen during sensor outages.
        FetchError::NoData(_) => FailureType::Expected,
        // Auth, service, and parse failures all point at the service side.
        FetchError::Authentication(_) => FailureType::Unexpected,
        FetchError::RemoteService { .. } => FailureType::Unexpected,
        FetchError::Parse(_) => FailureType::Unexpected,
        FetchError::Validation(_) => FailureType::Unexpected,
        // The network between us and the API is nobody's fault in particular.
        FetchError::Transport(_) => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>) {
        let logger = Logger { min_level, log_file };
        *LOGGER.lock().unwrap() = Some(logger);
    }

    fn log(&self, level: LogLevel, source: DataSource, station: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!("{} {} {}{}: {}", timestamp, level, source, station_part, message);

        match level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
            LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>) {
    Logger::init(min_level, log_file.map(String::from));
}

/// Log a general informational message
pub fn info(source: DataSource, station: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, source, station, message);
    }
}

/// Log a warning message
pub fn warn(source: DataSource, station: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, source, station, message);
    }
}

/// Log an error message
pub fn error(source: DataSource, station: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, source, station, message);
    }
}

/// Log a debug message
pub fn debug(source: DataSource, station: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, source, station, message);
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a fetch failure with automatic classification.
pub fn log_fetch_failure(source: DataSource, station: Option<&str>, operation: &str, err: &FetchError) {
    let failure_type = classify_fetch_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(source, station, &message),
        FailureType::Unexpected => error(source, station, &message),
        FailureType::Unknown => warn(source, station, &message),
    }
}

// ---------------------------------------------------------------------------
// Broadcast Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a broadcast run.
pub fn log_broadcast_summary(attempted: usize, delivered: usize, failed: usize) {
    let message = format!(
        "Broadcast complete: {}/{} delivered, {} failed",
        delivered, attempted, failed
    );

    if failed == 0 {
        info(DataSource::Broadcast, None, &message);
    } else if delivered == 0 && attempted > 0 {
        error(DataSource::Broadcast, None, &message);
    } else {
        warn(DataSource::Broadcast, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_failure_classification() {
        let no_data = FetchError::NoData("bassac water_level".to_string());
        assert_eq!(classify_fetch_failure(&no_data), FailureType::Expected);

        let http = FetchError::RemoteService { status: 500, body: "oops".to_string() };
        assert_eq!(classify_fetch_failure(&http), FailureType::Unexpected);

        let transport = FetchError::Transport("connection refused".to_string());
        assert_eq!(classify_fetch_failure(&transport), FailureType::Unknown);
    }
}
