//! Append-only raw line log.
//!
//! One record per line: `YYYY-MM-DD HH:MM:SS.mmm | <raw line>`, local time.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::info;

use crate::error::{LinkError, LinkResult};

/// Separator between timestamp and line text.
pub const RECORD_SEPARATOR: &str = " | ";

const RECORD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Destination for raw inbound lines.
pub trait RawLineSink {
    fn record(&mut self, at: DateTime<Local>, line: &str) -> io::Result<()>;
}

/// Sink that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RawLineSink for NullSink {
    fn record(&mut self, _at: DateTime<Local>, _line: &str) -> io::Result<()> {
        Ok(())
    }
}

impl<T: RawLineSink + ?Sized> RawLineSink for Box<T> {
    fn record(&mut self, at: DateTime<Local>, line: &str) -> io::Result<()> {
        (**self).record(at, line)
    }
}

/// Format one log record, without the trailing newline.
pub fn format_record(at: &DateTime<Local>, line: &str) -> String {
    format!("{}{RECORD_SEPARATOR}{line}", at.format(RECORD_TIME_FORMAT))
}

/// A record split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub at: Option<NaiveDateTime>,
    pub line: &'a str,
}

/// Split a log record. Lines without a separator are treated as bare raw
/// lines with no timestamp.
pub fn parse_record(record: &str) -> LogRecord<'_> {
    match record.split_once(RECORD_SEPARATOR) {
        Some((stamp, line)) => match NaiveDateTime::parse_from_str(stamp, RECORD_TIME_FORMAT) {
            Ok(at) => LogRecord { at: Some(at), line },
            Err(_) => LogRecord {
                at: None,
                line: record,
            },
        },
        None => LogRecord {
            at: None,
            line: record,
        },
    }
}

/// Log file name for a session started at `at`.
pub fn log_file_name(at: &DateTime<Local>) -> String {
    format!("can_bike_log_{}.txt", at.format(FILE_TIME_FORMAT))
}

/// Raw log file, flushed after every record.
#[derive(Debug)]
pub struct RawLineLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RawLineLog {
    /// Create the directory if needed and open
    /// `can_bike_log_YYYYMMDD_HHMMSS.txt` inside it for appending.
    ///
    /// # Errors
    ///
    /// [`LinkError::LogOpen`] if the directory or file cannot be created.
    pub fn create_in(dir: &Path, started: &DateTime<Local>) -> LinkResult<Self> {
        fs::create_dir_all(dir).map_err(|source| LinkError::LogOpen {
            path: dir.to_path_buf(),
            source,
        })?;
        Self::open(&dir.join(log_file_name(started)))
    }

    /// Open `path` for appending, creating it if missing.
    ///
    /// # Errors
    ///
    /// [`LinkError::LogOpen`] if the file cannot be opened.
    pub fn open(path: &Path) -> LinkResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LinkError::LogOpen {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), "raw line log opened");
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl RawLineSink for RawLineLog {
    fn record(&mut self, at: DateTime<Local>, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", format_record(&at, line))?;
        self.writer.flush()
    }
}

impl Drop for RawLineLog {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::debug!(error = %e, "raw log flush on close failed");
        }
    }
}
