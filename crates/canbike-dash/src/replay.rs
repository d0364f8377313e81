//! Replay of a recorded raw line log.
//!
//! [`ReplaySource`] is a byte source for the ordinary serial reader. It
//! hands out each recorded line once its original offset from the first
//! record, divided by the playback speed, has elapsed. Until then reads
//! time out, the way an idle serial port does.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use canbike_link::parse_record;
use tracing::{info, warn};

use crate::error::DashError;

/// Longest a single read waits for the next record.
pub const MAX_READ_WAIT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled {
    due: Duration,
    line: String,
}

/// Timed playback of logged lines.
#[derive(Debug)]
pub struct ReplaySource {
    records: VecDeque<Scheduled>,
    pending: Vec<u8>,
    start: Instant,
    total: usize,
}

impl ReplaySource {
    /// Schedule the records in `log` for playback from `start`.
    ///
    /// Records without a timestamp play together with the record before
    /// them. A timestamp earlier than the first record plays immediately.
    pub fn from_log(log: &str, speed: f64, start: Instant) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            warn!(speed, "unusable replay speed, playing at 1x");
            1.0
        };

        let mut first = None;
        let mut due = Duration::ZERO;
        let mut records = VecDeque::new();
        for raw in log.lines() {
            let record = parse_record(raw.trim_end_matches('\r'));
            if record.line.trim().is_empty() {
                continue;
            }
            if let Some(at) = record.at {
                let origin = *first.get_or_insert(at);
                let offset = at.signed_duration_since(origin).to_std().unwrap_or_default();
                due = Duration::try_from_secs_f64(offset.as_secs_f64() / speed)
                    .unwrap_or(Duration::MAX);
            }
            records.push_back(Scheduled {
                due,
                line: record.line.to_owned(),
            });
        }

        let total = records.len();
        Self {
            records,
            pending: Vec::new(),
            start,
            total,
        }
    }

    /// Read and schedule a log file, starting now.
    ///
    /// # Errors
    ///
    /// [`DashError::Replay`] if the file cannot be read.
    pub fn open(path: &Path, speed: f64) -> Result<Self, DashError> {
        let bytes = fs::read(path).map_err(|source| DashError::Replay {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::from_log(&String::from_utf8_lossy(&bytes), speed, Instant::now());
        info!(path = %path.display(), records = source.total, speed, "replay loaded");
        Ok(source)
    }

    /// Non-blocking read as of `now`.
    ///
    /// Returns `Ok(0)` once everything has been played, and a `TimedOut`
    /// error while the next record is not yet due.
    pub fn poll_at(&mut self, now: Instant, buf: &mut [u8]) -> io::Result<usize> {
        let elapsed = now.saturating_duration_since(self.start);
        while self.records.front().is_some_and(|next| next.due <= elapsed) {
            if let Some(next) = self.records.pop_front() {
                self.pending.extend_from_slice(next.line.as_bytes());
                self.pending.push(b'\n');
            }
        }

        if self.pending.is_empty() {
            return if self.records.is_empty() {
                Ok(0)
            } else {
                Err(io::ErrorKind::TimedOut.into())
            };
        }
        let count = buf.len().min(self.pending.len());
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..count)) {
            *dst = src;
        }
        Ok(count)
    }

    /// Time until the next record is due, zero if it already is.
    pub fn next_due_in(&self, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.start);
        self.records
            .front()
            .map(|next| next.due.saturating_sub(elapsed))
    }

    /// Records scheduled in total.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Records not yet handed out.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }

    pub fn is_finished(&self) -> bool {
        self.records.is_empty() && self.pending.is_empty()
    }
}

impl Read for ReplaySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty()
            && let Some(wait) = self.next_due_in(Instant::now())
            && !wait.is_zero()
        {
            thread::sleep(wait.min(MAX_READ_WAIT));
        }
        self.poll_at(Instant::now(), buf)
    }
}
