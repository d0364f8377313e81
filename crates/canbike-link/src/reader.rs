//! Serial reader: drains the inbound transport into the shared state.
//!
//! The reader owns the byte source, the framer, and the raw log sink. It is
//! the only writer of [`TelemetryState`]. Transport faults are counted and
//! retried; nothing short of cancellation ends the loop.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use canbike_telemetry::{TelemetryState, parse_line};
use chrono::Local;
use tracing::{debug, error, info, trace, warn};

use crate::counters::LinkCounters;
use crate::error::{LinkError, LinkResult};
use crate::framer::{DEFAULT_MAX_FRAGMENT, LineFramer};
use crate::last_line::LastLine;
use crate::log::RawLineSink;
use crate::shutdown::ShutdownToken;
use crate::source::{ByteSource, is_idle_error};

/// Name of the reader's OS thread.
pub const READER_THREAD_NAME: &str = "canbike-reader";

/// Reader timing and buffer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Sleep after a read that returned no data
    pub idle_backoff: Duration,
    /// Sleep after a transport fault
    pub fault_backoff: Duration,
    /// Longest unterminated line kept
    pub max_fragment: usize,
    /// Bytes requested per read
    pub read_chunk: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            idle_backoff: Duration::from_millis(5),
            fault_backoff: Duration::from_millis(10),
            max_fragment: DEFAULT_MAX_FRAGMENT,
            read_chunk: 1024,
        }
    }
}

/// Result of one read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Bytes arrived; `lines` complete lines were processed
    Data { bytes: usize, lines: usize },
    /// Nothing to read
    Idle,
    /// Transport error other than a timeout
    Fault,
}

/// Totals kept by the reader thread and returned when it stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReaderStats {
    pub polls: u64,
    pub idle_polls: u64,
    pub faults: u64,
    pub bytes: u64,
    pub lines: u64,
}

/// Inbound pipeline from a [`ByteSource`] to [`TelemetryState`].
pub struct SerialReader<S, L> {
    source: S,
    sink: L,
    framer: LineFramer,
    state: Arc<TelemetryState>,
    last_line: Arc<LastLine>,
    counters: Arc<LinkCounters>,
    config: ReaderConfig,
    buf: Vec<u8>,
    stats: ReaderStats,
}

impl<S, L> std::fmt::Debug for SerialReader<S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialReader")
            .field("config", &self.config)
            .field("pending", &self.framer.pending())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<S: ByteSource, L: RawLineSink> SerialReader<S, L> {
    pub fn new(source: S, sink: L, state: Arc<TelemetryState>) -> Self {
        Self::with_config(source, sink, state, ReaderConfig::default())
    }

    pub fn with_config(source: S, sink: L, state: Arc<TelemetryState>, config: ReaderConfig) -> Self {
        Self {
            source,
            sink,
            framer: LineFramer::with_max_fragment(config.max_fragment),
            state,
            last_line: Arc::new(LastLine::new()),
            counters: Arc::new(LinkCounters::new()),
            buf: vec![0; config.read_chunk.max(1)],
            config,
            stats: ReaderStats::default(),
        }
    }

    /// Share `last_line` with the dashboard.
    #[must_use]
    pub fn last_line(mut self, last_line: Arc<LastLine>) -> Self {
        self.last_line = last_line;
        self
    }

    /// Share `counters` with the dashboard.
    #[must_use]
    pub fn counters(mut self, counters: Arc<LinkCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// One read attempt. Never blocks longer than the source's own timeout.
    pub fn poll_once(&mut self) -> PollOutcome {
        self.stats.polls = self.stats.polls.saturating_add(1);
        let read = self.source.read_bytes(&mut self.buf);
        match read {
            Ok(0) => self.idle(),
            Ok(n) => {
                let bytes = self.buf.get(..n).unwrap_or(&self.buf);
                let discarded_before = self.framer.discarded();
                let lines = self.framer.push(bytes);
                let discarded = self.framer.discarded().saturating_sub(discarded_before);
                if discarded > 0 {
                    warn!(discarded, "over-long line fragment discarded");
                    self.counters.add_discarded(discarded);
                }

                self.counters.add_bytes(n);
                self.stats.bytes = self.stats.bytes.saturating_add(n as u64);
                for line in &lines {
                    self.handle_line(line);
                }
                PollOutcome::Data {
                    bytes: n,
                    lines: lines.len(),
                }
            }
            Err(e) if is_idle_error(&e) => self.idle(),
            Err(e) => {
                debug!(error = %e, "serial read fault");
                self.counters.inc_read_fault();
                self.stats.faults = self.stats.faults.saturating_add(1);
                PollOutcome::Fault
            }
        }
    }

    fn idle(&mut self) -> PollOutcome {
        self.stats.idle_polls = self.stats.idle_polls.saturating_add(1);
        PollOutcome::Idle
    }

    /// Log, publish, parse and apply one complete line.
    pub fn handle_line(&mut self, line: &str) -> usize {
        if let Err(e) = self.sink.record(Local::now(), line) {
            debug!(error = %e, "raw log write failed");
            self.counters.inc_log_fault();
        }
        self.last_line.store(line);

        let updates = parse_line(line);
        let applied = self.state.apply_all(&updates);
        self.counters.record_line(applied);
        self.stats.lines = self.stats.lines.saturating_add(1);
        trace!(line, applied, "line ingested");
        applied
    }

    /// Poll until `shutdown` is cancelled, backing off on idle and faults.
    pub fn run(mut self, shutdown: &ShutdownToken) -> ReaderStats {
        info!("serial reader started");
        while !shutdown.is_cancelled() {
            match self.poll_once() {
                PollOutcome::Data { .. } => {}
                PollOutcome::Idle => thread::sleep(self.config.idle_backoff),
                PollOutcome::Fault => thread::sleep(self.config.fault_backoff),
            }
        }
        info!(
            lines = self.stats.lines,
            bytes = self.stats.bytes,
            faults = self.stats.faults,
            "serial reader stopped"
        );
        self.stats
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    pub fn sink(&self) -> &L {
        &self.sink
    }
}

impl<S, L> SerialReader<S, L>
where
    S: ByteSource + Send + 'static,
    L: RawLineSink + Send + 'static,
{
    /// Run the reader on its own named thread.
    ///
    /// # Errors
    ///
    /// [`LinkError::Spawn`] if the OS refuses the thread.
    pub fn spawn(self, shutdown: ShutdownToken) -> LinkResult<ReaderHandle> {
        let token = shutdown.clone();
        let thread = thread::Builder::new()
            .name(READER_THREAD_NAME.to_owned())
            .spawn(move || self.run(&token))
            .map_err(LinkError::Spawn)?;
        Ok(ReaderHandle {
            shutdown,
            thread: Some(thread),
        })
    }
}

/// Owner of a running reader thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct ReaderHandle {
    shutdown: ShutdownToken,
    thread: Option<JoinHandle<ReaderStats>>,
}

impl ReaderHandle {
    /// Cancel and join. Returns the reader's final totals.
    pub fn stop(mut self) -> ReaderStats {
        self.join_thread().unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    fn join_thread(&mut self) -> Option<ReaderStats> {
        let thread = self.thread.take()?;
        self.shutdown.cancel();
        match thread.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                error!("serial reader thread panicked");
                None
            }
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.join_thread();
    }
}
