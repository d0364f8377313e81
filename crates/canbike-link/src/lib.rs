//! Serial link plumbing for the canbike dashboard.
//!
//! The inbound side is a [`SerialReader`] running on its own thread: it
//! drains a [`ByteSource`], reassembles lines with a [`LineFramer`], writes
//! every raw line to a [`RawLineSink`], and applies parsed updates to the
//! shared [`canbike_telemetry::TelemetryState`]. The outbound side is just
//! the opened command port, written by `canbike_protocol::CommandDispatcher`.
//!
//! ```
//! use std::io::Cursor;
//! use std::sync::Arc;
//!
//! use canbike_link::{NullSink, SerialReader};
//! use canbike_telemetry::TelemetryState;
//!
//! let state = Arc::new(TelemetryState::new());
//! let mut reader = SerialReader::new(
//!     Cursor::new(b"FUEL:3.2,FB:2\n".to_vec()),
//!     NullSink,
//!     Arc::clone(&state),
//! );
//! reader.poll_once();
//! assert_eq!(state.snapshot().fuel_bars, 2);
//! ```

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod counters;
pub mod error;
pub mod framer;
pub mod last_line;
pub mod log;
pub mod port;
pub mod reader;
pub mod shutdown;
pub mod source;

pub use counters::{LinkCounters, LinkStats};
pub use error::{LinkError, LinkResult};
pub use framer::{DEFAULT_MAX_FRAGMENT, LineFramer, decode_line};
pub use last_line::{DIAGNOSTIC_MAX_CHARS, LastLine, truncate_chars};
pub use log::{LogRecord, NullSink, RawLineLog, RawLineSink, format_record, log_file_name, parse_record};
pub use port::{
    DEFAULT_BAUD, DEFAULT_READ_TIMEOUT, PortInfo, PortPair, PortSettings, list_ports, open_port,
    open_port_pair,
};
pub use reader::{PollOutcome, READER_THREAD_NAME, ReaderConfig, ReaderHandle, ReaderStats, SerialReader};
pub use shutdown::ShutdownToken;
pub use source::{ByteSource, is_idle_error};
