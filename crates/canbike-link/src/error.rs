//! Link error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Startup failures on the serial link and raw log.
///
/// Runtime transport faults never surface here; the reader counts and
/// retries them.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("cannot open serial port {port} at {baud} baud")]
    PortOpen {
        port: String,
        baud: u32,
        #[source]
        source: serialport::Error,
    },

    #[error("cannot enumerate serial ports")]
    PortList(#[source] serialport::Error),

    #[error("cannot open raw log {}", path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot spawn reader thread")]
    Spawn(#[source] io::Error),
}

pub type LinkResult<T> = Result<T, LinkError>;
