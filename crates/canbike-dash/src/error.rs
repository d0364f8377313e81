//! Error types for the canbike dashboard.

use std::io;
use std::path::PathBuf;

use canbike_scheduler::SchedulerError;
use thiserror::Error;

/// Configuration could not be loaded or is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Dashboard runtime failures.
#[derive(Debug, Error)]
pub enum DashError {
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),

    #[error("timing setup failed: {0}")]
    Timing(#[from] SchedulerError),

    #[error("cannot read replay log {}", path.display())]
    Replay {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
