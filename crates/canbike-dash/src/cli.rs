//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(name = "canbike")]
#[command(about = "Terminal dashboard and command console for a CAN bike over two serial ports")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file (JSON)
    #[arg(long, global = true, env = "CANBIKE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Open both ports and run the live dashboard (default)
    Run(RunArgs),

    /// Play a recorded raw line log on the dashboard
    Replay {
        /// Log file written by `canbike run`
        log: PathBuf,

        /// Playback speed multiplier
        #[arg(long, default_value_t = 1.0, value_parser = parse_speed)]
        speed: f64,
    },

    /// Show the updates one telemetry line produces
    Parse {
        line: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List serial ports
    Ports {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Engine controller port; commands are written here
    #[arg(long, env = "CANBIKE_ECU_PORT")]
    pub ecu_port: Option<String>,

    /// Actuator controller port; telemetry is read from here
    #[arg(long, env = "CANBIKE_ACTUATOR_PORT")]
    pub actuator_port: Option<String>,

    /// Baud rate for both ports
    #[arg(long, env = "CANBIKE_BAUD")]
    pub baud: Option<u32>,

    /// Directory for raw line logs and the diagnostic log
    #[arg(long, env = "CANBIKE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Dashboard frame rate
    #[arg(long)]
    pub frame_rate: Option<u32>,

    /// Indicator blink half-period in milliseconds
    #[arg(long)]
    pub blink_ms: Option<u64>,

    /// Quiet time before a held key counts as released, in milliseconds,
    /// on terminals that do not report key releases
    #[arg(long, env = "CANBIKE_HOLD_RELEASE_MS")]
    pub hold_release_ms: Option<u64>,
}

impl RunArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ecu_port: self.ecu_port.clone(),
            actuator_port: self.actuator_port.clone(),
            baud: self.baud,
            frame_rate_hz: self.frame_rate,
            blink_interval_ms: self.blink_ms,
            hold_release_timeout_ms: self.hold_release_ms,
            log_dir: self.log_dir.clone(),
        }
    }
}

impl Cli {
    /// The subcommand to run; a bare `canbike` means `run`.
    pub fn resolved_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(self.run.clone()))
    }
}

fn parse_speed(raw: &str) -> Result<f64, String> {
    let speed: f64 = raw.parse().map_err(|e| format!("not a number: {e}"))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err("speed must be a positive number".to_owned())
    }
}
