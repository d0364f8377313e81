//! canbike - CAN bike dashboard and command console

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use std::process::ExitCode;

use canbike_dash::app;
use canbike_dash::cli::Cli;
use clap::Parser;
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match app::execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "canbike failed");
            eprintln!("error: {e:#}");
            ExitCode::from(app::exit_code(&e))
        }
    }
}
