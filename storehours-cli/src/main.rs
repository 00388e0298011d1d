//! storehours — keeps ITSM store opening hours in line with Origin.
//!
//! # Usage
//!
//! ```text
//! storehours run [--config itsm.cfg] [--dry-run] [--env prod|qa]
//!                [--file-logging] [--log-file <path>] [--report <path>]
//! storehours seal --global <GLOBAL> --key <KEY> --password <PASSWORD>
//! ```

mod commands;
mod joblog;
mod session;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::{run::RunArgs, seal::SealArgs};

#[derive(Parser, Debug)]
#[command(
    name = "storehours",
    version,
    about = "Synchronize store opening hours from Origin into ITSM",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch Origin opening hours and update divergent ITSM organizations.
    Run(RunArgs),

    /// Wrap a password into the `token`/`pwd` values stored in the config.
    Seal(SealArgs),
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Seal(args) => match args.run() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}
