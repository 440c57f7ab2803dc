//! `plinth`: scaffold voice-app projects from marketplace plugins.
//!
//! Exit codes:
//!
//! | Code | Meaning                          |
//! |------|----------------------------------|
//! |  0   | Success                          |
//! |  1   | Internal or external tool error  |
//! |  2   | Invalid input                    |
//! |  3   | Resource not found               |
//! |  4   | Configuration error              |

use std::io::IsTerminal as _;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};

use crate::{
    cli::{Cli, Commands},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;
mod platforms;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are reported through the same path.
            let _ = e.print();
            return ExitCode::from(if e.use_stderr() { 2 } else { 0 });
        }
    };

    if let Err(e) = init_logging(&cli.global) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::from(1);
    }

    let verbose = cli.global.verbose > 0;
    match try_main(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err, verbose),
    }
}

/// Load configuration, then run the selected command.
async fn try_main(cli: Cli) -> CliResult<()> {
    debug!(global = ?cli.global, "Parsed arguments");

    let config = AppConfig::load(cli.global.config.as_deref())?;
    let output = OutputManager::new(&cli.global, &config);

    dispatch(cli.command, config, output).await?;
    info!("Plinth completed successfully");
    Ok(())
}

#[instrument(skip_all)]
async fn dispatch(command: Commands, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match command {
        Commands::New(args) => commands::new::execute(args, config, output).await,
        Commands::Plugins(args) => commands::plugins::execute(args, config, output),
        Commands::Init(args) => commands::init::execute(args, output),
        Commands::Completions(args) => commands::completions::execute(args),
        Commands::Config(cmd) => commands::config::execute(cmd, config, output),
    }
}

/// Log `err`, print it for the user and pick the exit code.
fn report(err: &CliError, verbose: bool) -> ExitCode {
    err.log();
    let rendered = if std::io::stderr().is_terminal() {
        err.format_colored(verbose)
    } else {
        err.format_plain(verbose)
    };
    eprint!("{rendered}");
    ExitCode::from(err.exit_code())
}
