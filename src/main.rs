use clap::{Parser, Subcommand};

use std::path::PathBuf;
use std::process::ExitCode;

use cmdperf::{Config, DEFAULT_CONFIG_FILE, schema_doc};

mod cli_logger;
mod cmd {
    pub mod run_cmd;
    pub mod validate_cmd;
}

use cli_logger::CliLogger;
use cmd::run_cmd::{RunArgs, run_command};
use cmd::validate_cmd::validate_command;

/// Profile the wall time, CPU, peak memory and network traffic of commands.
#[derive(Debug, Parser)]
#[command(name = "cmdperf", version, about)]
struct Cli {
    /// Config file; missing is fine, unreadable falls back to defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Machine-readable output on stdout.
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run every command in the list and write the report.
    Run(RunArgs),
    /// Check that every command in the list splits into argv; spawns nothing.
    Validate {
        #[arg(value_name = "COMMANDS")]
        file: PathBuf,
    },
    /// Describe the command-list format and report columns.
    Schema,
}

const EXIT_FATAL: u8 = 1;
const EXIT_PARTIAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let logger = CliLogger::new(cli.json, cli.no_color);
    match dispatch(&cli, &logger) {
        Ok(code) => code,
        Err(err) => {
            logger.print_error(&format!("{err:#}"));
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn dispatch(cli: &Cli, logger: &CliLogger) -> anyhow::Result<ExitCode> {
    let config = Config::load_optional(&cli.config);
    match &cli.command {
        Command::Run(args) => {
            let out = run_command(&config, args)?;
            logger.print_batch_summary(&out)?;
            let failed = out.report.failed_count();
            if failed > 0 {
                logger.print_warning(&format!("{failed} command(s) could not be profiled"));
                return Ok(ExitCode::from(EXIT_PARTIAL));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { file } => {
            let out = validate_command(file)?;
            logger.print_serialized(&out)?;
            if out.ok {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_PARTIAL))
            }
        }
        Command::Schema => {
            logger.print_serialized(&schema_doc())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
