pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::calc::CalcCommand;

#[derive(Debug, Parser)]
#[command(
    name = "hearth",
    about = "Hearth operator CLI",
    long_about = "Run the Hearth mortgage engine directly, inspect effective configuration, and check runtime readiness.",
    after_help = "Examples:\n  hearth calc stamp-duty --property-value 300000\n  hearth calc compare --scenario 250000,5,30 --scenario 250000,3.9,30\n  hearth calc buy-to-let --property-value 250000 --monthly-rent 1200\n  hearth config\n  hearth doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand, about = "Run a calculation and print the result as JSON")]
    Calc(CalcCommand),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, LLM provider readiness, and engine self-checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Calc(command) => commands::calc::run(command),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
