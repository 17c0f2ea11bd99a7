pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "flightbook",
    about = "Flightbook operator CLI",
    long_about = "Operate the flight booking fulfillment handler: migrations, readiness checks, config inspection, and one-off turn invocation.",
    after_help = "Examples:\n  flightbook doctor --json\n  flightbook config\n  flightbook invoke turn.json --dry-run"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, blob root, and alert routing")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run one dialog turn from a JSON event file and print the dialog response")]
    Invoke {
        #[arg(help = "Path to the event JSON, or `-` for stdin")]
        path: PathBuf,
        #[arg(long, help = "Keep bookings in memory instead of writing the stores")]
        dry_run: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Invoke { path, dry_run } => commands::invoke::run(&path, dry_run),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
