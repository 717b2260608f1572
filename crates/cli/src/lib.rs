pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "estately",
    about = "Estately operator CLI",
    long_about = "Operate the Estately assistant: interactive chat, migrations, demo fixtures, and readiness checks.",
    after_help = "Examples:\n  estately chat --user alice\n  estately migrate\n  estately seed\n  estately doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive chat session against the local stores")]
    Chat {
        #[arg(long, default_value = "local", help = "User id the session runs as")]
        user: String,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic property listings used by demos and tests")]
    Seed,
    #[command(about = "Validate config, database, session backend, and credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat { user } => commands::chat::run(&user),
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
