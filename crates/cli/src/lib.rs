pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cartwise",
    about = "Cartwise operator CLI",
    long_about = "Operate Cartwise migrations, demo seeding, and the suggestion engine from the command line.",
    after_help = "Examples:\n  cartwise migrate\n  cartwise seed\n  cartwise suggest --limit 5\n  cartwise doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load and verify the deterministic demo dataset")]
    Seed,
    #[command(about = "Run the suggestion engine over the stored list and purchase history")]
    Suggest {
        #[arg(long, help = "Maximum number of suggestions to print")]
        limit: Option<usize>,
        #[arg(long, help = "User whose list and history to read")]
        user: Option<String>,
    },
    #[command(about = "Show mined association rules for an item")]
    Patterns {
        item: String,
        #[arg(long, help = "User whose history to read")]
        user: Option<String>,
    },
    #[command(about = "Show replenishment status for an item")]
    Status {
        item: String,
        #[arg(long, help = "User whose history to read")]
        user: Option<String>,
    },
    #[command(about = "Validate config and database connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Suggest { limit, user } => commands::suggest::run(limit, user.as_deref()),
        Command::Patterns { item, user } => commands::patterns::run(&item, user.as_deref()),
        Command::Status { item, user } => commands::status::run(&item, user.as_deref()),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
