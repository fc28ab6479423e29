use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use outlay::core::interval::Interval;
use outlay::core::log::init_logging;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Profile to operate on, overriding the configured one
    #[arg(short, long, global = true)]
    profile: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for outlay::AppCommand {
    fn from(cmd: Commands) -> outlay::AppCommand {
        match cmd {
            Commands::Spend {
                amount,
                category,
                date,
            } => outlay::AppCommand::Spend {
                amount,
                category,
                date,
            },
            Commands::Limit { interval, amount } => {
                outlay::AppCommand::SetLimit { interval, amount }
            }
            Commands::Limits => outlay::AppCommand::Limits,
            Commands::Report { interval, date } => outlay::AppCommand::Report { interval, date },
            Commands::Currency(CurrencyCommands::Set { code }) => {
                outlay::AppCommand::SetCurrency { code }
            }
            Commands::Currency(CurrencyCommands::Refresh) => outlay::AppCommand::RefreshRates,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Record an expense
    Spend {
        /// Amount in your display currency
        amount: Decimal,
        /// Category the expense belongs to
        category: String,
        /// Date the money was spent, defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Set a spend limit for a window
    Limit {
        /// Window the limit applies to: day, week or month
        interval: Interval,
        /// Ceiling in your display currency
        amount: Decimal,
    },
    /// Show configured limits and what is left of them
    Limits,
    /// Show a per-category spending report
    Report {
        /// Window the report covers: day, week or month
        #[arg(default_value = "month")]
        interval: Interval,
        /// Date inside the window, defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Manage currencies and exchange rates
    #[command(subcommand)]
    Currency(CurrencyCommands),
}

#[derive(Subcommand)]
enum CurrencyCommands {
    /// Set your display currency
    Set {
        /// Currency code, e.g. EUR
        code: String,
    },
    /// Fetch fresh exchange rates now
    Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => outlay::cli::setup::setup(),
        Some(cmd) => outlay::run_command(cmd.into(), cli.config_path.as_deref(), cli.profile).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
