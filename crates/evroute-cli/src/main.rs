use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use evroute_cli::commands::plan::{handle_plan, PlanCommandArgs};
use evroute_cli::logging::{init_logging, LoggingConfig};
use evroute_cli::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Charging-aware EV route planner")]
struct Cli {
    /// Enable debug logging on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a route with charging stops from a JSON route request.
    Plan {
        /// Request file; reads stdin when omitted or `-`.
        #[arg(long, short)]
        input: Option<PathBuf>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Departure time (RFC 3339), overriding the request.
        #[arg(long)]
        departure: Option<DateTime<Utc>>,
        /// Abort the search after this many milliseconds.
        #[arg(long = "deadline-ms")]
        deadline_ms: Option<u64>,
        /// Energy predictor base URL (defaults to EVROUTE_PREDICTOR_URL).
        #[arg(long = "predictor-url")]
        predictor_url: Option<String>,
        /// Energy predictor timeout in seconds (defaults to EVROUTE_PREDICTOR_TIMEOUT_SECS or 5).
        #[arg(long = "predictor-timeout")]
        predictor_timeout: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LoggingConfig::from_env().verbose(cli.verbose));

    match cli.command {
        Command::Plan {
            input,
            format,
            departure,
            deadline_ms,
            predictor_url,
            predictor_timeout,
        } => handle_plan(&PlanCommandArgs {
            input,
            format,
            departure,
            deadline_ms,
            predictor_url,
            predictor_timeout_secs: predictor_timeout,
        }),
    }
}
