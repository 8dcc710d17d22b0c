mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::edit::EditArgs;
use commands::layers::{ChartArgs, ComputeArgs};
use commands::sensitivity::SensitivityArgs;

/// Return layer breakdown calculator
#[derive(Parser)]
#[command(
    name = "layers",
    version,
    about = "Break asset-class returns into leverage, expense, tax and inflation layers",
    long_about = "Computes leveraged gross and net returns, after-tax nominal and real \
                  returns, unleveraged net returns and risk premia for a set of asset \
                  classes. Inputs come from flags, a JSON file, or JSON piped on stdin; \
                  the built-in sample session is used when nothing is given."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log more detail to stderr (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the return layers for every asset class
    Compute(ComputeArgs),
    /// Chart rows (series, colours, labels) plus the tabular view
    Chart(ChartArgs),
    /// Apply field edits to an input and print the new input
    Edit(EditArgs),
    /// Sweep one global parameter and report a metric per asset
    Sensitivity(SensitivityArgs),
    /// Print the sample input
    Sample,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Compute(args) => commands::layers::run_compute(args),
        Commands::Chart(args) => commands::layers::run_chart(args),
        Commands::Edit(args) => commands::edit::run_edit(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Sample => commands::layers::run_sample(),
        Commands::Version => {
            println!("layers {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
