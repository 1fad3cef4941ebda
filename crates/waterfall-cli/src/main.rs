mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::analytics::{AnalyzeArgs, ConcentrationArgs, ScenariosArgs};
use commands::portfolio::SummarizeArgs;
use commands::structure::{AllocateArgs, ValidateArgs};

/// Tranche structuring and waterfall allocation
#[derive(Parser)]
#[command(
    name = "wfa",
    version,
    about = "Tranche structuring and waterfall allocation",
    long_about = "A CLI for sizing tranche structures against a loan portfolio with decimal \
                  precision. Validates structures, allocates the capital stack, measures \
                  investor concentration (HHI) and projects capital scenarios."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine config file (.json, .yaml or .yml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log filter, e.g. "debug" or "waterfall_core=trace" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a structure against the save rules
    Validate(ValidateArgs),
    /// Size each tranche and compute structure metrics
    Allocate(AllocateArgs),
    /// Investor rollup and HHI for assigned tranches
    Concentration(ConcentrationArgs),
    /// Capital and return projections per scenario
    Scenarios(ScenariosArgs),
    /// Full run: allocation, concentration and all scenarios
    Analyze(AnalyzeArgs),
    /// Reduce loan records to a portfolio aggregate
    Summarize(SummarizeArgs),
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

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    // Logs go to stderr so stdout stays parseable.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let engine_config = match config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(2);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Validate(args) => commands::structure::run_validate(args, &engine_config),
        Commands::Allocate(args) => commands::structure::run_allocate(args, &engine_config),
        Commands::Concentration(args) => commands::analytics::run_concentration(args),
        Commands::Scenarios(args) => commands::analytics::run_scenarios(args, &engine_config),
        Commands::Analyze(args) => commands::analytics::run_analyze(args, &engine_config),
        Commands::Summarize(args) => commands::portfolio::run_summarize(args),
        Commands::Version => {
            println!("wfa {}", env!("CARGO_PKG_VERSION"));
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
