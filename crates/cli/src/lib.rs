pub mod commands;
pub mod export;
pub mod loader;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use recal_core::config::{AppConfig, ConfigOverrides, InputFormat, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "recal",
    about = "Calibrated re-ranking CLI",
    long_about = "Rerank recommendation lists so their attribute mix tracks each user's \
                  interaction history, then export the resulting distribution tables.",
    after_help = "Examples:\n  recal run --catalog data/catalog.csv\n  recal run --tradeoff 0.9 --top-k 20\n  recal inspect --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a recal.toml config file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Rerank the worst-calibrated users and export the result tables")]
    Run {
        #[arg(long, help = "Catalog file (item_id, title, attributes)")]
        catalog: Option<PathBuf>,
        #[arg(long, help = "Interaction file (user_id, item_id, rating, timestamp)")]
        interactions: Option<PathBuf>,
        #[arg(long, help = "Recommendation file (user_id, item_id, score)")]
        recommendations: Option<PathBuf>,
        #[arg(long, help = "Input delimiter format: csv or tsv")]
        format: Option<InputFormat>,
        #[arg(long, help = "Number of items per reranked list")]
        top_k: Option<usize>,
        #[arg(long, help = "Calibration trade-off in [0, 1]; 0 keeps the original ranking")]
        tradeoff: Option<f64>,
        #[arg(long, help = "Directory for the exported CSV tables")]
        output_dir: Option<PathBuf>,
        #[arg(long, help = "Keep already-interacted items in the candidate pool")]
        keep_seen: bool,
    },
    #[command(about = "Load the configured inputs and report dataset shape")]
    Inspect {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let (overrides, action) = match cli.command {
        Command::Run {
            catalog,
            interactions,
            recommendations,
            format,
            top_k,
            tradeoff,
            output_dir,
            keep_seen,
        } => {
            let overrides = ConfigOverrides {
                top_k,
                tradeoff,
                filter_seen: keep_seen.then_some(false),
                format,
                catalog,
                interactions,
                recommendations,
                output_dir,
                ..ConfigOverrides::default()
            };
            (overrides, Action::Run)
        }
        Command::Inspect { json } => (ConfigOverrides::default(), Action::Inspect { json }),
    };

    let options = LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        overrides,
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::from(2);
        }
    };

    init_logging(&config);

    let result = match action {
        Action::Run => commands::run::run(&config),
        Action::Inspect { json } => commands::inspect::run(&config, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

enum Action {
    Run,
    Inspect { json: bool },
}

fn init_logging(config: &AppConfig) {
    use recal_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}
