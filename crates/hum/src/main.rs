//! hum - structure-aware MIDI humanizer
//!
//! Subcommands:
//! - `hum humanize <in> -o <out>` - Humanize a Standard MIDI File
//! - `hum analyze <in>` - Show phrases, chords and melody per track
//! - `hum notes <in>` - Dump notes with tick and second timing as JSON
//! - `hum inspect <in>` - Show header fields and event counts
//! - `hum config` - Print the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use humconf::HumConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod settings;

use settings::{HumanizeFlags, Overrides};

#[derive(Parser)]
#[command(name = "hum")]
#[command(about = "Structure-aware MIDI humanizer")]
#[command(version)]
struct Cli {
    /// Config file used in place of ./humanize.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Humanize a MIDI file
    Humanize {
        input: PathBuf,

        /// Where to write the humanized file
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the analysis that shaped the output as JSON
        #[arg(long)]
        analysis: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,

        #[command(flatten)]
        flags: HumanizeFlags,
    },

    /// Analyze phrases, chords, melody and dynamics
    Analyze {
        input: PathBuf,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// List every note with tick and second timing as JSON
    Notes {
        input: PathBuf,

        /// Use the file's first tempo instead of 120 BPM
        #[arg(long)]
        honor_tempo: bool,
    },

    /// Show header fields and per-track event counts
    Inspect {
        input: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn init_logging(level: &str, verbose: bool) {
    let fallback = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = HumConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_logging(&config.logging.level, cli.verbose);
    tracing::debug!(files = ?sources.files, env = ?sources.env_overrides, "config loaded");

    match cli.command {
        Commands::Humanize {
            input,
            output,
            analysis,
            overrides,
            flags,
        } => {
            overrides.apply(&mut config);
            flags.apply(&mut config);
            commands::humanize(&config, &input, &output, analysis.as_deref())?;
        }
        Commands::Analyze {
            input,
            json,
            overrides,
        } => {
            overrides.apply(&mut config);
            commands::analyze(&config, &input, json)?;
        }
        Commands::Notes { input, honor_tempo } => {
            if honor_tempo {
                config.analysis.honor_tempo = true;
            }
            commands::notes(&config, &input)?;
        }
        Commands::Inspect { input, json } => {
            commands::inspect(&input, json)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}
