use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use schemars::schema_for;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracegen_cli::completions;
use tracegen_cli::config::ProfileConfig;
use tracegen_core::{ProgressHandle, ProgressReporter, WorkloadGenerator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Tracegen: deterministic YCSB-style request trace generator
///
/// Workloads are described by TOML profiles; the generated trace can be
/// replayed against any key-value store.
///
/// Example usage:
///   tracegen generate -P profiles/ycsb-a.toml
///   tracegen generate -P profiles/ycsb-e.toml --set workload.n_operations=1000000
///   tracegen generate -P profiles/ycsb-b.toml --set output.requests.export_path=/tmp/b.trace
///   tracegen completions bash > ~/.local/share/bash-completion/completions/tracegen
///
/// See profiles/ directory for example configurations.
#[derive(Parser)]
#[command(name = "tracegen")]
#[command(version, about = "Deterministic request trace generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a request trace from a profile
    Generate {
        /// Path to TOML profile
        #[arg(short = 'P', long, required = true)]
        profile: PathBuf,

        /// Override any profile value using dot notation (repeatable)
        ///
        /// Examples:
        ///   --set workload.n_records=100000
        ///   --set workload.data_distribution=LATEST
        ///   --set output.requests.export_path=/tmp/requests.trace
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Do not draw the progress bar
        #[arg(long)]
        no_progress: bool,

        /// Print the generation summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for profile files
    Schema,

    /// List all valid paths for --set (used by shell completions)
    #[command(hide = true)]
    CompletePaths,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match cli.command {
        Commands::Completions { shell } => {
            let bin_name = "tracegen";
            match shell {
                Shell::Bash => println!("{}", completions::generate_bash_completion(bin_name)),
                _ => {
                    let mut cmd = Cli::command();
                    generate(shell, &mut cmd, bin_name.to_string(), &mut io::stdout());
                }
            }
            Ok(())
        }
        Commands::Schema => {
            let schema = schema_for!(ProfileConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        Commands::CompletePaths => {
            for path in completions::get_config_paths() {
                println!("{}", path);
            }
            Ok(())
        }
        Commands::Generate { profile, set, no_progress, json } => {
            run_generate(profile, set, !no_progress, json)
        }
    }
}

fn run_generate(
    profile: PathBuf,
    set: Vec<String>,
    show_progress: bool,
    json: bool,
) -> anyhow::Result<()> {
    tracing::info!("Loading profile: {}", profile.display());

    let profile_config = ProfileConfig::from_file_with_overrides(&profile, &set)?;
    profile_config.validate()?;
    if let Some(description) = &profile_config.description {
        tracing::info!("Description: {}", description);
    }

    let config = profile_config.to_configuration();
    tracing::info!(
        "Workload: {} records, {} operations, {:?} keys (read {}, update {}, insert {}, scan {})",
        config.n_records,
        config.n_operations,
        config.data_distribution,
        config.read_proportion,
        config.update_proportion,
        config.insert_proportion,
        config.scan_proportion
    );

    let progress = ProgressHandle::new(config.total_records());
    let mut generator = WorkloadGenerator::new(config)?;

    let reporter = if show_progress {
        Some(ProgressReporter::spawn(progress.clone(), PROGRESS_INTERVAL)?)
    } else {
        None
    };
    let result = generator.generate_to_file_with_progress(&progress);
    // Join the display thread before any totals are printed.
    if let Some(reporter) = reporter {
        reporter.finish();
    }
    let summary = result.context("Trace generation failed")?;

    tracing::info!(
        "Wrote {} records ({} requests) to {}",
        summary.records_written,
        summary.requests_emitted,
        summary.export_path.display()
    );
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
