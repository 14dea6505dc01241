//! Showreel: trajectory summarization for recorded RL agent episodes.
//!
//! Provides one subcommand per summarization strategy, plus scoring:
//!
//! - `importance`    -- Score every state and write a `state,importance` CSV
//! - `select`        -- Greedy HIGHLIGHTS selection
//! - `select-div`    -- Diversity-aware HIGHLIGHTS-DIV selection
//! - `random-select` -- Random baseline selection
//! - `inspect`       -- Inspect a saved summary manifest

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use showreel::config::ShowreelConfig;
use showreel::importance::{compute_importance, ImportancePolicy};
use showreel::selection::{highlights, highlights_div, random_state_selection};
use showreel::trajectory::io::{self, SummaryManifest};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Showreel: trajectory summarization for recorded RL agent episodes.
#[derive(Parser)]
#[command(name = "showreel", version, about)]
struct Cli {
    /// Path to a JSON configuration file (uses defaults if not provided).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Importance policy override.
    #[arg(long, global = true)]
    policy: Option<ImportancePolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every state's importance and write a CSV.
    Importance {
        /// Directory of per-state q-value text files.
        #[arg(long, default_value = "stream/q_values")]
        q_values: PathBuf,

        /// Path for the resulting CSV.
        #[arg(long, default_value = "stream/import.csv")]
        output: PathBuf,
    },

    /// Greedy HIGHLIGHTS selection.
    Select {
        /// Directory of per-state q-value text files.
        #[arg(long, default_value = "stream/q_values")]
        q_values: PathBuf,

        /// Path for the summary manifest.
        #[arg(long, default_value = "stream/summary.json")]
        output: PathBuf,

        #[command(flatten)]
        overrides: SelectionOverrides,
    },

    /// Diversity-aware HIGHLIGHTS-DIV selection.
    SelectDiv {
        /// Directory of per-state q-value text files.
        #[arg(long, default_value = "stream/q_values")]
        q_values: PathBuf,

        /// Directory of per-state feature-vector text files.
        #[arg(long, default_value = "stream/features")]
        features: PathBuf,

        /// Path for the summary manifest.
        #[arg(long, default_value = "stream/summary_div.json")]
        output: PathBuf,

        #[command(flatten)]
        overrides: SelectionOverrides,
    },

    /// Random baseline selection.
    RandomSelect {
        /// Directory of per-state q-value text files.
        #[arg(long, default_value = "stream/q_values")]
        q_values: PathBuf,

        /// Path for the summary manifest.
        #[arg(long, default_value = "stream/summary_random.json")]
        output: PathBuf,

        /// Seed for reproducible draws.
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        overrides: SelectionOverrides,
    },

    /// Inspect a saved summary manifest.
    Inspect {
        /// Path to the manifest JSON file.
        #[arg(default_value = "stream/summary.json")]
        path: PathBuf,
    },
}

/// Selection parameters that may be overridden on the command line.
#[derive(Debug, Clone, clap::Args)]
struct SelectionOverrides {
    /// Number of important states in the summary (excluding context).
    #[arg(long)]
    budget: Option<usize>,

    /// States shown on each side of a chosen state.
    #[arg(long)]
    context_length: Option<usize>,

    /// States to skip beyond the context window between chosen states.
    #[arg(long)]
    minimum_gap: Option<usize>,
}

impl SelectionOverrides {
    fn apply(&self, config: &mut ShowreelConfig) {
        if let Some(budget) = self.budget {
            config.selection.budget = budget;
        }
        if let Some(context_length) = self.context_length {
            config.selection.context_length = context_length;
        }
        if let Some(minimum_gap) = self.minimum_gap {
            config.selection.minimum_gap = minimum_gap;
        }
    }
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // Initialise tracing (reads RUST_LOG env var, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load or create configuration.
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str::<ShowreelConfig>(&text)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        }
        None => ShowreelConfig::default(),
    };
    if let Some(policy) = cli.policy {
        config.importance.policy = policy;
    }

    match cli.command {
        Commands::Importance { q_values, output } => cmd_importance(&config, &q_values, &output),
        Commands::Select {
            q_values,
            output,
            overrides,
        } => {
            overrides.apply(&mut config);
            cmd_select(&config, &q_values, &output)
        }
        Commands::SelectDiv {
            q_values,
            features,
            output,
            overrides,
        } => {
            overrides.apply(&mut config);
            cmd_select_div(&config, &q_values, &features, &output)
        }
        Commands::RandomSelect {
            q_values,
            output,
            seed,
            overrides,
        } => {
            overrides.apply(&mut config);
            if seed.is_some() {
                config.selection.seed = seed;
            }
            cmd_random_select(&config, &q_values, &output)
        }
        Commands::Inspect { path } => cmd_inspect(&path),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_importance(config: &ShowreelConfig, q_values_dir: &PathBuf, output: &PathBuf) -> Result<()> {
    tracing::info!(dir = %q_values_dir.display(), "Scoring state importance");

    let q_values = io::read_q_value_files(q_values_dir)?;
    let importance = compute_importance(&q_values, config.importance.policy)?;
    io::write_importance_csv(output, &importance)?;

    tracing::info!(
        states = importance.len(),
        path = %output.display(),
        "Saved importance scores"
    );
    Ok(())
}

fn cmd_select(config: &ShowreelConfig, q_values_dir: &PathBuf, output: &PathBuf) -> Result<()> {
    tracing::info!("Running HIGHLIGHTS selection");

    let store = io::load_store(q_values_dir, None)?;
    let importance = compute_importance(store.q_values(), config.importance.policy)?;
    let summary = highlights(&store, &importance, &config.selection)?;

    let manifest = SummaryManifest::new("highlights", config.selection.clone(), summary);
    manifest.save_to_file(output)?;

    tracing::info!(
        chosen = manifest.summary_states.len(),
        path = %output.display(),
        "Summary saved"
    );
    Ok(())
}

fn cmd_select_div(
    config: &ShowreelConfig,
    q_values_dir: &PathBuf,
    features_dir: &PathBuf,
    output: &PathBuf,
) -> Result<()> {
    tracing::info!("Running HIGHLIGHTS-DIV selection");

    let store = io::load_store(q_values_dir, Some(features_dir.as_path()))?;
    let importance = compute_importance(store.q_values(), config.importance.policy)?;
    let summary = highlights_div(&store, &importance, &config.selection, &config.diversity)?;

    let manifest = SummaryManifest::new("highlights_div", config.selection.clone(), summary);
    manifest.save_to_file(output)?;

    tracing::info!(
        chosen = manifest.summary_states.len(),
        path = %output.display(),
        "Summary saved"
    );
    Ok(())
}

fn cmd_random_select(
    config: &ShowreelConfig,
    q_values_dir: &PathBuf,
    output: &PathBuf,
) -> Result<()> {
    tracing::info!(seeded = config.selection.seed.is_some(), "Running random selection");

    let store = io::load_store(q_values_dir, None)?;
    let summary = random_state_selection(&store, &config.selection)?;

    let manifest = SummaryManifest::new("random", config.selection.clone(), summary);
    manifest.save_to_file(output)?;

    tracing::info!(
        chosen = manifest.summary_states.len(),
        path = %output.display(),
        "Summary saved"
    );
    Ok(())
}

fn cmd_inspect(path: &PathBuf) -> Result<()> {
    let manifest = SummaryManifest::load_from_file(path)?;

    println!("Summary: {}", path.display());
    println!("  Id: {}", manifest.id);
    println!(
        "  Generated: {}",
        manifest.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Algorithm: {}", manifest.algorithm);
    println!(
        "  Budget: {} (context {}, gap {})",
        manifest.selection.budget,
        manifest.selection.context_length,
        manifest.selection.minimum_gap
    );
    println!();

    println!(
        "Chosen states ({}): {:?}",
        manifest.summary_states.len(),
        manifest.summary_states
    );
    println!(
        "Displayed states (with context): {}",
        manifest.summary_states_with_context.len()
    );

    Ok(())
}
