//! mktmv CLI: run and inspect multiverse experiments.
//!
//! Commands:
//! - `run`: evaluate every model spec against every feature-group combination
//! - `validate`: parse and validate an experiment file
//! - `groups`: list the feature groups and the columns they use
//! - `topics`: print diagnostics for a topic-model file, optionally scored on a dataset

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mktmv_core::capability::diagnostics::{token_weights, topic_centers, topic_similarity};
use mktmv_core::{ExtractorHandles, FeatureGroup};
use mktmv_runner::{
    load_frame, load_sentiment_lexicon, load_topic_model, save_artifacts, split_target,
    ExperimentConfig, Multiverse, ResultsTable,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "mktmv", about = "mktmv: multiverse analysis of market-news feature sets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a multiverse experiment over a dataset.
    Run {
        /// Dataset file (.csv or .parquet).
        #[arg(long)]
        data: PathBuf,

        /// Target column name.
        #[arg(long)]
        target: String,

        /// Experiment TOML. Defaults to the built-in research setup.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Sentiment lexicon JSON (needed by the sentiment group).
        #[arg(long)]
        sentiment_lexicon: Option<PathBuf>,

        /// Topic-model JSON (needed by the newstheme group).
        #[arg(long)]
        topic_model: Option<PathBuf>,

        /// Output directory for results.csv / results.json.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Evaluate (model, combination) pairs in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Parse and validate an experiment file.
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
    /// List feature groups and their columns.
    Groups,
    /// Print topic similarity and top terms for a topic-model file.
    Topics {
        #[arg(long)]
        topic_model: PathBuf,

        /// Terms listed per topic.
        #[arg(long, default_value_t = 10)]
        top_n: usize,

        /// Dataset whose text column is scored for per-topic centers.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Text column scored when --data is given.
        #[arg(long, default_value = "theme_sub")]
        text_column: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            target,
            config,
            sentiment_lexicon,
            topic_model,
            output_dir,
            parallel,
        } => run_multiverse_cmd(
            &data,
            &target,
            config.as_deref(),
            sentiment_lexicon.as_deref(),
            topic_model.as_deref(),
            &output_dir,
            parallel,
        ),
        Commands::Validate { config } => validate_cmd(&config),
        Commands::Groups => {
            print_groups();
            Ok(())
        }
        Commands::Topics {
            topic_model,
            top_n,
            data,
            text_column,
        } => topics_cmd(&topic_model, top_n, data.as_deref(), &text_column),
    }
}

fn load_config(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("failed to load experiment {}", path.display())),
        None => Ok(ExperimentConfig::default()),
    }
}

fn build_handles(lexicon: Option<&Path>, topics: Option<&Path>) -> Result<ExtractorHandles> {
    let mut handles = ExtractorHandles::new();
    if let Some(path) = lexicon {
        handles = handles.with_sentiment(Arc::new(load_sentiment_lexicon(path)?));
    }
    if let Some(path) = topics {
        handles = handles.with_topic(Arc::new(load_topic_model(path)?));
    }
    Ok(handles)
}

fn run_multiverse_cmd(
    data: &Path,
    target: &str,
    config_path: Option<&Path>,
    lexicon: Option<&Path>,
    topics: Option<&Path>,
    output_dir: &Path,
    parallel: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.parallel |= parallel;
    let run_id = config.run_id().context("failed to hash experiment config")?;
    info!(run_id = %run_id, pairs = config.n_pairs(), "experiment loaded");

    let handles = build_handles(lexicon, topics)?;
    let multiverse = Multiverse::from_config(&config, handles)?;

    let df = load_frame(data)?;
    let (features, y) = split_target(&df, target)?;

    let outcome = multiverse.run_with_progress(&features, &y, |index, total, record| {
        println!(
            "[{}/{}] {:<48} {:>10.4} ± {:.4}",
            index + 1,
            total,
            record.label,
            record.score_mean,
            record.score_std
        );
    });

    let table = match outcome {
        Ok(table) => table,
        Err(err) => {
            if let Some(partial) = err.partial_results().filter(|t| !t.is_empty()) {
                let dir = save_artifacts(partial, output_dir, Some(&run_id))?;
                eprintln!("Partial results ({} rows) saved to: {}", partial.len(), dir.display());
            }
            return Err(err.into());
        }
    };

    print_ranking(&table);
    let run_dir = save_artifacts(&table, output_dir, Some(&run_id))?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn validate_cmd(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    println!(
        "OK: {} models × {} combinations = {} pairs",
        config.models.len(),
        config.combinations.len(),
        config.n_pairs()
    );
    println!("Run id: {}", config.run_id()?);
    Ok(())
}

fn print_groups() {
    println!("{:<12} {:<12} columns", "group", "encodes");
    for group in FeatureGroup::ALL {
        println!(
            "{:<12} {:<12} {}",
            group.as_str(),
            group.encoded_column().unwrap_or("-"),
            group.source_columns().join(", ")
        );
    }
}

fn topics_cmd(path: &Path, top_n: usize, data: Option<&Path>, text_column: &str) -> Result<()> {
    let model = load_topic_model(path)?;
    let weights = token_weights(model.components(), model.vocabulary(), top_n)?;
    let similarity = topic_similarity(model.components())?;
    println!("Top terms per topic\n{weights}");
    println!("Topic similarity\n{similarity}");
    if let Some(data) = data {
        let df = load_frame(data)?;
        let centers = topic_centers(&df, text_column, &model)
            .with_context(|| format!("failed to score column {text_column}"))?;
        println!("Topic centers ({text_column})\n{centers}");
    }
    Ok(())
}

fn print_ranking(table: &ResultsTable) {
    println!();
    println!("=== Multiverse Results ({} pairs) ===", table.len());
    println!("{:<4} {:<48} {:>10} {:>8}  params", "rank", "label", "mean", "std");
    for (rank, record) in table.sorted_by_score().iter().enumerate() {
        println!(
            "{:<4} {:<48} {:>10.4} {:>8.4}  {}",
            rank + 1,
            record.label,
            record.score_mean,
            record.score_std,
            mktmv_core::params::format_params(&record.best_params)
        );
    }
}
