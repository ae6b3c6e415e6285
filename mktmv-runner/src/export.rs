//! Results export: CSV and JSON artifacts.
//!
//! The JSON manifest carries a `schema_version`; newer versions are rejected
//! on load. Fitted estimators are not persisted, only their names.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use mktmv_core::params::format_params;
use serde::{Deserialize, Serialize};

use crate::results::{RecordRow, ResultsTable};

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Persisted form of a results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Hash of the experiment config, when known.
    #[serde(default)]
    pub run_id: Option<String>,
    pub records: Vec<RecordRow>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ResultsManifest {
    pub fn new(table: &ResultsTable, run_id: Option<&str>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: run_id.map(str::to_string),
            records: table.rows(),
        }
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(table: &ResultsTable, run_id: Option<&str>) -> Result<String> {
    serde_json::to_string_pretty(&ResultsManifest::new(table, run_id))
        .context("failed to serialize results to JSON")
}

pub fn import_json(json: &str) -> Result<ResultsManifest> {
    let manifest: ResultsManifest =
        serde_json::from_str(json).context("failed to deserialize results manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// One line per record, in run order.
///
/// Columns: model, combination, label, features, output_features, estimator,
/// score_mean, score_std, best_params, mode, n_trials
pub fn export_csv(table: &ResultsTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "model",
        "combination",
        "label",
        "features",
        "output_features",
        "estimator",
        "score_mean",
        "score_std",
        "best_params",
        "mode",
        "n_trials",
    ])?;

    for r in table.records() {
        wtr.write_record([
            r.model_name.clone(),
            r.combination.label(),
            r.label.clone(),
            r.feature_names.join(";"),
            r.output_features.join(";"),
            r.estimator.name().to_string(),
            format!("{:.6}", r.score_mean),
            format!("{:.6}", r.score_std),
            format_params(&r.best_params),
            r.mode.to_string(),
            r.n_trials.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

impl ResultsTable {
    pub fn to_csv(&self) -> Result<String> {
        export_csv(self)
    }
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `results.csv` and `results.json` into a fresh
/// `multiverse_{timestamp}/` directory under `output_dir`.
///
/// Returns the created directory.
pub fn save_artifacts(
    table: &ResultsTable,
    output_dir: &Path,
    run_id: Option<&str>,
) -> Result<PathBuf> {
    let dirname = format!("multiverse_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("results.csv"), export_csv(table)?)?;
    std::fs::write(run_dir.join("results.json"), export_json(table, run_id)?)?;

    Ok(run_dir)
}

/// Load the manifest written by [`save_artifacts`].
pub fn load_artifacts(dir: &Path) -> Result<ResultsManifest> {
    let path = dir.join("results.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
