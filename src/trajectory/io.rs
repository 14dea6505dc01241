//! Reading per-state data files and writing summary outputs.
//!
//! An agent run leaves one text file per state on disk, named
//! `<anything>_<state index>.<ext>` and containing a bracketed,
//! whitespace-separated float list, e.g. `[0.12 3.4 -1.0]`. Feature files may
//! wrap the list across several lines. These loaders parse whole directories
//! of such files into the mappings the [`TrajectoryStore`] is built from.
//!
//! The writers produce what the (external) rendering pipeline consumes: a
//! JSON manifest with the chosen state indices, and a `state,importance` CSV
//! for inspection.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SelectionConfig;
use crate::selection::Summary;
use crate::trajectory::types::TrajectoryStore;

// ---------------------------------------------------------------------------
// Per-state file loaders
// ---------------------------------------------------------------------------

/// Parse the trailing state index from a file name like `q_values_123.txt`.
fn parse_state_index(path: &Path) -> Result<usize> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("non-UTF8 file name: {}", path.display()))?;

    let last = stem.rsplit('_').next().unwrap_or(stem);
    let digits: String = last.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        bail!("no state index in file name: {}", path.display());
    }
    digits
        .parse::<usize>()
        .with_context(|| format!("state index out of range in {}", path.display()))
}

/// Parse a bracketed float list, tolerating newlines and repeated spaces.
fn parse_float_list(text: &str) -> Result<Vec<f64>> {
    text.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .with_context(|| format!("invalid float: {tok:?}"))
        })
        .collect()
}

/// Read one float-list file per state from `dir`.
///
/// Only `.txt` files are considered; anything else in the directory is
/// skipped. Returns the mapping state index -> parsed vector.
fn read_vector_files(dir: &Path) -> Result<BTreeMap<usize, Vec<f64>>> {
    let mut vectors = BTreeMap::new();

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }

        let state = parse_state_index(&path)?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let vector = parse_float_list(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if vectors.insert(state, vector).is_some() {
            bail!("duplicate file for state {state} in {}", dir.display());
        }
    }

    debug!(dir = %dir.display(), states = vectors.len(), "loaded per-state files");
    Ok(vectors)
}

/// Read per-state q-value files from a directory.
pub fn read_q_value_files(dir: impl AsRef<Path>) -> Result<BTreeMap<usize, Vec<f64>>> {
    read_vector_files(dir.as_ref())
}

/// Read per-state feature-vector files from a directory.
pub fn read_feature_files(dir: impl AsRef<Path>) -> Result<BTreeMap<usize, Vec<f64>>> {
    read_vector_files(dir.as_ref())
}

/// Load a [`TrajectoryStore`] from a q-value directory and an optional
/// feature directory.
pub fn load_store(
    q_values_dir: impl AsRef<Path>,
    features_dir: Option<&Path>,
) -> Result<TrajectoryStore> {
    let q_values = read_q_value_files(q_values_dir)?;
    let store = match features_dir {
        Some(dir) => {
            let features = read_feature_files(dir)?;
            TrajectoryStore::with_features(q_values, features)?
        }
        None => TrajectoryStore::new(q_values)?,
    };
    Ok(store)
}

// ---------------------------------------------------------------------------
// Summary manifest
// ---------------------------------------------------------------------------

/// The persisted result of one summarization run.
///
/// The rendering pipeline reads `summary_states_with_context` to decide which
/// frames to put in the video; everything else is provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryManifest {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// UTC timestamp of the run.
    pub generated_at: DateTime<Utc>,
    /// Which selector produced the summary ("highlights", "highlights_div",
    /// "random").
    pub algorithm: String,
    /// The selection parameters the run used.
    pub selection: SelectionConfig,
    /// Accepted important states, ascending.
    pub summary_states: Vec<usize>,
    /// All displayed states (accepted plus context), ascending, deduplicated.
    pub summary_states_with_context: Vec<usize>,
}

impl SummaryManifest {
    /// Build a manifest for a finished run, stamping a fresh id and the
    /// current time.
    pub fn new(algorithm: &str, selection: SelectionConfig, summary: Summary) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            algorithm: algorithm.to_string(),
            selection,
            summary_states: summary.states,
            summary_states_with_context: summary.states_with_context,
        }
    }

    /// Serialize the manifest to pretty JSON at `path`.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write manifest to {}", path.display()))?;
        Ok(())
    }

    /// Load a manifest from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse manifest from {}", path.display()))
    }
}

/// Write a `state,importance` CSV, states ascending.
pub fn write_importance_csv(
    path: impl AsRef<Path>,
    importance: &BTreeMap<usize, f64>,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut out = String::from("state,importance\n");
    for (state, score) in importance {
        out.push_str(&format!("{state},{score}\n"));
    }
    std::fs::write(path, out)
        .with_context(|| format!("failed to write importance CSV to {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_float_list_single_line() {
        let v = parse_float_list("[1.0 -2.5 3]").unwrap();
        assert_eq!(v, vec![1.0, -2.5, 3.0]);
    }

    #[test]
    fn test_parse_float_list_multiline() {
        let v = parse_float_list("[0.1 0.2\n 0.3   0.4]\n").unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_parse_float_list_garbage() {
        assert!(parse_float_list("[1.0 pelican]").is_err());
    }

    #[test]
    fn test_parse_state_index() {
        assert_eq!(
            parse_state_index(Path::new("stream/q_values_42.txt")).unwrap(),
            42
        );
        assert_eq!(parse_state_index(Path::new("state_0.txt")).unwrap(), 0);
        assert!(parse_state_index(Path::new("no_index_here.txt")).is_err());
    }

    #[test]
    fn test_read_q_value_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("q_values_0.txt"), "[1.0 2.0]").unwrap();
        std::fs::write(dir.path().join("q_values_3.txt"), "[0.5 0.1]").unwrap();
        // Non-txt files are skipped.
        std::fs::write(dir.path().join("frame_1.npy"), [0u8; 4]).unwrap();

        let q = read_q_value_files(dir.path()).unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q[&0], vec![1.0, 2.0]);
        assert_eq!(q[&3], vec![0.5, 0.1]);
    }

    #[test]
    fn test_duplicate_state_file_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a_1.txt"), "[1.0]").unwrap();
        std::fs::write(dir.path().join("b_1.txt"), "[2.0]").unwrap();

        assert!(read_q_value_files(dir.path()).is_err());
    }

    #[test]
    fn test_manifest_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/summary.json");

        let manifest = SummaryManifest::new(
            "highlights",
            SelectionConfig::default(),
            Summary {
                states: vec![10, 50],
                states_with_context: vec![5, 6, 7, 45, 46],
            },
        );
        manifest.save_to_file(&path).unwrap();

        let loaded = SummaryManifest::load_from_file(&path).unwrap();
        assert_eq!(loaded.id, manifest.id);
        assert_eq!(loaded.algorithm, "highlights");
        assert_eq!(loaded.summary_states, vec![10, 50]);
    }

    #[test]
    fn test_write_importance_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import.csv");

        let mut importance = BTreeMap::new();
        importance.insert(0, 4.0);
        importance.insert(2, 0.5);
        write_importance_csv(&path, &importance).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "state,importance\n0,4\n2,0.5\n");
    }
}
