//! Orchestration: loading document pairs, stripping ignored paths, running
//! the diff engine, and aggregating outcomes across directory pairs.

use crate::accessor::AccessorPath;
use crate::editor;
use crate::engine::DiffEngine;
use crate::report;
use jcompare_common::{CompareError, PairStatus, RenderOptions};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Settings for one comparison run
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Paths stripped from both documents before diffing
    pub ignore: Vec<AccessorPath>,
    /// Report entry budget before truncation, 0 = unlimited
    pub max_items: usize,
    /// Compare sequences as multisets
    pub order_insensitive: bool,
    /// Flat rendering instead of the nested grouped report
    pub flat: bool,
    pub render: RenderOptions,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            max_items: 100,
            order_insensitive: true,
            flat: false,
            render: RenderOptions::default(),
        }
    }
}

/// Outcome of one document pair, with the rendered report when differences
/// were found
#[derive(Debug, Clone)]
pub struct PairResult {
    pub status: PairStatus,
    pub report: Option<String>,
}

/// Which documents two directories hold, by name-set algebra
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    /// Names present only in the old directory, sorted
    pub missing: Vec<String>,
    /// Names present only in the new directory, sorted
    pub extra: Vec<String>,
    /// Comparable (old, new) path pairs, sorted by name
    pub pairs: Vec<(PathBuf, PathBuf)>,
}

/// Aggregated outcomes of a directory comparison
#[derive(Debug, Clone)]
pub struct DirectoryReport {
    /// Per-pair results in sorted name order
    pub outcomes: Vec<(String, PairResult)>,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
}

impl DirectoryReport {
    /// True only when every pair is Ok and no document is missing or extra
    pub fn success(&self) -> bool {
        self.missing.is_empty()
            && self.extra.is_empty()
            && self.outcomes.iter().all(|(_, result)| result.status.is_ok())
    }
}

/// Read and parse one JSON document
pub fn load_document(path: &Path) -> Result<Value, CompareError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CompareError::Parse(format!("{}: {}", path.display(), e)))
}

/// Decide which document pairs to compare.
///
/// Two directories pair every shared `*.json` name; two files pair exactly
/// themselves. Mismatched kinds or a non-existent path are invocation errors,
/// raised before any pair is processed.
pub fn list_pairs(path_a: &Path, path_b: &Path) -> Result<DirectoryListing, CompareError> {
    for path in [path_a, path_b] {
        if !path.exists() {
            return Err(CompareError::Invocation(format!(
                "path does not exist: {}",
                path.display()
            )));
        }
    }

    if path_a.is_dir() && path_b.is_dir() {
        let old_names = document_names(path_a)?;
        let new_names = document_names(path_b)?;

        let pairs = old_names
            .intersection(&new_names)
            .map(|name| (path_a.join(name), path_b.join(name)))
            .collect();
        let missing = old_names.difference(&new_names).cloned().collect();
        let extra = new_names.difference(&old_names).cloned().collect();

        Ok(DirectoryListing {
            missing,
            extra,
            pairs,
        })
    } else if path_a.is_file() && path_b.is_file() {
        Ok(DirectoryListing {
            missing: Vec::new(),
            extra: Vec::new(),
            pairs: vec![(path_a.to_path_buf(), path_b.to_path_buf())],
        })
    } else {
        Err(CompareError::Invocation(
            "both arguments must be files or both must be directories".to_string(),
        ))
    }
}

/// Names of documents with the recognized extension, sorted
fn document_names(dir: &Path) -> Result<BTreeSet<String>, CompareError> {
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_document_file(&path) {
            if let Some(name) = path.file_name() {
                names.insert(name.to_string_lossy().to_string());
            }
        }
    }
    Ok(names)
}

/// Check if a file path appears to be JSON based on extension
pub fn is_document_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase() == "json")
        .unwrap_or(false)
}

/// Driver for single-pair and directory-pair comparisons
pub struct ComparisonDriver {
    options: CompareOptions,
}

impl ComparisonDriver {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    /// Compare one document pair: load, strip ignored paths from both sides,
    /// diff, and render the report when differences remain.
    pub fn compare_pair(&self, path_a: &Path, path_b: &Path) -> PairResult {
        let (mut old, mut new) = match (load_document(path_a), load_document(path_b)) {
            (Ok(old), Ok(new)) => (old, new),
            (Err(e), _) | (_, Err(e)) => {
                warn!("failed to load document: {}", e);
                return PairResult {
                    status: PairStatus::FileError,
                    report: None,
                };
            }
        };

        // An ignored field must vanish from both comparison baselines, or a
        // field present on only one side would still register as a change.
        for path in &self.options.ignore {
            editor::delete(&mut old, path);
            editor::delete(&mut new, path);
        }

        let engine = DiffEngine::new().with_order_insensitive(self.options.order_insensitive);
        let changes = engine.diff(&old, &new);
        if changes.is_empty() {
            debug!("{} and {} are structurally equal", path_a.display(), path_b.display());
            return PairResult {
                status: PairStatus::Ok,
                report: None,
            };
        }

        let (entries, note) = report::flatten(&changes, self.options.max_items);
        let rendered = if self.options.flat {
            report::render_flat(&entries, note.as_deref(), &self.options.render)
        } else {
            let tree = report::nest(&entries, self.options.render.max_preview_len);
            report::render(&tree, note.as_deref(), &self.options.render)
        };

        PairResult {
            status: PairStatus::Bad,
            report: Some(rendered),
        }
    }

    /// Compare every shared document name across two directories, strictly in
    /// sorted name order.
    pub fn compare_directories(
        &self,
        old_dir: &Path,
        new_dir: &Path,
    ) -> Result<DirectoryReport, CompareError> {
        let listing = list_pairs(old_dir, new_dir)?;
        info!(
            pairs = listing.pairs.len(),
            missing = listing.missing.len(),
            extra = listing.extra.len(),
            "comparing directories"
        );

        let mut outcomes = Vec::with_capacity(listing.pairs.len());
        for (old_path, new_path) in &listing.pairs {
            let name = old_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            outcomes.push((name, self.compare_pair(old_path, new_path)));
        }

        Ok(DirectoryReport {
            outcomes,
            missing: listing.missing,
            extra: listing.extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_json(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn driver() -> ComparisonDriver {
        ComparisonDriver::new(CompareOptions::default())
    }

    #[test]
    fn test_compare_pair_identical() {
        let left = write_json(r#"{"a": 1, "xs": [1, 2, 3]}"#);
        let right = write_json(r#"{"xs": [3, 2, 1], "a": 1}"#);
        let result = driver().compare_pair(left.path(), right.path());
        assert_eq!(result.status, PairStatus::Ok);
        assert!(result.report.is_none());
    }

    #[test]
    fn test_compare_pair_differences() {
        let left = write_json(r#"{"a": 1}"#);
        let right = write_json(r#"{"a": 2}"#);
        let result = driver().compare_pair(left.path(), right.path());
        assert_eq!(result.status, PairStatus::Bad);
        let report = result.report.unwrap();
        assert!(report.contains("['a']"));
        assert!(report.contains("- 1"));
        assert!(report.contains("+ 2"));
    }

    #[test]
    fn test_compare_pair_ignore_turns_bad_into_ok() {
        let left = write_json(r#"{"a": 1, "ts": 100}"#);
        let right = write_json(r#"{"a": 1, "ts": 200}"#);

        let without_ignore = driver().compare_pair(left.path(), right.path());
        assert_eq!(without_ignore.status, PairStatus::Bad);

        let options = CompareOptions {
            ignore: vec![AccessorPath::parse("['ts']")],
            ..CompareOptions::default()
        };
        let with_ignore =
            ComparisonDriver::new(options).compare_pair(left.path(), right.path());
        assert_eq!(with_ignore.status, PairStatus::Ok);
    }

    #[test]
    fn test_compare_pair_ignore_path_absent_on_one_side() {
        let left = write_json(r#"{"a": 1, "ts": 100}"#);
        let right = write_json(r#"{"a": 1}"#);
        let options = CompareOptions {
            ignore: vec![AccessorPath::parse("['ts']")],
            ..CompareOptions::default()
        };
        let result = ComparisonDriver::new(options).compare_pair(left.path(), right.path());
        assert_eq!(result.status, PairStatus::Ok);
    }

    #[test]
    fn test_compare_pair_file_error() {
        let left = write_json("{not json");
        let right = write_json(r#"{"a": 1}"#);
        let result = driver().compare_pair(left.path(), right.path());
        assert_eq!(result.status, PairStatus::FileError);
        assert!(result.report.is_none());

        let missing = Path::new("/nonexistent/a.json");
        let result = driver().compare_pair(missing, right.path());
        assert_eq!(result.status, PairStatus::FileError);
    }

    #[test]
    fn test_list_pairs_directories() {
        let old_dir = TempDir::new().unwrap();
        let new_dir = TempDir::new().unwrap();
        fs::write(old_dir.path().join("a.json"), "{}").unwrap();
        fs::write(old_dir.path().join("b.json"), "{}").unwrap();
        fs::write(new_dir.path().join("b.json"), "{}").unwrap();
        fs::write(new_dir.path().join("c.json"), "{}").unwrap();
        fs::write(new_dir.path().join("notes.txt"), "skip me").unwrap();

        let listing = list_pairs(old_dir.path(), new_dir.path()).unwrap();
        assert_eq!(listing.missing, ["a.json"]);
        assert_eq!(listing.extra, ["c.json"]);
        assert_eq!(
            listing.pairs,
            [(old_dir.path().join("b.json"), new_dir.path().join("b.json"))]
        );
    }

    #[test]
    fn test_list_pairs_single_files() {
        let left = write_json("{}");
        let right = write_json("{}");
        let listing = list_pairs(left.path(), right.path()).unwrap();
        assert!(listing.missing.is_empty());
        assert!(listing.extra.is_empty());
        assert_eq!(listing.pairs.len(), 1);
    }

    #[test]
    fn test_list_pairs_mismatched_kinds() {
        let dir = TempDir::new().unwrap();
        let file = write_json("{}");
        let err = list_pairs(dir.path(), file.path()).unwrap_err();
        assert!(matches!(err, CompareError::Invocation(_)));
    }

    #[test]
    fn test_list_pairs_nonexistent_path() {
        let file = write_json("{}");
        let err = list_pairs(Path::new("/nonexistent/dir"), file.path()).unwrap_err();
        assert!(matches!(err, CompareError::Invocation(_)));
    }

    #[test]
    fn test_compare_directories_aggregates() {
        let old_dir = TempDir::new().unwrap();
        let new_dir = TempDir::new().unwrap();
        fs::write(old_dir.path().join("same.json"), r#"{"v": 1}"#).unwrap();
        fs::write(new_dir.path().join("same.json"), r#"{"v": 1}"#).unwrap();
        fs::write(old_dir.path().join("diff.json"), r#"{"v": 1}"#).unwrap();
        fs::write(new_dir.path().join("diff.json"), r#"{"v": 2}"#).unwrap();
        fs::write(old_dir.path().join("broken.json"), "{oops").unwrap();
        fs::write(new_dir.path().join("broken.json"), "{}").unwrap();

        let report = driver()
            .compare_directories(old_dir.path(), new_dir.path())
            .unwrap();

        assert!(!report.success());
        let by_name: Vec<(&str, PairStatus)> = report
            .outcomes
            .iter()
            .map(|(name, result)| (name.as_str(), result.status))
            .collect();
        assert_eq!(
            by_name,
            [
                ("broken.json", PairStatus::FileError),
                ("diff.json", PairStatus::Bad),
                ("same.json", PairStatus::Ok),
            ]
        );
    }

    #[test]
    fn test_directory_report_extra_file_is_a_failure() {
        let old_dir = TempDir::new().unwrap();
        let new_dir = TempDir::new().unwrap();
        fs::write(old_dir.path().join("a.json"), "{}").unwrap();
        fs::write(new_dir.path().join("a.json"), "{}").unwrap();
        fs::write(new_dir.path().join("b.json"), "{}").unwrap();

        let report = driver()
            .compare_directories(old_dir.path(), new_dir.path())
            .unwrap();
        assert!(!report.success());
        assert_eq!(report.extra, ["b.json"]);
    }

    #[test]
    fn test_directory_report_success() {
        let old_dir = TempDir::new().unwrap();
        let new_dir = TempDir::new().unwrap();
        fs::write(old_dir.path().join("a.json"), r#"{"v": [1, 2]}"#).unwrap();
        fs::write(new_dir.path().join("a.json"), r#"{"v": [2, 1]}"#).unwrap();

        let report = driver()
            .compare_directories(old_dir.path(), new_dir.path())
            .unwrap();
        assert!(report.success());
    }
}
