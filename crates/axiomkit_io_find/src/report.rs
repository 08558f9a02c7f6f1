//! Find report model and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::entry::Entry;
use crate::spec::{FindError, SpecFindError};

/// Matched entries plus counters and diagnostics for one search.
#[derive(Debug, Default, Clone)]
pub struct ReportFind {
    /// Accepted entries in walk order.
    pub entries: Vec<Entry>,
    /// Number of visited nodes (search roots excluded).
    pub cnt_scanned: u64,
    /// Number of accepted entries.
    pub cnt_matched: u64,
    /// Number of directories whose subtree was skipped.
    pub cnt_pruned: u64,
    /// Non-fatal warnings, e.g. missing search roots.
    pub warnings: Vec<String>,
    /// Nodes skipped because of an error.
    pub errors: Vec<SpecFindError>,
}

impl ReportFind {
    /// Number of skipped-node errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_matched".to_string(), self.cnt_matched);
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_pruned".to_string(), self.cnt_pruned);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} matched={} scanned={} pruned={} errors={} warnings={}",
            dict_counts["cnt_matched"],
            dict_counts["cnt_scanned"],
            dict_counts["cnt_pruned"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }

    /// Strict mode: fail if any node was skipped because of an error.
    pub fn into_result(self) -> Result<Vec<Entry>, FindError> {
        let count = self.errors.len();
        match self.errors.into_iter().next() {
            Some(first) => Err(FindError::SkippedNodes { count, first }),
            None => Ok(self.entries),
        }
    }
}

impl fmt::Display for ReportFind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[FIND]"))
    }
}

/// Mutable accumulator used while walking.
#[derive(Debug, Default, Clone)]
pub struct ReportFindBuilder {
    /// See [`ReportFind::entries`].
    pub entries: Vec<Entry>,
    /// See [`ReportFind::cnt_scanned`].
    pub cnt_scanned: u64,
    /// See [`ReportFind::cnt_matched`].
    pub cnt_matched: u64,
    /// See [`ReportFind::cnt_pruned`].
    pub cnt_pruned: u64,
    /// See [`ReportFind::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportFind::errors`].
    pub errors: Vec<SpecFindError>,
}

impl ReportFindBuilder {
    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    /// Record one accepted entry.
    pub fn add_matched(&mut self, entry: Entry) {
        self.cnt_matched += 1;
        self.entries.push(entry);
    }

    /// Increment pruned count by one.
    pub fn add_pruned(&mut self) {
        self.cnt_pruned += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: PathBuf, exception: String) {
        self.errors.push(SpecFindError { path, exception });
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportFind {
        ReportFind {
            entries: self.entries,
            cnt_scanned: self.cnt_scanned,
            cnt_matched: self.cnt_matched,
            cnt_pruned: self.cnt_pruned,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}
