//! File discovery and parallel scanning.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use incompat_scan_core::{
    scan_incompatible_characters, CancellationToken, IncompatibleCharacter, ScanConfig, ScanError,
    TextEncoding,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Configuration for a batch of scans.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub encoding: TextEncoding,
    pub scan: ScanConfig,
    /// Cancel the remaining scans once any file has findings.
    pub fail_fast: bool,
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Scanned(Vec<IncompatibleCharacter>),
    Cancelled,
    Failed(String),
}

/// Result of scanning a single file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn findings(&self) -> &[IncompatibleCharacter] {
        match &self.outcome {
            FileOutcome::Scanned(found) => found,
            FileOutcome::Cancelled | FileOutcome::Failed(_) => &[],
        }
    }
}

/// Totals over a batch of reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineResult {
    pub total_files: usize,
    pub incompatible_files: usize,
    pub total_findings: usize,
    pub cancelled_files: usize,
    pub failed_files: usize,
}

impl PipelineResult {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut result = Self {
            total_files: reports.len(),
            ..Default::default()
        };
        for report in reports {
            match &report.outcome {
                FileOutcome::Scanned(found) if !found.is_empty() => {
                    result.incompatible_files += 1;
                    result.total_findings += found.len();
                }
                FileOutcome::Scanned(_) => {}
                FileOutcome::Cancelled => result.cancelled_files += 1,
                FileOutcome::Failed(_) => result.failed_files += 1,
            }
        }
        result
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// Expand files and directories into a sorted list of files.
///
/// Explicit file arguments are kept as given; the extension filter only
/// applies to files found by walking a directory.
pub fn discover_files(roots: &[PathBuf], extensions: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for root in roots {
        if root.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(root)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && has_extension(e.path(), extensions))
                .map(|e| e.path().to_path_buf())
                .collect();
            found.sort();
            paths.extend(found);
        } else {
            paths.push(root.clone());
        }
    }
    paths
}

/// Scan a single file.
pub fn scan_file(path: &Path, config: &PipelineConfig, cancel: &CancellationToken) -> FileOutcome {
    if cancel.is_cancelled() {
        return FileOutcome::Cancelled;
    }

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => return FileOutcome::Failed(e.to_string()),
    };

    match scan_incompatible_characters(&text, &config.encoding, &config.scan, cancel) {
        Ok(found) => FileOutcome::Scanned(found),
        Err(ScanError::Cancelled) => FileOutcome::Cancelled,
    }
}

/// Scan all files in parallel.
///
/// Every scan works on its own snapshot; they share only the cancellation
/// token. Reports come back in input order.
pub fn scan_files(paths: Vec<PathBuf>, config: &PipelineConfig) -> Vec<FileReport> {
    let total_files = paths.len();
    let processed_count = AtomicUsize::new(0);
    let cancel = CancellationToken::new();

    let reports: Vec<FileReport> = paths
        .into_par_iter()
        .map(|path| {
            let outcome = scan_file(&path, config, &cancel);
            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

            match &outcome {
                FileOutcome::Scanned(found) => {
                    debug!(
                        path = %path.display(),
                        found = found.len(),
                        "scanned {}/{}",
                        count,
                        total_files
                    );
                    if config.fail_fast && !found.is_empty() {
                        cancel.cancel();
                    }
                }
                FileOutcome::Cancelled => debug!(path = %path.display(), "scan cancelled"),
                FileOutcome::Failed(e) => {
                    warn!(path = %path.display(), error = %e, "could not scan file")
                }
            }

            FileReport { path, outcome }
        })
        .collect();

    info!(files = total_files, encoding = %config.encoding, "batch scan finished");
    reports
}
