use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use sigcheck_config::{FailOn, FileFilter};
use sigcheck_core::{DetectOptions, DetectionEngine, FileFindings, Severity, SourceUnit};
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Every checked file, sorted by path, with its findings (possibly none).
    pub files: Vec<FileFindings>,
    pub summary: CheckSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub files_checked: usize,
    pub findings: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl CheckSummary {
    fn from_files(files: &[FileFindings]) -> Self {
        let mut summary = CheckSummary {
            files_checked: files.len(),
            ..CheckSummary::default()
        };
        for finding in files.iter().flat_map(|f| &f.findings) {
            summary.findings += 1;
            match finding.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
            }
        }
        summary
    }
}

impl CheckReport {
    /// Process exit code: `1` when any finding reaches `fail_on`, else `0`.
    pub fn exit_code(&self, fail_on: FailOn) -> i32 {
        let failed = self
            .files
            .iter()
            .flat_map(|f| &f.findings)
            .any(|finding| fail_on.fails(finding.severity));
        i32::from(failed)
    }
}

/// Expand `paths` into Java source files.
///
/// Files named explicitly are always kept; directories are walked and filtered through
/// `filter` relative to the directory. The result is sorted and deduplicated.
pub fn collect_java_files(paths: &[PathBuf], filter: &FileFilter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in paths {
        let metadata = std::fs::metadata(root)
            .with_context(|| format!("failed to access {}", root.display()))?;
        if metadata.is_file() {
            files.push(root.clone());
            continue;
        }

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if filter.matches(relative) {
                files.push(path.to_path_buf());
            } else {
                tracing::trace!(target: "sigcheck.cli", path = %path.display(), "filtered out");
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn extract_file(path: &Path) -> Result<SourceUnit> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    sigcheck_java::extract_unit(path, &source)
        .with_context(|| format!("failed to extract declarations from {}", path.display()))
}

/// Parse `files` in parallel and detect conflicts in each.
pub fn run_check(files: &[PathBuf], options: &DetectOptions) -> Result<CheckReport> {
    let units: Vec<SourceUnit> = files
        .par_iter()
        .map(|path| extract_file(path))
        .collect::<Result<_>>()?;

    let engine = DetectionEngine::new(options);
    let mut results = engine.detect_units(&units)?;
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let summary = CheckSummary::from_files(&results);
    tracing::debug!(
        target: "sigcheck.cli",
        files = summary.files_checked,
        findings = summary.findings,
        "check finished"
    );
    Ok(CheckReport {
        files: results,
        summary,
    })
}
