// SPDX-License-Identifier: PMPL-1.0-or-later
//! Directory scanner for rendered component snapshots.
//!
//! Walks directory trees, parses every HTML snapshot, and runs the
//! accessibility modules on the component inside `<body>`.

use crate::analyzers::AccessibilityReport;
use crate::dom::Document;
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// File extensions treated as rendered snapshots
const SCANNABLE_EXTENSIONS: &[&str] = &["html", "htm"];

/// Directories to skip
const SKIP_DIRS: &[&str] = &[
    "node_modules", ".git", "target", "dist", "build",
    "_build", "vendor", ".next", ".nuxt", "coverage",
];

/// Accessibility results for one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub report: AccessibilityReport,
}

/// Accessibility results for a whole tree
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub files: Vec<FileReport>,
}

impl ScanReport {
    pub fn violation_count(&self) -> usize {
        self.files.iter().map(|f| f.report.violation_count()).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.files.iter().map(|f| f.report.warning_count()).sum()
    }

    pub fn is_accessible(&self) -> bool {
        self.files.iter().all(|f| f.report.is_accessible())
    }
}

/// Scan a directory of snapshots
pub fn scan_directory(dir: &Path, selector: &str) -> Result<ScanReport> {
    let mut scan = ScanReport::default();

    info!("Scanning directory: {}", dir.display());

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_str().unwrap_or("");
            if e.file_type().is_dir() && e.depth() > 0 {
                return !SKIP_DIRS.contains(&name) && !name.starts_with('.');
            }
            true
        })
    {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !SCANNABLE_EXTENSIONS.contains(&ext) {
            continue;
        }

        match scan_file(path, selector) {
            Ok(file) => scan.files.push(file),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    info!(
        "Scanned {} files, found {} violations",
        scan.files.len(),
        scan.violation_count()
    );

    Ok(scan)
}

/// Scan a single snapshot; an empty selector picks the first element in `<body>`
pub fn scan_file(path: &Path, selector: &str) -> Result<FileReport> {
    let content = std::fs::read_to_string(path)?;
    let document = Document::parse(&content);
    let element = document.component(selector)?;
    Ok(FileReport {
        path: path.to_path_buf(),
        report: AccessibilityReport::of(&element),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_nonexistent_dir() {
        let result = scan_directory(Path::new("/nonexistent/path"), "");
        // walkdir errors are skipped, so a missing tree is an empty scan
        assert!(result.unwrap().files.is_empty());
    }

    #[test]
    fn test_scan_skips_excluded_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let form = r#"<html><body><form><select name="c" style="width: 200px; height: 44px"></select></form></body></html>"#;
        std::fs::write(dir.path().join("form.html"), form).unwrap();
        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules").join("vendored.html"), form).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not markup").unwrap();

        let scan = scan_directory(dir.path(), "").unwrap();
        assert_eq!(scan.files.len(), 1);
        assert_eq!(scan.violation_count(), 1);
        assert!(!scan.is_accessible());
    }

    #[test]
    fn test_scan_file_with_missing_component() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.html");
        std::fs::write(&path, "<html><body></body></html>").unwrap();
        assert!(scan_file(&path, "").is_err());
    }
}
