// SPDX-License-Identifier: PMPL-1.0-or-later
//! Performance report history and export.
//!
//! A [`ReportStore`] is owned by whoever needs history and passed by
//! reference; nothing is kept in process-wide state.

use super::PerformanceReport;
use crate::catalog::Viewport;
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Ordered history of performance reports
#[derive(Debug, Clone, Default)]
pub struct ReportStore {
    reports: Vec<PerformanceReport>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, report: PerformanceReport) {
        self.reports.push(report);
    }

    pub fn clear(&mut self) {
        self.reports.clear();
    }

    pub fn latest(&self) -> Option<&PerformanceReport> {
        self.reports.last()
    }

    pub fn history(&self) -> &[PerformanceReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Network hints reported by the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionHints {
    pub effective_type: Option<String>,
    pub downlink_mbps: Option<f64>,
    pub rtt_ms: Option<u32>,
}

/// Where the measurements were taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub locale: String,
    pub viewport: Viewport,
    pub connection: ConnectionHints,
    pub user_agent: String,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            locale: "de-CH".to_string(),
            viewport: Viewport::default(),
            connection: ConnectionHints::default(),
            user_agent: format!("compliancebot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Downloadable snapshot of the latest report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedReport {
    pub file_name: String,
    pub generated_at: DateTime<Utc>,
    pub environment: EnvironmentInfo,
    /// 100 minus deductions
    pub score: u32,
    pub grade: String,
    pub recommendations: Vec<String>,
    pub history_length: usize,
    pub report: PerformanceReport,
}

impl ExportedReport {
    /// Write as pretty JSON under `dir`, returning the file path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!("Performance report written to {}", path.display());
        Ok(path)
    }
}

/// Serialize the latest report with environment metadata and a grade
pub fn export_report(
    store: &ReportStore,
    environment: &EnvironmentInfo,
    now: DateTime<Utc>,
) -> Result<ExportedReport> {
    let latest = store.latest().ok_or(EngineError::EmptyReportStore)?;
    let (score, recommendations) = grade_report(latest);

    Ok(ExportedReport {
        file_name: format!("performance-report-{}.json", now.format("%Y-%m-%d")),
        generated_at: now,
        environment: environment.clone(),
        score,
        grade: letter_grade(score).to_string(),
        recommendations,
        history_length: store.len(),
        report: latest.clone(),
    })
}

fn measurement(report: &PerformanceReport, test: &str, path: &[&str]) -> Option<f64> {
    let mut value = report.test(test)?.detail(path[0])?;
    for key in &path[1..] {
        value = value.get(*key)?;
    }
    value.as_f64()
}

/// Deduct from 100 for slow paint, layout shift, a low overall score and
/// slow renders; each deduction comes with a recommendation
pub fn grade_report(report: &PerformanceReport) -> (u32, Vec<String>) {
    let mut score: i32 = 100;
    let mut recommendations = Vec::new();

    if let Some(lcp) = measurement(report, "coreWebVitals", &["lcp", "value"]) {
        if lcp > 2000.0 {
            score -= 30;
            recommendations.push("Reduce largest contentful paint: lazy-load offscreen images and inline critical CSS".to_string());
        } else if lcp > 1500.0 {
            score -= 15;
            recommendations.push("Largest contentful paint is close to target: preload the hero image".to_string());
        }
    }

    if let Some(cls) = measurement(report, "coreWebVitals", &["cls", "value"]) {
        if cls > 0.1 {
            score -= 25;
            recommendations.push("Reserve space for images and dynamic content to stop layout shift".to_string());
        } else if cls > 0.05 {
            score -= 10;
            recommendations.push("Set explicit width and height on media to reduce layout shift".to_string());
        }
    }

    let overall = report.overall_score;
    if overall < 95 {
        score -= 20;
        recommendations.push(format!("Overall performance score {} is below 95: fix the failing checks", overall));
    } else if overall < 98 {
        score -= 10;
        recommendations.push(format!("Overall performance score {} is below 98", overall));
    }

    if let Some(average) = measurement(report, "renderingPerformance", &["average"]) {
        if average > 1000.0 {
            score -= 15;
            recommendations.push("Split the component: average render time exceeds one second".to_string());
        } else if average > 500.0 {
            score -= 5;
            recommendations.push("Simplify the component markup to cut render time".to_string());
        }
    }

    (score.max(0) as u32, recommendations)
}

pub fn letter_grade(score: u32) -> char {
    match score {
        90..=u32::MAX => 'A',
        80..=89 => 'B',
        70..=79 => 'C',
        _ => 'D',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationCheck;
    use chrono::TimeZone;
    use serde_json::json;

    fn report(lcp: f64, cls: f64, overall: u32, render_avg: f64) -> PerformanceReport {
        let mut vitals = ValidationCheck::builder("Core Web Vitals");
        vitals
            .detail("lcp", json!({ "value": lcp }))
            .detail("cls", json!({ "value": cls }));
        let mut rendering = ValidationCheck::builder("Rendering Performance");
        rendering.detail("average", render_avg);

        let mut report = PerformanceReport::new("card");
        report.test_results.insert("coreWebVitals".to_string(), vitals.finish());
        report.test_results.insert("renderingPerformance".to_string(), rendering.finish());
        report.overall_score = overall;
        report
    }

    #[test]
    fn test_store_contract() {
        let mut store = ReportStore::new();
        assert!(store.latest().is_none());
        store.append(report(1000.0, 0.01, 100, 20.0));
        store.append(report(1800.0, 0.01, 100, 20.0));
        assert_eq!(store.len(), 2);
        assert_eq!(store.history().len(), 2);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_store_cannot_export() {
        let err = export_report(&ReportStore::new(), &EnvironmentInfo::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyReportStore));
    }

    #[test]
    fn test_export_grades_latest() {
        let mut store = ReportStore::new();
        store.append(report(1000.0, 0.01, 100, 20.0));
        store.append(report(2100.0, 0.07, 100, 600.0));
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();

        let exported = export_report(&store, &EnvironmentInfo::default(), now).unwrap();
        assert_eq!(exported.file_name, "performance-report-2026-03-09.json");
        assert_eq!(exported.score, 100 - 30 - 10 - 5);
        assert_eq!(exported.grade, "D");
        assert_eq!(exported.recommendations.len(), 3);
        assert_eq!(exported.history_length, 2);
    }

    #[test]
    fn test_clean_report_grades_a() {
        let (score, recommendations) = grade_report(&report(1200.0, 0.02, 100, 30.0));
        assert_eq!(score, 100);
        assert!(recommendations.is_empty());
        assert_eq!(letter_grade(score), 'A');
        assert_eq!(letter_grade(85), 'B');
        assert_eq!(letter_grade(70), 'C');
    }

    #[test]
    fn test_write_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ReportStore::new();
        store.append(report(1200.0, 0.02, 100, 30.0));
        let exported = export_report(&store, &EnvironmentInfo::default(), Utc::now()).unwrap();
        let path = exported.write_to(dir.path()).unwrap();
        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["grade"], "A");
        assert_eq!(written["environment"]["locale"], "de-CH");
    }
}
