// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report rendering for engine results.
//!
//! Supports two output formats:
//! - Text: summary lines (counts, pass rate, status) followed by per-check issues
//! - JSON: the report itself, for CI artifact upload

use crate::analyzers::AccessibilityReport;
use crate::orchestrator::CrossConfigurationReport;
use crate::performance::{ExportedReport, PerformanceReport, QuickValidation};
use crate::scanner::ScanReport;
use crate::theme::ThemeTestReport;
use crate::validation::{TestSummary, ValidationCheck};
use serde::Serialize;
use std::collections::BTreeMap;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// A report with a human-readable rendering
pub trait TextReport: Serialize {
    fn render_text(&self) -> String;
}

/// Render any engine report in the requested format
pub fn generate_report<R: TextReport>(report: &R, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json => generate_json_report(report),
    }
}

fn generate_json_report<R: Serialize>(report: &R) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize report: {}\"}}", e)
    })
}

fn push_summary(output: &mut String, summary: &TestSummary) {
    output.push_str(&format!("Total tests: {}\n", summary.total));
    output.push_str(&format!("Passed: {}\n", summary.passed));
    output.push_str(&format!("Failed: {}\n", summary.failed));
    output.push_str(&format!("Warnings: {}\n", summary.warnings));
    output.push_str(&format!("Pass rate: {:.1}%\n", summary.pass_rate));
    output.push_str(&format!("Status: {}\n", summary.status));
}

fn push_check(output: &mut String, check: &ValidationCheck) {
    let mark = if check.passed { "PASS" } else { "FAIL" };
    output.push_str(&format!("[{}] {}\n", mark, check.name));
    for issue in &check.issues {
        output.push_str(&format!("  Issue: {}\n", issue));
    }
    for warning in &check.warnings {
        output.push_str(&format!("  Warning: {}\n", warning));
    }
}

fn push_checks(output: &mut String, checks: &BTreeMap<String, ValidationCheck>) {
    for check in checks.values() {
        push_check(output, check);
    }
}

impl TextReport for ThemeTestReport {
    fn render_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("=== Theme Report: {} ===\n\n", self.municipality));
        push_summary(&mut output, &self.summary);
        output.push('\n');
        push_checks(&mut output, &self.tests);
        output
    }
}

impl TextReport for PerformanceReport {
    fn render_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "=== Performance Report: {} ({}) ===\n\n",
            self.component_name, self.category
        ));
        output.push_str(&format!("Overall score: {}/100\n", self.overall_score));
        push_summary(&mut output, &self.summary);
        output.push('\n');
        push_checks(&mut output, &self.test_results);
        output
    }
}

impl TextReport for QuickValidation {
    fn render_text(&self) -> String {
        let mut output = String::new();
        output.push_str("=== Quick Performance Validation ===\n\n");
        output.push_str(&format!("Overall score: {}/100\n", self.overall_score));
        output.push_str(&format!("Recommendation: {}\n\n", self.recommendation));
        for check in [&self.core_web_vitals, &self.rendering_performance, &self.bundle_size]
            .into_iter()
            .flatten()
        {
            push_check(&mut output, check);
        }
        output
    }
}

impl TextReport for AccessibilityReport {
    fn render_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("=== Accessibility Report: {} ===\n\n", self.component));

        if self.results.is_empty() {
            output.push_str("No form, navigation, interactive or media content found.\n");
            return output;
        }

        output.push_str(&format!(
            "{} violation(s), {} warning(s)\n\n",
            self.violation_count(),
            self.warning_count()
        ));
        for result in &self.results {
            let verdict = if result.is_accessible { "accessible" } else { "NOT accessible" };
            output.push_str(&format!("--- {} ({}) ---\n", result.component_type, verdict));
            for check in &result.checks {
                push_check(&mut output, check);
            }
            output.push('\n');
        }
        output
    }
}

impl<R: Serialize> TextReport for CrossConfigurationReport<R> {
    fn render_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("=== Cross-Configuration Report: <{}> ===\n\n", self.component));

        for outcome in &self.configurations {
            output.push_str(&format!(
                "{}: {} ({}/{} passed)\n",
                outcome.configuration, outcome.status, outcome.passed, outcome.total
            ));
            if let Some(ref error) = outcome.error {
                output.push_str(&format!("  Error: {}\n", error));
            }
        }
        for skipped in &self.summary.skipped {
            output.push_str(&format!("{}: not run\n", skipped));
        }

        output.push('\n');
        output.push_str(&format!("Total tests: {}\n", self.summary.total_tests));
        output.push_str(&format!("Passed: {}\n", self.summary.passed_tests));
        output.push_str(&format!("Failed: {}\n", self.summary.failed_tests));
        output.push_str(&format!("Overall status: {}\n", self.summary.overall_status));
        output.push_str(&format!("Pass rate: {:.1}%\n", self.summary.pass_rate));
        output
    }
}

impl TextReport for ExportedReport {
    fn render_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("=== Performance Export: {} ===\n\n", self.file_name));
        output.push_str(&format!("Component: {}\n", self.report.component_name));
        output.push_str(&format!("Score: {} (grade {})\n", self.score, self.grade));
        output.push_str(&format!(
            "Environment: {} {}x{}\n",
            self.environment.locale, self.environment.viewport.width, self.environment.viewport.height
        ));
        output.push_str(&format!("Reports in history: {}\n", self.history_length));

        if !self.recommendations.is_empty() {
            output.push_str("\nRecommendations:\n");
            for recommendation in &self.recommendations {
                output.push_str(&format!("- {}\n", recommendation));
            }
        }
        output
    }
}

impl TextReport for ScanReport {
    fn render_text(&self) -> String {
        let mut output = String::new();
        output.push_str("=== Compliancebot Scan Report ===\n\n");

        if self.files.is_empty() {
            output.push_str("No HTML snapshots found.\n");
            return output;
        }

        output.push_str(&format!(
            "Scanned {} file(s): {} violation(s), {} warning(s)\n\n",
            self.files.len(),
            self.violation_count(),
            self.warning_count()
        ));

        for file in &self.files {
            if file.report.violation_count() == 0 && file.report.warning_count() == 0 {
                continue;
            }
            output.push_str(&format!("--- {} ---\n", file.path.display()));
            for result in &file.report.results {
                for violation in &result.violations {
                    output.push_str(&format!("[{}] {}\n", result.component_type, violation));
                }
                for warning in &result.warnings {
                    output.push_str(&format!("[{}] warning: {}\n", result.component_type, warning));
                }
            }
            output.push('\n');
        }

        if self.is_accessible() {
            output.push_str("No accessibility violations found.\n");
        } else {
            output.push_str("ACCESSIBILITY VIOLATIONS FOUND\n");
        }
        output
    }
}
