// SPDX-License-Identifier: PMPL-1.0-or-later
//! Cross-configuration sweeps.
//!
//! Runs one validator per configuration id over the same element and folds
//! the per-configuration totals into a single report. Configurations run in
//! order on the calling thread; a sweep can be cancelled or time-boxed, and
//! both are honoured between configurations only, never mid-run.

use crate::catalog::Catalog;
use crate::dom::Element;
use crate::error::Result;
use crate::performance::PerformanceReport;
use crate::theme::{MunicipalityThemeTester, ThemeOptions, ThemeTestReport};
use crate::validation::{pass_rate, RunStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// A report that can be folded into sweep totals
pub trait Summarized {
    fn total(&self) -> usize;

    fn passed(&self) -> usize;

    fn failed(&self) -> usize;
}

impl Summarized for ThemeTestReport {
    fn total(&self) -> usize {
        self.summary.total
    }

    fn passed(&self) -> usize {
        self.summary.passed
    }

    fn failed(&self) -> usize {
        self.summary.failed
    }
}

impl Summarized for PerformanceReport {
    fn total(&self) -> usize {
        self.summary.total
    }

    fn passed(&self) -> usize {
        self.summary.passed
    }

    fn failed(&self) -> usize {
        self.summary.failed
    }
}

/// Cancellation flag and optional wall-clock budget for a sweep
#[derive(Debug, Clone, Default)]
pub struct SweepControl {
    cancelled: Arc<AtomicBool>,
    budget: Option<Duration>,
}

impl SweepControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Shared flag; setting it stops the sweep before the next configuration
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }
}

/// One configuration's run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationOutcome<R> {
    pub configuration: String,
    pub status: RunStatus,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<R>,
    /// Set when the validator could not run at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub pass_rate: f64,
    pub overall_status: RunStatus,
    /// Configurations not run because of cancellation or timeout
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossConfigurationReport<R> {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Tag name of the element under test
    pub component: String,
    pub configurations: Vec<ConfigurationOutcome<R>>,
    pub summary: SweepSummary,
}

impl<R> CrossConfigurationReport<R> {
    pub fn configuration(&self, id: &str) -> Option<&ConfigurationOutcome<R>> {
        self.configurations.iter().find(|c| c.configuration == id)
    }

    pub fn passed(&self) -> bool {
        self.summary.overall_status == RunStatus::Passed
    }
}

/// Run `validator` once per configuration id and fold the totals.
///
/// Totals are summed across configurations before the pass rate is taken,
/// so configurations with more checks weigh more. A configuration whose
/// validator returns `Err` counts as one failed check.
pub fn run_across_configurations<'a, R, F>(
    element: &Element<'a>,
    configuration_ids: &[&str],
    control: &SweepControl,
    mut validator: F,
) -> CrossConfigurationReport<R>
where
    R: Summarized,
    F: FnMut(&str, &Element<'a>) -> Result<R>,
{
    let started = Instant::now();
    let mut configurations = Vec::with_capacity(configuration_ids.len());
    let mut skipped = Vec::new();
    let mut halted: Option<RunStatus> = None;
    let (mut total, mut passed, mut failed) = (0, 0, 0);

    for id in configuration_ids {
        if halted.is_none() {
            if control.is_cancelled() {
                warn!("Sweep cancelled before {}", id);
                halted = Some(RunStatus::Cancelled);
            } else if control.budget().is_some_and(|budget| started.elapsed() >= budget) {
                warn!("Sweep exceeded its time budget before {}", id);
                halted = Some(RunStatus::Timeout);
            }
        }
        if halted.is_some() {
            skipped.push(id.to_string());
            continue;
        }

        info!("Testing {} configuration...", id);
        let outcome = match validator(id, element) {
            Ok(report) => ConfigurationOutcome {
                configuration: id.to_string(),
                status: if report.failed() == 0 { RunStatus::Passed } else { RunStatus::Failed },
                total: report.total(),
                passed: report.passed(),
                failed: report.failed(),
                report: Some(report),
                error: None,
            },
            Err(err) => {
                warn!("Configuration {} failed to run: {}", id, err);
                ConfigurationOutcome {
                    configuration: id.to_string(),
                    status: RunStatus::Failed,
                    total: 1,
                    passed: 0,
                    failed: 1,
                    report: None,
                    error: Some(err.to_string()),
                }
            }
        };
        total += outcome.total;
        passed += outcome.passed;
        failed += outcome.failed;
        configurations.push(outcome);
    }

    let overall_status = match halted {
        Some(status) => status,
        None if failed == 0 => RunStatus::Passed,
        None => RunStatus::Failed,
    };
    let summary = SweepSummary {
        total_tests: total,
        passed_tests: passed,
        failed_tests: failed,
        pass_rate: pass_rate(passed, total),
        overall_status,
        skipped,
    };

    info!("Cross-configuration testing complete:");
    info!("- Overall status: {}", summary.overall_status);
    info!("- Pass rate: {:.1}%", summary.pass_rate);

    CrossConfigurationReport {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        component: element.tag().to_string(),
        configurations,
        summary,
    }
}

/// Theme checks for each listed brand
pub fn test_component_across_brands<'a>(
    catalog: &Catalog,
    element: &Element<'a>,
    brand_ids: &[&str],
    options: &ThemeOptions,
    control: &SweepControl,
) -> CrossConfigurationReport<ThemeTestReport> {
    run_across_configurations(element, brand_ids, control, |id, el| {
        let tester = MunicipalityThemeTester::new(catalog, id)?;
        Ok(tester.run_complete_theme_tests(el, options))
    })
}

/// Theme checks for every brand in the catalog
pub fn test_component_across_all_brands<'a>(
    catalog: &Catalog,
    element: &Element<'a>,
    options: &ThemeOptions,
    control: &SweepControl,
) -> CrossConfigurationReport<ThemeTestReport> {
    let ids = catalog.brand_ids();
    test_component_across_brands(catalog, element, &ids, options, control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::error::EngineError;

    struct Tally {
        total: usize,
        failed: usize,
    }

    impl Summarized for Tally {
        fn total(&self) -> usize {
            self.total
        }
        fn passed(&self) -> usize {
            self.total - self.failed
        }
        fn failed(&self) -> usize {
            self.failed
        }
    }

    fn tally(id: &str) -> Result<Tally> {
        Ok(Tally { total: 10, failed: usize::from(id == "b") })
    }

    #[test]
    fn test_pass_rate_over_summed_totals() {
        let doc = Document::parse("<div class=\"card\"></div>");
        let el = doc.component(".card").unwrap();
        let report = run_across_configurations(&el, &["a", "b", "c"], &SweepControl::new(), |id, _| tally(id));

        assert_eq!(report.summary.overall_status, RunStatus::Failed);
        assert_eq!(report.summary.total_tests, 30);
        assert_eq!(report.summary.failed_tests, 1);
        assert!((report.summary.pass_rate - 96.666).abs() < 0.01);
        assert_eq!(report.configuration("b").unwrap().status, RunStatus::Failed);
        assert_eq!(report.configuration("c").unwrap().status, RunStatus::Passed);
    }

    #[test]
    fn test_all_passing() {
        let doc = Document::parse("<div class=\"card\"></div>");
        let el = doc.component(".card").unwrap();
        let report = run_across_configurations(&el, &["a", "c"], &SweepControl::new(), |id, _| tally(id));
        assert!(report.passed());
        assert_eq!(report.summary.pass_rate, 100.0);
    }

    #[test]
    fn test_error_becomes_failed_entry() {
        let doc = Document::parse("<div class=\"card\"></div>");
        let el = doc.component(".card").unwrap();
        let report = run_across_configurations(&el, &["a", "broken", "c"], &SweepControl::new(), |id, _| {
            if id == "broken" {
                Err(EngineError::Config("validator unavailable".to_string()))
            } else {
                tally(id)
            }
        });
        assert_eq!(report.configurations.len(), 3);
        let broken = report.configuration("broken").unwrap();
        assert!(broken.report.is_none());
        assert!(broken.error.as_deref().unwrap().contains("validator unavailable"));
        assert_eq!(report.summary.overall_status, RunStatus::Failed);
        assert_eq!(report.configuration("c").unwrap().status, RunStatus::Passed);
    }

    #[test]
    fn test_cancel_between_configurations() {
        let doc = Document::parse("<div class=\"card\"></div>");
        let el = doc.component(".card").unwrap();
        let control = SweepControl::new();
        let handle = control.cancel_handle();
        let report = run_across_configurations(&el, &["a", "b", "c"], &control, |id, _| {
            handle.store(true, Ordering::SeqCst);
            tally(id)
        });
        assert_eq!(report.configurations.len(), 1);
        assert_eq!(report.summary.skipped, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(report.summary.overall_status, RunStatus::Cancelled);
    }

    #[test]
    fn test_zero_budget_times_out() {
        let doc = Document::parse("<div class=\"card\"></div>");
        let el = doc.component(".card").unwrap();
        let control = SweepControl::new().with_budget(Duration::ZERO);
        let report = run_across_configurations(&el, &["a", "b"], &control, |id, _| tally(id));
        assert!(report.configurations.is_empty());
        assert_eq!(report.summary.overall_status, RunStatus::Timeout);
        assert_eq!(report.summary.pass_rate, 0.0);
    }

    #[test]
    fn test_unknown_brand_in_theme_sweep() {
        let doc = Document::parse("<div class=\"card\"></div>");
        let el = doc.component(".card").unwrap();
        let catalog = Catalog::builtin();
        let report = test_component_across_brands(
            &catalog,
            &el,
            &["atlantis"],
            &ThemeOptions::default(),
            &SweepControl::new(),
        );
        assert_eq!(report.summary.overall_status, RunStatus::Failed);
        assert!(report.configurations[0].error.as_deref().unwrap().contains("atlantis"));
    }
}
