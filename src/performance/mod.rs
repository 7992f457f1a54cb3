// SPDX-License-Identifier: PMPL-1.0-or-later
//! Performance budget validation for one component.
//!
//! [`PerformanceValidator`] compares figures from a [`MetricsSource`] with
//! the catalog's thresholds: Core Web Vitals-like metrics, repeated render
//! timings, bundle budgets by size category, accessibility and locale
//! latencies, cross-environment spread, memory growth and network cost.
//! The weighted pass/fail of every check folds into one 0-100 score.

pub mod export;
pub mod metrics;

pub use export::{export_report, EnvironmentInfo, ExportedReport, ReportStore};
pub use metrics::{
    BundleSizes, CoreWebVitals, Interaction, MemorySample, MetricsSource, NetworkSample,
    StructureProfile, SyntheticMetrics, DEFAULT_SEED,
};

use crate::catalog::{categorize, Catalog, ComponentCategory, PerformanceThresholds, VitalThreshold};
use crate::dom::Element;
use crate::validation::{TestSummary, ValidationCheck};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Browser environments sampled by the cross-environment check
pub const ENVIRONMENTS: [&str; 4] = ["chrome", "firefox", "safari", "edge"];

/// Weight of each check in the overall score
pub const SCORE_WEIGHTS: &[(&str, f64)] = &[
    ("coreWebVitals", 0.30),
    ("renderingPerformance", 0.20),
    ("bundleSize", 0.15),
    ("accessibilityPerformance", 0.15),
    ("localeCompliance", 0.10),
    ("crossEnvironment", 0.05),
    ("memoryUsage", 0.03),
    ("networkPerformance", 0.02),
];

/// Weight for a check missing from [`SCORE_WEIGHTS`]
const DEFAULT_WEIGHT: f64 = 0.1;

/// Score at or above which quick validation passes
pub const QUICK_PASS_SCORE: u32 = 85;

/// Screen reader speech rate
const SCREEN_READER_WPM: f64 = 200.0;

/// Tab stops timed by the keyboard traversal check
const KEYBOARD_STEPS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformanceOptions {
    pub measurement_runs: usize,
    /// Renders discarded before timing starts
    pub warmup_runs: usize,
    pub test_cross_environment: bool,
}

impl Default for PerformanceOptions {
    fn default() -> Self {
        Self {
            measurement_runs: 5,
            warmup_runs: 2,
            test_cross_environment: false,
        }
    }
}

/// Results of one performance run for one component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub id: Uuid,
    pub component_name: String,
    pub category: ComponentCategory,
    pub timestamp: DateTime<Utc>,
    pub test_results: BTreeMap<String, ValidationCheck>,
    pub overall_score: u32,
    pub summary: TestSummary,
}

impl PerformanceReport {
    fn new(component_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            component_name: component_name.to_string(),
            category: categorize(component_name),
            timestamp: Utc::now(),
            test_results: BTreeMap::new(),
            overall_score: 0,
            summary: TestSummary::default(),
        }
    }

    pub fn test(&self, key: &str) -> Option<&ValidationCheck> {
        self.test_results.get(key)
    }
}

/// Outcome of [`quick_performance_validation`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickValidation {
    pub overall_score: u32,
    pub core_web_vitals: Option<ValidationCheck>,
    pub rendering_performance: Option<ValidationCheck>,
    pub bundle_size: Option<ValidationCheck>,
    /// `PASS` or `NEEDS_OPTIMIZATION`
    pub recommendation: String,
}

impl QuickValidation {
    pub fn passed(&self) -> bool {
        self.overall_score >= QUICK_PASS_SCORE
    }
}

/// Measures one component against the performance thresholds
pub struct PerformanceValidator<'c> {
    thresholds: &'c PerformanceThresholds,
    metrics: Box<dyn MetricsSource>,
    options: PerformanceOptions,
    report: PerformanceReport,
}

impl<'c> PerformanceValidator<'c> {
    pub fn new(catalog: &'c Catalog, component_name: &str) -> Self {
        Self {
            thresholds: catalog.thresholds(),
            metrics: Box::new(SyntheticMetrics::default()),
            options: PerformanceOptions::default(),
            report: PerformanceReport::new(component_name),
        }
    }

    pub fn with_metrics(mut self, metrics: impl MetricsSource + 'static) -> Self {
        self.metrics = Box::new(metrics);
        self
    }

    pub fn with_options(mut self, options: PerformanceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn report(&self) -> &PerformanceReport {
        &self.report
    }

    /// Run every check, then score and finalize the report
    pub fn run_comprehensive_performance_tests(mut self, element: &Element<'_>) -> PerformanceReport {
        let component_name = self.report.component_name.clone();
        info!("Running comprehensive performance tests for {}", component_name);

        self.test_core_web_vitals(element);
        self.test_rendering_performance(element);
        self.test_bundle_size(&component_name);
        self.test_accessibility_performance(element);
        self.test_locale_compliance_performance(element);
        if self.options.test_cross_environment {
            self.test_cross_environment_performance(element);
        }
        self.test_memory_usage(element);
        self.test_network_performance(&component_name);

        self.calculate_overall_performance_score();
        self.report
    }

    fn record(&mut self, key: &str, check: ValidationCheck) -> ValidationCheck {
        debug!("{}: passed={} issues={}", check.name, check.passed, check.issues.len());
        self.report.summary.update(&check);
        self.report.test_results.insert(key.to_string(), check.clone());
        check
    }

    /// LCP / FID / CLS against the good and target cutoffs; at least 90%
    /// of the three must meet target
    pub fn test_core_web_vitals(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Core Web Vitals");
        let thresholds = self.thresholds.core_web_vitals;
        let vitals = self.metrics.core_web_vitals(&StructureProfile::of(element));

        let mut met = 0;
        for (label, key, value, threshold, unit) in [
            ("LCP", "lcp", vitals.lcp, thresholds.lcp, "ms"),
            ("FID", "fid", vitals.fid, thresholds.fid, "ms"),
            ("CLS", "cls", vitals.cls, thresholds.cls, ""),
        ] {
            let meets_target = value <= threshold.target;
            if meets_target {
                met += 1;
            } else {
                check.warning(format!(
                    "{} {}{} exceeds target of {}{}",
                    label,
                    (value * 1000.0).round() / 1000.0,
                    unit,
                    threshold.target,
                    unit
                ));
            }
            check.detail(
                key,
                json!({
                    "value": value,
                    "good": threshold.good,
                    "poor": threshold.poor,
                    "target": threshold.target,
                    "meetsTarget": meets_target,
                    "rating": rating(value, &threshold),
                }),
            );
        }

        let score = met as f64 / 3.0 * 100.0;
        let compliant = score >= thresholds.required_compliance;
        check.detail("overallScore", score).detail("meetsRequiredCompliance", compliant);
        if !compliant {
            check.issue(format!(
                "Core Web Vitals score {:.1}% below required {}%",
                score, thresholds.required_compliance
            ));
        }

        self.record("coreWebVitals", check.finish())
    }

    /// Repeated renders after warmup, graded against the render budget
    pub fn test_rendering_performance(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Rendering Performance");
        let budget = self.thresholds.budget.render_time;
        let profile = StructureProfile::of(element);

        for _ in 0..self.options.warmup_runs {
            self.metrics.render_time_ms(&profile);
        }
        let runs: Vec<f64> = (0..self.options.measurement_runs.max(1))
            .map(|_| self.metrics.render_time_ms(&profile))
            .collect();

        let average = runs.iter().sum::<f64>() / runs.len() as f64;
        let min = runs.iter().copied().fold(f64::INFINITY, f64::min);
        let max = runs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = runs.iter().map(|r| (r - average).powi(2)).sum::<f64>() / runs.len() as f64;
        let consistency = max - min;
        let grade = render_grade(average, budget.fast, budget.acceptable, budget.slow);

        check
            .detail("average", average)
            .detail("min", min)
            .detail("max", max)
            .detail("variance", variance)
            .detail("consistency", consistency)
            .detail("runs", runs.len())
            .detail("warmupRuns", self.options.warmup_runs)
            .detail("allRuns", runs.clone())
            .detail("grade", grade.to_string());

        if grade == 'F' {
            check.issue(format!(
                "Average render time {:.2}ms exceeds slow budget of {}ms",
                average, budget.slow
            ));
        }
        if consistency > self.thresholds.consistency_spread_ms {
            check.warning(format!("Inconsistent render times ({:.2}ms variance)", consistency));
        }

        self.record("renderingPerformance", check.finish())
    }

    /// Script, style and combined size against the category budget
    pub fn test_bundle_size(&mut self, component_name: &str) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Bundle Size");
        let category = categorize(component_name);
        let budget = self.thresholds.budget.for_category(category);
        let sizes = self.metrics.bundle_sizes(component_name, category);

        let within_script = sizes.script_kb <= budget.script_kb;
        let within_style = sizes.style_kb <= budget.style_kb;
        let within_total = sizes.total_kb() <= budget.total_kb();

        if !within_script {
            check.issue(format!(
                "JavaScript size {}KB exceeds {} budget of {}KB",
                sizes.script_kb, category, budget.script_kb
            ));
        }
        if !within_style {
            check.issue(format!(
                "CSS size {}KB exceeds {} budget of {}KB",
                sizes.style_kb, category, budget.style_kb
            ));
        }
        if !within_total {
            check.issue(format!(
                "Total size {}KB exceeds {} budget of {}KB",
                sizes.total_kb(),
                category,
                budget.total_kb()
            ));
        }

        let script_efficiency = (budget.script_kb - sizes.script_kb) / budget.script_kb;
        let style_efficiency = (budget.style_kb - sizes.style_kb) / budget.style_kb;
        check
            .detail("javascript", json!({ "size": sizes.script_kb, "budget": budget.script_kb, "withinBudget": within_script }))
            .detail("css", json!({ "size": sizes.style_kb, "budget": budget.style_kb, "withinBudget": within_style }))
            .detail("total", json!({ "size": sizes.total_kb(), "budget": budget.total_kb(), "withinBudget": within_total }))
            .detail("category", category.to_string())
            .detail("efficiencyScore", (script_efficiency + style_efficiency) / 2.0 * 100.0);

        self.record("bundleSize", check.finish())
    }

    /// Focus indicator delay, live region delay, keyboard traversal and
    /// screen-reader read time
    pub fn test_accessibility_performance(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Accessibility Performance");
        let limits = self.thresholds.accessibility;
        let profile = StructureProfile::of(element);

        let focus_delays: Vec<f64> = (0..profile.focusable)
            .map(|_| self.metrics.interaction_delay_ms(Interaction::FocusIndicator))
            .collect();
        let focus_delay = if focus_delays.is_empty() {
            0.0
        } else {
            focus_delays.iter().sum::<f64>() / focus_delays.len() as f64
        };
        check.detail(
            "focusIndicator",
            json!({ "averageDelay": focus_delay, "testedElements": focus_delays.len() }),
        );
        if focus_delay > limits.focus_indicator_delay {
            check.issue(format!("Focus indicator delay {:.2}ms exceeds threshold", focus_delay));
        }

        let live_delay = if profile.live_regions > 0 {
            self.metrics.interaction_delay_ms(Interaction::LiveRegionUpdate)
        } else {
            0.0
        };
        check.detail(
            "ariaLiveRegion",
            json!({ "updateDelay": live_delay, "hasLiveRegions": profile.live_regions > 0, "regionCount": profile.live_regions }),
        );
        if live_delay > limits.live_region_update_delay {
            check.warning(format!(
                "ARIA live region update delay {:.2}ms may impact screen reader users",
                live_delay
            ));
        }

        let steps = if profile.focusable < 2 { 0 } else { profile.focusable.min(KEYBOARD_STEPS) };
        let traversal: f64 = (0..steps)
            .map(|_| self.metrics.interaction_delay_ms(Interaction::KeyboardStep))
            .sum();
        let responsive = traversal < limits.keyboard_traversal;
        check.detail(
            "keyboardNavigation",
            json!({ "isResponsive": responsive, "totalTime": traversal, "testedElements": steps }),
        );
        if !responsive {
            check.issue("Keyboard navigation not responsive enough for accessibility requirements");
        }

        let read_time = profile.words as f64 / SCREEN_READER_WPM * 60_000.0;
        let reasonable = read_time < limits.screen_reader_read_time;
        check.detail(
            "screenReader",
            json!({ "estimatedReadTime": read_time, "isReasonable": reasonable, "wordCount": profile.words }),
        );
        if !reasonable {
            check.warning(format!(
                "Estimated screen reader time {:.1}s exceeds {}s",
                read_time / 1000.0,
                limits.screen_reader_read_time / 1000.0
            ));
        }

        self.record("accessibilityPerformance", check.finish())
    }

    /// Locale switch, form validation and search latency
    pub fn test_locale_compliance_performance(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Locale Compliance Performance");
        let limits = self.thresholds.locale;
        let profile = StructureProfile::of(element);

        let switch_time = if profile.language_switcher {
            self.metrics.interaction_delay_ms(Interaction::LocaleSwitch)
        } else {
            0.0
        };
        check.detail(
            "localeSwitch",
            json!({ "switchTime": switch_time, "hasLanguageSwitcher": profile.language_switcher }),
        );
        if switch_time > limits.locale_switch {
            check.issue(format!(
                "Language switch time {:.2}ms exceeds limit of {}ms",
                switch_time, limits.locale_switch
            ));
        }

        let validation_time = if profile.forms > 0 {
            self.metrics.interaction_delay_ms(Interaction::FormValidation)
        } else {
            0.0
        };
        check.detail(
            "formValidation",
            json!({ "validationTime": validation_time, "hasForms": profile.forms > 0, "formCount": profile.forms }),
        );
        if validation_time > limits.form_validation {
            check.warning(format!(
                "Form validation time {:.2}ms may impact user experience",
                validation_time
            ));
        }

        let search_time = if profile.search {
            self.metrics.interaction_delay_ms(Interaction::SearchResponse)
        } else {
            0.0
        };
        check.detail("search", json!({ "responseTime": search_time, "hasSearch": profile.search }));
        if search_time > limits.search_response {
            check.warning(format!(
                "Search response time {:.2}ms may impact public service quality",
                search_time
            ));
        }

        self.record("localeCompliance", check.finish())
    }

    /// Render time spread across browser environments; never fails
    pub fn test_cross_environment_performance(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Cross-Environment Performance");
        let profile = StructureProfile::of(element);

        let mut results = BTreeMap::new();
        for environment in ENVIRONMENTS {
            results.insert(environment, self.metrics.environment_render_ms(environment, &profile));
        }
        let times: Vec<f64> = results.values().copied().collect();
        let average = times.iter().sum::<f64>() / times.len() as f64;
        let spread = times.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            - times.iter().copied().fold(f64::INFINITY, f64::min);
        let consistent = spread < self.thresholds.consistency_spread_ms;

        check.detail_json("environmentResults", &results).detail(
            "consistency",
            json!({ "averageRenderTime": average, "variance": spread, "isConsistent": consistent }),
        );
        if !consistent {
            check.warning(format!(
                "Cross-environment performance variance {:.2}ms may indicate optimization opportunities",
                spread
            ));
        }

        self.record("crossEnvironment", check.finish())
    }

    /// Heap growth across simulated interaction, plus inline handler count
    pub fn test_memory_usage(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Memory Usage");
        let profile = StructureProfile::of(element);
        let sample = self.metrics.memory_sample(&profile);
        let growth = sample.growth();
        let leak = growth > self.thresholds.memory_leak_mb;

        check
            .detail("initial", sample.before)
            .detail("final", sample.after)
            .detail("increase", growth)
            .detail("leakDetected", leak)
            .detail(
                "eventHandlerCleanup",
                json!({ "inlineHandlers": profile.inline_handlers, "interactiveElements": profile.interactive }),
            );
        if leak {
            check.issue(format!("Potential memory leak detected: {:.2}MB increase", growth));
        }

        self.record("memoryUsage", check.finish())
    }

    /// Request count, payload and cache efficiency
    pub fn test_network_performance(&mut self, component_name: &str) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Network Performance");
        let limits = self.thresholds.network;
        let sample = self.metrics.network(component_name);

        check
            .detail("requestCount", sample.requests)
            .detail("totalSize", sample.payload_kb)
            .detail("criticalPath", sample.requests > 2)
            .detail("cacheEfficiency", sample.cache_hit_ratio);

        if sample.requests > limits.max_requests {
            check.warning(format!(
                "High number of network requests ({}) may impact performance",
                sample.requests
            ));
        }
        if sample.payload_kb > limits.max_payload_kb {
            check.issue(format!(
                "Network payload size {}KB exceeds recommended limit of {}KB",
                sample.payload_kb, limits.max_payload_kb
            ));
        }
        if sample.cache_hit_ratio < limits.min_cache_hit_ratio {
            check.warning(format!(
                "Low cache efficiency {:.1}% - consider optimization",
                sample.cache_hit_ratio * 100.0
            ));
        }

        self.record("networkPerformance", check.finish())
    }

    /// Weighted pass/fail over the recorded checks, 0-100; finalizes the summary
    pub fn calculate_overall_performance_score(&mut self) -> u32 {
        let score = weighted_score(&self.report.test_results);
        self.report.overall_score = score;

        let summary = &mut self.report.summary;
        summary.finalize();
        info!("Performance testing complete for {}:", self.report.component_name);
        info!("- Overall score: {}", score);
        info!("- Passed: {}/{}", summary.passed, summary.total);
        info!("- Warnings: {}", summary.warnings);
        info!("- Status: {}", summary.status);
        score
    }
}

/// Weighted pass/fail score; zero when nothing ran
pub fn weighted_score(results: &BTreeMap<String, ValidationCheck>) -> u32 {
    let (earned, total_weight) = results.iter().fold((0.0, 0.0), |(earned, total), (key, check)| {
        let weight = SCORE_WEIGHTS
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, w)| *w)
            .unwrap_or(DEFAULT_WEIGHT);
        let score = if check.passed { 100.0 } else { 0.0 };
        (earned + score * weight, total + weight)
    });
    if total_weight == 0.0 {
        0
    } else {
        (earned / total_weight).round() as u32
    }
}

/// A-F against the fast / acceptable / slow cutoffs
pub fn render_grade(average_ms: f64, fast: f64, acceptable: f64, slow: f64) -> char {
    if average_ms < fast {
        'A'
    } else if average_ms < acceptable {
        'B'
    } else if average_ms < slow {
        'C'
    } else {
        'F'
    }
}

fn rating(value: f64, threshold: &VitalThreshold) -> &'static str {
    if value <= threshold.good {
        "good"
    } else if value <= threshold.poor {
        "needs-improvement"
    } else {
        "poor"
    }
}

/// Core Web Vitals, rendering and bundle size only, three timed runs;
/// passes at a score of 85
pub fn quick_performance_validation(
    catalog: &Catalog,
    element: &Element<'_>,
    component_name: &str,
    metrics: impl MetricsSource + 'static,
) -> QuickValidation {
    let mut validator = PerformanceValidator::new(catalog, component_name)
        .with_metrics(metrics)
        .with_options(PerformanceOptions {
            measurement_runs: 3,
            ..PerformanceOptions::default()
        });

    validator.test_core_web_vitals(element);
    validator.test_rendering_performance(element);
    validator.test_bundle_size(component_name);
    let overall_score = validator.calculate_overall_performance_score();

    let report = validator.report;
    QuickValidation {
        overall_score,
        core_web_vitals: report.test("coreWebVitals").cloned(),
        rendering_performance: report.test("renderingPerformance").cloned(),
        bundle_size: report.test("bundleSize").cloned(),
        recommendation: if overall_score >= QUICK_PASS_SCORE {
            "PASS".to_string()
        } else {
            "NEEDS_OPTIMIZATION".to_string()
        },
    }
}
