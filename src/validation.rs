// SPDX-License-Identifier: PMPL-1.0-or-later
//! Result types shared by every validator.
//!
//! A [`ValidationCheck`] is one atomic assertion with its evidence. Checks are
//! assembled through a [`CheckBuilder`]; `passed` is derived from the issue
//! list when the builder finishes, so a check can never carry issues and
//! still report success.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Component family a result describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Form,
    Navigation,
    Interactive,
    Media,
    Theme,
    Performance,
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentType::Form => write!(f, "form"),
            ComponentType::Navigation => write!(f, "navigation"),
            ComponentType::Interactive => write!(f, "interactive"),
            ComponentType::Media => write!(f, "media"),
            ComponentType::Theme => write!(f, "theme"),
            ComponentType::Performance => write!(f, "performance"),
        }
    }
}

/// One atomic assertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub details: Map<String, Value>,
}

impl ValidationCheck {
    pub fn builder(name: &str) -> CheckBuilder {
        CheckBuilder {
            name: name.to_string(),
            issues: Vec::new(),
            warnings: Vec::new(),
            details: Map::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    pub fn detail_f64(&self, key: &str) -> Option<f64> {
        self.details.get(key).and_then(Value::as_f64)
    }
}

/// Accumulates issues, warnings and measurements for one check
#[derive(Debug, Clone)]
pub struct CheckBuilder {
    name: String,
    issues: Vec<String>,
    warnings: Vec<String>,
    details: Map<String, Value>,
}

impl CheckBuilder {
    /// Record a rule violation
    pub fn issue(&mut self, message: impl Into<String>) -> &mut Self {
        self.issues.push(message.into());
        self
    }

    /// Record a heuristic observation that never fails the check
    pub fn warning(&mut self, message: impl Into<String>) -> &mut Self {
        self.warnings.push(message.into());
        self
    }

    pub fn detail(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Attach any serializable measurement
    pub fn detail_json<T: Serialize>(&mut self, key: &str, value: &T) -> &mut Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.details.insert(key.to_string(), value);
        self
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn finish(self) -> ValidationCheck {
        ValidationCheck {
            passed: self.issues.is_empty(),
            name: self.name,
            issues: self.issues,
            warnings: self.warnings,
            details: self.details,
        }
    }
}

/// Outcome of one (element, validator) invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub component_type: ComponentType,
    pub is_accessible: bool,
    pub checks: Vec<ValidationCheck>,
    pub violations: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new(component_type: ComponentType) -> Self {
        Self {
            component_type,
            is_accessible: true,
            checks: Vec::new(),
            violations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Append a check, folding its issues into `violations`
    pub fn record(&mut self, check: ValidationCheck) {
        self.violations.extend(check.issues.iter().cloned());
        self.warnings.extend(check.warnings.iter().cloned());
        self.checks.push(check);
        self.is_accessible = self.violations.is_empty() && self.checks.iter().all(|c| c.passed);
    }

    pub fn passed(&self) -> bool {
        self.is_accessible
    }

    pub fn check(&self, name: &str) -> Option<&ValidationCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Overall status of a run or sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Passed,
    Failed,
    Timeout,
    Cancelled,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "PENDING"),
            RunStatus::Passed => write!(f, "PASSED"),
            RunStatus::Failed => write!(f, "FAILED"),
            RunStatus::Timeout => write!(f, "TIMEOUT"),
            RunStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Running counters for a multi-check report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Checks that carried at least one warning
    pub warnings: usize,
    pub pass_rate: f64,
    pub status: RunStatus,
}

impl Default for TestSummary {
    fn default() -> Self {
        Self {
            total: 0,
            passed: 0,
            failed: 0,
            warnings: 0,
            pass_rate: 0.0,
            status: RunStatus::Pending,
        }
    }
}

impl TestSummary {
    /// Count one executed check
    pub fn update(&mut self, check: &ValidationCheck) {
        self.total += 1;
        if check.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        if !check.warnings.is_empty() {
            self.warnings += 1;
        }
    }

    /// Compute `pass_rate` and `status` from the counters
    pub fn finalize(&mut self) {
        self.pass_rate = pass_rate(self.passed, self.total);
        self.status = if self.failed == 0 {
            RunStatus::Passed
        } else {
            RunStatus::Failed
        };
    }
}

/// `passed / total * 100`, zero when nothing ran
pub fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_passed_derived_from_issues() {
        let mut builder = ValidationCheck::builder("labels");
        builder.warning("placeholder only").detail("count", 3);
        let check = builder.finish();
        assert!(check.passed);
        assert_eq!(check.detail_f64("count"), Some(3.0));

        let mut builder = ValidationCheck::builder("labels");
        builder.issue("Input 0 (select) missing accessible label");
        assert!(!builder.finish().passed);
    }

    #[test]
    fn test_result_tracks_violations() {
        let mut result = ValidationResult::new(ComponentType::Form);
        assert!(result.is_accessible);

        let mut ok = ValidationCheck::builder("a");
        ok.warning("soft");
        result.record(ok.finish());
        assert!(result.passed());
        assert_eq!(result.warnings.len(), 1);

        let mut bad = ValidationCheck::builder("b");
        bad.issue("hard");
        result.record(bad.finish());
        assert!(!result.passed());
        assert_eq!(result.violations, vec!["hard".to_string()]);
        assert!(result.check("b").is_some());
    }

    #[test]
    fn test_summary_counts_once_per_check() {
        let mut summary = TestSummary::default();
        for i in 0..10 {
            let mut builder = ValidationCheck::builder(&format!("check-{}", i));
            if i == 3 {
                builder.issue("failed");
            }
            summary.update(&builder.finish());
        }
        summary.finalize();
        assert_eq!((summary.total, summary.passed, summary.failed), (10, 9, 1));
        assert!((summary.pass_rate - 90.0).abs() < 1e-9);
        assert_eq!(summary.status, RunStatus::Failed);
    }

    #[test]
    fn test_pass_rate_bounds() {
        assert_eq!(pass_rate(0, 0), 0.0);
        assert_eq!(pass_rate(5, 5), 100.0);
    }

    #[test]
    fn test_serialized_shape() {
        let result = ValidationResult::new(ComponentType::Navigation);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["componentType"], "navigation");
        assert_eq!(json["isAccessible"], true);
        assert_eq!(serde_json::to_value(RunStatus::Timeout).unwrap(), "TIMEOUT");
    }
}
