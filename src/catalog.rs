// SPDX-License-Identifier: PMPL-1.0-or-later
//! Threshold catalog: brand configurations, performance budgets and
//! accessibility timing limits.
//!
//! Pure data. The catalog is built once at process start (optionally merged
//! with brands from the configuration file) and is read-only afterwards, so a
//! single instance can be shared by every validator and configuration run.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WcagLevel {
    /// Level A - minimum conformance
    A,
    /// Level AA - standard conformance
    AA,
    /// Level AAA - enhanced conformance
    AAA,
}

impl std::fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WcagLevel::A => write!(f, "A"),
            WcagLevel::AA => write!(f, "AA"),
            WcagLevel::AAA => write!(f, "AAA"),
        }
    }
}

/// Brand color palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub surface: String,
    pub text: String,
    pub background: String,
}

impl Palette {
    /// All palette colors, primary first
    pub fn colors(&self) -> [&str; 6] {
        [
            &self.primary,
            &self.secondary,
            &self.accent,
            &self.background,
            &self.text,
            &self.surface,
        ]
    }
}

/// Brand asset references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandAssets {
    pub logo: String,
    pub favicon: String,
    pub header_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    /// CSS font stack, e.g. `Inter, system-ui, sans-serif`
    pub primary_font: String,
    pub heading_weight: String,
    pub body_weight: String,
}

impl Typography {
    /// First family of the declared font stack, unquoted
    pub fn primary_family(&self) -> &str {
        self.primary_font
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceTargets {
    /// Minimum text contrast ratio
    pub contrast_ratio: f64,
    /// Palette declared safe for color-blind users
    pub color_blindness_safe: bool,
    pub wcag_level: WcagLevel,
}

/// One deployment's visual identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandConfiguration {
    pub identifier: String,
    pub name: String,
    /// Identifying class carried by themed components
    pub class_name: String,
    #[serde(default)]
    pub description: String,
    pub palette: Palette,
    pub assets: BrandAssets,
    pub typography: Typography,
    pub compliance: ComplianceTargets,
}

impl BrandConfiguration {
    fn municipality(
        identifier: &str,
        name: &str,
        description: &str,
        palette: [&str; 6],
    ) -> Self {
        let [primary, secondary, accent, surface, text, background] = palette;
        Self {
            identifier: identifier.to_string(),
            name: name.to_string(),
            class_name: format!("municipality-{}", identifier),
            description: description.to_string(),
            palette: Palette {
                primary: primary.to_string(),
                secondary: secondary.to_string(),
                accent: accent.to_string(),
                surface: surface.to_string(),
                text: text.to_string(),
                background: background.to_string(),
            },
            assets: BrandAssets {
                logo: format!("{}-logo.svg", identifier),
                favicon: format!("{}-favicon.ico", identifier),
                header_image: format!("{}-header.jpg", identifier),
            },
            typography: Typography {
                primary_font: "Inter, system-ui, sans-serif".to_string(),
                heading_weight: "600".to_string(),
                body_weight: "400".to_string(),
            },
            compliance: ComplianceTargets {
                contrast_ratio: 4.5,
                color_blindness_safe: true,
                wcag_level: WcagLevel::AA,
            },
        }
    }
}

/// Component size category used for budget lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    Small,
    Medium,
    Large,
    Xlarge,
}

impl std::fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentCategory::Small => write!(f, "small"),
            ComponentCategory::Medium => write!(f, "medium"),
            ComponentCategory::Large => write!(f, "large"),
            ComponentCategory::Xlarge => write!(f, "xlarge"),
        }
    }
}

/// Declared fallback for unknown component names
pub const DEFAULT_CATEGORY: ComponentCategory = ComponentCategory::Medium;

/// Curated component identifiers and their size category
const COMPONENT_CATEGORIES: &[(&str, ComponentCategory)] = &[
    ("badge", ComponentCategory::Small),
    ("button", ComponentCategory::Small),
    ("status-badge", ComponentCategory::Small),
    ("logo", ComponentCategory::Small),
    ("card", ComponentCategory::Medium),
    ("newsletter-form", ComponentCategory::Medium),
    ("text", ComponentCategory::Medium),
    ("heading", ComponentCategory::Medium),
    ("carousel", ComponentCategory::Large),
    ("gallery", ComponentCategory::Large),
    ("hero", ComponentCategory::Large),
    ("site-header", ComponentCategory::Large),
    ("main-menu", ComponentCategory::Large),
    ("page", ComponentCategory::Xlarge),
    ("site-footer", ComponentCategory::Xlarge),
    ("filter", ComponentCategory::Xlarge),
    ("recent-cards", ComponentCategory::Xlarge),
];

/// Resolve a component identifier to its size category.
///
/// Looks up the full identifier first, then successively shorter
/// hyphen-delimited prefixes (`hero-banner` resolves through `hero`).
/// Anything unknown lands in [`DEFAULT_CATEGORY`].
pub fn categorize(component_name: &str) -> ComponentCategory {
    let normalized = component_name.trim().to_lowercase();
    let mut candidate = normalized.as_str();

    loop {
        if let Some((_, category)) = COMPONENT_CATEGORIES
            .iter()
            .find(|(name, _)| *name == candidate)
        {
            return *category;
        }
        match candidate.rfind('-') {
            Some(idx) => candidate = &candidate[..idx],
            None => return DEFAULT_CATEGORY,
        }
    }
}

/// good / poor / target cutoffs for one Core-Web-Vitals-like metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VitalThreshold {
    pub good: f64,
    pub poor: f64,
    pub target: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoreWebVitalsThresholds {
    /// Largest contentful paint (ms)
    pub lcp: VitalThreshold,
    /// First input delay (ms)
    pub fid: VitalThreshold,
    /// Cumulative layout shift (unitless)
    pub cls: VitalThreshold,
    /// Share of metrics that must meet target (percent)
    pub required_compliance: f64,
}

/// Payload budgets in KB for one size category
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryBudget {
    pub script_kb: f64,
    pub style_kb: f64,
}

impl CategoryBudget {
    pub fn total_kb(&self) -> f64 {
        self.script_kb + self.style_kb
    }
}

/// Render-time cutoffs (ms)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderTimeBudget {
    pub fast: f64,
    pub acceptable: f64,
    pub slow: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceBudget {
    pub small: CategoryBudget,
    pub medium: CategoryBudget,
    pub large: CategoryBudget,
    pub xlarge: CategoryBudget,
    pub render_time: RenderTimeBudget,
}

impl PerformanceBudget {
    pub fn for_category(&self, category: ComponentCategory) -> CategoryBudget {
        match category {
            ComponentCategory::Small => self.small,
            ComponentCategory::Medium => self.medium,
            ComponentCategory::Large => self.large,
            ComponentCategory::Xlarge => self.xlarge,
        }
    }
}

/// Accessibility latency limits (ms)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccessibilityTiming {
    pub time_to_interactive: f64,
    pub focus_indicator_delay: f64,
    pub live_region_update_delay: f64,
    pub keyboard_traversal: f64,
    /// Longest acceptable screen-reader read time
    pub screen_reader_read_time: f64,
}

/// Locale/region compliance latency limits (ms)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocaleComplianceTiming {
    pub locale_switch: f64,
    pub form_validation: f64,
    pub search_response: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetworkLimits {
    pub max_requests: u32,
    pub max_payload_kb: f64,
    pub min_cache_hit_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceThresholds {
    pub core_web_vitals: CoreWebVitalsThresholds,
    pub budget: PerformanceBudget,
    pub accessibility: AccessibilityTiming,
    pub locale: LocaleComplianceTiming,
    pub network: NetworkLimits,
    /// Memory growth (MB) across simulated interaction that counts as a leak
    pub memory_leak_mb: f64,
    /// Render spread (ms) across runs or environments considered inconsistent
    pub consistency_spread_ms: f64,
}

pub const PERFORMANCE_THRESHOLDS: PerformanceThresholds = PerformanceThresholds {
    core_web_vitals: CoreWebVitalsThresholds {
        lcp: VitalThreshold { good: 2500.0, poor: 4000.0, target: 2000.0 },
        fid: VitalThreshold { good: 100.0, poor: 300.0, target: 50.0 },
        cls: VitalThreshold { good: 0.1, poor: 0.25, target: 0.05 },
        required_compliance: 90.0,
    },
    budget: PerformanceBudget {
        small: CategoryBudget { script_kb: 5.0, style_kb: 2.0 },
        medium: CategoryBudget { script_kb: 15.0, style_kb: 8.0 },
        large: CategoryBudget { script_kb: 30.0, style_kb: 20.0 },
        xlarge: CategoryBudget { script_kb: 50.0, style_kb: 35.0 },
        render_time: RenderTimeBudget { fast: 50.0, acceptable: 100.0, slow: 200.0 },
    },
    accessibility: AccessibilityTiming {
        time_to_interactive: 3000.0,
        focus_indicator_delay: 100.0,
        live_region_update_delay: 200.0,
        keyboard_traversal: 100.0,
        screen_reader_read_time: 30_000.0,
    },
    locale: LocaleComplianceTiming {
        locale_switch: 500.0,
        form_validation: 300.0,
        search_response: 1000.0,
    },
    network: NetworkLimits {
        max_requests: 10,
        max_payload_kb: 1000.0,
        min_cache_hit_ratio: 0.8,
    },
    memory_leak_mb: 5.0,
    consistency_spread_ms: 50.0,
};

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1200, height: 800 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Breakpoint {
    pub name: &'static str,
    pub viewport: Viewport,
}

pub const BREAKPOINTS: [Breakpoint; 3] = [
    Breakpoint { name: "mobile", viewport: Viewport { width: 375, height: 667 } },
    Breakpoint { name: "tablet", viewport: Viewport { width: 768, height: 1024 } },
    Breakpoint { name: "desktop", viewport: Viewport { width: 1200, height: 800 } },
];

/// Minimum touch target edge (logical px)
pub const MIN_TOUCH_TARGET: f64 = 44.0;

/// Minimum spacing between adjacent touch targets (logical px)
pub const MIN_TOUCH_SPACING: f64 = 8.0;

/// Read-only registry of brands and thresholds
#[derive(Debug, Clone)]
pub struct Catalog {
    brands: Vec<BrandConfiguration>,
    thresholds: PerformanceThresholds,
}

impl Catalog {
    /// Built-in municipality brands with the standard thresholds
    pub fn builtin() -> Self {
        Self {
            brands: vec![
                BrandConfiguration::municipality(
                    "thalwil",
                    "Thalwil",
                    "Modern lakeside community theme with professional blue palette",
                    ["#3B82F6", "#1E40AF", "#60A5FA", "#F8FAFC", "#1E293B", "#FFFFFF"],
                ),
                BrandConfiguration::municipality(
                    "thalheim",
                    "Thalheim",
                    "Traditional wine region theme with natural green palette",
                    ["#10B981", "#047857", "#34D399", "#F0FDF4", "#064E3B", "#FFFFFF"],
                ),
                BrandConfiguration::municipality(
                    "erlenbach",
                    "Erlenbach",
                    "Upscale lakeshore theme with elegant turquoise palette",
                    ["#06B6D4", "#0891B2", "#22D3EE", "#F0F9FF", "#164E63", "#FFFFFF"],
                ),
            ],
            thresholds: PERFORMANCE_THRESHOLDS,
        }
    }

    /// Process-wide built-in catalog
    pub fn global() -> &'static Catalog {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(Catalog::builtin)
    }

    /// Merge additional brands; an entry with an existing identifier replaces it
    pub fn with_brands(mut self, extra: impl IntoIterator<Item = BrandConfiguration>) -> Self {
        for brand in extra {
            match self.brands.iter_mut().find(|b| b.identifier == brand.identifier) {
                Some(existing) => *existing = brand,
                None => self.brands.push(brand),
            }
        }
        self
    }

    /// Look up a brand. Unknown identifiers are caller misuse.
    pub fn brand(&self, identifier: &str) -> Result<&BrandConfiguration> {
        self.brands
            .iter()
            .find(|b| b.identifier == identifier)
            .ok_or_else(|| EngineError::UnknownBrand {
                id: identifier.to_string(),
                available: self.brand_ids().join(", "),
            })
    }

    pub fn brands(&self) -> &[BrandConfiguration] {
        &self.brands
    }

    pub fn brand_ids(&self) -> Vec<&str> {
        self.brands.iter().map(|b| b.identifier.as_str()).collect()
    }

    pub fn thresholds(&self) -> &PerformanceThresholds {
        &self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_brands() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.brand_ids(), vec!["thalwil", "thalheim", "erlenbach"]);
        let thalwil = catalog.brand("thalwil").unwrap();
        assert_eq!(thalwil.class_name, "municipality-thalwil");
        assert_eq!(thalwil.typography.primary_family(), "Inter");
    }

    #[test]
    fn test_unknown_brand_fails_fast() {
        let err = Catalog::builtin().brand("atlantis").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("atlantis"));
        assert!(message.contains("thalwil"));
    }

    #[test]
    fn test_with_brands_replaces_and_appends() {
        let mut north = Catalog::builtin().brand("thalwil").unwrap().clone();
        north.identifier = "north".to_string();
        let mut thalwil = Catalog::builtin().brand("thalwil").unwrap().clone();
        thalwil.name = "Thalwil (2025)".to_string();

        let catalog = Catalog::builtin().with_brands(vec![north, thalwil]);
        assert_eq!(catalog.brands().len(), 4);
        assert_eq!(catalog.brand("thalwil").unwrap().name, "Thalwil (2025)");
        assert!(catalog.brand("north").is_ok());
    }

    #[test]
    fn test_categorize_exact_and_prefix() {
        assert_eq!(categorize("badge"), ComponentCategory::Small);
        assert_eq!(categorize("status-badge"), ComponentCategory::Small);
        assert_eq!(categorize("hero-banner"), ComponentCategory::Large);
        assert_eq!(categorize("site-header-compact"), ComponentCategory::Large);
        assert_eq!(categorize("Recent-Cards"), ComponentCategory::Xlarge);
    }

    #[test]
    fn test_categorize_unknown_defaults_to_medium() {
        assert_eq!(categorize("context-menu"), ComponentCategory::Medium);
        assert_eq!(categorize(""), ComponentCategory::Medium);
        assert_eq!(categorize("subtext"), ComponentCategory::Medium);
    }

    #[test]
    fn test_large_budget() {
        let budget = PERFORMANCE_THRESHOLDS.budget.for_category(ComponentCategory::Large);
        assert_eq!(budget.script_kb, 30.0);
        assert_eq!(budget.total_kb(), 50.0);
    }
}
