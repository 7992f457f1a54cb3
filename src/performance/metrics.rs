// SPDX-License-Identifier: PMPL-1.0-or-later
//! Metric sources for the performance validator.
//!
//! [`SyntheticMetrics`] derives Core Web Vitals-like figures, render times
//! and delays from the component's structure plus bounded noise from a
//! seeded RNG. The figures are a regression signal, not a measurement; a
//! collector backed by a real browser can implement [`MetricsSource`]
//! without touching the validator.

use crate::catalog::{CategoryBudget, ComponentCategory, PERFORMANCE_THRESHOLDS};
use crate::dom::Element;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Structural counts the synthetic model is driven by
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureProfile {
    pub descendants: usize,
    pub images: usize,
    pub headings: usize,
    pub interactive: usize,
    pub focusable: usize,
    pub forms: usize,
    pub dynamic: usize,
    pub live_regions: usize,
    pub inline_handlers: usize,
    pub words: usize,
    pub language_switcher: bool,
    pub search: bool,
}

impl StructureProfile {
    pub fn of(element: &Element<'_>) -> Self {
        let count = |selector: &str| element.query_all(selector).len();
        let inline_handlers = element
            .query_all_inclusive("*")
            .iter()
            .filter(|el| el.attrs().iter().any(|(name, _)| name.starts_with("on")))
            .count();

        Self {
            descendants: count("*"),
            images: count("img"),
            headings: count("h1, h2, h3"),
            interactive: count("button, a, input"),
            focusable: count("button, a, input, select, textarea"),
            forms: count("form"),
            dynamic: count("[data-dynamic]"),
            live_regions: element.query_all_inclusive("[aria-live]").len(),
            inline_handlers,
            words: element.text_content().split_whitespace().count(),
            language_switcher: !element.query_all_inclusive("[data-language-switcher]").is_empty(),
            search: !element.query_all_inclusive(r#"[role="search"]"#).is_empty(),
        }
    }

    /// Weighted node count: images x2, forms x3, interactive x1.5
    pub fn complexity(&self) -> f64 {
        self.descendants as f64
            + self.images as f64 * 2.0
            + self.forms as f64 * 3.0
            + self.interactive as f64 * 1.5
    }
}

/// Largest Contentful Paint / First Input Delay / Cumulative Layout Shift
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreWebVitals {
    pub lcp: f64,
    pub fid: f64,
    pub cls: f64,
}

/// Reported script and style payload of a component, in KB
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSizes {
    pub script_kb: f64,
    pub style_kb: f64,
}

impl BundleSizes {
    pub fn total_kb(&self) -> f64 {
        self.script_kb + self.style_kb
    }
}

/// Heap size before and after simulated interaction, in MB
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemorySample {
    pub before: f64,
    pub after: f64,
}

impl MemorySample {
    pub fn growth(&self) -> f64 {
        self.after - self.before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSample {
    pub requests: u32,
    pub payload_kb: f64,
    pub cache_hit_ratio: f64,
}

/// Timed user-facing interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    FocusIndicator,
    LiveRegionUpdate,
    KeyboardStep,
    LocaleSwitch,
    FormValidation,
    SearchResponse,
}

/// Supplies every figure the performance validator compares to budgets
pub trait MetricsSource {
    fn name(&self) -> &str;

    fn core_web_vitals(&mut self, profile: &StructureProfile) -> CoreWebVitals;

    /// One render of the component, in ms
    fn render_time_ms(&mut self, profile: &StructureProfile) -> f64;

    fn bundle_sizes(&mut self, component_name: &str, category: ComponentCategory) -> BundleSizes;

    fn interaction_delay_ms(&mut self, interaction: Interaction) -> f64;

    fn memory_sample(&mut self, profile: &StructureProfile) -> MemorySample;

    fn network(&mut self, component_name: &str) -> NetworkSample;

    /// Render time of the component in a named browser environment
    fn environment_render_ms(&mut self, environment: &str, profile: &StructureProfile) -> f64;
}

/// Request count and payload per component, `(requests, KB)`
const NETWORK_PROFILES: &[(&str, u32, f64)] = &[
    ("newsletter-form", 2, 45.0),
    ("card", 1, 25.0),
    ("site-header", 3, 80.0),
    ("carousel", 4, 150.0),
];

const DEFAULT_NETWORK_PROFILE: (u32, f64) = (2, 30.0);

/// Synthetic render cost per unit of structural complexity, in ms
const RENDER_MS_PER_COMPLEXITY: f64 = 1.0;

/// Default seed when none is configured
pub const DEFAULT_SEED: u64 = 0x5eed;

/// Structure-driven figures with seeded noise
pub struct SyntheticMetrics {
    rng: StdRng,
    bundles: HashMap<String, BundleSizes>,
}

impl Default for SyntheticMetrics {
    fn default() -> Self {
        Self::seeded(DEFAULT_SEED)
    }
}

impl SyntheticMetrics {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            bundles: HashMap::new(),
        }
    }

    /// Use reported sizes for `component_name` instead of an estimate
    pub fn with_bundle_size(mut self, component_name: &str, sizes: BundleSizes) -> Self {
        self.bundles.insert(component_name.to_string(), sizes);
        self
    }

    /// Uniform noise in `[0, spread)`
    fn noise(&mut self, spread: f64) -> f64 {
        self.rng.gen::<f64>() * spread
    }
}

impl MetricsSource for SyntheticMetrics {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn core_web_vitals(&mut self, profile: &StructureProfile) -> CoreWebVitals {
        let mut lcp = 1000.0;
        if profile.images > 0 {
            lcp += 500.0;
        }
        if profile.headings > 0 {
            lcp += 200.0;
        }
        let fid = 20.0 + profile.interactive as f64 * 5.0;
        let mut cls = 0.01;
        if profile.images > 0 {
            cls += 0.03;
        }
        if profile.dynamic > 0 {
            cls += 0.02;
        }

        CoreWebVitals {
            lcp: lcp + self.noise(500.0),
            fid: fid + self.noise(30.0),
            cls: cls + self.noise(0.05),
        }
    }

    fn render_time_ms(&mut self, profile: &StructureProfile) -> f64 {
        profile.complexity() * RENDER_MS_PER_COMPLEXITY + self.noise(5.0)
    }

    fn bundle_sizes(&mut self, component_name: &str, category: ComponentCategory) -> BundleSizes {
        if let Some(reported) = self.bundles.get(component_name) {
            return *reported;
        }
        let budget: CategoryBudget = PERFORMANCE_THRESHOLDS.budget.for_category(category);
        let script_share = 0.4 + self.noise(0.4);
        let style_share = 0.4 + self.noise(0.4);
        BundleSizes {
            script_kb: round_kb(budget.script_kb * script_share),
            style_kb: round_kb(budget.style_kb * style_share),
        }
    }

    fn interaction_delay_ms(&mut self, interaction: Interaction) -> f64 {
        match interaction {
            Interaction::FocusIndicator => self.noise(50.0),
            Interaction::LiveRegionUpdate => 50.0,
            Interaction::KeyboardStep => 10.0,
            Interaction::LocaleSwitch => self.noise(200.0),
            Interaction::FormValidation => self.noise(100.0),
            Interaction::SearchResponse => self.noise(300.0),
        }
    }

    fn memory_sample(&mut self, profile: &StructureProfile) -> MemorySample {
        let before = 20.0 + self.noise(30.0);
        let retained = profile.interactive as f64 * 0.05 + profile.inline_handlers as f64 * 0.1;
        MemorySample {
            before,
            after: before + retained + self.noise(2.0),
        }
    }

    fn network(&mut self, component_name: &str) -> NetworkSample {
        let (requests, payload_kb) = NETWORK_PROFILES
            .iter()
            .find(|(name, _, _)| *name == component_name)
            .map(|(_, requests, kb)| (*requests, *kb))
            .unwrap_or(DEFAULT_NETWORK_PROFILE);
        NetworkSample {
            requests,
            payload_kb,
            cache_hit_ratio: 0.6 + self.noise(0.4),
        }
    }

    fn environment_render_ms(&mut self, _environment: &str, _profile: &StructureProfile) -> f64 {
        50.0 + self.noise(100.0)
    }
}

fn round_kb(kb: f64) -> f64 {
    (kb * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    const CARD: &str = r#"<article class="card" onclick="open()">
      <img src="a.png" alt="Lake">
      <h2>Events</h2>
      <p data-dynamic>Updated daily</p>
      <a href="/events">All events</a>
      <button>Subscribe</button>
    </article>"#;

    #[test]
    fn test_structure_profile() {
        let doc = Document::parse(CARD);
        let profile = StructureProfile::of(&doc.component(".card").unwrap());
        assert_eq!(profile.descendants, 5);
        assert_eq!(profile.images, 1);
        assert_eq!(profile.headings, 1);
        assert_eq!(profile.interactive, 2);
        assert_eq!(profile.dynamic, 1);
        assert_eq!(profile.inline_handlers, 1);
        assert_eq!(profile.complexity(), 5.0 + 2.0 + 3.0);
    }

    #[test]
    fn test_vitals_within_model_bounds() {
        let doc = Document::parse(CARD);
        let profile = StructureProfile::of(&doc.component(".card").unwrap());
        let mut metrics = SyntheticMetrics::seeded(7);
        for _ in 0..20 {
            let vitals = metrics.core_web_vitals(&profile);
            assert!((1700.0..2200.0).contains(&vitals.lcp));
            assert!((30.0..60.0).contains(&vitals.fid));
            assert!((0.06..0.11).contains(&vitals.cls));
        }
    }

    #[test]
    fn test_same_seed_same_figures() {
        let profile = StructureProfile::default();
        let a = SyntheticMetrics::seeded(42).core_web_vitals(&profile);
        let b = SyntheticMetrics::seeded(42).core_web_vitals(&profile);
        assert_eq!(a, b);
    }

    #[test]
    fn test_reported_bundle_overrides_estimate() {
        let sizes = BundleSizes { script_kb: 42.0, style_kb: 12.0 };
        let mut metrics = SyntheticMetrics::seeded(1).with_bundle_size("hero-banner", sizes);
        assert_eq!(metrics.bundle_sizes("hero-banner", ComponentCategory::Large), sizes);

        let estimate = metrics.bundle_sizes("card", ComponentCategory::Medium);
        assert!(estimate.script_kb <= 15.0 * 0.8 + 0.05);
    }

    #[test]
    fn test_network_profiles() {
        let mut metrics = SyntheticMetrics::seeded(3);
        let carousel = metrics.network("carousel");
        assert_eq!((carousel.requests, carousel.payload_kb), (4, 150.0));
        let other = metrics.network("unknown-widget");
        assert_eq!((other.requests, other.payload_kb), (2, 30.0));
        assert!((0.6..1.0).contains(&other.cache_hit_ratio));
    }
}
