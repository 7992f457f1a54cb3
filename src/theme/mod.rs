// SPDX-License-Identifier: PMPL-1.0-or-later
//! Theme consistency validation against one brand configuration.
//!
//! [`MunicipalityThemeTester`] runs independent checks over one element:
//! theme class and custom properties, palette and contrast, typography and
//! heading hierarchy, brand assets, interactive state colors, breakpoint
//! stability, theme accessibility and (optionally) drift against the other
//! brands. Each check is recorded once in a [`ThemeTestReport`]; a failing
//! check never stops the checks after it.

pub mod contrast;

pub use contrast::{round_ratio, ContrastEstimator, FixedContrast, WcagContrast};

use crate::catalog::{BrandConfiguration, Catalog, BREAKPOINTS};
use crate::dom::Element;
use crate::error::Result;
use crate::style::{
    has_visible_focus_indicator, PseudoState, Rgb, StateGuard, StateSimulator, StyleInspector,
    StylesheetSimulator,
};
use crate::validation::{TestSummary, ValidationCheck};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Custom properties every themed component must resolve
pub const THEME_CUSTOM_PROPERTIES: [&str; 5] = [
    "--color-primary",
    "--color-secondary",
    "--color-accent",
    "--color-surface",
    "--color-text",
];

const TEXT_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, a, button, span";
const INTERACTIVE_SELECTOR: &str = "button, a, input, select, textarea";
const FOCUSABLE_SELECTOR: &str =
    "a[href], button, input, select, textarea, [tabindex]:not([tabindex=\"-1\"])";
const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// Font families allowed before the stack counts as fragmented
const MAX_FONT_FAMILIES: usize = 2;

/// WCAG AA minimum for body text
const TEXT_CONTRAST_MINIMUM: f64 = 4.5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeOptions {
    /// Also compare against every other brand in the catalog
    pub test_cross_theme: bool,
}

/// Results of one theme run for one brand
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeTestReport {
    pub municipality: String,
    pub timestamp: DateTime<Utc>,
    pub tests: BTreeMap<String, ValidationCheck>,
    pub summary: TestSummary,
}

/// A measured text/background pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContrastSample {
    element: String,
    text_color: String,
    background_color: String,
    ratio: f64,
    passes: bool,
}

/// Tests one element against one brand configuration
pub struct MunicipalityThemeTester<'c> {
    catalog: &'c Catalog,
    brand: &'c BrandConfiguration,
    palette: Vec<Rgb>,
    contrast: Box<dyn ContrastEstimator>,
    simulator: Box<dyn StateSimulator>,
    inspector: StyleInspector,
    report: ThemeTestReport,
}

impl<'c> MunicipalityThemeTester<'c> {
    /// Bind a tester to a brand. Unknown brand identifiers are rejected.
    pub fn new(catalog: &'c Catalog, municipality: &str) -> Result<Self> {
        let brand = catalog.brand(municipality)?;
        let palette = brand.palette.colors().iter().filter_map(|c| Rgb::parse(c)).collect();

        Ok(Self {
            catalog,
            brand,
            palette,
            contrast: Box::new(WcagContrast),
            simulator: Box::new(StylesheetSimulator::new()),
            inspector: StyleInspector::default(),
            report: ThemeTestReport {
                municipality: brand.identifier.clone(),
                timestamp: Utc::now(),
                tests: BTreeMap::new(),
                summary: TestSummary::default(),
            },
        })
    }

    pub fn with_contrast_estimator(mut self, estimator: impl ContrastEstimator + 'static) -> Self {
        self.contrast = Box::new(estimator);
        self
    }

    pub fn with_state_simulator(mut self, simulator: impl StateSimulator + 'static) -> Self {
        self.simulator = Box::new(simulator);
        self
    }

    pub fn brand(&self) -> &BrandConfiguration {
        self.brand
    }

    pub fn report(&self) -> &ThemeTestReport {
        &self.report
    }

    /// Run every check and finalize the summary
    pub fn run_complete_theme_tests(mut self, element: &Element<'_>, options: &ThemeOptions) -> ThemeTestReport {
        info!("Running comprehensive theme tests for {} municipality", self.brand.name);

        self.test_theme_class_application(element);
        self.test_color_palette_compliance(element);
        self.test_typography_consistency(element);
        self.test_brand_element_positioning(element);
        self.test_component_state_theming(element);
        self.test_responsive_theme_behavior(element);
        self.test_theme_accessibility_compliance(element);
        if options.test_cross_theme {
            self.test_cross_theme_consistency(element);
        }

        self.calculate_test_summary();
        self.report
    }

    /// Finalize pass rate and status, logging the summary lines
    pub fn calculate_test_summary(&mut self) {
        let summary = &mut self.report.summary;
        summary.finalize();
        info!("Theme testing complete for {}:", self.brand.name);
        info!("- Total tests: {}", summary.total);
        info!("- Passed: {}", summary.passed);
        info!("- Failed: {}", summary.failed);
        info!("- Warnings: {}", summary.warnings);
        info!("- Pass rate: {:.1}%", summary.pass_rate);
        info!("- Status: {}", summary.status);
    }

    fn record(&mut self, key: &str, check: ValidationCheck) -> ValidationCheck {
        debug!("{}: passed={} issues={}", check.name, check.passed, check.issues.len());
        self.report.summary.update(&check);
        self.report.tests.insert(key.to_string(), check.clone());
        check
    }

    fn in_palette(&self, color: &Rgb) -> bool {
        self.palette.iter().any(|p| p == color)
    }

    /// Visible, non-palette color in use, if any
    fn off_palette(&self, color: Option<Rgb>) -> Option<Rgb> {
        color.filter(|c| !c.transparent && !self.in_palette(c))
    }

    /// Identifying class on the element or a descendant, plus the theme
    /// custom properties resolving to non-empty values.
    pub fn test_theme_class_application(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Theme Class Application");
        let class_name = &self.brand.class_name;

        let has_theme_class =
            element.has_class(class_name) || element.query(&format!(".{}", class_name)).is_some();
        check.detail("hasThemeClass", has_theme_class);
        if !has_theme_class {
            check.issue(format!("Component missing municipality theme class: {}", class_name));
        }

        let style = self.inspector.computed(element);
        let mut custom_properties = Map::new();
        for property in THEME_CUSTOM_PROPERTIES {
            let value = style.custom_property(property);
            custom_properties.insert(property.to_string(), json!(value.unwrap_or("")));
            if value.is_none() {
                check.issue(format!("Missing CSS custom property: {}", property));
            }
        }
        check.detail("customProperties", Value::Object(custom_properties));

        self.record("themeClassApplication", check.finish())
    }

    fn text_elements<'a>(&self, element: &Element<'a>) -> Vec<Element<'a>> {
        let mut found: Vec<Element<'a>> = element
            .query_all_inclusive(TEXT_SELECTOR)
            .into_iter()
            .filter(|el| !el.text_content().is_empty())
            .collect();
        if found.is_empty() && !element.own_text().is_empty() {
            found.push(*element);
        }
        found
    }

    fn contrast_samples(&self, element: &Element<'_>, minimum: f64) -> Vec<ContrastSample> {
        let text_fallback = Rgb::parse(&self.brand.palette.text).unwrap_or(Rgb::BLACK);
        let background_fallback = Rgb::parse(&self.brand.palette.background).unwrap_or(Rgb::WHITE);

        self.text_elements(element)
            .iter()
            .enumerate()
            .map(|(index, el)| {
                let foreground = self
                    .inspector
                    .computed(el)
                    .color
                    .filter(|c| !c.transparent)
                    .unwrap_or(text_fallback);
                let background = self.inspector.effective_background(el).unwrap_or(background_fallback);
                let ratio = round_ratio(self.contrast.estimate(foreground, background));
                ContrastSample {
                    element: format!("{}-{}", el.tag(), index),
                    text_color: foreground.to_string(),
                    background_color: background.to_string(),
                    ratio,
                    passes: ratio >= minimum,
                }
            })
            .collect()
    }

    /// Text contrast against the brand minimum, plus colors outside the palette
    pub fn test_color_palette_compliance(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Color Palette Compliance");
        let minimum = self.brand.compliance.contrast_ratio;

        let style = self.inspector.computed(element);
        check.detail(
            "usedColors",
            json!({
                "color": style.color.map(|c| c.to_string()),
                "backgroundColor": style.background_color.map(|c| c.to_string()),
                "borderColor": style.border_color.map(|c| c.to_string()),
            }),
        );
        check.detail(
            "primaryColorElements",
            element.query_all(".text-primary, .bg-primary, .border-primary").len(),
        );

        let samples = self.contrast_samples(element, minimum);
        for sample in samples.iter().filter(|s| !s.passes) {
            check.issue(format!(
                "Insufficient color contrast on {}: {} (minimum: {})",
                sample.element, sample.ratio, minimum
            ));
        }
        if !samples.is_empty() {
            let average = samples.iter().map(|s| s.ratio).sum::<f64>() / samples.len() as f64;
            check.detail("averageContrast", round_ratio(average));
        }
        check.detail_json("contrastResults", &samples);
        check.detail("estimator", self.contrast.name());

        let inconsistent = self.inconsistent_colors(element);
        if !inconsistent.is_empty() {
            check.warning(format!("Found {} elements with non-theme colors", inconsistent.len()));
            check.detail("inconsistentColors", Value::Array(inconsistent));
        }

        self.record("colorPaletteCompliance", check.finish())
    }

    fn inconsistent_colors(&self, element: &Element<'_>) -> Vec<Value> {
        let mut found = Vec::new();
        for (index, el) in element.query_all_inclusive("*").iter().enumerate() {
            let style = self.inspector.computed(el);
            let used = [
                ("color", style.color),
                ("backgroundColor", style.background_color),
                ("borderColor", style.border_color),
            ];
            for (property, color) in used {
                if let Some(color) = self.off_palette(color) {
                    found.push(json!({
                        "element": format!("{}-{}", el.tag(), index),
                        "property": property,
                        "color": color.to_string(),
                    }));
                }
            }
        }
        found
    }

    /// Font usage against the brand typography and heading hierarchy
    pub fn test_typography_consistency(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Typography Consistency");

        let mut families = BTreeSet::new();
        let mut weights = BTreeSet::new();
        let mut sizes = BTreeSet::new();
        let mut line_heights = BTreeSet::new();
        for el in element.query_all_inclusive(TEXT_SELECTOR) {
            let style = self.inspector.computed(&el);
            families.extend(style.font_family);
            weights.extend(style.font_weight);
            sizes.extend(style.font_size);
            line_heights.extend(style.line_height);
        }

        let expected = &self.brand.typography;
        let primary_family = expected.primary_family();
        let uses_primary = families.iter().any(|family: &String| family.contains(primary_family));
        if !uses_primary {
            check.issue(format!("Component not using theme font: {}", expected.primary_font));
        }
        if families.len() > MAX_FONT_FAMILIES {
            check.issue(format!(
                "Too many font families used: {}",
                families.iter().cloned().collect::<Vec<_>>().join(", ")
            ));
        }

        check.detail(
            "fontAnalysis",
            json!({
                "fontFamilies": families,
                "fontWeights": weights,
                "fontSizes": sizes,
                "lineHeights": line_heights,
            }),
        );

        let (structure, hierarchy_issues) = heading_hierarchy(element);
        check.detail(
            "headingHierarchy",
            json!({ "isValid": hierarchy_issues.is_empty(), "structure": structure }),
        );
        for issue in hierarchy_issues {
            check.issue(issue);
        }

        self.record("typographyConsistency", check.finish())
    }

    /// Logo, favicon and header image presence, and brand-specific asset URLs
    pub fn test_brand_element_positioning(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Brand Element Positioning");
        let brand_id = self.brand.identifier.as_str();

        let logo = element.query_all_inclusive(".logo, [data-logo], .brand-logo").into_iter().next();
        let favicon = element
            .document()
            .root()
            .query(r#"link[rel="icon"], link[rel="shortcut icon"]"#);
        let header_image = element
            .query_all_inclusive(".header-image, [data-header-image]")
            .into_iter()
            .next();

        check.detail(
            "brandElements",
            json!({
                "logo": logo.is_some(),
                "favicon": favicon.is_some(),
                "headerImage": header_image.is_some(),
            }),
        );

        match logo {
            Some(logo) => {
                let bounds = self.inspector.computed(&logo).bounding_box;
                let src = asset_source(&logo);
                check.detail(
                    "logoPosition",
                    json!({
                        "width": bounds.width,
                        "height": bounds.height,
                        "top": bounds.top,
                        "left": bounds.left,
                        "src": src,
                    }),
                );
                if let Some(src) = src.filter(|s| !s.contains(brand_id)) {
                    check.issue(format!("Logo may not be municipality-specific: {}", src));
                }
            }
            None => {
                if element.matches("header, .site-header, .page-header") {
                    check.issue("Header component missing logo element");
                }
            }
        }

        if let Some(href) = favicon.and_then(|f| f.non_empty_attr("href")) {
            check.detail("faviconHref", href);
            if !href.contains(brand_id) {
                check.issue(format!("Favicon may not be municipality-specific: {}", href));
            }
        }

        if let Some(src) = header_image.and_then(|h| asset_source(&h)) {
            check.detail("headerImageSrc", src);
            if !src.contains(brand_id) {
                check.issue(format!("Header image may not be municipality-specific: {}", src));
            }
        }

        self.record("brandElementPositioning", check.finish())
    }

    /// Hover, focus and active background colors stay within the palette
    pub fn test_component_state_theming(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Component State Theming");
        let interactive = element.query_all_inclusive(INTERACTIVE_SELECTOR);
        let mut state_results = Map::new();

        for (index, el) in interactive.iter().enumerate() {
            let element_id = el
                .id()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}-{}", el.tag(), index));

            let mut states = Map::new();
            states.insert("default".to_string(), state_colors(&self.inspector.computed_in(el, None)));

            for state in PseudoState::ALL {
                let style = {
                    let guard = StateGuard::enter(self.simulator.as_mut(), el, state);
                    self.inspector.computed_in(el, guard.state_of(el))
                };
                if let Some(color) = self.off_palette(style.background_color) {
                    check.issue(format!(
                        "Element {} {} state uses non-theme background color {}",
                        element_id, state, color
                    ));
                }
                states.insert(state.to_string(), state_colors(&style));
            }
            state_results.insert(element_id, Value::Object(states));
        }

        check.detail("stateResults", Value::Object(state_results));
        check.detail("testedElements", interactive.len());
        self.record("componentStateTheming", check.finish())
    }

    /// Palette consistency replayed at each breakpoint
    pub fn test_responsive_theme_behavior(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Responsive Theme Behavior");
        let mut responsive = Map::new();

        for breakpoint in BREAKPOINTS {
            let style = StyleInspector::at_viewport(breakpoint.viewport).computed(element);
            let colors = [
                ("color", style.color),
                ("backgroundColor", style.background_color),
                ("borderColor", style.border_color),
            ];
            let issues: Vec<String> = colors
                .iter()
                .filter_map(|(property, color)| {
                    self.off_palette(*color)
                        .map(|c| format!("Non-theme {} at {}: {}", property, breakpoint.name, c))
                })
                .collect();

            if !issues.is_empty() {
                check.issue(format!("Theme inconsistency at {} breakpoint", breakpoint.name));
            }
            responsive.insert(
                breakpoint.name.to_string(),
                json!({
                    "breakpoint": breakpoint.name,
                    "width": breakpoint.viewport.width,
                    "isThemeConsistent": issues.is_empty(),
                    "issues": issues,
                }),
            );
        }

        check.detail("responsiveResults", Value::Object(responsive));
        self.record("responsiveThemeBehavior", check.finish())
    }

    /// Text contrast at the WCAG AA minimum, visible focus indicators and
    /// the brand's color-blindness declaration
    pub fn test_theme_accessibility_compliance(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Theme Accessibility Compliance");

        let samples = self.contrast_samples(element, TEXT_CONTRAST_MINIMUM);
        let failed = samples.iter().filter(|s| !s.passes).count();
        if failed > 0 {
            check.issue(format!("{} elements fail color contrast requirements", failed));
        }
        check.detail_json("contrastResults", &samples);

        let focusable: Vec<Element<'_>> = element
            .query_all_inclusive(FOCUSABLE_SELECTOR)
            .into_iter()
            .filter(|el| !el.has_attr("disabled") && el.attr("type") != Some("hidden"))
            .collect();
        let mut without_focus = 0;
        for el in &focusable {
            let rest = self.inspector.computed_in(el, None);
            let focused = {
                let guard = StateGuard::enter(self.simulator.as_mut(), el, PseudoState::Focus);
                self.inspector.computed_in(el, guard.state_of(el))
            };
            if !has_visible_focus_indicator(&rest, &focused) {
                without_focus += 1;
            }
        }
        check.detail(
            "focusResults",
            json!({
                "totalElements": focusable.len(),
                "elementsWithFocus": focusable.len() - without_focus,
                "elementsWithoutFocus": without_focus,
                "allElementsHaveFocus": without_focus == 0,
            }),
        );
        if without_focus > 0 {
            check.issue(format!("{} interactive elements missing focus indicators", without_focus));
        }

        let safe = self.brand.compliance.color_blindness_safe;
        check.detail(
            "colorBlindnessResult",
            json!({
                "isCompatible": safe,
                "testedColors": [self.brand.palette.primary, self.brand.palette.secondary],
            }),
        );
        if !safe {
            check.issue("Theme not compatible with color blindness accessibility requirements");
        }

        self.record("themeAccessibilityCompliance", check.finish())
    }

    /// Class structure compared with every other brand: the element must not
    /// carry another brand's identifying class.
    pub fn test_cross_theme_consistency(&mut self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("Cross-Theme Consistency");
        let current_classes = element.classes();
        let mut results = Map::new();

        for other in self.catalog.brands().iter().filter(|b| b.identifier != self.brand.identifier) {
            let expected: Vec<String> = current_classes
                .iter()
                .map(|cls| cls.replace(&self.brand.class_name, &other.class_name))
                .collect();
            let foreign = element.has_class(&other.class_name)
                || element.query(&format!(".{}", other.class_name)).is_some();

            if foreign {
                check.issue(format!("Structural inconsistency with {} theme", other.identifier));
            }
            results.insert(
                other.identifier.clone(),
                json!({
                    "isConsistent": !foreign,
                    "currentClasses": current_classes,
                    "expectedClasses": expected,
                }),
            );
        }

        check.detail("consistencyResults", Value::Object(results));
        self.record("crossThemeConsistency", check.finish())
    }
}

fn state_colors(style: &crate::style::ComputedStyle) -> Value {
    json!({
        "backgroundColor": style.background_color.map(|c| c.to_string()),
        "color": style.color.map(|c| c.to_string()),
        "borderColor": style.border_color.map(|c| c.to_string()),
        "boxShadow": style.box_shadow(),
    })
}

/// Image source for a brand asset: its own `src`, a nested `<img>`, or a
/// `data-*` attribute value
fn asset_source<'a>(asset: &Element<'a>) -> Option<&'a str> {
    asset
        .non_empty_attr("src")
        .or_else(|| asset.query("img").and_then(|img| img.non_empty_attr("src")))
        .or_else(|| asset.non_empty_attr("data-header-image"))
        .or_else(|| asset.non_empty_attr("data-logo"))
}

/// Heading outline and any hierarchy violations. The first heading must be
/// an `h1`; later headings may not skip more than one level down.
fn heading_hierarchy(element: &Element<'_>) -> (Vec<Value>, Vec<String>) {
    let mut structure = Vec::new();
    let mut issues = Vec::new();
    let mut last_level = 0u32;

    for (index, heading) in element.query_all_inclusive(HEADING_SELECTOR).iter().enumerate() {
        let level = heading.tag()[1..].parse::<u32>().unwrap_or(1);
        let text: String = heading.text_content().chars().take(50).collect();
        structure.push(json!({ "level": level, "text": text, "index": index }));

        if index == 0 && level != 1 {
            issues.push("First heading should be h1".to_string());
        }
        if index > 0 && level > last_level + 1 {
            issues.push(format!("Heading level skipped: h{} after h{}", level, last_level));
        }
        last_level = level;
    }
    (structure, issues)
}
