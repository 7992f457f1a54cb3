// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessibility rule modules, one per component family.
//!
//! Each module inspects a rendered component and returns a
//! [`ValidationResult`]: violations are hard failures, warnings are
//! heuristic observations that never flip `is_accessible`.

pub mod forms;
pub mod interactive;
pub mod media;
pub mod navigation;

use crate::dom::Element;
use crate::validation::{ComponentType, ValidationResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trait implemented by all accessibility rule modules
pub trait AccessibilityModule {
    /// Human-readable name of this module
    fn name(&self) -> &str;

    /// Short description of what this module checks
    fn description(&self) -> &str;

    fn component_type(&self) -> ComponentType;

    /// Whether the component contains anything this module inspects
    fn applies_to(&self, element: &Element<'_>) -> bool;

    /// Run every rule of the module against `element`
    fn test(&self, element: &Element<'_>) -> ValidationResult;
}

/// All four modules in a fixed order
pub fn all_modules() -> Vec<Box<dyn AccessibilityModule>> {
    vec![
        Box::new(forms::FormModule),
        Box::new(navigation::NavigationModule),
        Box::new(interactive::InteractiveModule::default()),
        Box::new(media::MediaModule),
    ]
}

/// Module for one component family, `None` for theme/performance
pub fn module_for(component_type: ComponentType) -> Option<Box<dyn AccessibilityModule>> {
    all_modules()
        .into_iter()
        .find(|module| module.component_type() == component_type)
}

/// Run every applicable module on an element
pub fn analyze_element(element: &Element<'_>) -> Vec<ValidationResult> {
    let mut results = Vec::new();
    for module in all_modules() {
        if !module.applies_to(element) {
            continue;
        }
        debug!("Running {} on {:?}", module.name(), element);
        results.push(module.test(element));
    }
    results
}

/// Every applicable module's result for one component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityReport {
    /// `tag#id` / `tag.class` description of the component
    pub component: String,
    pub results: Vec<ValidationResult>,
}

impl AccessibilityReport {
    pub fn of(element: &Element<'_>) -> Self {
        Self {
            component: describe(element),
            results: analyze_element(element),
        }
    }

    pub fn is_accessible(&self) -> bool {
        self.results.iter().all(|r| r.is_accessible)
    }

    pub fn violation_count(&self) -> usize {
        self.results.iter().map(|r| r.violations.len()).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.results.iter().map(|r| r.warnings.len()).sum()
    }
}

/// Link texts that say nothing about the destination
pub const GENERIC_LINK_TEXTS: &[&str] = &["click here", "read more", "more", "link", "here"];

/// Elements that are keyboard-operable without extra wiring
const NATIVE_INTERACTIVE: &[&str] = &["a", "button", "input", "select", "textarea", "summary"];

pub(crate) fn is_native_interactive(element: &Element<'_>) -> bool {
    NATIVE_INTERACTIVE.contains(&element.tag())
}

/// Positive `tabindex` value, if any
pub(crate) fn positive_tabindex(element: &Element<'_>) -> Option<i32> {
    element
        .attr("tabindex")
        .and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|v| *v > 0)
}

pub(crate) fn has_keyboard_handler(element: &Element<'_>) -> bool {
    ["onkeydown", "onkeypress", "onkeyup"]
        .iter()
        .any(|attr| element.has_attr(attr))
}

pub(crate) fn is_generic_text(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    GENERIC_LINK_TEXTS.contains(&lower.as_str())
}

/// Text of the elements referenced by `aria-labelledby`
fn labelledby_text(element: &Element<'_>) -> Option<String> {
    let ids = element.non_empty_attr("aria-labelledby")?;
    let text = ids
        .split_whitespace()
        .filter_map(|id| element.get_element_by_id(id))
        .map(|el| el.text_content())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

/// Accessible name of a button, link or similar control: `aria-label`,
/// `aria-labelledby`, text content, `value` of input buttons, then the
/// `alt` of a contained image
pub fn accessible_name(element: &Element<'_>) -> Option<String> {
    if let Some(label) = element.non_empty_attr("aria-label") {
        return Some(label.to_string());
    }
    if let Some(text) = labelledby_text(element) {
        return Some(text);
    }
    let text = element.text_content();
    if !text.is_empty() {
        return Some(text);
    }
    if element.tag() == "input" {
        if let Some(value) = element.non_empty_attr("value") {
            return Some(value.to_string());
        }
    }
    element
        .query_all("img[alt]")
        .iter()
        .find_map(|img| img.non_empty_attr("alt"))
        .map(str::to_string)
}

/// Short `tag#id` / `tag.class` label for messages
pub(crate) fn describe(element: &Element<'_>) -> String {
    match (element.id(), element.classes().first()) {
        (Some(id), _) => format!("{}#{}", element.tag(), id),
        (None, Some(class)) => format!("{}.{}", element.tag(), class),
        (None, None) => element.tag().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_accessible_name_sources() {
        let doc = Document::parse(
            r#"<span id="lbl">Close dialog</span>
            <button id="a" aria-label="Search"></button>
            <button id="b" aria-labelledby="lbl"></button>
            <button id="c"><img src="x.png" alt="Menu"></button>
            <input id="d" type="submit" value="Send">
            <button id="e"></button>"#,
        );
        let name = |id: &str| accessible_name(&doc.get_element_by_id(id).unwrap());
        assert_eq!(name("a").as_deref(), Some("Search"));
        assert_eq!(name("b").as_deref(), Some("Close dialog"));
        assert_eq!(name("c").as_deref(), Some("Menu"));
        assert_eq!(name("d").as_deref(), Some("Send"));
        assert_eq!(name("e"), None);
    }

    #[test]
    fn test_generic_text() {
        assert!(is_generic_text("Click here"));
        assert!(is_generic_text(" more "));
        assert!(!is_generic_text("Read more about parking permits"));
    }

    #[test]
    fn test_module_lookup() {
        assert_eq!(all_modules().len(), 4);
        assert!(module_for(ComponentType::Media).is_some());
        assert!(module_for(ComponentType::Theme).is_none());
    }

    #[test]
    fn test_analyze_element_selects_modules() {
        let doc = Document::parse(
            r#"<form><label for="q">Query</label><input id="q" type="text"><img src="a.png" alt="Map"></form>"#,
        );
        let form = doc.component("form").unwrap();
        let kinds: Vec<ComponentType> = analyze_element(&form)
            .iter()
            .map(|r| r.component_type)
            .collect();
        assert!(kinds.contains(&ComponentType::Form));
        assert!(kinds.contains(&ComponentType::Media));
        assert!(!kinds.contains(&ComponentType::Navigation));
    }
}
