// SPDX-License-Identifier: PMPL-1.0-or-later
//! Interactive control accessibility - WCAG 2.1.1 Keyboard, 2.4.7 Focus
//! Visible, 2.5.5 Target Size, 4.1.2 Name, Role, Value
//!
//! Checks:
//! - Buttons and links resolve an accessible name
//! - Custom buttons carry role="button" and keyboard handlers
//! - Tab widgets wire aria-controls / aria-selected / aria-labelledby to real ids
//! - Touch targets are at least 44x44 and keep 8px from interactive siblings
//! - Focusing an element changes outline, shadow or border

use crate::analyzers::{
    accessible_name, describe, has_keyboard_handler, is_generic_text, positive_tabindex,
    AccessibilityModule,
};
use crate::catalog::{MIN_TOUCH_SPACING, MIN_TOUCH_TARGET};
use crate::dom::Element;
use crate::style::{
    has_visible_focus_indicator, BoxMetrics, PseudoState, StateGuard, StateSimulator,
    StyleInspector, StylesheetSimulator,
};
use crate::validation::{ComponentType, ValidationCheck, ValidationResult};
use std::cell::RefCell;
use tracing::debug;

const BUTTONS: &str = r#"button, input[type="button"], input[type="submit"], input[type="reset"], [role="button"], div[onclick], span[onclick]"#;

const LINKS: &str = r#"a, [role="link"]"#;

const TOUCH_TARGETS: &str = r#"a[href], button, input:not([type="hidden"]), select, textarea, [role="button"], [role="link"], [role="tab"], [tabindex]:not([tabindex="-1"])"#;

const FOCUSABLE: &str = r#"a[href], button, input, select, textarea, [tabindex]:not([tabindex="-1"])"#;

/// Words that announce a link leaves the site
const EXTERNAL_HINTS: &[&str] = &["external", "new window", "new tab", "opens"];

/// Interactive control module; focus checks drive a [`StateSimulator`]
pub struct InteractiveModule {
    inspector: StyleInspector,
    simulator: RefCell<Box<dyn StateSimulator>>,
}

impl Default for InteractiveModule {
    fn default() -> Self {
        Self {
            inspector: StyleInspector::default(),
            simulator: RefCell::new(Box::new(StylesheetSimulator::new())),
        }
    }
}

impl InteractiveModule {
    pub fn with_inspector(mut self, inspector: StyleInspector) -> Self {
        self.inspector = inspector;
        self
    }

    pub fn with_state_simulator(mut self, simulator: impl StateSimulator + 'static) -> Self {
        self.simulator = RefCell::new(Box::new(simulator));
        self
    }

    /// Names, roles and keyboard support of buttons
    pub fn test_button_accessibility(&self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("buttons");
        let buttons = element.query_all_inclusive(BUTTONS);

        for (i, button) in buttons.iter().enumerate() {
            if accessible_name(button).is_none() {
                check.issue(format!("Button {} missing accessible name", i));
            }
            if !matches!(button.tag(), "button" | "input") {
                if button.attr("role") != Some("button") {
                    check.issue(format!(
                        "Button {} non-button element with button behavior missing role=\"button\"",
                        i
                    ));
                }
                if !has_keyboard_handler(button) {
                    check.issue(format!(
                        "Button {} non-button element missing keyboard event handlers",
                        i
                    ));
                }
            }
            if button.tag() == "button" && !button.has_attr("type") {
                check.warning(format!(
                    "Button {} missing type attribute (defaults to submit)",
                    i
                ));
            }
        }

        check.detail("buttons", buttons.len());
        check.finish()
    }

    /// Targets, names and purpose of links
    pub fn test_link_accessibility(&self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("links");
        let links = element.query_all_inclusive(LINKS);

        for (i, link) in links.iter().enumerate() {
            if !link.has_attr("href") && link.attr("role") != Some("button") {
                check.issue(format!("Link {} missing href attribute or button role", i));
            }
            match accessible_name(link) {
                None => {
                    check.issue(format!("Link {} missing accessible name", i));
                }
                Some(text) if is_generic_text(&text) => {
                    check.issue(format!("Link {} text \"{}\" is not descriptive", i, text));
                }
                Some(_) => {}
            }
            if is_external(link) && !has_external_hint(link) {
                check.warning(format!(
                    "Link {} to external site missing external-link indicator",
                    i
                ));
            }
        }

        check.detail("links", links.len());
        check.finish()
    }

    /// tablist / tab / tabpanel wiring, including every referenced id
    pub fn test_tab_accessibility(&self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("tabs");

        let tablists = element.query_all_inclusive(r#"[role="tablist"]"#);
        for (i, tablist) in tablists.iter().enumerate() {
            let tabs = tablist.query_all(r#"[role="tab"]"#);
            if tabs.is_empty() {
                check.issue(format!("Tablist {} contains no tab elements", i));
                continue;
            }
            let selected = tabs
                .iter()
                .filter(|tab| tab.attr("aria-selected") == Some("true"))
                .count();
            if selected != 1 {
                check.warning(format!(
                    "Tablist {} should have exactly one selected tab (found {})",
                    i, selected
                ));
            }
        }

        let tabs = element.query_all_inclusive(r#"[role="tab"]"#);
        for (i, tab) in tabs.iter().enumerate() {
            match tab.non_empty_attr("aria-controls") {
                None => {
                    check.issue(format!("Tab {} missing aria-controls attribute", i));
                }
                Some(ids) => {
                    for missing in tab.missing_references(ids) {
                        check.issue(format!(
                            "Tab {} aria-controls references non-existent panel {}",
                            i, missing
                        ));
                    }
                }
            }
            if !tab.has_attr("aria-selected") {
                check.issue(format!("Tab {} missing aria-selected attribute", i));
            }
        }

        let panels = element.query_all_inclusive(r#"[role="tabpanel"]"#);
        for (i, panel) in panels.iter().enumerate() {
            match panel.non_empty_attr("aria-labelledby") {
                None => {
                    check.issue(format!("Tab panel {} missing aria-labelledby attribute", i));
                }
                Some(ids) => {
                    for missing in panel.missing_references(ids) {
                        check.issue(format!(
                            "Tab panel {} aria-labelledby references non-existent element {}",
                            i, missing
                        ));
                    }
                }
            }
        }

        check
            .detail("tablists", tablists.len())
            .detail("tabs", tabs.len())
            .detail("panels", panels.len());
        check.finish()
    }

    /// 44x44 minimum size, 8px between interactive siblings
    pub fn test_touch_targets(&self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("touchTargets");

        let targets: Vec<(Element<'_>, BoxMetrics)> = element
            .query_all_inclusive(TOUCH_TARGETS)
            .into_iter()
            .filter_map(|el| {
                let style = self.inspector.computed(&el);
                (!style.is_hidden()).then_some((el, style.bounding_box))
            })
            .collect();

        for (el, rect) in &targets {
            if rect.width < MIN_TOUCH_TARGET || rect.height < MIN_TOUCH_TARGET {
                check.issue(format!(
                    "Touch target {} too small: {}x{}px (minimum: {}x{}px)",
                    describe(el),
                    rect.width,
                    rect.height,
                    MIN_TOUCH_TARGET,
                    MIN_TOUCH_TARGET
                ));
            }
        }

        for (i, (a, rect_a)) in targets.iter().enumerate() {
            for (b, rect_b) in &targets[i + 1..] {
                if a.parent() != b.parent() {
                    continue;
                }
                let spacing = spacing_between(rect_a, rect_b);
                if spacing < MIN_TOUCH_SPACING {
                    check.warning(format!(
                        "Touch targets {} and {} too close together: {}px spacing",
                        describe(a),
                        describe(b),
                        spacing
                    ));
                }
            }
        }

        check.detail("targets", targets.len());
        check.finish()
    }

    /// Every focusable element must show a focus indicator
    pub fn test_focus_management(&self, element: &Element<'_>) -> ValidationCheck {
        let mut check = ValidationCheck::builder("focusManagement");

        let focusable: Vec<Element<'_>> = element
            .query_all_inclusive(FOCUSABLE)
            .into_iter()
            .filter(|el| !el.has_attr("disabled") && el.attr("type") != Some("hidden"))
            .collect();

        for el in &focusable {
            let rest = self.inspector.computed_in(el, None);
            let focused = {
                let mut simulator = self.simulator.borrow_mut();
                let guard = StateGuard::enter(&mut **simulator, el, PseudoState::Focus);
                self.inspector.computed_in(el, guard.state_of(el))
            };
            if !has_visible_focus_indicator(&rest, &focused) {
                debug!("No focus indicator on {:?}", el);
                check.issue(format!(
                    "Focusable element {} missing visible focus indicator",
                    describe(el)
                ));
            }
        }

        for el in element.query_all_inclusive("[tabindex]") {
            if let Some(n) = positive_tabindex(&el) {
                check.issue(format!(
                    "Element {} uses positive tabindex ({}) which can disrupt tab order",
                    describe(&el),
                    n
                ));
            }
        }

        check.detail("focusable", focusable.len());
        check.finish()
    }
}

impl AccessibilityModule for InteractiveModule {
    fn name(&self) -> &str {
        "Interactive Control Accessibility"
    }

    fn description(&self) -> &str {
        "Checks buttons, links, tabs, touch targets and focus (WCAG 2.1.1, 2.4.7, 2.5.5, 4.1.2)"
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::Interactive
    }

    fn applies_to(&self, element: &Element<'_>) -> bool {
        !element.query_all_inclusive(TOUCH_TARGETS).is_empty()
            || !element.query_all_inclusive(BUTTONS).is_empty()
    }

    fn test(&self, element: &Element<'_>) -> ValidationResult {
        let mut result = ValidationResult::new(ComponentType::Interactive);
        result.record(self.test_button_accessibility(element));
        result.record(self.test_link_accessibility(element));
        result.record(self.test_tab_accessibility(element));
        result.record(self.test_touch_targets(element));
        result.record(self.test_focus_management(element));
        result
    }
}

fn is_external(link: &Element<'_>) -> bool {
    link.attr("href")
        .map(str::trim)
        .is_some_and(|href| href.starts_with("http://") || href.starts_with("https://"))
}

fn has_external_hint(link: &Element<'_>) -> bool {
    let mut text = link.text_content();
    for attr in ["aria-label", "title", "class", "rel"] {
        if let Some(value) = link.attr(attr) {
            text.push(' ');
            text.push_str(value);
        }
    }
    let text = text.to_lowercase();
    EXTERNAL_HINTS.iter().any(|hint| text.contains(hint))
        || link.query(r#"[aria-hidden="true"]"#).is_some()
}

/// Edge-to-edge distance between two boxes, zero when they overlap
fn spacing_between(a: &BoxMetrics, b: &BoxMetrics) -> f64 {
    let horizontal = (b.left - (a.left + a.width)).max(a.left - (b.left + b.width)).max(0.0);
    let vertical = (b.top - (a.top + a.height)).max(a.top - (b.top + b.height)).max(0.0);
    horizontal.max(vertical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_custom_button_rules() {
        let doc = Document::parse(
            r#"<div id="c">
              <button type="button">Save</button>
              <button></button>
              <div onclick="open()">Open</div>
              <span role="button" onkeydown="k()">Close</span>
            </div>"#,
        );
        let check = InteractiveModule::default().test_button_accessibility(&doc.component("#c").unwrap());
        assert_eq!(
            check.issues,
            vec![
                "Button 1 missing accessible name".to_string(),
                "Button 2 non-button element with button behavior missing role=\"button\"".to_string(),
                "Button 2 non-button element missing keyboard event handlers".to_string(),
            ]
        );
        assert_eq!(check.warnings, vec!["Button 1 missing type attribute (defaults to submit)".to_string()]);
    }

    #[test]
    fn test_link_rules() {
        let doc = Document::parse(
            r#"<div id="c">
              <a href="/fees">Waste collection fees</a>
              <a href="/x">here</a>
              <a>Dead</a>
              <a role="button">Toggle</a>
              <a href="https://ch.ch">Federal portal</a>
              <a href="https://ch.ch" title="Opens external site">ch.ch</a>
            </div>"#,
        );
        let check = InteractiveModule::default().test_link_accessibility(&doc.component("#c").unwrap());
        assert_eq!(
            check.issues,
            vec![
                "Link 1 text \"here\" is not descriptive".to_string(),
                "Link 2 missing href attribute or button role".to_string(),
            ]
        );
        assert_eq!(check.warnings.len(), 1);
        assert!(check.warnings[0].starts_with("Link 4"));
    }

    #[test]
    fn test_tab_controls_missing_panel() {
        let doc = Document::parse(
            r#"<div role="tablist" id="tabs">
              <button role="tab" id="t1" aria-selected="true" aria-controls="panelX">Opening hours</button>
            </div>"#,
        );
        let check = InteractiveModule::default().test_tab_accessibility(&doc.component("#tabs").unwrap());
        assert!(!check.passed);
        assert_eq!(check.issues.len(), 1);
        assert!(check.issues[0].contains("panelX"));
    }

    #[test]
    fn test_complete_tab_widget() {
        let doc = Document::parse(
            r#"<div id="w">
              <div role="tablist">
                <button role="tab" id="t1" aria-selected="true" aria-controls="p1">Hours</button>
                <button role="tab" id="t2" aria-selected="false" aria-controls="p2">Contact</button>
              </div>
              <div role="tabpanel" id="p1" aria-labelledby="t1">Mon-Fri</div>
              <div role="tabpanel" id="p2" aria-labelledby="t9">Phone</div>
              <div role="tablist"></div>
            </div>"#,
        );
        let check = InteractiveModule::default().test_tab_accessibility(&doc.component("#w").unwrap());
        assert_eq!(
            check.issues,
            vec![
                "Tablist 1 contains no tab elements".to_string(),
                "Tab panel 1 aria-labelledby references non-existent element t9".to_string(),
            ]
        );
    }

    #[test]
    fn test_zero_box_fails_touch_target() {
        let doc = Document::parse(r#"<div id="c"><button type="button">Go</button></div>"#);
        let check = InteractiveModule::default().test_touch_targets(&doc.component("#c").unwrap());
        assert!(!check.passed);
        assert_eq!(check.issues, vec!["Touch target button too small: 0x0px (minimum: 44x44px)".to_string()]);
    }

    #[test]
    fn test_touch_target_spacing() {
        let doc = Document::with_stylesheet(
            r#"<div id="c"><button id="a">A</button><button id="b">B</button><button id="d">D</button></div>"#,
            "button { width: 48px; height: 48px; top: 0; }
             #a { left: 0; } #b { left: 52px; } #d { left: 120px; }",
        );
        let check = InteractiveModule::default().test_touch_targets(&doc.component("#c").unwrap());
        assert!(check.passed, "{:?}", check.issues);
        assert_eq!(check.warnings, vec!["Touch targets button#a and button#b too close together: 4px spacing".to_string()]);
    }

    #[test]
    fn test_focus_indicator_required() {
        let doc = Document::with_stylesheet(
            r#"<div id="c">
              <button id="plain">Plain</button>
              <button id="bare">Bare</button>
              <a id="ring" href="/">Ring</a>
              <span id="tab" tabindex="2">Custom</span>
            </div>"#,
            "#bare:focus { outline: none; }
             #ring:focus { outline: none; box-shadow: 0 0 0 3px #005fcc; }",
        );
        let check = InteractiveModule::default().test_focus_management(&doc.component("#c").unwrap());
        assert_eq!(
            check.issues,
            vec![
                "Focusable element button#bare missing visible focus indicator".to_string(),
                "Element span#tab uses positive tabindex (2) which can disrupt tab order".to_string(),
            ]
        );
    }

    #[test]
    fn test_focus_check_leaves_no_state() {
        let doc = Document::parse(r#"<button id="b" type="button">B</button>"#);
        let module = InteractiveModule::default();
        let el = doc.component("#b").unwrap();
        module.test_focus_management(&el);
        assert_eq!(module.simulator.borrow().state_of(&el), None);
    }

    #[test]
    fn test_spacing_between_boxes() {
        let a = BoxMetrics { width: 44.0, height: 44.0, top: 0.0, left: 0.0 };
        let b = BoxMetrics { width: 44.0, height: 44.0, top: 50.0, left: 0.0 };
        assert_eq!(spacing_between(&a, &b), 6.0);
        assert_eq!(spacing_between(&b, &a), 6.0);
        assert_eq!(spacing_between(&a, &a), 0.0);
    }
}
