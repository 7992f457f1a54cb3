// SPDX-License-Identifier: PMPL-1.0-or-later
//! Form accessibility - WCAG 1.3.1 Info and Relationships, 3.3.1 Error
//! Identification, 3.3.2 Labels or Instructions, 2.1.1 Keyboard
//!
//! Checks:
//! - Every control resolves an accessible name (label, aria-label, aria-labelledby)
//! - Required controls carry `required` / `aria-required`
//! - Required controls have an error container wired through aria-describedby
//! - No positive tabindex, no click-only custom controls

use crate::analyzers::{has_keyboard_handler, is_native_interactive, positive_tabindex, AccessibilityModule};
use crate::dom::Element;
use crate::validation::{ComponentType, ValidationCheck, ValidationResult};

/// Form accessibility module
pub struct FormModule;

/// Input types that need no visible label
const EXEMPT_INPUT_TYPES: &[&str] = &["hidden", "submit", "reset", "button", "image"];

/// Input types whose format should be described to the user
const FORMAT_INPUT_TYPES: &[&str] = &["password", "email", "date"];

/// Input types that benefit from autocomplete hints
const AUTOCOMPLETE_INPUT_TYPES: &[&str] = &["email", "tel", "url"];

const CONTROLS: &str = "input, select, textarea";

impl AccessibilityModule for FormModule {
    fn name(&self) -> &str {
        "Form Accessibility"
    }

    fn description(&self) -> &str {
        "Checks labels, required fields, error messages and keyboard use (WCAG 1.3.1, 3.3.1, 3.3.2)"
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::Form
    }

    fn applies_to(&self, element: &Element<'_>) -> bool {
        !element.query_all_inclusive(&format!("form, {}", CONTROLS)).is_empty()
    }

    fn test(&self, element: &Element<'_>) -> ValidationResult {
        test_form_accessibility(element)
    }
}

/// Run every form rule against `element`
pub fn test_form_accessibility(element: &Element<'_>) -> ValidationResult {
    let mut result = ValidationResult::new(ComponentType::Form);
    result.record(test_form_labels(element));
    result.record(test_required_fields(element));
    result.record(test_error_messages(element));
    result.record(test_keyboard_navigation(element));
    result.record(test_autocomplete(element));
    result
}

/// `type` of an input, or the tag name for select/textarea
fn control_type(control: &Element<'_>) -> String {
    match control.tag() {
        "input" => control
            .non_empty_attr("type")
            .map(str::to_lowercase)
            .unwrap_or_else(|| "text".to_string()),
        other => other.to_string(),
    }
}

/// Explicit `label[for=id]` or a wrapping `<label>`
fn label_for<'a>(control: &Element<'a>) -> Option<Element<'a>> {
    if let Some(id) = control.id() {
        let explicit = control
            .document()
            .root()
            .query_all("label[for]")
            .into_iter()
            .find(|label| label.attr("for") == Some(id));
        if explicit.is_some() {
            return explicit;
        }
    }
    control.parent().and_then(|parent| parent.closest("label"))
}

fn has_accessible_label(control: &Element<'_>) -> bool {
    if label_for(control).is_some() || control.non_empty_attr("aria-label").is_some() {
        return true;
    }
    match control.non_empty_attr("aria-labelledby") {
        Some(ids) => control.missing_references(ids).len() < ids.split_whitespace().count(),
        None => false,
    }
}

fn has_required_flag(control: &Element<'_>) -> bool {
    control.has_attr("required") || control.attr("aria-required") == Some("true")
}

/// Marked required in any way a sighted user or a script would notice
fn looks_required(control: &Element<'_>) -> bool {
    control.has_attr("data-required")
        || control.has_class("required")
        || label_for(control).is_some_and(|label| label.text_content().contains('*'))
}

fn label_shows_required(label: &Element<'_>) -> bool {
    label.text_content().contains('*') || label.query(".required").is_some()
}

/// Every control must resolve an accessible name
pub fn test_form_labels(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("labels");
    let controls = element.query_all_inclusive(CONTROLS);
    let mut labelled = 0;

    for (i, control) in controls.iter().enumerate() {
        let kind = control_type(control);
        if EXEMPT_INPUT_TYPES.contains(&kind.as_str()) {
            continue;
        }

        if has_accessible_label(control) {
            labelled += 1;
        } else {
            check.issue(format!("Input {} ({}) missing accessible label", i, kind));
        }

        if let Some(ids) = control.non_empty_attr("aria-labelledby") {
            for missing in control.missing_references(ids) {
                check.issue(format!(
                    "Input {} aria-labelledby references non-existent element {}",
                    i, missing
                ));
            }
        }

        if FORMAT_INPUT_TYPES.contains(&kind.as_str()) && !control.has_attr("aria-describedby") {
            check.warning(format!(
                "Input {} ({}) should have description for format requirements",
                i, kind
            ));
        }
    }

    check.detail("controls", controls.len()).detail("labelled", labelled);
    check.finish()
}

/// Required controls must expose the requirement to assistive technology
pub fn test_required_fields(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("requiredFields");
    let mut required = 0;

    for (i, control) in element.query_all_inclusive(CONTROLS).iter().enumerate() {
        let flagged = has_required_flag(control);
        if !flagged && !looks_required(control) {
            continue;
        }
        required += 1;

        if !flagged {
            check.issue(format!(
                "Required field {} missing required or aria-required attribute",
                i
            ));
        }
        if let Some(label) = label_for(control) {
            if !label_shows_required(&label) {
                check.warning(format!("Required field {} missing visual indicator", i));
            }
        }
    }

    check.detail("required", required);
    check.finish()
}

/// Error container for a control: `[data-error-for=id]` or `#id-error`
fn error_container<'a>(control: &Element<'a>) -> Option<Element<'a>> {
    let id = control.id()?;
    control
        .document()
        .root()
        .query_all("[data-error-for]")
        .into_iter()
        .find(|el| el.attr("data-error-for") == Some(id))
        .or_else(|| control.get_element_by_id(&format!("{}-error", id)))
}

/// Required controls should have an error container, and an existing
/// container must be referenced from `aria-describedby`
pub fn test_error_messages(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("errorMessages");

    for (i, control) in element.query_all_inclusive(CONTROLS).iter().enumerate() {
        if !has_required_flag(control) && !looks_required(control) {
            continue;
        }

        let Some(container) = error_container(control) else {
            check.warning(format!("Required input {} missing error message container", i));
            continue;
        };

        let described = control.attr("aria-describedby").unwrap_or_default();
        let wired = container
            .id()
            .is_some_and(|id| described.split_whitespace().any(|r| r == id));
        if !wired {
            check.issue(format!(
                "Input {} error container not properly associated with aria-describedby",
                i
            ));
        }
    }

    check.finish()
}

/// No positive tab order, and custom click targets need keyboard handlers
pub fn test_keyboard_navigation(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("keyboardNavigation");
    let focusables = element.query_all_inclusive("input, select, textarea, button, a, [tabindex], [onclick]");

    for (i, el) in focusables.iter().enumerate() {
        if let Some(n) = positive_tabindex(el) {
            check.issue(format!(
                "Element {} uses positive tabindex ({}), which can disrupt tab order",
                i, n
            ));
        }
        if el.has_attr("onclick") && !is_native_interactive(el) && !has_keyboard_handler(el) {
            check.issue(format!(
                "Element {} has click handler but missing keyboard event handler",
                i
            ));
        }
    }

    check.detail("focusable", focusables.len());
    check.finish()
}

/// Personal-data inputs should declare an autocomplete purpose
pub fn test_autocomplete(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("autocomplete");

    for (i, control) in element.query_all_inclusive("input").iter().enumerate() {
        let kind = control_type(control);
        if AUTOCOMPLETE_INPUT_TYPES.contains(&kind.as_str()) && !control.has_attr("autocomplete") {
            check.warning(format!(
                "Input {} ({}) missing autocomplete attribute",
                i, kind
            ));
        }
    }

    check.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn form(markup: &str) -> Document {
        Document::parse(markup)
    }

    #[test]
    fn test_unlabelled_select_single_violation() {
        let doc = form("<form><select><option>Zurich</option></select></form>");
        let el = doc.component("form").unwrap();
        let check = test_form_labels(&el);
        assert!(!check.passed);
        assert_eq!(check.issues, vec!["Input 0 (select) missing accessible label".to_string()]);
    }

    #[test]
    fn test_label_sources_accepted() {
        let doc = form(
            r#"<form>
              <label for="a">Name</label><input id="a" type="text">
              <label>Street <input type="text"></label>
              <input type="text" aria-label="City">
              <span id="zip-label">ZIP</span><input type="text" aria-labelledby="zip-label">
              <input type="hidden" name="token">
              <input type="submit" value="Send">
            </form>"#,
        );
        let check = test_form_labels(&doc.component("form").unwrap());
        assert!(check.passed, "{:?}", check.issues);
        assert_eq!(check.detail_f64("labelled"), Some(4.0));
    }

    #[test]
    fn test_dangling_labelledby() {
        let doc = form(r#"<form><textarea aria-labelledby="gone"></textarea></form>"#);
        let check = test_form_labels(&doc.component("form").unwrap());
        assert_eq!(check.issues.len(), 2);
        assert!(check.issues[1].contains("gone"));
    }

    #[test]
    fn test_format_description_is_warning() {
        let doc = form(r#"<form><label for="p">Password</label><input id="p" type="password"></form>"#);
        let check = test_form_labels(&doc.component("form").unwrap());
        assert!(check.passed);
        assert_eq!(check.warnings.len(), 1);
        assert!(check.warnings[0].contains("password"));
    }

    #[test]
    fn test_required_needs_machine_flag() {
        let doc = form(
            r#"<form>
              <label for="a">Name *</label><input id="a" type="text">
              <label for="b">Email *</label><input id="b" type="email" required>
              <label for="c">Phone</label><input id="c" type="tel" aria-required="true">
            </form>"#,
        );
        let check = test_required_fields(&doc.component("form").unwrap());
        assert_eq!(check.issues, vec!["Required field 0 missing required or aria-required attribute".to_string()]);
        assert_eq!(check.warnings, vec!["Required field 2 missing visual indicator".to_string()]);
        assert_eq!(check.detail_f64("required"), Some(3.0));
    }

    #[test]
    fn test_error_container_wiring() {
        let doc = form(
            r#"<form>
              <label for="a">A *</label><input id="a" required aria-describedby="a-error">
              <span id="a-error"></span>
              <label for="b">B *</label><input id="b" required>
              <span id="b-msg" data-error-for="b"></span>
              <label for="c">C *</label><input id="c" required>
            </form>"#,
        );
        let check = test_error_messages(&doc.component("form").unwrap());
        assert_eq!(
            check.issues,
            vec!["Input 1 error container not properly associated with aria-describedby".to_string()]
        );
        assert_eq!(check.warnings, vec!["Required input 2 missing error message container".to_string()]);
    }

    #[test]
    fn test_keyboard_rules() {
        let doc = form(
            r#"<form>
              <input type="text" aria-label="x" tabindex="3">
              <div onclick="go()">Go</div>
              <div onclick="go()" onkeydown="go()">Go</div>
              <button onclick="go()">Go</button>
            </form>"#,
        );
        let check = test_keyboard_navigation(&doc.component("form").unwrap());
        assert_eq!(check.issues.len(), 2);
        assert!(check.issues[0].contains("positive tabindex (3)"));
        assert!(check.issues[1].starts_with("Element 1 has click handler"));
    }

    #[test]
    fn test_autocomplete_hint() {
        let doc = form(
            r#"<form><input type="email" aria-label="e"><input type="tel" aria-label="t" autocomplete="tel"></form>"#,
        );
        let check = test_autocomplete(&doc.component("form").unwrap());
        assert!(check.passed);
        assert_eq!(check.warnings, vec!["Input 0 (email) missing autocomplete attribute".to_string()]);
    }

    #[test]
    fn test_module_result() {
        let doc = form("<form><select></select></form>");
        let result = FormModule.test(&doc.component("form").unwrap());
        assert!(!result.is_accessible);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.checks.len(), 5);
    }
}
