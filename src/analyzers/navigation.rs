// SPDX-License-Identifier: PMPL-1.0-or-later
//! Navigation accessibility - WCAG 1.3.1 Info and Relationships, 2.4.1
//! Bypass Blocks, 2.4.4 Link Purpose, 4.1.2 Name, Role, Value

use crate::analyzers::{accessible_name, is_generic_text, positive_tabindex, AccessibilityModule};
use crate::dom::Element;
use crate::validation::{ComponentType, ValidationCheck, ValidationResult};

/// Navigation accessibility module
pub struct NavigationModule;

const LANDMARKS: &str = r#"nav, [role="navigation"]"#;

/// Containers that mark a top-level site navigation
const SITE_HEADERS: &str = r#"header, .site-header, [role="banner"]"#;

impl AccessibilityModule for NavigationModule {
    fn name(&self) -> &str {
        "Navigation Accessibility"
    }

    fn description(&self) -> &str {
        "Checks landmarks, menu structure, link purpose and bypass links (WCAG 1.3.1, 2.4.1, 2.4.4)"
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::Navigation
    }

    fn applies_to(&self, element: &Element<'_>) -> bool {
        !element.query_all_inclusive(LANDMARKS).is_empty()
    }

    fn test(&self, element: &Element<'_>) -> ValidationResult {
        test_navigation_accessibility(element)
    }
}

pub fn test_navigation_accessibility(element: &Element<'_>) -> ValidationResult {
    let mut result = ValidationResult::new(ComponentType::Navigation);
    result.record(test_navigation_landmarks(element));
    result.record(test_menu_structure(element));
    result.record(test_keyboard_navigation(element));
    result.record(test_skip_links(element));
    result
}

fn has_landmark_name(nav: &Element<'_>) -> bool {
    if nav.non_empty_attr("aria-label").is_some() {
        return true;
    }
    nav.non_empty_attr("aria-labelledby")
        .is_some_and(|ids| nav.missing_references(ids).len() < ids.split_whitespace().count())
}

/// The container must be a named navigation landmark
pub fn test_navigation_landmarks(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("landmarks");
    let landmarks = element.query_all_inclusive(LANDMARKS);

    if landmarks.is_empty() {
        check.issue("Navigation container missing nav element or navigation role");
        if !has_landmark_name(element) {
            check.issue("Navigation missing accessible name (aria-label or aria-labelledby)");
        }
    }
    for (i, nav) in landmarks.iter().enumerate() {
        if !has_landmark_name(nav) {
            let message = if landmarks.len() == 1 {
                "Navigation missing accessible name (aria-label or aria-labelledby)".to_string()
            } else {
                format!("Navigation {} missing accessible name (aria-label or aria-labelledby)", i)
            };
            check.issue(message);
        }
    }

    check.detail("landmarks", landmarks.len());
    check.finish()
}

/// List markup for menus, and complete state on submenu triggers
pub fn test_menu_structure(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("menuStructure");

    let items = element.query_all("li");
    let orphaned = items
        .iter()
        .any(|li| !li.parent().is_some_and(|p| matches!(p.tag(), "ul" | "ol" | "menu")));
    if orphaned {
        check.warning("Menu items found but not contained in proper list structure");
    }
    if items.is_empty() && element.query_all("a").len() > 1 {
        check.warning("Menu links not wrapped in list markup");
    }

    let triggers: Vec<Element<'_>> = element
        .query_all_inclusive("[aria-haspopup]")
        .into_iter()
        .filter(|el| el.attr("aria-haspopup") != Some("false"))
        .collect();

    for (i, trigger) in triggers.iter().enumerate() {
        if !trigger.has_attr("aria-expanded") {
            check.issue(format!("Submenu trigger {} missing aria-expanded attribute", i));
        }
        match trigger.non_empty_attr("aria-controls") {
            None => {
                check.issue(format!("Submenu trigger {} missing aria-controls attribute", i));
            }
            Some(ids) => {
                for missing in trigger.missing_references(ids) {
                    check.issue(format!(
                        "Submenu trigger {} aria-controls references non-existent element {}",
                        i, missing
                    ));
                }
            }
        }
    }

    check.detail("items", items.len()).detail("submenuTriggers", triggers.len());
    check.finish()
}

/// Links and buttons must be reachable and say where they lead
pub fn test_keyboard_navigation(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("keyboardNavigation");

    for (i, link) in element.query_all_inclusive("a").iter().enumerate() {
        if !link.has_attr("href") && !link.has_attr("role") {
            check.issue(format!("Link {} missing href attribute or alternative role", i));
        }
        match accessible_name(link) {
            None => {
                check.issue(format!("Link {} missing accessible text", i));
            }
            Some(text) if is_generic_text(&text) => {
                check.issue(format!(
                    "Link {} uses generic text \"{}\" - should be more descriptive",
                    i, text
                ));
            }
            Some(_) => {}
        }
    }

    for (i, button) in element.query_all_inclusive("button").iter().enumerate() {
        if accessible_name(button).is_none() {
            check.issue(format!("Button {} missing accessible text", i));
        }
    }

    for (i, el) in element.query_all_inclusive("[tabindex]").iter().enumerate() {
        if let Some(n) = positive_tabindex(el) {
            check.issue(format!(
                "Element {} uses positive tabindex ({}), which can disrupt tab order",
                i, n
            ));
        }
    }

    check.finish()
}

fn is_skip_link(link: &Element<'_>) -> bool {
    let text = link.text_content().to_lowercase();
    text.contains("skip") && (text.contains("main") || text.contains("content"))
}

/// Site-level navigation should offer a bypass to the main content
pub fn test_skip_links(element: &Element<'_>) -> ValidationCheck {
    let mut check = ValidationCheck::builder("skipLinks");

    let in_site_header = element.closest(SITE_HEADERS).is_some()
        || !element.query_all(SITE_HEADERS).is_empty();
    let skip_links: Vec<Element<'_>> = element
        .document()
        .root()
        .query_all("a[href^=\"#\"]")
        .into_iter()
        .filter(is_skip_link)
        .collect();

    if in_site_header && skip_links.is_empty() {
        check.warning("Main navigation missing skip to main content link");
    }
    for link in &skip_links {
        let target = link.attr("href").unwrap_or_default().trim_start_matches('#');
        if !target.is_empty() && link.get_element_by_id(target).is_none() {
            check.issue(format!("Skip link target #{} does not exist", target));
        }
    }

    check.detail("siteNavigation", in_site_header).detail("skipLinks", skip_links.len());
    check.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    const GOOD_NAV: &str = r##"<body>
      <a href="#main">Skip to main content</a>
      <header class="site-header">
        <nav aria-label="Main">
          <ul>
            <li><a href="/services">Services</a></li>
            <li>
              <button aria-haspopup="true" aria-expanded="false" aria-controls="sub">Politics</button>
              <ul id="sub"><li><a href="/council">Council</a></li></ul>
            </li>
          </ul>
        </nav>
      </header>
      <main id="main"></main>
    </body>"##;

    #[test]
    fn test_well_formed_navigation_passes() {
        let doc = Document::parse(GOOD_NAV);
        let nav = doc.component("nav").unwrap();
        let result = NavigationModule.test(&nav);
        assert!(result.is_accessible, "{:?}", result.violations);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_missing_landmark_and_name() {
        let doc = Document::parse(r#"<div class="menu"><ul><li><a href="/a">About us</a></li></ul></div>"#);
        let check = test_navigation_landmarks(&doc.component(".menu").unwrap());
        assert_eq!(check.issues.len(), 2);
        assert!(check.issues[0].contains("missing nav element"));
    }

    #[test]
    fn test_popup_trigger_references() {
        let doc = Document::parse(
            r#"<nav aria-label="Main"><ul><li>
              <button aria-haspopup="menu" aria-controls="panelX">More services</button>
            </li></ul></nav>"#,
        );
        let check = test_menu_structure(&doc.component("nav").unwrap());
        assert_eq!(check.issues.len(), 2);
        assert!(check.issues[0].contains("aria-expanded"));
        assert!(check.issues[1].contains("panelX"));
    }

    #[test]
    fn test_orphaned_list_items_warn() {
        let doc = Document::parse(r#"<nav aria-label="x"><div><li><a href="/">Home</a></li></div></nav>"#);
        let check = test_menu_structure(&doc.component("nav").unwrap());
        assert!(check.passed);
        assert_eq!(check.warnings.len(), 1);
    }

    #[test]
    fn test_generic_and_empty_links() {
        let doc = Document::parse(
            r#"<nav aria-label="x"><a href="/news">Read more</a><a>Events</a><a href="/x"></a><button></button></nav>"#,
        );
        let check = test_keyboard_navigation(&doc.component("nav").unwrap());
        assert_eq!(
            check.issues,
            vec![
                "Link 0 uses generic text \"Read more\" - should be more descriptive".to_string(),
                "Link 1 missing href attribute or alternative role".to_string(),
                "Link 2 missing accessible text".to_string(),
                "Button 0 missing accessible text".to_string(),
            ]
        );
    }

    #[test]
    fn test_skip_link_expected_in_header() {
        let doc = Document::parse(r#"<header><nav aria-label="Main"><a href="/">Home</a></nav></header>"#);
        let check = test_skip_links(&doc.component("nav").unwrap());
        assert!(check.passed);
        assert_eq!(check.warnings.len(), 1);

        let doc = Document::parse(r#"<footer><nav aria-label="Legal"><a href="/">Imprint</a></nav></footer>"#);
        assert!(test_skip_links(&doc.component("nav").unwrap()).warnings.is_empty());
    }
}
