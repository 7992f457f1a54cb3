// SPDX-License-Identifier: PMPL-1.0-or-later
//! Style inspector: computed visual properties for elements of a [`Document`].
//!
//! Computation is a small cascade over the document's stylesheet: matching
//! rules are ordered by importance, inline origin, specificity and source
//! order; inherited properties flow from the nearest ancestor; `var()`
//! references resolve against custom properties in scope. Layout is not
//! performed, so box metrics come from explicit pixel declarations and
//! default to zero.
//!
//! [`Document`]: crate::dom::Document

pub mod color;
pub mod sheet;
pub mod state;

pub use color::Rgb;
pub use sheet::{parse_declarations, Declaration, MediaQuery, PseudoState, Rule, StyleSheet};
pub use state::{StateGuard, StateSimulator, StylesheetSimulator};

use crate::catalog::Viewport;
use crate::dom::Element;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Properties inherited from the parent when not declared
const INHERITED_PROPERTIES: &[&str] = &[
    "color",
    "font-family",
    "font-weight",
    "font-size",
    "font-style",
    "line-height",
    "visibility",
];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "solid", "dashed", "dotted", "double", "groove", "ridge", "inset", "outset", "auto",
];

fn is_inherited(property: &str) -> bool {
    property.starts_with("--") || INHERITED_PROPERTIES.contains(&property)
}

/// Rendered box in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoxMetrics {
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub left: f64,
}

/// Viewport and interactive state under which styles are computed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StyleContext {
    pub viewport: Viewport,
    /// State applied to the inspected element itself; ancestors stay at rest
    pub state: Option<PseudoState>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStyle {
    pub color: Option<Rgb>,
    pub background_color: Option<Rgb>,
    pub border_color: Option<Rgb>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub font_size: Option<String>,
    pub line_height: Option<String>,
    pub bounding_box: BoxMetrics,
    #[serde(skip)]
    properties: BTreeMap<String, String>,
}

impl ComputedStyle {
    fn from_properties(properties: BTreeMap<String, String>) -> Self {
        let color_of = |name: &str| properties.get(name).and_then(|v| Rgb::parse(v));
        let text_of = |name: &str| properties.get(name).cloned();
        let px_of = |name: &str| properties.get(name).and_then(|v| parse_px(v)).unwrap_or(0.0);

        Self {
            color: color_of("color"),
            background_color: color_of("background-color"),
            border_color: color_of("border-color"),
            font_family: text_of("font-family"),
            font_weight: text_of("font-weight"),
            font_size: text_of("font-size"),
            line_height: text_of("line-height"),
            bounding_box: BoxMetrics {
                width: px_of("width").max(px_of("min-width")),
                height: px_of("height").max(px_of("min-height")),
                top: px_of("top"),
                left: px_of("left"),
            },
            properties,
        }
    }

    /// Raw computed value of any property
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Custom property value, `None` when unset or blank
    pub fn custom_property(&self, name: &str) -> Option<&str> {
        self.property(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// First family of the font stack, unquoted
    pub fn primary_font_family(&self) -> Option<&str> {
        self.font_family
            .as_deref()
            .and_then(|stack| stack.split(',').next())
            .map(|family| family.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|family| !family.is_empty())
    }

    pub fn font_size_px(&self) -> Option<f64> {
        self.font_size.as_deref().and_then(parse_px)
    }

    /// Whether an outline was declared at all (UA focus ring applies otherwise)
    pub fn outline_declared(&self) -> bool {
        self.properties.contains_key("outline-style") || self.properties.contains_key("outline-width")
    }

    /// `outline: none`, `outline: 0` and friends
    pub fn outline_suppressed(&self) -> bool {
        let style_none = matches!(self.property("outline-style"), Some("none") | Some("hidden"));
        let zero_width = self.property("outline-width").and_then(parse_px) == Some(0.0);
        style_none || zero_width
    }

    /// Box shadow other than `none`
    pub fn box_shadow(&self) -> Option<&str> {
        self.property("box-shadow").filter(|v| !v.eq_ignore_ascii_case("none"))
    }

    pub fn is_hidden(&self) -> bool {
        self.property("display") == Some("none") || self.property("visibility") == Some("hidden")
    }
}

/// Whether focusing an element produces a visible indicator: an outline
/// that is not suppressed (the UA ring when none is declared), a box shadow
/// that differs from rest, or a border color change.
pub fn has_visible_focus_indicator(rest: &ComputedStyle, focused: &ComputedStyle) -> bool {
    let outline = !focused.outline_suppressed();
    let shadow = focused.box_shadow().is_some() && focused.box_shadow() != rest.box_shadow();
    let border = focused.border_color.is_some() && focused.border_color != rest.border_color;
    outline || shadow || border
}

/// Parse a length in px (`rem`/`em` at 16px); unitless `0` is accepted
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    if value == "0" {
        return Some(0.0);
    }
    if let Some(px) = value.strip_suffix("px") {
        return px.trim().parse().ok();
    }
    if let Some(rem) = value.strip_suffix("rem").or_else(|| value.strip_suffix("em")) {
        return rem.trim().parse::<f64>().ok().map(|v| v * 16.0);
    }
    match value {
        "thin" => Some(1.0),
        "medium" => Some(3.0),
        "thick" => Some(5.0),
        _ => None,
    }
}

/// Split a value on whitespace outside parentheses
fn split_tokens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (idx, ch) in value.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&value[s..idx]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        tokens.push(&value[s..]);
    }
    tokens
}

/// Expand the shorthands the validators care about into longhands
fn expand(property: &str, value: &str) -> Vec<(String, String)> {
    let longhand = |p: &str, v: &str| (p.to_string(), v.to_string());
    match property {
        "background" => split_tokens(value)
            .into_iter()
            .find(|token| Rgb::parse(token).is_some())
            .map(|token| vec![longhand("background-color", token)])
            .unwrap_or_default(),
        "border" | "outline" => {
            if value.trim() == "0" || value.trim() == "none" {
                return vec![
                    longhand(&format!("{}-style", property), "none"),
                    longhand(&format!("{}-width", property), "0"),
                ];
            }
            split_tokens(value)
                .into_iter()
                .filter_map(|token| {
                    let part = if BORDER_STYLES.contains(&token) {
                        "style"
                    } else if parse_px(token).is_some() {
                        "width"
                    } else if Rgb::parse(token).is_some() {
                        "color"
                    } else {
                        return None;
                    };
                    Some(longhand(&format!("{}-{}", property, part), token))
                })
                .collect()
        }
        _ => vec![longhand(property, value)],
    }
}

/// Substitute `var(--name[, fallback])` references. `None` if a reference
/// has neither a value nor a fallback.
fn resolve_vars(value: &str, scope: &BTreeMap<String, String>) -> Option<String> {
    static VAR_RE: OnceLock<Regex> = OnceLock::new();
    let re = VAR_RE.get_or_init(|| {
        Regex::new(r"var\(\s*(--[\w-]+)\s*(?:,\s*([^()]*(?:\([^()]*\))?[^()]*))?\)").expect("valid regex")
    });

    let mut current = value.to_string();
    for _ in 0..4 {
        if !current.contains("var(") {
            return Some(current);
        }
        let mut unresolved = false;
        let replaced = re.replace_all(&current, |caps: &regex::Captures| {
            match scope.get(&caps[1]).map(|v| v.trim()).filter(|v| !v.is_empty()) {
                Some(v) => v.to_string(),
                None => match caps.get(2) {
                    Some(fallback) => fallback.as_str().trim().to_string(),
                    None => {
                        unresolved = true;
                        String::new()
                    }
                },
            }
        });
        if unresolved {
            return None;
        }
        current = replaced.into_owned();
    }
    (!current.contains("var(")).then_some(current)
}

/// Computes styles for elements under one [`StyleContext`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleInspector {
    context: StyleContext,
}

impl StyleInspector {
    pub fn new(context: StyleContext) -> Self {
        Self { context }
    }

    pub fn at_viewport(viewport: Viewport) -> Self {
        Self::new(StyleContext { viewport, state: None })
    }

    pub fn context(&self) -> StyleContext {
        self.context
    }

    pub fn computed(&self, element: &Element<'_>) -> ComputedStyle {
        self.computed_in(element, self.context.state)
    }

    /// Computed style with `state` applied to `element`
    pub fn computed_in(&self, element: &Element<'_>, state: Option<PseudoState>) -> ComputedStyle {
        let mut inherited = BTreeMap::new();
        for ancestor in element.ancestors().iter().rev() {
            let props = self.cascade(ancestor, None, &inherited);
            inherited = props.into_iter().filter(|(k, _)| is_inherited(k)).collect();
        }
        ComputedStyle::from_properties(self.cascade(element, state, &inherited))
    }

    /// Computed styles for descendants matching `selector`
    pub fn descendants<'a>(
        &self,
        element: &Element<'a>,
        selector: &str,
    ) -> Vec<(Element<'a>, ComputedStyle)> {
        element
            .query_all(selector)
            .into_iter()
            .map(|el| {
                let style = self.computed_in(&el, None);
                (el, style)
            })
            .collect()
    }

    /// Nearest opaque background color, walking up from `element`
    pub fn effective_background(&self, element: &Element<'_>) -> Option<Rgb> {
        let own = self.computed(element).background_color;
        if let Some(color) = own.filter(|c| !c.transparent) {
            return Some(color);
        }
        element.ancestors().iter().find_map(|ancestor| {
            self.computed_in(ancestor, None)
                .background_color
                .filter(|c| !c.transparent)
        })
    }

    fn cascade(
        &self,
        element: &Element<'_>,
        state: Option<PseudoState>,
        inherited: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        // (important, inline, specificity, order)
        type Key = (bool, bool, sheet::Specificity, usize);
        let inline = element.attr("style").map(parse_declarations).unwrap_or_default();
        let mut ordered: Vec<(Key, &str, &str)> = Vec::new();

        let sheet = element.document().stylesheet();
        for rule in sheet.rules() {
            if rule.applies(element, self.context.viewport, state) {
                for decl in &rule.declarations {
                    let key = (decl.important, false, rule.specificity, rule.order);
                    ordered.push((key, decl.property.as_str(), decl.value.as_str()));
                }
            }
        }
        for (idx, decl) in inline.iter().enumerate() {
            let key = (decl.important, true, (0, 0, 0), idx);
            ordered.push((key, decl.property.as_str(), decl.value.as_str()));
        }
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        let mut props = inherited.clone();
        for (_, property, value) in ordered.iter().filter(|(_, p, _)| p.starts_with("--")) {
            props.insert(property.to_string(), value.to_string());
        }
        for (_, property, value) in ordered.iter().filter(|(_, p, _)| !p.starts_with("--")) {
            let Some(resolved) = resolve_vars(value, &props) else { continue };
            let resolved = if resolved.eq_ignore_ascii_case("inherit") {
                match inherited.get(*property) {
                    Some(v) => v.clone(),
                    None => continue,
                }
            } else {
                resolved
            };
            for (longhand, v) in expand(property, &resolved) {
                props.insert(longhand, v);
            }
        }
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    const MARKUP: &str = r#"<html><head><style>
        :root { --color-primary: #3B82F6; }
        .theme { color: #1E293B; font-family: "Inter", sans-serif; background: #FFFFFF url(bg.png) no-repeat; }
        .theme p { font-size: 1rem; }
        .btn { background-color: var(--color-primary); width: 40px; height: 40px; }
        #go { background-color: #000000; }
        .btn:focus { outline: none; box-shadow: 0 0 0 3px #60A5FA; }
        @media (max-width: 767px) { .btn { width: 48px; min-height: 48px; } }
        </style></head>
        <body><div class="theme"><p>Text <button class="btn" id="go" style="color: red">Go</button></p>
        <a class="plain" href="/">Home</a></div></body></html>"#;

    #[test]
    fn test_inherited_color_and_font() {
        let doc = Document::parse(MARKUP);
        let para = doc.root().query("p").unwrap();
        let style = StyleInspector::default().computed(&para);
        assert_eq!(style.color, Rgb::parse("#1E293B"));
        assert_eq!(style.primary_font_family(), Some("Inter"));
        assert_eq!(style.font_size_px(), Some(16.0));
        assert_eq!(style.background_color, None);
    }

    #[test]
    fn test_specificity_and_inline_win() {
        let doc = Document::parse(MARKUP);
        let button = doc.root().query("#go").unwrap();
        let style = StyleInspector::default().computed(&button);
        assert_eq!(style.background_color, Some(Rgb::BLACK));
        assert_eq!(style.color, Some(Rgb::new(255, 0, 0)));
    }

    #[test]
    fn test_var_resolution_and_background_shorthand() {
        let doc = Document::parse(MARKUP);
        let theme = doc.root().query(".theme").unwrap();
        let style = StyleInspector::default().computed(&theme);
        assert_eq!(style.background_color, Some(Rgb::WHITE));
        assert_eq!(style.custom_property("--color-primary"), Some("#3B82F6"));

        let plain = Document::parse(
            r#"<style>:root{--color-primary:#10B981}.x{background-color:var(--color-primary)}
               .y{color:var(--missing)}.z{color:var(--missing, navy)}</style>
               <div class="x"></div><div class="y"></div><div class="z"></div>"#,
        );
        let inspector = StyleInspector::default();
        let x = plain.root().query(".x").unwrap();
        assert_eq!(inspector.computed(&x).background_color, Rgb::parse("#10B981"));
        let y = plain.root().query(".y").unwrap();
        assert_eq!(inspector.computed(&y).color, None);
        let z = plain.root().query(".z").unwrap();
        assert_eq!(inspector.computed(&z).color, Some(Rgb::new(0, 0, 128)));
    }

    #[test]
    fn test_box_metrics_follow_viewport() {
        let doc = Document::parse(MARKUP);
        let button = doc.root().query(".btn").unwrap();
        let desktop = StyleInspector::default().computed(&button).bounding_box;
        assert_eq!((desktop.width, desktop.height), (40.0, 40.0));

        let mobile = StyleInspector::at_viewport(Viewport { width: 375, height: 667 })
            .computed(&button)
            .bounding_box;
        assert_eq!((mobile.width, mobile.height), (48.0, 48.0));
    }

    #[test]
    fn test_box_defaults_to_zero() {
        let doc = Document::parse(MARKUP);
        let link = doc.root().query("a.plain").unwrap();
        assert_eq!(StyleInspector::default().computed(&link).bounding_box, BoxMetrics::default());
    }

    #[test]
    fn test_focus_state_styles() {
        let doc = Document::parse(MARKUP);
        let button = doc.root().query(".btn").unwrap();
        let inspector = StyleInspector::default();
        let rest = inspector.computed_in(&button, None);
        assert!(!rest.outline_declared());
        let focused = inspector.computed_in(&button, Some(PseudoState::Focus));
        assert!(focused.outline_suppressed());
        assert!(focused.box_shadow().is_some());
    }

    #[test]
    fn test_focus_indicator_rules() {
        let doc = Document::parse(
            r#"<style>
            .bare:focus { outline: none; }
            .ring:focus { outline: none; box-shadow: 0 0 0 2px #000; }
            .edge { border: 1px solid #cccccc; } .edge:focus { outline: 0; border-color: #1E40AF; }
            </style>
            <button class="ua">A</button><button class="bare">B</button>
            <button class="ring">C</button><button class="edge">D</button>"#,
        );
        let inspector = StyleInspector::default();
        let visible = |selector: &str| {
            let el = doc.root().query(selector).unwrap();
            let rest = inspector.computed_in(&el, None);
            let focused = inspector.computed_in(&el, Some(PseudoState::Focus));
            has_visible_focus_indicator(&rest, &focused)
        };
        assert!(visible(".ua"));
        assert!(!visible(".bare"));
        assert!(visible(".ring"));
        assert!(visible(".edge"));
    }

    #[test]
    fn test_effective_background_walks_up() {
        let doc = Document::parse(MARKUP);
        let para = doc.root().query("p").unwrap();
        assert_eq!(StyleInspector::default().effective_background(&para), Some(Rgb::WHITE));
    }

    #[test]
    fn test_descendants_filter() {
        let doc = Document::parse(MARKUP);
        let theme = doc.root().query(".theme").unwrap();
        let styled = StyleInspector::default().descendants(&theme, "a, button");
        assert_eq!(styled.len(), 2);
    }

    #[test]
    fn test_outline_shorthand_expansion() {
        assert_eq!(
            expand("outline", "2px solid #fff"),
            vec![
                ("outline-width".to_string(), "2px".to_string()),
                ("outline-style".to_string(), "solid".to_string()),
                ("outline-color".to_string(), "#fff".to_string()),
            ]
        );
        assert_eq!(expand("outline", "0")[0].1, "none");
        assert_eq!(split_tokens("1px solid rgb(0, 0, 0)"), vec!["1px", "solid", "rgb(0, 0, 0)"]);
    }
}
