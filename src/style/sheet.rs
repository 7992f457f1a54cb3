// SPDX-License-Identifier: PMPL-1.0-or-later
//! Minimal stylesheet model.
//!
//! Understands flat rule sets, `@media` blocks with `min-width`/`max-width`
//! conditions, and selectors carrying one interactive pseudo-state. Other
//! at-rules (`@font-face`, `@keyframes`, `@supports`, ...) are skipped.

use crate::catalog::Viewport;
use crate::dom::Element;
use regex::Regex;
use scraper::Selector;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

/// Interactive pseudo-state a rule is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PseudoState {
    Hover,
    /// `:focus` and `:focus-visible`
    Focus,
    Active,
}

impl PseudoState {
    pub const ALL: [PseudoState; 3] = [PseudoState::Hover, PseudoState::Focus, PseudoState::Active];
}

impl std::fmt::Display for PseudoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PseudoState::Hover => write!(f, "hover"),
            PseudoState::Focus => write!(f, "focus"),
            PseudoState::Active => write!(f, "active"),
        }
    }
}

/// Width range a rule is restricted to; both bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaQuery {
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
}

impl MediaQuery {
    pub fn matches(&self, viewport: Viewport) -> bool {
        self.min_width.map_or(true, |min| viewport.width >= min)
            && self.max_width.map_or(true, |max| viewport.width <= max)
    }

    fn narrow(self, inner: MediaQuery) -> MediaQuery {
        MediaQuery {
            min_width: match (self.min_width, inner.min_width) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            },
            max_width: match (self.max_width, inner.max_width) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            },
        }
    }

    /// Parse an `@media` prelude. `None` means the block never applies
    /// to a screen (print-only or an unsupported feature).
    fn parse(prelude: &str) -> Option<MediaQuery> {
        static WIDTH_RE: OnceLock<Regex> = OnceLock::new();
        let re = WIDTH_RE.get_or_init(|| {
            Regex::new(r"\(\s*(min|max)-width\s*:\s*(\d+)(?:\.\d+)?px\s*\)").expect("valid regex")
        });

        let condition = prelude.trim_start_matches("@media").trim().to_lowercase();
        if condition.contains("print") && !condition.contains("screen") {
            return None;
        }

        let mut query = MediaQuery::default();
        for caps in re.captures_iter(&condition) {
            let px: u32 = caps[2].parse().ok()?;
            match &caps[1] {
                "min" => query.min_width = Some(px),
                _ => query.max_width = Some(px),
            }
        }

        let residue = re.replace_all(&condition, "");
        if residue.contains('(') {
            debug!("Skipping @media block with unsupported feature: {}", condition);
            return None;
        }
        Some(query)
    }
}

/// `property: value [!important]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Parse the body of a rule or an inline `style` attribute
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    block
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim();
            if property.is_empty() {
                return None;
            }
            let property = if property.starts_with("--") {
                property.to_string()
            } else {
                property.to_lowercase()
            };
            let value = value.trim();
            let (value, important) = match value.strip_suffix("!important") {
                Some(v) => (v.trim_end(), true),
                None => (value, false),
            };
            if value.is_empty() {
                return None;
            }
            Some(Declaration {
                property,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

/// Specificity as (ids, classes/attributes/pseudo-classes, types)
pub type Specificity = (u32, u32, u32);

/// One selector of a rule set with its declarations
#[derive(Debug)]
pub struct Rule {
    pub selector_text: String,
    selector: Selector,
    pub state: Option<PseudoState>,
    pub media: Option<MediaQuery>,
    pub specificity: Specificity,
    pub order: usize,
    pub declarations: Vec<Declaration>,
}

impl Rule {
    /// Whether the rule applies to `element` at `viewport` with the element in `state`
    pub fn applies(&self, element: &Element<'_>, viewport: Viewport, state: Option<PseudoState>) -> bool {
        if let Some(required) = self.state {
            if state != Some(required) {
                return false;
            }
        }
        if let Some(media) = self.media {
            if !media.matches(viewport) {
                return false;
            }
        }
        element.matches_compiled(&self.selector)
    }
}

#[derive(Debug, Default)]
pub struct StyleSheet {
    rules: Vec<Rule>,
}

impl StyleSheet {
    pub fn parse(source: &str) -> Self {
        static COMMENT_RE: OnceLock<Regex> = OnceLock::new();
        let comments = COMMENT_RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));
        let cleaned = comments.replace_all(source, "");

        let mut sheet = StyleSheet::default();
        sheet.parse_block(&cleaned, None);
        debug!("Parsed {} style rules", sheet.rules.len());
        sheet
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules that declare something for one of the given pseudo-states
    pub fn has_state_rules(&self, state: PseudoState) -> bool {
        self.rules.iter().any(|r| r.state == Some(state))
    }

    fn parse_block(&mut self, text: &str, media: Option<MediaQuery>) {
        let mut rest = text;
        loop {
            rest = rest.trim_start();
            let Some(open) = rest.find('{') else { break };
            let close = matching_brace(rest, open).unwrap_or(rest.len());
            let body = &rest[open + 1..close];

            // Statement at-rules (`@import ...;`) end up in front of the prelude
            let prelude = rest[..open].rsplit(';').next().unwrap_or("").trim();

            if let Some(at_rule) = prelude.strip_prefix('@') {
                if at_rule.starts_with("media") {
                    if let Some(inner) = MediaQuery::parse(prelude) {
                        let combined = match media {
                            Some(outer) => outer.narrow(inner),
                            None => inner,
                        };
                        self.parse_block(body, Some(combined));
                    }
                } else {
                    debug!("Skipping at-rule: @{}", at_rule);
                }
            } else {
                let declarations = parse_declarations(body);
                for selector_text in prelude.split(',') {
                    self.push_rule(selector_text.trim(), media, &declarations);
                }
            }

            rest = rest.get(close + 1..).unwrap_or("");
        }
    }

    fn push_rule(&mut self, selector_text: &str, media: Option<MediaQuery>, declarations: &[Declaration]) {
        if selector_text.is_empty() || declarations.is_empty() || selector_text.contains("::") {
            return;
        }
        let (base, state) = strip_state(selector_text);
        let Ok(selector) = Selector::parse(&base) else {
            debug!("Skipping unsupported selector: {}", selector_text);
            return;
        };
        let mut specificity = specificity_of(&base);
        if state.is_some() {
            specificity.1 += 1;
        }
        self.rules.push(Rule {
            selector_text: selector_text.to_string(),
            selector,
            state,
            media,
            specificity,
            order: self.rules.len(),
            declarations: declarations.to_vec(),
        });
    }
}

/// Index of the `}` closing the `{` at `open`
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove interactive pseudo-classes, returning the base selector and the state
fn strip_state(selector: &str) -> (String, Option<PseudoState>) {
    static STATE_RE: OnceLock<Regex> = OnceLock::new();
    let re = STATE_RE.get_or_init(|| {
        Regex::new(r":(hover|focus-visible|focus|active)\b").expect("valid regex")
    });

    let state = re.captures(selector).map(|caps| match &caps[1] {
        "hover" => PseudoState::Hover,
        "active" => PseudoState::Active,
        _ => PseudoState::Focus,
    });
    let mut base = re.replace_all(selector, "").trim().to_string();
    if base.is_empty() {
        base.push('*');
    } else if base.ends_with(['>', '+', '~']) {
        base.push_str(" *");
    }
    (base, state)
}

fn specificity_of(selector: &str) -> Specificity {
    static ID_RE: OnceLock<Regex> = OnceLock::new();
    static CLASS_RE: OnceLock<Regex> = OnceLock::new();
    static TYPE_RE: OnceLock<Regex> = OnceLock::new();
    let ids = ID_RE.get_or_init(|| Regex::new(r"#[\w-]+").expect("valid regex"));
    let classes = CLASS_RE.get_or_init(|| Regex::new(r"\.[\w-]+|\[[^\]]*\]|:[\w-]+").expect("valid regex"));
    let types = TYPE_RE.get_or_init(|| Regex::new(r"(?:^|[\s>+~])([a-zA-Z][\w-]*)").expect("valid regex"));

    (
        ids.find_iter(selector).count() as u32,
        classes.find_iter(selector).count() as u32,
        types.find_iter(selector).count() as u32,
    )
}
