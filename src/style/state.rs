// SPDX-License-Identifier: PMPL-1.0-or-later
//! Interactive state synthesis (hover / focus / active).
//!
//! Checks that need an element in a pseudo-state go through a
//! [`StateSimulator`]. The simulated state is scoped by a [`StateGuard`],
//! which resets the simulator when dropped so no state survives into the
//! next check, including on early return.

use crate::dom::{Element, ElementKey};
use crate::style::sheet::PseudoState;
use tracing::debug;

/// Drives an element into a pseudo-state and back
pub trait StateSimulator {
    fn hover(&mut self, element: &Element<'_>);

    fn focus(&mut self, element: &Element<'_>);

    fn activate(&mut self, element: &Element<'_>);

    /// Return every element to rest (blur, pointer leave, restore overlays)
    fn reset(&mut self);

    /// State currently applied to `element`, if any
    fn state_of(&self, element: &Element<'_>) -> Option<PseudoState>;

    fn apply(&mut self, element: &Element<'_>, state: PseudoState) {
        match state {
            PseudoState::Hover => self.hover(element),
            PseudoState::Focus => self.focus(element),
            PseudoState::Active => self.activate(element),
        }
    }
}

/// Simulator backed by the stylesheet's pseudo-state rules. One element
/// holds one state at a time, as with a single pointer and keyboard focus.
#[derive(Debug, Default)]
pub struct StylesheetSimulator {
    current: Option<(ElementKey, PseudoState)>,
    transitions: usize,
}

impl StylesheetSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of state changes dispatched so far
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    fn set(&mut self, element: &Element<'_>, state: PseudoState) {
        debug!("Simulating :{} on {:?}", state, element);
        self.current = Some((element.key(), state));
        self.transitions += 1;
    }
}

impl StateSimulator for StylesheetSimulator {
    fn hover(&mut self, element: &Element<'_>) {
        self.set(element, PseudoState::Hover);
    }

    fn focus(&mut self, element: &Element<'_>) {
        self.set(element, PseudoState::Focus);
    }

    fn activate(&mut self, element: &Element<'_>) {
        self.set(element, PseudoState::Active);
    }

    fn reset(&mut self) {
        self.current = None;
    }

    fn state_of(&self, element: &Element<'_>) -> Option<PseudoState> {
        self.current
            .filter(|(key, _)| *key == element.key())
            .map(|(_, state)| state)
    }
}

/// Holds an element in a simulated state until dropped
pub struct StateGuard<'s> {
    simulator: &'s mut dyn StateSimulator,
}

impl<'s> StateGuard<'s> {
    pub fn enter(simulator: &'s mut dyn StateSimulator, element: &Element<'_>, state: PseudoState) -> Self {
        simulator.apply(element, state);
        Self { simulator }
    }

    pub fn state_of(&self, element: &Element<'_>) -> Option<PseudoState> {
        self.simulator.state_of(element)
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.simulator.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_guard_resets_on_drop() {
        let doc = Document::parse(r#"<button id="a">A</button><a id="b" href="/">B</a>"#);
        let a = doc.get_element_by_id("a").unwrap();
        let b = doc.get_element_by_id("b").unwrap();
        let mut sim = StylesheetSimulator::new();

        {
            let guard = StateGuard::enter(&mut sim, &a, PseudoState::Focus);
            assert_eq!(guard.state_of(&a), Some(PseudoState::Focus));
            assert_eq!(guard.state_of(&b), None);
        }
        assert_eq!(sim.state_of(&a), None);
        assert_eq!(sim.transitions(), 1);
    }

    #[test]
    fn test_guard_resets_on_early_return() {
        fn probe(sim: &mut dyn StateSimulator, el: &Element<'_>) -> Option<()> {
            let _guard = StateGuard::enter(sim, el, PseudoState::Hover);
            let missing: Option<()> = None;
            missing?;
            Some(())
        }

        let doc = Document::parse(r#"<button id="a">A</button>"#);
        let a = doc.get_element_by_id("a").unwrap();
        let mut sim = StylesheetSimulator::new();
        assert!(probe(&mut sim, &a).is_none());
        assert_eq!(sim.state_of(&a), None);
    }

    #[test]
    fn test_single_state_at_a_time() {
        let doc = Document::parse(r#"<button id="a">A</button>"#);
        let a = doc.get_element_by_id("a").unwrap();
        let mut sim = StylesheetSimulator::new();
        sim.hover(&a);
        sim.activate(&a);
        assert_eq!(sim.state_of(&a), Some(PseudoState::Active));
    }
}
