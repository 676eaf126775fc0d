//! Keyboard and pointer navigation over a suggestion list.
//!
//! Enter and Tab only commit after the user has moved the highlight with an
//! arrow key, so ordinary typing is never swallowed. Pointer selection always
//! commits.

use super::{EditBuffer, SuggestionController, SuggestionState};
use crate::catalog::CatalogEntry;
use std::sync::Arc;

/// Where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPhase {
    /// No suggestions shown.
    Idle,
    /// Suggestions shown, none chosen yet.
    Listing,
    /// The user has moved the highlight onto an entry.
    Navigating,
}

/// Keys the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Down,
    Up,
    Enter,
    Tab,
    Escape,
}

/// What the host should do with a key after the session has seen it.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// Not for us; the host handles the key as normal input.
    Ignored,
    /// Handled here; the host must not forward it.
    Consumed,
    /// A suggestion was committed; the host replaces its buffer with `edit`.
    Committed {
        entry: Arc<CatalogEntry>,
        edit: EditBuffer,
    },
}

/// Suggestion state for one editable field.
#[derive(Debug, Clone, Default)]
pub struct SuggestionSession {
    state: SuggestionState,
}

impl SuggestionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    pub fn phase(&self) -> NavPhase {
        if self.state.is_empty() {
            NavPhase::Idle
        } else if self.state.navigated && self.state.highlighted.is_some() {
            NavPhase::Navigating
        } else {
            NavPhase::Listing
        }
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_empty()
    }

    /// Recompute suggestions after an edit. Drops any highlight.
    pub fn text_changed(&mut self, controller: &SuggestionController, buffer: &EditBuffer) {
        self.state = controller.on_text_changed(&buffer.text, buffer.caret);
    }

    /// Move the highlight down, wrapping from last to first.
    pub fn highlight_next(&mut self) {
        let len = self.state.len();
        if len == 0 {
            return;
        }
        self.state.highlighted = Some(match self.state.highlighted {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
        self.state.navigated = true;
    }

    /// Move the highlight up, wrapping from first (or none) to last.
    pub fn highlight_prev(&mut self) {
        let len = self.state.len();
        if len == 0 {
            return;
        }
        self.state.highlighted = Some(match self.state.highlighted {
            Some(i) if i > 0 => i - 1,
            _ => len - 1,
        });
        self.state.navigated = true;
    }

    /// Feed a key. Outside `Listing`/`Navigating` every key is ignored.
    pub fn handle_key(
        &mut self,
        key: NavKey,
        controller: &SuggestionController,
        buffer: &EditBuffer,
    ) -> KeyOutcome {
        if self.phase() == NavPhase::Idle {
            return KeyOutcome::Ignored;
        }
        match key {
            NavKey::Down => {
                self.highlight_next();
                KeyOutcome::Consumed
            }
            NavKey::Up => {
                self.highlight_prev();
                KeyOutcome::Consumed
            }
            NavKey::Enter | NavKey::Tab => {
                if self.phase() != NavPhase::Navigating {
                    return KeyOutcome::Ignored;
                }
                match self.state.highlighted_entry().cloned() {
                    Some(entry) => self.commit(entry, controller, buffer),
                    None => KeyOutcome::Ignored,
                }
            }
            NavKey::Escape => {
                self.dismiss();
                KeyOutcome::Consumed
            }
        }
    }

    /// Pointer selection of item `index`. Commits regardless of whether the
    /// user navigated first.
    pub fn click(
        &mut self,
        index: usize,
        controller: &SuggestionController,
        buffer: &EditBuffer,
    ) -> KeyOutcome {
        match self.state.items.get(index).cloned() {
            Some(entry) => self.commit(entry, controller, buffer),
            None => KeyOutcome::Ignored,
        }
    }

    /// Focus left the field.
    pub fn blur(&mut self) {
        self.dismiss();
    }

    pub fn dismiss(&mut self) {
        self.state.clear();
    }

    fn commit(
        &mut self,
        entry: Arc<CatalogEntry>,
        controller: &SuggestionController,
        buffer: &EditBuffer,
    ) -> KeyOutcome {
        let edit = controller.apply(&buffer.text, buffer.caret, &entry.label);
        tracing::debug!(label = %entry.label, category = %entry.category, "suggestion committed");
        self.dismiss();
        KeyOutcome::Committed { entry, edit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogIndex, IndexOptions};
    use crate::suggest::SuggestConfig;
    use serde_json::Map;

    fn controller() -> SuggestionController {
        let entries = ["Paracetamol 500", "Paracetamol 650", "Paracetamol Syrup"].map(|l| {
            CatalogEntry {
                label: l.to_string(),
                code: None,
                category: "medicine".to_string(),
                attributes: Map::new(),
            }
        });
        let index = CatalogIndex::build(entries, IndexOptions::default());
        SuggestionController::new(Arc::new(index), SuggestConfig::default())
    }

    fn listing() -> (SuggestionController, SuggestionSession, EditBuffer) {
        let c = controller();
        let buffer = EditBuffer::new("Give paracet", 12);
        let mut s = SuggestionSession::new();
        s.text_changed(&c, &buffer);
        assert_eq!(s.state().len(), 3);
        (c, s, buffer)
    }

    #[test]
    fn phases_follow_input() {
        let (c, mut s, buffer) = listing();
        assert_eq!(s.phase(), NavPhase::Listing);
        s.handle_key(NavKey::Down, &c, &buffer);
        assert_eq!(s.phase(), NavPhase::Navigating);
        s.handle_key(NavKey::Escape, &c, &buffer);
        assert_eq!(s.phase(), NavPhase::Idle);
    }

    #[test]
    fn down_wraps_to_first() {
        let (c, mut s, buffer) = listing();
        for _ in 0..3 {
            s.handle_key(NavKey::Down, &c, &buffer);
        }
        assert_eq!(s.state().highlighted, Some(2));
        s.handle_key(NavKey::Down, &c, &buffer);
        assert_eq!(s.state().highlighted, Some(0));
    }

    #[test]
    fn up_from_none_or_first_wraps_to_last() {
        let (c, mut s, buffer) = listing();
        s.handle_key(NavKey::Up, &c, &buffer);
        assert_eq!(s.state().highlighted, Some(2));

        let (c, mut s, buffer) = listing();
        s.handle_key(NavKey::Down, &c, &buffer);
        assert_eq!(s.state().highlighted, Some(0));
        s.handle_key(NavKey::Up, &c, &buffer);
        assert_eq!(s.state().highlighted, Some(2));
    }

    #[test]
    fn enter_without_navigation_is_passed_through() {
        let (c, mut s, buffer) = listing();
        assert_eq!(s.handle_key(NavKey::Enter, &c, &buffer), KeyOutcome::Ignored);
        assert_eq!(s.handle_key(NavKey::Tab, &c, &buffer), KeyOutcome::Ignored);
        assert_eq!(s.phase(), NavPhase::Listing);
    }

    #[test]
    fn enter_after_arrow_commits_highlighted() {
        let (c, mut s, buffer) = listing();
        s.handle_key(NavKey::Down, &c, &buffer);
        let expected = s.state().items[0].clone();
        match s.handle_key(NavKey::Enter, &c, &buffer) {
            KeyOutcome::Committed { entry, edit } => {
                assert_eq!(entry, expected);
                assert_eq!(edit.text, format!("Give {} ", expected.label));
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert_eq!(s.phase(), NavPhase::Idle);
    }

    #[test]
    fn tab_commits_like_enter() {
        let (c, mut s, buffer) = listing();
        s.handle_key(NavKey::Up, &c, &buffer);
        assert!(matches!(
            s.handle_key(NavKey::Tab, &c, &buffer),
            KeyOutcome::Committed { .. }
        ));
    }

    #[test]
    fn click_commits_without_navigation() {
        let (c, mut s, buffer) = listing();
        let label = s.state().items[1].label.clone();
        match s.click(1, &c, &buffer) {
            KeyOutcome::Committed { edit, .. } => {
                assert_eq!(edit.text, format!("Give {label} "));
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert!(!s.is_active());
    }

    #[test]
    fn click_out_of_range_is_ignored() {
        let (c, mut s, buffer) = listing();
        assert_eq!(s.click(7, &c, &buffer), KeyOutcome::Ignored);
        assert!(s.is_active());
    }

    #[test]
    fn idle_session_ignores_keys() {
        let c = controller();
        let buffer = EditBuffer::new("hi", 2);
        let mut s = SuggestionSession::new();
        assert_eq!(s.handle_key(NavKey::Down, &c, &buffer), KeyOutcome::Ignored);
        assert_eq!(s.handle_key(NavKey::Escape, &c, &buffer), KeyOutcome::Ignored);
    }

    #[test]
    fn typing_resets_navigation() {
        let (c, mut s, _) = listing();
        let buffer = EditBuffer::new("Give paraceta", 13);
        s.handle_key(NavKey::Down, &c, &buffer);
        s.text_changed(&c, &buffer);
        assert_eq!(s.phase(), NavPhase::Listing);
        assert_eq!(s.handle_key(NavKey::Enter, &c, &buffer), KeyOutcome::Ignored);
    }

    #[test]
    fn zero_results_go_idle() {
        let (c, mut s, _) = listing();
        s.text_changed(&c, &EditBuffer::new("Give zzzzzzzz", 13));
        assert_eq!(s.phase(), NavPhase::Idle);
    }

    #[test]
    fn blur_clears() {
        let (_, mut s, _) = listing();
        s.blur();
        assert_eq!(s.phase(), NavPhase::Idle);
    }
}
