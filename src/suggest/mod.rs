//! Suggestion controller: finds the word under the caret, asks the catalog
//! index for completions, and splices a chosen completion back into the
//! buffer.

pub mod boundary;
pub mod fields;
pub mod nav;

use crate::catalog::{CatalogEntry, CatalogIndex};
use std::sync::Arc;

pub use boundary::{Boundaries, Region, Subscription};
pub use fields::{FieldId, FieldSessions};
pub use nav::{KeyOutcome, NavKey, NavPhase, SuggestionSession};

/// Token length below which no lookup happens.
pub const MIN_TOKEN_CHARS: usize = 3;
/// Default cap on suggestions per lookup.
pub const MAX_RESULTS: usize = 10;

/// Text under edit plus the caret, as a character offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    pub text: String,
    pub caret: usize,
}

impl EditBuffer {
    pub fn new(text: impl Into<String>, caret: usize) -> Self {
        Self {
            text: text.into(),
            caret,
        }
    }

    /// Buffer with the caret at the end of the text.
    pub fn at_end(text: impl Into<String>) -> Self {
        let text = text.into();
        let caret = text.chars().count();
        Self { text, caret }
    }
}

/// The word run ending at the caret. Offsets are in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Token {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Characters that make up a token: letters, digits, `_` and `-`.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Find the token immediately before `caret`. The caret is clamped to the
/// buffer length.
pub fn active_token(text: &str, caret: usize) -> Option<Token> {
    let chars: Vec<char> = text.chars().collect();
    let end = caret.min(chars.len());
    let mut start = end;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    if start == end {
        return None;
    }
    Some(Token {
        start,
        end,
        text: chars[start..end].iter().collect(),
    })
}

/// Candidate completions for the current buffer plus highlight state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionState {
    pub items: Vec<Arc<CatalogEntry>>,
    /// Highlighted item; `None` when nothing is highlighted.
    pub highlighted: Option<usize>,
    /// Set once the user has moved the highlight with arrow keys.
    pub navigated: bool,
}

impl SuggestionState {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn highlighted_entry(&self) -> Option<&Arc<CatalogEntry>> {
        self.highlighted.and_then(|i| self.items.get(i))
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.highlighted = None;
        self.navigated = false;
    }
}

/// A splice to perform on the buffer: replace chars `start..end` with
/// `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub insert: String,
}

impl Replacement {
    /// Caret position after the splice.
    pub fn caret_after(&self) -> usize {
        self.start + self.insert.chars().count()
    }

    /// Apply the splice to `text`.
    pub fn apply_to(&self, text: &str) -> EditBuffer {
        let mut out: String = text.chars().take(self.start).collect();
        out.push_str(&self.insert);
        out.extend(text.chars().skip(self.end));
        EditBuffer {
            text: out,
            caret: self.caret_after(),
        }
    }
}

/// Tuning knobs for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestConfig {
    pub min_token_chars: usize,
    pub max_results: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            min_token_chars: MIN_TOKEN_CHARS,
            max_results: MAX_RESULTS,
        }
    }
}

/// Turns buffer snapshots into suggestion lists and completions into edits.
///
/// The controller never owns the buffer. Until an index is attached it
/// behaves exactly like one that matches nothing.
#[derive(Debug, Clone, Default)]
pub struct SuggestionController {
    index: Option<Arc<CatalogIndex>>,
    config: SuggestConfig,
}

impl SuggestionController {
    pub fn new(index: Arc<CatalogIndex>, config: SuggestConfig) -> Self {
        Self {
            index: Some(index),
            config,
        }
    }

    /// A controller still waiting for its catalog.
    pub fn pending(config: SuggestConfig) -> Self {
        Self {
            index: None,
            config,
        }
    }

    pub fn set_index(&mut self, index: Arc<CatalogIndex>) {
        self.index = Some(index);
    }

    pub fn index(&self) -> Option<&Arc<CatalogIndex>> {
        self.index.as_ref()
    }

    pub fn config(&self) -> SuggestConfig {
        self.config
    }

    /// Compute suggestions for the token ending at `caret`.
    pub fn on_text_changed(&self, text: &str, caret: usize) -> SuggestionState {
        let Some(token) = active_token(text, caret) else {
            return SuggestionState::default();
        };
        if token.char_len() < self.config.min_token_chars {
            return SuggestionState::default();
        }
        let Some(index) = &self.index else {
            return SuggestionState::default();
        };
        let items = index.search(&token.text, self.config.max_results);
        tracing::trace!(token = %token.text, hits = items.len(), "suggestion lookup");
        SuggestionState {
            items,
            highlighted: None,
            navigated: false,
        }
    }

    /// The splice that replaces the token at `caret` with `label` and a
    /// trailing space. With no token, the label is inserted at the caret.
    pub fn replacement(&self, text: &str, caret: usize, label: &str) -> Replacement {
        let caret = caret.min(text.chars().count());
        let start = active_token(text, caret).map_or(caret, |t| t.start);
        Replacement {
            start,
            end: caret,
            insert: format!("{label} "),
        }
    }

    /// Replace the active token with `label`, returning the new buffer.
    pub fn apply(&self, text: &str, caret: usize, label: &str) -> EditBuffer {
        self.replacement(text, caret, label).apply_to(text)
    }
}
