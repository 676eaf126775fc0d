//! # rxsage
//!
//! Incremental fuzzy completion for clinical free text. A [`CatalogIndex`]
//! is built once from reference catalogs (medicines, lab and radiology
//! procedures); a [`SuggestionController`] turns every edit into a ranked
//! suggestion list and splices the chosen label back at the caret.
//!
//! - [`catalog`]: entries, field mapping, fuzzy index, background loading
//! - [`suggest`]: token detection, replacement, keyboard/pointer navigation,
//!   per-field sessions and click-outside boundaries
//! - [`advice`]: structured model for formatted advice text

pub mod advice;
pub mod catalog;
pub mod suggest;

pub use catalog::{CatalogEntry, CatalogIndex, CatalogSchema, IndexOptions};
pub use suggest::{
    EditBuffer, FieldId, FieldSessions, KeyOutcome, NavKey, NavPhase, SuggestConfig,
    SuggestionController, SuggestionSession, SuggestionState,
};
