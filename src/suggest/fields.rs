//! Independent suggestion sessions for many editable fields on one screen.

use super::SuggestionSession;
use std::collections::HashMap;
use std::fmt;

/// Stable identity of an editable field: table row plus field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub row: usize,
    pub field: String,
}

impl FieldId {
    pub fn new(row: usize, field: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.field)
    }
}

/// One [`SuggestionSession`] per field, created on first use.
#[derive(Debug, Clone, Default)]
pub struct FieldSessions {
    sessions: HashMap<FieldId, SuggestionSession>,
    focused: Option<FieldId>,
}

impl FieldSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `id`, creating an idle one if needed.
    pub fn session_mut(&mut self, id: &FieldId) -> &mut SuggestionSession {
        self.sessions.entry(id.clone()).or_default()
    }

    pub fn session(&self, id: &FieldId) -> Option<&SuggestionSession> {
        self.sessions.get(id)
    }

    pub fn focused(&self) -> Option<&FieldId> {
        self.focused.as_ref()
    }

    /// Move focus to `id`; every other field loses its suggestions.
    pub fn focus(&mut self, id: FieldId) {
        for (other, session) in self.sessions.iter_mut() {
            if *other != id {
                session.blur();
            }
        }
        self.focused = Some(id);
    }

    /// Focus left the whole group of fields.
    pub fn blur_all(&mut self) {
        for session in self.sessions.values_mut() {
            session.blur();
        }
        self.focused = None;
    }

    /// Forget every session keyed on `row` and shift later rows up by one,
    /// so identities stay aligned with the table after a removal.
    pub fn remove_row(&mut self, row: usize) {
        let sessions = std::mem::take(&mut self.sessions);
        self.sessions = sessions
            .into_iter()
            .filter(|(id, _)| id.row != row)
            .map(|(mut id, s)| {
                if id.row > row {
                    id.row -= 1;
                }
                (id, s)
            })
            .collect();
        self.focused = match self.focused.take() {
            Some(id) if id.row == row => None,
            Some(mut id) => {
                if id.row > row {
                    id.row -= 1;
                }
                Some(id)
            }
            None => None,
        };
    }

    /// The field currently showing suggestions, if any.
    pub fn active(&self) -> Option<(&FieldId, &SuggestionSession)> {
        self.sessions.iter().find(|(_, s)| s.is_active())
    }
}
