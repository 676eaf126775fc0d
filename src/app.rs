//! Application state for the TUI.

use crate::table::{InvestigationRow, MedicineRow, TableState};
use ratatui::layout::Rect;
use rxsage::advice::{self, Block};
use rxsage::catalog::{CatalogIndex, IndexOptions, MEDICINE, PROCEDURE};
use rxsage::suggest::{
    Boundaries, EditBuffer, KeyOutcome, NavKey, Region, Subscription, SuggestConfig,
    SuggestionController, SuggestionSession, SuggestionState,
};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use tui_textarea::{CursorMove, TextArea};

/// Which pane currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    /// The free-text prescription editor.
    Editor,
    /// The medicines table.
    Medicines,
    /// The investigations table.
    Investigations,
}

/// What gets opened and saved: the raw text plus both tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub medicines: Vec<MedicineRow>,
    #[serde(default, alias = "rows")]
    pub investigations: Vec<InvestigationRow>,
}

/// Catalog availability, for the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStatus {
    /// Load in flight.
    Loading,
    /// Index ready with this many entries.
    Ready(usize),
    /// No catalog configured.
    Unavailable,
}

/// The main application state.
pub struct App {
    /// Which pane has focus.
    pub focus: FocusPane,
    /// The prescription text area.
    pub editor: TextArea<'static>,
    /// Suggestions for the text area.
    pub editor_session: SuggestionSession,
    editor_controller: SuggestionController,
    pub medicines: TableState<MedicineRow>,
    pub investigations: TableState<InvestigationRow>,
    /// Options of the per-table catalog subsets.
    cell_options: IndexOptions,
    /// Catalog load state.
    pub catalog: CatalogStatus,
    boundaries: Boundaries,
    /// Click-outside boundary of the editor and its popup.
    pub editor_boundary: Subscription,
    editor_dismissed: Rc<Cell<bool>>,
    /// Where the suggestion popup was last drawn (border included).
    pub popup_area: Cell<Option<Rect>>,
    /// Parsed advice text.
    pub advice: Vec<Block>,
    /// Show help overlay.
    pub show_help: bool,
    /// Show advice overlay.
    pub show_advice: bool,
    /// One-line message for the status bar.
    pub message: Option<String>,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Create a new App around an opened prescription.
    pub fn new(
        prescription: Prescription,
        advice_text: Option<&str>,
        editor_config: SuggestConfig,
        cell_config: SuggestConfig,
        cell_options: IndexOptions,
    ) -> Self {
        let boundaries = Boundaries::new();
        let editor_dismissed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&editor_dismissed);
        let editor_boundary = boundaries.subscribe(Region::default(), move || flag.set(true));
        let medicines = TableState::new(prescription.medicines, cell_config, &boundaries);
        let investigations = TableState::new(prescription.investigations, cell_config, &boundaries);

        let mut app = Self {
            focus: FocusPane::Editor,
            editor: TextArea::default(),
            editor_session: SuggestionSession::new(),
            editor_controller: SuggestionController::pending(editor_config),
            medicines,
            investigations,
            cell_options,
            catalog: CatalogStatus::Unavailable,
            boundaries,
            editor_boundary,
            editor_dismissed,
            popup_area: Cell::new(None),
            advice: advice_text.map(advice::parse).unwrap_or_default(),
            show_help: false,
            show_advice: false,
            message: None,
            should_quit: false,
        };
        app.set_editor_buffer(&EditBuffer::new(prescription.raw_text, 0));
        app
    }

    /// Attach a freshly built catalog. The editor searches all of it; each
    /// table only its own category, under the cell options.
    pub fn set_catalog(&mut self, index: Arc<CatalogIndex>) {
        self.catalog = CatalogStatus::Ready(index.len());
        self.medicines
            .set_index(Arc::new(index.subset(MEDICINE, self.cell_options)));
        self.investigations
            .set_index(Arc::new(index.subset(PROCEDURE, self.cell_options)));
        self.editor_controller.set_index(index);
    }

    /// Cycle focus to the next pane. The pane left behind loses its popup.
    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Editor => {
                self.editor_session.blur();
                self.medicines.focus();
                FocusPane::Medicines
            }
            FocusPane::Medicines => {
                self.medicines.blur();
                self.investigations.focus();
                FocusPane::Investigations
            }
            FocusPane::Investigations => {
                self.investigations.blur();
                FocusPane::Editor
            }
        };
    }

    // ─── Editor ──────────────────────────────────────────────────────────

    /// Get the current editor content as a string.
    pub fn get_editor_text(&self) -> String {
        self.editor.lines().join("\n")
    }

    /// Editor content with the caret as a character offset.
    pub fn editor_buffer(&self) -> EditBuffer {
        let (row, col) = self.editor.cursor();
        EditBuffer {
            text: self.get_editor_text(),
            caret: cursor_to_offset(self.editor.lines(), row, col),
        }
    }

    /// Replace the editor content and place the caret.
    pub fn set_editor_buffer(&mut self, buffer: &EditBuffer) {
        let lines: Vec<String> = buffer.text.split('\n').map(str::to_string).collect();
        self.editor = TextArea::new(lines);
        self.editor
            .set_cursor_line_style(ratatui::style::Style::default());
        self.editor
            .set_placeholder_text("Type or paste prescription here...");
        let (row, col) = offset_to_cursor(&buffer.text, buffer.caret);
        self.editor.move_cursor(CursorMove::Jump(
            u16::try_from(row).unwrap_or(u16::MAX),
            u16::try_from(col).unwrap_or(u16::MAX),
        ));
    }

    /// Recompute editor suggestions after an edit.
    pub fn refresh_editor_suggestions(&mut self) {
        let buffer = self.editor_buffer();
        self.editor_session
            .text_changed(&self.editor_controller, &buffer);
    }

    /// Offer a navigation key to the editor popup. Returns true when the key
    /// was used and must not reach the text area.
    pub fn editor_nav(&mut self, key: NavKey) -> bool {
        let buffer = self.editor_buffer();
        let outcome = self
            .editor_session
            .handle_key(key, &self.editor_controller, &buffer);
        self.finish_editor(outcome)
    }

    /// Pointer selection in the editor popup.
    pub fn editor_click(&mut self, index: usize) {
        let buffer = self.editor_buffer();
        let outcome = self
            .editor_session
            .click(index, &self.editor_controller, &buffer);
        self.finish_editor(outcome);
    }

    fn finish_editor(&mut self, outcome: KeyOutcome) -> bool {
        match outcome {
            KeyOutcome::Ignored => false,
            KeyOutcome::Consumed => true,
            KeyOutcome::Committed { edit, .. } => {
                self.set_editor_buffer(&edit);
                true
            }
        }
    }

    // ─── Shared ──────────────────────────────────────────────────────────

    /// Suggestions of the focused pane, for the popup.
    pub fn visible_suggestions(&self) -> Option<&SuggestionState> {
        match self.focus {
            FocusPane::Editor => {
                let session = &self.editor_session;
                session.is_active().then(|| session.state())
            }
            FocusPane::Medicines => self.medicines.visible_suggestions(),
            FocusPane::Investigations => self.investigations.visible_suggestions(),
        }
    }

    /// Dispatch a pointer press: popup hits commit, presses outside a pane's
    /// boundary dismiss that pane's suggestions.
    pub fn pointer_down(&mut self, x: u16, y: u16) {
        if let Some(index) = self.popup_item_at(x, y) {
            match self.focus {
                FocusPane::Editor => self.editor_click(index),
                FocusPane::Medicines => self.medicines.click(index),
                FocusPane::Investigations => self.investigations.click(index),
            }
            return;
        }
        self.boundaries.pointer_down(x, y);
        if self.editor_dismissed.replace(false) {
            self.editor_session.dismiss();
        }
        self.medicines.take_dismissed();
        self.investigations.take_dismissed();
    }

    /// Index of the popup item under the pointer.
    fn popup_item_at(&self, x: u16, y: u16) -> Option<usize> {
        let area = self.popup_area.get()?;
        let state = self.visible_suggestions()?;
        let inner = Region::new(
            area.x + 1,
            area.y + 1,
            area.width.saturating_sub(2),
            area.height.saturating_sub(2),
        );
        if !inner.contains(x, y) {
            return None;
        }
        let index = usize::from(y - inner.y);
        (index < state.len()).then_some(index)
    }

    /// Snapshot for saving.
    pub fn prescription(&self) -> Prescription {
        Prescription {
            raw_text: self.get_editor_text(),
            medicines: self.medicines.rows.clone(),
            investigations: self.investigations.rows.clone(),
        }
    }
}

/// Text area (row, col) to a character offset into the joined lines.
pub fn cursor_to_offset(lines: &[String], row: usize, col: usize) -> usize {
    let before: usize = lines.iter().take(row).map(|l| l.chars().count() + 1).sum();
    let col = lines
        .get(row)
        .map_or(0, |l| col.min(l.chars().count()));
    before + col
}

/// Character offset into newline-joined text to a (row, col) cursor.
pub fn offset_to_cursor(text: &str, offset: usize) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for c in text.chars().take(offset) {
        if c == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (row, col)
}
