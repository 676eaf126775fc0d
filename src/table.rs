//! Editable prescription tables: row types and per-table cell editing with
//! catalog suggestions.

use rxsage::catalog::{CatalogEntry, CatalogIndex};
use rxsage::suggest::{
    Boundaries, EditBuffer, FieldId, FieldSessions, KeyOutcome, NavKey, Region, Subscription,
    SuggestConfig, SuggestionController, SuggestionSession, SuggestionState,
};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

/// A row type shown in a [`TableState`].
pub trait TableRow: Clone + Default {
    /// Serialized names of the editable columns, in display order.
    const COLUMNS: &'static [&'static str];
    /// Column headers, same order as `COLUMNS`.
    const HEADERS: &'static [&'static str];
    /// Display widths, same order as `COLUMNS`.
    const WIDTHS: &'static [u16];
    /// The one column whose cells look things up in the catalog.
    const SUGGEST_COLUMN: usize;

    /// Text of column `col`; "" when out of range.
    fn cell(&self, col: usize) -> &str;
    fn cell_mut(&mut self, col: usize) -> Option<&mut String>;
    fn sku_code(&self) -> &str;
    fn match_confidence(&self) -> Option<f64>;
    /// Take over a committed catalog entry.
    fn fill_from(&mut self, entry: &CatalogEntry);
}

/// One medicine line of a prescription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicineRow {
    #[serde(default)]
    pub medicine_name: String,
    #[serde(default)]
    pub medicine_type: String,
    #[serde(default)]
    pub medicine_dosage: String,
    #[serde(default)]
    pub medicine_frequency: String,
    #[serde(default)]
    pub medicine_duration: String,
    #[serde(default)]
    pub medicine_quantity: String,
    #[serde(default)]
    pub dosage_advice: String,
    #[serde(default)]
    pub sku_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_confidence: Option<f64>,
}

/// Columns filled from catalog attributes of the same name when blank:
/// type, dosage and advice.
const MEDICINE_DEFAULTS: [usize; 3] = [1, 2, 6];

impl TableRow for MedicineRow {
    const COLUMNS: &'static [&'static str] = &[
        "medicine_name",
        "medicine_type",
        "medicine_dosage",
        "medicine_frequency",
        "medicine_duration",
        "medicine_quantity",
        "dosage_advice",
    ];
    const HEADERS: &'static [&'static str] =
        &["Medicine", "Type", "Dosage", "Frequency", "Duration", "Qty", "Advice"];
    const WIDTHS: &'static [u16] = &[28, 8, 10, 10, 10, 5, 20];
    const SUGGEST_COLUMN: usize = 0;

    fn cell(&self, col: usize) -> &str {
        match col {
            0 => &self.medicine_name,
            1 => &self.medicine_type,
            2 => &self.medicine_dosage,
            3 => &self.medicine_frequency,
            4 => &self.medicine_duration,
            5 => &self.medicine_quantity,
            6 => &self.dosage_advice,
            _ => "",
        }
    }

    fn cell_mut(&mut self, col: usize) -> Option<&mut String> {
        Some(match col {
            0 => &mut self.medicine_name,
            1 => &mut self.medicine_type,
            2 => &mut self.medicine_dosage,
            3 => &mut self.medicine_frequency,
            4 => &mut self.medicine_duration,
            5 => &mut self.medicine_quantity,
            6 => &mut self.dosage_advice,
            _ => return None,
        })
    }

    fn sku_code(&self) -> &str {
        &self.sku_code
    }

    fn match_confidence(&self) -> Option<f64> {
        self.match_confidence
    }

    /// Name and code always follow the entry; type, dosage and advice are
    /// catalog defaults and never overwrite what was prescribed.
    fn fill_from(&mut self, entry: &CatalogEntry) {
        self.medicine_name = entry.label.clone();
        self.sku_code = entry.code.clone().unwrap_or_default();
        for col in MEDICINE_DEFAULTS {
            let Some(value) = entry.attribute(Self::COLUMNS[col]) else {
                continue;
            };
            if let Some(cell) = self.cell_mut(col)
                && cell.trim().is_empty()
            {
                *cell = value;
            }
        }
    }
}

/// One lab, radiology or procedure line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestigationRow {
    /// Name as written in the prescription.
    #[serde(default, alias = "test_name", alias = "procedure_name")]
    pub name: String,
    /// Catalog label the row is matched to.
    #[serde(default)]
    pub matched: String,
    /// Code of the matched catalog item.
    #[serde(default)]
    pub sku_code: String,
    /// Confidence reported by the extraction backend, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_confidence: Option<f64>,
}

impl TableRow for InvestigationRow {
    const COLUMNS: &'static [&'static str] = &["name", "matched"];
    const HEADERS: &'static [&'static str] = &["Name", "Matched"];
    const WIDTHS: &'static [u16] = &[24, 36];
    const SUGGEST_COLUMN: usize = 1;

    fn cell(&self, col: usize) -> &str {
        match col {
            0 => &self.name,
            1 => &self.matched,
            _ => "",
        }
    }

    fn cell_mut(&mut self, col: usize) -> Option<&mut String> {
        match col {
            0 => Some(&mut self.name),
            1 => Some(&mut self.matched),
            _ => None,
        }
    }

    fn sku_code(&self) -> &str {
        &self.sku_code
    }

    fn match_confidence(&self) -> Option<f64> {
        self.match_confidence
    }

    fn fill_from(&mut self, entry: &CatalogEntry) {
        self.matched = entry.label.clone();
        self.sku_code = entry.code.clone().unwrap_or_default();
    }
}

/// Caret movements inside a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretMove {
    Left,
    Right,
    Home,
    End,
}

/// Rows of one table plus the selected cell and its suggestions.
pub struct TableState<R: TableRow> {
    pub rows: Vec<R>,
    pub selected_row: usize,
    pub selected_col: usize,
    /// Caret inside the selected cell, in characters.
    pub cell_caret: usize,
    /// One suggestion session per cell.
    pub sessions: FieldSessions,
    controller: SuggestionController,
    /// Click-outside boundary of the table and its popup.
    pub boundary: Subscription,
    dismissed: Rc<Cell<bool>>,
}

impl<R: TableRow> TableState<R> {
    pub fn new(rows: Vec<R>, config: SuggestConfig, boundaries: &Boundaries) -> Self {
        let dismissed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dismissed);
        let boundary = boundaries.subscribe(Region::default(), move || flag.set(true));
        let mut table = Self {
            rows,
            selected_row: 0,
            selected_col: R::SUGGEST_COLUMN,
            cell_caret: 0,
            sessions: FieldSessions::new(),
            controller: SuggestionController::pending(config),
            boundary,
            dismissed,
        };
        table.cell_caret = table.current_cell().chars().count();
        table
    }

    pub fn set_index(&mut self, index: Arc<CatalogIndex>) {
        self.controller.set_index(index);
    }

    /// Identity of the selected cell.
    pub fn current_field(&self) -> FieldId {
        FieldId::new(self.selected_row, R::COLUMNS[self.selected_col])
    }

    /// Text of the selected cell, or "" when the table is empty.
    pub fn current_cell(&self) -> &str {
        self.rows
            .get(self.selected_row)
            .map(|r| r.cell(self.selected_col))
            .unwrap_or("")
    }

    fn cell_buffer(&self) -> EditBuffer {
        EditBuffer::new(self.current_cell(), self.cell_caret)
    }

    fn cell_suggests(&self) -> bool {
        self.selected_col == R::SUGGEST_COLUMN && self.selected_row < self.rows.len()
    }

    /// Session of the selected cell, if it has one.
    pub fn current_session(&self) -> Option<&SuggestionSession> {
        self.sessions.session(&self.current_field())
    }

    /// Suggestions to show for the selected cell.
    pub fn visible_suggestions(&self) -> Option<&SuggestionState> {
        let session = self.current_session()?;
        session.is_active().then(|| session.state())
    }

    fn refresh_suggestions(&mut self) {
        if !self.cell_suggests() {
            return;
        }
        let id = self.current_field();
        let buffer = self.cell_buffer();
        self.sessions
            .session_mut(&id)
            .text_changed(&self.controller, &buffer);
    }

    /// Offer a navigation key to the selected cell's popup. Returns true
    /// when the key was used.
    pub fn nav(&mut self, key: NavKey) -> bool {
        if !self.cell_suggests() {
            return false;
        }
        let id = self.current_field();
        let buffer = self.cell_buffer();
        let outcome = self
            .sessions
            .session_mut(&id)
            .handle_key(key, &self.controller, &buffer);
        self.finish(outcome)
    }

    /// Pointer selection in the selected cell's popup.
    pub fn click(&mut self, index: usize) {
        if !self.cell_suggests() {
            return;
        }
        let id = self.current_field();
        let buffer = self.cell_buffer();
        let outcome = self
            .sessions
            .session_mut(&id)
            .click(index, &self.controller, &buffer);
        self.finish(outcome);
    }

    /// The token only picks the query; a committed cell holds the entry
    /// label and nothing else.
    fn finish(&mut self, outcome: KeyOutcome) -> bool {
        match outcome {
            KeyOutcome::Ignored => false,
            KeyOutcome::Consumed => true,
            KeyOutcome::Committed { entry, .. } => {
                if let Some(row) = self.rows.get_mut(self.selected_row) {
                    row.fill_from(&entry);
                    self.cell_caret = row.cell(self.selected_col).chars().count();
                }
                true
            }
        }
    }

    fn edit_cell(&mut self, edit: impl FnOnce(&mut String, usize) -> usize) {
        let col = self.selected_col;
        let caret = self.cell_caret;
        let Some(cell) = self
            .rows
            .get_mut(self.selected_row)
            .and_then(|row| row.cell_mut(col))
        else {
            return;
        };
        self.cell_caret = edit(cell, caret);
        self.refresh_suggestions();
    }

    /// Type a character at the cell caret.
    pub fn insert(&mut self, c: char) {
        self.edit_cell(|text, caret| {
            let at = byte_index(text, caret);
            text.insert(at, c);
            caret + 1
        });
    }

    /// Delete the character before the cell caret.
    pub fn backspace(&mut self) {
        if self.cell_caret == 0 {
            return;
        }
        self.edit_cell(|text, caret| {
            let at = byte_index(text, caret - 1);
            text.remove(at);
            caret - 1
        });
    }

    /// Delete the character after the cell caret.
    pub fn delete(&mut self) {
        if self.cell_caret >= self.current_cell().chars().count() {
            return;
        }
        self.edit_cell(|text, caret| {
            let at = byte_index(text, caret);
            text.remove(at);
            caret
        });
    }

    /// Move the cell caret; moving it closes the cell popup.
    pub fn move_caret(&mut self, to: CaretMove) {
        let len = self.current_cell().chars().count();
        self.cell_caret = match to {
            CaretMove::Left => self.cell_caret.saturating_sub(1),
            CaretMove::Right => (self.cell_caret + 1).min(len),
            CaretMove::Home => 0,
            CaretMove::End => len,
        };
        let id = self.current_field();
        self.sessions.session_mut(&id).dismiss();
    }

    /// Select another cell. Suggestions of the cell left behind are dropped.
    fn select_cell(&mut self, row: usize, col: usize) {
        self.selected_row = row;
        self.selected_col = col;
        self.cell_caret = self.current_cell().chars().count();
        self.sessions.focus(self.current_field());
    }

    /// The table gained focus.
    pub fn focus(&mut self) {
        self.sessions.focus(self.current_field());
    }

    /// The table lost focus.
    pub fn blur(&mut self) {
        self.sessions.blur_all();
    }

    pub fn select_prev_row(&mut self) {
        if self.selected_row > 0 {
            self.select_cell(self.selected_row - 1, self.selected_col);
        }
    }

    pub fn select_next_row(&mut self) {
        if self.selected_row + 1 < self.rows.len() {
            self.select_cell(self.selected_row + 1, self.selected_col);
        }
    }

    pub fn select_next_col(&mut self) {
        self.select_cell(self.selected_row, (self.selected_col + 1) % R::COLUMNS.len());
    }

    pub fn select_prev_col(&mut self) {
        let n = R::COLUMNS.len();
        self.select_cell(self.selected_row, (self.selected_col + n - 1) % n);
    }

    /// Append an empty row and select its first column.
    pub fn add_row(&mut self) {
        self.rows.push(R::default());
        self.select_cell(self.rows.len() - 1, 0);
    }

    /// Remove the selected row.
    pub fn remove_row(&mut self) {
        if self.selected_row >= self.rows.len() {
            return;
        }
        self.rows.remove(self.selected_row);
        self.sessions.remove_row(self.selected_row);
        let row = self.selected_row.min(self.rows.len().saturating_sub(1));
        self.select_cell(row, self.selected_col);
    }

    /// Apply a pending click-outside dismissal.
    pub fn take_dismissed(&mut self) {
        if self.dismissed.replace(false) {
            self.sessions.blur_all();
        }
    }
}

/// Byte index of the `chars`-th character, or the end of the string.
fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxsage::catalog::{IndexOptions, MEDICINE, PROCEDURE};
    use serde_json::{Map, json};

    fn entry(label: &str, code: &str, category: &str, attributes: serde_json::Value) -> CatalogEntry {
        let attributes = match attributes {
            serde_json::Value::Object(map) => map,
            _ => Map::new(),
        };
        CatalogEntry {
            label: label.to_string(),
            code: Some(code.to_string()),
            category: category.to_string(),
            attributes,
        }
    }

    fn procedures() -> Arc<CatalogIndex> {
        let entries = [
            entry("MRI Brain Plain", "P100", PROCEDURE, json!({})),
            entry("MRI Brain Contrast", "P101", PROCEDURE, json!({})),
        ];
        Arc::new(CatalogIndex::build(entries, IndexOptions::default()))
    }

    fn investigations(rows: Vec<InvestigationRow>) -> TableState<InvestigationRow> {
        let mut table = TableState::new(rows, SuggestConfig::default(), &Boundaries::new());
        table.set_index(procedures());
        table
    }

    fn medicines(rows: Vec<MedicineRow>) -> TableState<MedicineRow> {
        let entries = [entry(
            "Azithromycin 500mg",
            "M10",
            MEDICINE,
            json!({
                "medicine_desc": "Azithromycin 500mg",
                "medicine_type": "Tab",
                "medicine_dosage": "500mg",
                "dosage_advice": "After food"
            }),
        )];
        let mut table = TableState::new(rows, SuggestConfig::default(), &Boundaries::new());
        table.set_index(Arc::new(CatalogIndex::build(entries, IndexOptions::default())));
        table
    }

    #[test]
    fn commit_replaces_whole_cell_with_label() {
        let mut table = investigations(vec![InvestigationRow {
            name: "MRI brain".into(),
            ..Default::default()
        }]);
        for c in "mri bra".chars() {
            table.insert(c);
        }
        assert_eq!(table.visible_suggestions().map(|s| s.len()), Some(2));
        table.click(1);
        assert_eq!(table.rows[0].matched, "MRI Brain Contrast");
        assert_eq!(table.rows[0].sku_code, "P101");
        assert_eq!(table.cell_caret, "MRI Brain Contrast".chars().count());
        assert_eq!(table.rows[0].name, "MRI brain");
        assert!(table.visible_suggestions().is_none());
    }

    #[test]
    fn keyboard_commit_also_replaces_whole_cell() {
        let mut table = investigations(vec![InvestigationRow::default()]);
        for c in "x-ray then brain".chars() {
            table.insert(c);
        }
        assert!(!table.nav(NavKey::Enter));
        assert!(table.nav(NavKey::Down));
        assert!(table.nav(NavKey::Enter));
        assert_eq!(table.rows[0].matched, "MRI Brain Plain");
    }

    #[test]
    fn medicine_commit_fills_code_and_catalog_defaults() {
        let mut table = medicines(vec![MedicineRow {
            medicine_dosage: "250mg".into(),
            medicine_frequency: "1-0-1".into(),
            ..Default::default()
        }]);
        assert_eq!(table.selected_col, 0);
        for c in "azithro".chars() {
            table.insert(c);
        }
        table.click(0);
        let row = &table.rows[0];
        assert_eq!(row.medicine_name, "Azithromycin 500mg");
        assert_eq!(row.sku_code, "M10");
        assert_eq!(row.medicine_type, "Tab");
        assert_eq!(row.dosage_advice, "After food");
        // prescribed values win over catalog defaults
        assert_eq!(row.medicine_dosage, "250mg");
        assert_eq!(row.medicine_frequency, "1-0-1");
    }

    #[test]
    fn only_the_suggest_column_suggests() {
        let mut table = medicines(vec![MedicineRow::default()]);
        table.select_next_col();
        assert_eq!(table.selected_col, 1);
        for c in "azithro".chars() {
            table.insert(c);
        }
        assert_eq!(table.rows[0].medicine_type, "azithro");
        assert!(table.visible_suggestions().is_none());
        table.select_prev_col();
        table.select_prev_col();
        assert_eq!(table.selected_col, MedicineRow::COLUMNS.len() - 1);
    }

    #[test]
    fn cells_keep_separate_sessions() {
        let mut table = investigations(vec![InvestigationRow::default(), InvestigationRow::default()]);
        for c in "brain".chars() {
            table.insert(c);
        }
        assert!(table.current_session().unwrap().is_active());
        table.select_next_row();
        assert!(table.visible_suggestions().is_none());
        let first = FieldId::new(0, "matched");
        assert!(!table.sessions.session(&first).unwrap().is_active());
    }

    #[test]
    fn cell_editing_handles_multibyte_text() {
        let mut table = investigations(vec![InvestigationRow {
            matched: "Échographie".into(),
            ..Default::default()
        }]);
        table.move_caret(CaretMove::Home);
        table.move_caret(CaretMove::Right);
        table.backspace();
        assert_eq!(table.rows[0].matched, "chographie");
        table.delete();
        assert_eq!(table.rows[0].matched, "hographie");
    }

    #[test]
    fn remove_row_keeps_selection_in_bounds() {
        let mut table = investigations(vec![InvestigationRow::default(), InvestigationRow::default()]);
        table.select_next_row();
        table.remove_row();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.selected_row, 0);
        table.remove_row();
        assert!(table.rows.is_empty());
        table.insert('x');
        assert!(table.rows.is_empty());
        table.add_row();
        assert_eq!((table.selected_row, table.selected_col), (0, 0));
    }

    #[test]
    fn press_outside_blurs_table() {
        let boundaries = Boundaries::new();
        let mut table: TableState<InvestigationRow> =
            TableState::new(vec![InvestigationRow::default()], SuggestConfig::default(), &boundaries);
        table.set_index(procedures());
        for c in "brain".chars() {
            table.insert(c);
        }
        table.boundary.set_regions([Region::new(0, 10, 80, 10)]);
        boundaries.pointer_down(5, 12);
        table.take_dismissed();
        assert!(table.visible_suggestions().is_some());
        boundaries.pointer_down(5, 2);
        table.take_dismissed();
        assert!(table.visible_suggestions().is_none());
    }

    #[test]
    fn saved_rows_accept_backend_field_names() {
        let rows: Vec<InvestigationRow> = serde_json::from_value(json!([
            {"test_name": "CBC", "matched": "Complete Blood Count", "sku_code": "L1", "match_confidence": 0.92}
        ]))
        .unwrap();
        assert_eq!(rows[0].name, "CBC");
        assert_eq!(rows[0].match_confidence, Some(0.92));

        let meds: Vec<MedicineRow> = serde_json::from_value(json!([
            {"medicine_name": "Dolo 650", "medicine_frequency": "1-1-1"}
        ]))
        .unwrap();
        assert_eq!(meds[0].medicine_name, "Dolo 650");
        assert_eq!(meds[0].sku_code, "");
    }
}
