//! Status bar showing catalog state, messages, and the focused pane.

use crate::app::{App, CatalogStatus, FocusPane};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

/// Draw the status bar.
pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let catalog = match app.catalog {
        CatalogStatus::Loading => "⏳ Loading catalog...".to_string(),
        CatalogStatus::Ready(n) => format!("{} catalog entries", n),
        CatalogStatus::Unavailable => "no catalog".to_string(),
    };
    let left = match &app.message {
        Some(msg) => format!(" {} | {} ", catalog, msg),
        None => format!(" {} ", catalog),
    };
    let right = match app.focus {
        FocusPane::Editor => " Editor ".to_string(),
        FocusPane::Medicines => position(
            "Medicines",
            app.medicines.selected_row,
            app.medicines.rows.len(),
        ),
        FocusPane::Investigations => position(
            "Investigations",
            app.investigations.selected_row,
            app.investigations.rows.len(),
        ),
    };

    // Pad middle
    let total_width = area.width as usize;
    let padding = total_width.saturating_sub(left.width() + right.width());
    let status = format!("{}{}{}", left, " ".repeat(padding), right);

    let paragraph =
        Paragraph::new(status).style(Style::default().fg(Color::White).bg(Color::Rgb(49, 50, 68)));
    frame.render_widget(paragraph, area);
}

fn position(pane: &str, row: usize, rows: usize) -> String {
    format!(" {} {}/{} ", pane, (row + 1).min(rows), rows)
}
