//! Prescription text pane.

use crate::app::{App, FocusPane};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders};
use unicode_width::UnicodeWidthStr;

/// Draw the prescription editor. Returns the caret's screen position when the
/// editor has focus, for anchoring the suggestion popup.
pub fn draw(frame: &mut Frame, app: &App, area: Rect) -> Option<Position> {
    let focused = app.focus == FocusPane::Editor;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Prescription Text ")
        .border_style(border_style);

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(&app.editor, inner);

    focused.then(|| caret_position(app, inner))
}

/// Approximate on-screen caret. The text area scrolls to keep the caret
/// visible, so positions past the viewport clamp to its last row or column.
fn caret_position(app: &App, inner: Rect) -> Position {
    let (row, col) = app.editor.cursor();
    let line = app.editor.lines().get(row).map(String::as_str).unwrap_or("");
    let prefix: String = line.chars().take(col).collect();

    let max_x = inner.width.saturating_sub(1);
    let max_y = inner.height.saturating_sub(1);
    let x = u16::try_from(prefix.width()).unwrap_or(u16::MAX).min(max_x);
    let y = u16::try_from(row).unwrap_or(u16::MAX).min(max_y);
    Position::new(inner.x + x, inner.y + y)
}
