//! Suggestion popup drawn below the active caret.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use rxsage::suggest::{Region, SuggestionState};
use unicode_width::UnicodeWidthStr;

const MIN_WIDTH: u16 = 20;

/// Draw `state` with its top-left corner just below `anchor`, kept inside
/// `area`. Returns the rectangle used, borders included.
pub fn draw(frame: &mut Frame, state: &SuggestionState, anchor: Position, area: Rect) -> Rect {
    let labels: Vec<String> = state
        .items
        .iter()
        .map(|e| format!("{} ({})", e.label, e.category))
        .collect();

    let text_width = labels.iter().map(|l| l.width()).max().unwrap_or(0);
    let width = u16::try_from(text_width + 2)
        .unwrap_or(u16::MAX)
        .max(MIN_WIDTH)
        .min(area.width);
    let height = u16::try_from(labels.len() + 2)
        .unwrap_or(u16::MAX)
        .min(area.height);

    // Below the caret when it fits, above it otherwise
    let below = anchor.y.saturating_add(1);
    let y = if below.saturating_add(height) <= area.bottom() {
        below
    } else {
        anchor.y.saturating_sub(height).max(area.y)
    };
    let x = anchor.x.min(area.right().saturating_sub(width));
    let popup_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, popup_area);

    let items: Vec<Line> = labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            if state.highlighted == Some(i) {
                Line::from(label).style(Style::default().fg(Color::Black).bg(Color::Cyan))
            } else {
                Line::from(label).style(Style::default().fg(Color::White))
            }
        })
        .collect();

    let popup = Paragraph::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .style(Style::default().bg(Color::Rgb(40, 40, 60))),
    );

    frame.render_widget(popup, popup_area);
    popup_area
}

/// Screen rectangle as a boundary region.
pub fn region(rect: Rect) -> Region {
    Region::new(rect.x, rect.y, rect.width, rect.height)
}
