//! Main UI layout and rendering.

use crate::app::{App, FocusPane};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use rxsage::advice;

use super::{editor, popup, statusbar, table};

/// Draw the entire TUI.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    // Main layout: title bar, content, status bar, keybindings
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title bar
            Constraint::Min(5),    // content
            Constraint::Length(1), // status bar
            Constraint::Length(1), // key bindings
        ])
        .split(size);

    // Title bar
    let title = Paragraph::new(" rxsage — prescription editor")
        .style(Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 46)));
    frame.render_widget(title, chunks[0]);

    // Content area: editor / medicines / investigations
    let content = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40), // editor
            Constraint::Percentage(30), // medicines
            Constraint::Percentage(30), // investigations
        ])
        .split(chunks[1]);

    let caret = editor::draw(frame, app, content[0]);
    let medicine_cell = table::draw(
        frame,
        &app.medicines,
        "Medicines",
        app.focus == FocusPane::Medicines,
        content[1],
    );
    let investigation_cell = table::draw(
        frame,
        &app.investigations,
        "Investigations",
        app.focus == FocusPane::Investigations,
        content[2],
    );

    // Status bar
    statusbar::draw(frame, app, chunks[2]);

    // Key bindings bar
    let keys_text = match app.focus {
        FocusPane::Editor => {
            " ↑/↓: Suggestions │ Enter/Tab: Accept │ Tab: Switch Pane │ Ctrl+S: Save │ Ctrl+Q: Quit │ F1: Help"
        }
        FocusPane::Medicines | FocusPane::Investigations => {
            " Ctrl+←/→: Column │ Ctrl+N: Add Row │ Ctrl+X: Remove Row │ Ctrl+S: Save │ Ctrl+Q: Quit │ F1: Help"
        }
    };
    let keys = Paragraph::new(keys_text).style(
        Style::default()
            .fg(Color::DarkGray)
            .bg(Color::Rgb(30, 30, 46)),
    );
    frame.render_widget(keys, chunks[3]);

    // Suggestion popup anchored at the active caret
    let anchor = match app.focus {
        FocusPane::Editor => caret,
        FocusPane::Medicines => medicine_cell,
        FocusPane::Investigations => investigation_cell,
    };
    let popup_area = match (app.visible_suggestions(), anchor) {
        (Some(state), Some(anchor)) => Some(popup::draw(frame, state, anchor, size)),
        _ => None,
    };
    app.popup_area.set(popup_area);

    // A press inside a pane or its popup keeps that pane's suggestions
    let popup_region = popup_area.map(popup::region);
    let with_popup = |pane: Rect, focused: bool| {
        let mut regions = vec![popup::region(pane)];
        if focused && let Some(p) = popup_region {
            regions.push(p);
        }
        regions
    };
    app.editor_boundary
        .set_regions(with_popup(content[0], app.focus == FocusPane::Editor));
    app.medicines
        .boundary
        .set_regions(with_popup(content[1], app.focus == FocusPane::Medicines));
    app.investigations
        .boundary
        .set_regions(with_popup(content[2], app.focus == FocusPane::Investigations));

    // Help overlay
    if app.show_help {
        draw_help_overlay(frame, size);
    }

    // Advice overlay
    if app.show_advice {
        draw_advice_overlay(frame, app, size);
    }
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, help_area);

    let help_text = vec![
        "rxsage — Key Bindings",
        "",
        "  Tab                Switch pane (Editor → Medicines → Investigations)",
        "  Ctrl+S             Save to --output",
        "  Ctrl+Q             Quit",
        "  F1                 Toggle this help",
        "  F2                 Toggle advice",
        "",
        "  Suggestions (after 3 letters):",
        "    ↑/↓              Highlight",
        "    Enter / Tab      Accept highlighted",
        "    Click            Accept",
        "    Esc              Dismiss",
        "",
        "  Medicines / Investigations:",
        "    ↑/↓              Select row",
        "    Ctrl+←/→         Previous / next column",
        "    Ctrl+N / Ctrl+X  Add / remove row",
        "",
        "  Press F1 to close",
    ];

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 46)))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, help_area);
}

/// Draw the advice overlay from the parsed block tree.
fn draw_advice_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let advice_area = centered_rect(70, 70, area);
    frame.render_widget(Clear, advice_area);

    let lines: Vec<Line> = if app.advice.is_empty() {
        vec![Line::from("No advice loaded. Start with --advice FILE.").fg(Color::DarkGray)]
    } else {
        advice_lines(&app.advice)
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Advice ")
                .border_style(Style::default().fg(Color::Green)),
        )
        .style(Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 46)))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, advice_area);
}

fn advice_spans(spans: &[advice::Span], base: Style) -> Vec<Span<'static>> {
    spans
        .iter()
        .map(|s| match s {
            advice::Span::Text(t) => Span::styled(t.clone(), base),
            advice::Span::Bold(t) => Span::styled(t.clone(), base.add_modifier(Modifier::BOLD)),
        })
        .collect()
}

/// Numbered items restart after any non-list block.
fn advice_lines(blocks: &[advice::Block]) -> Vec<Line<'static>> {
    let mut number = 0;
    blocks
        .iter()
        .map(|block| match block {
            advice::Block::Heading(spans) => {
                number = 0;
                Line::from(advice_spans(
                    spans,
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ))
            }
            advice::Block::Paragraph(spans) => {
                number = 0;
                Line::from(advice_spans(spans, Style::default()))
            }
            advice::Block::ListItem { ordered, spans } => {
                let bullet = if *ordered {
                    number += 1;
                    format!("  {}. ", number)
                } else {
                    "  • ".to_string()
                };
                let mut out = vec![Span::raw(bullet)];
                out.extend(advice_spans(spans, Style::default()));
                Line::from(out)
            }
            advice::Block::Break => {
                number = 0;
                Line::default()
            }
        })
        .collect()
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
