//! Table panes with per-cell editing.

use crate::table::{TableRow, TableState};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use unicode_width::UnicodeWidthStr;

const INDEX_WIDTH: u16 = 4;
const SKU_WIDTH: u16 = 12;
const CONF_WIDTH: u16 = 8;
const SPACING: u16 = 1;

/// Left edge and width of an editable column, relative to the table.
fn column_span<R: TableRow>(col: usize) -> (u16, u16) {
    let before: u16 = R::WIDTHS[..col].iter().sum();
    let x = INDEX_WIDTH + SPACING + before + SPACING * col as u16;
    (x, R::WIDTHS[col])
}

/// Draw one table pane. Returns the cell caret's screen position when the
/// table has focus.
pub fn draw<R: TableRow>(
    frame: &mut Frame,
    table: &TableState<R>,
    title: &str,
    focused: bool,
    area: Rect,
) -> Option<Position> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} — {} rows ", title, table.rows.len()))
        .border_style(border_style);

    if table.rows.is_empty() {
        let paragraph = Paragraph::new(format!(
            "No {}. Press Ctrl+N to add one.",
            title.to_lowercase()
        ))
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return None;
    }

    let inner = block.inner(area);
    let header_style = Style::default().fg(Color::Cyan).bold();

    // Build header
    let header = Row::new(
        std::iter::once("#")
            .chain(R::HEADERS.iter().copied())
            .chain(["SKU", "Conf"])
            .map(|h| Cell::from(h).style(header_style)),
    )
    .height(1);

    // Keep the selected row on screen
    let visible = usize::from(inner.height.saturating_sub(1)).max(1);
    let scroll = table.selected_row.saturating_sub(visible - 1);

    let selected_style = if focused {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().bg(Color::Rgb(49, 50, 68))
    };

    let rows: Vec<Row> = table
        .rows
        .iter()
        .enumerate()
        .skip(scroll)
        .map(|(i, row)| {
            let confidence = row
                .match_confidence()
                .map(|c| format!("{:.0}%", c * 100.0))
                .unwrap_or_default();
            let mut cells =
                vec![Cell::from((i + 1).to_string()).style(Style::default().fg(Color::DarkGray))];
            cells.extend((0..R::COLUMNS.len()).map(|col| {
                let c = Cell::from(row.cell(col).to_string());
                if i == table.selected_row && col == table.selected_col {
                    c.style(selected_style)
                } else {
                    c
                }
            }));
            cells.push(Cell::from(row.sku_code().to_string()).style(Style::default().fg(Color::Yellow)));
            cells.push(Cell::from(confidence));
            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = std::iter::once(INDEX_WIDTH)
        .chain(R::WIDTHS.iter().copied())
        .chain([SKU_WIDTH, CONF_WIDTH])
        .map(Constraint::Length)
        .collect();

    let widget = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(SPACING);

    frame.render_widget(widget, area);

    if !focused {
        return None;
    }

    // Caret inside the selected cell
    let (col_x, col_width) = column_span::<R>(table.selected_col);
    let prefix: String = table.current_cell().chars().take(table.cell_caret).collect();
    let x = u16::try_from(prefix.width())
        .unwrap_or(u16::MAX)
        .min(col_width.saturating_sub(1));
    let y = u16::try_from(table.selected_row - scroll + 1).unwrap_or(u16::MAX);
    let caret = Position::new(
        (inner.x + col_x + x).min(inner.right().saturating_sub(1)),
        (inner.y + y).min(inner.bottom().saturating_sub(1)),
    );
    frame.set_cursor_position(caret);
    Some(caret)
}
