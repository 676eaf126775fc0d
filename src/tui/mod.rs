//! TUI setup, teardown, and main event loop.

pub mod editor;
pub mod popup;
pub mod statusbar;
pub mod table;
pub mod ui;

use crate::Args;
use crate::app::{App, CatalogStatus, FocusPane, Prescription};
use crate::table::{CaretMove, TableRow, TableState};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use rxsage::catalog::CatalogLoad;
use rxsage::suggest::NavKey;
use std::io;

/// Run the TUI application.
pub async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let prescription = match &args.open {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => Prescription::default(),
    };
    let advice = match &args.advice {
        Some(path) => Some(tokio::fs::read_to_string(path).await?),
        None => None,
    };

    // Initialize app state
    let mut app = App::new(
        prescription,
        advice.as_deref(),
        args.editor_config(),
        args.cell_config(),
        args.cell_options(),
    );

    // Start loading catalogs; suggestions stay empty until this lands
    let sources = args.catalog_sources();
    let mut load = if sources.is_empty() {
        None
    } else {
        app.catalog = CatalogStatus::Loading;
        Some(CatalogLoad::spawn(sources, args.index_options()))
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main event loop
    let result = run_loop(&mut terminal, &mut app, &mut load, &args).await;

    // An unfinished load must not outlive the view
    drop(load);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// The main TUI event loop.
async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    load: &mut Option<CatalogLoad>,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if let Some(pending) = load.as_mut() {
            if let Some(index) = pending.poll() {
                tracing::info!(entries = index.len(), "catalog ready");
                app.set_catalog(index);
                *load = None;
            } else if !pending.is_pending() {
                app.catalog = CatalogStatus::Unavailable;
                *load = None;
            }
        }

        // Draw UI
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Poll for events with a timeout so the catalog load can progress
        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key(key, app, args).await? {
                        break;
                    }
                }
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Down(MouseButton::Left),
                    column,
                    row,
                    ..
                }) => app.pointer_down(column, row),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Keys the suggestion popup may claim.
fn nav_key(key: &KeyEvent) -> Option<NavKey> {
    if key.modifiers != KeyModifiers::NONE {
        return None;
    }
    match key.code {
        KeyCode::Down => Some(NavKey::Down),
        KeyCode::Up => Some(NavKey::Up),
        KeyCode::Enter => Some(NavKey::Enter),
        KeyCode::Tab => Some(NavKey::Tab),
        KeyCode::Esc => Some(NavKey::Escape),
        _ => None,
    }
}

/// Handle a key event. Returns true if the app should exit.
async fn handle_key(
    key: KeyEvent,
    app: &mut App,
    args: &Args,
) -> Result<bool, Box<dyn std::error::Error>> {
    // Global keys
    match (key.modifiers, key.code) {
        // Ctrl+Q — quit
        (KeyModifiers::CONTROL, KeyCode::Char('q')) => return Ok(true),
        // F1 — toggle help
        (_, KeyCode::F(1)) => {
            app.show_help = !app.show_help;
            return Ok(false);
        }
        // F2 — toggle advice
        (_, KeyCode::F(2)) => {
            app.show_advice = !app.show_advice;
            return Ok(false);
        }
        // Esc closes overlays first
        (_, KeyCode::Esc) if app.show_help || app.show_advice => {
            app.show_help = false;
            app.show_advice = false;
            return Ok(false);
        }
        // Ctrl+S — save
        (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
            save(app, args).await;
            return Ok(false);
        }
        _ => {}
    }

    // Pane-specific keys
    match app.focus {
        FocusPane::Editor => {
            // The popup gets first pick of navigation keys
            if let Some(nav) = nav_key(&key)
                && app.editor_nav(nav)
            {
                return Ok(false);
            }
            if (key.modifiers, key.code) == (KeyModifiers::NONE, KeyCode::Tab) {
                app.cycle_focus();
                return Ok(false);
            }
            // Let tui-textarea handle input
            if app.editor.input(key) {
                app.refresh_editor_suggestions();
            } else {
                // Caret moved without an edit; the listed token is stale
                app.editor_session.dismiss();
            }
        }
        FocusPane::Medicines => {
            if table_key(&mut app.medicines, key) {
                app.cycle_focus();
            }
        }
        FocusPane::Investigations => {
            if table_key(&mut app.investigations, key) {
                app.cycle_focus();
            }
        }
    }

    Ok(false)
}

/// Handle a key in a table pane. Returns true when focus should move on.
fn table_key<R: TableRow>(table: &mut TableState<R>, key: KeyEvent) -> bool {
    if let Some(nav) = nav_key(&key)
        && table.nav(nav)
    {
        return false;
    }
    match (key.modifiers, key.code) {
        (KeyModifiers::NONE, KeyCode::Tab) => return true,
        (KeyModifiers::CONTROL, KeyCode::Char('n')) => table.add_row(),
        (KeyModifiers::CONTROL, KeyCode::Char('x')) => table.remove_row(),
        (KeyModifiers::CONTROL, KeyCode::Left) => table.select_prev_col(),
        (KeyModifiers::CONTROL, KeyCode::Right) => table.select_next_col(),
        (_, KeyCode::Up) => table.select_prev_row(),
        (_, KeyCode::Down) => table.select_next_row(),
        (_, KeyCode::Left) => table.move_caret(CaretMove::Left),
        (_, KeyCode::Right) => table.move_caret(CaretMove::Right),
        (_, KeyCode::Home) => table.move_caret(CaretMove::Home),
        (_, KeyCode::End) => table.move_caret(CaretMove::End),
        (_, KeyCode::Backspace) => table.backspace(),
        (_, KeyCode::Delete) => table.delete(),
        (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => table.insert(c),
        _ => {}
    }
    false
}

/// Write the prescription to `--output`. Failures are reported in the status
/// bar; the session keeps running.
async fn save(app: &mut App, args: &Args) {
    let Some(path) = &args.output else {
        app.message = Some("No --output file given".to_string());
        return;
    };
    let json = match serde_json::to_string_pretty(&app.prescription()) {
        Ok(json) => json,
        Err(e) => {
            app.message = Some(format!("Save failed: {}", e));
            return;
        }
    };
    match tokio::fs::write(path, json).await {
        Ok(()) => {
            tracing::info!(
                path = %path.display(),
                medicines = app.medicines.rows.len(),
                investigations = app.investigations.rows.len(),
                "prescription saved"
            );
            app.message = Some(format!("Saved to {}", path.display()));
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "save failed: {e}");
            app.message = Some(format!("Save failed: {}", e));
        }
    }
}
