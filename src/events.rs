use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;

/// Where `e` writes the chart export.
pub const EXPORT_PATH: &str = "checkview_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.editing {
        handle_editor_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),

        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_tab();
            } else {
                app.next_tab();
            }
        }
        KeyCode::BackTab => app.prev_tab(),
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(index) = c.to_digit(10) {
                app.select_tab(index as usize - 1);
            }
        }

        // Hovered point of the focused chart
        KeyCode::Left | KeyCode::Char('h') => app.hover_prev(),
        KeyCode::Right | KeyCode::Char('l') => app.hover_next(),
        KeyCode::Home => app.hover_first(),
        KeyCode::End => app.hover_last(),

        KeyCode::Enter => app.start_editing(),

        KeyCode::Char('r') => {
            let _ = app.reload_data(Instant::now());
        }

        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_PATH);
            match app.export_state(&export_path) {
                Ok(()) => app.set_status_message(format!("Exported to {}", export_path.display())),
                Err(e) => app.set_status_message(format!("Export failed: {}", e)),
            }
        }

        _ => {}
    }
}

/// Handle key input while the focused editor is being edited
fn handle_editor_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.stop_editing(),
        KeyCode::Enter => {
            app.edit(|ed, h| ed.newline(h));
        }
        KeyCode::Backspace => {
            app.edit(|ed, h| ed.backspace(h));
        }
        KeyCode::Tab => {
            app.edit(|ed, h| ed.tab(h));
        }
        KeyCode::Left => {
            app.edit(|ed, h| ed.cursor_left(h));
        }
        KeyCode::Right => {
            app.edit(|ed, h| ed.cursor_right(h));
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit(|ed, h| ed.insert_char(h, c));
        }
        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.hover_prev(),
        MouseEventKind::ScrollDown => app.hover_next(),
        // Right-click leaves the editor
        MouseEventKind::Down(MouseButton::Right) => app.stop_editing(),
        _ => {}
    }
}
