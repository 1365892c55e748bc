//! Terminal rendering.
//!
//! - [`chart`]: the chart renderer behind chart hooks
//! - [`editor`]: the SQL editor backend behind editor hooks
//! - [`common`]: header, tabs, status bar and help overlay

pub mod chart;
pub mod common;
pub mod editor;
mod theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    widgets::Paragraph,
    Frame,
};

pub use chart::{ChartHandle, TerminalRenderer, Tooltip};
pub use editor::{BufferEditor, EditorHandle};
pub use theme::Theme;

use crate::app::App;
use crate::hook::HookKind;

/// Minimum terminal size for a usable display.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 12;

/// Area left for the focused mount point once header, tabs and status bar
/// are placed.
pub fn content_area(area: Rect) -> Rect {
    main_chunks(area)[2]
}

fn main_chunks(area: Rect) -> [Rect; 4] {
    Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(1), // Tabs
        Constraint::Min(8),    // Focused mount point
        Constraint::Length(1), // Status bar
    ])
    .areas(area)
}

/// Split the content area into the chart surface (with its border) and the
/// tooltip line below it.
pub fn chart_areas(content: Rect, rows: u16) -> (Rect, Rect) {
    let [chart, tooltip, _] = Layout::vertical([
        Constraint::Length(rows.saturating_add(2)),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(content);
    (chart, tooltip)
}

/// Rows available to a chart surface inside the content area.
pub fn surface_rows_available(content: Rect) -> u16 {
    // Border and tooltip line
    content.height.saturating_sub(3)
}

/// Draw the whole screen.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.warning));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5.min(area.height));
        frame.render_widget(paragraph, centered);
        return;
    }

    let [header, tabs, content, status] = main_chunks(area);

    common::render_header(frame, app, header);
    common::render_tabs(frame, app, tabs);

    match app.selected_mount() {
        Some((id, HookKind::CheckChart | HookKind::HomeChart)) => {
            let rows = app.surface_rows(&id, surface_rows_available(content));
            let (chart_area, tooltip_area) = chart_areas(content, rows);
            let renderer = app.registry.renderer();
            renderer.draw(frame, chart_area, &id, app.hovered, &app.theme);
            renderer.draw_tooltip(frame, tooltip_area, &id, app.hovered, &app.theme);
        }
        Some((id, HookKind::SqlEditor)) => {
            app.registry.editor_backend().draw(frame, content, &id, app.editing, &app.theme);
        }
        None => {
            let msg = if app.load_error.is_some() { "No page loaded" } else { "No mount points on this page" };
            let paragraph = Paragraph::new(msg)
                .alignment(Alignment::Center)
                .style(Style::default().add_modifier(Modifier::DIM));
            frame.render_widget(paragraph, content);
        }
    }

    common::render_status_bar(frame, app, status);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}
