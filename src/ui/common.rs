//! Common UI components shared across mount point views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::App;
use crate::hook::{HookKind, HookState};

/// Render the header bar with a page overview.
///
/// Displays: status indicator, live charts, editors, data source.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mounts = app.mounts();
    if app.page().is_none() {
        let line = Line::from(vec![
            Span::styled(" CHECKVIEW ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("| Loading..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let charts: Vec<_> = mounts.iter().filter(|(_, kind)| kind.is_chart()).collect();
    let live = charts
        .iter()
        .filter(|(id, _)| app.registry.chart(id).map(|c| c.state()) == Some(HookState::Live))
        .count();
    let editors = mounts.len() - charts.len();

    let status_style = if app.load_error.is_some() {
        Style::default().fg(app.theme.critical)
    } else if live < charts.len() {
        Style::default().fg(app.theme.warning)
    } else {
        Style::default().fg(app.theme.healthy)
    };

    let line = Line::from(vec![
        Span::styled(" ● ", status_style),
        Span::styled("CHECKVIEW ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(format!("{}/{}", live, charts.len()), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" charts live │ "),
        Span::styled(format!("{}", editors), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" editors │ "),
        Span::styled(app.source_description().to_string(), Style::default().add_modifier(Modifier::DIM)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar, one tab per mount point.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = app
        .mounts()
        .iter()
        .enumerate()
        .map(|(i, (id, kind))| Line::from(format!(" {}:{} [{}] ", i + 1, id, kind.label())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows temporary status messages first, then errors, then the time since
/// the last page update with the controls of the focused view.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if let Some(ref err) = app.load_error {
        format!(" Error: {} | q:quit r:retry", err)
    } else if let Some(updated) = app.last_updated {
        let controls = match app.selected_mount().map(|(_, kind)| kind) {
            Some(HookKind::SqlEditor) if app.editing => "Tab:complete Esc:stop editing",
            Some(HookKind::SqlEditor) => "Enter:edit Tab:switch ?:help q:quit",
            _ => "←/→:hover Tab:switch e:export ?:help q:quit",
        };
        format!(" Updated {:.1}s ago | {}", updated.elapsed().as_secs_f64(), controls)
    } else {
        " Loading... | q:quit".to_string()
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab/S-Tab   Next/previous mount point"),
        Line::from("  1-9         Jump to mount point"),
        Line::from(""),
        section(" Charts"),
        Line::from("  ←/→ h/l     Move hovered point"),
        Line::from("  Home/End    First/last point"),
        Line::from(""),
        section(" SQL editor"),
        Line::from("  Enter       Start editing"),
        Line::from("  Tab         Complete or indent"),
        Line::from("  Esc         Stop editing"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Reload page"),
        Line::from("  e         Export charts to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 23u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
