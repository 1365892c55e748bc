//! Application state and navigation logic.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::layout::Rect;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};

use crate::chart::{resolve, Palette};
use crate::hook::{FieldChange, HookKind, HookOptions, HookRegistry, HostSignal, MountId};
use crate::source::{PageSnapshot, PageSource, SourceEvent};
use crate::ui::chart::rows_for;
use crate::ui::{BufferEditor, TerminalRenderer, Theme};

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    /// Keystrokes go to the focused SQL editor.
    pub editing: bool,

    source: Box<dyn PageSource>,
    page: Option<PageSnapshot>,
    pub registry: HookRegistry<TerminalRenderer, BufferEditor>,
    pub load_error: Option<String>,
    pub last_updated: Option<Instant>,

    /// Index of the focused mount point tab.
    pub selected: usize,
    /// Hovered point of the focused chart.
    pub hovered: usize,

    /// Latest value of every mirrored form field.
    pub fields: BTreeMap<String, String>,
    field_changes: UnboundedReceiver<FieldChange>,

    pub theme: Theme,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(source: Box<dyn PageSource>, options: HookOptions, theme: Theme) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = HookRegistry::new(TerminalRenderer::new(), BufferEditor::new(), options).with_notifier(tx);
        Self {
            running: true,
            show_help: false,
            editing: false,
            source,
            page: None,
            registry,
            load_error: None,
            last_updated: None,
            selected: 0,
            hovered: 0,
            fields: BTreeMap::new(),
            field_changes: rx,
            theme,
            status_message: None,
        }
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn page(&self) -> Option<&PageSnapshot> {
        self.page.as_ref()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < Duration::from_secs(3) => Some(msg),
            _ => None,
        }
    }

    pub fn mounts(&self) -> Vec<(MountId, HookKind)> {
        self.registry.mounts()
    }

    pub fn selected_mount(&self) -> Option<(MountId, HookKind)> {
        self.mounts().into_iter().nth(self.selected)
    }

    /// Poll the page source and turn whatever it observed into lifecycle
    /// signals.
    ///
    /// Returns Ok(true) if the page changed.
    pub fn reload_data(&mut self, now: Instant) -> Result<bool> {
        let mut changed = false;
        while let Some(event) = self.source.poll() {
            changed = true;
            match event {
                SourceEvent::Snapshot(next) => {
                    let prev = self.page.take().unwrap_or_default();
                    let signals = PageSnapshot::diff(&prev, &next);
                    self.page = Some(next);
                    self.apply(signals, now);
                }
                SourceEvent::Reconnected => {
                    info!(source = %self.source.description(), "page source reconnected");
                    if let Some(ref page) = self.page {
                        let signals = page.reconnected();
                        self.apply(signals, now);
                    }
                }
            }
            self.last_updated = Some(now);
            self.load_error = None;
        }

        if !changed {
            if let Some(err) = self.source.error() {
                self.load_error = Some(err);
            }
        }
        self.clamp_selection();
        Ok(changed)
    }

    fn apply(&mut self, signals: Vec<HostSignal>, now: Instant) {
        for signal in signals {
            let id = signal.id().clone();
            if let Err(e) = self.registry.handle(signal, now) {
                warn!(mount = %id, error = %e, "lifecycle signal failed");
                self.set_status_message(format!("{}: {}", id, e));
            }
        }
    }

    /// Lay every chart surface out inside the content area.
    pub fn layout(&mut self, content: Rect) {
        let available = crate::ui::surface_rows_available(content);
        let width = content.width.saturating_sub(2);
        for (id, kind) in self.mounts() {
            if kind.is_chart() {
                let rows = self.surface_rows(&id, available);
                self.registry.layout(&id, width, rows);
            }
        }
    }

    /// Rows of the chart surface of `id`.
    pub fn surface_rows(&self, id: &MountId, available: u16) -> u16 {
        let sizing = self.registry.chart(id).and_then(|c| c.surface().sizing());
        rows_for(sizing, available)
    }

    /// Run due renders and collect field changes.
    pub fn tick(&mut self, now: Instant) {
        for (id, e) in self.registry.tick(now) {
            self.set_status_message(format!("{}: {}", id, e));
        }
        while let Ok(change) = self.field_changes.try_recv() {
            self.fields.insert(change.field, change.value);
        }
        self.clamp_hover();
    }

    /// Earliest time a pending render wants the loop to wake up.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.registry.next_deadline()
    }

    fn clamp_selection(&mut self) {
        let count = self.mounts().len();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
            self.editing = false;
        }
        self.clamp_hover();
    }

    fn point_count(&self) -> usize {
        match self.selected_mount() {
            Some((id, kind)) if kind.is_chart() => {
                self.registry.renderer().spec_for(&id).map(|s| s.labels.len()).unwrap_or(0)
            }
            _ => 0,
        }
    }

    fn clamp_hover(&mut self) {
        let count = self.point_count();
        if self.hovered >= count {
            self.hovered = count.saturating_sub(1);
        }
    }

    pub fn select_tab(&mut self, index: usize) {
        if index < self.mounts().len() {
            self.selected = index;
            self.hovered = 0;
            self.editing = false;
        }
    }

    pub fn next_tab(&mut self) {
        let count = self.mounts().len();
        if count > 0 {
            self.select_tab((self.selected + 1) % count);
        }
    }

    pub fn prev_tab(&mut self) {
        let count = self.mounts().len();
        if count > 0 {
            self.select_tab((self.selected + count - 1) % count);
        }
    }

    pub fn hover_next(&mut self) {
        let max = self.point_count().saturating_sub(1);
        self.hovered = (self.hovered + 1).min(max);
    }

    pub fn hover_prev(&mut self) {
        self.hovered = self.hovered.saturating_sub(1);
    }

    pub fn hover_first(&mut self) {
        self.hovered = 0;
    }

    pub fn hover_last(&mut self) {
        self.hovered = self.point_count().saturating_sub(1);
    }

    /// Start editing when the focused mount point is an editor.
    pub fn start_editing(&mut self) {
        if let Some((_, HookKind::SqlEditor)) = self.selected_mount() {
            self.editing = true;
        }
    }

    pub fn stop_editing(&mut self) {
        self.editing = false;
    }

    /// Apply an edit to the focused editor.
    pub fn edit<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut BufferEditor, &mut crate::ui::EditorHandle),
    {
        match self.selected_mount() {
            Some((id, HookKind::SqlEditor)) => self.registry.edit(&id, f),
            _ => false,
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit and tear every hook down.
    pub fn quit(&mut self) {
        self.running = false;
        self.registry.destroy_all();
    }

    /// Export the live charts and mirrored fields to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        if self.page.is_none() {
            anyhow::bail!("No page to export");
        }

        let mut charts = serde_json::Map::new();
        for (id, kind) in self.mounts() {
            if !kind.is_chart() {
                continue;
            }
            let value = match self.registry.renderer().spec_for(&id) {
                Some(spec) => spec.to_json(),
                None => serde_json::Value::Null,
            };
            charts.insert(id.to_string(), value);
        }

        let mut export = serde_json::Map::new();
        export.insert("charts".to_string(), serde_json::Value::Object(charts));
        export.insert("fields".to_string(), serde_json::json!(self.fields));

        let json = serde_json::to_string_pretty(&serde_json::Value::Object(export))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Decode and build every chart of a page, without rendering.
///
/// Charts whose attributes are rejected are exported as `{"error": ...}`.
pub fn export_page(page: &PageSnapshot, palette: &Palette) -> serde_json::Value {
    let mut charts = serde_json::Map::new();
    for mount in &page.mounts {
        let Some(kind) = mount.hook.chart_kind() else {
            continue;
        };
        let value = match resolve(kind, &mount.attrs, palette) {
            Ok(spec) => spec.to_json(),
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        charts.insert(mount.id.to_string(), value);
    }
    serde_json::json!({ "charts": charts })
}
