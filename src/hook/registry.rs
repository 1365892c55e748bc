//! Routing of host lifecycle signals to per-mount-point hooks.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use super::chart::ChartHook;
use super::editor::{companion_ids, EditorBackend, EditorHook, FieldChange, FormField};
use super::scheduler::{RenderScheduler, DEFAULT_UPDATE_DELAY};
use super::{HookError, MountId, Renderer, Sizing};
use crate::chart::{ChartKind, Palette, RawAttributes};

/// Which component a mount point is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookKind {
    CheckChart,
    HomeChart,
    #[serde(rename = "SQLEditor")]
    SqlEditor,
}

impl HookKind {
    pub fn label(&self) -> &'static str {
        match self {
            HookKind::CheckChart => "chart",
            HookKind::HomeChart => "home",
            HookKind::SqlEditor => "sql",
        }
    }

    /// Chart flavour of a chart hook, `None` for editors.
    pub fn chart_kind(&self) -> Option<ChartKind> {
        match self {
            HookKind::CheckChart => Some(ChartKind::Check),
            HookKind::HomeChart => Some(ChartKind::Home),
            HookKind::SqlEditor => None,
        }
    }

    pub fn is_chart(&self) -> bool {
        self.chart_kind().is_some()
    }
}

impl From<ChartKind> for HookKind {
    fn from(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Check => HookKind::CheckChart,
            ChartKind::Home => HookKind::HomeChart,
        }
    }
}

/// Lifecycle signal emitted by the host for one mount point.
#[derive(Debug, Clone, PartialEq)]
pub enum HostSignal {
    Mounted {
        id: MountId,
        kind: HookKind,
        attrs: RawAttributes,
        /// Value of the companion form field, for editors.
        field: Option<String>,
        /// Text of the companion schema script, for editors.
        schema: Option<String>,
    },
    Updated {
        id: MountId,
        attrs: RawAttributes,
    },
    Reconnected {
        id: MountId,
    },
    Destroyed {
        id: MountId,
    },
}

impl HostSignal {
    pub fn id(&self) -> &MountId {
        match self {
            HostSignal::Mounted { id, .. }
            | HostSignal::Updated { id, .. }
            | HostSignal::Reconnected { id }
            | HostSignal::Destroyed { id } => id,
        }
    }
}

/// Settings applied to every chart hook created by a registry.
#[derive(Debug, Clone)]
pub struct HookOptions {
    pub sizing: Sizing,
    pub palette: Palette,
    pub update_delay: Duration,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            sizing: Sizing::default(),
            palette: Palette::default(),
            update_delay: DEFAULT_UPDATE_DELAY,
        }
    }
}

/// All hooks of a page, with the renderer and editor backend they share.
///
/// Hooks do not share state with each other; an error in one mount point is
/// logged and reported without touching the others.
pub struct HookRegistry<R: Renderer, E: EditorBackend> {
    renderer: R,
    editor_backend: E,
    options: HookOptions,
    charts: BTreeMap<MountId, ChartHook<R>>,
    editors: BTreeMap<MountId, EditorHook<E>>,
    notifier: Option<UnboundedSender<FieldChange>>,
}

impl<R: Renderer, E: EditorBackend> HookRegistry<R, E> {
    pub fn new(renderer: R, editor_backend: E, options: HookOptions) -> Self {
        Self {
            renderer,
            editor_backend,
            options,
            charts: BTreeMap::new(),
            editors: BTreeMap::new(),
            notifier: None,
        }
    }

    /// Forward editor field changes to `notifier`.
    pub fn with_notifier(mut self, notifier: UnboundedSender<FieldChange>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn editor_backend(&self) -> &E {
        &self.editor_backend
    }

    pub fn chart(&self, id: &MountId) -> Option<&ChartHook<R>> {
        self.charts.get(id)
    }

    pub fn editor(&self, id: &MountId) -> Option<&EditorHook<E>> {
        self.editors.get(id)
    }

    /// Mounted ids in display order: charts first, then editors.
    pub fn mounts(&self) -> Vec<(MountId, HookKind)> {
        self.charts
            .iter()
            .map(|(id, hook)| (id.clone(), HookKind::from(hook.kind())))
            .chain(self.editors.keys().map(|id| (id.clone(), HookKind::SqlEditor)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty() && self.editors.is_empty()
    }

    /// Apply one host signal.
    ///
    /// Only an editor mount can fail immediately; chart renders are deferred
    /// and report their errors from [`tick`](Self::tick).
    pub fn handle(&mut self, signal: HostSignal, now: Instant) -> Result<(), HookError> {
        match signal {
            HostSignal::Mounted {
                id,
                kind,
                attrs,
                field,
                schema,
            } => self.mount(id, kind, attrs, field, schema, now),
            HostSignal::Updated { id, attrs } => {
                if let Some(hook) = self.charts.get_mut(&id) {
                    hook.on_data_changed(attrs, now);
                } else if let Some(hook) = self.editors.get_mut(&id) {
                    hook.on_data_changed();
                } else {
                    debug!(mount = %id, "update for unknown mount point");
                }
                Ok(())
            }
            HostSignal::Reconnected { id } => {
                if let Some(hook) = self.charts.get_mut(&id) {
                    hook.on_reconnect(now);
                } else if let Some(hook) = self.editors.get_mut(&id) {
                    hook.on_reconnect();
                }
                Ok(())
            }
            HostSignal::Destroyed { id } => {
                if let Some(mut hook) = self.charts.remove(&id) {
                    hook.on_destroy(&mut self.renderer);
                } else if let Some(mut hook) = self.editors.remove(&id) {
                    hook.on_destroy(&mut self.editor_backend);
                }
                info!(mount = %id, "mount point destroyed");
                Ok(())
            }
        }
    }

    fn mount(
        &mut self,
        id: MountId,
        kind: HookKind,
        attrs: RawAttributes,
        field: Option<String>,
        schema: Option<String>,
        now: Instant,
    ) -> Result<(), HookError> {
        if self.charts.contains_key(&id) || self.editors.contains_key(&id) {
            debug!(mount = %id, "mount point already mounted");
            return Ok(());
        }
        info!(mount = %id, kind = kind.label(), "mount point mounted");

        match kind.chart_kind() {
            Some(chart_kind) => {
                let mut hook = ChartHook::new(
                    id.clone(),
                    self.options.sizing,
                    self.options.palette.clone(),
                    RenderScheduler::new(self.options.update_delay),
                )
                .with_kind(chart_kind);
                hook.on_mount(attrs, now);
                self.charts.insert(id, hook);
                Ok(())
            }
            None => {
                let (field_id, _) = companion_ids(&id);
                let mut form_field = FormField::new(field_id, field.unwrap_or_default());
                if let Some(ref notifier) = self.notifier {
                    form_field = form_field.with_notifier(notifier.clone());
                }
                let mut hook = EditorHook::new(id.clone());
                let result =
                    hook.on_mount(&mut self.editor_backend, &attrs, form_field, schema.as_deref());
                self.editors.insert(id, hook);
                result
            }
        }
    }

    /// Signal a reconnect to every mount point.
    pub fn reconnect_all(&mut self, now: Instant) {
        let ids: Vec<MountId> = self.mounts().into_iter().map(|(id, _)| id).collect();
        for id in ids {
            // Reconnect never fails
            let _ = self.handle(HostSignal::Reconnected { id }, now);
        }
    }

    /// Record the size the host laid a chart surface out at.
    pub fn layout(&mut self, id: &MountId, width: u16, height: u16) {
        if let Some(hook) = self.charts.get_mut(id) {
            hook.layout(width, height);
        }
    }

    /// Run every chart render that is due.
    ///
    /// Returns the errors of this tick, one per failing mount point.
    pub fn tick(&mut self, now: Instant) -> Vec<(MountId, HookError)> {
        let mut errors = Vec::new();
        for (id, hook) in self.charts.iter_mut() {
            if let Err(e) = hook.tick(now, &mut self.renderer) {
                error!(mount = %id, error = %e, "render cycle failed");
                errors.push((id.clone(), e));
            }
        }
        errors
    }

    /// Earliest timer deadline among pending chart renders.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.charts.values().filter_map(|hook| hook.next_deadline()).min()
    }

    /// Apply an edit to an editor mount point.
    ///
    /// Returns whether the bound field changed.
    pub fn edit<F>(&mut self, id: &MountId, f: F) -> bool
    where
        F: FnOnce(&mut E, &mut E::Handle),
    {
        match self.editors.get_mut(id) {
            Some(hook) => hook.edit(&mut self.editor_backend, f),
            None => false,
        }
    }

    /// Destroy every hook, as when the page goes away.
    pub fn destroy_all(&mut self) {
        for (_, mut hook) in std::mem::take(&mut self.charts) {
            hook.on_destroy(&mut self.renderer);
        }
        for (_, mut hook) in std::mem::take(&mut self.editors) {
            hook.on_destroy(&mut self.editor_backend);
        }
    }
}
