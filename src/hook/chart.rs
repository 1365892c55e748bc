//! Lifecycle controller for chart mount points.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::scheduler::{RenderScheduler, Trigger};
use super::{HookError, HookState, MountId, Renderer, Sizing, Surface};
use crate::chart::{resolve, ChartKind, Palette, RawAttributes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unmounted,
    Mounted,
    Destroyed,
}

/// Owns the single chart instance of one mount point.
///
/// Every render decodes the latest attributes, builds a fresh spec, destroys
/// the previous instance and only then creates the new one. A render that
/// fails to decode leaves the previous instance in place.
pub struct ChartHook<R: Renderer> {
    kind: ChartKind,
    phase: Phase,
    attrs: RawAttributes,
    surface: Surface,
    sizing: Sizing,
    palette: Palette,
    scheduler: RenderScheduler,
    instance: Option<R::Handle>,
    renders: u64,
}

impl<R: Renderer> ChartHook<R> {
    pub fn new(mount: MountId, sizing: Sizing, palette: Palette, scheduler: RenderScheduler) -> Self {
        Self {
            kind: ChartKind::Check,
            phase: Phase::Unmounted,
            attrs: RawAttributes::new(),
            surface: Surface::new(mount),
            sizing,
            palette,
            scheduler,
            instance: None,
            renders: 0,
        }
    }

    /// Render `kind` charts instead of check charts.
    pub fn with_kind(mut self, kind: ChartKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn mount_id(&self) -> &MountId {
        self.surface.mount()
    }

    pub fn state(&self) -> HookState {
        match (self.phase, &self.instance) {
            (Phase::Unmounted, _) => HookState::Unmounted,
            (Phase::Mounted, None) => HookState::Mounted,
            (Phase::Mounted, Some(_)) => HookState::Live,
            (Phase::Destroyed, _) => HookState::Destroyed,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Record the size the host laid the surface out at.
    pub fn layout(&mut self, width: u16, height: u16) {
        self.surface.set_size(width, height);
    }

    pub fn attributes(&self) -> &RawAttributes {
        &self.attrs
    }

    pub fn instance(&self) -> Option<&R::Handle> {
        self.instance.as_ref()
    }

    /// Number of instances created so far.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn has_pending_render(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// The mount point entered the page.
    pub fn on_mount(&mut self, attrs: RawAttributes, now: Instant) {
        if self.phase != Phase::Unmounted {
            warn!(mount = %self.mount_id(), "mount signal ignored, hook already mounted");
            return;
        }
        self.attrs = attrs;
        self.surface.apply_sizing(self.sizing);
        self.phase = Phase::Mounted;
        self.scheduler.schedule(Trigger::Mount, now);
        debug!(mount = %self.mount_id(), "chart mounted");
    }

    /// The host patched the mount point's attributes.
    pub fn on_data_changed(&mut self, attrs: RawAttributes, now: Instant) {
        if self.phase != Phase::Mounted {
            debug!(mount = %self.mount_id(), "update ignored, hook not mounted");
            return;
        }
        self.attrs = attrs;
        self.scheduler.schedule(Trigger::Update, now);
    }

    /// The surface was detached and reattached.
    pub fn on_reconnect(&mut self, now: Instant) {
        if self.phase != Phase::Mounted {
            debug!(mount = %self.mount_id(), "reconnect ignored, hook not mounted");
            return;
        }
        self.scheduler.schedule(Trigger::Update, now);
    }

    /// Tear down the live instance and cancel any pending render.
    ///
    /// Safe to call any number of times.
    pub fn on_destroy(&mut self, renderer: &mut R) {
        self.scheduler.cancel();
        if let Some(handle) = self.instance.take() {
            renderer.destroy(handle);
            debug!(mount = %self.mount_id(), "chart instance destroyed");
        }
        self.phase = Phase::Destroyed;
    }

    /// Run the pending render if it is due.
    ///
    /// Returns `Ok(true)` when a new instance was created.
    pub fn tick(&mut self, now: Instant, renderer: &mut R) -> Result<bool, HookError> {
        if self.phase != Phase::Mounted {
            return Ok(false);
        }
        if !self.scheduler.take_due(now, self.surface.is_laid_out()) {
            return Ok(false);
        }
        self.render(renderer).map(|()| true)
    }

    fn render(&mut self, renderer: &mut R) -> Result<(), HookError> {
        let spec = resolve(self.kind, &self.attrs, &self.palette).inspect_err(|e| {
            warn!(mount = %self.mount_id(), error = %e, "chart attributes rejected, keeping previous chart");
        })?;
        let points = spec.labels.len();

        if let Some(previous) = self.instance.take() {
            renderer.destroy(previous);
        }

        let handle = renderer.create(&self.surface, spec).inspect_err(|e| {
            warn!(mount = %self.mount_id(), error = %e, "renderer refused chart");
        })?;
        self.instance = Some(handle);
        self.renders += 1;
        info!(
            mount = %self.mount_id(),
            points,
            render = self.renders,
            "chart rendered"
        );
        Ok(())
    }
}
