//! In-memory renderer and editor backend for hook tests.

use std::collections::BTreeMap;

use super::editor::{EditorBackend, EditorConfig};
use super::{MountId, RenderError, Renderer, Surface};
use crate::chart::ChartSpec;

#[derive(Debug, PartialEq, Eq)]
pub struct FakeHandle(u64);

/// Tracks live instances per surface and rejects a second binding.
#[derive(Debug, Default)]
pub struct FakeRenderer {
    next_id: u64,
    live: BTreeMap<u64, (MountId, ChartSpec)>,
    created: usize,
    destroyed: usize,
    fail_next: Option<String>,
}

impl FakeRenderer {
    pub fn fail_next(&mut self, reason: &str) {
        self.fail_next = Some(reason.to_string());
    }

    pub fn live(&self) -> usize {
        self.live.len()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed
    }

    pub fn spec(&self, handle: &FakeHandle) -> Option<&ChartSpec> {
        self.live.get(&handle.0).map(|(_, spec)| spec)
    }

    pub fn live_on(&self, mount: &MountId) -> Option<&ChartSpec> {
        self.live.values().find(|(m, _)| m == mount).map(|(_, spec)| spec)
    }
}

impl Renderer for FakeRenderer {
    type Handle = FakeHandle;

    fn create(&mut self, surface: &Surface, spec: ChartSpec) -> Result<FakeHandle, RenderError> {
        if let Some(reason) = self.fail_next.take() {
            return Err(RenderError::Rejected(reason));
        }
        if self.live.values().any(|(m, _)| m == surface.mount()) {
            return Err(RenderError::SurfaceInUse(surface.mount().clone()));
        }
        self.next_id += 1;
        self.created += 1;
        self.live.insert(self.next_id, (surface.mount().clone(), spec));
        Ok(FakeHandle(self.next_id))
    }

    fn destroy(&mut self, handle: FakeHandle) {
        if self.live.remove(&handle.0).is_some() {
            self.destroyed += 1;
        }
    }
}

/// Editor backend holding plain text documents.
#[derive(Debug, Default)]
pub struct FakeEditor {
    next_id: u64,
    docs: BTreeMap<u64, (EditorConfig, String)>,
}

impl FakeEditor {
    pub fn live(&self) -> usize {
        self.docs.len()
    }

    pub fn config(&self, handle: &FakeHandle) -> Option<&EditorConfig> {
        self.docs.get(&handle.0).map(|(config, _)| config)
    }

    pub fn set_text(&mut self, handle: &FakeHandle, text: &str) {
        if let Some((_, doc)) = self.docs.get_mut(&handle.0) {
            *doc = text.to_string();
        }
    }
}

impl EditorBackend for FakeEditor {
    type Handle = FakeHandle;

    fn create(&mut self, _mount: &MountId, config: EditorConfig) -> Result<FakeHandle, RenderError> {
        self.next_id += 1;
        let doc = config.doc.clone();
        self.docs.insert(self.next_id, (config, doc));
        Ok(FakeHandle(self.next_id))
    }

    fn document(&self, handle: &FakeHandle) -> String {
        self.docs.get(&handle.0).map(|(_, doc)| doc.clone()).unwrap_or_default()
    }

    fn destroy(&mut self, handle: FakeHandle) {
        self.docs.remove(&handle.0);
    }
}
