//! View-lifecycle hooks bound to mount points.
//!
//! A hook is attached to one mount point for its entire lifecycle and reacts
//! to the four host signals: mount, content updated, reconnected, destroyed.
//!
//! ```text
//! HostSignal ──▶ HookRegistry ──▶ ChartHook ──(RenderScheduler)──▶ decode ─▶ build
//!                     │                                                        │
//!                     │                          destroy previous ◀────────────┘
//!                     │                          create new (Renderer)
//!                     └──────────▶ EditorHook ──▶ EditorBackend ──▶ FormField
//! ```
//!
//! - [`chart`]: lifecycle controller for chart mount points
//! - [`editor`]: lifecycle controller for SQL editor mount points
//! - [`scheduler`]: deferred and debounced render scheduling
//! - [`registry`]: routes host signals to hooks and contains their errors

pub mod chart;
pub mod editor;
pub mod registry;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart::{ChartSpec, DecodeError};

pub use chart::ChartHook;
pub use editor::{EditorBackend, EditorConfig, EditorHook, FieldChange, FormField};
pub use registry::{HookKind, HookOptions, HookRegistry, HostSignal};
pub use scheduler::{RenderScheduler, Trigger};

/// Identifier of the page element a hook is bound to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountId(String);

impl MountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Explicit size constraints applied to a drawing surface before its first
/// render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Sizing {
    pub height_px: u32,
    pub max_height_px: u32,
    pub maintain_aspect_ratio: bool,
}

impl Default for Sizing {
    fn default() -> Self {
        Self {
            height_px: 256,
            max_height_px: 400,
            maintain_aspect_ratio: false,
        }
    }
}

impl Sizing {
    /// Fixed height, never exceeding the maximum.
    pub fn effective_height_px(&self) -> u32 {
        self.height_px.min(self.max_height_px)
    }
}

/// The drawing surface of a mount point.
///
/// The host lays the surface out; until it has a non-zero size the renderer
/// must not measure it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    mount: MountId,
    width: u16,
    height: u16,
    sizing: Option<Sizing>,
}

impl Surface {
    /// A surface that has not been laid out yet.
    pub fn new(mount: MountId) -> Self {
        Self {
            mount,
            width: 0,
            height: 0,
            sizing: None,
        }
    }

    pub fn mount(&self) -> &MountId {
        &self.mount
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Size constraints, once applied.
    pub fn sizing(&self) -> Option<Sizing> {
        self.sizing
    }

    pub fn apply_sizing(&mut self, sizing: Sizing) {
        self.sizing = Some(sizing);
    }

    /// Record the size the host laid the surface out at.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn is_laid_out(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Errors raised by an external renderer or editor backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The surface has no area to draw into.
    #[error("surface `{0}` has zero size")]
    ZeroSizedSurface(MountId),

    /// Another live instance is still bound to the surface.
    #[error("surface `{0}` is already bound to a live instance")]
    SurfaceInUse(MountId),

    /// The renderer refused the configuration.
    #[error("renderer rejected configuration: {0}")]
    Rejected(String),
}

/// External chart renderer.
///
/// `destroy` must release everything associated with the handle. Handles are
/// moved in and out, so an instance can never be destroyed twice or shared.
pub trait Renderer {
    type Handle;

    /// Materialize a chart instance bound to `surface`.
    fn create(&mut self, surface: &Surface, spec: ChartSpec) -> Result<Self::Handle, RenderError>;

    /// Release an instance.
    fn destroy(&mut self, handle: Self::Handle);
}

/// Error of one render cycle, contained to its mount point.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}

/// Lifecycle state of a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    Unmounted,
    /// Mounted without a live instance.
    Mounted,
    /// Mounted with a live instance.
    Live,
    Destroyed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_layout() {
        let mut surface = Surface::new("chart".into());
        assert!(!surface.is_laid_out());

        surface.set_size(80, 0);
        assert!(!surface.is_laid_out());

        surface.set_size(80, 16);
        assert!(surface.is_laid_out());
    }

    #[test]
    fn test_sizing_caps_height() {
        let sizing = Sizing {
            height_px: 500,
            ..Sizing::default()
        };
        assert_eq!(sizing.effective_height_px(), 400);
        assert_eq!(Sizing::default().effective_height_px(), 256);
        assert!(!Sizing::default().maintain_aspect_ratio);
    }
}
