//! # checkview
//!
//! Lifecycle-bound chart and SQL editor components for server-driven pages,
//! with a terminal host.
//!
//! A server publishes a page: mount points carrying string attributes, hidden
//! form fields and schema scripts. Every mount point gets a hook for its whole
//! lifecycle. Chart hooks decode the attributes, build a declarative chart
//! spec and keep exactly one live chart instance per mount point. Editor hooks
//! keep one SQL editor bound to a form field.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Application                            │
//! │  ┌─────────┐  diff  ┌──────────┐  tick  ┌──────────┐  ┌───────┐ │
//! │  │ source  │──────▶ │   hook   │──────▶ │  chart   │─▶│  ui   │ │
//! │  │ (input) │ signals│(lifecycle)        │(decode,  │  │(draw) │ │
//! │  └─────────┘        └──────────┘        │ build)   │  └───────┘ │
//! │       ▲                  │              └──────────┘            │
//! │       │                  └────────▶ sql (dialect, completion)   │
//! │  FileSource | StreamSource | ChannelSource                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`chart`]**: attribute decoding and the pure chart configuration builder
//! - **[`hook`]**: lifecycle controllers, the render scheduler and the registry
//!   routing host signals to them
//! - **[`sql`]**: dialects, schemas and completion for the SQL editor
//! - **[`source`]**: page sources ([`PageSource`] trait) and snapshot diffing
//! - **[`ui`]**: the terminal chart renderer, editor backend and views
//! - **[`settings`]**: layered configuration
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a page file
//! checkview --file page.json
//!
//! # Follow a page server over TCP, reconnecting on interruption
//! checkview --connect localhost:9090
//!
//! # Resolve every chart of a page and exit
//! checkview --file page.json --export charts.json
//! ```
//!
//! ### Building a chart spec
//!
//! ```
//! use std::collections::BTreeMap;
//! use checkview::chart::{build, decode};
//!
//! let attrs: BTreeMap<String, String> = [
//!     ("labels", r#"["09:00","09:05"]"#),
//!     ("values", "[12.5,14]"),
//!     ("success", "[1,0]"),
//!     ("average", "13"),
//!     ("alertThreshold", "null"),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_string()))
//! .collect();
//!
//! let spec = build(&decode(&attrs).unwrap());
//! assert_eq!(spec.series.len(), 2);
//! ```
//!
//! ### As a library with channel source
//!
//! ```
//! use checkview::{App, ChannelSource, HookOptions, Theme};
//!
//! let (tx, source) = ChannelSource::create("in-process");
//! let app = App::new(Box::new(source), HookOptions::default(), Theme::dark());
//! ```

pub mod app;
pub mod chart;
pub mod events;
pub mod hook;
pub mod settings;
pub mod source;
pub mod sql;
pub mod ui;

pub use app::App;
pub use chart::{build, decode, resolve, ChartInput, ChartKind, ChartSpec, DecodeError, RawAttributes};
pub use hook::{
    ChartHook, EditorBackend, EditorHook, HookError, HookKind, HookOptions, HookRegistry, HostSignal,
    MountId, RenderError, Renderer,
};
pub use settings::Settings;
pub use source::{ChannelSource, FileSource, PageSnapshot, PageSource, SourceEvent, StreamSource};
pub use ui::Theme;
