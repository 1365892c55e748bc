//! Page source abstraction for receiving page snapshots.
//!
//! This module provides a trait-based abstraction for receiving the state of
//! a server-driven page from various sources (files, in-process channels,
//! network streams).

mod channel;
mod file;
mod snapshot;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use snapshot::{MountSnapshot, PageSnapshot};
pub use stream::StreamSource;

use std::fmt::Debug;

/// Something a page source observed since the last poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// A new full page state.
    Snapshot(PageSnapshot),
    /// The transport was interrupted and is live again.
    Reconnected,
}

/// Trait for receiving page state from various sources.
///
/// # Example
///
/// ```
/// use checkview::{FileSource, PageSource};
///
/// let mut source = FileSource::new("page.json");
/// if let Some(event) = source.poll() {
///     println!("{:?}", event);
/// }
/// ```
pub trait PageSource: Send + Debug {
    /// Poll for the next event.
    ///
    /// Returns `None` when nothing happened since the last poll. This method
    /// must not block.
    fn poll(&mut self) -> Option<SourceEvent>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The error of the last poll, if any.
    fn error(&self) -> Option<String>;
}
