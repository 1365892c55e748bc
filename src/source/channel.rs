//! Channel-based page source.
//!
//! Receives page snapshots via a tokio watch channel, for hosts that run the
//! page producer in the same process.

use tokio::sync::watch;

use super::{PageSource, PageSnapshot, SourceEvent};

/// A page source that receives snapshots via a channel.
///
/// # Example
///
/// ```
/// use checkview::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("in-process");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<PageSnapshot>,
    description: String,
    initial_returned: bool,
}

impl ChannelSource {
    pub fn new(receiver: watch::Receiver<PageSnapshot>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            initial_returned: false,
        }
    }

    /// Create a channel pair for sending snapshots to a ChannelSource.
    pub fn create(source_description: &str) -> (watch::Sender<PageSnapshot>, Self) {
        let (tx, rx) = watch::channel(PageSnapshot::default());
        (tx, Self::new(rx, source_description))
    }
}

impl PageSource for ChannelSource {
    fn poll(&mut self) -> Option<SourceEvent> {
        if !self.initial_returned {
            self.initial_returned = true;
            self.receiver.mark_changed();
        }

        if self.receiver.has_changed().unwrap_or(false) {
            let snapshot = self.receiver.borrow_and_update().clone();
            Some(SourceEvent::Snapshot(snapshot))
        } else {
            None
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        None
    }
}
