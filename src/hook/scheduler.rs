//! Render scheduling for one mount point.
//!
//! A mount render waits for the next frame in which the surface has been laid
//! out. Update and reconnect renders are debounced: every signal pushes the
//! deadline out by the update delay, so a burst of signals collapses into one
//! render that runs once the burst has quieted.

use std::time::{Duration, Instant};

use tracing::trace;

/// Default debounce window for update-triggered renders.
pub const DEFAULT_UPDATE_DELAY: Duration = Duration::from_millis(100);

/// What caused a render to be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Mount,
    /// Updated attributes or a reconnect.
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    NextFrame,
    At(Instant),
}

/// Holds at most one pending render.
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    delay: Duration,
    pending: Option<Pending>,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_UPDATE_DELAY)
    }
}

impl RenderScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a pending render.
    ///
    /// An update replaces any pending render with a deadline `delay` from
    /// `now`. A mount never postpones an update that is already pending.
    pub fn schedule(&mut self, trigger: Trigger, now: Instant) {
        let next = match (trigger, self.pending) {
            (Trigger::Mount, Some(pending)) => pending,
            (Trigger::Mount, None) => Pending::NextFrame,
            (Trigger::Update, _) => Pending::At(now + self.delay),
        };
        trace!(?trigger, ?next, "render scheduled");
        self.pending = Some(next);
    }

    /// Drop the pending render, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume the pending render if it is due.
    ///
    /// Nothing is due while the surface has not been laid out.
    pub fn take_due(&mut self, now: Instant, laid_out: bool) -> bool {
        if !laid_out {
            return false;
        }
        let due = match self.pending {
            Some(Pending::NextFrame) => true,
            Some(Pending::At(deadline)) => now >= deadline,
            None => false,
        };
        if due {
            self.pending = None;
        }
        due
    }

    /// When the pending render becomes due, if it waits on a timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.pending {
            Some(Pending::At(deadline)) => Some(deadline),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_waits_for_layout() {
        let now = Instant::now();
        let mut scheduler = RenderScheduler::default();
        scheduler.schedule(Trigger::Mount, now);

        assert!(!scheduler.take_due(now, false));
        assert!(scheduler.is_pending());
        assert!(scheduler.take_due(now, true));
        assert!(!scheduler.is_pending());
        assert!(!scheduler.take_due(now, true));
    }

    #[test]
    fn test_update_is_delayed() {
        let now = Instant::now();
        let mut scheduler = RenderScheduler::new(Duration::from_millis(100));
        scheduler.schedule(Trigger::Update, now);

        assert_eq!(scheduler.next_deadline(), Some(now + Duration::from_millis(100)));
        assert!(!scheduler.take_due(now + Duration::from_millis(99), true));
        assert!(scheduler.take_due(now + Duration::from_millis(100), true));
    }

    #[test]
    fn test_burst_of_updates_is_debounced() {
        let start = Instant::now();
        let mut scheduler = RenderScheduler::new(Duration::from_millis(100));

        for i in 0..5 {
            let at = start + Duration::from_millis(i * 50);
            scheduler.schedule(Trigger::Update, at);
            assert!(!scheduler.take_due(at, true));
        }

        let last = start + Duration::from_millis(200);
        assert!(!scheduler.take_due(last + Duration::from_millis(99), true));
        assert!(scheduler.take_due(last + Duration::from_millis(100), true));
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn test_update_supersedes_pending_mount() {
        let now = Instant::now();
        let mut scheduler = RenderScheduler::new(Duration::from_millis(100));
        scheduler.schedule(Trigger::Mount, now);
        scheduler.schedule(Trigger::Update, now);

        assert!(!scheduler.take_due(now, true));
        assert!(scheduler.take_due(now + Duration::from_millis(100), true));
    }

    #[test]
    fn test_cancel() {
        let now = Instant::now();
        let mut scheduler = RenderScheduler::default();
        scheduler.schedule(Trigger::Update, now);
        scheduler.cancel();

        assert!(!scheduler.is_pending());
        assert!(!scheduler.take_due(now + Duration::from_secs(1), true));
    }

    #[test]
    fn test_due_update_waits_for_layout() {
        let now = Instant::now();
        let mut scheduler = RenderScheduler::new(Duration::from_millis(10));
        scheduler.schedule(Trigger::Update, now);

        let later = now + Duration::from_millis(20);
        assert!(!scheduler.take_due(later, false));
        assert!(scheduler.take_due(later, true));
    }
}
