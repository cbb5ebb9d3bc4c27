//! Autosave quiet-window timer.

/// Default quiet window for debounced saves, in milliseconds.
pub const AUTOSAVE_DELAY_MS: i64 = 150;

/// Debounce gate for autosave: each state change restarts a short timer,
/// so only the last state within a quiet window is persisted.
///
/// The debouncer never reads a clock. Callers supply epoch milliseconds
/// to `mark_changed` and `poll`; the browser layer passes `Date.now()`,
/// tests pass constants.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    delay_ms: i64,
    deadline: Option<i64>,
}

impl SaveDebouncer {
    /// Creates a debouncer with the given quiet window.
    pub fn new(delay_ms: i64) -> Self {
        SaveDebouncer {
            delay_ms,
            deadline: None,
        }
    }

    /// Records a state change at `now_ms`, restarting the quiet window.
    pub fn mark_changed(&mut self, now_ms: i64) {
        self.deadline = Some(now_ms + self.delay_ms);
    }

    /// True while a save is scheduled and has not fired.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once per quiet window: when the deadline has
    /// passed, clears it and reports that a save should happen now.
    pub fn poll(&mut self, now_ms: i64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drops any scheduled save.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for SaveDebouncer {
    fn default() -> Self {
        SaveDebouncer::new(AUTOSAVE_DELAY_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_fires_after_quiet_window() {
        let mut debouncer = SaveDebouncer::new(150);
        debouncer.mark_changed(1_000);
        assert!(debouncer.is_pending());
        assert!(!debouncer.poll(1_100));
        assert!(debouncer.poll(1_150));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_poll_fires_once_per_window() {
        let mut debouncer = SaveDebouncer::new(150);
        debouncer.mark_changed(0);
        assert!(debouncer.poll(200));
        assert!(!debouncer.poll(400));
    }

    #[test]
    fn test_new_change_restarts_window() {
        let mut debouncer = SaveDebouncer::new(150);
        debouncer.mark_changed(0);
        debouncer.mark_changed(100);
        assert!(!debouncer.poll(150));
        assert!(debouncer.poll(250));
    }

    #[test]
    fn test_cancel_drops_scheduled_save() {
        let mut debouncer = SaveDebouncer::default();
        debouncer.mark_changed(0);
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.poll(10_000));
    }

    #[test]
    fn test_idle_debouncer_never_fires() {
        let mut debouncer = SaveDebouncer::default();
        assert!(!debouncer.poll(i64::MAX));
    }
}
