use foundation::Millis;

/// Trailing-edge debounce: only the last value pushed within the quiet window
/// is released, `delay_ms` after it was pushed.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<(Millis, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the quiet window.
    pub fn push(&mut self, now: Millis, value: T) {
        self.pending = Some((now.after(self.delay_ms), value));
    }

    /// Releases the pending value once its window has elapsed.
    pub fn poll(&mut self, now: Millis) -> Option<T> {
        let ready = self.pending.as_ref().is_some_and(|(due, _)| *due <= now);
        if ready {
            self.pending.take().map(|(_, v)| v)
        } else {
            None
        }
    }

    /// When the pending value becomes releasable.
    pub fn deadline(&self) -> Option<Millis> {
        self.pending.as_ref().map(|(due, _)| *due)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;
    use foundation::Millis;

    #[test]
    fn releases_last_value_after_quiet_window() {
        let mut d = Debouncer::new(150);
        d.push(Millis(0), 1);
        d.push(Millis(100), 2);
        assert_eq!(d.poll(Millis(200)), None);
        assert_eq!(d.poll(Millis(250)), Some(2));
        assert_eq!(d.poll(Millis(1_000)), None);
    }

    #[test]
    fn cancel_drops_pending() {
        let mut d = Debouncer::new(10);
        d.push(Millis(0), "x");
        assert_eq!(d.deadline(), Some(Millis(10)));
        assert_eq!(d.cancel(), Some("x"));
        assert_eq!(d.poll(Millis(100)), None);
    }
}
