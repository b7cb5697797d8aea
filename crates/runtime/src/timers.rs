use foundation::Millis;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer<T> {
    id: TimerId,
    due: Millis,
    payload: T,
}

/// Deterministic one-shot timers (the `setTimeout` of this runtime).
///
/// Timers fire in deadline order; equal deadlines fire in scheduling order.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    next_id: u64,
    timers: Vec<Timer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            timers: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Millis, payload: T) {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.timers.push(Timer { id, due, payload });
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.timers.iter().map(|t| t.due).min()
    }

    /// Removes and returns every timer due at or before `now`, in firing order.
    pub fn take_due(&mut self, now: Millis) -> Vec<T> {
        let mut due = Vec::new();
        let mut pending = Vec::with_capacity(self.timers.len());
        for t in self.timers.drain(..) {
            if t.due <= now {
                due.push(t);
            } else {
                pending.push(t);
            }
        }
        self.timers = pending;
        due.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.id.cmp(&b.id)));
        due.into_iter().map(|t| t.payload).collect()
    }
}
