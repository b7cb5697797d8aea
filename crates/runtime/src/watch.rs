/// Change detector for one derived value (the reactive `watch` of this runtime).
///
/// The first observation only primes the watcher; every later observation
/// that differs from the previous one is reported with the old value.
#[derive(Debug, Clone)]
pub struct Watch<T> {
    last: Option<T>,
}

impl<T> Default for Watch<T> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<T: Clone + PartialEq> Watch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(previous)` when `current` differs from the last observation.
    pub fn observe(&mut self, current: &T) -> Option<T> {
        if self.last.as_ref() == Some(current) {
            return None;
        }
        self.last.replace(current.clone())
    }

    /// Records `value` as seen without reporting a change.
    pub fn prime(&mut self, value: T) {
        self.last = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::Watch;

    #[test]
    fn first_observation_primes() {
        let mut w = Watch::new();
        assert_eq!(w.observe(&1), None);
        assert_eq!(w.observe(&1), None);
        assert_eq!(w.observe(&2), Some(1));
        assert_eq!(w.observe(&2), None);
    }

    #[test]
    fn prime_suppresses_echo() {
        let mut w = Watch::new();
        w.observe(&vec!["a"]);
        w.prime(vec!["a", "b"]);
        assert_eq!(w.observe(&vec!["a", "b"]), None);
    }
}
