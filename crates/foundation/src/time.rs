use serde::{Deserialize, Serialize};

/// Host clock reading in milliseconds.
///
/// The core never reads a wall clock itself; every time-dependent call takes
/// the current `Millis` from the host so timers and debounces replay exactly.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn after(self, delay_ms: u64) -> Self {
        Millis(self.0.saturating_add(delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::Millis;

    #[test]
    fn after_adds_delay() {
        assert_eq!(Millis(1_000).after(1_500), Millis(2_500));
        assert!(Millis::ZERO < Millis(1));
    }

    #[test]
    fn after_saturates() {
        assert_eq!(Millis(u64::MAX).after(1), Millis(u64::MAX));
    }
}
