/// Token handed out by [`SyncGuard::begin`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GuardToken(u64);

/// Re-entrancy guard keyed by generation.
///
/// Each `begin` starts a new generation and raises the guard. `release` only
/// lowers it when called with the latest generation's token, so a stale
/// timeout from an earlier programmatic move cannot clear a newer one.
#[derive(Debug, Clone, Default)]
pub struct SyncGuard {
    generation: u64,
    active: Option<u64>,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> GuardToken {
        self.generation = self.generation.wrapping_add(1);
        self.active = Some(self.generation);
        GuardToken(self.generation)
    }

    /// Returns `true` if this call lowered the guard.
    pub fn release(&mut self, token: GuardToken) -> bool {
        if self.active == Some(token.0) {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::SyncGuard;

    #[test]
    fn single_begin_release_behaves_like_a_flag() {
        let mut g = SyncGuard::new();
        assert!(!g.is_active());
        let t = g.begin();
        assert!(g.is_active());
        assert!(g.release(t));
        assert!(!g.is_active());
        assert!(!g.release(t));
    }

    #[test]
    fn stale_token_cannot_release_newer_generation() {
        let mut g = SyncGuard::new();
        let first = g.begin();
        let second = g.begin();
        assert!(!g.release(first));
        assert!(g.is_active());
        assert!(g.release(second));
        assert!(!g.is_active());
        assert_eq!(g.generation(), 2);
    }
}
