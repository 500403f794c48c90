use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag telling async work whether its owning view still exists.
/// Cloned into every operation that may complete after teardown.
#[derive(Debug, Clone)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

/// Held by the view. Revokes the paired [`Liveness`] on drop.
#[derive(Debug)]
pub struct LivenessGuard {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> (LivenessGuard, Liveness) {
        let alive = Arc::new(AtomicBool::new(true));
        (
            LivenessGuard {
                alive: Arc::clone(&alive),
            },
            Liveness { alive },
        )
    }

    pub fn is_live(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl LivenessGuard {
    pub fn revoke(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        self.revoke();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_until_guard_dropped() {
        let (guard, token) = Liveness::new();
        let copy = token.clone();
        assert!(token.is_live());
        drop(guard);
        assert!(!token.is_live());
        assert!(!copy.is_live());
    }

    #[test]
    fn test_explicit_revoke() {
        let (guard, token) = Liveness::new();
        guard.revoke();
        assert!(!token.is_live());
    }
}
