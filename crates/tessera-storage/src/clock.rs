use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic access counter shared by every store registered with a reducer,
/// so recency is comparable across stores.
#[derive(Clone, Debug, Default)]
pub struct AccessClock(Arc<AtomicU64>);

impl AccessClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock and return the new stamp.
    pub fn tick(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Latest stamp handed out.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_is_monotonic_across_clones() {
        let clock = AccessClock::new();
        let other = clock.clone();
        let a = clock.tick();
        let b = other.tick();
        assert!(b > a);
        assert_eq!(clock.now(), b);
        assert_eq!(other.now(), b);
        assert_eq!(AccessClock::new().now(), 0);
    }
}
