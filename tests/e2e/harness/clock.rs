use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Controllable time for commit timestamps.
///
/// Passed to `MuseRepo::with_time_provider()`. Every read ticks the clock
/// forward one second, so consecutive commits get distinct timestamps.
#[derive(Clone)]
pub struct MockClock {
    current: Arc<AtomicU64>,
}

impl MockClock {
    /// Fixed starting point: 2023-11-14T22:13:20Z.
    pub const START: u64 = 1_700_000_000;

    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(Self::START)),
        }
    }

    /// Creates a time provider function suitable for passing to MuseRepo.
    pub fn as_provider(&self) -> impl Fn() -> u64 + Send + Sync + 'static {
        let current = self.current.clone();
        move || current.fetch_add(1, Ordering::SeqCst)
    }

    /// Current timestamp, without ticking.
    pub fn now(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Advance time by duration
    pub fn advance(&self, duration: Duration) {
        self.current.fetch_add(duration.as_secs(), Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}
