//! Debouncing for live search input.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Delay a keystroke must stay unchanged before a search runs.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Lets only the last of a burst of inputs through.
///
/// Each call to [`Debouncer::settle`] supersedes every earlier call that has
/// not finished waiting. Clones share the same generation counter.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wait out the delay, then return `input` if no newer input arrived in
    /// the meantime, or `None` if it was superseded.
    pub async fn settle<T>(&self, input: T) -> Option<T> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        (self.generation.load(Ordering::SeqCst) == ticket).then_some(input)
    }
}
