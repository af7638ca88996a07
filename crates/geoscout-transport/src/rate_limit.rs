//! Minimum-spacing gate for outgoing requests, tracked per endpoint class.
//!
//! Each class keeps its own "last request" timestamp behind its own async mutex, so a
//! burst against one class never delays another. The wait decision and the timestamp
//! update happen while that mutex is held, which serialises concurrent callers of the
//! same class.

use std::{
    fmt::Debug,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use ahash::AHashMap as HashMap;
use tokio::{sync::Mutex as AsyncMutex, time::Instant};
use tracing::debug;

type Slot = Arc<AsyncMutex<Option<Instant>>>;

#[derive(Debug)]
pub struct RateLimiter<K> {
    default_interval: Duration,
    intervals: HashMap<K, Duration>,
    slots: Mutex<HashMap<K, Slot>>,
}

impl<K> RateLimiter<K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Every class not configured through [`Self::with_interval`] uses `default_interval`.
    #[must_use]
    pub fn new(default_interval: Duration) -> Self {
        Self {
            default_interval,
            intervals: HashMap::new(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_interval(mut self, class: K, interval: Duration) -> Self {
        self.intervals.insert(class, interval);
        self
    }

    pub fn min_interval(&self, class: &K) -> Duration {
        self.intervals
            .get(class)
            .copied()
            .unwrap_or(self.default_interval)
    }

    fn slot(&self, class: &K) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(class.clone()).or_default())
    }

    /// Wait until at least the class's minimum interval has passed since the previous
    /// `acquire` for that class, then record now as the latest request time.
    pub async fn acquire(&self, class: &K) {
        let interval = self.min_interval(class);
        let slot = self.slot(class);
        let mut last = slot.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                let wait = interval - elapsed;
                debug!(?class, wait_ms = wait.as_millis() as u64, "Throttling request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}
