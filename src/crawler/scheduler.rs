//! Per-host request scheduling
//!
//! The [`HostScheduler`] enforces two politeness invariants for every host:
//! at most `per_host_concurrency` operations in flight, and consecutive
//! operation starts at least `min_delay` apart (measured start to start,
//! not completion to start). Admission is a short poll-sleep loop; at crawl
//! concurrency the poll interval is negligible next to network latency.
//!
//! The per-host counters are the only state mutated from concurrently
//! running tasks, so all of it sits behind a single mutex with no await
//! points while held.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Upper bound on one admission poll sleep
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Default)]
struct HostSlot {
    inflight: usize,
    last_start: Option<Instant>,
}

/// Admission control keyed by host
#[derive(Debug)]
pub struct HostScheduler {
    per_host_concurrency: usize,
    min_delay: Duration,
    slots: Mutex<HashMap<String, HostSlot>>,
}

impl HostScheduler {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `per_host_concurrency` - In-flight cap per host (min 1)
    /// * `min_delay` - Floor between same-host operation starts
    pub fn new(per_host_concurrency: usize, min_delay: Duration) -> Self {
        Self {
            per_host_concurrency: per_host_concurrency.max(1),
            min_delay,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The configured start-to-start delay floor
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Runs an operation under this host's admission limits
    ///
    /// Waits until the host has a free slot and its delay floor has
    /// elapsed, runs the future, and releases the slot on completion
    /// whatever the outcome.
    pub async fn run<F, T>(&self, host: &str, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        self.admit(host).await;
        let result = operation.await;
        self.release(host);
        result
    }

    /// Blocks (poll-sleeping) until the host admits a new operation
    async fn admit(&self, host: &str) {
        loop {
            let wait = {
                let mut slots = self.slots.lock().unwrap();
                let slot = slots.entry(host.to_string()).or_default();
                let now = Instant::now();

                let remaining_delay = match slot.last_start {
                    Some(last) => self.min_delay.saturating_sub(now.duration_since(last)),
                    None => Duration::ZERO,
                };

                if slot.inflight < self.per_host_concurrency && remaining_delay.is_zero() {
                    slot.inflight += 1;
                    slot.last_start = Some(now);
                    return;
                }

                // Sleep for the remaining delay or the poll interval,
                // whichever is smaller (a capacity wait has no known end)
                if remaining_delay.is_zero() {
                    POLL_INTERVAL
                } else {
                    remaining_delay.min(POLL_INTERVAL)
                }
            };

            tokio::time::sleep(wait).await;
        }
    }

    /// Releases a host slot after an operation settles
    fn release(&self, host: &str) {
        let mut slots = self.slots.lock().unwrap();
        if let Some(slot) = slots.get_mut(host) {
            slot.inflight = slot.inflight.saturating_sub(1);
        }
    }

    /// Current in-flight count for a host (diagnostics)
    pub fn inflight(&self, host: &str) -> usize {
        let slots = self.slots.lock().unwrap();
        slots.get(host).map(|s| s.inflight).unwrap_or(0)
    }
}
