//! Queue + timer deciding when captured records are shipped.
//!
//! A batch is flushed when the queue reaches the size threshold, when the
//! delay armed by the first record of a cycle elapses, on an explicit
//! [`LogBatcher::flush`], or on [`LogBatcher::shutdown`]. Each flush hands
//! one snapshot to the [`Transport`] and never waits for it; failures are
//! logged and the batch is dropped.

use crate::transport::Transport;
use crate::types::{LogQueue, LogRecord};
use log::{error, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Queue length that triggers an immediate flush.
pub const FLUSH_THRESHOLD: usize = 10;

/// How long the first record of a cycle may wait before being flushed.
pub const FLUSH_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct BatcherConfig {
    pub threshold: usize,
    pub delay: Duration,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            threshold: FLUSH_THRESHOLD,
            delay: FLUSH_DELAY,
        }
    }
}

/// Handle to a batcher. Clones share the same queue.
#[derive(Clone)]
pub struct LogBatcher {
    inner: Arc<Inner>,
}

struct Inner {
    config: BatcherConfig,
    transport: Arc<dyn Transport>,
    runtime: Handle,
    state: Mutex<BatcherState>,
}

#[derive(Default)]
struct BatcherState {
    queue: LogQueue,
    timer: Option<PendingTimer>,
    generation: u64,
    in_flight: Vec<JoinHandle<()>>,
}

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl LogBatcher {
    /// Creates a batcher bound to the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(config: BatcherConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_runtime(config, transport, Handle::current())
    }

    /// Creates a batcher whose timer and send tasks run on `runtime`.
    pub fn with_runtime(
        config: BatcherConfig,
        transport: Arc<dyn Transport>,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                runtime,
                state: Mutex::new(BatcherState::default()),
            }),
        }
    }

    /// Appends a record, flushing right away once the threshold is reached.
    ///
    /// The first record after a flush arms the delay timer; later records
    /// never push that deadline back.
    pub fn enqueue(&self, record: LogRecord) {
        let batch = {
            let mut state = self.lock_state();
            state.queue.push(record);

            if state.queue.len() >= self.inner.config.threshold {
                take_batch(&mut state)
            } else {
                if state.timer.is_none() {
                    self.arm_timer(&mut state);
                }
                None
            }
        };

        if let Some(batch) = batch {
            self.dispatch(batch);
        }
    }

    /// Ships everything queued so far. No-op on an empty queue.
    pub fn flush(&self) {
        let batch = take_batch(&mut self.lock_state());
        if let Some(batch) = batch {
            self.dispatch(batch);
        }
    }

    /// Same as [`flush`](Self::flush); kept for callers wiring shutdown hooks.
    pub fn manual_flush(&self) {
        self.flush();
    }

    /// Flushes and then waits up to `grace` for sends still in flight.
    ///
    /// Delivery stays best-effort: sends that outlive `grace` are abandoned.
    pub async fn shutdown(&self, grace: Duration) {
        self.flush();

        let pending = std::mem::take(&mut self.lock_state().in_flight);
        if pending.is_empty() {
            return;
        }

        let count = pending.len();
        let wait_all = async {
            for handle in pending {
                let _ = handle.await;
            }
        };

        if tokio::time::timeout(grace, wait_all).await.is_err() {
            warn!("Gave up waiting for {} in-flight log batches", count);
        }
    }

    /// Number of records waiting for the next flush.
    pub fn len(&self) -> usize {
        self.lock_state().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().queue.is_empty()
    }

    pub fn has_pending_timer(&self) -> bool {
        self.lock_state().timer.is_some()
    }

    fn lock_state(&self) -> MutexGuard<'_, BatcherState> {
        // Queue contents stay consistent even if a holder panicked.
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm_timer(&self, state: &mut BatcherState) {
        state.generation += 1;
        let generation = state.generation;
        let deadline = Instant::now() + self.inner.config.delay;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let handle = self.inner.runtime.spawn(async move {
            sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                LogBatcher { inner }.on_timer(generation);
            }
        });

        state.timer = Some(PendingTimer { generation, handle });
    }

    fn on_timer(&self, generation: u64) {
        let batch = {
            let mut state = self.lock_state();
            let armed = state.timer.as_ref().map(|t| t.generation);
            if armed == Some(generation) {
                // Disarm without aborting: this is the timer task itself.
                state.timer = None;
                take_batch(&mut state)
            } else {
                // Cycle already flushed by another trigger.
                None
            }
        };

        if let Some(batch) = batch {
            self.dispatch(batch);
        }
    }

    fn dispatch(&self, batch: Vec<LogRecord>) {
        let send = self.inner.transport.send(batch);
        let handle = self.inner.runtime.spawn(async move {
            if let Err(e) = send.await {
                error!("Failed to send logs: {}", e);
            }
        });

        let mut state = self.lock_state();
        state.in_flight.retain(|h| !h.is_finished());
        state.in_flight.push(handle);
    }
}

/// Snapshots and clears the queue, cancelling any pending timer.
fn take_batch(state: &mut BatcherState) -> Option<Vec<LogRecord>> {
    if state.queue.is_empty() {
        return None;
    }
    if let Some(timer) = state.timer.take() {
        timer.handle.abort();
    }
    Some(state.queue.drain())
}
