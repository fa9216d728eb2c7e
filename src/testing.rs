//! Test doubles shared by the unit tests.

use crate::error::TransportError;
use crate::transport::{Transport, TransportFuture};
use crate::types::LogRecord;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every batch at the moment `send` is called.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Vec<LogRecord>>>,
    delivered: Arc<AtomicUsize>,
    fail: bool,
    latency: Option<Duration>,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<LogRecord>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Sends whose future ran to a successful completion.
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn send(&self, batch: Vec<LogRecord>) -> TransportFuture {
        self.calls.lock().unwrap().push(batch);

        let fail = self.fail;
        let latency = self.latency;
        let delivered = Arc::clone(&self.delivered);
        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            if fail {
                return Err(TransportError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE));
            }
            delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
