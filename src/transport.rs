use crate::error::TransportError;
use crate::types::{LogPayload, LogRecord};
use log::debug;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture =
    Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'static>>;

/// Delivers flushed batches somewhere.
///
/// `send` is called synchronously from the flush path and must not block;
/// the returned future is spawned and its result only gets logged.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, batch: Vec<LogRecord>) -> TransportFuture;
}

/// Where batches go. Read once when the transport is built.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub endpoint: String,
    pub enabled: bool,
}

impl TransportConfig {
    fn is_active(&self) -> bool {
        self.enabled && !self.endpoint.is_empty()
    }
}

/// Posts `{"logs": [...]}` to the ingest endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, batch: Vec<LogRecord>) -> TransportFuture {
        if !self.config.is_active() {
            debug!(
                "Logging disabled or no endpoint (enabled={}, endpoint={:?}), dropping {} entries",
                self.config.enabled,
                self.config.endpoint,
                batch.len()
            );
            return Box::pin(async { Ok(()) });
        }

        let count = batch.len();
        let request = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .json(&LogPayload { logs: batch });

        Box::pin(async move {
            debug!("Sending {} log entries", count);
            let response = request.send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status(status));
            }

            debug!("Logs sent successfully");
            Ok(())
        })
    }
}
