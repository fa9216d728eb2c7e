//! Client-side log batching and the server that stores what it ships.
//!
//! The client half is a [`console::Console`] facade that mirrors every call
//! into a [`batcher::LogBatcher`], which hands batches to a
//! [`transport::Transport`]. The server half ([`server`]) accepts those
//! batches over HTTP and appends them to a text file.

pub mod batcher;
pub mod config;
pub mod console;
pub mod error;
pub mod ingest;
pub mod log_store;
pub mod relay;
pub mod server;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use batcher::{BatcherConfig, LogBatcher};
pub use console::{Console, ConsoleArg, Json};
pub use transport::{HttpTransport, Transport, TransportConfig};
pub use types::{Level, LogRecord};

/// Installs the process logger; level comes from `RUST_LOG`, default `info`.
pub fn init_logging() -> Result<(), log::SetLoggerError> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
}
