use crate::console::Console;
use crate::console_args;
use crate::types::Level;
use log::{debug, error};
use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc;

/// Lines buffered between the stdin thread and the relay loop.
const LINE_CHANNEL_CAPACITY: usize = 256;

/// Reads stdin on a detached OS thread and hands lines over a channel.
///
/// A read pending on this thread never holds up runtime shutdown.
pub fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);

    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read input line: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

/// Feeds every received line through the console until the sender closes.
///
/// Blank lines and lines not containing `filter` (when non-empty) are
/// skipped. Returns how many lines were forwarded.
pub async fn run(mut lines: mpsc::Receiver<String>, console: &Console, filter: &str) -> usize {
    let mut forwarded = 0;

    while let Some(line) = lines.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        if !filter.is_empty() && !line.contains(filter) {
            continue;
        }

        console.emit(level_of(&line), console_args!(line));
        forwarded += 1;
    }

    debug!("Input closed after {} lines", forwarded);
    forwarded
}

/// Resolves on Ctrl-C or SIGTERM. Returns the signal name.
#[cfg(unix)]
pub async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => "SIGINT",
                _ = term.recv() => "SIGTERM",
            }
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            wait_ctrl_c().await
        }
    }
}

/// Resolves on Ctrl-C. Returns the signal name.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> &'static str {
    wait_ctrl_c().await
}

async fn wait_ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

/// Level named by a leading `[LEVEL]` tag; untagged lines are plain logs.
pub fn level_of(line: &str) -> Level {
    const TAGS: [(&str, Level); 6] = [
        ("[ERROR]", Level::Error),
        ("[WARN]", Level::Warn),
        ("[INFO]", Level::Info),
        ("[DEBUG]", Level::Debug),
        ("[TRACE]", Level::Debug),
        ("[LOG]", Level::Log),
    ];

    TAGS.iter()
        .find(|(tag, _)| line.starts_with(tag))
        .map_or(Level::Log, |(_, level)| *level)
}
