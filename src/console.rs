//! Console facade that mirrors every call into the batcher.
//!
//! Each level method writes through the native console first, so local
//! output is unchanged, then turns the arguments into a single message and
//! enqueues it. Message building never fails the call: an argument that
//! cannot be serialized just means nothing is enqueued.

use crate::batcher::LogBatcher;
use crate::types::{Level, LogRecord};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One argument of a console call.
pub trait ConsoleArg: fmt::Debug {
    /// Text used for this argument in the shipped message.
    fn to_message_text(&self) -> Result<String, serde_json::Error>;

    /// Text used for native output; never fails.
    fn to_native_text(&self) -> String {
        self.to_message_text().unwrap_or_else(|_| format!("{self:?}"))
    }
}

impl ConsoleArg for str {
    fn to_message_text(&self) -> Result<String, serde_json::Error> {
        Ok(self.to_owned())
    }
}

impl ConsoleArg for String {
    fn to_message_text(&self) -> Result<String, serde_json::Error> {
        Ok(self.clone())
    }
}

impl<T: ConsoleArg + ?Sized> ConsoleArg for &T {
    fn to_message_text(&self) -> Result<String, serde_json::Error> {
        (**self).to_message_text()
    }
}

macro_rules! display_args {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ConsoleArg for $ty {
                fn to_message_text(&self) -> Result<String, serde_json::Error> {
                    Ok(self.to_string())
                }
            }
        )*
    };
}

display_args!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char);

impl ConsoleArg for Value {
    fn to_message_text(&self) -> Result<String, serde_json::Error> {
        match self {
            Value::String(s) => Ok(s.clone()),
            Value::Object(_) | Value::Array(_) | Value::Null => serde_json::to_string(self),
            other => Ok(other.to_string()),
        }
    }
}

/// Marks a value to be rendered as JSON text in the shipped message.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize + fmt::Debug> ConsoleArg for Json<T> {
    fn to_message_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

/// Builds a `&[&dyn ConsoleArg]` from a list of expressions.
///
/// ```ignore
/// console.warn(console_args!("retrying", attempt, Json(&request)));
/// ```
#[macro_export]
macro_rules! console_args {
    ($($arg:expr),* $(,)?) => {
        &[$(&$arg as &dyn $crate::console::ConsoleArg),*]
    };
}

/// Joins the arguments' message text with single spaces.
pub fn build_message(args: &[&dyn ConsoleArg]) -> Result<String, serde_json::Error> {
    let parts = args
        .iter()
        .map(|arg| arg.to_message_text())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(" "))
}

/// The output a console call produces before interception.
pub trait NativeConsole: Send + Sync + 'static {
    fn write(&self, level: Level, args: &[&dyn ConsoleArg]);
}

/// Writes through the `log` facade under the `console` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateConsole;

impl NativeConsole for LogCrateConsole {
    fn write(&self, level: Level, args: &[&dyn ConsoleArg]) {
        let line = args
            .iter()
            .map(|arg| arg.to_native_text())
            .collect::<Vec<_>>()
            .join(" ");
        log::log!(target: "console", level.native(), "{}", line);
    }
}

/// Intercepting console. Build once at startup and pass it around.
#[derive(Clone)]
pub struct Console {
    native: Arc<dyn NativeConsole>,
    batcher: LogBatcher,
}

impl Console {
    pub fn new(batcher: LogBatcher) -> Self {
        Self::with_native(LogCrateConsole, batcher)
    }

    pub fn with_native(native: impl NativeConsole, batcher: LogBatcher) -> Self {
        Self {
            native: Arc::new(native),
            batcher,
        }
    }

    pub fn emit(&self, level: Level, args: &[&dyn ConsoleArg]) {
        self.native.write(level, args);

        if let Ok(message) = build_message(args) {
            self.batcher.enqueue(LogRecord::new(level, message));
        }
    }

    pub fn log(&self, args: &[&dyn ConsoleArg]) {
        self.emit(Level::Log, args);
    }

    pub fn error(&self, args: &[&dyn ConsoleArg]) {
        self.emit(Level::Error, args);
    }

    pub fn warn(&self, args: &[&dyn ConsoleArg]) {
        self.emit(Level::Warn, args);
    }

    pub fn info(&self, args: &[&dyn ConsoleArg]) {
        self.emit(Level::Info, args);
    }

    pub fn debug(&self, args: &[&dyn ConsoleArg]) {
        self.emit(Level::Debug, args);
    }

    /// Ships whatever is queued now.
    pub fn flush(&self) {
        self.batcher.flush();
    }

    pub fn batcher(&self) -> &LogBatcher {
        &self.batcher
    }
}
