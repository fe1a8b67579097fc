//! Log setup: everything goes to a file through a non-blocking writer, so
//! the console stays free for the chat prompt.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "lanchat.log";

/// Install the subscriber. The returned guard must live for the whole
/// process so buffered records are flushed on exit.
pub fn init() -> WorkerGuard {
    let appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}
