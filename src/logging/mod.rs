//! Console and file logging built on `tracing`.
//!
//! Commands talk to a [`Logger`]; the engine sees it as `&dyn Log`. Every
//! event goes to the console and, when a log file could be opened, to
//! `~/.cache/nvs/<command>.log` as well.

mod format;
mod logger;
mod subscriber;
mod types;

pub use logger::Logger;
pub use subscriber::{init_subscriber, log_file_path};
pub use types::{Log, LinkEntry, LinkStatus};

/// A [`Logger`] whose events land in a fresh temporary log file.
///
/// Keep the guard alive for the test; it scopes the subscriber to the
/// current thread.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};

    let tmp = tempfile::tempdir().expect("temp dir");
    let path = tmp.path().join("test.log");
    let layer = subscriber::FileLayer::open(&path, "test").expect("open log file");
    let dispatch = tracing::Dispatch::new(
        tracing_subscriber::registry().with(layer.with_filter(LevelFilter::DEBUG)),
    );
    let guard = tracing::dispatcher::set_default(&dispatch);
    (Logger::new(Some(path)), tmp, guard)
}
