//! Log sinks and credential masking.
//!
//! The host agent may or may not provide a log channel. Components take an
//! `Arc<dyn LogSink>` at construction and never check for its presence.

use std::fmt;

/// Destination for plugin log records
pub trait LogSink: Send + Sync {
    fn log(&self, level: tracing::Level, message: &str);

    fn info(&self, message: &str) {
        self.log(tracing::Level::INFO, message);
    }

    fn debug(&self, message: &str) {
        self.log(tracing::Level::DEBUG, message);
    }

    fn warn(&self, message: &str) {
        self.log(tracing::Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.log(tracing::Level::ERROR, message);
    }
}

/// Forwards records to the process-wide `tracing` subscriber (stderr)
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: tracing::Level, message: &str) {
        match level {
            tracing::Level::ERROR => tracing::error!(target: "segi9", "{}", message),
            tracing::Level::WARN => tracing::warn!(target: "segi9", "{}", message),
            tracing::Level::INFO => tracing::info!(target: "segi9", "{}", message),
            tracing::Level::DEBUG => tracing::debug!(target: "segi9", "{}", message),
            tracing::Level::TRACE => tracing::trace!(target: "segi9", "{}", message),
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _level: tracing::Level, _message: &str) {}
}

/// Displays only whether a secret was supplied, never its value.
///
/// ```
/// use segi9::logging::Presence;
///
/// assert_eq!(Presence::of(Some("hunter2")).to_string(), "provided");
/// assert_eq!(Presence::of(Some("")).to_string(), "not provided");
/// assert_eq!(Presence::of(None).to_string(), "not provided");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence(bool);

impl Presence {
    pub fn of(secret: Option<&str>) -> Self {
        Self(secret.is_some_and(|s| !s.is_empty()))
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 {
            f.write_str("provided")
        } else {
            f.write_str("not provided")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<(tracing::Level, String)>>);

    impl LogSink for Capture {
        fn log(&self, level: tracing::Level, message: &str) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }
    }

    #[test]
    fn test_default_methods_route_levels() {
        let sink = Capture::default();
        sink.info("a");
        sink.debug("b");
        sink.warn("c");
        sink.error("d");

        let records = sink.0.lock().unwrap();
        let levels: Vec<_> = records.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            levels,
            vec![
                tracing::Level::INFO,
                tracing::Level::DEBUG,
                tracing::Level::WARN,
                tracing::Level::ERROR
            ]
        );
    }

    #[test]
    fn test_presence_hides_value() {
        let shown = Presence::of(Some("sk-secret-token")).to_string();
        assert_eq!(shown, "provided");
        assert!(!shown.contains("secret"));
    }
}
