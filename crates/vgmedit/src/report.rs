//! User-facing status reporting.
//!
//! The engines in this crate never print. Anything a user should see, such
//! as the trim engine capping an end point that runs past the file, goes
//! through a [`StatusSink`] supplied by the caller.

/// Receiver for user-facing messages produced while an engine runs.
pub trait StatusSink {
    /// Called for conditions that were handled but deserve the user's
    /// attention.
    fn warning(&mut self, message: &str);
}

/// A sink that discards every message.
///
/// Useful for tests and for callers that only care about the returned bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn warning(&mut self, _message: &str) {}
}

/// A sink that collects messages into a `Vec`, mainly for inspection in
/// tests.
#[derive(Debug, Default, Clone)]
pub struct CollectSink {
    /// Messages received so far, oldest first.
    pub warnings: Vec<String>,
}

impl StatusSink for CollectSink {
    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}
