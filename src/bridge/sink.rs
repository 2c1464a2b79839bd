// Diagnostic reporting for bridge failures

use std::fmt;
use std::sync::Arc;

/// Receives one formatted message per failed host call.
pub trait ErrorSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Default sink: logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, message: &str) {
        tracing::error!(target: "wasmexec::bridge", "{}", message);
    }
}

impl<F> ErrorSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Host-side context shared by every bridge function of one guest module.
#[derive(Clone)]
pub struct Module {
    sink: Arc<dyn ErrorSink>,
}

impl Module {
    pub fn new(sink: impl ErrorSink + 'static) -> Self {
        Self { sink: Arc::new(sink) }
    }

    /// Report a failure to the module's error sink.
    pub fn error(&self, message: impl fmt::Display) {
        self.sink.report(&message.to_string());
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new(TracingSink)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module").finish_non_exhaustive()
    }
}
