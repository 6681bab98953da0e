use std::sync::Mutex;
use std::time::Duration;

/// Receives one entry per API request, successful or not.
///
/// `request` is the credential-stripped descriptor. Implementations must not
/// block for long and must not panic; the client ignores anything they do.
pub trait RequestSink: Send + Sync {
    fn append(&self, request: &str, duration: Duration);
}

/// Emits each request as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RequestSink for TracingSink {
    fn append(&self, request: &str, duration: Duration) {
        tracing::debug!(
            target: "beanstalk::requests",
            request,
            elapsed_ms = duration.as_millis() as u64,
        );
    }
}

/// Keeps every entry in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(String, Duration)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, Duration)> {
        match self.entries.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.entries().into_iter().map(|(r, _)| r).collect()
    }
}

impl RequestSink for MemorySink {
    fn append(&self, request: &str, duration: Duration) {
        if let Ok(mut g) = self.entries.lock() {
            g.push((request.to_string(), duration));
        }
    }
}
