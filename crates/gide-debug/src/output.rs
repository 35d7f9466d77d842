use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

/// Capacity of the broadcast channel feeding live subscribers.
const SUBSCRIBER_CAPACITY: usize = 256;

/// Append-only sink receiving the raw console output of a debugger.
///
/// The sink is a cheap handle: clones share the same content. Output is kept
/// in full (see [contents](Self::contents)) and forwarded to live
/// [subscribers](Self::subscribe).
#[derive(Clone)]
pub struct OutputSink {
    inner: Arc<SinkInner>,
}

struct SinkInner {
    text: Mutex<String>,
    tx: broadcast::Sender<String>,
}

impl OutputSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SUBSCRIBER_CAPACITY);

        Self {
            inner: Arc::new(SinkInner {
                text: Mutex::new(String::new()),
                tx,
            }),
        }
    }

    /// Appends a chunk of output.
    pub fn append(&self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }

        self.inner
            .text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(chunk);

        // no subscriber is fine
        let _ = self.inner.tx.send(chunk.to_owned());
    }

    /// Appends a line of output (a trailing newline is added).
    pub fn append_line(&self, line: &str) {
        self.append(&format!("{line}\n"));
    }

    /// Returns all the output appended so far.
    pub fn contents(&self) -> String {
        self.inner
            .text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subscribes to the chunks appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.tx.subscribe()
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::OutputSink;

    #[test]
    fn clones_share_content() {
        let sink = OutputSink::new();
        let other = sink.clone();

        sink.append("hello ");
        other.append_line("world");

        assert_eq!(sink.contents(), "hello world\n");
    }

    #[test]
    fn subscribers_see_new_chunks_only() {
        let sink = OutputSink::new();
        sink.append("before");

        let mut rx = sink.subscribe();
        sink.append("after");
        sink.append("");

        assert_eq!(rx.try_recv().ok().as_deref(), Some("after"));
        assert!(rx.try_recv().is_err());
    }
}
