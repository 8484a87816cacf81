// Diagnostic sinks
// Formatters report progress and warnings through a sink handed to them,
// never through global state. Emitting must not block or fail.

use log::Level;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// One diagnostic line produced by a formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: Level,
    pub message: String,
}

pub trait LogSink: Send + Sync {
    fn emit(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }
}

/// Forwards every line to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacadeSink;

impl LogSink for LogFacadeSink {
    fn emit(&self, level: Level, message: &str) {
        log::log!(target: "fat32fmt", level, "{}", message);
    }
}

/// Queues lines onto an unbounded channel for a rendering task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LogLine>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LogLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LogSink for ChannelSink {
    fn emit(&self, level: Level, message: &str) {
        // Receiver gone means nobody is rendering anymore
        let _ = self.tx.send(LogLine {
            level,
            message: message.to_string(),
        });
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<LogLine>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.level == Level::Warn)
            .map(|line| line.message)
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.message.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn emit(&self, level: Level, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(LogLine {
                level,
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_levels() {
        let sink = MemorySink::new();
        sink.info("Total sectors: 66600");
        sink.warn("Label truncated");
        sink.debug("Wrote boot sector");

        let lines = sink.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].level, Level::Info);
        assert_eq!(sink.warnings(), vec!["Label truncated".to_string()]);
        assert!(sink.contains("66600"));
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::new();

        let producer = tokio::task::spawn_blocking(move || {
            sink.info("first");
            sink.warn("second");
        });
        producer.await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.message, "first");
        assert_eq!(second.level, Level::Warn);
        // Sender dropped with the closure
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.info("nobody listening");
    }
}
