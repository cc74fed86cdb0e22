use crate::error::SinkError;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// Output channel of a rendered line, mirroring console-style transports
/// (`log`, `debug`, `info`, `warn`, `error`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Log,
    Debug,
    Info,
    Warn,
    Error,
}

/// Destination for fully rendered log lines.
///
/// The engine calls `write` exactly once per record, synchronously, on the
/// thread that made the logging call. Implementations own any buffering,
/// batching or retry; the engine does none of it.
pub trait LogSink: Send + Sync {
    /// Write a single rendered line (plain text or a JSON object).
    ///
    /// **Returns**
    /// - `Ok(())` if the line was accepted.
    /// - `Err(..)` if the transport refused it. The engine reports the
    ///   failure as a `cloudlog` diagnostic and moves on.
    fn write(&self, stream: Stream, line: &str) -> Result<(), SinkError>;
}

/// Writes `Warn`/`Error` lines to stderr and everything else to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, stream: Stream, line: &str) -> Result<(), SinkError> {
        match stream {
            Stream::Warn | Stream::Error => writeln!(std::io::stderr().lock(), "{line}")?,
            _ => writeln!(std::io::stdout().lock(), "{line}")?,
        }
        Ok(())
    }
}

/// Keeps every line in memory. Handy for tests and for embedding the
/// engine where output is collected by the host.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Stream, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of captured lines.
    pub fn lines(&self) -> Vec<(Stream, String)> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Captured lines parsed as JSON; lines that are not JSON are skipped.
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|(_, line)| serde_json::from_str(line).ok())
            .collect()
    }

    /// Remove and return captured lines.
    pub fn take(&self) -> Vec<(Stream, String)> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl LogSink for MemorySink {
    fn write(&self, stream: Stream, line: &str) -> Result<(), SinkError> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((stream, line.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_captures_in_order() {
        let sink = MemorySink::new();
        sink.write(Stream::Info, "one").unwrap();
        sink.write(Stream::Log, r#"{"a":1}"#).unwrap();
        assert_eq!(sink.records(), vec![serde_json::json!({"a": 1})]);
        assert_eq!(
            sink.take(),
            vec![(Stream::Info, "one".to_string()), (Stream::Log, r#"{"a":1}"#.to_string())]
        );
        assert!(sink.lines().is_empty());
    }
}
