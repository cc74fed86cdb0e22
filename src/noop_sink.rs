use crate::error::SinkError;
use crate::sink::{LogSink, Stream};

/// A sink that simply drops all lines.
///
/// Useful for measuring the formatting overhead of the engine alone,
/// without any I/O.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write(&self, _stream: Stream, _line: &str) -> Result<(), SinkError> {
        Ok(())
    }
}
