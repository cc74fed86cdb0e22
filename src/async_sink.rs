use crate::error::SinkError;
use crate::sink::{LogSink, Stream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Non-blocking stdout transport.
///
/// Lines are pushed onto a bounded channel with `try_send` and written
/// out by a background task, so logging calls never wait for I/O. The
/// task batches lines and flushes when a batch fills up or the flush
/// interval elapses. When every sender has been dropped the task writes
/// what is left and exits.
pub struct AsyncStdoutSink {
    sender: mpsc::Sender<String>,
    /// Lines accepted into the channel.
    pub enqueued_lines: Arc<AtomicU64>,
    /// Lines dropped because the channel was full or closed.
    pub dropped_lines: Arc<AtomicU64>,
}

impl AsyncStdoutSink {
    /// Spawn the writer task on the current tokio runtime, targeting
    /// process stdout.
    pub fn new(buffer: usize, batch_size: usize, flush_interval: Duration) -> (Self, JoinHandle<()>) {
        Self::with_writer(tokio::io::stdout(), buffer, batch_size, flush_interval)
    }

    /// Same as [`AsyncStdoutSink::new`] with an arbitrary async writer.
    ///
    /// Minimal thresholds are enforced for `buffer`, `batch_size` and
    /// `flush_interval` to avoid degenerate configurations.
    pub fn with_writer<W>(
        writer: W,
        buffer: usize,
        batch_size: usize,
        flush_interval: Duration,
    ) -> (Self, JoinHandle<()>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let buffer = buffer.max(16);
        let batch_size = batch_size.max(1);
        let flush_interval = flush_interval.max(Duration::from_millis(10));

        let (tx, rx) = mpsc::channel::<String>(buffer);
        let enqueued_lines = Arc::new(AtomicU64::new(0));
        let dropped_lines = Arc::new(AtomicU64::new(0));

        let handle = tokio::spawn(drain(writer, rx, batch_size, flush_interval));

        (
            Self {
                sender: tx,
                enqueued_lines,
                dropped_lines,
            },
            handle,
        )
    }
}

async fn drain<W>(mut writer: W, mut rx: mpsc::Receiver<String>, batch_size: usize, flush_interval: Duration)
where
    W: AsyncWrite + Unpin,
{
    let mut batch: Vec<String> = Vec::with_capacity(batch_size);
    let mut ticker = interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            line = rx.recv() => match line {
                Some(line) => {
                    batch.push(line);
                    if batch.len() >= batch_size {
                        write_batch(&mut writer, &mut batch).await;
                    }
                }
                None => {
                    write_batch(&mut writer, &mut batch).await;
                    tracing::debug!(target: "cloudlog::async_sink", "channel closed, writer task exiting");
                    return;
                }
            },
            _ = ticker.tick() => {
                if !batch.is_empty() {
                    write_batch(&mut writer, &mut batch).await;
                }
            }
        }
    }
}

async fn write_batch<W>(writer: &mut W, batch: &mut Vec<String>)
where
    W: AsyncWrite + Unpin,
{
    if batch.is_empty() {
        return;
    }
    let mut chunk = String::with_capacity(batch.iter().map(|l| l.len() + 1).sum());
    for line in batch.drain(..) {
        chunk.push_str(&line);
        chunk.push('\n');
    }
    if let Err(err) = writer.write_all(chunk.as_bytes()).await {
        tracing::warn!(target: "cloudlog::async_sink", error = %err, "failed to write log batch");
        return;
    }
    if let Err(err) = writer.flush().await {
        tracing::warn!(target: "cloudlog::async_sink", error = %err, "failed to flush log batch");
    }
}

impl LogSink for AsyncStdoutSink {
    fn write(&self, _stream: Stream, line: &str) -> Result<(), SinkError> {
        match self.sender.try_send(line.to_string()) {
            Ok(()) => {
                self.enqueued_lines.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.dropped_lines.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::Full)
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped_lines.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::Closed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn writes_lines_and_flushes_on_close() {
        let (writer, mut reader) = tokio::io::duplex(4096);
        let (sink, handle) = AsyncStdoutSink::with_writer(writer, 16, 2, Duration::from_secs(60));

        sink.write(Stream::Log, "one").unwrap();
        sink.write(Stream::Info, "two").unwrap();
        sink.write(Stream::Error, "three").unwrap();
        assert_eq!(sink.enqueued_lines.load(Ordering::Relaxed), 3);

        drop(sink);
        handle.await.unwrap();

        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn full_channel_drops_lines() {
        let (writer, _reader) = tokio::io::duplex(16);
        let (sink, _handle) = AsyncStdoutSink::with_writer(writer, 16, 1_000, Duration::from_secs(60));

        let mut dropped = 0;
        for i in 0..10_000 {
            if let Err(SinkError::Full) = sink.write(Stream::Log, &format!("line {i}")) {
                dropped += 1;
            }
        }
        assert!(dropped > 0);
        assert_eq!(sink.dropped_lines.load(Ordering::Relaxed), dropped);
    }
}
