//! Line decoding and the merged output stream of an engine process.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

/// Default buffer size for the line channel.
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

const READ_CHUNK: usize = 8192;

/// Incremental splitter turning raw output bytes into lines.
///
/// `\n`, `\r\n` and a lone `\r` each end a line, so output from engines
/// built for any platform splits the same way. A `\r\n` pair split across
/// two chunks still counts as one terminator.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
    after_cr: bool,
}

impl LineDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return the lines it completes.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            match byte {
                b'\n' if self.after_cr => self.after_cr = false,
                b'\n' | b'\r' => {
                    lines.push(self.take_line());
                    self.after_cr = byte == b'\r';
                }
                _ => {
                    self.after_cr = false;
                    self.buf.push(byte);
                }
            }
        }
        lines
    }

    /// Flush the trailing unterminated line, if any.
    pub fn finish(&mut self) -> Option<String> {
        self.after_cr = false;
        if self.buf.is_empty() {
            None
        } else {
            Some(self.take_line())
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}

/// Lazy sequence of output lines from one process.
///
/// Fed by a background pump task per reader. The stream ends once every
/// reader has reached end of file, which normally means the process exited. It cannot be restarted; a new process gets a new stream.
#[derive(Debug)]
pub struct LineStream {
    rx: mpsc::Receiver<io::Result<String>>,
}

impl LineStream {
    /// Stream the lines of a single reader.
    pub fn from_reader<R>(reader: R, buffer: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer);
        spawn_pump(reader, tx);
        Self { rx }
    }

    /// Merge two readers (stdout and stderr) into one stream.
    ///
    /// Each reader keeps its own line order; lines from different readers
    /// interleave in arrival order.
    pub fn merged<A, B>(first: A, second: B, buffer: usize) -> Self
    where
        A: AsyncRead + Unpin + Send + 'static,
        B: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer);
        spawn_pump(first, tx.clone());
        spawn_pump(second, tx);
        Self { rx }
    }

    /// Wait for the next line. `None` marks end of stream.
    pub async fn next_line(&mut self) -> Option<io::Result<String>> {
        self.rx.recv().await
    }
}

impl futures_core::Stream for LineStream {
    type Item = io::Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

fn spawn_pump<R>(mut reader: R, tx: mpsc::Sender<io::Result<String>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut decoder = LineDecoder::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    for line in decoder.push(&chunk[..n]) {
                        tracing::trace!(%line, "Engine output");
                        if tx.send(Ok(line)).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }
        if let Some(line) = decoder.finish() {
            let _ = tx.send(Ok(line)).await;
        }
    });
}
