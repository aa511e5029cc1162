//! Byte-stream transport to the engine
//!
//! One textual command goes out per request; one JSON array comes back.
//! The reader accumulates bytes until a complete top-level array has
//! arrived, so replies are framed without any length prefix.

use crate::core::types::{ScanError, ScanResult};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Any duplex byte stream works: a Unix socket in production, an in-memory
/// duplex pipe in tests.
pub trait EngineIo: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> EngineIo for T {}

/// Default cap on a single reply frame
pub const DEFAULT_MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

pub struct EngineTransport {
    io: Box<dyn EngineIo>,
    buf: Vec<u8>,
    max_frame_len: usize,
    round_trips: u64,
}

impl EngineTransport {
    pub fn new(io: impl EngineIo + 'static) -> Self {
        Self::with_max_frame_len(io, DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(io: impl EngineIo + 'static, max_frame_len: usize) -> Self {
        EngineTransport {
            io: Box::new(io),
            buf: Vec::new(),
            max_frame_len,
            round_trips: 0,
        }
    }

    /// Connects to the engine's Unix socket
    #[cfg(unix)]
    pub async fn connect_unix(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        let stream = tokio::net::UnixStream::connect(path).await?;
        Ok(Self::new(stream))
    }

    /// Total send/receive round-trips issued on this connection.
    ///
    /// A skipped watch tick must leave this untouched.
    pub fn round_trips(&self) -> u64 {
        self.round_trips
    }

    /// Sends one command and receives its reply frame
    pub async fn round_trip(&mut self, request: &str) -> ScanResult<Vec<u8>> {
        self.round_trips += 1;
        self.io.write_all(request.as_bytes()).await?;
        self.io.flush().await?;
        self.recv_frame().await
    }

    async fn recv_frame(&mut self) -> ScanResult<Vec<u8>> {
        loop {
            if let Some(end) = scan_frame(&self.buf)? {
                let rest = self.buf.split_off(end);
                let frame = std::mem::replace(&mut self.buf, rest);
                return Ok(frame);
            }
            if self.buf.len() > self.max_frame_len {
                return Err(ScanError::protocol(format!(
                    "reply frame exceeds {} bytes",
                    self.max_frame_len
                )));
            }
            let n = self.io.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(ScanError::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "engine closed the connection",
                )));
            }
        }
    }
}

/// Finds the end (exclusive) of one complete top-level JSON array, if the
/// buffer holds one. String contents and escapes are skipped, so brackets
/// inside values never confuse the count.
fn scan_frame(buf: &[u8]) -> ScanResult<Option<usize>> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut started = false;

    for (i, &b) in buf.iter().enumerate() {
        if !started {
            if b.is_ascii_whitespace() {
                continue;
            }
            if b != b'[' {
                return Err(ScanError::protocol(format!(
                    "reply does not start with an array (byte {:#04x})",
                    b
                )));
            }
            started = true;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(Some(i + 1));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}
