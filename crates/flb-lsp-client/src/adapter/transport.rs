//! Stdio transport layer with LSP header framing.
//!
//! LSP uses a simple framing protocol over stdio:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};
use tokio::process::{ChildStdin, ChildStdout};

use super::error::TransportError;

/// Reads and writes LSP-framed messages over a pair of byte streams.
///
/// The defaults are the child process pipes; tests substitute in-memory
/// duplex streams.
pub struct StdioTransport<R = ChildStdout, W = ChildStdin> {
    reader: BufReader<R>,
    writer: BufWriter<W>,
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a new transport from the server's output and input streams.
    #[must_use]
    pub fn new(stdout: R, stdin: W) -> Self {
        Self {
            reader: BufReader::new(stdout),
            writer: BufWriter::new(stdin),
        }
    }

    /// Sends an LSP-framed message.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if writing to the process fails.
    pub async fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        let header = format!("Content-Length: {}\r\n\r\n", message.len());
        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(message).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receives an LSP-framed message, suspending until it is complete.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::MissingContentLength` or
    /// `TransportError::InvalidContentLength` for a bad header block,
    /// `TransportError::Closed` at end of stream, and `TransportError::Io`
    /// if reading fails.
    pub async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        let content_length = self.read_headers().await?;
        let mut content = vec![0u8; content_length];
        self.reader.read_exact(&mut content).await?;
        Ok(content)
    }

    /// Flushes and closes the writing half so the server observes EOF.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if the final flush fails.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.writer.shutdown().await?;
        Ok(())
    }

    async fn read_headers(&mut self) -> Result<usize, TransportError> {
        let mut content_length: Option<usize> = None;

        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Err(TransportError::Closed);
            }

            let header = line.trim_end();
            if header.is_empty() {
                break;
            }

            // Only the length matters; Content-Type and friends are skipped.
            if let Some((name, value)) = header.split_once(':')
                && name.trim().eq_ignore_ascii_case("content-length")
            {
                let value = value.trim();
                let length = value
                    .parse()
                    .map_err(|_| TransportError::InvalidContentLength {
                        value: value.to_owned(),
                    })?;
                content_length = Some(length);
            }
        }

        content_length.ok_or(TransportError::MissingContentLength)
    }
}
