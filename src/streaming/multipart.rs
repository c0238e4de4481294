//! Streaming multipart/mixed writer.
//!
//! One part per item, written strictly in input order: multipart clients
//! process parts sequentially and expect positional correspondence with the
//! upload order. Successful items carry the encoded image; failed items
//! carry the failure message as a plain-text part.

use rand::Rng;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::conversion::ConversionResult;
use crate::error::{Error, Result};

/// Generate a fresh 32-character hex boundary token.
pub fn random_boundary() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// `Content-Type` header value for a response using `boundary`.
pub fn multipart_content_type(boundary: &str) -> String {
    format!("multipart/mixed; boundary={boundary}")
}

/// Append-only multipart writer over any async byte sink.
pub struct MultipartStream<W: AsyncWrite + Unpin> {
    sink: W,
    boundary: String,
}

impl<W: AsyncWrite + Unpin> MultipartStream<W> {
    pub fn new(sink: W, boundary: String) -> Self {
        Self { sink, boundary }
    }

    /// Write one part: boundary delimiter, headers with the exact body byte
    /// count, blank line, body, trailing CRLF.
    pub async fn write_part(&mut self, result: &ConversionResult) -> Result<()> {
        let (content_type, name, body): (&str, &str, &[u8]) = match result {
            ConversionResult::Success {
                output_name,
                encoded,
            } => ("image/webp", output_name, encoded),
            ConversionResult::Failure {
                output_name,
                message,
            } => ("text/plain; charset=utf-8", output_name, message.as_bytes()),
        };

        let head = format!(
            "--{}\r\nContent-Type: {}\r\nContent-Disposition: attachment; filename=\"{}\"\r\nContent-Length: {}\r\n\r\n",
            self.boundary,
            content_type,
            name,
            body.len()
        );

        self.sink.write_all(head.as_bytes()).await.map_err(transport)?;
        self.sink.write_all(body).await.map_err(transport)?;
        self.sink.write_all(b"\r\n").await.map_err(transport)
    }

    /// Write the closing delimiter and shut the sink down.
    pub async fn finalize(mut self) -> Result<()> {
        let closing = format!("--{}--\r\n", self.boundary);
        self.sink
            .write_all(closing.as_bytes())
            .await
            .map_err(transport)?;
        self.sink.shutdown().await.map_err(transport)
    }
}

fn transport(e: std::io::Error) -> Error {
    Error::Transport(e.to_string())
}
