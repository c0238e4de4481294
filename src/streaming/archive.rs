//! Streaming zip archive writer.
//!
//! Entries are appended in completion order as conversions finish; a failed
//! item becomes a `<base>__ERROR.txt` entry carrying the failure message.
//! The archive trailer is only written by [`ArchiveStream::finalize`], after
//! every item has been appended.

use async_zip::tokio::write::ZipFileWriter;
use async_zip::{Compression, ZipEntryBuilder};
use chrono::Utc;
use tokio::io::AsyncWrite;

use crate::conversion::ConversionResult;
use crate::error::{Error, Result};

/// Attachment filename for an archive response.
pub fn archive_filename() -> String {
    format!("converted_{}.zip", Utc::now().format("%Y%m%d%H%M%S"))
}

/// Append-only zip writer over any async byte sink (in practice, one half of
/// a `tokio::io::duplex` feeding the response body).
pub struct ArchiveStream<W: AsyncWrite + Unpin> {
    writer: ZipFileWriter<W>,
}

impl<W: AsyncWrite + Unpin> ArchiveStream<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: ZipFileWriter::with_tokio(sink),
        }
    }

    /// Append one entry. A write failure here means the client is gone;
    /// the caller must stop appending and drop the stream.
    pub async fn append(&mut self, result: &ConversionResult) -> Result<()> {
        let (name, data): (&str, &[u8]) = match result {
            ConversionResult::Success {
                output_name,
                encoded,
            } => (output_name, encoded),
            ConversionResult::Failure {
                output_name,
                message,
            } => (output_name, message.as_bytes()),
        };

        let entry = ZipEntryBuilder::new(name.to_owned().into(), Compression::Deflate);
        self.writer
            .write_entry_whole(entry, data)
            .await
            .map_err(|e| Error::Transport(format!("archive append failed: {e}")))
    }

    /// Write the central directory and close the sink.
    pub async fn finalize(self) -> Result<()> {
        self.writer
            .close()
            .await
            .map(|_| ())
            .map_err(|e| Error::Transport(format!("archive finalize failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::io::{Cursor, Read};
    use tokio::io::AsyncReadExt;

    fn success(name: &str, data: &[u8]) -> ConversionResult {
        ConversionResult::Success {
            output_name: name.to_string(),
            encoded: Bytes::copy_from_slice(data),
        }
    }

    fn failure(name: &str, message: &str) -> ConversionResult {
        ConversionResult::Failure {
            output_name: name.to_string(),
            message: message.to_string(),
        }
    }

    async fn write_archive(results: Vec<ConversionResult>) -> Vec<u8> {
        let (sink, mut source) = tokio::io::duplex(64 * 1024);

        let writer = tokio::spawn(async move {
            let mut archive = ArchiveStream::new(sink);
            for result in &results {
                archive.append(result).await.unwrap();
            }
            archive.finalize().await.unwrap();
        });

        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes).await.unwrap();
        writer.await.unwrap();
        bytes
    }

    #[tokio::test]
    async fn mixed_batch_produces_one_entry_per_item() {
        let bytes = write_archive(vec![
            success("a.webp", b"AAAA"),
            failure("b__ERROR.txt", "decode failed: bad header"),
            success("c.webp", b"CCCC"),
        ])
        .await;

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);

        let names: Vec<String> = (0..3)
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["a.webp", "b__ERROR.txt", "c.webp"]);

        let mut error_text = String::new();
        archive
            .by_name("b__ERROR.txt")
            .unwrap()
            .read_to_string(&mut error_text)
            .unwrap();
        assert_eq!(error_text, "decode failed: bad header");

        let mut converted = Vec::new();
        archive
            .by_name("a.webp")
            .unwrap()
            .read_to_end(&mut converted)
            .unwrap();
        assert_eq!(converted, b"AAAA");
    }

    #[tokio::test]
    async fn empty_archive_is_still_well_formed() {
        let bytes = write_archive(vec![]).await;
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn archive_filename_shape() {
        let name = archive_filename();
        assert!(name.starts_with("converted_"));
        assert!(name.ends_with(".zip"));
    }
}
