//! Batch conversion types and response strategy selection.

pub mod codec;
pub mod mapper;
pub mod options;

use bytes::Bytes;

use crate::error::{Error, Result};

pub use options::{ConversionOptions, RawOptions};

/// One uploaded image, owned by the request for its lifetime.
#[derive(Debug, Clone)]
pub struct InputItem {
    /// Filename as declared by the uploader. Untrusted.
    pub original_name: String,
    /// Raw upload bytes. Never mutated after upload parsing.
    pub bytes: Bytes,
    /// MIME type as declared by the uploader.
    pub mime_type: String,
}

/// Outcome of converting one [`InputItem`]. Exactly one result per item,
/// in the same order.
#[derive(Debug, Clone)]
pub enum ConversionResult {
    Success {
        /// Sanitized filename with the `.webp` extension.
        output_name: String,
        /// Encoded WebP bytes.
        encoded: Bytes,
    },
    Failure {
        /// Sanitized base name with the `__ERROR.txt` marker suffix.
        output_name: String,
        /// Human-readable failure description.
        message: String,
    },
}

impl ConversionResult {
    pub fn output_name(&self) -> &str {
        match self {
            ConversionResult::Success { output_name, .. } => output_name,
            ConversionResult::Failure { output_name, .. } => output_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResult::Success { .. })
    }
}

/// Which response shape owns the result stream for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// One encoded file in the response body.
    Single,
    /// Streamed zip archive, one entry per item.
    Archive,
    /// Streamed multipart/mixed body, one part per item.
    Multipart,
}

impl ResponseMode {
    /// Pick the response shape from the caller's `output` hint and the item
    /// count. Evaluated once per request, before any conversion starts, so an
    /// unknown hint fails fast with no wasted codec work.
    pub fn select(hint: Option<&str>, item_count: usize) -> Result<Self> {
        match hint.unwrap_or("auto") {
            "zip" => Ok(ResponseMode::Archive),
            "multipart" => Ok(ResponseMode::Multipart),
            "auto" => {
                if item_count == 1 {
                    Ok(ResponseMode::Single)
                } else {
                    Ok(ResponseMode::Archive)
                }
            }
            other => Err(Error::Validation(format!(
                "unknown output mode '{other}' (expected auto, zip, or multipart)"
            ))),
        }
    }
}
