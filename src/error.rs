//! Unified error type for the webpforge application.
//!
//! All failures funnel into [`Error`], which carries enough context for API
//! handlers to derive an HTTP status code via [`Error::http_status`].

/// Unified error type covering all failure modes in webpforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request data failed validation (no files, unknown output mode,
    /// malformed multipart body). Always rejected before any conversion.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An upload limit was violated while collecting the form.
    #[error("{}", .0.message())]
    UploadLimit(LimitKind),

    /// The codec could not convert an input buffer. Isolated per item in
    /// streaming modes; only surfaces as a response in single mode.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Writing to the client failed mid-stream. Terminal for the request,
    /// never surfaced as a structured body (headers are already sent).
    #[error("Transport error: {0}")]
    Transport(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::UploadLimit(_) => 400,
            Error::Encode(_) => 422,
            Error::Transport(_) => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code for JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::UploadLimit(kind) => kind.code(),
            Error::Encode(_) => "encode_error",
            Error::Transport(_) => "transport_error",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

/// The fixed set of upload-limit violations, each with a stable code and
/// message so clients can rely on exact values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// A single file exceeded the per-file byte limit.
    FileTooLarge,
    /// The request carried more files than allowed.
    TooManyFiles,
    /// A file's declared MIME type was not `image/*`.
    NotAnImage,
}

impl LimitKind {
    pub fn code(&self) -> &'static str {
        match self {
            LimitKind::FileTooLarge => "file_too_large",
            LimitKind::TooManyFiles => "too_many_files",
            LimitKind::NotAnImage => "not_an_image",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LimitKind::FileTooLarge => "File exceeds the per-file size limit",
            LimitKind::TooManyFiles => "Too many files in one request",
            LimitKind::NotAnImage => "Only image uploads are accepted",
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
