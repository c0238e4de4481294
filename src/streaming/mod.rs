//! Streaming response writers.
//!
//! Both writers are append-only sinks fed by the bounded mapper: results are
//! written out as conversions complete, so the response never holds the whole
//! batch in memory. Appends happen from the single task driving the mapper
//! drain, which is what preserves ordering and framing.

pub mod archive;
pub mod multipart;

pub use archive::{archive_filename, ArchiveStream};
pub use multipart::{multipart_content_type, random_boundary, MultipartStream};
