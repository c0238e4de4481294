//! Webpforge - batch image to WebP conversion service
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod conversion;
pub mod error;
pub mod naming;
pub mod server;
pub mod streaming;

pub use error::{Error, Result};
