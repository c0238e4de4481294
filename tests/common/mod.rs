//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] wrapping a fully-constructed [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing, plus helpers for building in-memory image fixtures.

use std::net::SocketAddr;

use webpforge::config::Config;
use webpforge::server::{create_router, AppContext};

/// Test harness wrapping the shared application context.
pub struct TestHarness {
    pub ctx: AppContext,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            ctx: AppContext::new(config),
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::serve(Self::new()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        Self::serve(Self::with_config(config)).await
    }

    async fn serve(harness: Self) -> (Self, SocketAddr) {
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

/// Encode a small solid-color PNG entirely in memory.
pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("failed to encode test PNG");
    out.into_inner()
}

/// Build a multipart part for the `images` field with an `image/png` type.
pub fn image_part(name: &str, bytes: Vec<u8>) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes)
        .file_name(name.to_string())
        .mime_str("image/png")
        .expect("invalid test mime")
}
