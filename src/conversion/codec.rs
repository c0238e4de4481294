//! WebP codec adapter.
//!
//! Wraps decode + re-encode behind a single synchronous call. Orientation
//! metadata is honored on every call so the output is visually upright even
//! when the source carries an EXIF rotation. CPU-heavy; callers are expected
//! to run this under `spawn_blocking`.

use std::io::Cursor;

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use webp::{Encoder, WebPConfig};

use crate::conversion::ConversionOptions;
use crate::error::{Error, Result};

/// Convert one raw image buffer to WebP under the given options.
///
/// Unsupported or corrupt input surfaces as [`Error::Encode`]; the adapter
/// never retries.
pub fn encode(raw: &[u8], opts: &ConversionOptions) -> Result<Vec<u8>> {
    let reader = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| Error::Encode(format!("unreadable input: {e}")))?;

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| Error::Encode(format!("unsupported or corrupt image: {e}")))?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut img = DynamicImage::from_decoder(decoder)
        .map_err(|e| Error::Encode(format!("decode failed: {e}")))?;
    img.apply_orientation(orientation);

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let config = build_config(opts)?;
    let encoded = Encoder::from_rgba(rgba.as_raw(), width, height)
        .encode_advanced(&config)
        .map_err(|e| Error::Encode(format!("WebP encoding failed: {e:?}")))?;

    Ok(encoded.to_vec())
}

fn build_config(opts: &ConversionOptions) -> Result<WebPConfig> {
    let mut config = WebPConfig::new()
        .map_err(|_| Error::Encode("failed to initialize WebP encoder configuration".into()))?;

    config.quality = f32::from(opts.quality);
    config.method = i32::from(opts.effort);

    if opts.lossless {
        // quality is accepted but has no encoding effect in lossless mode.
        config.lossless = 1;
    }
    if opts.near_lossless {
        // Near-lossless preprocessing rides on the lossless path; the level
        // reuses the quality knob.
        config.lossless = 1;
        config.near_lossless = i32::from(opts.quality);
    }
    if let Some(alpha) = opts.alpha_quality {
        config.alpha_quality = i32::from(alpha);
    }
    if opts.smart_subsample {
        config.use_sharp_yuv = 1;
    }

    Ok(config)
}
