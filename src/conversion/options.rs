//! Caller-supplied conversion parameters.
//!
//! Raw query values arrive as strings and are resolved into a fully-populated
//! [`ConversionOptions`] record. Resolution never fails: out-of-range or
//! non-numeric input silently falls back to the configured default, so a
//! sloppy caller still gets a conversion rather than a 400.

use serde::Deserialize;

use crate::config::ConversionConfig;

/// Query parameters of `POST /convert`, as received. Everything is an
/// `Option<String>` so that malformed values degrade to defaults during
/// resolution instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOptions {
    /// Response mode hint: `auto` (default), `zip`, or `multipart`.
    pub output: Option<String>,
    pub quality: Option<String>,
    pub lossless: Option<String>,
    #[serde(rename = "nearLossless")]
    pub near_lossless: Option<String>,
    #[serde(rename = "alphaQuality")]
    pub alpha_quality: Option<String>,
    pub effort: Option<String>,
    #[serde(rename = "smartSubsample")]
    pub smart_subsample: Option<String>,
}

/// Validated conversion parameters, immutable once resolved and shared
/// read-only across every item in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionOptions {
    /// WebP quality, 1-100. Ignored by the encoder when `lossless` is set
    /// but always present and valid in the record.
    pub quality: u8,
    pub lossless: bool,
    pub near_lossless: bool,
    /// Alpha channel quality, 0-100. `None` means "unset": not passed to
    /// the codec at all.
    pub alpha_quality: Option<u8>,
    /// Encoder effort, 0-6.
    pub effort: u8,
    /// Use sharp YUV subsampling.
    pub smart_subsample: bool,
}

impl ConversionOptions {
    /// Resolve raw query values against the configured defaults.
    pub fn resolve(raw: &RawOptions, defaults: &ConversionConfig) -> Self {
        Self {
            quality: clamp_int(raw.quality.as_deref(), 1, 100, defaults.default_quality),
            lossless: parse_bool(raw.lossless.as_deref()),
            near_lossless: parse_bool(raw.near_lossless.as_deref()),
            alpha_quality: parse_optional_int(raw.alpha_quality.as_deref(), 100),
            effort: clamp_int(raw.effort.as_deref(), 0, 6, defaults.default_effort),
            smart_subsample: parse_bool(raw.smart_subsample.as_deref()),
        }
    }
}

/// Parse an integer field. Values above `max` clamp down to it; values below
/// `min`, non-numeric input, and absence all resolve to `default`.
fn clamp_int(raw: Option<&str>, min: u8, max: u8, default: u8) -> u8 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|v| *v >= i64::from(min))
        .map(|v| v.min(i64::from(max)) as u8)
        .unwrap_or(default)
}

/// Parse an integer field with no default: anything unparseable resolves to
/// "unset".
fn parse_optional_int(raw: Option<&str>, max: u8) -> Option<u8> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|v| *v >= 0)
        .map(|v| v.min(i64::from(max)) as u8)
}

/// `1`, `true`, `yes`, and `on` (case-insensitive) are true; everything
/// else, including absence, is false.
fn parse_bool(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("1") | Some("true") | Some("yes") | Some("on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ConversionConfig {
        ConversionConfig::default()
    }

    fn resolve(raw: RawOptions) -> ConversionOptions {
        ConversionOptions::resolve(&raw, &defaults())
    }

    #[test]
    fn empty_query_resolves_to_defaults() {
        let opts = resolve(RawOptions::default());
        assert_eq!(opts.quality, 80);
        assert!(!opts.lossless);
        assert!(!opts.near_lossless);
        assert_eq!(opts.alpha_quality, None);
        assert_eq!(opts.effort, 4);
        assert!(!opts.smart_subsample);
    }

    #[test]
    fn quality_clamp_grid() {
        // Below the minimum falls back to the default.
        let opts = resolve(RawOptions {
            quality: Some("0".into()),
            ..Default::default()
        });
        assert_eq!(opts.quality, 80);

        // Above the maximum clamps down.
        let opts = resolve(RawOptions {
            quality: Some("150".into()),
            ..Default::default()
        });
        assert_eq!(opts.quality, 100);

        // Non-numeric falls back to the default.
        let opts = resolve(RawOptions {
            quality: Some("abc".into()),
            ..Default::default()
        });
        assert_eq!(opts.quality, 80);

        // In range passes through.
        let opts = resolve(RawOptions {
            quality: Some("57".into()),
            ..Default::default()
        });
        assert_eq!(opts.quality, 57);
    }

    #[test]
    fn effort_accepts_zero() {
        let opts = resolve(RawOptions {
            effort: Some("0".into()),
            ..Default::default()
        });
        assert_eq!(opts.effort, 0);

        let opts = resolve(RawOptions {
            effort: Some("9".into()),
            ..Default::default()
        });
        assert_eq!(opts.effort, 6);
    }

    #[test]
    fn bool_spellings() {
        for spelling in ["1", "true", "TRUE", "yes", "Yes", "on", "ON"] {
            let opts = resolve(RawOptions {
                lossless: Some(spelling.into()),
                ..Default::default()
            });
            assert!(opts.lossless, "{spelling} should be true");
        }
        for spelling in ["0", "false", "no", "off", "banana", ""] {
            let opts = resolve(RawOptions {
                lossless: Some(spelling.into()),
                ..Default::default()
            });
            assert!(!opts.lossless, "{spelling} should be false");
        }
    }

    #[test]
    fn lossless_still_carries_a_valid_quality() {
        let opts = resolve(RawOptions {
            lossless: Some("true".into()),
            quality: Some("57".into()),
            ..Default::default()
        });
        assert!(opts.lossless);
        assert_eq!(opts.quality, 57);
    }

    #[test]
    fn alpha_quality_has_no_default() {
        let opts = resolve(RawOptions::default());
        assert_eq!(opts.alpha_quality, None);

        let opts = resolve(RawOptions {
            alpha_quality: Some("garbage".into()),
            ..Default::default()
        });
        assert_eq!(opts.alpha_quality, None);

        let opts = resolve(RawOptions {
            alpha_quality: Some("0".into()),
            ..Default::default()
        });
        assert_eq!(opts.alpha_quality, Some(0));

        let opts = resolve(RawOptions {
            alpha_quality: Some("300".into()),
            ..Default::default()
        });
        assert_eq!(opts.alpha_quality, Some(100));
    }

    #[test]
    fn custom_defaults_are_respected() {
        let defaults = ConversionConfig {
            default_quality: 65,
            default_effort: 2,
            concurrency: 2,
        };
        let opts = ConversionOptions::resolve(&RawOptions::default(), &defaults);
        assert_eq!(opts.quality, 65);
        assert_eq!(opts.effort, 2);
    }
}
