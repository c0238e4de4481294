//! Process configuration.
//!
//! The top-level [`Config`] is populated once from environment variables at
//! startup and treated as read-only for the lifetime of the process. Every
//! field defaults sensibly so an empty environment is valid.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    pub conversion: ConversionConfig,
}

impl Config {
    /// Build a `Config` from `WEBPFORGE_*` environment variables, falling
    /// back to defaults for anything absent or unparseable.
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("WEBPFORGE_HOST").unwrap_or_else(|_| default_host()),
                port: env_parse("WEBPFORGE_PORT", default_port()),
            },
            limits: LimitsConfig {
                max_files: env_parse("WEBPFORGE_MAX_FILES", default_max_files()),
                max_file_size_bytes: mb_to_bytes(env_parse(
                    "WEBPFORGE_MAX_FILE_SIZE_MB",
                    50usize,
                )),
            },
            conversion: ConversionConfig {
                default_quality: env_parse("WEBPFORGE_DEFAULT_QUALITY", default_quality()),
                default_effort: env_parse("WEBPFORGE_DEFAULT_EFFORT", default_effort()),
                concurrency: env_parse("WEBPFORGE_CONCURRENCY", default_concurrency()),
            },
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.limits.max_files == 0 {
            warnings.push("limits.max_files is 0; every upload will be rejected".into());
        }

        if self.conversion.concurrency == 0 {
            warnings.push("conversion.concurrency is 0; treated as 1".into());
        }

        if !(1..=100).contains(&self.conversion.default_quality) {
            warnings.push(format!(
                "conversion.default_quality {} is outside 1-100",
                self.conversion.default_quality
            ));
        }

        if self.conversion.default_effort > 6 {
            warnings.push(format!(
                "conversion.default_effort {} is outside 0-6",
                self.conversion.default_effort
            ));
        }

        warnings
    }
}

fn env_parse<T: FromStr + Copy + Display>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Megabytes to bytes, saturating: an absurd operator-supplied value caps
/// out instead of overflowing.
fn mb_to_bytes(mb: usize) -> usize {
    mb.saturating_mul(1024).saturating_mul(1024)
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Upload limits enforced while collecting the multipart form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of files accepted per request.
    pub max_files: usize,
    /// Maximum size of a single uploaded file in bytes.
    pub max_file_size_bytes: usize,
}

impl LimitsConfig {
    /// Upper bound for the whole request body: every file at its maximum
    /// size plus slack for multipart framing.
    pub fn request_body_limit(&self) -> usize {
        self.max_files
            .saturating_mul(self.max_file_size_bytes)
            .saturating_add(64 * 1024)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_size_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Conversion defaults and the process-wide codec concurrency knob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// WebP quality used when the caller supplies none (1-100).
    pub default_quality: u8,
    /// Encoder effort used when the caller supplies none (0-6).
    pub default_effort: u8,
    /// How many codec invocations may run at once, across all requests.
    pub concurrency: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_quality: default_quality(),
            default_effort: default_effort(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_max_files() -> usize {
    50
}
fn default_quality() -> u8 {
    80
}
fn default_effort() -> u8 {
    4
}
fn default_concurrency() -> usize {
    2
}
