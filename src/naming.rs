//! Output filename derivation.
//!
//! Uploaded filenames are untrusted: they may be empty, contain path
//! separators or shell metacharacters, or be arbitrarily long. Every output
//! name is derived through [`sanitize_base`], which is deterministic and
//! idempotent, then given the target extension.

/// Characters replaced by `-` in output names.
const FORBIDDEN: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// Maximum length of a sanitized base name, in characters.
const MAX_BASE_LEN: usize = 120;

/// Fallback base name when sanitization leaves nothing.
const DEFAULT_BASE: &str = "image";

/// Derive a safe base name from an untrusted original filename.
///
/// The original extension (if any) is discarded, forbidden characters become
/// `-`, whitespace runs collapse to a single `_`, and the result is truncated
/// to 120 characters. An empty result falls back to `"image"`.
pub fn sanitize_base(original: &str) -> String {
    // Drop the final extension. A leading dot is part of the name, not an
    // extension separator.
    let stem = match original.rfind('.') {
        Some(i) if i > 0 => &original[..i],
        _ => original,
    };

    let mut base = String::with_capacity(stem.len());
    let mut in_whitespace = false;
    for c in stem.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                base.push('_');
                in_whitespace = true;
            }
        } else {
            in_whitespace = false;
            base.push(if FORBIDDEN.contains(&c) { '-' } else { c });
        }
    }

    let base: String = base.chars().take(MAX_BASE_LEN).collect();
    if base.is_empty() {
        DEFAULT_BASE.to_string()
    } else {
        base
    }
}

/// Output filename for a successfully converted item.
pub fn output_name(original: &str) -> String {
    format!("{}.webp", sanitize_base(original))
}

/// Entry/part name standing in for a failed item.
pub fn error_marker_name(original: &str) -> String {
    format!("{}__ERROR.txt", sanitize_base(original))
}
