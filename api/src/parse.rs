//! Best-effort extraction of structured values from free-form model output.
//!
//! The generation provider has no structured-output guarantee: replies arrive
//! as plain text, often wrapped in a markdown code fence. The only recovery
//! applied here is fence stripping — everything else that fails a strict
//! decode is `Unparseable`, and the caller owns the fallback value.

use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The output did not decode into the requested shape. Carries the raw
    /// text so callers can build degraded summaries from it.
    #[error("model output was not parseable as the requested shape")]
    Unparseable { raw: String },
}

/// Strip a leading code-fence line and a trailing fence, trim whitespace,
/// then strictly decode the remainder into `T`.
pub fn extract<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|_| ExtractError::Unparseable {
        raw: raw.to_string(),
    })
}

/// Remove a surrounding markdown code fence, with or without a language tag.
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the remainder of the fence line (e.g. a "json" language tag).
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}
