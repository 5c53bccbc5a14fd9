//! HTML-to-plain-text conversion for message subjects and bodies.

use tracing::warn;

/// Line width handed to the renderer. Lines are re-joined afterwards, so this
/// only needs to be wide enough to avoid mid-word wrapping.
const RENDER_WIDTH: usize = 10_000;

#[derive(Debug, thiserror::Error)]
#[error("sanitization failed: {0}")]
pub struct SanitizeError(pub String);

/// Converts rich text to a single line of plain text.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, text: &str) -> Result<String, SanitizeError>;

    /// Sanitize, falling back to the original text on failure.
    fn clean(&self, text: &str) -> String {
        match self.sanitize(text) {
            Ok(clean) => clean,
            Err(e) => {
                warn!(error = %e, "Sanitizer failed, keeping original text");
                text.to_string()
            }
        }
    }
}

/// Renders HTML with `html2text`, then collapses whitespace runs to single spaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSanitizer;

impl Sanitizer for HtmlSanitizer {
    fn sanitize(&self, text: &str) -> Result<String, SanitizeError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let rendered = html2text::from_read(text.as_bytes(), RENDER_WIDTH)
            .map_err(|e| SanitizeError(e.to_string()))?;
        Ok(collapse_whitespace(&rendered))
    }
}

/// Replace every whitespace run with one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
