//! Delimiter sniffing for TeX math fragments.
//!
//! Input files hold a single math fragment that may be wrapped in display
//! delimiters (`$$…$$`, `\[…\]`) or inline delimiters (`$…$`, `\(…\)`). The
//! normaliser strips the wrapper and reports which mode the fragment asked
//! for. Display delimiters are checked first. Unwrapped text passes through
//! untouched and renders in display mode.

use tracing::debug;

const TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::normalize");

const DISPLAY_DELIMITERS: [(&str, &str); 2] = [("$$", "$$"), ("\\[", "\\]")];
const INLINE_DELIMITERS: [(&str, &str); 2] = [("$", "$"), ("\\(", "\\)")];

/// Math source with its enclosing delimiters removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedContent {
    /// Fragment text without delimiters.
    pub text: String,
    /// Whether the fragment renders as display math.
    pub display_mode: bool,
}

impl NormalizedContent {
    fn new(text: &str, display_mode: bool) -> Self {
        Self {
            text: text.to_owned(),
            display_mode,
        }
    }
}

/// Strips math delimiters from `raw` and reports the requested mode.
///
/// The function is total: text without a recognised delimiter pair is
/// returned as-is (after trimming) with `display_mode` set.
pub fn normalize(raw: &str) -> NormalizedContent {
    let trimmed = raw.trim();

    if let Some(inner) = strip_any(trimmed, &DISPLAY_DELIMITERS) {
        return NormalizedContent::new(inner.trim(), true);
    }

    if !trimmed.starts_with("$$")
        && !trimmed.ends_with("$$")
        && let Some(inner) = strip_any(trimmed, &INLINE_DELIMITERS)
    {
        return NormalizedContent::new(inner.trim(), false);
    }

    debug!(
        target: TARGET,
        length = trimmed.len(),
        "no math delimiter recognised; defaulting to display mode"
    );
    NormalizedContent::new(trimmed, true)
}

fn strip_any<'a>(text: &'a str, pairs: &[(&str, &str)]) -> Option<&'a str> {
    pairs
        .iter()
        .find_map(|(open, close)| strip_pair(text, open, close))
}

fn strip_pair<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    // Opening and closing markers must not share characters.
    if text.len() < open.len() + close.len() {
        return None;
    }
    text.strip_prefix(open)?.strip_suffix(close)
}
