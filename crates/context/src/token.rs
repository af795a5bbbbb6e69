//! Token estimation and budget-aware truncation.
//!
//! Uses a character-based heuristic: ~4 characters per token. This
//! approximation is accurate within ~10% for BPE tokenizers on English
//! text; it has no relation to any provider's real tokenizer, and
//! consumers must tolerate meaningful error.

/// Characters per token. A tunable approximation, not a guaranteed bound.
pub const CHARS_PER_TOKEN: usize = 4;

/// Marker appended when text is cut mid-sentence.
pub const TRUNCATION_MARKER: &str = "…";

/// Fraction of the allowed span scanned backwards for a natural boundary.
const BOUNDARY_WINDOW: f32 = 0.2;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ `CHARS_PER_TOKEN` characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(CHARS_PER_TOKEN)
}

/// Largest index `<= at` that is a char boundary of `text`.
fn floor_boundary(text: &str, at: usize) -> usize {
    if at >= text.len() {
        return text.len();
    }
    let mut idx = at;
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Truncate text to fit a token budget.
///
/// A text that already fits is returned unchanged, which makes the
/// operation idempotent: re-truncating a truncated result is a no-op.
///
/// When the text must be cut, the cut lands at the nearest sentence
/// boundary inside the allowed character span — but only if that boundary
/// falls within the trailing ~20% of the span (cutting earlier would waste
/// too much budget). Failing that, the nearest word boundary in the same
/// window is used and the marker appended; failing both, the text is
/// hard-cut with the marker.
pub fn truncate_to_budget(text: &str, max_tokens: usize) -> String {
    let allowed = max_tokens * CHARS_PER_TOKEN;
    if text.len() <= allowed {
        return text.to_string();
    }
    if allowed <= TRUNCATION_MARKER.len() {
        return String::new();
    }

    let window_start = floor_boundary(text, allowed - (allowed as f32 * BOUNDARY_WINDOW) as usize);

    // Sentence boundary: a clean end, no marker needed.
    let span = &text[..floor_boundary(text, allowed)];
    if let Some(cut) = span.rfind(['.', '!', '?', '\n'])
        && cut >= window_start
    {
        return span[..=cut].trim_end().to_string();
    }

    // Word boundary: reserve room for the marker so the result still fits.
    let reserved = &text[..floor_boundary(text, allowed - TRUNCATION_MARKER.len())];
    if let Some(cut) = reserved.rfind(char::is_whitespace)
        && cut >= window_start
    {
        let mut out = reserved[..cut].trim_end().to_string();
        out.push_str(TRUNCATION_MARKER);
        return out;
    }

    // Hard cut.
    let mut out = reserved.to_string();
    out.push_str(TRUNCATION_MARKER);
    out
}
