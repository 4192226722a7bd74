//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token.
//! This approximation is accurate within ~10% for BPE tokenizers on
//! English text, which is close enough for the prompt-size budget that
//! halts a trial and for sizing the last-attempt reflection.

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(4)
}

/// Estimate tokens for a sequence of lines joined by newlines.
pub fn estimate_lines_tokens(lines: &[String]) -> usize {
    if lines.is_empty() {
        return 0;
    }
    let chars: usize = lines.iter().map(String::len).sum::<usize>() + lines.len() - 1;
    chars.div_ceil(4)
}
