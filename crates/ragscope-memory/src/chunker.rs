//! Sentence-aware fixed-window text chunker.
//!
//! Windows are measured in characters, never bytes, so multi-byte text is
//! never split inside a code point.

/// Default window size in characters.
pub const DEFAULT_CHUNK_SIZE: i64 = 500;
/// Default overlap between consecutive windows.
pub const DEFAULT_OVERLAP: i64 = 60;
/// Windows are never smaller than this.
pub const MIN_CHUNK_SIZE: usize = 120;
/// A sentence break is only used if it falls past this share of the window.
const SENTENCE_BREAK_MIN_RATIO: f64 = 0.4;

/// Split `document` into overlapping windows.
///
/// Whitespace runs collapse to a single space. `chunk_size` is raised to at
/// least 120 and `overlap` is clamped to `[0, size / 2]`. A window that does
/// not reach the end of the text is cut just after its last `". "` when that
/// break lies beyond 40% of the window.
pub fn chunk_text(document: &str, chunk_size: i64, overlap: i64) -> Vec<String> {
    let text: Vec<char> = document
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .collect();
    if text.is_empty() {
        return Vec::new();
    }

    let size = usize::try_from(chunk_size)
        .unwrap_or(0)
        .max(MIN_CHUNK_SIZE);
    let overlap = usize::try_from(overlap).unwrap_or(0).min(size / 2);

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < text.len() {
        let mut end = (start + size).min(text.len());
        if end < text.len() {
            if let Some(split) = last_sentence_break(&text[start..end]) {
                if split as f64 > size as f64 * SENTENCE_BREAK_MIN_RATIO {
                    end = start + split + 1;
                }
            }
        }

        let window: String = text[start..end].iter().collect();
        chunks.push(window.trim().to_string());

        if end >= text.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }
    chunks
}

/// Index of the `.` in the last `". "` of `window`.
fn last_sentence_break(window: &[char]) -> Option<usize> {
    window
        .windows(2)
        .rposition(|pair| pair[0] == '.' && pair[1] == ' ')
}
