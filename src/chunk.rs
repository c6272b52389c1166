//! Paragraph-aware sliding-window chunker.
//!
//! Text is normalized, split into paragraphs on blank lines, and rejoined
//! with a `\n\n` separator into one working string. A window of
//! `target_size` characters slides across it; when the window would end in
//! the middle of a paragraph, the cut moves back to the nearest separator
//! within [`BOUNDARY_LOOKBACK`] characters. Consecutive windows share
//! `overlap` characters.
//!
//! All sizes are in characters, never bytes, so multi-byte text is never
//! split inside a code point.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use crate::extract::normalize_whitespace;

/// Separator placed between paragraphs in the working string.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// How far back from a window's right edge to look for a paragraph separator.
pub const BOUNDARY_LOOKBACK: usize = 200;

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// The working string and the character spans of every emitted window.
#[derive(Debug, Clone)]
pub struct Windows {
    pub joined: String,
    pub spans: Vec<Range<usize>>,
}

impl Windows {
    /// Text of one window, in characters of `joined`.
    pub fn slice(&self, span: &Range<usize>) -> String {
        self.joined
            .chars()
            .skip(span.start)
            .take(span.end - span.start)
            .collect()
    }
}

/// Smallest amount the window start advances per step.
pub fn minimum_step(target_size: usize) -> usize {
    (target_size / 10).max(1)
}

/// Splits `text` into overlapping, paragraph-aware chunks.
///
/// Every returned chunk is non-empty after trimming. Empty input yields no
/// chunks.
pub fn chunk_text(text: &str, target_size: usize, overlap: usize) -> Vec<String> {
    let windows = chunk_windows(text, target_size, overlap);
    let chars: Vec<char> = windows.joined.chars().collect();
    windows
        .spans
        .iter()
        .map(|span| chars[span.clone()].iter().collect::<String>())
        .map(|chunk| chunk.trim().to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

/// Computes the working string and window spans without materializing chunks.
pub fn chunk_windows(text: &str, target_size: usize, overlap: usize) -> Windows {
    let joined = join_paragraphs(&normalize_whitespace(text));
    let chars: Vec<char> = joined.chars().collect();
    let len = chars.len();
    let size = target_size.max(1);
    let min_step = minimum_step(size);

    let mut spans = Vec::new();
    let mut start = 0usize;
    while start < len {
        let mut end = (start + size).min(len);
        if end < len {
            if let Some(cut) = find_boundary(&chars, start, end, min_step) {
                end = cut;
            }
        }

        let has_content = chars[start..end].iter().any(|c| !c.is_whitespace());
        if has_content {
            spans.push(start..end);
        }

        if end >= len {
            break;
        }
        start = end.saturating_sub(overlap).max(start + min_step);
    }

    Windows { joined, spans }
}

fn join_paragraphs(normalized: &str) -> String {
    if normalized.is_empty() {
        return String::new();
    }
    let paragraphs: Vec<&str> = BLANK_LINE
        .split(normalized)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        return normalized.to_string();
    }
    paragraphs.join(PARAGRAPH_SEPARATOR)
}

/// Finds the start of the last `\n\n` inside `[start, end)` that lies within
/// the lookback distance of `end` and keeps at least `min_step` characters
/// in the window.
fn find_boundary(chars: &[char], start: usize, end: usize, min_step: usize) -> Option<usize> {
    let floor = (start + min_step).max(end.saturating_sub(BOUNDARY_LOOKBACK));
    let mut i = end.checked_sub(2)?;
    while i >= floor {
        if chars[i] == '\n' && chars[i + 1] == '\n' {
            return Some(i);
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }
    None
}
