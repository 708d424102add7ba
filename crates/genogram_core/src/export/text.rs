//! Rich-text flattening and word wrap for export.
//!
//! # Responsibility
//! - Reduce text-box HTML to plain paragraphs.
//! - Break paragraphs into lines that fit a box width.
//!
//! # Invariants
//! - Output never contains markup; entities are decoded once.
//! - Wrapped lines never exceed the width unless a single character does.

use once_cell::sync::Lazy;
use regex::Regex;

/// Approximate glyph advance as a fraction of font size.
pub const CHAR_WIDTH_RATIO: f64 = 0.6;
pub const DEFAULT_FONT_SIZE: f64 = 12.0;
pub const LINE_HEIGHT_RATIO: f64 = 1.2;

static BLOCK_BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|h[1-6])\s*>").expect("valid block break regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static NUMERIC_ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid entity regex"));
static INLINE_WS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\r\u{a0}]+").expect("valid whitespace regex"));

/// Converts editor HTML into plain paragraphs separated by `\n`.
pub fn flatten_html(html: &str) -> String {
    let with_breaks = BLOCK_BREAK_RE.replace_all(html, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);
    decoded
        .split('\n')
        .map(|line| INLINE_WS_RE.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    // `&amp;` last so `&amp;lt;` decodes to the literal `&lt;`.
    numeric
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Wraps `text` to lines no wider than `width` at `font_size`.
///
/// Paragraph breaks are kept; empty paragraphs become empty lines.
pub fn wrap_text(text: &str, width: f64, font_size: f64) -> Vec<String> {
    let char_width = font_size * CHAR_WIDTH_RATIO;
    let max_chars = if char_width > 0.0 && width.is_finite() {
        ((width / char_width).floor() as usize).max(1)
    } else {
        usize::MAX
    };

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len <= max_chars {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
                continue;
            }
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if word_len <= max_chars {
                current.push_str(word);
                current_len = word_len;
                continue;
            }
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(max_chars).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    lines.push(piece.iter().collect());
                } else {
                    current = piece.iter().collect();
                    current_len = piece.len();
                }
            }
        }
        lines.push(current);
    }
    lines
}
