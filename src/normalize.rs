//! Text normalization for raw email bodies.
//!
//! Forwarded sales emails arrive as plain text or HTML, often both mangled
//! by several mail clients in a row. Normalization strips markup, decodes
//! the common entities, and collapses whitespace so the field extractors
//! see one predictable form. Pure function, no error conditions: empty in,
//! empty out.

use std::sync::LazyLock;

use regex::Regex;

/// `<script>`/`<style>` blocks including their content.
static RE_DROP_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").unwrap()
});

/// Tags that imply a line break in rendered mail. Replaced with `\n`
/// before generic tag stripping so labeled lines survive HTML bodies.
static RE_BREAK_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:br\s*/?|/p|/div|/tr|/li|/h[1-6]|/table)>").unwrap()
});

/// Any remaining tag.
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());

/// An angle-bracketed span that is an RFC-style mailbox, not markup.
/// `From: Name <addr@domain>` lines must survive tag stripping intact.
static RE_ADDR_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}>$").unwrap()
});

/// Numeric character references, decimal (`&#65;`) or hex (`&#x41;`).
static RE_NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]{1,6}|[0-9]{1,7});").unwrap());

/// Runs of spaces/tabs within a line.
static RE_INLINE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\x{a0}]+").unwrap());

/// Runs of blank lines.
static RE_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Named entities that actually occur in forwarded mail.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&ndash;", "-"),
    ("&mdash;", "-"),
];

/// Normalize a raw email body (plain text or HTML) into clean text.
///
/// Line structure is preserved — label extraction depends on "Label: value"
/// staying on one line — but inline whitespace runs collapse to single
/// spaces and blank-line runs collapse to one blank line.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let text = RE_DROP_BLOCKS.replace_all(raw, "");
    let text = RE_BREAK_TAGS.replace_all(&text, "\n");
    let text = RE_TAG.replace_all(&text, |caps: &regex::Captures<'_>| {
        if RE_ADDR_SPAN.is_match(&caps[0]) {
            caps[0].to_string()
        } else {
            " ".to_string()
        }
    });
    let text = decode_entities(&text);
    let text = RE_INLINE_WS.replace_all(&text, " ");

    // Trim each line, then collapse blank-line runs.
    let joined: String = text
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    RE_BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}

/// Decode named and numeric HTML entities.
fn decode_entities(text: &str) -> String {
    let mut out = text.to_string();
    for (entity, replacement) in NAMED_ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, replacement);
        }
    }
    RE_NUMERIC_ENTITY
        .replace_all(&out, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            let code = if let Some(hex) = body.strip_prefix('x') {
                u32::from_str_radix(hex, 16).ok()
            } else {
                body.parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        })
        .into_owned()
}

/// Truncate to at most `max_bytes` bytes on a char boundary, appending "...".
pub fn truncate(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut result = s[..end].trim_end().to_string();
    result.push_str("...");
    result
}
