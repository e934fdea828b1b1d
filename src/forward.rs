//! Forward-chain unwrapping.
//!
//! Forwarded sales emails bury the true sender under one or more layers of
//! "Forwarded message" banners. This module walks the normalized text for
//! known banner shapes and recovers the header trio of the deepest layer —
//! the earliest message in the chain, which is the one that identifies the
//! real originating party rather than whichever staff member forwarded it
//! last. The body itself is never modified; extractors still see every
//! layer.
//!
//! Banner shapes, tried in order (first shape with any match wins):
//! 1. Gmail / Apple Mail banner line followed by a `From:` header block
//! 2. Outlook block: `From:` with `Sent:`/`Date:` and `Subject:` nearby
//! 3. Bare `From:` line (with `Subject:` picked up when present)

use std::sync::LazyLock;

use regex::Regex;

/// How many lines below a `From:` line its companion headers may sit.
const HEADER_WINDOW: usize = 6;

/// How many lines above a `From:` line a banner may sit.
const BANNER_WINDOW: usize = 3;

static RE_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:-{3,}\s*Forwarded message\s*-{3,}|Begin forwarded message:|-{3,}\s*Original Message\s*-{3,})")
        .unwrap()
});

static RE_FROM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^>?\s*From:\s*(.+)$").unwrap());

static RE_SENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^>?\s*(?:Sent|Date):\s*\S").unwrap());

static RE_SUBJECT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^>?\s*Subject:\s*(.+)$").unwrap());

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

// ── ForwardHeader ───────────────────────────────────────────────────────

/// Best-effort header trio recovered from a forward chain.
///
/// All fields are `None` when no banner shape matches — a weaker starting
/// point for assembly, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardHeader {
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub subject: Option<String>,
}

impl ForwardHeader {
    /// Whether anything at all was recovered.
    pub fn is_empty(&self) -> bool {
        self.sender_name.is_none() && self.sender_email.is_none() && self.subject.is_none()
    }
}

// ── Internal candidate model ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BannerShape {
    Banner,
    Outlook,
    BareFrom,
}

struct HeaderBlock {
    shape: BannerShape,
    line_idx: usize,
    header: ForwardHeader,
}

// ── unwrap_forward ──────────────────────────────────────────────────────

/// Recover the originating sender and subject from a forward chain.
pub fn unwrap_forward(text: &str) -> ForwardHeader {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks: Vec<HeaderBlock> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some(caps) = RE_FROM_LINE.captures(line) else {
            continue;
        };
        let (sender_name, sender_email) = parse_mailbox(caps[1].trim());
        if sender_name.is_none() && sender_email.is_none() {
            continue;
        }

        let window_end = (idx + 1 + HEADER_WINDOW).min(lines.len());
        let window = &lines[idx + 1..window_end];
        let has_sent = window.iter().any(|l| RE_SENT_LINE.is_match(l));
        let subject = window
            .iter()
            .find_map(|l| RE_SUBJECT_LINE.captures(l))
            .map(|c| c[1].trim().to_string())
            .filter(|s| !s.is_empty());

        let banner_above = lines[idx.saturating_sub(BANNER_WINDOW)..idx]
            .iter()
            .any(|l| RE_BANNER.is_match(l));

        let shape = if banner_above {
            BannerShape::Banner
        } else if has_sent && subject.is_some() {
            BannerShape::Outlook
        } else {
            BannerShape::BareFrom
        };

        blocks.push(HeaderBlock {
            shape,
            line_idx: idx,
            header: ForwardHeader {
                sender_name,
                sender_email,
                subject,
            },
        });
    }

    // First shape (in pattern order) with any match; within the shape the
    // deepest block in the text is the earliest message in the chain.
    for shape in [BannerShape::Banner, BannerShape::Outlook, BannerShape::BareFrom] {
        if let Some(block) = blocks
            .iter()
            .filter(|b| b.shape == shape)
            .max_by_key(|b| b.line_idx)
        {
            tracing::debug!(
                shape = ?block.shape,
                line = block.line_idx,
                "forward header recovered"
            );
            return block.header.clone();
        }
    }

    ForwardHeader::default()
}

// ── parse_mailbox ───────────────────────────────────────────────────────

/// Split a `From:` remainder into display name and address.
///
/// Accepts `Name <addr>`, bare `addr`, and `addr (Name)` forms.
pub fn parse_mailbox(raw: &str) -> (Option<String>, Option<String>) {
    let email = RE_EMAIL.find(raw).map(|m| m.as_str().to_ascii_lowercase());

    let name = if let Some(angle) = raw.find('<') {
        Some(raw[..angle].trim().trim_matches('"').to_string())
    } else if let (Some(open), Some(close)) = (raw.find('('), raw.rfind(')')) {
        (open < close).then(|| raw[open + 1..close].trim().to_string())
    } else if email.is_some() {
        // Remainder was just the address.
        None
    } else {
        Some(raw.trim().trim_matches('"').to_string())
    };

    let name = name.filter(|n| !n.is_empty() && !n.contains('@'));
    (name, email)
}
