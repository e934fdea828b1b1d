//! Opportunity sizing: agent-count bucket, implementation timeline,
//! solution tags, and monetary value.
//!
//! Counts and timelines are never stored raw — every extracted number or
//! phrase snaps to one of a small fixed set of bucket labels. Bucket lists
//! are ordered smallest to largest and the first matching bucket wins, so
//! a phrase that could read as two ranges resolves low.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::Field;
use crate::vocab::Vocabulary;

use super::labels::{LabeledLine, find};
use super::{Candidate, Tier};

// ── Agent-count buckets ─────────────────────────────────────────────────

/// Inclusive agent-count ranges and their bucket labels.
pub const AGENT_BUCKETS: &[(u32, u32, &str)] = &[
    (1, 99, "1 to 99"),
    (100, 249, "100 to 249"),
    (250, 499, "250 to 499"),
    (500, 999, "500 to 999"),
    (1000, 2499, "1000 to 2499"),
    (2500, u32::MAX, "2500 or more"),
];

/// Snap a raw agent count to its bucket label.
pub fn bucket_agent_count(n: u32) -> Option<&'static str> {
    AGENT_BUCKETS
        .iter()
        .find(|(lo, hi, _)| (*lo..=*hi).contains(&n))
        .map(|(_, _, label)| *label)
}

/// "about 2,000 seats", "300 reps", "450+ agents", "75 concurrent users".
static RE_AGENT_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b([0-9][0-9,]{0,6})\s*\+?\s*(?:agents?|seats?|reps?|users?|concurrent|positions?)\b",
    )
    .unwrap()
});

static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9][0-9,]{0,6})").unwrap());

const AGENT_LABELS: &[&str] = &[
    "agents",
    "agent count",
    "number of agents",
    "# of agents",
    "seats",
    "seat count",
    "users",
    "headcount",
];

fn parse_count(raw: &str) -> Option<u32> {
    raw.replace(',', "").parse().ok()
}

// ── Timeline buckets ────────────────────────────────────────────────────

/// Implementation-timeline bucket labels, smallest to largest.
pub const TIMELINE_BUCKETS: &[&str] = &[
    "0 to 3 months",
    "3 to 6 months",
    "6 to 12 months",
    "more than 12 months",
];

/// "in 2 months", "3-6 months", "within 90 days", "6 weeks".
static RE_TIMELINE_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})(?:\s*(?:to|-|–)\s*(\d{1,3}))?\s*(months?|weeks?|days?)\b")
        .unwrap()
});

/// Keyword phrases per bucket, evaluated smallest bucket first.
const TIMELINE_KEYWORDS: &[(&str, usize)] = &[
    ("asap", 0),
    ("immediately", 0),
    ("right away", 0),
    ("this month", 0),
    ("next month", 0),
    ("this quarter", 0),
    ("end of quarter", 0),
    ("next quarter", 1),
    ("this year", 1),
    ("second half", 2),
    ("by year end", 2),
    ("end of year", 2),
    ("next year", 3),
    ("long term", 3),
];

const TIMELINE_LABELS: &[&str] = &[
    "timeline",
    "implementation timeline",
    "timeframe",
    "go live",
    "go-live",
    "decision timeframe",
    "install date",
];

/// Snap a timeline phrase to a bucket label, or `None` when nothing in
/// the text reads as a timeline.
pub fn bucket_timeline(text: &str) -> Option<&'static str> {
    if let Some(caps) = RE_TIMELINE_SPAN.captures(text) {
        let a: u32 = caps[1].replace(',', "").parse().ok()?;
        let b: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(a);
        let unit = caps[3].to_ascii_lowercase();
        let months = if unit.starts_with("month") {
            a.max(b)
        } else if unit.starts_with("week") {
            a.max(b).div_ceil(4)
        } else {
            a.max(b).div_ceil(30)
        };
        let idx = if months <= 3 {
            0
        } else if months <= 6 {
            1
        } else if months <= 12 {
            2
        } else {
            3
        };
        return Some(TIMELINE_BUCKETS[idx]);
    }

    let lower = text.to_ascii_lowercase();
    TIMELINE_KEYWORDS
        .iter()
        .find(|(kw, _)| lower.contains(kw))
        .map(|(_, idx)| TIMELINE_BUCKETS[*idx])
}

// ── Deal value ──────────────────────────────────────────────────────────

/// "$120,000", "USD 45k/mo", "$1.2M per year".
static RE_MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\$|usd\s?)\s*\d[\d,]*(?:\.\d+)?\s*(?:k|mm?|million|thousand)?\b(?:\s*(?:/|per\s+)(?:mo(?:nth)?|yr|year|annum))?",
    )
    .unwrap()
});

// ── Solutions ───────────────────────────────────────────────────────────

const SOLUTION_LABELS: &[&str] = &[
    "solution",
    "solutions",
    "product",
    "products",
    "services",
    "interested in",
];

// ── Extract ─────────────────────────────────────────────────────────────

/// Run every opportunity extractor. `text` includes the subject line when
/// one is available; `lines` is the labeled-line scan of the body.
pub fn extract(text: &str, lines: &[LabeledLine], vocab: &Vocabulary) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    // Agent count: labeled value first, body phrase as pattern fallback.
    if let Some(raw) = find(lines, AGENT_LABELS) {
        if let Some(bucket) = RE_NUMBER
            .captures(raw)
            .and_then(|c| parse_count(&c[1]))
            .and_then(bucket_agent_count)
        {
            candidates.push(Candidate::new(Field::AgentCount, bucket, 80, Tier::Label));
        }
    }
    if let Some(caps) = RE_AGENT_PHRASE.captures(text) {
        if let Some(bucket) = parse_count(&caps[1]).and_then(bucket_agent_count) {
            candidates.push(Candidate::new(Field::AgentCount, bucket, 55, Tier::Pattern));
        }
    }

    // Implementation timeline.
    if let Some(raw) = find(lines, TIMELINE_LABELS) {
        if let Some(bucket) = bucket_timeline(raw) {
            candidates.push(Candidate::new(
                Field::ImplementationTimeline,
                bucket,
                78,
                Tier::Label,
            ));
        }
    }
    if let Some(bucket) = bucket_timeline(text) {
        candidates.push(Candidate::new(
            Field::ImplementationTimeline,
            bucket,
            50,
            Tier::Pattern,
        ));
    }

    // Deal value as written. Labeled "Deal value:" lines are copied by the
    // label table; this is the body-wide pattern fallback.
    if let Some(m) = RE_MONEY.find(text) {
        candidates.push(Candidate::new(
            Field::DealValue,
            m.as_str().trim(),
            60,
            Tier::Pattern,
        ));
    }

    // Solution tags: a labeled solutions line scores higher than a
    // body-wide keyword hit.
    if let Some(raw) = find(lines, SOLUTION_LABELS) {
        for tag in vocab.match_solutions(raw) {
            candidates.push(Candidate::new(Field::Solutions, tag, 85, Tier::Vocabulary));
        }
    }
    for tag in vocab.match_solutions(text) {
        candidates.push(Candidate::new(Field::Solutions, tag, 70, Tier::Vocabulary));
    }

    // Distributor mentioned anywhere in the body (label tier handles
    // "TSD:" lines; this catches "sourced via Telarus" prose).
    if let Some(name) = vocab.match_distributor(text) {
        candidates.push(Candidate::new(Field::TsdName, name, 65, Tier::Vocabulary));
    }

    candidates
}
