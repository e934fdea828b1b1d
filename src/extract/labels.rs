//! Explicit-label extraction: the top rung of the rule ladder.
//!
//! One generic pass turns the text into `label: value` lines; one
//! rule-priority table maps recognized labels onto record fields. Labels
//! that name a whole entity ("Partner:", "Customer:", "TSD contact:") are
//! split into their name/email/company parts here rather than in separate
//! per-pattern code paths.

use std::sync::LazyLock;

use regex::Regex;

use crate::forward::parse_mailbox;
use crate::record::Field;
use crate::vocab::Vocabulary;

use super::{Candidate, Tier};

/// Generic labeled line: optional bullet, short label, colon, value.
static RE_LABELED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-*•>\s]*([A-Za-z][A-Za-z0-9 #/.'&]{0,39}?)\s*[:：]\s*(.+)$").unwrap()
});

// ── Scan ────────────────────────────────────────────────────────────────

/// A `label: value` line found in the text. Labels are lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledLine {
    pub label: String,
    pub value: String,
}

/// Collect every labeled line in document order.
pub fn scan(text: &str) -> Vec<LabeledLine> {
    text.lines()
        .filter_map(|line| {
            let caps = RE_LABELED_LINE.captures(line)?;
            let value = caps[2].trim().to_string();
            if value.is_empty() {
                return None;
            }
            Some(LabeledLine {
                label: caps[1].trim().to_ascii_lowercase(),
                value,
            })
        })
        .collect()
}

/// First value whose label matches any of `labels` (already lowercase).
pub fn find<'a>(lines: &'a [LabeledLine], labels: &[&str]) -> Option<&'a str> {
    lines
        .iter()
        .find(|l| labels.contains(&l.label.as_str()))
        .map(|l| l.value.as_str())
}

// ── Rule table ──────────────────────────────────────────────────────────

/// What a recognized label maps onto.
#[derive(Debug, Clone, Copy)]
enum Target {
    /// Straight copy of the value into one field.
    Scalar(Field),
    /// "Partner: Name <email>" — name + optional email.
    Partner,
    /// "TSD contact: Name <email>" — contact name + optional email.
    TsdContact,
    /// "TSD: <distributor>" — must resolve against the vocabulary.
    TsdName,
    /// "Customer: [Person,] Company [<email>]".
    CustomerLine,
    /// "Contact: First Last[, Title] [<email>]".
    ContactPerson,
}

struct LabelRule {
    labels: &'static [&'static str],
    target: Target,
    confidence: u8,
}

/// The label table. First rule whose label set contains the line's label
/// wins; order encodes specificity (e.g. "partner email" before "email").
const LABEL_RULES: &[LabelRule] = &[
    LabelRule {
        labels: &["partner email", "agent email", "advisor email"],
        target: Target::Scalar(Field::TaEmail),
        confidence: 85,
    },
    LabelRule {
        labels: &["partner phone", "agent phone", "advisor phone"],
        target: Target::Scalar(Field::TaPhone),
        confidence: 80,
    },
    LabelRule {
        labels: &["partner company", "partner company name", "agency", "agency name"],
        target: Target::Scalar(Field::TaCompanyName),
        confidence: 80,
    },
    LabelRule {
        labels: &[
            "partner",
            "partner name",
            "agent",
            "agent name",
            "advisor",
            "trusted advisor",
            "referred by",
            "referring partner",
        ],
        target: Target::Partner,
        confidence: 82,
    },
    LabelRule {
        labels: &["tsd email", "tsd contact email", "distributor email"],
        target: Target::Scalar(Field::TsdContactEmail),
        confidence: 82,
    },
    LabelRule {
        labels: &["tsd contact", "distributor contact", "channel manager", "tsd rep"],
        target: Target::TsdContact,
        confidence: 80,
    },
    LabelRule {
        labels: &["tsd", "tsd name", "distributor", "master agent"],
        target: Target::TsdName,
        confidence: 85,
    },
    LabelRule {
        labels: &["customer email", "contact email", "email", "email address"],
        target: Target::Scalar(Field::CustomerEmail),
        confidence: 78,
    },
    LabelRule {
        labels: &["customer phone", "contact phone", "phone", "phone number", "direct line"],
        target: Target::Scalar(Field::CustomerPhone),
        confidence: 76,
    },
    LabelRule {
        labels: &[
            "company",
            "company name",
            "customer company",
            "organization",
            "business name",
        ],
        target: Target::Scalar(Field::CustomerCompanyName),
        confidence: 80,
    },
    LabelRule {
        labels: &[
            "customer",
            "customer name",
            "end user",
            "end customer",
            "client",
            "account",
            "account name",
        ],
        target: Target::CustomerLine,
        confidence: 78,
    },
    LabelRule {
        labels: &[
            "contact",
            "contact name",
            "customer contact",
            "poc",
            "point of contact",
            "primary contact",
        ],
        target: Target::ContactPerson,
        confidence: 78,
    },
    LabelRule {
        labels: &["title", "job title", "role", "position"],
        target: Target::Scalar(Field::CustomerJobTitle),
        confidence: 76,
    },
    LabelRule {
        labels: &["address", "street", "street address"],
        target: Target::Scalar(Field::CustomerStreet),
        confidence: 78,
    },
    LabelRule {
        labels: &["city"],
        target: Target::Scalar(Field::CustomerCity),
        confidence: 78,
    },
    LabelRule {
        labels: &["state", "province"],
        target: Target::Scalar(Field::CustomerState),
        confidence: 78,
    },
    LabelRule {
        labels: &["zip", "zip code", "postal code"],
        target: Target::Scalar(Field::CustomerZip),
        confidence: 78,
    },
    LabelRule {
        labels: &["country"],
        target: Target::Scalar(Field::CustomerCountry),
        confidence: 78,
    },
    LabelRule {
        labels: &[
            "deal value",
            "opportunity value",
            "estimated value",
            "est value",
            "value",
            "mrr",
            "monthly spend",
            "budget",
        ],
        target: Target::Scalar(Field::DealValue),
        confidence: 82,
    },
    LabelRule {
        labels: &[
            "description",
            "notes",
            "details",
            "summary",
            "use case",
            "opportunity description",
        ],
        target: Target::Scalar(Field::OpportunityDescription),
        confidence: 75,
    },
];

// ── Extract ─────────────────────────────────────────────────────────────

/// Apply the label table to the scanned lines.
pub fn extract(lines: &[LabeledLine], vocab: &Vocabulary) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for line in lines {
        let Some(rule) = LABEL_RULES
            .iter()
            .find(|r| r.labels.contains(&line.label.as_str()))
        else {
            continue;
        };

        match rule.target {
            Target::Scalar(field) => {
                candidates.push(Candidate::new(field, &line.value, rule.confidence, Tier::Label));
            }
            Target::Partner => {
                let (name, email) = parse_mailbox(&line.value);
                if let Some(name) = name {
                    candidates.push(Candidate::new(
                        Field::TaFullName,
                        name,
                        rule.confidence,
                        Tier::Label,
                    ));
                }
                if let Some(email) = email {
                    candidates.push(Candidate::new(
                        Field::TaEmail,
                        email,
                        rule.confidence + 3,
                        Tier::Label,
                    ));
                }
            }
            Target::TsdContact => {
                let (name, email) = parse_mailbox(&line.value);
                if let Some(name) = name {
                    candidates.push(Candidate::new(
                        Field::TsdContactName,
                        name,
                        rule.confidence,
                        Tier::Label,
                    ));
                }
                if let Some(email) = email {
                    candidates.push(Candidate::new(
                        Field::TsdContactEmail,
                        email,
                        rule.confidence + 4,
                        Tier::Label,
                    ));
                }
            }
            Target::TsdName => {
                // The distributor field is enumerated: a labeled value that
                // does not resolve against the vocabulary stays null.
                if let Some(canonical) = vocab.match_distributor(&line.value) {
                    candidates.push(Candidate::new(
                        Field::TsdName,
                        canonical,
                        rule.confidence,
                        Tier::Label,
                    ));
                }
            }
            Target::CustomerLine => {
                candidates.extend(customer_line(&line.value, rule.confidence));
            }
            Target::ContactPerson => {
                candidates.extend(contact_person(&line.value, rule.confidence));
            }
        }
    }

    candidates
}

/// "Customer: [Person,] Company" splitting. A short alphabetic left side
/// before a comma reads as a person; the remainder is the company. Without
/// a comma the whole value is the company name.
fn customer_line(value: &str, confidence: u8) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let (_, email) = parse_mailbox(value);
    let value = strip_mailbox(value);

    let (person, company) = match value.split_once(',') {
        Some((left, right)) if looks_like_person(left.trim()) && !right.trim().is_empty() => {
            (Some(left.trim()), right.trim())
        }
        _ => (None, value.trim()),
    };

    if let Some(person) = person {
        candidates.extend(person_candidates(person, confidence));
    }
    if !company.is_empty() {
        candidates.push(Candidate::new(
            Field::CustomerCompanyName,
            company,
            confidence,
            Tier::Label,
        ));
    }
    if let Some(email) = email {
        candidates.push(Candidate::new(
            Field::CustomerEmail,
            email,
            confidence + 4,
            Tier::Label,
        ));
    }
    candidates
}

/// "Contact: First Last[, Title]" splitting.
fn contact_person(value: &str, confidence: u8) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let (_, email) = parse_mailbox(value);
    let value = strip_mailbox(value);

    let (person, title) = match value.split_once(',') {
        Some((left, right)) => (left.trim(), Some(right.trim())),
        None => (value.trim(), None),
    };

    candidates.extend(person_candidates(person, confidence));
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        candidates.push(Candidate::new(
            Field::CustomerJobTitle,
            title,
            confidence.saturating_sub(3),
            Tier::Label,
        ));
    }
    if let Some(email) = email {
        candidates.push(Candidate::new(
            Field::CustomerEmail,
            email,
            confidence + 4,
            Tier::Label,
        ));
    }
    candidates
}

/// Split a person's display name into first/last candidates.
fn person_candidates(person: &str, confidence: u8) -> Vec<Candidate> {
    let mut parts = person.split_whitespace();
    let Some(first) = parts.next() else {
        return Vec::new();
    };
    let rest = parts.collect::<Vec<_>>().join(" ");

    let mut candidates = vec![Candidate::new(
        Field::CustomerFirstName,
        first,
        confidence,
        Tier::Label,
    )];
    if !rest.is_empty() {
        candidates.push(Candidate::new(
            Field::CustomerLastName,
            rest,
            confidence,
            Tier::Label,
        ));
    }
    candidates
}

/// Drop a trailing `<addr@domain>` (or bare address) from a value.
fn strip_mailbox(value: &str) -> &str {
    match value.find('<') {
        Some(pos) => value[..pos].trim_end(),
        None => value.trim(),
    }
}

/// Up to four words, letters/periods/hyphens/apostrophes only.
fn looks_like_person(s: &str) -> bool {
    let words: Vec<&str> = s.split_whitespace().collect();
    !words.is_empty()
        && words.len() <= 4
        && words.iter().all(|w| {
            w.chars()
                .all(|c| c.is_alphabetic() || matches!(c, '.' | '\'' | '-'))
        })
}
