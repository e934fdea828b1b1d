//! Rule-based email-to-record extraction.
//!
//! The pipeline is a fixed sequence of pure stages: normalize the raw body,
//! unwrap the forward chain, run every field extractor over the full text,
//! then let the assembler resolve candidates by priority. All heuristics
//! share one rule-priority ladder rather than per-field ad hoc code paths:
//!
//! - **Label** — a recognized "Label: value" line (confidence 75–85)
//! - **Vocabulary** — known distributor/solution strings anywhere in the
//!   text (confidence 60–90)
//! - **Pattern** — domain-tuned regexes: buckets, currency, addresses,
//!   phones, emails (confidence 30–65)
//! - **Positional** — first-email-is-partner style fallbacks (35–50),
//!   always flagged as weak
//!
//! Extraction never fails: an empty or hopeless body yields an all-null
//! record plus warnings.

pub mod address;
pub mod assemble;
pub mod contacts;
pub mod labels;
pub mod opportunity;

use serde::{Deserialize, Serialize};

use crate::forward::unwrap_forward;
use crate::normalize::normalize;
use crate::record::{ConfidenceMap, ExtractedRecord, Field};
use crate::vocab::Vocabulary;

// ── Candidate model ─────────────────────────────────────────────────────

/// Which rung of the rule-priority ladder produced a candidate.
/// Order matters: earlier tiers win confidence ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Label,
    Vocabulary,
    Pattern,
    Positional,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Label => write!(f, "label"),
            Self::Vocabulary => write!(f, "vocabulary"),
            Self::Pattern => write!(f, "pattern"),
            Self::Positional => write!(f, "positional"),
        }
    }
}

/// One extractor's proposal for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub field: Field,
    pub value: String,
    /// 0–100, within the tier's band.
    pub confidence: u8,
    pub tier: Tier,
}

impl Candidate {
    pub fn new(field: Field, value: impl Into<String>, confidence: u8, tier: Tier) -> Self {
        Candidate {
            field,
            value: value.into(),
            confidence,
            tier,
        }
    }
}

// ── Extraction result ───────────────────────────────────────────────────

/// Output contract of every extraction strategy (rule-based or LLM).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub record: ExtractedRecord,
    /// Sparse field → confidence (0–100). Keys always refer to populated
    /// fields.
    pub confidence: ConfidenceMap,
    /// Human-readable notes for the reviewing staff member.
    pub warnings: Vec<String>,
}

// ── Entry point ─────────────────────────────────────────────────────────

/// Extract a deal-registration record from a raw email body.
///
/// `sender_email`/`sender_display` are the envelope sender as received
/// (often a forwarding staff member on the internal domain — such senders
/// are used only as a signal that the true originator must be recovered
/// from the forward chain, never copied into the record). `subject` is the
/// envelope subject line.
///
/// Deterministic and pure: the same inputs always produce the same record,
/// confidence map, and warnings.
pub fn extract(
    raw_body: &str,
    sender_email: Option<&str>,
    sender_display: Option<&str>,
    subject: Option<&str>,
    vocab: &Vocabulary,
) -> Extraction {
    let text = normalize(raw_body);
    if text.is_empty() {
        tracing::debug!("empty body after normalization");
        return assemble::assemble(Vec::new(), "", vocab);
    }

    let header = unwrap_forward(&text);
    let lines = labels::scan(&text);

    // Solutions also hide in subject lines ("Fwd: CCaaS opp - Acme").
    let scan_text = match subject.or(header.subject.as_deref()) {
        Some(subj) => format!("{subj}\n{text}"),
        None => text.clone(),
    };

    let mut candidates = Vec::new();
    candidates.extend(labels::extract(&lines, vocab));
    candidates.extend(contacts::extract(
        &text,
        &header,
        sender_email,
        sender_display,
        vocab,
    ));
    candidates.extend(opportunity::extract(&scan_text, &lines, vocab));
    candidates.extend(address::extract(&text, &lines));

    tracing::debug!(candidates = candidates.len(), "extraction candidates gathered");
    assemble::assemble(candidates, &text, vocab)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_returns_null_record_with_warnings() {
        let vocab = Vocabulary::builtin();
        let out = extract("", None, None, None, &vocab);
        assert_eq!(out.record, ExtractedRecord::default());
        assert!(out.confidence.is_empty());
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        let vocab = Vocabulary::builtin();
        let body = "Partner: Amy Lane <amy@resellers.io>\n\
                    Customer: Derek Foster, Pinnacle Retail Group\n\
                    Seats: about 2000\n\
                    They want a cloud contact center via Telarus.";
        let a = extract(body, Some("sarah@internal.example"), None, None, &vocab);
        let b = extract(body, Some("sarah@internal.example"), None, None, &vocab);
        assert_eq!(a, b);
    }

    #[test]
    fn confidence_keys_always_point_at_populated_fields() {
        let vocab = Vocabulary::builtin();
        let body = "From: Jess <jess@partner.net>\n\
                    Subject: reg\n\
                    Customer: Acme Corp\n\
                    Timeline: 2 months\n\
                    About 300 reps, CCaaS and analytics.";
        let out = extract(body, None, None, None, &vocab);
        for (field, _) in &out.confidence {
            assert!(out.record.is_set(*field), "{field} has confidence but no value");
        }
    }

    #[test]
    fn tier_ordering() {
        assert!(Tier::Label < Tier::Vocabulary);
        assert!(Tier::Vocabulary < Tier::Pattern);
        assert!(Tier::Pattern < Tier::Positional);
    }
}
