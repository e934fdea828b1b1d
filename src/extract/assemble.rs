//! Candidate resolution: from a pile of per-extractor proposals to one
//! record plus its confidence map and review warnings.
//!
//! Resolution is a stable sort by confidence (descending) with tier as the
//! tie-break, then first-writer-wins per field. Solution tags are a set, so
//! every proposed tag lands and the field's confidence is the best tag's.
//! The internal-domain scrub runs last as a terminal guarantee, whatever
//! upstream extractors let through.

use crate::normalize::truncate;
use crate::record::Field;
use crate::vocab::Vocabulary;

use super::{Candidate, Extraction, Tier};

/// Populated fields below this confidence get a review warning.
const WEAK_CONFIDENCE: u8 = 50;

/// Confidence assigned to a description synthesized from the raw body.
const FALLBACK_DESCRIPTION_CONFIDENCE: u8 = 25;

/// Longest synthesized description, in bytes.
const FALLBACK_DESCRIPTION_BYTES: usize = 400;

/// Fields a reviewable registration cannot do without.
const CRITICAL_FIELDS: [Field; 5] = [
    Field::TaFullName,
    Field::TaEmail,
    Field::TsdName,
    Field::CustomerCompanyName,
    Field::CustomerEmail,
];

pub fn assemble(mut candidates: Vec<Candidate>, text: &str, vocab: &Vocabulary) -> Extraction {
    let mut out = Extraction::default();

    // Stable, so equal (confidence, tier) pairs keep extractor order.
    candidates.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| a.tier.cmp(&b.tier))
    });

    for cand in candidates {
        if cand.value.trim().is_empty() {
            continue;
        }
        if cand.field == Field::Solutions {
            out.record.set(Field::Solutions, cand.value);
            let entry = out.confidence.entry(Field::Solutions).or_insert(0);
            *entry = (*entry).max(cand.confidence);
            continue;
        }
        if out.record.is_set(cand.field) {
            continue;
        }
        out.record.set(cand.field, cand.value.trim().to_string());
        out.confidence.insert(cand.field, cand.confidence.min(100));

        if cand.tier == Tier::Positional || cand.confidence < WEAK_CONFIDENCE {
            out.warnings
                .push(format!("{}: weak evidence, please verify", cand.field));
        }
    }

    if !out.record.is_set(Field::OpportunityDescription) && !text.trim().is_empty() {
        out.record.set(
            Field::OpportunityDescription,
            truncate(text.trim(), FALLBACK_DESCRIPTION_BYTES),
        );
        out.confidence
            .insert(Field::OpportunityDescription, FALLBACK_DESCRIPTION_CONFIDENCE);
        out.warnings.push(
            "opportunity_description: synthesized from the email body, needs human review"
                .to_string(),
        );
    }

    // Nothing upstream is trusted to have kept the internal domain out; the
    // synthesized description included.
    let scrubbed = out.record.scrub_internal(&vocab.internal_domain);
    for field in scrubbed {
        out.confidence.remove(&field);
        out.warnings.retain(|w| !w.starts_with(field.as_str()));
        out.warnings
            .push(format!("{field}: dropped internal-domain value"));
    }

    for field in CRITICAL_FIELDS {
        if !out.record.is_set(field) {
            out.warnings.push(format!("{field}: not found"));
        }
    }

    tracing::debug!(
        populated = out.confidence.len(),
        warnings = out.warnings.len(),
        "record assembled"
    );
    out
}
