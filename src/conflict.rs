//! Field-level conflict detection between the reviewed snapshot and a
//! partner's form submission.
//!
//! Only fields present in the submission are ever considered; the snapshot
//! is compared key-by-key against what the partner actually sent. A
//! difference where the snapshot already held a real value is a conflict
//! for a human to arbitrate. A difference against an empty snapshot slot is
//! a silent fill. Either way the submitted value wins in the merged map —
//! conflicts annotate, they never block.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{FieldMap, is_empty_value};

// ── Conflict model ──────────────────────────────────────────────────────

/// One field where the partner's submission contradicts the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub field: String,
    /// What the reviewing staff member had approved.
    pub admin_value: Value,
    /// What the partner submitted.
    pub partner_value: Value,
}

/// Result of merging a submission into a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Snapshot overlaid with every submitted value.
    pub merged: FieldMap,
    /// Fields needing human arbitration, in field-name order.
    pub conflicts: Vec<Conflict>,
}

impl MergeReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

// ── Detection ───────────────────────────────────────────────────────────

/// Diff a partner submission against the reviewed snapshot.
///
/// Keys absent from `submitted` are untouched and can never conflict, so a
/// partner form that omits a field leaves the admin's value standing.
pub fn detect_conflicts(snapshot: &FieldMap, submitted: &FieldMap) -> MergeReport {
    let mut merged = snapshot.clone();
    let mut conflicts = Vec::new();

    for (field, partner_value) in submitted {
        let admin_value = snapshot.get(field).cloned().unwrap_or(Value::Null);

        if !values_equal(&admin_value, partner_value) && !is_empty_value(&admin_value) {
            conflicts.push(Conflict {
                field: field.clone(),
                admin_value,
                partner_value: partner_value.clone(),
            });
        }
        merged.insert(field.clone(), partner_value.clone());
    }

    tracing::debug!(conflicts = conflicts.len(), "submission merged");
    MergeReport { merged, conflicts }
}

/// Value equality with two forgiving rules: all empty forms (null, blank
/// string, empty array) are interchangeable, and string arrays compare as
/// sets so reordered solution tags are not a conflict.
fn values_equal(a: &Value, b: &Value) -> bool {
    if is_empty_value(a) && is_empty_value(b) {
        return true;
    }
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => {
            let mut xs: Vec<&Value> = xs.iter().collect();
            let mut ys: Vec<&Value> = ys.iter().collect();
            xs.sort_by_key(|v| v.to_string());
            ys.sort_by_key(|v| v.to_string());
            xs == ys
        }
        (Value::String(x), Value::String(y)) => x.trim() == y.trim(),
        _ => a == b,
    }
}

// ── Intake lifecycle ────────────────────────────────────────────────────

/// Where a registration sits between arrival and CRM conversion.
///
/// `Converted` and `Discarded` are terminal; nothing here transitions out
/// of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum IntakeStatus {
    /// Extracted, waiting for staff review.
    Pending,
    /// Reviewed by staff; a partner submission has been merged.
    Reviewed { has_conflicts: bool },
    /// Conflict-free and complete enough to convert.
    Convertible,
    Converted,
    Discarded,
}

impl IntakeStatus {
    /// Status after merging a partner submission into a reviewed record.
    pub fn after_submission(report: &MergeReport) -> Self {
        if report.has_conflicts() {
            IntakeStatus::Reviewed {
                has_conflicts: true,
            }
        } else {
            IntakeStatus::Convertible
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn differing_emails_conflict() {
        let snapshot = map(&[("customer_email", json!("a@x.com"))]);
        let submitted = map(&[("customer_email", json!("b@x.com"))]);

        let report = detect_conflicts(&snapshot, &submitted);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].field, "customer_email");
        assert_eq!(report.conflicts[0].admin_value, json!("a@x.com"));
        assert_eq!(report.conflicts[0].partner_value, json!("b@x.com"));
        // Submitted value still wins in the merge.
        assert_eq!(report.merged["customer_email"], json!("b@x.com"));
    }

    #[test]
    fn filling_an_empty_slot_is_silent() {
        let snapshot = map(&[("tsd_contact_name", Value::Null)]);
        let submitted = map(&[("tsd_contact_name", json!("Jane Doe"))]);

        let report = detect_conflicts(&snapshot, &submitted);
        assert!(report.conflicts.is_empty());
        assert_eq!(report.merged["tsd_contact_name"], json!("Jane Doe"));
    }

    #[test]
    fn blank_string_and_empty_array_count_as_empty() {
        let snapshot = map(&[
            ("customer_city", json!("  ")),
            ("solutions", json!([])),
        ]);
        let submitted = map(&[
            ("customer_city", json!("Austin")),
            ("solutions", json!(["CCaaS"])),
        ]);
        let report = detect_conflicts(&snapshot, &submitted);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn omitted_fields_never_conflict() {
        let snapshot = map(&[
            ("customer_email", json!("a@x.com")),
            ("customer_city", json!("Austin")),
        ]);
        let submitted = map(&[("customer_city", json!("Dallas"))]);

        let report = detect_conflicts(&snapshot, &submitted);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].field, "customer_city");
        // The omitted email keeps the admin's value.
        assert_eq!(report.merged["customer_email"], json!("a@x.com"));
    }

    #[test]
    fn reordered_string_arrays_are_equal() {
        let snapshot = map(&[("solutions", json!(["CCaaS", "UCaaS"]))]);
        let submitted = map(&[("solutions", json!(["UCaaS", "CCaaS"]))]);
        let report = detect_conflicts(&snapshot, &submitted);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn changed_array_contents_conflict() {
        let snapshot = map(&[("solutions", json!(["CCaaS"]))]);
        let submitted = map(&[("solutions", json!(["CCaaS", "Analytics"]))]);
        let report = detect_conflicts(&snapshot, &submitted);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.merged["solutions"], json!(["CCaaS", "Analytics"]));
    }

    #[test]
    fn partner_clearing_a_value_conflicts() {
        let snapshot = map(&[("customer_phone", json!("555-123-4567"))]);
        let submitted = map(&[("customer_phone", Value::Null)]);
        let report = detect_conflicts(&snapshot, &submitted);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.merged["customer_phone"], Value::Null);
    }

    #[test]
    fn identical_values_do_not_conflict() {
        let snapshot = map(&[("customer_email", json!("a@x.com"))]);
        let report = detect_conflicts(&snapshot, &snapshot.clone());
        assert!(report.conflicts.is_empty());
        assert_eq!(report.merged, snapshot);
    }

    #[test]
    fn status_follows_the_merge_report() {
        let clean = MergeReport {
            merged: FieldMap::new(),
            conflicts: Vec::new(),
        };
        assert_eq!(
            IntakeStatus::after_submission(&clean),
            IntakeStatus::Convertible
        );

        let conflicted = MergeReport {
            merged: FieldMap::new(),
            conflicts: vec![Conflict {
                field: "customer_email".to_string(),
                admin_value: json!("a@x.com"),
                partner_value: json!("b@x.com"),
            }],
        };
        assert_eq!(
            IntakeStatus::after_submission(&conflicted),
            IntakeStatus::Reviewed {
                has_conflicts: true
            }
        );
    }

    #[test]
    fn status_serializes_with_tag() {
        let json = serde_json::to_value(IntakeStatus::Reviewed {
            has_conflicts: false,
        })
        .unwrap();
        assert_eq!(json, json!({"status": "reviewed", "has_conflicts": false}));
    }
}
