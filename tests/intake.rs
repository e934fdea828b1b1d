//! End-to-end intake flows: forwarded email in, structured record out,
//! submission diff, and the LLM degradation path.

use std::time::Duration;

use serde_json::{Value, json};

use deal_intake::conflict::{IntakeStatus, detect_conflicts};
use deal_intake::extract::{Extraction, extract};
use deal_intake::llm::{ExtractStrategy, LlmExtractor, RuleBased};
use deal_intake::record::{ExtractedRecord, Field, FieldMap};
use deal_intake::vocab::Vocabulary;

const FORWARDED_REGISTRATION: &str = "\
Team, routing this one for review.

---------- Forwarded message ---------
From: Jessica Hernandez <jhernandez@partner.net>
Date: Tue, Mar 3, 2026 at 9:14 AM
Subject: New contact center opportunity
To: deals@internal.example

Hi all,

Registering a new opportunity through Telarus.

Customer: Derek Foster, Pinnacle Retail Group
Email: derek.foster@pinnacleretail.com
Phone: (512) 555-0142
Address: 1420 Commerce Blvd
Austin, TX 78701

They run about 2000 seats today on an aging on-prem call center and
want a cloud contact center with speech analytics. Timeline: 3-6 months.
Budget: $85k/mo.

Thanks,
Jessica
";

fn vocab() -> Vocabulary {
    Vocabulary::builtin()
}

fn run(body: &str, sender: Option<&str>) -> Extraction {
    extract(body, sender, None, None, &vocab())
}

fn assert_no_internal_leak(out: &Extraction) {
    let map = out.record.to_field_map();
    for (field, value) in &map {
        if let Value::String(s) = value {
            assert!(
                !s.to_ascii_lowercase().contains("internal.example"),
                "{field} leaked the internal domain: {s}"
            );
        }
    }
}

// ── Extraction ──────────────────────────────────────────────────────────

#[test]
fn forwarded_registration_end_to_end() {
    let out = run(FORWARDED_REGISTRATION, Some("sarah@internal.example"));

    assert_eq!(out.record.ta_full_name.as_deref(), Some("Jessica Hernandez"));
    assert_eq!(out.record.ta_email.as_deref(), Some("jhernandez@partner.net"));
    assert_eq!(out.record.tsd_name.as_deref(), Some("Telarus"));

    assert!(out
        .record
        .customer_company_name
        .as_deref()
        .unwrap()
        .contains("Pinnacle Retail Group"));
    assert_eq!(out.record.customer_first_name.as_deref(), Some("Derek"));
    assert_eq!(out.record.customer_last_name.as_deref(), Some("Foster"));
    assert_eq!(
        out.record.customer_email.as_deref(),
        Some("derek.foster@pinnacleretail.com")
    );
    assert_eq!(out.record.customer_street.as_deref(), Some("1420 Commerce Blvd"));
    assert_eq!(out.record.customer_city.as_deref(), Some("Austin"));
    assert_eq!(out.record.customer_state.as_deref(), Some("TX"));
    assert_eq!(out.record.customer_zip.as_deref(), Some("78701"));

    assert_eq!(out.record.agent_count.as_deref(), Some("1000 to 2499"));
    assert_eq!(
        out.record.implementation_timeline.as_deref(),
        Some("3 to 6 months")
    );
    assert!(out.record.solutions.contains(&"CCaaS".to_string()));
    assert!(out.record.solutions.contains(&"Analytics".to_string()));
    assert!(out.record.deal_value.as_deref().unwrap().contains("$85k"));

    assert_no_internal_leak(&out);
}

#[test]
fn internal_domain_never_appears_in_any_field() {
    let bodies = [
        FORWARDED_REGISTRATION,
        "From: ops@internal.example\nCustomer email: sarah@internal.example",
        "Contact sarah@internal.example or jess@partner.net about this deal.",
    ];
    for body in bodies {
        let out = run(body, Some("sarah@internal.example"));
        assert_no_internal_leak(&out);
    }
}

#[test]
fn confidence_keys_only_reference_populated_fields() {
    let out = run(FORWARDED_REGISTRATION, Some("sarah@internal.example"));
    assert!(!out.confidence.is_empty());
    for (field, score) in &out.confidence {
        assert!(out.record.is_set(*field), "{field} scored but unset");
        assert!(*score <= 100);
    }
}

#[test]
fn extraction_is_idempotent() {
    let a = run(FORWARDED_REGISTRATION, Some("sarah@internal.example"));
    let b = run(FORWARDED_REGISTRATION, Some("sarah@internal.example"));
    assert_eq!(a, b);
}

#[test]
fn seat_phrases_snap_to_buckets() {
    let out = run("They have about 2000 seats.", None);
    assert_eq!(out.record.agent_count.as_deref(), Some("1000 to 2499"));

    let out = run("A team of 300 reps needs dialers.", None);
    assert_eq!(out.record.agent_count.as_deref(), Some("250 to 499"));
}

#[test]
fn hopeless_body_still_yields_a_reviewable_result() {
    let out = run("hey can we talk tomorrow?", None);
    // Description falls back to the body; everything else stays null.
    assert!(out.record.opportunity_description.is_some());
    assert!(out.record.ta_email.is_none());
    assert!(out.warnings.iter().any(|w| w.contains("ta_email")));
    assert!(out.warnings.iter().any(|w| w.contains("needs human review")));
}

#[test]
fn empty_body_yields_null_record() {
    let out = run("", None);
    assert_eq!(out.record, ExtractedRecord::default());
    assert!(out.confidence.is_empty());
    assert!(!out.warnings.is_empty());
}

// ── Conflict engine ─────────────────────────────────────────────────────

#[test]
fn differing_submission_flags_a_conflict() {
    let mut snapshot = FieldMap::new();
    snapshot.insert("customer_email".to_string(), json!("a@x.com"));

    let mut submitted = FieldMap::new();
    submitted.insert("customer_email".to_string(), json!("b@x.com"));

    let report = detect_conflicts(&snapshot, &submitted);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].field, "customer_email");
    assert_eq!(report.merged["customer_email"], json!("b@x.com"));
    assert_eq!(
        IntakeStatus::after_submission(&report),
        IntakeStatus::Reviewed { has_conflicts: true }
    );
}

#[test]
fn filling_a_null_snapshot_field_is_not_a_conflict() {
    let mut snapshot = FieldMap::new();
    snapshot.insert("tsd_contact_name".to_string(), Value::Null);

    let mut submitted = FieldMap::new();
    submitted.insert("tsd_contact_name".to_string(), json!("Jane Doe"));

    let report = detect_conflicts(&snapshot, &submitted);
    assert!(report.conflicts.is_empty());
    assert_eq!(report.merged["tsd_contact_name"], json!("Jane Doe"));
    assert_eq!(
        IntakeStatus::after_submission(&report),
        IntakeStatus::Convertible
    );
}

#[test]
fn extraction_output_round_trips_into_the_conflict_engine() {
    let out = run(FORWARDED_REGISTRATION, Some("sarah@internal.example"));
    let snapshot = out.record.to_field_map();

    // Partner confirms everything but corrects the phone number.
    let mut submitted = snapshot.clone();
    submitted.insert("customer_phone".to_string(), json!("(512) 555-9999"));

    let report = detect_conflicts(&snapshot, &submitted);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].field, "customer_phone");
}

// ── LLM strategy ────────────────────────────────────────────────────────

#[test]
fn llm_failure_degrades_to_null_record() {
    let llm = LlmExtractor::new("http://192.0.2.1:9/extract", "test-model", vocab())
        .with_timeout(Duration::from_millis(50));
    let out = llm.extract(FORWARDED_REGISTRATION, None, None, None);

    assert_eq!(out.record, ExtractedRecord::default());
    assert!(out.confidence.is_empty());
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn llm_failure_with_fallback_runs_the_rules() {
    let llm = LlmExtractor::new("http://192.0.2.1:9/extract", "test-model", vocab())
        .with_timeout(Duration::from_millis(50))
        .with_fallback();
    let out = llm.extract(FORWARDED_REGISTRATION, Some("sarah@internal.example"), None, None);

    assert_eq!(out.record.ta_email.as_deref(), Some("jhernandez@partner.net"));
    assert!(out.warnings[0].contains("used rule pipeline"));
}

#[test]
fn strategies_are_interchangeable_behind_the_trait() {
    let strategies: Vec<Box<dyn ExtractStrategy>> = vec![
        Box::new(RuleBased::new(vocab())),
        Box::new(
            LlmExtractor::new("http://192.0.2.1:9/extract", "test-model", vocab())
                .with_timeout(Duration::from_millis(50)),
        ),
    ];
    for strategy in strategies {
        let out = strategy.extract("Customer: Acme Corp", None, None, None);
        // Every strategy returns a usable extraction, never panics or errors.
        for (field, _) in &out.confidence {
            assert!(out.record.is_set(*field));
        }
    }
}

// ── Vocabulary-driven behavior ──────────────────────────────────────────

#[test]
fn custom_vocabulary_changes_extraction() {
    let custom = Vocabulary::from_toml_str(
        r#"
internal_domain = "corp.example"

[[distributors]]
name = "Acme Distribution"
aliases = ["acme dist"]
domains = ["acmedist.com"]

[[solutions]]
tag = "Fax"
keywords = ["fax blast"]
"#,
    )
    .unwrap();

    let out = extract(
        "TSD: acme dist\nThey want a fax blast campaign.\nFrom: a@b.com",
        None,
        None,
        None,
        &custom,
    );
    assert_eq!(out.record.tsd_name.as_deref(), Some("Acme Distribution"));
    assert_eq!(out.record.solutions, vec!["Fax".to_string()]);
}

#[test]
fn unknown_distributor_stays_null() {
    let out = run("TSD: Some Unknown House\nCustomer: Acme Corp", None);
    assert!(out.record.tsd_name.is_none());

    let map = out.record.to_field_map();
    assert_eq!(map["tsd_name"], Value::Null);
    assert!(Field::ALL.iter().all(|f| map.contains_key(f.as_str())));
}
