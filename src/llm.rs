//! Pluggable extraction strategies.
//!
//! The rule-based pipeline and the LLM-backed extractor share one trait so
//! callers never branch on which engine is configured. The LLM is a black
//! box behind an HTTP endpoint; its failure mode is total but never fatal —
//! a dead endpoint, a timeout, or garbage JSON all degrade to an all-null
//! record carrying a single warning (or to the rule-based pipeline when a
//! fallback is configured).

use std::time::Duration;

use serde_json::Value;

use crate::error::{IntakeError, IntakeResult};
use crate::extract::Extraction;
use crate::record::{ExtractedRecord, Field, FieldMap};
use crate::vocab::Vocabulary;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ── Strategy trait ──────────────────────────────────────────────────────

/// One way of turning a raw email into an [`Extraction`].
///
/// Implementations never fail: whatever goes wrong internally is reported
/// through the extraction's warnings.
pub trait ExtractStrategy {
    fn extract(
        &self,
        raw_body: &str,
        sender_email: Option<&str>,
        sender_display: Option<&str>,
        subject: Option<&str>,
    ) -> Extraction;
}

// ── Rule-based strategy ─────────────────────────────────────────────────

/// The deterministic rule pipeline behind the strategy seam.
#[derive(Debug, Clone)]
pub struct RuleBased {
    vocab: Vocabulary,
}

impl RuleBased {
    pub fn new(vocab: Vocabulary) -> Self {
        RuleBased { vocab }
    }
}

impl ExtractStrategy for RuleBased {
    fn extract(
        &self,
        raw_body: &str,
        sender_email: Option<&str>,
        sender_display: Option<&str>,
        subject: Option<&str>,
    ) -> Extraction {
        crate::extract::extract(raw_body, sender_email, sender_display, subject, &self.vocab)
    }
}

// ── LLM strategy ────────────────────────────────────────────────────────

/// Shape of a successful completion-endpoint response. Only `record` is
/// required; confidence and warnings are taken when present.
#[derive(Debug, serde::Deserialize)]
struct LlmResponse {
    record: FieldMap,
    #[serde(default)]
    confidence: FieldMap,
    #[serde(default)]
    warnings: Vec<String>,
}

/// Extraction delegated to a completion endpoint over HTTP.
pub struct LlmExtractor {
    endpoint: String,
    model: String,
    timeout: Duration,
    vocab: Vocabulary,
    fallback: Option<RuleBased>,
}

impl LlmExtractor {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        vocab: Vocabulary,
    ) -> Self {
        LlmExtractor {
            endpoint: endpoint.into(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            vocab,
            fallback: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// On any LLM failure run the rule pipeline instead of returning the
    /// all-null record.
    pub fn with_fallback(mut self) -> Self {
        self.fallback = Some(RuleBased::new(self.vocab.clone()));
        self
    }

    fn request(
        &self,
        raw_body: &str,
        sender_email: Option<&str>,
        sender_display: Option<&str>,
        subject: Option<&str>,
    ) -> IntakeResult<Extraction> {
        let field_names: Vec<&str> = Field::ALL.iter().map(|f| f.as_str()).collect();
        let payload = serde_json::json!({
            "model": self.model,
            "fields": field_names,
            "email": {
                "body": raw_body,
                "sender_email": sender_email,
                "sender_display": sender_display,
                "subject": subject,
            },
        });

        let agent = ureq::AgentBuilder::new()
            .timeout(self.timeout)
            .build();
        let response: LlmResponse = agent
            .post(&self.endpoint)
            .send_json(payload)
            .map_err(|e| IntakeError::Llm {
                message: format!("extraction request failed: {e}"),
            })?
            .into_json()
            .map_err(|e| IntakeError::Llm {
                message: format!("extraction response is not valid JSON: {e}"),
            })?;

        let mut record = ExtractedRecord::from_field_map(&response.record)?;
        record.scrub_internal(&self.vocab.internal_domain);

        // Keep confidence keyed to populated fields only, values clamped.
        let mut confidence = std::collections::BTreeMap::new();
        for field in Field::ALL {
            if !record.is_set(field) {
                continue;
            }
            if let Some(Value::Number(n)) = response.confidence.get(field.as_str()) {
                let score = n.as_u64().unwrap_or(0).min(100) as u8;
                confidence.insert(field, score);
            }
        }

        Ok(Extraction {
            record,
            confidence,
            warnings: response.warnings,
        })
    }
}

impl ExtractStrategy for LlmExtractor {
    fn extract(
        &self,
        raw_body: &str,
        sender_email: Option<&str>,
        sender_display: Option<&str>,
        subject: Option<&str>,
    ) -> Extraction {
        match self.request(raw_body, sender_email, sender_display, subject) {
            Ok(extraction) => extraction,
            Err(err) => {
                tracing::warn!(error = %err, "llm extraction failed");
                match &self.fallback {
                    Some(rules) => {
                        let mut out =
                            rules.extract(raw_body, sender_email, sender_display, subject);
                        out.warnings.insert(
                            0,
                            format!("llm extraction failed, used rule pipeline: {err}"),
                        );
                        out
                    }
                    None => Extraction {
                        record: ExtractedRecord::default(),
                        confidence: Default::default(),
                        warnings: vec![format!(
                            "llm extraction failed, record needs manual entry: {err}"
                        )],
                    },
                }
            }
        }
    }
}
