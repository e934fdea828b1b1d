//! Deal-registration data model shared by the extraction and conflict engines.
//!
//! An [`ExtractedRecord`] is a flat, fully-nullable mapping of the ~25 fields a
//! registration carries: referring-partner ("ta") identity, distributor ("tsd")
//! identity, customer identity/address, and opportunity sizing. The same field
//! names double as the key vocabulary of the generic [`FieldMap`] the conflict
//! engine diffs, so both engines agree on what a field is called.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IntakeError, IntakeResult};

/// Generic field-name → value map, the wire form shared with collaborators.
///
/// Values are JSON: strings for scalar fields, arrays of strings for the
/// solution-tag set, `null` for unpopulated fields.
pub type FieldMap = BTreeMap<String, Value>;

/// Sparse field → confidence (0–100) map. Absence means "not populated".
pub type ConfidenceMap = BTreeMap<Field, u8>;

// ── Field ───────────────────────────────────────────────────────────────

/// Every tracked field of a deal-registration record.
///
/// The string form (see [`Field::as_str`]) is the canonical name used in
/// serialized records, field maps, conflicts, and warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TaFullName,
    TaEmail,
    TaPhone,
    TaCompanyName,
    TsdName,
    TsdContactName,
    TsdContactEmail,
    CustomerFirstName,
    CustomerLastName,
    CustomerCompanyName,
    CustomerEmail,
    CustomerPhone,
    CustomerJobTitle,
    CustomerStreet,
    CustomerCity,
    CustomerState,
    CustomerZip,
    CustomerCountry,
    AgentCount,
    ImplementationTimeline,
    Solutions,
    OpportunityDescription,
    DealValue,
}

impl Field {
    /// All fields, in record order.
    pub const ALL: [Field; 23] = [
        Field::TaFullName,
        Field::TaEmail,
        Field::TaPhone,
        Field::TaCompanyName,
        Field::TsdName,
        Field::TsdContactName,
        Field::TsdContactEmail,
        Field::CustomerFirstName,
        Field::CustomerLastName,
        Field::CustomerCompanyName,
        Field::CustomerEmail,
        Field::CustomerPhone,
        Field::CustomerJobTitle,
        Field::CustomerStreet,
        Field::CustomerCity,
        Field::CustomerState,
        Field::CustomerZip,
        Field::CustomerCountry,
        Field::AgentCount,
        Field::ImplementationTimeline,
        Field::Solutions,
        Field::OpportunityDescription,
        Field::DealValue,
    ];

    /// Canonical snake_case name, identical to the serde rename.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::TaFullName => "ta_full_name",
            Field::TaEmail => "ta_email",
            Field::TaPhone => "ta_phone",
            Field::TaCompanyName => "ta_company_name",
            Field::TsdName => "tsd_name",
            Field::TsdContactName => "tsd_contact_name",
            Field::TsdContactEmail => "tsd_contact_email",
            Field::CustomerFirstName => "customer_first_name",
            Field::CustomerLastName => "customer_last_name",
            Field::CustomerCompanyName => "customer_company_name",
            Field::CustomerEmail => "customer_email",
            Field::CustomerPhone => "customer_phone",
            Field::CustomerJobTitle => "customer_job_title",
            Field::CustomerStreet => "customer_street",
            Field::CustomerCity => "customer_city",
            Field::CustomerState => "customer_state",
            Field::CustomerZip => "customer_zip",
            Field::CustomerCountry => "customer_country",
            Field::AgentCount => "agent_count",
            Field::ImplementationTimeline => "implementation_timeline",
            Field::Solutions => "solutions",
            Field::OpportunityDescription => "opportunity_description",
            Field::DealValue => "deal_value",
        }
    }

    /// Whether this field holds an email address (scrub targets).
    pub fn is_email(self) -> bool {
        matches!(
            self,
            Field::TaEmail | Field::TsdContactEmail | Field::CustomerEmail
        )
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ExtractedRecord ─────────────────────────────────────────────────────

/// A deal-registration record. Every field is optional; the blank record is
/// the only default. Field names in the serialized form match [`Field`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractedRecord {
    // Referring partner ("trusted advisor").
    pub ta_full_name: Option<String>,
    pub ta_email: Option<String>,
    pub ta_phone: Option<String>,
    pub ta_company_name: Option<String>,

    // Distributor ("technology services distributor").
    pub tsd_name: Option<String>,
    pub tsd_contact_name: Option<String>,
    pub tsd_contact_email: Option<String>,

    // Customer identity and postal address.
    pub customer_first_name: Option<String>,
    pub customer_last_name: Option<String>,
    pub customer_company_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_job_title: Option<String>,
    pub customer_street: Option<String>,
    pub customer_city: Option<String>,
    pub customer_state: Option<String>,
    pub customer_zip: Option<String>,
    pub customer_country: Option<String>,

    // Opportunity sizing.
    /// Agent-count bucket label (see `extract::opportunity::AGENT_BUCKETS`).
    pub agent_count: Option<String>,
    /// Implementation-timeline bucket label.
    pub implementation_timeline: Option<String>,
    /// Solution tags, sorted and deduplicated.
    #[serde(default)]
    pub solutions: Vec<String>,
    pub opportunity_description: Option<String>,
    /// Free-form monetary value as written (e.g. "$120,000/yr").
    pub deal_value: Option<String>,
}

impl ExtractedRecord {
    /// Read a scalar field. `Solutions` reads as `None` here; use the
    /// `solutions` vec directly for the tag set.
    pub fn get(&self, field: Field) -> Option<&str> {
        let slot = match field {
            Field::TaFullName => &self.ta_full_name,
            Field::TaEmail => &self.ta_email,
            Field::TaPhone => &self.ta_phone,
            Field::TaCompanyName => &self.ta_company_name,
            Field::TsdName => &self.tsd_name,
            Field::TsdContactName => &self.tsd_contact_name,
            Field::TsdContactEmail => &self.tsd_contact_email,
            Field::CustomerFirstName => &self.customer_first_name,
            Field::CustomerLastName => &self.customer_last_name,
            Field::CustomerCompanyName => &self.customer_company_name,
            Field::CustomerEmail => &self.customer_email,
            Field::CustomerPhone => &self.customer_phone,
            Field::CustomerJobTitle => &self.customer_job_title,
            Field::CustomerStreet => &self.customer_street,
            Field::CustomerCity => &self.customer_city,
            Field::CustomerState => &self.customer_state,
            Field::CustomerZip => &self.customer_zip,
            Field::CustomerCountry => &self.customer_country,
            Field::AgentCount => &self.agent_count,
            Field::ImplementationTimeline => &self.implementation_timeline,
            Field::Solutions => return None,
            Field::OpportunityDescription => &self.opportunity_description,
            Field::DealValue => &self.deal_value,
        };
        slot.as_deref()
    }

    /// Write a scalar field. Writing `Solutions` appends a tag instead
    /// (kept sorted and deduplicated).
    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::TaFullName => &mut self.ta_full_name,
            Field::TaEmail => &mut self.ta_email,
            Field::TaPhone => &mut self.ta_phone,
            Field::TaCompanyName => &mut self.ta_company_name,
            Field::TsdName => &mut self.tsd_name,
            Field::TsdContactName => &mut self.tsd_contact_name,
            Field::TsdContactEmail => &mut self.tsd_contact_email,
            Field::CustomerFirstName => &mut self.customer_first_name,
            Field::CustomerLastName => &mut self.customer_last_name,
            Field::CustomerCompanyName => &mut self.customer_company_name,
            Field::CustomerEmail => &mut self.customer_email,
            Field::CustomerPhone => &mut self.customer_phone,
            Field::CustomerJobTitle => &mut self.customer_job_title,
            Field::CustomerStreet => &mut self.customer_street,
            Field::CustomerCity => &mut self.customer_city,
            Field::CustomerState => &mut self.customer_state,
            Field::CustomerZip => &mut self.customer_zip,
            Field::CustomerCountry => &mut self.customer_country,
            Field::AgentCount => &mut self.agent_count,
            Field::ImplementationTimeline => &mut self.implementation_timeline,
            Field::Solutions => {
                if !self.solutions.contains(&value) {
                    self.solutions.push(value);
                    self.solutions.sort();
                }
                return;
            }
            Field::OpportunityDescription => &mut self.opportunity_description,
            Field::DealValue => &mut self.deal_value,
        };
        *slot = Some(value);
    }

    /// Null out a field (clears the whole tag set for `Solutions`).
    pub fn clear(&mut self, field: Field) {
        match field {
            Field::TaFullName => self.ta_full_name = None,
            Field::TaEmail => self.ta_email = None,
            Field::TaPhone => self.ta_phone = None,
            Field::TaCompanyName => self.ta_company_name = None,
            Field::TsdName => self.tsd_name = None,
            Field::TsdContactName => self.tsd_contact_name = None,
            Field::TsdContactEmail => self.tsd_contact_email = None,
            Field::CustomerFirstName => self.customer_first_name = None,
            Field::CustomerLastName => self.customer_last_name = None,
            Field::CustomerCompanyName => self.customer_company_name = None,
            Field::CustomerEmail => self.customer_email = None,
            Field::CustomerPhone => self.customer_phone = None,
            Field::CustomerJobTitle => self.customer_job_title = None,
            Field::CustomerStreet => self.customer_street = None,
            Field::CustomerCity => self.customer_city = None,
            Field::CustomerState => self.customer_state = None,
            Field::CustomerZip => self.customer_zip = None,
            Field::CustomerCountry => self.customer_country = None,
            Field::AgentCount => self.agent_count = None,
            Field::ImplementationTimeline => self.implementation_timeline = None,
            Field::Solutions => self.solutions.clear(),
            Field::OpportunityDescription => self.opportunity_description = None,
            Field::DealValue => self.deal_value = None,
        }
    }

    /// Whether a field currently holds a value.
    pub fn is_set(&self, field: Field) -> bool {
        if field == Field::Solutions {
            !self.solutions.is_empty()
        } else {
            self.get(field).is_some()
        }
    }

    /// Null every field whose value contains the internal email domain.
    ///
    /// The internal domain only ever belongs to forwarding staff; a partner,
    /// distributor-contact, or customer field carrying it is a role leak.
    /// Returns the fields that were scrubbed.
    pub fn scrub_internal(&mut self, internal_domain: &str) -> Vec<Field> {
        if internal_domain.is_empty() {
            return Vec::new();
        }
        let needle = internal_domain.to_ascii_lowercase();
        let mut scrubbed = Vec::new();

        for field in Field::ALL {
            if field == Field::Solutions {
                continue;
            }
            let leaked = self
                .get(field)
                .is_some_and(|v| v.to_ascii_lowercase().contains(&needle));
            if leaked {
                self.clear(field);
                scrubbed.push(field);
            }
        }
        scrubbed
    }

    /// Serialize to the generic [`FieldMap`] form (all 23 keys present,
    /// `null` for unpopulated fields, array for the tag set).
    pub fn to_field_map(&self) -> FieldMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            // A flat struct of Option<String>/Vec<String> always serializes
            // to an object.
            _ => FieldMap::new(),
        }
    }

    /// Rebuild a record from a field map. Unknown keys are rejected so a
    /// malformed LLM response cannot silently pass as a valid record.
    pub fn from_field_map(map: &FieldMap) -> IntakeResult<Self> {
        let value = Value::Object(map.clone().into_iter().collect());
        serde_json::from_value(value).map_err(|e| IntakeError::Json {
            message: format!("field map is not a valid record: {e}"),
        })
    }
}

// ── Value emptiness ─────────────────────────────────────────────────────

/// Whether a JSON value counts as "empty" for record/conflict purposes:
/// `null`, a blank string, or an empty array.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
