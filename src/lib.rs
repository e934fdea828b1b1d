//! # deal-intake
//!
//! Turns forwarded partner emails into structured deal-registration records
//! and arbitrates the follow-up round trip with the partner.
//!
//! ## Architecture
//!
//! - **Normalizer** (`normalize`): HTML/plaintext → clean text
//! - **Forward unwrapping** (`forward`): recovers the true originator from
//!   forward chains
//! - **Extraction** (`extract`): label/vocabulary/pattern/positional rule
//!   ladder producing a record, a confidence map, and review warnings
//! - **Vocabularies** (`vocab`): distributors, solution tags, and domain
//!   lists as versioned TOML data
//! - **Strategies** (`llm`): rule-based and LLM-backed engines behind one
//!   trait
//! - **Conflict engine** (`conflict`): snapshot vs. partner submission,
//!   field by field
//!
//! ## Library usage
//!
//! ```no_run
//! use deal_intake::extract::extract;
//! use deal_intake::vocab::Vocabulary;
//!
//! let vocab = Vocabulary::builtin();
//! let out = extract(
//!     "Partner: Amy Lane <amy@resellers.io>\nCustomer: Acme Corp\nSeats: 300",
//!     Some("sarah@internal.example"),
//!     None,
//!     Some("Fwd: deal registration"),
//!     &vocab,
//! );
//! assert_eq!(out.record.customer_company_name.as_deref(), Some("Acme Corp"));
//! ```

pub mod conflict;
pub mod error;
pub mod extract;
pub mod forward;
pub mod llm;
pub mod normalize;
pub mod record;
pub mod vocab;
