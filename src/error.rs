//! Intake error types with rich miette diagnostics.
//!
//! The extraction core itself never fails — "could not extract" is an
//! expected outcome surfaced through warnings, not errors. These variants
//! cover the edges that genuinely can fail: vocabulary files, the LLM
//! transport, and CLI I/O.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by the deal-intake subsystem.
#[derive(Debug, Error, Diagnostic)]
pub enum IntakeError {
    #[error("vocabulary invalid: {message}")]
    #[diagnostic(
        code(intake::vocab),
        help(
            "Check the vocabulary TOML. Required: a non-empty internal_domain and \
             at least one distributor entry. Distributor aliases and solution \
             keywords must be non-empty strings."
        )
    )]
    Vocabulary { message: String },

    #[error("LLM extraction failed: {message}")]
    #[diagnostic(
        code(intake::llm),
        help(
            "The completion endpoint was unreachable, timed out, or returned \
             output that is not a field map. Extraction callers receive the \
             null-record fallback; this error only surfaces when the transport \
             is probed directly."
        )
    )]
    Llm { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(
        code(intake::json),
        help(
            "The value could not be read as a record or field map. Field names \
             must match the canonical snake_case vocabulary."
        )
    )]
    Json { message: String },

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(intake::io),
        help("Check that the path exists and is readable.")
    )]
    Io(#[from] std::io::Error),
}

/// Convenience alias for intake operations.
pub type IntakeResult<T> = std::result::Result<T, IntakeError>;
