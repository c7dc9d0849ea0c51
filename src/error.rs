//! Error taxonomy.
//!
//! Most kinds are recoverable locally and never abort a batch (see
//! `funnel::generate_matches`'s per-program isolation).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    /// Bad input shape, e.g. TRL outside [1,9]. Callers recover by
    /// treating the field as missing; never fatal.
    #[error("validation failed for field '{field}': {detail}")]
    ValidationFailure { field: String, detail: String },

    /// A field needed for an invariant is missing (investment history,
    /// employee count, ...). Handled as an eligibility failure with
    /// `needs_manual_review` set, not surfaced as an error to the caller.
    #[error("missing data for '{field}' on {entity}")]
    MissingData { entity: String, field: String },

    /// LLM call timeout, network error, malformed JSON. Recovered locally
    /// by falling back to the rule-only IAP; incident logged, not fatal.
    #[error("external dependency '{dependency}' failed: {detail}")]
    ExternalDependencyFailure { dependency: String, detail: String },

    /// Program or organization id resolved to nothing. Surfaced to the
    /// caller; never handled inside the engine.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unexpected invariant break. One program is skipped, the batch
    /// continues; the outer layer may treat this as a 500 if applicable.
    #[error("internal error: {0}")]
    FatalInternal(String),
}

pub type MatchResult<T> = Result<T, MatchError>;
