//! Top-level error types for the provisioning pipeline.
//!
//! [`PipelineError`] is what a pipeline run returns when a stage fails. It wraps
//! the component-level errors, which are defined next to the ports that produce
//! them ([`crate::repository::RemoteApiError`], [`crate::keys::KeyGenerationError`]).
//!
//! "Not applicable" conditions (no descriptor, `subscribe: false`, key already
//! committed) are not errors; they are reported through
//! [`crate::orchestrator::PipelineOutcome::NotApplicable`].

use thiserror::Error;

use crate::keys::KeyGenerationError;
use crate::repository::RemoteApiError;

// ---------------------------------------------------------------------------
// Descriptor errors
// ---------------------------------------------------------------------------

/// The subscription descriptor exists but could not be turned into a
/// [`crate::SubscriptionDescriptor`].
///
/// Halts the pipeline for the triggering event. The event is not retried; the
/// repository owner must fix the file, which itself triggers a new run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The document is blank, comment-only, or an explicit YAML `null`.
    #[error("subscription descriptor is empty")]
    EmptyDocument,

    /// The `apiVersion` key is absent or blank.
    #[error("subscription descriptor is missing `apiVersion`")]
    MissingApiVersion,

    /// The `subscribe` key is absent.
    #[error("subscription descriptor is missing `subscribe`")]
    MissingSubscribe,

    /// Any other schema violation, e.g. `subscribe: "yes"` or a non-mapping document.
    #[error("subscription descriptor is invalid: {message}")]
    Invalid {
        /// Parser diagnostic.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Errors that abort the remaining stages of a pipeline run.
///
/// Every variant is surfaced to the transport; none is retried internally. A
/// later triggering event re-runs the whole sequence and the idempotency checks
/// skip the stages that already completed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The subscription descriptor is malformed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The key-generation capability failed or produced unusable output.
    #[error("key generation failed: {0}")]
    KeyGeneration(#[from] KeyGenerationError),

    /// A content or secrets API call failed with something other than "not found".
    #[error("remote API error: {0}")]
    RemoteApi(#[from] RemoteApiError),

    /// The private key could not be sealed against the repository key.
    #[error("secret encryption failed: {message}")]
    Encryption {
        /// Description of the failure.
        message: String,
    },
}

impl PipelineError {
    /// Short, stable label used in log fields and transport responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::KeyGeneration(_) => "key_generation_error",
            Self::RemoteApi(_) => "remote_api_error",
            Self::Encryption { .. } => "encryption_error",
        }
    }
}
