//! GitHub webhook event source.
//!
//! Receives deliveries on `POST /webhook`, verifies their `X-Hub-Signature-256`
//! HMAC, normalises the payload into a [`pipeline::RepositoryEvent`], and runs
//! the [`pipeline::SecretManagementPipeline`] for events the router accepts.
//! Runs for the same repository are serialised; runs for different
//! repositories proceed concurrently.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details, signature checks, and payload
//! deserialization live here. The [`pipeline`] crate sees only
//! [`pipeline::RepositoryEvent`] and [`pipeline::ProvisioningRequest`].
//!
//! ## Responses
//!
//! | Situation | Status |
//! |-----------|--------|
//! | Pipeline ran (any outcome) | 200 |
//! | `ping` | 200 |
//! | Event or action not handled, or routed away | 202 |
//! | Malformed payload or missing `X-GitHub-Event` | 400 |
//! | Missing or invalid signature | 401 |
//! | Invalid subscription descriptor | 422 |
//! | Key generation or encryption failure | 500 |
//! | GitHub API failure | 502 |

use thiserror::Error;

mod events;
mod locks;
mod server;
mod signature;

pub use events::normalize;
pub use locks::RepositoryLocks;
pub use server::{router, serve, status_for, WebhookState};
pub use signature::{signature_header, SignatureVerifier};

/// Reasons a delivery is rejected before the pipeline runs.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing header `{0}`")]
    MissingHeader(&'static str),

    #[error("signature does not match payload")]
    InvalidSignature,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}
