//! Core provisioning domain for the GPG secret-management bot.
//!
//! This crate contains every domain concept, the four pipeline stages, and the
//! port traits the stages talk through. Infrastructure crates implement the
//! traits; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no network or
//! process I/O. It defines *what* is needed; infrastructure crates define *how*
//! to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryRef`, `CommitSha`, etc.) |
//! | [`types`] | Shared value types and fixed repository paths |
//! | [`errors`] | `PipelineError` and `ConfigError` |
//! | [`repository`] | `RepositoryContents` and `SecretStore` ports |
//! | [`keys`] | `KeyGenerator` port and `KeyPair` |
//! | [`router`] | Event Router |
//! | [`subscription`] | Subscription Resolver |
//! | [`provisioner`] | Key Provisioner (idempotency gate) |
//! | [`publisher`] | Secret Publisher (sealed-box encryption) |
//! | [`committer`] | Public Key Committer |
//! | [`orchestrator`] | `SecretManagementPipeline`, which runs the stages in order |

pub mod committer;
pub mod errors;
pub mod identifiers;
pub mod keys;
pub mod orchestrator;
pub mod provisioner;
pub mod publisher;
pub mod repository;
pub mod router;
pub mod subscription;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod fakes;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use committer::{CommitOutcome, PublicKeyCommitter, COMMIT_MESSAGE};
pub use errors::{ConfigError, PipelineError};
pub use identifiers::{
    BlobSha, BranchName, CommitSha, KeyFingerprint, OwnerName, PipelineRunId, RepositoryKeyId,
    RepositoryName, RepositoryRef, SecretName, TreeSha,
};
pub use keys::{KeyGenerationError, KeyGenerator, KeyIdentity, KeyPair};
pub use orchestrator::{NotApplicableReason, PipelineOutcome, SecretManagementPipeline};
pub use provisioner::{KeyProvisioner, Provision};
pub use publisher::{seal_secret, SecretPublisher};
pub use repository::{RemoteApiError, RepositoryContents, SecretStore};
pub use router::{route, ProvisioningRequest, PushCommit, RepositoryEvent};
pub use subscription::{parse_descriptor, Resolution, SubscriptionDescriptor, SubscriptionResolver};
pub use types::{
    BranchHead, EncryptedSecret, FileContent, RepositoryPublicKey, Timestamp, DISPATCH_ACTION,
    PUBLIC_KEY_PATH, SECRET_NAME, SUBSCRIPTION_PATH, SUPPORTED_API_VERSION,
};
