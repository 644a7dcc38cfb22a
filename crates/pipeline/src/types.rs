//! Shared value types for the secret-management domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! several related values that travel together between a port and the stage that
//! consumes them (a branch head, a fetched file, an encrypted secret).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BranchName, CommitSha, RepositoryKeyId, TreeSha};

// ---------------------------------------------------------------------------
// Fixed repository locations
// ---------------------------------------------------------------------------

/// Repository path of the subscription descriptor.
pub const SUBSCRIPTION_PATH: &str = ".github/secret-management.yaml";

/// Repository path the armored public key is committed to.
pub const PUBLIC_KEY_PATH: &str = ".github/.gpg";

/// Actions secret the encrypted private key is stored under.
pub const SECRET_NAME: &str = "GPG_KEY";

/// Dispatch action tag that requests out-of-band reprocessing.
pub const DISPATCH_ACTION: &str = "process-secret-management";

/// The `apiVersion` this bot understands. Other values are accepted with a warning.
pub const SUPPORTED_API_VERSION: &str = "secret-management/v1";

// ---------------------------------------------------------------------------
// Repository content
// ---------------------------------------------------------------------------

/// A file read from a repository, already decoded to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// Path relative to the repository root.
    pub path: String,
    /// Decoded file text.
    pub text: String,
}

/// The default branch together with the commit and tree it currently points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchHead {
    pub branch: BranchName,
    pub commit: CommitSha,
    /// Root tree of `commit`; the base every synthesised tree is layered on.
    pub tree: TreeSha,
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// A repository's current secrets encryption key.
///
/// Rotates independently of this bot; fetched fresh for every publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryPublicKey {
    pub key_id: RepositoryKeyId,
    /// Base64 encoding of the 32-byte X25519 public key.
    pub key: String,
}

/// A sealed secret value ready to upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    /// Identifier of the repository key the value was sealed against.
    pub key_id: RepositoryKeyId,
    /// Base64 encoding of the sealed-box ciphertext.
    pub encrypted_value: String,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
