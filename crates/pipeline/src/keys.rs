//! Key pair types and the key-generation port.
//!
//! The `keygen` crate implements [`KeyGenerator`] by shelling out to `gpg`. A
//! linked OpenPGP library or a remote signing service could replace it without
//! touching the provisioning logic.

use async_trait::async_trait;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::{KeyFingerprint, RepositoryRef, Timestamp};

/// The identity a generated key is bound to.
///
/// The label is always `"{owner}/{repo}"`. The e-mail address is a placeholder
/// that receives no mail: the key attributes secrets to a repository and is not
/// meant for messaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIdentity {
    label: String,
    email: String,
}

impl KeyIdentity {
    /// Builds the identity for `repo`.
    pub fn for_repository(repo: &RepositoryRef) -> Self {
        Self {
            label: repo.full_name(),
            email: format!("{}-{}@users.noreply.github.com", repo.owner, repo.name),
        }
    }

    /// The human-readable identity, `"{owner}/{repo}"`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The OpenPGP user ID, `"{label} <{email}>"`.
    pub fn user_id(&self) -> String {
        format!("{} <{}>", self.label, self.email)
    }
}

/// A freshly generated key pair. Never reused across repositories.
///
/// The armored private key is wiped from memory when the pair is dropped.
pub struct KeyPair {
    pub identity: KeyIdentity,
    pub private_key_armored: Zeroizing<String>,
    pub public_key_armored: String,
    pub fingerprint: KeyFingerprint,
    pub generated_at: Timestamp,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("identity", &self.identity)
            .field("private_key_armored", &"<redacted>")
            .field("fingerprint", &self.fingerprint)
            .field("generated_at", &self.generated_at)
            .finish_non_exhaustive()
    }
}

/// Failure of the key-generation capability.
#[derive(Debug, Error)]
pub enum KeyGenerationError {
    /// The generation tool could not be started.
    #[error("key generation tool `{program}` is unavailable: {message}")]
    ToolUnavailable { program: String, message: String },

    /// A generation step exited unsuccessfully.
    #[error("`{step}` exited with {status}: {stderr}")]
    CommandFailed {
        step: &'static str,
        status: String,
        stderr: String,
    },

    /// A step succeeded but its output could not be used.
    #[error("malformed output from `{step}`: {message}")]
    MalformedOutput { step: &'static str, message: String },

    /// The keyring listing contained no primary key.
    #[error("no key was found in the ephemeral keyring")]
    FingerprintNotFound,

    /// The keyring listing contained more than one primary key.
    #[error("expected exactly one key in the ephemeral keyring, found {count}")]
    AmbiguousKeyring { count: usize },

    /// The ephemeral keyring could not be created.
    #[error("ephemeral keyring error: {0}")]
    Keyring(#[from] std::io::Error),
}

/// Produces a long-lived, passphrase-less key pair for an identity.
#[async_trait]
pub trait KeyGenerator: Send + Sync {
    /// Generates exactly one key pair bound to `identity`.
    ///
    /// Any scratch keyring used for generation is destroyed before this returns,
    /// on success and on failure.
    async fn generate(&self, identity: &KeyIdentity) -> Result<KeyPair, KeyGenerationError>;
}
