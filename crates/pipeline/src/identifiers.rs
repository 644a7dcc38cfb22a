//! Newtype domain identifiers.
//!
//! Every GitHub or Git name the provisioning workflow passes around is a distinct
//! newtype wrapping a `String`. This prevents accidentally interchanging, for
//! example, a [`CommitSha`] with a [`TreeSha`] even though both are hex strings
//! under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub names
// ---------------------------------------------------------------------------

string_id! {
    /// The login of the user or organisation owning a repository.
    OwnerName
}

string_id! {
    /// The short name of a repository (without the owner prefix).
    RepositoryName
}

string_id! {
    /// Name of an Actions secret within a repository (e.g. `"GPG_KEY"`).
    SecretName
}

impl SecretName {
    /// The secret the encrypted private key is stored under.
    pub fn gpg_key() -> Self {
        Self(crate::SECRET_NAME.to_string())
    }
}

string_id! {
    /// Identifier GitHub assigns to a repository's current secrets encryption key.
    ///
    /// Sent back alongside every encrypted value so GitHub can pick the matching
    /// private key for decryption.
    RepositoryKeyId
}

// ---------------------------------------------------------------------------
// Identifiers: Git object names
// ---------------------------------------------------------------------------

string_id! {
    /// A Git branch name (e.g. `"main"`).
    BranchName
}

string_id! {
    /// A Git commit SHA (40-character lowercase hex string).
    CommitSha
}

string_id! {
    /// A Git tree SHA.
    TreeSha
}

string_id! {
    /// A Git blob SHA.
    BlobSha
}

string_id! {
    /// Fingerprint of an OpenPGP primary key (uppercase hex).
    KeyFingerprint
}

// ---------------------------------------------------------------------------
// Repository reference
// ---------------------------------------------------------------------------

/// A GitHub repository addressed by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: OwnerName,
    pub name: RepositoryName,
}

impl RepositoryRef {
    /// Creates a reference from its two parts.
    pub fn new(owner: OwnerName, name: RepositoryName) -> Self {
        Self { owner, name }
    }

    /// Parses an `"owner/name"` string.
    ///
    /// Returns `None` unless the input contains exactly one `/` with a
    /// non-empty segment on each side.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if name.contains('/') {
            return None;
        }
        Some(Self::new(OwnerName::new(owner)?, RepositoryName::new(name)?))
    }

    /// Returns the `"owner/name"` form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single pipeline execution (one run for one triggering event).
///
/// Generated fresh for every event; recorded on the run's span so all activity
/// from a single run can be correlated in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineRunId(Uuid);

impl PipelineRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PipelineRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
