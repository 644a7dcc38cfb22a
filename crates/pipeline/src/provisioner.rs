//! Key Provisioner: the idempotency gate in front of key generation.
//!
//! A committed public key at [`PUBLIC_KEY_PATH`] is the durable marker that a
//! repository was provisioned. No other tracking store exists.

use std::sync::Arc;

use tracing::info;

use crate::keys::{KeyGenerator, KeyIdentity, KeyPair};
use crate::repository::RepositoryContents;
use crate::{PipelineError, RepositoryRef, PUBLIC_KEY_PATH};

/// Result of [`KeyProvisioner::provision`].
#[derive(Debug)]
pub enum Provision {
    /// A new key pair was generated.
    Generated(KeyPair),
    /// A public key is already committed; nothing was generated.
    Skipped,
}

pub struct KeyProvisioner {
    contents: Arc<dyn RepositoryContents>,
    keys: Arc<dyn KeyGenerator>,
}

impl KeyProvisioner {
    pub fn new(contents: Arc<dyn RepositoryContents>, keys: Arc<dyn KeyGenerator>) -> Self {
        Self { contents, keys }
    }

    /// Generates a key pair for `repo` unless one was already provisioned.
    pub async fn provision(&self, repo: &RepositoryRef) -> Result<Provision, PipelineError> {
        if self
            .contents
            .get_file(repo, PUBLIC_KEY_PATH, None)
            .await?
            .is_some()
        {
            info!(repository = %repo, path = PUBLIC_KEY_PATH, "public key present, skipping");
            return Ok(Provision::Skipped);
        }

        let identity = KeyIdentity::for_repository(repo);
        let pair = self.keys.generate(&identity).await?;
        info!(
            repository = %repo,
            identity = identity.label(),
            fingerprint = %pair.fingerprint,
            "generated key pair"
        );
        Ok(Provision::Generated(pair))
    }
}
