//! Secret Publisher: seals the private key and stores it as an Actions secret.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use crypto_box::aead::OsRng;
use crypto_box::PublicKey;
use tracing::{debug, info};

use crate::repository::SecretStore;
use crate::{EncryptedSecret, PipelineError, RepositoryPublicKey, RepositoryRef, SecretName};

/// Seals `plaintext` for `key` with an anonymous sealed box.
///
/// The output is compatible with libsodium's `crypto_box_seal`, which is what
/// GitHub's secrets API expects: only the holder of the repository's private key
/// can open it and the sender is not identifiable from the ciphertext.
pub fn seal_secret(
    plaintext: &[u8],
    key: &RepositoryPublicKey,
) -> Result<EncryptedSecret, PipelineError> {
    let raw = BASE64
        .decode(key.key.trim())
        .map_err(|e| PipelineError::Encryption {
            message: format!("repository key {} is not valid base64: {e}", key.key_id),
        })?;
    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| PipelineError::Encryption {
        message: format!(
            "repository key {} has {} bytes, expected 32",
            key.key_id,
            raw.len()
        ),
    })?;

    let sealed = PublicKey::from(bytes)
        .seal(&mut OsRng, plaintext)
        .map_err(|e| PipelineError::Encryption {
            message: format!("sealing failed: {e}"),
        })?;

    Ok(EncryptedSecret {
        key_id: key.key_id.clone(),
        encrypted_value: BASE64.encode(sealed),
    })
}

/// Upserts the private key into a repository's secret store.
pub struct SecretPublisher {
    secrets: Arc<dyn SecretStore>,
    name: SecretName,
}

impl SecretPublisher {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            secrets,
            name: SecretName::gpg_key(),
        }
    }

    /// Encodes, seals, and upserts `private_key_armored` as [`crate::SECRET_NAME`].
    ///
    /// The repository key is fetched on every call. Failures are not retried.
    pub async fn publish(
        &self,
        repo: &RepositoryRef,
        private_key_armored: &str,
    ) -> Result<(), PipelineError> {
        let encoded = zeroize::Zeroizing::new(BASE64.encode(private_key_armored));

        let key = self.secrets.repository_public_key(repo).await?;
        debug!(repository = %repo, key_id = %key.key_id, "fetched repository secrets key");

        let secret = seal_secret(encoded.as_bytes(), &key)?;
        self.secrets.upsert_secret(repo, &self.name, &secret).await?;

        info!(repository = %repo, secret = %self.name, key_id = %key.key_id, "secret upserted");
        Ok(())
    }
}
