//! [`SecretStore`] over the Actions secrets endpoints.

use async_trait::async_trait;

use pipeline::{
    EncryptedSecret, RemoteApiError, RepositoryKeyId, RepositoryPublicKey, RepositoryRef,
    SecretName, SecretStore,
};

use crate::client::GithubClient;
use crate::contents::required;
use crate::models::{SecretUpsert, SecretsPublicKey};

#[async_trait]
impl SecretStore for GithubClient {
    async fn repository_public_key(
        &self,
        repo: &RepositoryRef,
    ) -> Result<RepositoryPublicKey, RemoteApiError> {
        const OP: &str = "repository_public_key";
        let key: SecretsPublicKey = self
            .send_json(
                OP,
                self.http()
                    .get(self.url(&format!("/repos/{repo}/actions/secrets/public-key"))),
            )
            .await?;

        Ok(RepositoryPublicKey {
            key_id: required(OP, "key_id", key.key_id, RepositoryKeyId::new)?,
            key: key.key,
        })
    }

    async fn upsert_secret(
        &self,
        repo: &RepositoryRef,
        name: &SecretName,
        secret: &EncryptedSecret,
    ) -> Result<(), RemoteApiError> {
        // 201 on create, 204 on update.
        self.send_empty(
            "upsert_secret",
            self.http()
                .put(self.url(&format!("/repos/{repo}/actions/secrets/{name}")))
                .json(&SecretUpsert {
                    encrypted_value: &secret.encrypted_value,
                    key_id: secret.key_id.as_str(),
                }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::client::test_support::client_for;

    fn repo() -> RepositoryRef {
        RepositoryRef::parse("octo-org/widgets").unwrap()
    }

    #[tokio::test]
    async fn fetches_repository_public_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo-org/widgets/actions/secrets/public-key");
                then.status(200).json_body(json!({
                    "key_id": "012345678912345678",
                    "key": "2Sg8iYjAxxmI2LvUXpJjkYrMxURPc8r+dB7TJyvv1234"
                }));
            })
            .await;
        let client = client_for(&server.base_url());

        let key = client.repository_public_key(&repo()).await.unwrap();

        assert_eq!(key.key_id.as_str(), "012345678912345678");
        assert_eq!(key.key, "2Sg8iYjAxxmI2LvUXpJjkYrMxURPc8r+dB7TJyvv1234");
    }

    #[tokio::test]
    async fn upserts_secret_with_key_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/repos/octo-org/widgets/actions/secrets/GPG_KEY")
                    .json_body(json!({ "encrypted_value": "c2VhbGVk", "key_id": "42" }));
                then.status(201);
            })
            .await;
        let client = client_for(&server.base_url());

        client
            .upsert_secret(
                &repo(),
                &SecretName::gpg_key(),
                &EncryptedSecret {
                    key_id: RepositoryKeyId::new("42").unwrap(),
                    encrypted_value: "c2VhbGVk".to_string(),
                },
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upsert_failure_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/repos/octo-org/widgets/actions/secrets/GPG_KEY");
                then.status(500).json_body(json!({ "message": "Internal Server Error" }));
            })
            .await;
        let client = client_for(&server.base_url());

        let error = client
            .upsert_secret(
                &repo(),
                &SecretName::gpg_key(),
                &EncryptedSecret {
                    key_id: RepositoryKeyId::new("42").unwrap(),
                    encrypted_value: "c2VhbGVk".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, RemoteApiError::Status { status: 500, .. }));
    }
}
