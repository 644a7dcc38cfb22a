//! Port traits for the remote repository content and secrets APIs.
//!
//! The `github` crate implements both traits over the GitHub REST API. The
//! pipeline only ever sees these traits, so tests drive every stage with the
//! in-memory fakes in [`crate::fakes`].

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    BlobSha, BranchHead, BranchName, CommitSha, EncryptedSecret, FileContent, RepositoryPublicKey,
    RepositoryRef, SecretName, TreeSha,
};

/// Failure of a remote API call.
///
/// "Not found" on a content read is **not** represented here: it is a
/// control-flow signal and surfaces as `Ok(None)` from
/// [`RepositoryContents::get_file`].
#[derive(Debug, Error)]
pub enum RemoteApiError {
    /// The request never produced an HTTP response (DNS, TLS, connection reset).
    #[error("transport failure calling {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// The credentials were rejected or lack the required permission.
    #[error("{operation} was not authorised (HTTP {status})")]
    Unauthorized { operation: &'static str, status: u16 },

    /// The API answered with an unexpected status code.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("{operation} returned a malformed response: {message}")]
    MalformedResponse {
        operation: &'static str,
        message: String,
    },
}

/// Read and write access to a repository's files and Git objects.
#[async_trait]
pub trait RepositoryContents: Send + Sync {
    /// Reads the file at `path`, from `git_ref` or the default branch when `None`.
    ///
    /// Returns `Ok(None)` when no file exists at that path.
    async fn get_file(
        &self,
        repo: &RepositoryRef,
        path: &str,
        git_ref: Option<&BranchName>,
    ) -> Result<Option<FileContent>, RemoteApiError>;

    /// Resolves the default branch and the commit and tree it points at.
    async fn default_branch_head(&self, repo: &RepositoryRef)
        -> Result<BranchHead, RemoteApiError>;

    /// Stores `content` as a blob.
    async fn create_blob(
        &self,
        repo: &RepositoryRef,
        content: &str,
    ) -> Result<BlobSha, RemoteApiError>;

    /// Creates a tree equal to `base_tree` with `path` set to `blob` (mode `100644`).
    async fn create_tree(
        &self,
        repo: &RepositoryRef,
        base_tree: &TreeSha,
        path: &str,
        blob: &BlobSha,
    ) -> Result<TreeSha, RemoteApiError>;

    /// Creates a commit for `tree` with `parent` as its sole parent.
    async fn create_commit(
        &self,
        repo: &RepositoryRef,
        message: &str,
        tree: &TreeSha,
        parent: &CommitSha,
    ) -> Result<CommitSha, RemoteApiError>;

    /// Moves `branch` to `commit`. Must not force: a non-fast-forward is an error.
    async fn update_branch(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
        commit: &CommitSha,
    ) -> Result<(), RemoteApiError>;
}

/// Access to a repository's Actions secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetches the repository's current secrets encryption key.
    async fn repository_public_key(
        &self,
        repo: &RepositoryRef,
    ) -> Result<RepositoryPublicKey, RemoteApiError>;

    /// Creates or replaces the secret `name`.
    async fn upsert_secret(
        &self,
        repo: &RepositoryRef,
        name: &SecretName,
        secret: &EncryptedSecret,
    ) -> Result<(), RemoteApiError>;
}
