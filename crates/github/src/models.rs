//! Wire shapes of the GitHub REST endpoints this crate calls.
//!
//! Only the fields the adapter reads are modelled; serde ignores the rest.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct Repository {
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Branch {
    pub commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchCommit {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitDetail {
    pub tree: ShaRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShaRef {
    pub sha: String,
}

/// `GET /repos/{owner}/{repo}/contents/{path}` for a file.
///
/// A directory yields a JSON array instead, which fails to decode into this type.
#[derive(Debug, Deserialize)]
pub(crate) struct ContentFile {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewBlob<'a> {
    pub content: &'a str,
    pub encoding: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewTree<'a> {
    pub base_tree: &'a str,
    pub tree: [TreeEntry<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct TreeEntry<'a> {
    pub path: &'a str,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sha: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewCommit<'a> {
    pub message: &'a str,
    pub tree: &'a str,
    pub parents: [&'a str; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct RefUpdate<'a> {
    pub sha: &'a str,
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SecretsPublicKey {
    pub key_id: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SecretUpsert<'a> {
    pub encrypted_value: &'a str,
    pub key_id: &'a str,
}
