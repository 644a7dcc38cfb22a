//! [`RepositoryContents`] over the contents and Git data endpoints.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::debug;

use pipeline::{
    BlobSha, BranchHead, BranchName, CommitSha, FileContent, RemoteApiError, RepositoryContents,
    RepositoryRef, TreeSha,
};

use crate::client::GithubClient;
use crate::models::{
    Branch, ContentFile, NewBlob, NewCommit, NewTree, RefUpdate, Repository, ShaRef, TreeEntry,
};

/// Wraps a non-empty string from a response into a newtype, or reports a malformed response.
pub(crate) fn required<T>(
    operation: &'static str,
    field: &str,
    value: String,
    ctor: impl FnOnce(String) -> Option<T>,
) -> Result<T, RemoteApiError> {
    ctor(value).ok_or_else(|| RemoteApiError::MalformedResponse {
        operation,
        message: format!("`{field}` is empty"),
    })
}

fn decode_file(path: &str, file: ContentFile) -> Result<FileContent, RemoteApiError> {
    const OP: &str = "get_file";
    if file.kind != "file" {
        return Err(RemoteApiError::MalformedResponse {
            operation: OP,
            message: format!("`{path}` is a {}, not a file", file.kind),
        });
    }
    if file.encoding != "base64" {
        return Err(RemoteApiError::MalformedResponse {
            operation: OP,
            message: format!("unsupported content encoding `{}`", file.encoding),
        });
    }

    // GitHub wraps the base64 payload at 60 columns.
    let compact: String = file.content.split_whitespace().collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| RemoteApiError::MalformedResponse {
            operation: OP,
            message: format!("content is not valid base64: {e}"),
        })?;
    let text = String::from_utf8(bytes).map_err(|_| RemoteApiError::MalformedResponse {
        operation: OP,
        message: format!("`{path}` is not UTF-8 text"),
    })?;

    Ok(FileContent {
        path: path.to_string(),
        text,
    })
}

#[async_trait]
impl RepositoryContents for GithubClient {
    async fn get_file(
        &self,
        repo: &RepositoryRef,
        path: &str,
        git_ref: Option<&BranchName>,
    ) -> Result<Option<FileContent>, RemoteApiError> {
        let mut request = self
            .http()
            .get(self.url(&format!("/repos/{repo}/contents/{path}")));
        if let Some(git_ref) = git_ref {
            request = request.query(&[("ref", git_ref.as_str())]);
        }

        match self
            .send_json_optional::<ContentFile>("get_file", request)
            .await?
        {
            Some(file) => decode_file(path, file).map(Some),
            None => {
                debug!(repository = %repo, path, "file not found");
                Ok(None)
            }
        }
    }

    async fn default_branch_head(
        &self,
        repo: &RepositoryRef,
    ) -> Result<BranchHead, RemoteApiError> {
        const OP: &str = "default_branch_head";
        let repository: Repository = self
            .send_json(OP, self.http().get(self.url(&format!("/repos/{repo}"))))
            .await?;
        let branch = required(OP, "default_branch", repository.default_branch, BranchName::new)?;

        let head: Branch = self
            .send_json(
                OP,
                self.http()
                    .get(self.url(&format!("/repos/{repo}/branches/{branch}"))),
            )
            .await?;

        Ok(BranchHead {
            commit: required(OP, "commit.sha", head.commit.sha, CommitSha::new)?,
            tree: required(
                OP,
                "commit.commit.tree.sha",
                head.commit.commit.tree.sha,
                TreeSha::new,
            )?,
            branch,
        })
    }

    async fn create_blob(
        &self,
        repo: &RepositoryRef,
        content: &str,
    ) -> Result<BlobSha, RemoteApiError> {
        const OP: &str = "create_blob";
        let created: ShaRef = self
            .send_json(
                OP,
                self.http()
                    .post(self.url(&format!("/repos/{repo}/git/blobs")))
                    .json(&NewBlob {
                        content,
                        encoding: "utf-8",
                    }),
            )
            .await?;
        required(OP, "sha", created.sha, BlobSha::new)
    }

    async fn create_tree(
        &self,
        repo: &RepositoryRef,
        base_tree: &TreeSha,
        path: &str,
        blob: &BlobSha,
    ) -> Result<TreeSha, RemoteApiError> {
        const OP: &str = "create_tree";
        let created: ShaRef = self
            .send_json(
                OP,
                self.http()
                    .post(self.url(&format!("/repos/{repo}/git/trees")))
                    .json(&NewTree {
                        base_tree: base_tree.as_str(),
                        tree: [TreeEntry {
                            path,
                            mode: "100644",
                            kind: "blob",
                            sha: blob.as_str(),
                        }],
                    }),
            )
            .await?;
        required(OP, "sha", created.sha, TreeSha::new)
    }

    async fn create_commit(
        &self,
        repo: &RepositoryRef,
        message: &str,
        tree: &TreeSha,
        parent: &CommitSha,
    ) -> Result<CommitSha, RemoteApiError> {
        const OP: &str = "create_commit";
        let created: ShaRef = self
            .send_json(
                OP,
                self.http()
                    .post(self.url(&format!("/repos/{repo}/git/commits")))
                    .json(&NewCommit {
                        message,
                        tree: tree.as_str(),
                        parents: [parent.as_str()],
                    }),
            )
            .await?;
        required(OP, "sha", created.sha, CommitSha::new)
    }

    async fn update_branch(
        &self,
        repo: &RepositoryRef,
        branch: &BranchName,
        commit: &CommitSha,
    ) -> Result<(), RemoteApiError> {
        self.send_empty(
            "update_branch",
            self.http()
                .patch(self.url(&format!("/repos/{repo}/git/refs/heads/{branch}")))
                .json(&RefUpdate {
                    sha: commit.as_str(),
                    force: false,
                }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::client::test_support::client_for;

    fn repo() -> RepositoryRef {
        RepositoryRef::parse("octo-org/widgets").unwrap()
    }

    #[tokio::test]
    async fn get_file_decodes_wrapped_base64() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo-org/widgets/contents/.github/secret-management.yaml");
                then.status(200).json_body(json!({
                    "type": "file",
                    "encoding": "base64",
                    "content": "YXBpVmVyc2lvbjogc2VjcmV0LW1hbmFnZW1lbnQvdjEK\nc3Vic2NyaWJlOiB0cnVlCg==\n",
                    "sha": "3d21ec53a331a6f037a91c368710b99387d012c1"
                }));
            })
            .await;
        let client = client_for(&server.base_url());

        let file = client
            .get_file(&repo(), ".github/secret-management.yaml", None)
            .await
            .unwrap()
            .expect("file present");

        assert_eq!(file.text, "apiVersion: secret-management/v1\nsubscribe: true\n");
    }

    #[tokio::test]
    async fn get_file_passes_ref_and_maps_404_to_none() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo-org/widgets/contents/.github/.gpg")
                    .query_param("ref", "main");
                then.status(404).json_body(json!({ "message": "Not Found" }));
            })
            .await;
        let client = client_for(&server.base_url());
        let branch = BranchName::new("main").unwrap();

        let file = client
            .get_file(&repo(), ".github/.gpg", Some(&branch))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(file.is_none());
    }

    #[tokio::test]
    async fn get_file_rejects_directories() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo-org/widgets/contents/.github");
                then.status(200).json_body(json!({ "type": "dir" }));
            })
            .await;
        let client = client_for(&server.base_url());

        let error = client.get_file(&repo(), ".github", None).await.unwrap_err();
        assert!(matches!(error, RemoteApiError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn default_branch_head_resolves_commit_and_tree() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo-org/widgets");
                then.status(200).json_body(json!({ "default_branch": "trunk" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo-org/widgets/branches/trunk");
                then.status(200).json_body(json!({
                    "name": "trunk",
                    "commit": {
                        "sha": "7638417db6d59f3c431d3e1f261cc637155684cd",
                        "commit": { "tree": { "sha": "827efc6d56897b048c772eb4087f854f46256132" } }
                    }
                }));
            })
            .await;
        let client = client_for(&server.base_url());

        let head = client.default_branch_head(&repo()).await.unwrap();

        assert_eq!(head.branch.as_str(), "trunk");
        assert_eq!(head.commit.as_str(), "7638417db6d59f3c431d3e1f261cc637155684cd");
        assert_eq!(head.tree.as_str(), "827efc6d56897b048c772eb4087f854f46256132");
    }

    #[tokio::test]
    async fn git_data_calls_send_expected_bodies() {
        let server = MockServer::start_async().await;
        let blob = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/octo-org/widgets/git/blobs")
                    .json_body(json!({ "content": "KEY", "encoding": "utf-8" }));
                then.status(201).json_body(json!({ "sha": "b1" }));
            })
            .await;
        let tree = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/octo-org/widgets/git/trees")
                    .json_body(json!({
                        "base_tree": "t0",
                        "tree": [{ "path": ".github/.gpg", "mode": "100644", "type": "blob", "sha": "b1" }]
                    }));
                then.status(201).json_body(json!({ "sha": "t1" }));
            })
            .await;
        let commit = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/octo-org/widgets/git/commits")
                    .json_body(json!({ "message": "msg", "tree": "t1", "parents": ["c0"] }));
                then.status(201).json_body(json!({ "sha": "c1" }));
            })
            .await;
        let update = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/repos/octo-org/widgets/git/refs/heads/main")
                    .json_body(json!({ "sha": "c1", "force": false }));
                then.status(200).json_body(json!({ "ref": "refs/heads/main" }));
            })
            .await;
        let client = client_for(&server.base_url());
        let repo = repo();

        let blob_sha = client.create_blob(&repo, "KEY").await.unwrap();
        let tree_sha = client
            .create_tree(&repo, &TreeSha::new("t0").unwrap(), ".github/.gpg", &blob_sha)
            .await
            .unwrap();
        let commit_sha = client
            .create_commit(&repo, "msg", &tree_sha, &CommitSha::new("c0").unwrap())
            .await
            .unwrap();
        client
            .update_branch(&repo, &BranchName::new("main").unwrap(), &commit_sha)
            .await
            .unwrap();

        blob.assert_async().await;
        tree.assert_async().await;
        commit.assert_async().await;
        update.assert_async().await;
        assert_eq!(commit_sha.as_str(), "c1");
    }

    #[tokio::test]
    async fn rejected_fast_forward_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PATCH).path("/repos/octo-org/widgets/git/refs/heads/main");
                then.status(422)
                    .json_body(json!({ "message": "Update is not a fast forward" }));
            })
            .await;
        let client = client_for(&server.base_url());

        let error = client
            .update_branch(
                &repo(),
                &BranchName::new("main").unwrap(),
                &CommitSha::new("c1").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(error, RemoteApiError::Status { status: 422, .. }));
    }
}
