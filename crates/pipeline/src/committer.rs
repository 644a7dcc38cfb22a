//! Public Key Committer: writes the armored public key to [`PUBLIC_KEY_PATH`].
//!
//! The commit is synthesised through the Git data API (blob, tree, commit, ref)
//! against the default branch head, so no working copy is needed. There is no
//! retry when the branch moves between reading the head and updating the ref:
//! the non-forced ref update fails and the error propagates.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::repository::RepositoryContents;
use crate::{BranchName, CommitSha, PipelineError, RepositoryRef, PUBLIC_KEY_PATH};

/// Message of every public-key commit.
pub const COMMIT_MESSAGE: &str = "Add GPG public key for secret management";

/// Result of [`PublicKeyCommitter::commit_public_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// A new commit now heads `branch`.
    Committed { branch: BranchName, commit: CommitSha },
    /// A file was already present at the public-key path; nothing was written.
    AlreadyExists,
}

pub struct PublicKeyCommitter {
    contents: Arc<dyn RepositoryContents>,
}

impl PublicKeyCommitter {
    pub fn new(contents: Arc<dyn RepositoryContents>) -> Self {
        Self { contents }
    }

    /// Commits `public_key_armored` to the default branch as a single-file change.
    pub async fn commit_public_key(
        &self,
        repo: &RepositoryRef,
        public_key_armored: &str,
    ) -> Result<CommitOutcome, PipelineError> {
        let head = self.contents.default_branch_head(repo).await?;
        debug!(
            repository = %repo,
            branch = %head.branch,
            head = %head.commit,
            "resolved default branch head"
        );

        // The provisioner checked earlier; re-check on the exact branch we build on.
        if self
            .contents
            .get_file(repo, PUBLIC_KEY_PATH, Some(&head.branch))
            .await?
            .is_some()
        {
            info!(repository = %repo, path = PUBLIC_KEY_PATH, "public key already committed");
            return Ok(CommitOutcome::AlreadyExists);
        }

        let blob = self.contents.create_blob(repo, public_key_armored).await?;
        let tree = self
            .contents
            .create_tree(repo, &head.tree, PUBLIC_KEY_PATH, &blob)
            .await?;
        let commit = self
            .contents
            .create_commit(repo, COMMIT_MESSAGE, &tree, &head.commit)
            .await?;
        self.contents
            .update_branch(repo, &head.branch, &commit)
            .await?;

        info!(
            repository = %repo,
            branch = %head.branch,
            commit = %commit,
            path = PUBLIC_KEY_PATH,
            "public key committed"
        );
        Ok(CommitOutcome::Committed {
            branch: head.branch,
            commit,
        })
    }
}
