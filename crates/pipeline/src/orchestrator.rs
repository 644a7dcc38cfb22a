//! Drives one provisioning run through every stage.
//!
//! Stages run strictly in order and each may end the run early:
//!
//! 1. [`SubscriptionResolver`]: no descriptor, or `subscribe: false`, ends the run.
//! 2. [`KeyProvisioner`]: a committed public key ends the run.
//! 3. [`SecretPublisher`]: seals and upserts the private key.
//! 4. [`PublicKeyCommitter`]: commits the public key.
//!
//! A failing stage aborts the run; later stages never execute.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, info_span, Instrument};

use crate::committer::{CommitOutcome, PublicKeyCommitter};
use crate::keys::KeyGenerator;
use crate::provisioner::{KeyProvisioner, Provision};
use crate::publisher::SecretPublisher;
use crate::repository::{RepositoryContents, SecretStore};
use crate::router::ProvisioningRequest;
use crate::subscription::{Resolution, SubscriptionResolver};
use crate::{KeyFingerprint, PipelineError, PipelineRunId, RepositoryRef};

/// Why a run stopped without provisioning anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotApplicableReason {
    /// The repository has no subscription descriptor.
    NoSubscriptionFile,
    /// The descriptor has `subscribe: false`.
    Unsubscribed,
    /// A public key is already committed.
    PublicKeyPresent,
}

/// Result of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    NotApplicable {
        reason: NotApplicableReason,
    },
    /// A key was generated and its secret upserted.
    ///
    /// `commit` is [`CommitOutcome::AlreadyExists`] when another run committed a
    /// key between this run's idempotency check and its commit.
    Provisioned {
        fingerprint: KeyFingerprint,
        commit: CommitOutcome,
    },
}

/// The assembled pipeline. Cheap to share behind an `Arc`.
pub struct SecretManagementPipeline {
    resolver: SubscriptionResolver,
    provisioner: KeyProvisioner,
    publisher: SecretPublisher,
    committer: PublicKeyCommitter,
}

impl SecretManagementPipeline {
    pub fn new(
        contents: Arc<dyn RepositoryContents>,
        secrets: Arc<dyn SecretStore>,
        keys: Arc<dyn KeyGenerator>,
    ) -> Self {
        Self {
            resolver: SubscriptionResolver::new(contents.clone()),
            provisioner: KeyProvisioner::new(contents.clone(), keys),
            publisher: SecretPublisher::new(secrets),
            committer: PublicKeyCommitter::new(contents),
        }
    }

    /// Runs every stage for `request.repository` inside a span tagged with `run_id`.
    pub async fn run(
        &self,
        request: &ProvisioningRequest,
        run_id: PipelineRunId,
    ) -> Result<PipelineOutcome, PipelineError> {
        let repo = &request.repository;
        let span = info_span!(
            "provisioning_run",
            %run_id,
            repository = %repo,
            trigger = request.trigger,
        );

        async move {
            let result = self.run_stages(repo).await;
            match &result {
                Ok(outcome) => info!(?outcome, "provisioning run finished"),
                Err(e) => error!(error = %e, kind = e.kind(), "provisioning run failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_stages(&self, repo: &RepositoryRef) -> Result<PipelineOutcome, PipelineError> {
        match self.resolver.resolve(repo).await? {
            Resolution::NotFound => {
                return Ok(not_applicable(NotApplicableReason::NoSubscriptionFile))
            }
            Resolution::Unsubscribed(_) => {
                return Ok(not_applicable(NotApplicableReason::Unsubscribed))
            }
            Resolution::Subscribed(_) => {}
        }

        let pair = match self.provisioner.provision(repo).await? {
            Provision::Skipped => return Ok(not_applicable(NotApplicableReason::PublicKeyPresent)),
            Provision::Generated(pair) => pair,
        };

        if let Err(e) = self
            .publisher
            .publish(repo, &pair.private_key_armored)
            .await
        {
            // The key exists nowhere else once this run returns.
            error!(
                fingerprint = %pair.fingerprint,
                error = %e,
                "secret publish failed, generated key is orphaned"
            );
            return Err(e);
        }

        let commit = self
            .committer
            .commit_public_key(repo, &pair.public_key_armored)
            .await?;

        Ok(PipelineOutcome::Provisioned {
            fingerprint: pair.fingerprint.clone(),
            commit,
        })
    }
}

fn not_applicable(reason: NotApplicableReason) -> PipelineOutcome {
    PipelineOutcome::NotApplicable { reason }
}
