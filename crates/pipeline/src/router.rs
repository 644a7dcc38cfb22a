//! Event Router: decides whether an inbound event warrants a pipeline run.
//!
//! Transport crates normalise their payloads into [`RepositoryEvent`]; the router
//! maps each event to zero or one [`ProvisioningRequest`] and logs the decision.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{RepositoryRef, DISPATCH_ACTION, SUBSCRIPTION_PATH};

/// The file changes of one commit in a push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushCommit {
    pub added: Vec<String>,
    pub modified: Vec<String>,
}

/// A normalised repository event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepositoryEvent {
    /// Code was pushed.
    Push {
        repository: RepositoryRef,
        commits: Vec<PushCommit>,
    },
    /// A repository was created.
    RepositoryCreated { repository: RepositoryRef },
    /// An action was dispatched manually.
    Dispatch {
        repository: RepositoryRef,
        action: String,
    },
}

impl RepositoryEvent {
    /// The repository the event concerns.
    pub fn repository(&self) -> &RepositoryRef {
        match self {
            Self::Push { repository, .. }
            | Self::RepositoryCreated { repository }
            | Self::Dispatch { repository, .. } => repository,
        }
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Push { .. } => "push",
            Self::RepositoryCreated { .. } => "repository_created",
            Self::Dispatch { .. } => "dispatch",
        }
    }
}

/// A request to run the provisioning pipeline for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub repository: RepositoryRef,
    /// [`RepositoryEvent::kind`] of the triggering event.
    pub trigger: &'static str,
}

/// Maps `event` to a provisioning request, or `None` when it is irrelevant.
pub fn route(event: &RepositoryEvent) -> Option<ProvisioningRequest> {
    let repository = event.repository();
    let relevant = match event {
        RepositoryEvent::Push { commits, .. } => {
            let touched = commits
                .iter()
                .flat_map(|c| c.added.iter().chain(c.modified.iter()))
                .any(|path| path == SUBSCRIPTION_PATH);
            if !touched {
                debug!(%repository, "push did not touch the subscription descriptor");
            }
            touched
        }
        RepositoryEvent::RepositoryCreated { .. } => true,
        RepositoryEvent::Dispatch { action, .. } => {
            let matches = action == DISPATCH_ACTION;
            if !matches {
                debug!(%repository, action = %action, "ignoring dispatch with unknown action");
            }
            matches
        }
    };

    if !relevant {
        return None;
    }

    info!(%repository, trigger = event.kind(), "event triggers provisioning");
    Some(ProvisioningRequest {
        repository: repository.clone(),
        trigger: event.kind(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepositoryRef {
        RepositoryRef::parse("octo-org/widgets").unwrap()
    }

    fn push(commits: Vec<PushCommit>) -> RepositoryEvent {
        RepositoryEvent::Push {
            repository: repo(),
            commits,
        }
    }

    #[test]
    fn push_touching_descriptor_triggers() {
        let event = push(vec![
            PushCommit {
                added: vec!["README.md".into()],
                modified: vec![],
            },
            PushCommit {
                added: vec![],
                modified: vec![SUBSCRIPTION_PATH.into()],
            },
        ]);

        let request = route(&event).expect("push should trigger");
        assert_eq!(request.repository, repo());
        assert_eq!(request.trigger, "push");
    }

    #[test]
    fn push_adding_descriptor_triggers() {
        let event = push(vec![PushCommit {
            added: vec![SUBSCRIPTION_PATH.into()],
            modified: vec![],
        }]);
        assert!(route(&event).is_some());
    }

    #[test]
    fn push_not_touching_descriptor_is_ignored() {
        let event = push(vec![PushCommit {
            added: vec!["src/main.rs".into()],
            modified: vec![".github/workflows/ci.yaml".into()],
        }]);
        assert!(route(&event).is_none());
    }

    #[test]
    fn push_without_commits_is_ignored() {
        assert!(route(&push(vec![])).is_none());
    }

    #[test]
    fn repository_creation_always_triggers() {
        let event = RepositoryEvent::RepositoryCreated { repository: repo() };
        assert_eq!(route(&event).unwrap().trigger, "repository_created");
    }

    #[test]
    fn dispatch_requires_exact_action() {
        let matching = RepositoryEvent::Dispatch {
            repository: repo(),
            action: DISPATCH_ACTION.into(),
        };
        let other = RepositoryEvent::Dispatch {
            repository: repo(),
            action: "deploy".into(),
        };

        assert!(route(&matching).is_some());
        assert!(route(&other).is_none());
    }
}
