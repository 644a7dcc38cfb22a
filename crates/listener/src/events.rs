//! Normalisation of GitHub webhook payloads into [`RepositoryEvent`]s.

use serde::Deserialize;

use pipeline::{OwnerName, PushCommit, RepositoryEvent, RepositoryName, RepositoryRef};

use crate::WebhookError;

#[derive(Deserialize)]
struct Owner {
    login: String,
}

#[derive(Deserialize)]
struct Repository {
    name: String,
    owner: Owner,
}

#[derive(Deserialize)]
struct Commit {
    #[serde(default)]
    added: Vec<String>,
    #[serde(default)]
    modified: Vec<String>,
}

#[derive(Deserialize)]
struct Payload {
    repository: Repository,
    action: Option<String>,
    #[serde(default)]
    commits: Vec<Commit>,
}

/// Parses the body of an `X-GitHub-Event: <event>` delivery.
///
/// Returns `Ok(None)` for event types and actions the bot does not act on.
pub fn normalize(event: &str, body: &[u8]) -> Result<Option<RepositoryEvent>, WebhookError> {
    if !matches!(event, "push" | "repository" | "repository_dispatch") {
        return Ok(None);
    }

    let payload: Payload = serde_json::from_slice(body)
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
    let repository = repository_ref(payload.repository)?;

    let normalized = match event {
        "push" => Some(RepositoryEvent::Push {
            repository,
            commits: payload
                .commits
                .into_iter()
                .map(|c| PushCommit {
                    added: c.added,
                    modified: c.modified,
                })
                .collect(),
        }),
        "repository" => (payload.action.as_deref() == Some("created"))
            .then_some(RepositoryEvent::RepositoryCreated { repository }),
        _ => Some(RepositoryEvent::Dispatch {
            repository,
            action: payload.action.unwrap_or_default(),
        }),
    };
    Ok(normalized)
}

fn repository_ref(repository: Repository) -> Result<RepositoryRef, WebhookError> {
    let owner = OwnerName::new(repository.owner.login)
        .ok_or_else(|| WebhookError::MalformedPayload("empty repository owner".to_string()))?;
    let name = RepositoryName::new(repository.name)
        .ok_or_else(|| WebhookError::MalformedPayload("empty repository name".to_string()))?;
    Ok(RepositoryRef::new(owner, name))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn widgets() -> RepositoryRef {
        RepositoryRef::parse("octo-org/widgets").unwrap()
    }

    fn repository_json() -> serde_json::Value {
        json!({
            "name": "widgets",
            "full_name": "octo-org/widgets",
            "owner": { "login": "octo-org", "id": 1 },
        })
    }

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn push_keeps_commit_file_lists() {
        let payload = body(json!({
            "ref": "refs/heads/main",
            "repository": repository_json(),
            "commits": [
                { "id": "a1", "added": [".github/secret-management.yaml"], "modified": [], "removed": [] },
                { "id": "b2", "modified": ["README.md"] },
            ],
        }));

        let event = normalize("push", &payload).unwrap();

        assert_eq!(
            event,
            Some(RepositoryEvent::Push {
                repository: widgets(),
                commits: vec![
                    PushCommit {
                        added: vec![".github/secret-management.yaml".to_string()],
                        modified: vec![],
                    },
                    PushCommit {
                        added: vec![],
                        modified: vec!["README.md".to_string()],
                    },
                ],
            })
        );
    }

    #[test]
    fn repository_created_only() {
        let created = body(json!({ "action": "created", "repository": repository_json() }));
        assert_eq!(
            normalize("repository", &created).unwrap(),
            Some(RepositoryEvent::RepositoryCreated {
                repository: widgets()
            })
        );

        let archived = body(json!({ "action": "archived", "repository": repository_json() }));
        assert_eq!(normalize("repository", &archived).unwrap(), None);
    }

    #[test]
    fn dispatch_carries_action() {
        let payload = body(json!({
            "action": "process-secret-management",
            "branch": "main",
            "client_payload": {},
            "repository": repository_json(),
        }));

        assert_eq!(
            normalize("repository_dispatch", &payload).unwrap(),
            Some(RepositoryEvent::Dispatch {
                repository: widgets(),
                action: "process-secret-management".to_string(),
            })
        );
    }

    #[test]
    fn other_events_are_ignored_without_parsing() {
        assert_eq!(normalize("issues", b"not json").unwrap(), None);
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(matches!(
            normalize("push", b"{"),
            Err(WebhookError::MalformedPayload(_))
        ));
        assert!(matches!(
            normalize("push", &body(json!({ "commits": [] }))),
            Err(WebhookError::MalformedPayload(_))
        ));
        let empty_owner = body(json!({
            "repository": { "name": "widgets", "owner": { "login": "" } },
        }));
        assert!(matches!(
            normalize("push", &empty_owner),
            Err(WebhookError::MalformedPayload(_))
        ));
    }
}
