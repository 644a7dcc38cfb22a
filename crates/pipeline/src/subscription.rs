//! Subscription Resolver: reads and validates the opt-in descriptor.
//!
//! The descriptor lives at [`SUBSCRIPTION_PATH`] and is re-read on every
//! triggering event. It is never cached.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use tracing::{info, warn};

use crate::repository::RepositoryContents;
use crate::{ConfigError, PipelineError, RepositoryRef, SUBSCRIPTION_PATH, SUPPORTED_API_VERSION};

/// The parsed contents of `.github/secret-management.yaml`.
///
/// ```yaml
/// apiVersion: secret-management/v1
/// subscribe: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDescriptor {
    pub api_version: String,
    pub subscribe: bool,

    /// Advisory; kept for downstream consumers, unused by provisioning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_path_regex: Option<String>,

    /// Advisory reference to a parent descriptor; not resolved here.
    #[serde(
        rename = "_extends",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub extends: Option<String>,
}

/// Parses descriptor text into a [`SubscriptionDescriptor`].
///
/// Presence of the required keys is checked on the untyped document first so
/// callers get a precise [`ConfigError`] instead of a generic parser message.
pub fn parse_descriptor(text: &str) -> Result<SubscriptionDescriptor, ConfigError> {
    if text.trim().is_empty() {
        return Err(ConfigError::EmptyDocument);
    }

    let document: Value = serde_yaml_ng::from_str(text).map_err(|e| ConfigError::Invalid {
        message: e.to_string(),
    })?;

    let mapping = match &document {
        Value::Null => return Err(ConfigError::EmptyDocument),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(ConfigError::Invalid {
                message: "expected a mapping at the document root".to_string(),
            })
        }
    };
    if matches!(mapping.get("apiVersion"), None | Some(Value::Null)) {
        return Err(ConfigError::MissingApiVersion);
    }
    if matches!(mapping.get("subscribe"), None | Some(Value::Null)) {
        return Err(ConfigError::MissingSubscribe);
    }

    let descriptor: SubscriptionDescriptor =
        serde_yaml_ng::from_value(document).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;

    if descriptor.api_version.trim().is_empty() {
        return Err(ConfigError::MissingApiVersion);
    }
    Ok(descriptor)
}

/// Result of resolving a repository's subscription state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The descriptor parsed and opts in.
    Subscribed(SubscriptionDescriptor),
    /// The descriptor parsed and opts out (`subscribe: false`).
    Unsubscribed(SubscriptionDescriptor),
    /// No descriptor exists in the repository.
    NotFound,
}

/// Fetches and parses the descriptor from a repository's default branch.
pub struct SubscriptionResolver {
    contents: Arc<dyn RepositoryContents>,
}

impl SubscriptionResolver {
    pub fn new(contents: Arc<dyn RepositoryContents>) -> Self {
        Self { contents }
    }

    /// Resolves the subscription state of `repo`.
    ///
    /// A missing file is [`Resolution::NotFound`], not an error. Any other fetch
    /// failure and any parse failure is returned as a [`PipelineError`].
    pub async fn resolve(&self, repo: &RepositoryRef) -> Result<Resolution, PipelineError> {
        let Some(file) = self.contents.get_file(repo, SUBSCRIPTION_PATH, None).await? else {
            info!(repository = %repo, path = SUBSCRIPTION_PATH, "no subscription descriptor found");
            return Ok(Resolution::NotFound);
        };

        let descriptor = parse_descriptor(&file.text).inspect_err(|e| {
            warn!(repository = %repo, error = %e, "subscription descriptor rejected");
        })?;

        if descriptor.api_version != SUPPORTED_API_VERSION {
            warn!(
                repository = %repo,
                api_version = %descriptor.api_version,
                expected = SUPPORTED_API_VERSION,
                "unrecognised descriptor apiVersion, continuing"
            );
        }

        if descriptor.subscribe {
            info!(repository = %repo, "repository is subscribed");
            Ok(Resolution::Subscribed(descriptor))
        } else {
            info!(repository = %repo, "repository has opted out (subscribe: false)");
            Ok(Resolution::Unsubscribed(descriptor))
        }
    }
}
