//! Validated runtime configuration assembled from [`GlobalArgs`].

use thiserror::Error;

use github::GithubConfig;
use keygen::GpgConfig;

use crate::args::{GlobalArgs, LogFormat};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("a GitHub token is required (set GITHUB_TOKEN or pass --github-token)")]
    MissingToken,

    #[error("GitHub API URL `{0}` must start with http:// or https://")]
    InvalidApiUrl(String),

    #[error("`{0}` must not be empty")]
    Empty(&'static str),
}

/// Logging settings, read before anything else is constructed.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl LogConfig {
    pub fn from_args(args: &GlobalArgs) -> Self {
        Self {
            format: args.log_format,
            otlp_endpoint: args
                .otlp_endpoint
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub github: GithubConfig,
    pub gpg: GpgConfig,
}

impl BotConfig {
    pub fn from_args(args: &GlobalArgs) -> Result<Self, ConfigurationError> {
        let token = args
            .github_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigurationError::MissingToken)?;

        let api_url = args.github_api_url.trim();
        if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
            return Err(ConfigurationError::InvalidApiUrl(api_url.to_string()));
        }

        let gpg = GpgConfig {
            program: non_empty("--gpg-program", &args.gpg_program)?,
            gpgconf_program: non_empty("--gpgconf-program", &args.gpgconf_program)?,
            algorithm: non_empty("--gpg-key-algorithm", &args.gpg_key_algorithm)?,
            scratch_dir: None,
        };

        Ok(Self {
            github: GithubConfig {
                api_url: api_url.to_string(),
                token: token.to_string(),
                user_agent: format!("gpg-secret-bot/{}", env!("CARGO_PKG_VERSION")),
            },
            gpg,
        })
    }
}

fn non_empty(name: &'static str, value: &str) -> Result<String, ConfigurationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ConfigurationError::Empty(name))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args() -> GlobalArgs {
        GlobalArgs {
            github_token: Some("ghp_example".to_string()),
            github_api_url: "https://github.example.com/api/v3".to_string(),
            gpg_program: "gpg".to_string(),
            gpgconf_program: "gpgconf".to_string(),
            gpg_key_algorithm: "ed25519".to_string(),
            log_format: LogFormat::Pretty,
            otlp_endpoint: None,
        }
    }

    #[test]
    fn builds_github_and_gpg_settings() {
        let config = BotConfig::from_args(&args()).unwrap();

        assert_eq!(config.github.api_url, "https://github.example.com/api/v3");
        assert_eq!(config.github.token, "ghp_example");
        assert!(config.github.user_agent.starts_with("gpg-secret-bot/"));
        assert_eq!(config.gpg.algorithm, "ed25519");
    }

    #[test]
    fn token_is_required() {
        for token in [None, Some("  ".to_string())] {
            let args = GlobalArgs {
                github_token: token,
                ..args()
            };
            assert_eq!(
                BotConfig::from_args(&args).unwrap_err(),
                ConfigurationError::MissingToken
            );
        }
    }

    #[test]
    fn api_url_must_be_http() {
        let args = GlobalArgs {
            github_api_url: "api.github.com".to_string(),
            ..args()
        };
        assert!(matches!(
            BotConfig::from_args(&args),
            Err(ConfigurationError::InvalidApiUrl(_))
        ));
    }

    #[test]
    fn empty_gpg_program_is_rejected() {
        let args = GlobalArgs {
            gpg_program: String::new(),
            ..args()
        };
        assert_eq!(
            BotConfig::from_args(&args).unwrap_err(),
            ConfigurationError::Empty("--gpg-program")
        );
    }

    #[test]
    fn blank_otlp_endpoint_disables_export() {
        let args = GlobalArgs {
            otlp_endpoint: Some(" ".to_string()),
            ..args()
        };
        assert_eq!(LogConfig::from_args(&args).otlp_endpoint, None);
    }
}
