//! Command-line arguments. Every option also reads an environment variable.

use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "gpg-secret-bot",
    version,
    about = "Provisions a GPG key pair and GPG_KEY secret for subscribed GitHub repositories"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the webhook listener.
    Serve(ServeArgs),
    /// Run the pipeline once for one repository, as a manual dispatch would.
    Process(ProcessArgs),
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Token with contents and secrets write access.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub github_token: Option<String>,

    #[arg(
        long,
        env = "GITHUB_API_URL",
        default_value = github::DEFAULT_API_URL,
        global = true
    )]
    pub github_api_url: String,

    #[arg(long, env = "GPG_PROGRAM", default_value = "gpg", global = true)]
    pub gpg_program: String,

    #[arg(long, env = "GPGCONF_PROGRAM", default_value = "gpgconf", global = true)]
    pub gpgconf_program: String,

    /// Algorithm passed to `gpg --quick-generate-key`.
    #[arg(long, env = "GPG_KEY_ALGORITHM", default_value = "default", global = true)]
    pub gpg_key_algorithm: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// OTLP gRPC endpoint. Span export is disabled when unset.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", global = true)]
    pub otlp_endpoint: Option<String>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:3000")]
    pub bind_address: SocketAddr,

    /// Shared secret for `X-Hub-Signature-256`. Verification is disabled when unset.
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// `owner/name` of the repository.
    #[arg(long)]
    pub repository: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn process_takes_repository() {
        let cli = Cli::try_parse_from([
            "gpg-secret-bot",
            "--github-token",
            "ghp_example",
            "--log-format",
            "json",
            "process",
            "--repository",
            "octo-org/widgets",
        ])
        .unwrap();

        assert_eq!(cli.global.github_token.as_deref(), Some("ghp_example"));
        assert_eq!(cli.global.log_format, LogFormat::Json);
        let Command::Process(args) = cli.command else {
            panic!("expected process");
        };
        assert_eq!(args.repository, "octo-org/widgets");
    }

    #[test]
    fn serve_parses_bind_address() {
        let cli = Cli::try_parse_from([
            "gpg-secret-bot",
            "serve",
            "--bind-address",
            "127.0.0.1:8080",
            "--gpg-program",
            "/usr/bin/gpg2",
        ])
        .unwrap();

        assert_eq!(cli.global.gpg_program, "/usr/bin/gpg2");
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind_address, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn process_requires_repository() {
        assert!(Cli::try_parse_from(["gpg-secret-bot", "process"]).is_err());
    }
}
