//! gpg-secret-bot entry point.
//!
//! This binary is the composition root for the entire system:
//!
//! 1. **Parse configuration**: `clap` flags with environment fallbacks,
//!    validated into a [`config::BotConfig`].
//! 2. **Wire observability**: `tracing-subscriber` with a pretty or JSON layer
//!    and, when an endpoint is configured, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: one `GithubClient` serving both repository
//!    ports and a `GpgKeyGenerator`, injected into `SecretManagementPipeline`.
//! 4. **Select run mode**:
//!    - `serve` runs the webhook listener until SIGINT or SIGTERM.
//!    - `process --repository owner/name` runs the pipeline once and prints the
//!      outcome as JSON. Any failure exits with status 1.

mod args;
mod config;
mod observability;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use github::GithubClient;
use keygen::GpgKeyGenerator;
use listener::WebhookState;
use pipeline::{PipelineRunId, ProvisioningRequest, RepositoryRef, SecretManagementPipeline};

use args::{Cli, Command, ProcessArgs, ServeArgs};
use config::{BotConfig, LogConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match observability::init(&LogConfig::from_args(&cli.global)) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(cli).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "gpg-secret-bot exited with an error");
    }
    telemetry.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = BotConfig::from_args(&cli.global)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        api_url = %config.github.api_url,
        gpg = %config.gpg.program,
        "starting gpg-secret-bot"
    );
    let pipeline = Arc::new(build_pipeline(&config).await?);

    match cli.command {
        Command::Serve(args) => serve(pipeline, args).await,
        Command::Process(args) => process(&pipeline, args).await,
    }
}

async fn build_pipeline(config: &BotConfig) -> anyhow::Result<SecretManagementPipeline> {
    let github = Arc::new(
        GithubClient::new(config.github.clone()).context("failed to construct GitHub client")?,
    );
    let keys = GpgKeyGenerator::new(config.gpg.clone());
    let version = keys
        .version()
        .await
        .context("gpg is required to generate keys")?;
    info!(%version, "found gpg");

    Ok(SecretManagementPipeline::new(
        github.clone(),
        github,
        Arc::new(keys),
    ))
}

async fn serve(pipeline: Arc<SecretManagementPipeline>, args: ServeArgs) -> anyhow::Result<()> {
    let state = WebhookState::new(pipeline, args.webhook_secret.as_deref());
    let tcp = TcpListener::bind(args.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", args.bind_address))?;
    listener::serve(tcp, state, shutdown_signal())
        .await
        .context("webhook listener failed")?;
    info!("webhook listener stopped");
    Ok(())
}

async fn process(pipeline: &SecretManagementPipeline, args: ProcessArgs) -> anyhow::Result<()> {
    let repository = RepositoryRef::parse(&args.repository)
        .ok_or_else(|| anyhow!("`{}` is not of the form owner/name", args.repository))?;
    let request = ProvisioningRequest {
        repository,
        trigger: "cli",
    };

    let outcome = pipeline.run(&request, PipelineRunId::new_random()).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
