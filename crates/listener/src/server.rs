//! The axum application: `POST /webhook` and `GET /health`.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info, info_span, warn, Instrument};

use pipeline::{route, PipelineError, PipelineRunId, SecretManagementPipeline};

use crate::events::normalize;
use crate::locks::RepositoryLocks;
use crate::signature::SignatureVerifier;
use crate::WebhookError;

const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";
const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Shared state for every request.
#[derive(Clone)]
pub struct WebhookState {
    pipeline: Arc<SecretManagementPipeline>,
    verifier: Arc<SignatureVerifier>,
    locks: RepositoryLocks,
}

impl WebhookState {
    pub fn new(pipeline: Arc<SecretManagementPipeline>, webhook_secret: Option<&str>) -> Self {
        Self {
            pipeline,
            verifier: Arc::new(SignatureVerifier::new(webhook_secret)),
            locks: RepositoryLocks::new(),
        }
    }

    /// Whether deliveries must carry a valid `X-Hub-Signature-256`.
    pub fn verifies_signatures(&self) -> bool {
        self.verifier.is_enabled()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the router.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(receive))
        .with_state(state)
}

/// Serves [`router`] on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: WebhookState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(
            %addr,
            verify_signatures = state.verifies_signatures(),
            "webhook listener started"
        );
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn receive(State(state): State<WebhookState>, headers: HeaderMap, body: Bytes) -> Response {
    let delivery = header(&headers, DELIVERY_HEADER).unwrap_or("-").to_string();
    let event = header(&headers, EVENT_HEADER).unwrap_or_default().to_string();
    let span = info_span!("webhook_delivery", %delivery, event = %event);

    async move {
        if let Err(e) = state
            .verifier
            .verify(header(&headers, SIGNATURE_HEADER), &body)
        {
            warn!(error = %e, "rejected webhook delivery");
            return rejection(&e);
        }
        if event.is_empty() {
            return rejection(&WebhookError::MissingHeader(EVENT_HEADER));
        }
        if event == "ping" {
            return (StatusCode::OK, Json(json!({ "status": "pong" }))).into_response();
        }

        let normalized = match normalize(&event, &body) {
            Ok(Some(normalized)) => normalized,
            Ok(None) => {
                debug!("event type not handled");
                return ignored();
            }
            Err(e) => {
                warn!(error = %e, "rejected webhook delivery");
                return rejection(&e);
            }
        };
        let Some(request) = route(&normalized) else {
            return ignored();
        };

        debug!(
            repository = %request.repository,
            active = state.locks.active(),
            "waiting for repository lock"
        );
        let _guard = state.locks.acquire(&request.repository).await;
        let run_id = PipelineRunId::new_random();
        match state.pipeline.run(&request, run_id).await {
            Ok(outcome) => (
                StatusCode::OK,
                Json(json!({
                    "status": "processed",
                    "run_id": run_id.to_string(),
                    "repository": request.repository.to_string(),
                    "result": outcome,
                })),
            )
                .into_response(),
            Err(e) => (
                status_for(&e),
                Json(json!({
                    "status": "failed",
                    "run_id": run_id.to_string(),
                    "repository": request.repository.to_string(),
                    "kind": e.kind(),
                    "error": e.to_string(),
                })),
            )
                .into_response(),
        }
    }
    .instrument(span)
    .await
}

fn ignored() -> Response {
    (StatusCode::ACCEPTED, Json(json!({ "status": "ignored" }))).into_response()
}

fn rejection(error: &WebhookError) -> Response {
    let status = match error {
        WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
        WebhookError::MissingHeader(SIGNATURE_HEADER) => StatusCode::UNAUTHORIZED,
        WebhookError::MissingHeader(_) | WebhookError::MalformedPayload(_) => {
            StatusCode::BAD_REQUEST
        }
    };
    (
        status,
        Json(json!({ "status": "rejected", "error": error.to_string() })),
    )
        .into_response()
}

/// HTTP status reported for a failed pipeline run.
pub fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::Config(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::KeyGeneration(_) | PipelineError::Encryption { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        PipelineError::RemoteApi(_) => StatusCode::BAD_GATEWAY,
    }
}
