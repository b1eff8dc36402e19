use axum::{
    Json,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::stream;
use serde_json::json;
use tokio::sync::mpsc;

use super::AppState;
use crate::constants::stream::EVENT_CHANNEL_CAPACITY;
use crate::error::RequestError;
use crate::gateway::{ComposePayload, Orchestrator, OrchestratorSettings, spawn_generation};
use crate::llm::provider::utils::mask_api_key;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// `POST /api/compose`
///
/// Validation failures are answered with a JSON error before any stream is
/// opened and before any vendor is contacted. Everything after that point is
/// reported in-stream. The body is parsed as JSON whatever its content type.
pub async fn compose(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: ComposePayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => return request_error(RequestError::InvalidBody(e.to_string())),
    };

    let (request, selection) =
        match payload.into_request(&state.config.generation.default_model) {
            Ok(resolved) => resolved,
            Err(e) => return request_error(e),
        };

    tracing::info!(
        "Compose request: provider={}, model={}, mode={:?}, key={}",
        selection.provider,
        request.model,
        request.mode,
        mask_api_key(&request.api_key)
    );

    let provider = match state
        .providers
        .create(selection.provider, &request.model, &request.api_key)
    {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!("Failed to build {} adapter: {}", selection.provider, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let orchestrator = Orchestrator::new(
        provider,
        state.prompts.clone(),
        state.validator.clone(),
        OrchestratorSettings {
            max_tokens: state.config.generation.max_tokens,
            limits: state.config.validation.limits(),
            retry_status: state.config.generation.retry_status.clone(),
        },
    );

    let frames = spawn_generation(orchestrator, request, EVENT_CHANNEL_CAPACITY);
    event_stream(frames)
}

fn request_error(err: RequestError) -> Response {
    tracing::warn!("Rejected compose request: {}", err);
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

/// Wraps the frame receiver as an `text/event-stream` body.
///
/// Dropping the body (client gone) drops the receiver, which the generation
/// task observes as a failed send.
fn event_stream(frames: mpsc::Receiver<Bytes>) -> Response {
    let body = stream::unfold(frames, |mut frames| async move {
        frames
            .recv()
            .await
            .map(|frame| (Ok::<_, std::convert::Infallible>(frame), frames))
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}
