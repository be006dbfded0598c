use crate::app::AppState;
use crate::transliterate;
use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tracing::{error, info};


#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeakRequest {
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/speak", post(speak_handler))
        .route("/health", get(health_handler))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn speak_handler(State(state): State<AppState>, Json(req): Json<SpeakRequest>) -> Response {
    match forward_speak(&state, req).await {
        Ok(response) => response,
        Err(e) => {
            error!("Error forwarding to TTS backend: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "TTS service failed" })),
            )
                .into_response()
        }
    }
}

async fn forward_speak(state: &AppState, req: SpeakRequest) -> Result<Response> {
    let text = if state.config.relay.transliterate {
        transliterate::devanagari_to_itrans(&req.text)
    } else {
        req.text
    };

    let start_time = Instant::now();
    let response = state
        .http_client
        .post(&state.config.relay.tts_url)
        .json(&json!({ "text": text }))
        .send()
        .await?;

    let status = response.status().as_u16();
    // The worker answers 200 or 201 on success
    if status != 200 && status != 201 {
        return Err(anyhow::anyhow!("TTS backend returned {}", status));
    }
    info!(
        "tts relay: ttfb: {:?} status: {}",
        start_time.elapsed(),
        status
    );

    let body = Body::from_stream(response.bytes_stream());
    Response::builder()
        .header(axum::http::header::CONTENT_TYPE, "audio/mpeg")
        .body(body)
        .map_err(|e| anyhow::anyhow!("Failed to build response: {}", e))
}
