//! HTTP surface for the arbitration engine
//!
//! One endpoint: `POST /vs-ai/move` with `{ "pgn": "..." }` answers
//! `{ "pgn", "prompt", "from_llm" }` — the prior history extended by one
//! verified legal move, the directive that produced it, and whether the
//! external service (as opposed to the fallback selector) supplied it.
//!
//! The router is a pure function over an injected [`Arbiter`], so tests
//! drive it with a scripted generator through `oneshot`.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use llmchess_arbiter::{Arbiter, ArbiterError};

#[derive(Clone)]
pub struct AppState {
    arbiter: Arc<Arbiter>,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    /// The authoritative move history before the opponent's turn
    pub pgn: String,
}

#[derive(Serialize)]
pub struct MoveResponse {
    /// History extended by exactly one legal move
    pub pgn: String,
    /// The directive sent on the last generation attempt
    pub prompt: String,
    /// False when the fallback selector chose the move
    pub from_llm: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

pub fn router(arbiter: Arc<Arbiter>) -> Router {
    Router::new()
        .route("/vs-ai/move", post(next_move))
        .with_state(AppState { arbiter })
}

async fn next_move(
    State(state): State<AppState>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    info!("[API] arbitrating next move for {:?}", request.pgn);
    let result = state.arbiter.arbitrate(&request.pgn).await?;
    Ok(Json(MoveResponse {
        pgn: result.movetext,
        prompt: result.directive_sent,
        from_llm: result.used_external_service,
    }))
}

/// Error envelope: caller contract violations are 422, everything else 500
pub struct ApiError(ArbiterError);

impl From<ArbiterError> for ApiError {
    fn from(err: ArbiterError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ArbiterError::InvalidHistory(_) | ArbiterError::GameOver(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ArbiterError::Threat(_) | ArbiterError::NoLegalMoves => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorResponse {
            message: self.0.to_string(),
        });
        (status, body).into_response()
    }
}
