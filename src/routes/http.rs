//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{error, info, instrument};

use crate::logic::list_game_ids;
use crate::protocol::{ErrorOut, GameIdsOut, HealthOut};
use crate::repository::GameRepository;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_games<R: GameRepository>(State(state): State<Arc<AppState<R>>>) -> impl IntoResponse {
    match list_game_ids(state.repository.as_ref()).await {
        Ok(game_ids) => {
            info!(target: "connections_backend", count = game_ids.len(), "HTTP game catalog served");
            (StatusCode::OK, Json(GameIdsOut { game_ids })).into_response()
        }
        Err(e) => {
            error!(target: "connections_backend", error = %e, "Game catalog unavailable");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorOut { error: "Unable to load game IDs".into() }),
            )
                .into_response()
        }
    }
}
