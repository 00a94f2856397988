//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::repository::GameRepository;
use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one puzzle session per connection)
/// - REST-ish API under `/api/v1/...`
/// - Static presentation layer from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router<R: GameRepository>(state: Arc<AppState<R>>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/ws", get(ws::ws_upgrade::<R>))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/games", get(http::http_get_games::<R>))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServiceConfig;
    use crate::domain::GameIds;
    use crate::repository::testing::ScriptedRepository;
    use crate::repository::RepositoryError;

    fn router(repo: ScriptedRepository) -> Router {
        build_router(Arc::new(AppState::new(ServiceConfig::default(), Arc::new(repo))))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get_json(router(ScriptedRepository::new()), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn games_lists_catalog() {
        let repo = ScriptedRepository::new().with_ids(Ok(GameIds {
            game_ids: vec!["2024-01-15".into(), "2024-01-16".into()],
        }));
        let (status, body) = get_json(router(repo), "/api/v1/games").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "gameIds": ["2024-01-16", "2024-01-15"] }));
    }

    #[tokio::test]
    async fn games_failure_is_bad_gateway() {
        let repo = ScriptedRepository::new().with_ids(Err(RepositoryError::Transport("refused".into())));
        let (status, body) = get_json(router(repo), "/api/v1/games").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, serde_json::json!({ "error": "Unable to load game IDs" }));
    }
}
