//! HTTP front door: root page, static assets, health, and the realtime
//! upgrade endpoint, all on one listener.

pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete HTTP router.
///
/// - `GET /` — root HTML page
/// - `GET /js/*` — files from the asset directory
/// - `GET /health` — liveness and session count
/// - `GET /ws` — realtime upgrade
pub fn build_router(state: AppState) -> Router {
    let assets = ServeDir::new(state.config.assets_dir());

    Router::new()
        .route("/", get(handlers::page::index_handler))
        .route("/ws", get(ws_handler))
        .merge(handlers::system::routes())
        .nest_service("/js", assets)
        .fallback(handlers::page::not_found_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::config::RelayConfig;
    use crate::domain::Fanout;

    fn test_state() -> AppState {
        let config = RelayConfig {
            public_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public"),
            ..RelayConfig::default()
        };
        AppState {
            fanout: Fanout::new(8),
            config: Arc::new(config),
        }
    }

    async fn request(state: AppState, uri: &str) -> axum::response::Response {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("invalid request");
        };
        let Ok(response) = build_router(state).oneshot(request).await else {
            panic!("router failed");
        };
        response
    }

    #[tokio::test]
    async fn root_serves_index_page() {
        let response = request(test_state(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/html"));

        let Ok(body) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        assert!(String::from_utf8_lossy(&body).contains("<html"));
    }

    #[tokio::test]
    async fn asset_is_served_with_content_type() {
        let response = request(test_state(), "/js/relay.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.contains("javascript"));
    }

    #[tokio::test]
    async fn missing_asset_is_404() {
        let response = request(test_state(), "/js/does-not-exist.js").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_index_is_404() {
        let mut state = test_state();
        state.config = Arc::new(RelayConfig {
            public_dir: PathBuf::from("/nonexistent/mission-relay"),
            ..RelayConfig::default()
        });
        let response = request(state, "/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = request(test_state(), "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_sessions() {
        let state = test_state();
        let _sub = state.fanout.register().await;

        let response = request(state, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let Ok(body) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(&body) else {
            panic!("invalid json");
        };
        assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("healthy"));
        assert_eq!(json.get("sessions").and_then(serde_json::Value::as_u64), Some(1));
    }
}
