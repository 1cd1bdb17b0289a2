use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::settings::default_local_origins;
use crate::server::handlers::{ask, health, transcribe, tts};
use crate::speech::MAX_AUDIO_BYTES;
use crate::state::AppState;

/// Room for multipart boundaries and headers around the largest recording.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Creates the application router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_allowed_origins);
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/ask", post(ask::ask))
        .route(
            "/transcribe",
            post(transcribe::transcribe)
                .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/tts", post(tts::tts))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let mut allowed_origins = parse_origins(origins);
    if allowed_origins.is_empty() {
        tracing::warn!("No usable CORS origins configured; using local defaults");
        allowed_origins = parse_origins(&default_local_origins());
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origins_skips_blank_and_invalid() {
        let origins = vec![
            "http://localhost:3000".to_string(),
            "  ".to_string(),
            "bad\norigin".to_string(),
        ];
        let parsed = parse_origins(&origins);
        assert_eq!(parsed, vec![HeaderValue::from_static("http://localhost:3000")]);
    }
}
