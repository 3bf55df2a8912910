//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::WebConfig;

use super::handlers::{
    archive_folder, authenticate, create_share, download_file, list_entries, preview_file,
    qr_code, revoke_share, share_info, share_status, suggest_ip, upload_file, AppState,
};
use super::middleware::{
    auth_rate_limit, create_cors_layer, require_share_auth, security_headers, RateLimitState,
};

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, web_config: &WebConfig) -> Router {
    let rate_limit_state = Arc::new(RateLimitState::new(web_config.auth_rate_limit));
    create_router_with_rate_limit(app_state, rate_limit_state, &web_config.cors_origins)
}

/// Create the main API router with an existing rate limit state.
pub fn create_router_with_rate_limit(
    app_state: Arc<AppState>,
    rate_limit_state: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    // Password endpoint (rate limited)
    let auth_routes = Router::new()
        .route("/api/share/:token/auth", post(authenticate))
        .layer(middleware::from_fn(move |req, next| {
            let state = rate_limit_state.clone();
            auth_rate_limit(state, req, next)
        }));

    // Routes that need no session
    let public_routes = Router::new()
        .route("/api/suggest-ip", get(suggest_ip))
        .route("/api/share/create", post(create_share))
        .route("/api/share/:token/status", get(share_status))
        .route("/qr/:token", get(qr_code))
        .route("/revoke/:token", post(revoke_share));

    // Routes scoped to an authenticated share
    let share_routes = Router::new()
        .route("/api/share/:token/info", get(share_info))
        .route("/api/:token/list", get(list_entries).post(list_entries))
        .route("/api/:token/list/*path", get(list_entries).post(list_entries))
        .route(
            "/api/:token/upload",
            post(upload_file).layer(DefaultBodyLimit::max(app_state.max_upload_size)),
        )
        .route(
            "/api/:token/upload/*path",
            post(upload_file).layer(DefaultBodyLimit::max(app_state.max_upload_size)),
        )
        .route("/api/:token/download/*path", get(download_file))
        .route("/api/:token/archive", get(archive_folder))
        .route("/api/:token/archive/*path", get(archive_folder))
        .route("/api/:token/preview/*path", get(preview_file))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_share_auth,
        ));

    Router::new()
        .merge(auth_routes)
        .merge(public_routes)
        .merge(share_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let response = create_health_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_scoped_route_requires_session() {
        let config = Config::default();
        let state = Arc::new(AppState::from_config(&config));
        let router = create_router(state, &config.web);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/unknown/list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
