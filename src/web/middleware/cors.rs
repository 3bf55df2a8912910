//! CORS middleware configuration.

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Create a CORS layer from configuration.
///
/// The receiver frontend runs on another port and relies on the session
/// cookie, so credentials are always allowed. Without configured origins the
/// request origin is mirrored, since the LAN address is not known upfront.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let parsed_origins: Vec<HeaderValue> =
        origins.iter().filter_map(|o| o.parse().ok()).collect();

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, mirroring request origin");
        }
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
            .allow_origin(AllowOrigin::mirror_request())
    } else {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([CONTENT_TYPE, ACCEPT])
            .allow_credentials(true)
            .allow_origin(parsed_origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::util::ServiceExt;

    async fn preflight(origins: &[String], origin: &str) -> Option<String> {
        let app = Router::new()
            .route("/", get(|| async { "OK" }))
            .layer(create_cors_layer(origins));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header("Origin", origin)
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        response
            .headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_mirrors_origin_without_config() {
        let allowed = preflight(&[], "http://192.168.1.20:5173").await;
        assert_eq!(allowed.as_deref(), Some("http://192.168.1.20:5173"));
    }

    #[tokio::test]
    async fn test_configured_origins() {
        let origins = vec!["http://localhost:5173".to_string()];
        let allowed = preflight(&origins, "http://localhost:5173").await;
        assert_eq!(allowed.as_deref(), Some("http://localhost:5173"));

        let denied = preflight(&origins, "http://evil.example").await;
        assert_eq!(denied, None);
    }
}
