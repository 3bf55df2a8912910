//! Share lifecycle handlers: create, status, authentication, info, QR, revoke.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::Config;
use crate::datetime::{to_rfc3339, to_rfc3339_opt};
use crate::logging::token_prefix;
use crate::net::suggest_local_ip;
use crate::qr;
use crate::share::{InMemoryShareRegistry, SessionStore, ShareRecord, ShareRegistry};
use crate::web::dto::{
    ApiResponse, AuthRequest, AuthResponse, CreateShareRequest, CreateShareResponse, QrQuery,
    ShareInfoResponse, ShareStatusResponse, SuggestIpResponse,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthorizedShare;
use crate::ShareError;

/// Shared application state.
pub struct AppState {
    /// Live shares.
    pub registry: Arc<dyn ShareRegistry>,
    /// Authenticated tokens per client session.
    pub sessions: SessionStore,
    /// Name of the session cookie.
    pub session_cookie: String,
    /// Port of the receiver frontend used in share links.
    pub frontend_port: u16,
    /// Maximum upload request size in bytes.
    pub max_upload_size: usize,
}

impl AppState {
    /// Create application state around an existing registry.
    pub fn new(registry: Arc<dyn ShareRegistry>, config: &Config) -> Self {
        let max_upload_size = config
            .share
            .max_upload_size_mb
            .saturating_mul(1024 * 1024)
            .try_into()
            .unwrap_or(usize::MAX);
        let sessions = match config.web.session_idle_minutes {
            0 => SessionStore::new(),
            minutes => SessionStore::with_idle_timeout(Duration::from_secs(
                minutes.saturating_mul(60),
            )),
        };

        Self {
            registry,
            sessions,
            session_cookie: config.web.session_cookie.clone(),
            frontend_port: config.share.frontend_port,
            max_upload_size,
        }
    }

    /// Create application state with an in-memory registry.
    pub fn from_config(config: &Config) -> Self {
        let registry = InMemoryShareRegistry::new(config.share.default_expiry_minutes);
        Self::new(Arc::new(registry), config)
    }

    /// Look up a live share.
    ///
    /// An expired share is evicted by the registry; its session flags go too.
    pub fn lookup_share(&self, token: &str) -> Result<ShareRecord, ApiError> {
        match self.registry.get(token) {
            Err(ShareError::Expired) => {
                tracing::info!(token = token_prefix(token), "Share expired");
                self.sessions.forget_token(token);
                Err(ApiError::expired())
            }
            other => other.map_err(ApiError::from),
        }
    }

    /// Session id carried by the request, if any.
    pub fn session_id(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.session_cookie)
            .map(|cookie| cookie.value().to_string())
    }

    /// Receiver link for a share.
    pub fn share_link(&self, host: &str, token: &str) -> String {
        format!(
            "http://{}:{}/receive/{}",
            host, self.frontend_port, token
        )
    }

    fn session_cookie(&self, session_id: String) -> Cookie<'static> {
        Cookie::build((self.session_cookie.clone(), session_id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }
}

/// GET /api/suggest-ip - Suggested LAN address for share links.
pub async fn suggest_ip() -> Json<ApiResponse<SuggestIpResponse>> {
    let ip = suggest_local_ip().await;
    Json(ApiResponse::new(SuggestIpResponse { ip: ip.to_string() }))
}

/// POST /api/share/create - Create a share.
pub async fn create_share(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateShareRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CreateShareResponse>>, ApiError> {
    let Json(req) =
        payload.map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))?;
    let new_share = req.to_new_share()?;

    let record = state.registry.create(new_share)?;

    let host = match req.ip.as_deref().map(str::trim) {
        Some(ip) if !ip.is_empty() => ip.to_string(),
        _ => suggest_local_ip().await.to_string(),
    };
    let share_link = state.share_link(&host, &record.token);
    let qr_link = format!(
        "/qr/{}?url={}",
        record.token,
        urlencoding::encode(&share_link)
    );

    tracing::info!(
        token = token_prefix(&record.token),
        root = %record.root.display(),
        expires_at = ?record.expires_at,
        "Share created"
    );

    Ok(Json(ApiResponse::new(CreateShareResponse {
        created_at: to_rfc3339(&record.created_at),
        expires_at: to_rfc3339_opt(record.expires_at.as_ref()),
        token: record.token,
        share_link,
        qr_link,
    })))
}

/// GET /qr/:token - PNG QR code of the share link.
pub async fn qr_code(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Query(query): Query<QrQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.lookup_share(&token)?;

    let data = match query.url.filter(|url| !url.is_empty()) {
        Some(url) => url,
        None => {
            let host = match query.host.filter(|host| !host.is_empty()) {
                Some(host) => host,
                None => suggest_local_ip().await.to_string(),
            };
            state.share_link(&host, &token)
        }
    };

    let png = qr::render_png(&data)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// GET /api/share/:token/status - Existence, expiry and authentication state.
pub async fn share_status(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    jar: CookieJar,
) -> Result<Json<ApiResponse<ShareStatusResponse>>, ApiError> {
    let record = state.lookup_share(&token)?;
    let authed = state
        .session_id(&jar)
        .is_some_and(|session_id| state.sessions.is_authorized(&session_id, &token));

    Ok(Json(ApiResponse::new(ShareStatusResponse::new(
        &record, authed,
    ))))
}

/// POST /api/share/:token/auth - Check the password and flag the session.
///
/// A session cookie is issued when the client has none the server knows.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    jar: CookieJar,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<ApiResponse<AuthResponse>>), ApiError> {
    let record = state.lookup_share(&token)?;
    let Json(req) =
        payload.map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))?;

    if req.password != record.password {
        tracing::warn!(token = token_prefix(&token), "Incorrect share password");
        return Err(ApiError::unauthorized("Incorrect password"));
    }

    let (jar, session_id) = match state.session_id(&jar) {
        Some(id) if state.sessions.contains(&id) => (jar, id),
        _ => {
            let id = SessionStore::new_session_id();
            (jar.add(state.session_cookie(id.clone())), id)
        }
    };
    state.sessions.authorize(&session_id, &token);
    tracing::info!(token = token_prefix(&token), "Client authenticated");

    Ok((
        jar,
        Json(ApiResponse::new(AuthResponse {
            ok: true,
            message: "Authenticated".to_string(),
        })),
    ))
}

/// GET /api/share/:token/info - Share details.
pub async fn share_info(
    AuthorizedShare(record): AuthorizedShare,
) -> Json<ApiResponse<ShareInfoResponse>> {
    Json(ApiResponse::new(ShareInfoResponse::from(&record)))
}

/// POST /revoke/:token - Delete a share. Unknown tokens are accepted too.
pub async fn revoke_share(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    if state.registry.revoke(&token) {
        tracing::info!(token = token_prefix(&token), "Share revoked");
    }
    state.sessions.forget_token(&token);
    (StatusCode::OK, "revoked")
}
