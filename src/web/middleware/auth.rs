//! Share authentication guard.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::logging::token_prefix;
use crate::share::ShareRecord;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::ShareError;

/// Extractor for a share the calling client has authenticated against.
///
/// Only available on routes behind [`require_share_auth`], which resolves the
/// `:token` path parameter and stores the record in request extensions.
#[derive(Debug, Clone)]
pub struct AuthorizedShare(pub ShareRecord);

impl<S> FromRequestParts<S> for AuthorizedShare
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<AuthorizedShare>()
                .cloned()
                .ok_or_else(|| ApiError::unauthorized("Not authenticated for this share"))
        })
    }
}

/// Middleware requiring the client's session to be authenticated for `:token`.
///
/// Short-circuits with 404 for unknown tokens, 410 for expired ones and 401
/// when the session has not supplied the password.
pub async fn require_share_auth(
    State(state): State<Arc<AppState>>,
    Path(params): Path<HashMap<String, String>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = params
        .get("token")
        .ok_or_else(|| ApiError::not_found("Share not found"))?;

    let record = state.lookup_share(token)?;

    let authorized = state
        .session_id(&jar)
        .is_some_and(|session_id| state.sessions.is_authorized(&session_id, token));
    if !authorized {
        tracing::debug!(
            token = token_prefix(token),
            "Rejected unauthenticated share access"
        );
        return Err(ShareError::Unauthenticated("not authenticated for this share".to_string()).into());
    }

    request.extensions_mut().insert(AuthorizedShare(record));
    Ok(next.run(request).await)
}
