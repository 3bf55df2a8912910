//! Response DTOs for Web API.

use serde::Serialize;

use crate::datetime::{to_rfc3339, to_rfc3339_opt};
use crate::share::{Entry, ShareRecord};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Suggested LAN address.
#[derive(Debug, Serialize)]
pub struct SuggestIpResponse {
    /// IP address.
    pub ip: String,
}

/// Share creation response.
#[derive(Debug, Serialize)]
pub struct CreateShareResponse {
    /// Share token.
    pub token: String,
    /// Link for the receiver frontend.
    pub share_link: String,
    /// Relative URL of the QR code image.
    pub qr_link: String,
    /// Creation time (RFC 3339).
    pub created_at: String,
    /// Expiry time (RFC 3339), `null` for shares that never expire.
    pub expires_at: Option<String>,
}

/// Share status.
#[derive(Debug, Serialize)]
pub struct ShareStatusResponse {
    /// Share token.
    pub token: String,
    /// Whether the calling client has authenticated.
    pub authed: bool,
    /// Creation time (RFC 3339).
    pub created_at: String,
    /// Expiry time (RFC 3339).
    pub expires_at: Option<String>,
}

impl ShareStatusResponse {
    pub fn new(record: &ShareRecord, authed: bool) -> Self {
        Self {
            token: record.token.clone(),
            authed,
            created_at: to_rfc3339(&record.created_at),
            expires_at: to_rfc3339_opt(record.expires_at.as_ref()),
        }
    }
}

/// Share details for authenticated clients.
#[derive(Debug, Serialize)]
pub struct ShareInfoResponse {
    /// Share token.
    pub token: String,
    /// Shared directory.
    pub root: String,
    /// Name of the shared directory.
    pub name: Option<String>,
    /// Creation time (RFC 3339).
    pub created_at: String,
    /// Expiry time (RFC 3339).
    pub expires_at: Option<String>,
}

impl From<&ShareRecord> for ShareInfoResponse {
    fn from(record: &ShareRecord) -> Self {
        Self {
            token: record.token.clone(),
            root: record.root.display().to_string(),
            name: record.root_name(),
            created_at: to_rfc3339(&record.created_at),
            expires_at: to_rfc3339_opt(record.expires_at.as_ref()),
        }
    }
}

/// Authentication result.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub ok: bool,
    pub message: String,
}

/// Directory listing.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    /// Listed path relative to the share root, empty for the root.
    pub path: String,
    /// Entries, directories first.
    pub items: Vec<Entry>,
}

/// Upload result.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    /// Name the file was stored under.
    pub filename: String,
}

/// Metadata for files that cannot be previewed inline.
#[derive(Debug, Serialize)]
pub struct PreviewMetadataResponse {
    pub name: String,
    pub mime: String,
}
