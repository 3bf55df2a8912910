//! Request DTOs for Web API.

use serde::Deserialize;
use serde_json::Value;

use crate::share::{Expiry, NewShare};
use crate::web::error::ApiError;

/// Share creation request.
#[derive(Debug, Default, Deserialize)]
pub struct CreateShareRequest {
    /// Directory to share.
    #[serde(default)]
    pub dirpath: String,
    /// Shared password.
    #[serde(default)]
    pub password: String,
    /// Address to put in the share link; suggested when absent.
    #[serde(default)]
    pub ip: Option<String>,
    /// Lifetime in minutes: integer, numeric string, empty string or null.
    #[serde(default)]
    pub expiry_minutes: Option<Value>,
}

impl CreateShareRequest {
    /// Parse `expiry_minutes` into an [`Expiry`].
    pub fn expiry(&self) -> Result<Expiry, ApiError> {
        let invalid = || ApiError::bad_request("Invalid value provided for expiry_minutes");
        match &self.expiry_minutes {
            None | Some(Value::Null) => Ok(Expiry::Default),
            Some(Value::Number(n)) => n.as_i64().map(Expiry::from_minutes).ok_or_else(invalid),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(Expiry::Default),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Expiry::from_minutes)
                .map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    /// Validate required fields and convert into share parameters.
    pub fn to_new_share(&self) -> Result<NewShare, ApiError> {
        let dirpath = self.dirpath.trim();
        let password = self.password.trim();
        if dirpath.is_empty() || password.is_empty() {
            return Err(ApiError::bad_request(
                "Directory path and password are required",
            ));
        }
        Ok(NewShare::new(dirpath, password).with_expiry(self.expiry()?))
    }
}

/// Password submission.
#[derive(Debug, Default, Deserialize)]
pub struct AuthRequest {
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive name filter.
    #[serde(default)]
    pub q: Option<String>,
}

/// QR code query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct QrQuery {
    /// Exact URL to encode.
    #[serde(default)]
    pub url: Option<String>,
    /// Host to build the share link with when no URL is given.
    #[serde(default)]
    pub host: Option<String>,
}
