//! Error types for lanshare.

use thiserror::Error;

/// Common error type for share operations.
#[derive(Error, Debug)]
pub enum ShareError {
    /// Malformed input, missing fields or an unusable value.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The directory given at share creation does not exist or is not a directory.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Token or file absent.
    #[error("{0} not found")]
    NotFound(String),

    /// The token existed but its expiry has passed.
    #[error("share expired")]
    Expired,

    /// The client session is not authenticated for the token.
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    /// The requested path escapes the share root.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive creation error.
    #[error("archive error: {0}")]
    Archive(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<zip::result::ZipError> for ShareError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => ShareError::Io(io),
            other => ShareError::Archive(other.to_string()),
        }
    }
}

/// Result type alias for share operations.
pub type Result<T> = std::result::Result<T, ShareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_display() {
        let err = ShareError::NotFound("share".to_string());
        assert_eq!(err.to_string(), "share not found");
    }

    #[test]
    fn test_expired_error_display() {
        assert_eq!(ShareError::Expired.to_string(), "share expired");
    }

    #[test]
    fn test_forbidden_error_display() {
        let err = ShareError::Forbidden("path escapes share root".to_string());
        assert_eq!(err.to_string(), "forbidden: path escapes share root");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: ShareError = io_err.into();
        assert!(matches!(err, ShareError::Io(_)));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_zip_io_error_unwraps_to_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: ShareError = zip::result::ZipError::Io(io_err).into();
        assert!(matches!(err, ShareError::Io(_)));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(ShareError::Unauthenticated("token".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
