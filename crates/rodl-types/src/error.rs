//! The error taxonomy exposed to every RODL caller.
//!
//! Backend-specific failures are translated at the adapter boundary into the
//! four kinds below. The original backend error is preserved as the source of
//! [`DigitalLibraryError::Backend`] so it can be logged, never swallowed.

use thiserror::Error;

/// Errors surfaced by the digital library adapter.
#[derive(Debug, Error)]
pub enum DigitalLibraryError {
    /// The requested workspace, research object, version, edition, or path
    /// does not exist. The message names the missing identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// Attempted creation of an object, value, or name that already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend refused the operation for the current identity.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Any other failure of the remote collaborator: connectivity, internal
    /// backend fault, malformed response.
    #[error("backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DigitalLibraryError {
    /// A `NotFound` for the given missing identifier.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// A `Backend` error without a structured cause.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` if this is the `NotFound` kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if this is the `Conflict` kind.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Convenience alias used by every adapter crate.
pub type DlResult<T> = Result<T, DigitalLibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_identifier() {
        let err = DigitalLibraryError::not_found("edition:17");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: edition:17");
    }

    #[test]
    fn backend_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "pipe broke");
        let err = DigitalLibraryError::Backend {
            message: "stream failed".into(),
            source: Some(Box::new(io)),
        };
        let source = std::error::Error::source(&err).expect("source kept");
        assert_eq!(source.to_string(), "pipe broke");
    }

    #[test]
    fn kind_predicates() {
        assert!(DigitalLibraryError::Conflict("ro r".into()).is_conflict());
        assert!(!DigitalLibraryError::backend("x").is_not_found());
    }
}
