//! The backend fault model and its translation into the caller taxonomy.

use rodl_types::DigitalLibraryError;
use thiserror::Error;

/// Failures reported by the remote publication backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend does not know the given identifier or lookup key.
    #[error("id not found: {0}")]
    IdNotFound(String),

    /// A name or value that must be unique already exists.
    #[error("duplicated value: {0}")]
    DuplicatedValue(String),

    /// The backend refused the operation for the current identity.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Connectivity loss, internal backend fault, or malformed response.
    #[error("remote failure: {0}")]
    Remote(String),

    /// I/O failure while streaming content to or from the backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// An `IdNotFound` for the given missing identifier or key.
    pub fn id_not_found(what: impl Into<String>) -> Self {
        Self::IdNotFound(what.into())
    }

    /// Returns `true` if this is the `IdNotFound` kind.
    pub fn is_id_not_found(&self) -> bool {
        matches!(self, Self::IdNotFound(_))
    }
}

/// Convenience alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Translation at the adapter boundary: every backend fault maps onto one of
/// the four caller-facing kinds, and anything unclassified keeps the backend
/// error as its source for logging.
impl From<BackendError> for DigitalLibraryError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::IdNotFound(what) => DigitalLibraryError::NotFound(what),
            BackendError::DuplicatedValue(what) => DigitalLibraryError::Conflict(what),
            BackendError::AccessDenied(what) => DigitalLibraryError::AccessDenied(what),
            other => DigitalLibraryError::Backend {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_not_found_maps_to_not_found() {
        let dl: DigitalLibraryError = BackendError::id_not_found("edition:9").into();
        assert!(dl.is_not_found());
        assert_eq!(dl.to_string(), "not found: edition:9");
    }

    #[test]
    fn duplicated_value_maps_to_conflict() {
        let dl: DigitalLibraryError = BackendError::DuplicatedValue("ro r".into()).into();
        assert!(dl.is_conflict());
    }

    #[test]
    fn remote_fault_keeps_cause() {
        let dl: DigitalLibraryError = BackendError::Remote("connection reset".into()).into();
        match dl {
            DigitalLibraryError::Backend { source, .. } => assert!(source.is_some()),
            other => panic!("unexpected kind: {other}"),
        }
    }
}
