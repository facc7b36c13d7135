//! Collaborator interface to the remote publication backend.
//!
//! The backend is an external service that only understands a flat
//! publication model: group publications (workspaces and research objects),
//! leaf publications (versions), editions, and file versions with opaque
//! numeric ids, plus a content byte-stream API keyed by file version id.
//! RODL adapts the hierarchical research-object model on top of these
//! primitives.
//!
//! # Modules
//!
//! - [`error`] — The backend fault model ([`BackendError`]) and its
//!   translation into the caller-facing taxonomy
//! - [`model`] — Plain data records exchanged with the backend
//! - [`traits`] — [`MetadataBackend`], [`ContentBackend`], [`UserBackend`],
//!   [`AttributeBackend`] and the [`Backend`] supertrait
//! - [`memory`] — [`InMemoryBackend`], a complete in-process implementation
//!   used by every test in the workspace

pub mod error;
pub mod memory;
pub mod model;
pub mod traits;

pub use error::{BackendError, BackendResult};
pub use memory::InMemoryBackend;
pub use model::{
    AttributeId, BackendUser, EditionInfo, FileId, FileVersionInfo, PublicationId,
    PublicationInfo, PublicationKind, ValueGroupId,
};
pub use traits::{AttributeBackend, Backend, ContentBackend, MetadataBackend, UserBackend};
