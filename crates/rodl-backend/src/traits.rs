//! The backend interface contract.
//!
//! Four traits partition the remote service the way its own APIs do:
//! publication metadata, content streams, users, and descriptive attributes.
//! All implementations must be thread-safe (`Send + Sync`); the backend is
//! assumed to provide its own concurrency control, and RODL takes no local
//! locks around these calls.

use std::io::Read;

use rodl_types::{EditionId, FileVersionId};

use crate::error::BackendResult;
use crate::model::{
    AttributeId, BackendUser, EditionInfo, FileId, FileVersionInfo, PublicationId,
    PublicationInfo, ValueGroupId,
};

/// Publication, edition, and file-version metadata operations.
pub trait MetadataBackend: Send + Sync {
    /// Find a group publication by name under `parent` (or at the top level
    /// when `parent` is `None`). Returns `Ok(None)` if no such group exists.
    fn find_group_publication(
        &self,
        parent: Option<PublicationId>,
        name: &str,
    ) -> BackendResult<Option<PublicationId>>;

    /// Create a group publication. Fails with `DuplicatedValue` if a group
    /// of that name already exists under the same parent.
    fn create_group_publication(
        &self,
        parent: Option<PublicationId>,
        name: &str,
    ) -> BackendResult<PublicationId>;

    /// List the group publications directly under `parent`.
    fn list_group_publications(
        &self,
        parent: Option<PublicationId>,
    ) -> BackendResult<Vec<PublicationInfo>>;

    /// Find a leaf publication by name inside a group. `Ok(None)` if absent.
    fn find_publication(
        &self,
        group: PublicationId,
        name: &str,
    ) -> BackendResult<Option<PublicationId>>;

    /// Create a leaf publication inside a group. Fails with
    /// `DuplicatedValue` on a name clash.
    fn create_publication(
        &self,
        group: PublicationId,
        name: &str,
    ) -> BackendResult<PublicationId>;

    /// List the leaf publications of a group.
    fn list_publications(&self, group: PublicationId) -> BackendResult<Vec<PublicationInfo>>;

    /// Permanently remove a publication together with everything beneath it
    /// (child publications, editions, files, file versions).
    fn remove_publication(&self, id: PublicationId) -> BackendResult<()>;

    /// Mark a file as the main file of a leaf publication.
    fn set_main_file(&self, publication: PublicationId, file: FileId) -> BackendResult<()>;

    /// List the non-permanently-deleted editions of a leaf publication.
    fn list_editions(&self, publication: PublicationId) -> BackendResult<Vec<EditionInfo>>;

    /// Fetch one edition.
    fn get_edition(&self, id: EditionId) -> BackendResult<EditionInfo>;

    /// Create an edition of a leaf publication seeded with the given file
    /// versions. The backend assigns the id and the creation timestamp.
    fn create_edition(
        &self,
        publication: PublicationId,
        name: &str,
        seed: &[FileVersionId],
    ) -> BackendResult<EditionInfo>;

    /// Set the published flag of an edition. Siblings are not touched.
    fn set_edition_published(&self, id: EditionId, published: bool) -> BackendResult<()>;

    /// List the file versions belonging to an edition.
    fn list_edition_versions(&self, edition: EditionId) -> BackendResult<Vec<FileVersionId>>;

    /// Fetch metadata of one file version.
    fn file_version_info(&self, id: FileVersionId) -> BackendResult<FileVersionInfo>;

    /// Resolve a backend path to the file version an edition holds for it.
    /// Fails with `IdNotFound` if the edition has no version at that path.
    fn find_version_by_path(
        &self,
        edition: EditionId,
        path: &str,
    ) -> BackendResult<FileVersionId>;

    /// Create a new file version. With `existing_file` set, the version is
    /// appended to that file's history (the path and publication must
    /// match); otherwise a new file object is created first.
    fn create_file_version(
        &self,
        publication: PublicationId,
        existing_file: Option<FileId>,
        path: &str,
        mime_type: &str,
    ) -> BackendResult<FileVersionId>;

    /// Add a file version to an edition's membership.
    fn add_edition_version(
        &self,
        edition: EditionId,
        version: FileVersionId,
    ) -> BackendResult<()>;

    /// Remove a file version from an edition's membership. The version
    /// itself (and older editions referencing it) are untouched.
    fn remove_edition_version(
        &self,
        edition: EditionId,
        version: FileVersionId,
    ) -> BackendResult<()>;
}

/// Content byte-stream operations, keyed by file version id.
pub trait ContentBackend: Send + Sync {
    /// Stream `content` into the backend as the bytes of `version`.
    /// Returns the number of bytes written.
    fn write_version_content(
        &self,
        version: FileVersionId,
        content: &mut dyn Read,
    ) -> BackendResult<u64>;

    /// Open a content stream for `version`.
    ///
    /// Opening the stream takes a backend-side lock on the version. The
    /// caller must release it exactly once via [`release_version`] when done
    /// reading, regardless of how many bytes were consumed.
    ///
    /// [`release_version`]: ContentBackend::release_version
    fn read_version_content(&self, version: FileVersionId)
        -> BackendResult<Box<dyn Read + Send>>;

    /// Release the lock taken by [`read_version_content`].
    ///
    /// [`read_version_content`]: ContentBackend::read_version_content
    fn release_version(&self, version: FileVersionId) -> BackendResult<()>;

    /// Digest of the stored content of `version`, as raw bytes.
    fn version_digest(&self, version: FileVersionId) -> BackendResult<Vec<u8>>;
}

/// User and access-rights provisioning. Specified here only at the interface
/// boundary; rights semantics belong to the backend.
pub trait UserBackend: Send + Sync {
    /// Fetch a user record. Fails with `IdNotFound` for unknown logins.
    fn get_user(&self, login: &str) -> BackendResult<BackendUser>;

    /// Create a user. Fails with `DuplicatedValue` if the login is taken.
    fn create_user(
        &self,
        login: &str,
        password: &str,
        display_name: &str,
    ) -> BackendResult<()>;

    /// Update password and display name of an existing user.
    fn set_user(
        &self,
        login: &str,
        password: &str,
        display_name: &str,
    ) -> BackendResult<()>;

    /// Remove a user.
    fn remove_user(&self, login: &str) -> BackendResult<()>;

    /// Grant the public reader identity read access to a publication.
    fn grant_public_read(&self, publication: PublicationId) -> BackendResult<()>;
}

/// Descriptive attribute definitions and deduplicated value groups.
pub trait AttributeBackend: Send + Sync {
    /// Find an attribute definition by its URI. `Ok(None)` if absent.
    fn find_attribute(&self, uri: &str) -> BackendResult<Option<AttributeId>>;

    /// Create an attribute definition with a human-readable name.
    fn create_attribute(&self, uri: &str, name: &str) -> BackendResult<AttributeId>;

    /// All value groups of `attribute` whose stored value is byte-identical
    /// to `value` in the given language. The backend's deduplication is
    /// known to occasionally hold more than one match.
    fn find_value_groups(
        &self,
        attribute: AttributeId,
        value: &str,
        language: &str,
    ) -> BackendResult<Vec<ValueGroupId>>;

    /// Create a new value group holding `value`.
    fn create_value_group(
        &self,
        attribute: AttributeId,
        value: &str,
        language: &str,
    ) -> BackendResult<ValueGroupId>;

    /// Replace the full value-group list an edition holds for `attribute`.
    fn set_edition_attribute_values(
        &self,
        edition: EditionId,
        attribute: AttributeId,
        groups: &[ValueGroupId],
    ) -> BackendResult<()>;

    /// The value-group list an edition holds for `attribute`.
    fn edition_attribute_values(
        &self,
        edition: EditionId,
        attribute: AttributeId,
    ) -> BackendResult<Vec<ValueGroupId>>;
}

/// The full backend contract RODL is built against.
pub trait Backend: MetadataBackend + ContentBackend + UserBackend + AttributeBackend {}

impl<T: MetadataBackend + ContentBackend + UserBackend + AttributeBackend> Backend for T {}
