//! Plain data records exchanged with the backend.
//!
//! The backend keys everything by numeric ids and does not distinguish
//! workspaces from research objects structurally: both are group
//! publications, told apart only by [`PublicationKind`]. Versions are leaf
//! publications. Paths stored by the backend never carry a leading slash.

use chrono::{DateTime, Utc};
use rodl_types::{EditionId, FileVersionId, RoId, RoVersionId, WorkspaceId};

/// Backend id of any publication: root group (workspace), mid group
/// (research object), or leaf (version).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicationId(pub u64);

impl std::fmt::Display for PublicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "publication:{}", self.0)
    }
}

impl From<WorkspaceId> for PublicationId {
    fn from(id: WorkspaceId) -> Self {
        Self(id.0)
    }
}

impl From<RoId> for PublicationId {
    fn from(id: RoId) -> Self {
        Self(id.0)
    }
}

impl From<RoVersionId> for PublicationId {
    fn from(id: RoVersionId) -> Self {
        Self(id.0)
    }
}

/// Backend id of a file object. One file accumulates many file versions;
/// updates to a path keep the file id stable so version history is preserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u64);

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file:{}", self.0)
    }
}

/// Backend id of an attribute definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(pub u64);

impl std::fmt::Display for AttributeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "attribute:{}", self.0)
    }
}

/// Backend id of a deduplicated attribute value group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueGroupId(pub u64);

impl std::fmt::Display for ValueGroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "value-group:{}", self.0)
    }
}

/// Structural role of a publication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublicationKind {
    /// A workspace.
    RootGroup,
    /// A research object inside a workspace.
    MidGroup,
    /// A version of a research object.
    Leaf,
}

/// Summary of one publication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicationInfo {
    pub id: PublicationId,
    pub name: String,
    pub kind: PublicationKind,
    pub parent: Option<PublicationId>,
}

/// Summary of one edition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditionInfo {
    pub id: EditionId,
    pub publication: PublicationId,
    pub name: String,
    pub published: bool,
    pub created: DateTime<Utc>,
}

/// Summary of one file version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileVersionInfo {
    pub id: FileVersionId,
    pub file: FileId,
    /// Backend path, no leading slash. May be an empty-folder sentinel path.
    pub path: String,
    pub mime_type: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// A backend user record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendUser {
    pub login: String,
    pub display_name: String,
}
