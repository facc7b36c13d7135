//! Opaque backend identifiers.
//!
//! The remote publication backend keys everything by numeric ids. RODL never
//! interprets them; it only caches them on the [`ResearchObjectHandle`] and
//! passes them back to the backend. The value `0` is reserved to mean "not
//! yet resolved" — the backend never issues it.
//!
//! [`ResearchObjectHandle`]: crate::handle::ResearchObjectHandle

use serde::{Deserialize, Serialize};

macro_rules! backend_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// The "not yet resolved" marker.
            pub const UNRESOLVED: Self = Self(0);

            /// Returns `true` if this id holds a backend-issued value.
            pub fn is_resolved(self) -> bool {
                self.0 != 0
            }

            /// Raw numeric value.
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, ":{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

backend_id!(
    /// Backend id of a workspace (a root group publication).
    WorkspaceId,
    "workspace"
);

backend_id!(
    /// Backend id of a research object (a mid-level group publication).
    RoId,
    "ro"
);

backend_id!(
    /// Backend id of one version of a research object (a leaf publication).
    RoVersionId,
    "version"
);

backend_id!(
    /// Backend id of an edition (snapshot) of a version.
    EditionId,
    "edition"
);

backend_id!(
    /// Backend id of a single file version inside an edition.
    FileVersionId,
    "file-version"
);
