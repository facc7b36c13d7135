//! Foundation types for RODL (Research Object Digital Library adapter).
//!
//! This crate provides the identifier chain, handle, and value types used
//! throughout the RODL system. Every other RODL crate depends on
//! `rodl-types`.
//!
//! # Key Types
//!
//! - [`ResearchObjectHandle`] — A research object URI plus its lazily
//!   resolved chain of backend identifiers
//! - [`WorkspaceId`], [`RoId`], [`RoVersionId`], [`EditionId`],
//!   [`FileVersionId`] — Opaque numeric backend identifiers (0 = unresolved)
//! - [`Snapshot`] — An edition of a research object version
//! - [`ResourceMetadata`] — Descriptive metadata of one stored file
//! - [`AttributeValue`] — Tagged union of descriptive metadata values
//! - [`DigitalLibraryError`] — The four-kind error taxonomy every caller sees

pub mod error;
pub mod handle;
pub mod id;
pub mod profile;
pub mod resource;
pub mod snapshot;
pub mod value;

pub use error::{DigitalLibraryError, DlResult};
pub use handle::{ResearchObjectHandle, ResolveLevel};
pub use id::{EditionId, FileVersionId, RoId, RoVersionId, WorkspaceId};
pub use profile::{Role, UserProfile};
pub use resource::ResourceMetadata;
pub use snapshot::Snapshot;
pub use value::AttributeValue;
