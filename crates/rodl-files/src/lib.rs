//! File and version mapping: logical paths inside a research object edition
//! onto backend file versions.
//!
//! Every mutation works on the current edition's membership list. Updating a
//! path creates a new file version on the same backend file (history is kept
//! by the backend) and swaps it into the edition; deleting removes the
//! membership entry and leaves older editions untouched. Reads come in two
//! flavours: against the handle's current edition, or against an explicit
//! edition id (the `_at` methods), which is how sealed historical editions
//! stay readable.
//!
//! Folder structure is virtual. The mapper maintains two bookkeeping rules
//! around the empty-folder encoding of [`rodl_vpath`]:
//!
//! - after a write, empty-folder markers of the ancestors of the written
//!   path are redundant and are removed (best effort, failures logged);
//! - after deleting the last entry of a folder, a marker is recreated so
//!   the folder survives as an intentionally empty one.

use std::io::Read;
use std::sync::Arc;

use rodl_backend::{Backend, BackendError, FileVersionInfo, PublicationId};
use rodl_resolver::IdentityResolver;
use rodl_types::{
    DigitalLibraryError, DlResult, EditionId, FileVersionId, ResearchObjectHandle,
    ResourceMetadata,
};
use rodl_vpath::{
    is_sentinel_path, normalize_folder, to_backend_path, to_logical_path, EMPTY_FOLDER_MIME,
};
use tracing::{debug, warn};

/// Digest algorithm used for [`ResourceMetadata::digest`].
pub const DIGEST_METHOD: &str = "BLAKE3";

/// One entry of a folder, as consumed by content assembly.
///
/// Real files carry the version to stream; an intentionally empty folder
/// appears as a name ending in `/` with no version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderEntry {
    pub name: String,
    pub version: Option<FileVersionId>,
}

/// What an edition holds under one folder prefix.
struct FolderContents {
    entries: Vec<FileVersionInfo>,
    /// Set when the folder exists only as an empty-folder marker.
    marker: Option<FileVersionInfo>,
}

/// Maps logical file operations onto edition membership and file versions.
#[derive(Clone)]
pub struct FileMapper {
    backend: Arc<dyn Backend>,
    resolver: IdentityResolver,
}

impl FileMapper {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let resolver = IdentityResolver::new(backend.clone());
        Self { backend, resolver }
    }

    /// The resolver this mapper consults for the current edition.
    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Logical paths of everything the current edition holds under
    /// `folder` (the whole edition when `folder` is `None`).
    ///
    /// An intentionally empty folder lists as no paths at all, and empty
    /// subfolders appear as their `sub/` logical path. Asking for a folder
    /// that exists in no form fails with `NotFound`.
    pub fn file_paths_in_folder(
        &self,
        handle: &mut ResearchObjectHandle,
        folder: Option<&str>,
    ) -> DlResult<Vec<String>> {
        let edition = self.resolver.edition_id(handle)?;
        self.file_paths_at(edition, folder)
    }

    /// [`file_paths_in_folder`](Self::file_paths_in_folder) against an
    /// explicit edition, typically a sealed historical one.
    pub fn file_paths_at(
        &self,
        edition: EditionId,
        folder: Option<&str>,
    ) -> DlResult<Vec<String>> {
        let contents = self.folder_contents(edition, folder)?;
        Ok(contents
            .entries
            .iter()
            .map(|info| to_logical_path(&info.path))
            .collect())
    }

    /// Folder contents prepared for archive assembly: empty folders become
    /// directory entries, everything else carries its version id.
    pub fn folder_entries(
        &self,
        handle: &mut ResearchObjectHandle,
        folder: Option<&str>,
    ) -> DlResult<Vec<FolderEntry>> {
        let edition = self.resolver.edition_id(handle)?;
        self.folder_entries_at(edition, folder)
    }

    /// [`folder_entries`](Self::folder_entries) against an explicit edition.
    pub fn folder_entries_at(
        &self,
        edition: EditionId,
        folder: Option<&str>,
    ) -> DlResult<Vec<FolderEntry>> {
        let contents = self.folder_contents(edition, folder)?;
        if let Some(marker) = contents.marker {
            return Ok(vec![FolderEntry {
                name: to_logical_path(&marker.path),
                version: None,
            }]);
        }
        Ok(contents
            .entries
            .iter()
            .map(|info| {
                if is_sentinel_path(&info.path) {
                    FolderEntry {
                        name: to_logical_path(&info.path),
                        version: None,
                    }
                } else {
                    FolderEntry {
                        name: info.path.clone(),
                        version: Some(info.id),
                    }
                }
            })
            .collect())
    }

    /// The file version the current edition holds at `path`.
    ///
    /// A trailing slash resolves the folder's empty-folder marker. Fails
    /// with `NotFound` if the edition has nothing at the path.
    pub fn version_id(
        &self,
        handle: &mut ResearchObjectHandle,
        path: &str,
    ) -> DlResult<FileVersionId> {
        let edition = self.resolver.edition_id(handle)?;
        self.version_at(edition, path)
    }

    /// The file version an explicit edition holds at `path`.
    pub fn version_at(&self, edition: EditionId, path: &str) -> DlResult<FileVersionId> {
        Ok(self
            .backend
            .find_version_by_path(edition, &to_backend_path(path))?)
    }

    /// Whether `path` exists in the current edition. Total: any failure,
    /// including an unreachable backend or an unresolvable handle, reads
    /// as absence.
    pub fn file_exists(&self, handle: &mut ResearchObjectHandle, path: &str) -> bool {
        match self.version_id(handle, path) {
            Ok(_) => true,
            Err(err) => {
                debug!(%err, path, "existence check negative");
                false
            }
        }
    }

    /// Store `content` at `path`, creating the file or appending a version
    /// to its history, and swap the new version into the current edition.
    ///
    /// A trailing slash stores an empty-folder marker instead. Ancestor
    /// folders of the written path lose their markers, since the write
    /// proves them non-empty.
    pub fn create_or_update_file(
        &self,
        handle: &mut ResearchObjectHandle,
        path: &str,
        content: &mut dyn Read,
        mime_type: &str,
    ) -> DlResult<ResourceMetadata> {
        let publication = self.resolver.version_id(handle)?;
        let edition = self.resolver.edition_id(handle)?;
        let backend_path = to_backend_path(path);

        let existing = match self.backend.find_version_by_path(edition, &backend_path) {
            Ok(version) => Some(self.backend.file_version_info(version)?),
            Err(BackendError::IdNotFound(_)) => None,
            Err(err) => return Err(err.into()),
        };

        let created = self.backend.create_file_version(
            PublicationId::from(publication),
            existing.as_ref().map(|info| info.file),
            &backend_path,
            mime_type,
        )?;
        let written = self.backend.write_version_content(created, content)?;
        if let Some(old) = &existing {
            self.backend.remove_edition_version(edition, old.id)?;
        }
        self.backend.add_edition_version(edition, created)?;
        debug!(version = %created, path, written, "stored file version");

        self.remove_redundant_ancestor_markers(edition, path);

        self.describe(created, path)
    }

    /// Metadata of the file the current edition holds at `path`.
    pub fn file_info(
        &self,
        handle: &mut ResearchObjectHandle,
        path: &str,
    ) -> DlResult<ResourceMetadata> {
        let version = self.version_id(handle, path)?;
        self.describe(version, path)
    }

    /// Metadata of the file an explicit edition holds at `path`.
    pub fn file_info_at(&self, edition: EditionId, path: &str) -> DlResult<ResourceMetadata> {
        let version = self.version_at(edition, path)?;
        self.describe(version, path)
    }

    /// Delete `path` from the current edition.
    ///
    /// Tried in order: a concrete entry at the path (file or empty-folder
    /// marker), then a folder whose members are all removed. When deleting
    /// the last entry of a folder, the folder is preserved as an empty one.
    /// Fails with `NotFound` if the path exists in no form.
    pub fn delete_file(&self, handle: &mut ResearchObjectHandle, path: &str) -> DlResult<()> {
        let edition = self.resolver.edition_id(handle)?;
        match self.backend.find_version_by_path(edition, &to_backend_path(path)) {
            Ok(version) => self.remove_entry(handle, edition, path, version),
            Err(BackendError::IdNotFound(_)) => {
                let folder = normalize_folder(path);
                match self.folder_contents(edition, Some(&folder)) {
                    Ok(contents) => {
                        if let Some(marker) = contents.marker {
                            // The folder was given without its trailing slash.
                            return self.remove_entry(handle, edition, &folder, marker.id);
                        }
                        for info in &contents.entries {
                            self.backend.remove_edition_version(edition, info.id)?;
                            debug!(version = %info.id, path = %info.path, "removed folder member");
                        }
                        Ok(())
                    }
                    Err(err) if err.is_not_found() => {
                        Err(DigitalLibraryError::not_found(format!("file {path}")))
                    }
                    Err(err) => Err(err),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Remove one concrete entry, preserving its parent folder if the entry
    /// was the last one in it.
    fn remove_entry(
        &self,
        handle: &mut ResearchObjectHandle,
        edition: EditionId,
        logical: &str,
        version: FileVersionId,
    ) -> DlResult<()> {
        let parent = parent_folder(logical);
        let last_in_parent = match &parent {
            Some(folder) => self
                .folder_contents(edition, Some(folder))
                .map(|contents| contents.entries.len() == 1)
                .unwrap_or(false),
            None => false,
        };
        self.backend.remove_edition_version(edition, version)?;
        debug!(%version, path = logical, "removed file version from edition");
        if last_in_parent {
            if let Some(folder) = parent {
                let mut empty = std::io::empty();
                self.create_or_update_file(handle, &folder, &mut empty, EMPTY_FOLDER_MIME)?;
                debug!(folder, "preserved now-empty parent folder");
            }
        }
        Ok(())
    }

    /// Everything the edition holds under `folder`.
    ///
    /// If the folder exists only as an empty-folder marker, the marker is
    /// returned instead of entries. A `folder` that matches nothing is
    /// `NotFound`; `None` selects the whole edition and may be empty.
    fn folder_contents(
        &self,
        edition: EditionId,
        folder: Option<&str>,
    ) -> DlResult<FolderContents> {
        let folder = folder.map(normalize_folder);
        let mut entries = Vec::new();
        for id in self.backend.list_edition_versions(edition)? {
            let info = self.backend.file_version_info(id)?;
            match &folder {
                Some(folder) => {
                    if is_sentinel_path(&info.path) && to_logical_path(&info.path) == *folder {
                        return Ok(FolderContents {
                            entries: Vec::new(),
                            marker: Some(info),
                        });
                    }
                    if info.path.starts_with(folder.as_str()) {
                        entries.push(info);
                    }
                }
                None => entries.push(info),
            }
        }
        if entries.is_empty() {
            if let Some(folder) = folder {
                return Err(DigitalLibraryError::not_found(format!(
                    "folder {folder} in edition {edition}"
                )));
            }
        }
        Ok(FolderContents {
            entries,
            marker: None,
        })
    }

    /// Drop empty-folder markers on every ancestor of `path`. Best effort:
    /// the write that made them redundant has already succeeded, so cleanup
    /// failures are logged and swallowed.
    fn remove_redundant_ancestor_markers(&self, edition: EditionId, path: &str) {
        let mut ancestor = parent_folder(path);
        while let Some(folder) = ancestor {
            match self
                .backend
                .find_version_by_path(edition, &to_backend_path(&folder))
            {
                Ok(version) => match self.backend.remove_edition_version(edition, version) {
                    Ok(()) => debug!(folder, "removed redundant empty-folder marker"),
                    Err(err) => warn!(%err, folder, "empty-folder cleanup failed"),
                },
                Err(BackendError::IdNotFound(_)) => {}
                Err(err) => warn!(%err, folder, "empty-folder cleanup skipped"),
            }
            ancestor = parent_folder(&folder);
        }
    }

    fn describe(&self, version: FileVersionId, logical: &str) -> DlResult<ResourceMetadata> {
        let info = self.backend.file_version_info(version)?;
        let digest = self.backend.version_digest(version)?;
        Ok(ResourceMetadata::new(
            logical,
            hex::encode(digest),
            DIGEST_METHOD,
            info.size,
            info.last_modified,
            info.mime_type,
        ))
    }
}

/// Parent folder of a logical path, with trailing slash. `None` at the root.
fn parent_folder(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    trimmed
        .rfind('/')
        .map(|i| trimmed[..=i].to_string())
}
