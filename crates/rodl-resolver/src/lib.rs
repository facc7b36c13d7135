//! Identity resolution: mapping research object handles onto the backend's
//! opaque identifier chain.
//!
//! The chain workspace id → research object id → version id → edition id is
//! resolved lazily, one level at a time, and cached on the caller-owned
//! [`ResearchObjectHandle`]. Lookup keys derive from the handle URI: the
//! workspace by its name segment, the research object by (workspace id,
//! name), the version by (research object id, name), and the edition as the
//! current edition of the version.
//!
//! When the backend reports a cached ancestor id as gone, all descendant ids
//! are invalidated and the chain is re-derived exactly once; a second
//! failure propagates.

use std::sync::Arc;

use rodl_backend::{Backend, BackendError, PublicationId};
use rodl_editions::EditionSelector;
use rodl_types::{
    DigitalLibraryError, DlResult, EditionId, ResearchObjectHandle, ResolveLevel, RoId,
    RoVersionId, WorkspaceId,
};
use tracing::debug;

/// Resolves and caches the backend identifier chain for research object
/// handles.
#[derive(Clone)]
pub struct IdentityResolver {
    backend: Arc<dyn Backend>,
    editions: EditionSelector,
}

impl IdentityResolver {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let editions = EditionSelector::new(backend.clone());
        Self { backend, editions }
    }

    /// Resolve the id for `level`, caching it (and any ancestors resolved on
    /// the way) on the handle. Returns `0` when the object at `level` (or
    /// any ancestor) does not exist — absence is not an error here, so
    /// create-if-missing flows can probe cheaply.
    pub fn try_resolve(
        &self,
        handle: &mut ResearchObjectHandle,
        level: ResolveLevel,
    ) -> DlResult<u64> {
        match level {
            ResolveLevel::Workspace => Ok(self.try_workspace(handle)?.0),
            ResolveLevel::ResearchObject => Ok(self.try_ro(handle)?.0),
            ResolveLevel::Version => Ok(self.try_version(handle)?.0),
            ResolveLevel::Edition => Ok(self.try_edition(handle)?.0),
        }
    }

    /// Resolve the id for `level`, failing with `NotFound` naming that
    /// level when it (or an ancestor) does not exist.
    pub fn resolve(
        &self,
        handle: &mut ResearchObjectHandle,
        level: ResolveLevel,
    ) -> DlResult<u64> {
        let id = self.try_resolve(handle, level)?;
        if id == 0 {
            return Err(DigitalLibraryError::not_found(format!(
                "{level} of {handle}"
            )));
        }
        Ok(id)
    }

    /// Required workspace id of the handle.
    pub fn workspace_id(&self, handle: &mut ResearchObjectHandle) -> DlResult<WorkspaceId> {
        self.resolve(handle, ResolveLevel::Workspace)
            .map(WorkspaceId)
    }

    /// Required research object id of the handle.
    pub fn ro_id(&self, handle: &mut ResearchObjectHandle) -> DlResult<RoId> {
        self.resolve(handle, ResolveLevel::ResearchObject).map(RoId)
    }

    /// Required version id of the handle.
    pub fn version_id(&self, handle: &mut ResearchObjectHandle) -> DlResult<RoVersionId> {
        self.resolve(handle, ResolveLevel::Version).map(RoVersionId)
    }

    /// Required edition id of the handle.
    pub fn edition_id(&self, handle: &mut ResearchObjectHandle) -> DlResult<EditionId> {
        self.resolve(handle, ResolveLevel::Edition).map(EditionId)
    }

    fn try_workspace(&self, handle: &mut ResearchObjectHandle) -> DlResult<WorkspaceId> {
        if handle.workspace_id.is_resolved() {
            return Ok(handle.workspace_id);
        }
        let Some(name) = handle.workspace_name().map(str::to_string) else {
            return Err(DigitalLibraryError::not_found(format!(
                "workspace name in {handle}"
            )));
        };
        match self.backend.find_group_publication(None, &name)? {
            Some(id) => {
                handle.workspace_id = WorkspaceId(id.0);
                debug!(workspace = %handle.workspace_id, %name, "resolved workspace");
                Ok(handle.workspace_id)
            }
            None => Ok(WorkspaceId::UNRESOLVED),
        }
    }

    fn try_ro(&self, handle: &mut ResearchObjectHandle) -> DlResult<RoId> {
        if handle.ro_id.is_resolved() {
            return Ok(handle.ro_id);
        }
        let Some(name) = handle.ro_name().map(str::to_string) else {
            return Err(DigitalLibraryError::not_found(format!(
                "research object name in {handle}"
            )));
        };
        for attempt in 0..2 {
            let workspace = self.try_workspace(handle)?;
            if !workspace.is_resolved() {
                return Ok(RoId::UNRESOLVED);
            }
            match self
                .backend
                .find_group_publication(Some(PublicationId::from(workspace)), &name)
            {
                Ok(Some(id)) => {
                    handle.ro_id = RoId(id.0);
                    debug!(ro = %handle.ro_id, %name, "resolved research object");
                    return Ok(handle.ro_id);
                }
                Ok(None) => return Ok(RoId::UNRESOLVED),
                // The cached workspace id is stale: drop the chain from the
                // workspace down and re-derive once.
                Err(BackendError::IdNotFound(what)) if attempt == 0 => {
                    debug!(%what, "workspace id stale, re-deriving chain");
                    handle.invalidate_from(ResolveLevel::Workspace);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(RoId::UNRESOLVED)
    }

    fn try_version(&self, handle: &mut ResearchObjectHandle) -> DlResult<RoVersionId> {
        if handle.version_id.is_resolved() {
            return Ok(handle.version_id);
        }
        let Some(name) = handle.version_name().map(str::to_string) else {
            return Err(DigitalLibraryError::not_found(format!(
                "version name in {handle}"
            )));
        };
        for attempt in 0..2 {
            let ro = self.try_ro(handle)?;
            if !ro.is_resolved() {
                return Ok(RoVersionId::UNRESOLVED);
            }
            match self
                .backend
                .find_publication(PublicationId::from(ro), &name)
            {
                Ok(Some(id)) => {
                    handle.version_id = RoVersionId(id.0);
                    debug!(version = %handle.version_id, %name, "resolved version");
                    return Ok(handle.version_id);
                }
                Ok(None) => return Ok(RoVersionId::UNRESOLVED),
                Err(BackendError::IdNotFound(what)) if attempt == 0 => {
                    debug!(%what, "research object id stale, re-deriving chain");
                    handle.invalidate_from(ResolveLevel::ResearchObject);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(RoVersionId::UNRESOLVED)
    }

    fn try_edition(&self, handle: &mut ResearchObjectHandle) -> DlResult<EditionId> {
        if handle.edition_id.is_resolved() {
            return Ok(handle.edition_id);
        }
        for attempt in 0..2 {
            let version = self.try_version(handle)?;
            if !version.is_resolved() {
                return Ok(EditionId::UNRESOLVED);
            }
            match self.editions.try_current_edition(version) {
                Ok(Some(edition)) => {
                    handle.edition_id = edition.id;
                    debug!(edition = %handle.edition_id, "resolved current edition");
                    return Ok(handle.edition_id);
                }
                Ok(None) => return Ok(EditionId::UNRESOLVED),
                Err(DigitalLibraryError::NotFound(what)) if attempt == 0 => {
                    debug!(%what, "version id stale, re-deriving chain");
                    handle.invalidate_from(ResolveLevel::Version);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(EditionId::UNRESOLVED)
    }
}
