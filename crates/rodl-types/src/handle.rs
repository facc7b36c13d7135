//! Research object handles and the lazily resolved identifier chain.

use serde::{Deserialize, Serialize};

use crate::id::{EditionId, RoId, RoVersionId, WorkspaceId};

/// One level of the backend identifier chain.
///
/// The chain is strictly hierarchical: an edition id is only resolvable via
/// its version id, which requires the research object id, which requires the
/// workspace id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResolveLevel {
    Workspace,
    ResearchObject,
    Version,
    Edition,
}

impl ResolveLevel {
    /// The parent level, if any.
    pub fn parent(self) -> Option<ResolveLevel> {
        match self {
            ResolveLevel::Workspace => None,
            ResolveLevel::ResearchObject => Some(ResolveLevel::Workspace),
            ResolveLevel::Version => Some(ResolveLevel::ResearchObject),
            ResolveLevel::Edition => Some(ResolveLevel::Version),
        }
    }
}

impl std::fmt::Display for ResolveLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolveLevel::Workspace => "workspace",
            ResolveLevel::ResearchObject => "research object",
            ResolveLevel::Version => "version",
            ResolveLevel::Edition => "edition",
        };
        f.write_str(s)
    }
}

/// A research object version handle: the stable external URI plus the four
/// lazily populated backend identifiers.
///
/// The handle is a plain value object owned by the caller's session. It is
/// only mutated by the identity resolver (which caches resolved ids on it)
/// and the file mapper (which refreshes the edition id after mutation).
/// Concurrent callers each hold their own instance; nothing is shared.
///
/// The URI is expected to follow the
/// `.../workspaces/{workspace}/ros/{ro}/{version}` layout; the three trailing
/// names double as the backend lookup keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchObjectHandle {
    uri: String,
    pub workspace_id: WorkspaceId,
    pub ro_id: RoId,
    pub version_id: RoVersionId,
    pub edition_id: EditionId,
}

impl ResearchObjectHandle {
    /// Create a handle with a fully unresolved identifier chain.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            workspace_id: WorkspaceId::UNRESOLVED,
            ro_id: RoId::UNRESOLVED,
            version_id: RoVersionId::UNRESOLVED,
            edition_id: EditionId::UNRESOLVED,
        }
    }

    /// The stable external URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Name of the workspace, taken from the URI segment after `workspaces`.
    pub fn workspace_name(&self) -> Option<&str> {
        self.segment_after("workspaces")
    }

    /// Name of the research object, taken from the URI segment after `ros`.
    pub fn ro_name(&self) -> Option<&str> {
        self.segment_after("ros")
    }

    /// Name of the version: the segment following the research object name.
    pub fn version_name(&self) -> Option<&str> {
        let mut segments = self.segments().skip_while(|s| *s != "ros");
        segments.next()?; // "ros"
        segments.next()?; // research object name
        segments.next()
    }

    /// Reset the id cached for `level` and every descendant level.
    ///
    /// Called when the backend reports an identifier as gone, so the next
    /// resolver call re-derives the chain from the first stale level down.
    pub fn invalidate_from(&mut self, level: ResolveLevel) {
        match level {
            ResolveLevel::Workspace => {
                self.workspace_id = WorkspaceId::UNRESOLVED;
                self.ro_id = RoId::UNRESOLVED;
                self.version_id = RoVersionId::UNRESOLVED;
                self.edition_id = EditionId::UNRESOLVED;
            }
            ResolveLevel::ResearchObject => {
                self.ro_id = RoId::UNRESOLVED;
                self.version_id = RoVersionId::UNRESOLVED;
                self.edition_id = EditionId::UNRESOLVED;
            }
            ResolveLevel::Version => {
                self.version_id = RoVersionId::UNRESOLVED;
                self.edition_id = EditionId::UNRESOLVED;
            }
            ResolveLevel::Edition => {
                self.edition_id = EditionId::UNRESOLVED;
            }
        }
    }

    /// Non-empty path segments of the URI, with scheme and authority skipped.
    fn segments(&self) -> impl Iterator<Item = &str> {
        let path = match self.uri.find("://") {
            Some(idx) => {
                let rest = &self.uri[idx + 3..];
                match rest.find('/') {
                    Some(slash) => &rest[slash..],
                    None => "",
                }
            }
            None => self.uri.as_str(),
        };
        path.split('/').filter(|s| !s.is_empty())
    }

    fn segment_after(&self, marker: &str) -> Option<&str> {
        let mut segments = self.segments().skip_while(|s| *s != marker);
        segments.next()?;
        segments.next()
    }
}

impl std::fmt::Display for ResearchObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> ResearchObjectHandle {
        ResearchObjectHandle::new("http://example.com/workspaces/w/ros/r/v1")
    }

    #[test]
    fn new_handle_is_fully_unresolved() {
        let h = handle();
        assert!(!h.workspace_id.is_resolved());
        assert!(!h.ro_id.is_resolved());
        assert!(!h.version_id.is_resolved());
        assert!(!h.edition_id.is_resolved());
    }

    #[test]
    fn names_derive_from_uri_segments() {
        let h = handle();
        assert_eq!(h.workspace_name(), Some("w"));
        assert_eq!(h.ro_name(), Some("r"));
        assert_eq!(h.version_name(), Some("v1"));
    }

    #[test]
    fn names_missing_for_flat_uri() {
        let h = ResearchObjectHandle::new("http://example.com/other/thing");
        assert_eq!(h.workspace_name(), None);
        assert_eq!(h.ro_name(), None);
        assert_eq!(h.version_name(), None);
    }

    #[test]
    fn invalidate_resets_descendants_only() {
        let mut h = handle();
        h.workspace_id = WorkspaceId(1);
        h.ro_id = RoId(2);
        h.version_id = RoVersionId(3);
        h.edition_id = EditionId(4);

        h.invalidate_from(ResolveLevel::Version);
        assert_eq!(h.workspace_id, WorkspaceId(1));
        assert_eq!(h.ro_id, RoId(2));
        assert!(!h.version_id.is_resolved());
        assert!(!h.edition_id.is_resolved());
    }

    #[test]
    fn invalidate_workspace_clears_everything() {
        let mut h = handle();
        h.workspace_id = WorkspaceId(1);
        h.edition_id = EditionId(4);
        h.invalidate_from(ResolveLevel::Workspace);
        assert_eq!(h, handle());
    }

    #[test]
    fn level_parents() {
        assert_eq!(ResolveLevel::Workspace.parent(), None);
        assert_eq!(
            ResolveLevel::Edition.parent(),
            Some(ResolveLevel::Version)
        );
    }

    #[test]
    fn serde_round_trip() {
        let mut h = handle();
        h.version_id = RoVersionId(9);
        let json = serde_json::to_string(&h).unwrap();
        let back: ResearchObjectHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
