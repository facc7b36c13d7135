//! Edition (snapshot) selection and publish-state management.
//!
//! A research object version accumulates editions over time. Exactly one is
//! ever "current" by policy: the edition with the latest creation timestamp,
//! ties broken by the higher numeric id. The tie-break makes the choice
//! deterministic and monotonically increasing even when the backend stores
//! timestamps with coarse resolution.

use std::sync::Arc;

use rodl_backend::{Backend, EditionInfo, PublicationId};
use rodl_types::{DlResult, EditionId, FileVersionId, RoVersionId, Snapshot};
use tracing::debug;

/// Pure selection rule: latest creation date, ties broken by higher id.
///
/// Returns `None` for an empty slice.
pub fn select_current(editions: &[EditionInfo]) -> Option<&EditionInfo> {
    editions
        .iter()
        .max_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)))
}

/// Selects current editions and manages publish state.
#[derive(Clone)]
pub struct EditionSelector {
    backend: Arc<dyn Backend>,
}

impl EditionSelector {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The current edition of `version`, or `Ok(None)` if the version has no
    /// editions yet.
    pub fn try_current_edition(&self, version: RoVersionId) -> DlResult<Option<EditionInfo>> {
        let editions = self.backend.list_editions(PublicationId::from(version))?;
        Ok(select_current(&editions).cloned())
    }

    /// The current edition of `version`. Fails with `NotFound` if the
    /// version has no editions.
    pub fn current_edition(&self, version: RoVersionId) -> DlResult<EditionInfo> {
        self.try_current_edition(version)?.ok_or_else(|| {
            rodl_types::DigitalLibraryError::not_found(format!("no edition of {version}"))
        })
    }

    /// All editions of `version`, as caller-facing snapshots.
    pub fn edition_list(&self, version: RoVersionId) -> DlResult<Vec<Snapshot>> {
        let editions = self.backend.list_editions(PublicationId::from(version))?;
        Ok(editions
            .iter()
            .map(|e| Snapshot::new(e.id, e.published, e.created))
            .collect())
    }

    /// Create a new edition of `version` seeded with an explicit list of
    /// file versions.
    pub fn create_edition(
        &self,
        version: RoVersionId,
        name: &str,
        seed: &[FileVersionId],
    ) -> DlResult<Snapshot> {
        let info = self
            .backend
            .create_edition(PublicationId::from(version), name, seed)?;
        debug!(edition = %info.id, seed = seed.len(), "created edition");
        Ok(Snapshot::new(info.id, info.published, info.created))
    }

    /// Create a new edition seeded with every file version of the current
    /// edition (a copy-on-write snapshot of the version's present state).
    pub fn create_edition_from_current(
        &self,
        version: RoVersionId,
        name: &str,
    ) -> DlResult<Snapshot> {
        let seed = match self.try_current_edition(version)? {
            Some(current) => self.backend.list_edition_versions(current.id)?,
            None => Vec::new(),
        };
        self.create_edition(version, name, &seed)
    }

    /// Mark an edition as published. Sibling editions are left alone:
    /// whether more than one edition of a version may be published at a time
    /// is a policy question this adapter does not decide.
    pub fn publish(&self, edition: EditionId) -> DlResult<()> {
        self.backend.set_edition_published(edition, true)?;
        debug!(%edition, "published edition");
        Ok(())
    }

    /// Clear an edition's published flag.
    pub fn unpublish(&self, edition: EditionId) -> DlResult<()> {
        self.backend.set_edition_published(edition, false)?;
        debug!(%edition, "unpublished edition");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rodl_backend::{InMemoryBackend, MetadataBackend};

    fn setup() -> (Arc<InMemoryBackend>, EditionSelector, RoVersionId) {
        let backend = Arc::new(InMemoryBackend::new());
        let ws = backend.create_group_publication(None, "w").unwrap();
        let ro = backend.create_group_publication(Some(ws), "r").unwrap();
        let version = backend.create_publication(ro, "v1").unwrap();
        let selector = EditionSelector::new(backend.clone());
        (backend, selector, RoVersionId(version.0))
    }

    // -----------------------------------------------------------------------
    // Current-edition selection
    // -----------------------------------------------------------------------

    #[test]
    fn no_editions_means_none() {
        let (_, selector, version) = setup();
        assert!(selector.try_current_edition(version).unwrap().is_none());
        assert!(selector.current_edition(version).unwrap_err().is_not_found());
    }

    #[test]
    fn latest_creation_date_wins() {
        let (backend, selector, version) = setup();
        let e1 = selector.create_edition(version, "v1", &[]).unwrap();
        let e2 = selector.create_edition(version, "v1", &[]).unwrap();
        backend.set_edition_created(e1.id, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        backend.set_edition_created(e2.id, Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(selector.current_edition(version).unwrap().id, e2.id);
    }

    #[test]
    fn timestamp_ties_break_by_higher_id() {
        let (backend, selector, version) = setup();
        let same = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        let e1 = selector.create_edition(version, "v1", &[]).unwrap();
        let e2 = selector.create_edition(version, "v1", &[]).unwrap();
        backend.set_edition_created(e1.id, same);
        backend.set_edition_created(e2.id, same);
        let winner = selector.current_edition(version).unwrap().id;
        assert_eq!(winner, e1.id.max(e2.id));
        // Deterministic on repeated calls.
        for _ in 0..5 {
            assert_eq!(selector.current_edition(version).unwrap().id, winner);
        }
    }

    // -----------------------------------------------------------------------
    // Copy-on-write seeding
    // -----------------------------------------------------------------------

    #[test]
    fn new_edition_inherits_current_membership() {
        let (backend, selector, version) = setup();
        let publication = PublicationId::from(version);
        let v1 = backend
            .create_file_version(publication, None, "a.txt", "text/plain")
            .unwrap();
        selector.create_edition(version, "v1", &[v1]).unwrap();

        let e2 = selector.create_edition_from_current(version, "v1").unwrap();
        assert_eq!(backend.list_edition_versions(e2.id).unwrap(), vec![v1]);
    }

    #[test]
    fn first_edition_starts_empty() {
        let (backend, selector, version) = setup();
        let e = selector.create_edition_from_current(version, "v1").unwrap();
        assert!(backend.list_edition_versions(e.id).unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Publish / unpublish
    // -----------------------------------------------------------------------

    #[test]
    fn publish_flips_exactly_one_flag() {
        let (_, selector, version) = setup();
        let e1 = selector.create_edition(version, "v1", &[]).unwrap();
        let e2 = selector.create_edition(version, "v1", &[]).unwrap();

        selector.publish(e2.id).unwrap();
        let snaps = selector.edition_list(version).unwrap();
        let published: Vec<EditionId> =
            snaps.iter().filter(|s| s.published).map(|s| s.id).collect();
        assert_eq!(published, vec![e2.id]);

        selector.unpublish(e2.id).unwrap();
        assert!(selector
            .edition_list(version)
            .unwrap()
            .iter()
            .all(|s| !s.published));
        let _ = e1;
    }

    #[test]
    fn nothing_published_by_default() {
        let (_, selector, version) = setup();
        selector.create_edition(version, "v1", &[]).unwrap();
        assert!(selector
            .edition_list(version)
            .unwrap()
            .iter()
            .all(|s| !s.published));
    }

    #[test]
    fn publish_does_not_unpublish_siblings() {
        let (_, selector, version) = setup();
        let e1 = selector.create_edition(version, "v1", &[]).unwrap();
        let e2 = selector.create_edition(version, "v1", &[]).unwrap();
        selector.publish(e1.id).unwrap();
        selector.publish(e2.id).unwrap();
        let published = selector
            .edition_list(version)
            .unwrap()
            .iter()
            .filter(|s| s.published)
            .count();
        assert_eq!(published, 2);
    }
}
