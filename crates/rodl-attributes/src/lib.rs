//! Descriptive attribute storage on editions.
//!
//! Attribute definitions are keyed by URI and created on first use. Values
//! are deduplicated by the backend into value groups: storing a value means
//! finding the group that already holds its canonical rendering, or creating
//! one. Storing attributes for an edition is a full replacement of that
//! edition's value-group list per attribute, never an append.

use std::sync::Arc;

use rodl_backend::{AttributeId, Backend, ValueGroupId};
use rodl_resolver::IdentityResolver;
use rodl_types::{AttributeValue, DlResult, ResearchObjectHandle};
use tracing::{debug, warn};

/// Language tag recorded on every stored value group.
const ATTRIBUTE_LANGUAGE: &str = "en";

/// Stores descriptive attributes on the current edition of a research
/// object.
#[derive(Clone)]
pub struct AttributeStore {
    backend: Arc<dyn Backend>,
    resolver: IdentityResolver,
}

impl AttributeStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let resolver = IdentityResolver::new(backend.clone());
        Self { backend, resolver }
    }

    /// Replace the attribute values of the current edition.
    ///
    /// `attributes` is an ordered list of (attribute URI, value) pairs; a
    /// URI may appear more than once. For every URI present in the list,
    /// the edition's stored values are replaced in full with the values
    /// given here. Empty values are skipped with a warning, so a URI whose
    /// values are all empty ends up cleared.
    pub fn store_attributes(
        &self,
        handle: &mut ResearchObjectHandle,
        attributes: &[(String, AttributeValue)],
    ) -> DlResult<()> {
        let edition = self.resolver.edition_id(handle)?;

        // Group values by URI, preserving first-seen order of both.
        let mut grouped: Vec<(&str, Vec<&AttributeValue>)> = Vec::new();
        for (uri, value) in attributes {
            let slot = match grouped.iter().position(|(u, _)| *u == uri.as_str()) {
                Some(i) => i,
                None => {
                    grouped.push((uri.as_str(), Vec::new()));
                    grouped.len() - 1
                }
            };
            if value.is_empty() {
                warn!(uri, "skipping empty attribute value");
                continue;
            }
            grouped[slot].1.push(value);
        }

        for (uri, values) in grouped {
            let attribute = self.attribute_id(uri)?;
            let mut groups: Vec<ValueGroupId> = Vec::new();
            for value in values {
                let group = self.value_group(attribute, &value.render())?;
                if !groups.contains(&group) {
                    groups.push(group);
                }
            }
            self.backend
                .set_edition_attribute_values(edition, attribute, &groups)?;
            debug!(%attribute, uri, groups = groups.len(), "replaced edition attribute values");
        }
        Ok(())
    }

    /// The attribute definition for `uri`, created on first use.
    fn attribute_id(&self, uri: &str) -> DlResult<AttributeId> {
        if let Some(id) = self.backend.find_attribute(uri)? {
            return Ok(id);
        }
        let id = self.backend.create_attribute(uri, attribute_name(uri))?;
        debug!(%id, uri, "created attribute definition");
        Ok(id)
    }

    /// The value group holding `rendered`, reused when one exists.
    fn value_group(&self, attribute: AttributeId, rendered: &str) -> DlResult<ValueGroupId> {
        let matches = self
            .backend
            .find_value_groups(attribute, rendered, ATTRIBUTE_LANGUAGE)?;
        match matches.as_slice() {
            [] => Ok(self
                .backend
                .create_value_group(attribute, rendered, ATTRIBUTE_LANGUAGE)?),
            [only] => Ok(*only),
            [first, ..] => {
                // The backend's deduplication occasionally holds duplicates;
                // any of them represents the same value.
                warn!(%attribute, count = matches.len(), "ambiguous value groups, using the first");
                Ok(*first)
            }
        }
    }
}

/// Human-readable name of an attribute: its URI fragment, or failing that
/// the last path segment.
fn attribute_name(uri: &str) -> &str {
    match uri.rsplit_once('#') {
        Some((_, fragment)) if !fragment.is_empty() => fragment,
        _ => uri.trim_end_matches('/').rsplit('/').next().unwrap_or(uri),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rodl_backend::{AttributeBackend, InMemoryBackend, MetadataBackend};
    use rodl_types::EditionId;

    const URI: &str = "http://example.com/workspaces/w/ros/r/v1";
    const TITLE: &str = "http://purl.org/dc/terms/title";

    fn setup() -> (Arc<InMemoryBackend>, AttributeStore, ResearchObjectHandle, EditionId) {
        let backend = Arc::new(InMemoryBackend::new());
        let ws = backend.create_group_publication(None, "w").unwrap();
        let ro = backend.create_group_publication(Some(ws), "r").unwrap();
        let version = backend.create_publication(ro, "v1").unwrap();
        let edition = backend.create_edition(version, "v1", &[]).unwrap();
        let store = AttributeStore::new(backend.clone());
        (backend, store, ResearchObjectHandle::new(URI), edition.id)
    }

    fn pairs(uri: &str, values: &[&str]) -> Vec<(String, AttributeValue)> {
        values
            .iter()
            .map(|v| (uri.to_string(), AttributeValue::from(*v)))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Storing and replacement
    // -----------------------------------------------------------------------

    #[test]
    fn stores_values_on_the_current_edition() {
        let (backend, store, mut handle, edition) = setup();
        store
            .store_attributes(&mut handle, &pairs(TITLE, &["A title", "Another"]))
            .unwrap();
        let attribute = backend.find_attribute(TITLE).unwrap().unwrap();
        assert_eq!(
            backend.edition_attribute_values(edition, attribute).unwrap().len(),
            2
        );
    }

    #[test]
    fn storing_again_replaces_not_appends() {
        let (backend, store, mut handle, edition) = setup();
        store
            .store_attributes(&mut handle, &pairs(TITLE, &["old", "older"]))
            .unwrap();
        store
            .store_attributes(&mut handle, &pairs(TITLE, &["new"]))
            .unwrap();
        let attribute = backend.find_attribute(TITLE).unwrap().unwrap();
        assert_eq!(
            backend.edition_attribute_values(edition, attribute).unwrap().len(),
            1
        );
    }

    #[test]
    fn all_empty_values_clear_the_attribute() {
        let (backend, store, mut handle, edition) = setup();
        store
            .store_attributes(&mut handle, &pairs(TITLE, &["kept"]))
            .unwrap();
        store
            .store_attributes(&mut handle, &pairs(TITLE, &["", "   "]))
            .unwrap();
        let attribute = backend.find_attribute(TITLE).unwrap().unwrap();
        assert!(backend
            .edition_attribute_values(edition, attribute)
            .unwrap()
            .is_empty());
    }

    // -----------------------------------------------------------------------
    // Deduplication
    // -----------------------------------------------------------------------

    #[test]
    fn equal_values_share_one_group() {
        let (backend, store, mut handle, edition) = setup();
        store
            .store_attributes(&mut handle, &pairs(TITLE, &["same", "same"]))
            .unwrap();
        let attribute = backend.find_attribute(TITLE).unwrap().unwrap();
        assert_eq!(
            backend.edition_attribute_values(edition, attribute).unwrap().len(),
            1
        );
    }

    #[test]
    fn existing_group_is_reused() {
        let (backend, store, mut handle, _) = setup();
        let attribute = backend.create_attribute(TITLE, "title").unwrap();
        let group = backend
            .create_value_group(attribute, "shared", ATTRIBUTE_LANGUAGE)
            .unwrap();
        store
            .store_attributes(&mut handle, &pairs(TITLE, &["shared"]))
            .unwrap();
        assert_eq!(
            backend
                .find_value_groups(attribute, "shared", ATTRIBUTE_LANGUAGE)
                .unwrap(),
            vec![group]
        );
    }

    #[test]
    fn ambiguous_groups_pick_the_first() {
        let (backend, store, mut handle, edition) = setup();
        let attribute = backend.create_attribute(TITLE, "title").unwrap();
        let first = backend
            .create_value_group(attribute, "dup", ATTRIBUTE_LANGUAGE)
            .unwrap();
        backend
            .create_value_group(attribute, "dup", ATTRIBUTE_LANGUAGE)
            .unwrap();
        store
            .store_attributes(&mut handle, &pairs(TITLE, &["dup"]))
            .unwrap();
        assert_eq!(
            backend.edition_attribute_values(edition, attribute).unwrap(),
            vec![first]
        );
    }

    // -----------------------------------------------------------------------
    // Definitions and value kinds
    // -----------------------------------------------------------------------

    #[test]
    fn definition_is_created_once() {
        let (backend, store, mut handle, _) = setup();
        store
            .store_attributes(&mut handle, &pairs(TITLE, &["a"]))
            .unwrap();
        let first = backend.find_attribute(TITLE).unwrap().unwrap();
        store
            .store_attributes(&mut handle, &pairs(TITLE, &["b"]))
            .unwrap();
        assert_eq!(backend.find_attribute(TITLE).unwrap().unwrap(), first);
    }

    #[test]
    fn timestamps_store_their_canonical_rendering() {
        let (backend, store, mut handle, _) = setup();
        let uri = "http://purl.org/dc/terms/created";
        let t = Utc.with_ymd_and_hms(2012, 3, 14, 15, 9, 26).unwrap();
        store
            .store_attributes(&mut handle, &[(uri.to_string(), AttributeValue::from(t))])
            .unwrap();
        let attribute = backend.find_attribute(uri).unwrap().unwrap();
        assert_eq!(
            backend
                .find_value_groups(attribute, "2012.03.14 15:09:26 UTC", ATTRIBUTE_LANGUAGE)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn attribute_names_derive_from_the_uri() {
        assert_eq!(attribute_name("http://purl.org/dc/terms/title"), "title");
        assert_eq!(attribute_name("http://example.com/vocab#creator"), "creator");
        assert_eq!(attribute_name("plain"), "plain");
    }
}
