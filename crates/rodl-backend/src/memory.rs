//! In-memory backend used by tests and embedding.
//!
//! All state is held behind one `RwLock`. Content reads hand out cursors
//! over cloned bytes and count outstanding locks per file version, so tests
//! can verify the release-exactly-once contract. A failure toggle makes
//! every operation return a `Remote` fault, for exercising the error
//! propagation policy.

use std::collections::HashMap;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rodl_types::{EditionId, FileVersionId};
use tracing::debug;

use crate::error::{BackendError, BackendResult};
use crate::model::{
    AttributeId, BackendUser, EditionInfo, FileId, FileVersionInfo, PublicationId,
    PublicationInfo, PublicationKind, ValueGroupId,
};
use crate::traits::{AttributeBackend, ContentBackend, MetadataBackend, UserBackend};

#[derive(Clone, Debug)]
struct PublicationRec {
    name: String,
    kind: PublicationKind,
    parent: Option<u64>,
    main_file: Option<u64>,
}

#[derive(Clone, Debug)]
struct EditionRec {
    publication: u64,
    name: String,
    published: bool,
    created: DateTime<Utc>,
    versions: Vec<u64>,
}

#[derive(Clone, Debug)]
struct FileRec {
    publication: u64,
    path: String,
    mime_type: String,
}

#[derive(Clone, Debug)]
struct VersionRec {
    file: u64,
    content: Vec<u8>,
    modified: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct UserRec {
    #[allow(dead_code)]
    password: String,
    display_name: String,
}

#[derive(Clone, Debug)]
struct AttributeRec {
    uri: String,
    #[allow(dead_code)]
    name: String,
}

#[derive(Clone, Debug)]
struct ValueGroupRec {
    attribute: u64,
    value: String,
    language: String,
}

#[derive(Default)]
struct State {
    next_id: u64,
    publications: HashMap<u64, PublicationRec>,
    editions: HashMap<u64, EditionRec>,
    files: HashMap<u64, FileRec>,
    versions: HashMap<u64, VersionRec>,
    users: HashMap<String, UserRec>,
    attributes: HashMap<u64, AttributeRec>,
    value_groups: HashMap<u64, ValueGroupRec>,
    edition_attr_values: HashMap<(u64, u64), Vec<u64>>,
    public_read: Vec<u64>,
    locks: HashMap<u64, u32>,
}

impl State {
    fn issue_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory, HashMap-based publication backend.
pub struct InMemoryBackend {
    state: RwLock<State>,
    failing: AtomicBool,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            failing: AtomicBool::new(false),
        }
    }

    /// When `true`, every subsequent operation fails with a `Remote` fault.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Outstanding content locks for one file version.
    pub fn lock_count(&self, version: FileVersionId) -> u32 {
        let state = self.state.read().expect("lock poisoned");
        state.locks.get(&version.0).copied().unwrap_or(0)
    }

    /// Outstanding content locks across all versions.
    pub fn total_locks(&self) -> u64 {
        let state = self.state.read().expect("lock poisoned");
        state.locks.values().map(|&n| u64::from(n)).sum()
    }

    /// Override the creation timestamp of an edition. Test hook for
    /// exercising the tie-break rule with controlled timestamps.
    pub fn set_edition_created(&self, edition: EditionId, created: DateTime<Utc>) {
        let mut state = self.state.write().expect("lock poisoned");
        if let Some(rec) = state.editions.get_mut(&edition.0) {
            rec.created = created;
        }
    }

    /// Whether a publication was granted public read access.
    pub fn has_public_read(&self, publication: PublicationId) -> bool {
        let state = self.state.read().expect("lock poisoned");
        state.public_read.contains(&publication.0)
    }

    fn guard(&self) -> BackendResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(BackendError::Remote("injected backend failure".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().expect("lock poisoned");
        f.debug_struct("InMemoryBackend")
            .field("publications", &state.publications.len())
            .field("editions", &state.editions.len())
            .field("versions", &state.versions.len())
            .finish()
    }
}

fn publication_info(id: u64, rec: &PublicationRec) -> PublicationInfo {
    PublicationInfo {
        id: PublicationId(id),
        name: rec.name.clone(),
        kind: rec.kind,
        parent: rec.parent.map(PublicationId),
    }
}

fn edition_info(id: u64, rec: &EditionRec) -> EditionInfo {
    EditionInfo {
        id: EditionId(id),
        publication: PublicationId(rec.publication),
        name: rec.name.clone(),
        published: rec.published,
        created: rec.created,
    }
}

impl MetadataBackend for InMemoryBackend {
    fn find_group_publication(
        &self,
        parent: Option<PublicationId>,
        name: &str,
    ) -> BackendResult<Option<PublicationId>> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        let found = state
            .publications
            .iter()
            .find(|(_, rec)| {
                rec.kind != PublicationKind::Leaf
                    && rec.parent == parent.map(|p| p.0)
                    && rec.name == name
            })
            .map(|(&id, _)| PublicationId(id));
        Ok(found)
    }

    fn create_group_publication(
        &self,
        parent: Option<PublicationId>,
        name: &str,
    ) -> BackendResult<PublicationId> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if let Some(parent) = parent {
            if !state.publications.contains_key(&parent.0) {
                return Err(BackendError::id_not_found(parent.to_string()));
            }
        }
        let clash = state.publications.values().any(|rec| {
            rec.kind != PublicationKind::Leaf
                && rec.parent == parent.map(|p| p.0)
                && rec.name == name
        });
        if clash {
            return Err(BackendError::DuplicatedValue(format!(
                "group publication '{name}'"
            )));
        }
        let kind = if parent.is_some() {
            PublicationKind::MidGroup
        } else {
            PublicationKind::RootGroup
        };
        let id = state.issue_id();
        state.publications.insert(
            id,
            PublicationRec {
                name: name.to_string(),
                kind,
                parent: parent.map(|p| p.0),
                main_file: None,
            },
        );
        Ok(PublicationId(id))
    }

    fn list_group_publications(
        &self,
        parent: Option<PublicationId>,
    ) -> BackendResult<Vec<PublicationInfo>> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        let mut result: Vec<PublicationInfo> = state
            .publications
            .iter()
            .filter(|(_, rec)| {
                rec.kind != PublicationKind::Leaf && rec.parent == parent.map(|p| p.0)
            })
            .map(|(&id, rec)| publication_info(id, rec))
            .collect();
        result.sort_by_key(|info| info.id);
        Ok(result)
    }

    fn find_publication(
        &self,
        group: PublicationId,
        name: &str,
    ) -> BackendResult<Option<PublicationId>> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        let found = state
            .publications
            .iter()
            .find(|(_, rec)| {
                rec.kind == PublicationKind::Leaf
                    && rec.parent == Some(group.0)
                    && rec.name == name
            })
            .map(|(&id, _)| PublicationId(id));
        Ok(found)
    }

    fn create_publication(
        &self,
        group: PublicationId,
        name: &str,
    ) -> BackendResult<PublicationId> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if !state.publications.contains_key(&group.0) {
            return Err(BackendError::id_not_found(group.to_string()));
        }
        let clash = state.publications.values().any(|rec| {
            rec.kind == PublicationKind::Leaf
                && rec.parent == Some(group.0)
                && rec.name == name
        });
        if clash {
            return Err(BackendError::DuplicatedValue(format!("publication '{name}'")));
        }
        let id = state.issue_id();
        state.publications.insert(
            id,
            PublicationRec {
                name: name.to_string(),
                kind: PublicationKind::Leaf,
                parent: Some(group.0),
                main_file: None,
            },
        );
        Ok(PublicationId(id))
    }

    fn list_publications(&self, group: PublicationId) -> BackendResult<Vec<PublicationInfo>> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        if !state.publications.contains_key(&group.0) {
            return Err(BackendError::id_not_found(group.to_string()));
        }
        let mut result: Vec<PublicationInfo> = state
            .publications
            .iter()
            .filter(|(_, rec)| {
                rec.kind == PublicationKind::Leaf && rec.parent == Some(group.0)
            })
            .map(|(&id, rec)| publication_info(id, rec))
            .collect();
        result.sort_by_key(|info| info.id);
        Ok(result)
    }

    fn remove_publication(&self, id: PublicationId) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if !state.publications.contains_key(&id.0) {
            return Err(BackendError::id_not_found(id.to_string()));
        }
        // Collect the publication subtree, then drop editions, files, and
        // versions that belong to it.
        let mut doomed = vec![id.0];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i];
            let children: Vec<u64> = state
                .publications
                .iter()
                .filter(|(_, rec)| rec.parent == Some(parent))
                .map(|(&cid, _)| cid)
                .collect();
            doomed.extend(children);
            i += 1;
        }
        for pid in &doomed {
            state.publications.remove(pid);
        }
        let doomed_editions: Vec<u64> = state
            .editions
            .iter()
            .filter(|(_, rec)| doomed.contains(&rec.publication))
            .map(|(&eid, _)| eid)
            .collect();
        for eid in doomed_editions {
            state.editions.remove(&eid);
            state.edition_attr_values.retain(|(e, _), _| *e != eid);
        }
        let doomed_files: Vec<u64> = state
            .files
            .iter()
            .filter(|(_, rec)| doomed.contains(&rec.publication))
            .map(|(&fid, _)| fid)
            .collect();
        state
            .versions
            .retain(|_, rec| !doomed_files.contains(&rec.file));
        for fid in doomed_files {
            state.files.remove(&fid);
        }
        Ok(())
    }

    fn set_main_file(&self, publication: PublicationId, file: FileId) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if !state.files.contains_key(&file.0) {
            return Err(BackendError::id_not_found(file.to_string()));
        }
        let rec = state
            .publications
            .get_mut(&publication.0)
            .ok_or_else(|| BackendError::id_not_found(publication.to_string()))?;
        rec.main_file = Some(file.0);
        Ok(())
    }

    fn list_editions(&self, publication: PublicationId) -> BackendResult<Vec<EditionInfo>> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        if !state.publications.contains_key(&publication.0) {
            return Err(BackendError::id_not_found(publication.to_string()));
        }
        let mut result: Vec<EditionInfo> = state
            .editions
            .iter()
            .filter(|(_, rec)| rec.publication == publication.0)
            .map(|(&id, rec)| edition_info(id, rec))
            .collect();
        result.sort_by_key(|info| info.id);
        Ok(result)
    }

    fn get_edition(&self, id: EditionId) -> BackendResult<EditionInfo> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        state
            .editions
            .get(&id.0)
            .map(|rec| edition_info(id.0, rec))
            .ok_or_else(|| BackendError::id_not_found(id.to_string()))
    }

    fn create_edition(
        &self,
        publication: PublicationId,
        name: &str,
        seed: &[FileVersionId],
    ) -> BackendResult<EditionInfo> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if !state.publications.contains_key(&publication.0) {
            return Err(BackendError::id_not_found(publication.to_string()));
        }
        for version in seed {
            if !state.versions.contains_key(&version.0) {
                return Err(BackendError::id_not_found(version.to_string()));
            }
        }
        let id = state.issue_id();
        let rec = EditionRec {
            publication: publication.0,
            name: name.to_string(),
            published: false,
            created: Utc::now(),
            versions: seed.iter().map(|v| v.0).collect(),
        };
        let info = edition_info(id, &rec);
        state.editions.insert(id, rec);
        Ok(info)
    }

    fn set_edition_published(&self, id: EditionId, published: bool) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        let rec = state
            .editions
            .get_mut(&id.0)
            .ok_or_else(|| BackendError::id_not_found(id.to_string()))?;
        rec.published = published;
        Ok(())
    }

    fn list_edition_versions(&self, edition: EditionId) -> BackendResult<Vec<FileVersionId>> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        let rec = state
            .editions
            .get(&edition.0)
            .ok_or_else(|| BackendError::id_not_found(edition.to_string()))?;
        Ok(rec.versions.iter().map(|&v| FileVersionId(v)).collect())
    }

    fn file_version_info(&self, id: FileVersionId) -> BackendResult<FileVersionInfo> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        let version = state
            .versions
            .get(&id.0)
            .ok_or_else(|| BackendError::id_not_found(id.to_string()))?;
        let file = state
            .files
            .get(&version.file)
            .ok_or_else(|| BackendError::id_not_found(FileId(version.file).to_string()))?;
        Ok(FileVersionInfo {
            id,
            file: FileId(version.file),
            path: file.path.clone(),
            mime_type: file.mime_type.clone(),
            size: version.content.len() as u64,
            last_modified: version.modified,
        })
    }

    fn find_version_by_path(
        &self,
        edition: EditionId,
        path: &str,
    ) -> BackendResult<FileVersionId> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        let rec = state
            .editions
            .get(&edition.0)
            .ok_or_else(|| BackendError::id_not_found(edition.to_string()))?;
        for &vid in &rec.versions {
            let Some(version) = state.versions.get(&vid) else {
                continue;
            };
            if let Some(file) = state.files.get(&version.file) {
                if file.path == path {
                    return Ok(FileVersionId(vid));
                }
            }
        }
        Err(BackendError::id_not_found(format!(
            "path '{path}' in {edition}"
        )))
    }

    fn create_file_version(
        &self,
        publication: PublicationId,
        existing_file: Option<FileId>,
        path: &str,
        mime_type: &str,
    ) -> BackendResult<FileVersionId> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if !state.publications.contains_key(&publication.0) {
            return Err(BackendError::id_not_found(publication.to_string()));
        }
        let file_id = match existing_file {
            Some(file) => {
                if !state.files.contains_key(&file.0) {
                    return Err(BackendError::id_not_found(file.to_string()));
                }
                file.0
            }
            None => {
                let id = state.issue_id();
                state.files.insert(
                    id,
                    FileRec {
                        publication: publication.0,
                        path: path.to_string(),
                        mime_type: mime_type.to_string(),
                    },
                );
                id
            }
        };
        let id = state.issue_id();
        state.versions.insert(
            id,
            VersionRec {
                file: file_id,
                content: Vec::new(),
                modified: Utc::now(),
            },
        );
        Ok(FileVersionId(id))
    }

    fn add_edition_version(
        &self,
        edition: EditionId,
        version: FileVersionId,
    ) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if !state.versions.contains_key(&version.0) {
            return Err(BackendError::id_not_found(version.to_string()));
        }
        let rec = state
            .editions
            .get_mut(&edition.0)
            .ok_or_else(|| BackendError::id_not_found(edition.to_string()))?;
        if !rec.versions.contains(&version.0) {
            rec.versions.push(version.0);
        }
        Ok(())
    }

    fn remove_edition_version(
        &self,
        edition: EditionId,
        version: FileVersionId,
    ) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        let rec = state
            .editions
            .get_mut(&edition.0)
            .ok_or_else(|| BackendError::id_not_found(edition.to_string()))?;
        let before = rec.versions.len();
        rec.versions.retain(|&v| v != version.0);
        if rec.versions.len() == before {
            return Err(BackendError::id_not_found(format!(
                "{version} in {edition}"
            )));
        }
        Ok(())
    }
}

impl ContentBackend for InMemoryBackend {
    fn write_version_content(
        &self,
        version: FileVersionId,
        content: &mut dyn Read,
    ) -> BackendResult<u64> {
        self.guard()?;
        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes)?;
        let mut state = self.state.write().expect("lock poisoned");
        let rec = state
            .versions
            .get_mut(&version.0)
            .ok_or_else(|| BackendError::id_not_found(version.to_string()))?;
        let written = bytes.len() as u64;
        rec.content = bytes;
        rec.modified = Utc::now();
        Ok(written)
    }

    fn read_version_content(
        &self,
        version: FileVersionId,
    ) -> BackendResult<Box<dyn Read + Send>> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        let rec = state
            .versions
            .get(&version.0)
            .ok_or_else(|| BackendError::id_not_found(version.to_string()))?;
        let content = rec.content.clone();
        let held = state.locks.entry(version.0).or_insert(0);
        *held += 1;
        debug!(%version, held = *held, "took content lock");
        Ok(Box::new(std::io::Cursor::new(content)))
    }

    fn release_version(&self, version: FileVersionId) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        match state.locks.get_mut(&version.0) {
            Some(count) if *count > 0 => {
                *count -= 1;
                debug!(%version, held = *count, "released content lock");
                if *count == 0 {
                    state.locks.remove(&version.0);
                }
                Ok(())
            }
            _ => Err(BackendError::Remote(format!("{version} is not locked"))),
        }
    }

    fn version_digest(&self, version: FileVersionId) -> BackendResult<Vec<u8>> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        let rec = state
            .versions
            .get(&version.0)
            .ok_or_else(|| BackendError::id_not_found(version.to_string()))?;
        Ok(blake3::hash(&rec.content).as_bytes().to_vec())
    }
}

impl UserBackend for InMemoryBackend {
    fn get_user(&self, login: &str) -> BackendResult<BackendUser> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        state
            .users
            .get(login)
            .map(|rec| BackendUser {
                login: login.to_string(),
                display_name: rec.display_name.clone(),
            })
            .ok_or_else(|| BackendError::id_not_found(format!("user '{login}'")))
    }

    fn create_user(
        &self,
        login: &str,
        password: &str,
        display_name: &str,
    ) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if state.users.contains_key(login) {
            return Err(BackendError::DuplicatedValue(format!("user '{login}'")));
        }
        state.users.insert(
            login.to_string(),
            UserRec {
                password: password.to_string(),
                display_name: display_name.to_string(),
            },
        );
        Ok(())
    }

    fn set_user(
        &self,
        login: &str,
        password: &str,
        display_name: &str,
    ) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        let rec = state
            .users
            .get_mut(login)
            .ok_or_else(|| BackendError::id_not_found(format!("user '{login}'")))?;
        rec.password = password.to_string();
        rec.display_name = display_name.to_string();
        Ok(())
    }

    fn remove_user(&self, login: &str) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if state.users.remove(login).is_none() {
            return Err(BackendError::id_not_found(format!("user '{login}'")));
        }
        Ok(())
    }

    fn grant_public_read(&self, publication: PublicationId) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if !state.publications.contains_key(&publication.0) {
            return Err(BackendError::id_not_found(publication.to_string()));
        }
        if !state.public_read.contains(&publication.0) {
            state.public_read.push(publication.0);
        }
        Ok(())
    }
}

impl AttributeBackend for InMemoryBackend {
    fn find_attribute(&self, uri: &str) -> BackendResult<Option<AttributeId>> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        Ok(state
            .attributes
            .iter()
            .find(|(_, rec)| rec.uri == uri)
            .map(|(&id, _)| AttributeId(id)))
    }

    fn create_attribute(&self, uri: &str, name: &str) -> BackendResult<AttributeId> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if state.attributes.values().any(|rec| rec.uri == uri) {
            return Err(BackendError::DuplicatedValue(format!("attribute '{uri}'")));
        }
        let id = state.issue_id();
        state.attributes.insert(
            id,
            AttributeRec {
                uri: uri.to_string(),
                name: name.to_string(),
            },
        );
        Ok(AttributeId(id))
    }

    fn find_value_groups(
        &self,
        attribute: AttributeId,
        value: &str,
        language: &str,
    ) -> BackendResult<Vec<ValueGroupId>> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        let mut groups: Vec<ValueGroupId> = state
            .value_groups
            .iter()
            .filter(|(_, rec)| {
                rec.attribute == attribute.0 && rec.value == value && rec.language == language
            })
            .map(|(&id, _)| ValueGroupId(id))
            .collect();
        groups.sort();
        Ok(groups)
    }

    fn create_value_group(
        &self,
        attribute: AttributeId,
        value: &str,
        language: &str,
    ) -> BackendResult<ValueGroupId> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if !state.attributes.contains_key(&attribute.0) {
            return Err(BackendError::id_not_found(attribute.to_string()));
        }
        let id = state.issue_id();
        state.value_groups.insert(
            id,
            ValueGroupRec {
                attribute: attribute.0,
                value: value.to_string(),
                language: language.to_string(),
            },
        );
        Ok(ValueGroupId(id))
    }

    fn set_edition_attribute_values(
        &self,
        edition: EditionId,
        attribute: AttributeId,
        groups: &[ValueGroupId],
    ) -> BackendResult<()> {
        self.guard()?;
        let mut state = self.state.write().expect("lock poisoned");
        if !state.editions.contains_key(&edition.0) {
            return Err(BackendError::id_not_found(edition.to_string()));
        }
        if !state.attributes.contains_key(&attribute.0) {
            return Err(BackendError::id_not_found(attribute.to_string()));
        }
        state
            .edition_attr_values
            .insert((edition.0, attribute.0), groups.iter().map(|g| g.0).collect());
        Ok(())
    }

    fn edition_attribute_values(
        &self,
        edition: EditionId,
        attribute: AttributeId,
    ) -> BackendResult<Vec<ValueGroupId>> {
        self.guard()?;
        let state = self.state.read().expect("lock poisoned");
        Ok(state
            .edition_attr_values
            .get(&(edition.0, attribute.0))
            .map(|groups| groups.iter().map(|&g| ValueGroupId(g)).collect())
            .unwrap_or_default())
    }
}
