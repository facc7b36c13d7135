//! The `DigitalLibrary` facade.

use std::io::Read;
use std::sync::Arc;

use rodl_attributes::AttributeStore;
use rodl_backend::{Backend, BackendError, PublicationId};
use rodl_content::{ContentAssembler, UnlockingReader, ZipStream};
use rodl_editions::EditionSelector;
use rodl_files::FileMapper;
use rodl_resolver::IdentityResolver;
use rodl_types::{
    AttributeValue, DigitalLibraryError, DlResult, EditionId, ResearchObjectHandle, ResolveLevel,
    ResourceMetadata, Role, RoId, RoVersionId, Snapshot, UserProfile, WorkspaceId,
};
use tracing::debug;

use crate::config::ConnectionConfig;

/// One digital library connection: the facade every caller talks to.
///
/// Cheap to clone; clones share the backend connection.
#[derive(Clone)]
pub struct DigitalLibrary {
    backend: Arc<dyn Backend>,
    config: ConnectionConfig,
    resolver: IdentityResolver,
    editions: EditionSelector,
    files: FileMapper,
    content: ContentAssembler,
    attributes: AttributeStore,
}

impl DigitalLibrary {
    pub fn new(backend: Arc<dyn Backend>, config: ConnectionConfig) -> Self {
        Self {
            resolver: IdentityResolver::new(backend.clone()),
            editions: EditionSelector::new(backend.clone()),
            files: FileMapper::new(backend.clone()),
            content: ContentAssembler::new(backend.clone()),
            attributes: AttributeStore::new(backend.clone()),
            backend,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Profile of `login`, or of the session identity when `login` is
    /// `None`.
    ///
    /// The role derives from the login alone: the configured admin login is
    /// `Admin`, the public reader login is `Public`, everyone else is
    /// `Authenticated`.
    pub fn get_user_profile(&self, login: Option<&str>) -> DlResult<UserProfile> {
        let login = login.unwrap_or(&self.config.login);
        let user = self.backend.get_user(login)?;
        let role = self.role_of(login);
        Ok(UserProfile::new(user.login, user.display_name, role))
    }

    /// Create a user, or update password and display name if the login is
    /// already taken. Returns `true` only when the user was newly created.
    pub fn create_user(&self, login: &str, password: &str, display_name: &str) -> DlResult<bool> {
        match self.backend.get_user(login) {
            Ok(_) => {
                self.backend.set_user(login, password, display_name)?;
                debug!(login, "updated existing user");
                Ok(false)
            }
            Err(BackendError::IdNotFound(_)) => {
                self.backend.create_user(login, password, display_name)?;
                debug!(login, "created user");
                Ok(true)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn user_exists(&self, login: &str) -> DlResult<bool> {
        match self.backend.get_user(login) {
            Ok(_) => Ok(true),
            Err(BackendError::IdNotFound(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn delete_user(&self, login: &str) -> DlResult<()> {
        Ok(self.backend.remove_user(login)?)
    }

    fn role_of(&self, login: &str) -> Role {
        if login == self.config.admin_login {
            Role::Admin
        } else if login == self.config.public_reader_login {
            Role::Public
        } else {
            Role::Authenticated
        }
    }

    // -----------------------------------------------------------------------
    // Workspaces
    // -----------------------------------------------------------------------

    /// Create a workspace and grant the public reader access to it.
    pub fn create_workspace(&self, name: &str) -> DlResult<WorkspaceId> {
        let id = self.backend.create_group_publication(None, name)?;
        self.backend.grant_public_read(id)?;
        debug!(workspace = name, %id, "created workspace");
        Ok(WorkspaceId(id.0))
    }

    pub fn delete_workspace(&self, name: &str) -> DlResult<()> {
        match self.backend.find_group_publication(None, name)? {
            Some(id) => Ok(self.backend.remove_publication(id)?),
            None => Err(DigitalLibraryError::not_found(format!("workspace {name}"))),
        }
    }

    /// Names of all workspaces.
    pub fn workspace_ids(&self) -> DlResult<Vec<String>> {
        let groups = self.backend.list_group_publications(None)?;
        Ok(groups.into_iter().map(|g| g.name).collect())
    }

    /// Names of the research objects inside `workspace`.
    pub fn research_object_ids(&self, workspace: &str) -> DlResult<Vec<String>> {
        let id = self
            .backend
            .find_group_publication(None, workspace)?
            .ok_or_else(|| {
                DigitalLibraryError::not_found(format!("workspace {workspace}"))
            })?;
        let groups = self.backend.list_group_publications(Some(id))?;
        Ok(groups.into_iter().map(|g| g.name).collect())
    }

    /// Names of the versions of the handle's research object.
    pub fn version_ids(&self, handle: &mut ResearchObjectHandle) -> DlResult<Vec<String>> {
        let ro = self.resolver.ro_id(handle)?;
        let publications = self.backend.list_publications(PublicationId::from(ro))?;
        Ok(publications.into_iter().map(|p| p.name).collect())
    }

    // -----------------------------------------------------------------------
    // Research object and version lifecycle
    // -----------------------------------------------------------------------

    /// Create the research object the handle names, its first version, and
    /// that version's main file. The workspace is created on first use.
    ///
    /// Fails with `Conflict` if the research object already exists.
    pub fn create_research_object(
        &self,
        handle: &mut ResearchObjectHandle,
        content: &mut dyn Read,
        path: &str,
        mime_type: &str,
    ) -> DlResult<ResourceMetadata> {
        let workspace_name = handle
            .workspace_name()
            .ok_or_else(|| {
                DigitalLibraryError::not_found(format!("workspace name in {handle}"))
            })?
            .to_string();
        let ro_name = handle
            .ro_name()
            .ok_or_else(|| {
                DigitalLibraryError::not_found(format!("research object name in {handle}"))
            })?
            .to_string();

        let workspace = match self.resolver.try_resolve(handle, ResolveLevel::Workspace)? {
            0 => PublicationId::from(self.create_workspace(&workspace_name)?),
            id => PublicationId(id),
        };
        handle.workspace_id = WorkspaceId(workspace.0);

        if self
            .resolver
            .try_resolve(handle, ResolveLevel::ResearchObject)?
            != 0
        {
            return Err(DigitalLibraryError::Conflict(format!(
                "research object {ro_name}"
            )));
        }
        let ro = self
            .backend
            .create_group_publication(Some(workspace), &ro_name)?;
        handle.ro_id = RoId(ro.0);
        debug!(research_object = ro_name, %ro, "created research object");

        self.create_version(handle, content, path, mime_type)
    }

    /// Delete the research object the handle names, all versions included.
    pub fn delete_research_object(&self, handle: &mut ResearchObjectHandle) -> DlResult<()> {
        let ro = self.resolver.ro_id(handle)?;
        self.backend.remove_publication(PublicationId::from(ro))?;
        handle.invalidate_from(ResolveLevel::ResearchObject);
        debug!(%ro, "deleted research object");
        Ok(())
    }

    /// Create the version the handle names, seeded with one main file.
    ///
    /// The version gets a first edition holding the main file, and the file
    /// is marked as the publication's main file. Duplicate version names
    /// are a `Conflict`.
    pub fn create_version(
        &self,
        handle: &mut ResearchObjectHandle,
        content: &mut dyn Read,
        path: &str,
        mime_type: &str,
    ) -> DlResult<ResourceMetadata> {
        let publication = self.new_version_publication(handle)?;
        let name = version_label(handle)?;
        self.editions
            .create_edition(RoVersionId(publication.0), &name, &[])?;

        let path = clean_path(path);
        let meta = self
            .files
            .create_or_update_file(handle, path, content, mime_type)?;
        let version = self.files.version_id(handle, path)?;
        let file = self.backend.file_version_info(version)?.file;
        self.backend.set_main_file(publication, file)?;
        debug!(version = name, %publication, "created version");
        Ok(meta)
    }

    /// Create the version the handle names as a copy of `base_version`:
    /// its first edition is seeded with every file version of the base
    /// version's current edition.
    pub fn create_version_as_copy(
        &self,
        handle: &mut ResearchObjectHandle,
        base_version: &str,
    ) -> DlResult<()> {
        let ro = self.resolver.ro_id(handle)?;
        let base = self
            .backend
            .find_publication(PublicationId::from(ro), base_version)?
            .ok_or_else(|| {
                DigitalLibraryError::not_found(format!("version {base_version}"))
            })?;
        let seed = match self.editions.try_current_edition(RoVersionId(base.0))? {
            Some(current) => self.backend.list_edition_versions(current.id)?,
            None => Vec::new(),
        };

        let publication = self.new_version_publication(handle)?;
        let name = version_label(handle)?;
        self.editions
            .create_edition(RoVersionId(publication.0), &name, &seed)?;
        debug!(version = name, base = base_version, "created version as copy");
        Ok(())
    }

    /// Delete the version the handle names, editions included.
    pub fn delete_version(&self, handle: &mut ResearchObjectHandle) -> DlResult<()> {
        let version = self.resolver.version_id(handle)?;
        self.backend
            .remove_publication(PublicationId::from(version))?;
        handle.invalidate_from(ResolveLevel::Version);
        debug!(%version, "deleted version");
        Ok(())
    }

    /// Create the leaf publication for the handle's version name, checking
    /// for name clashes, and cache its id on the handle.
    fn new_version_publication(
        &self,
        handle: &mut ResearchObjectHandle,
    ) -> DlResult<PublicationId> {
        let ro = self.resolver.ro_id(handle)?;
        let name = version_label(handle)?;
        if self
            .backend
            .find_publication(PublicationId::from(ro), &name)?
            .is_some()
        {
            return Err(DigitalLibraryError::Conflict(format!("version {name}")));
        }
        let publication = self.backend.create_publication(PublicationId::from(ro), &name)?;
        handle.version_id = RoVersionId(publication.0);
        handle.invalidate_from(ResolveLevel::Edition);
        Ok(publication)
    }

    // -----------------------------------------------------------------------
    // Editions
    // -----------------------------------------------------------------------

    /// All editions of the handle's version.
    pub fn edition_list(&self, handle: &mut ResearchObjectHandle) -> DlResult<Vec<Snapshot>> {
        let version = self.resolver.version_id(handle)?;
        self.editions.edition_list(version)
    }

    /// Snapshot the version's present state into a new edition, which
    /// becomes the current one.
    pub fn create_edition(
        &self,
        handle: &mut ResearchObjectHandle,
        name: &str,
    ) -> DlResult<Snapshot> {
        let version = self.resolver.version_id(handle)?;
        let snapshot = self.editions.create_edition_from_current(version, name)?;
        handle.invalidate_from(ResolveLevel::Edition);
        Ok(snapshot)
    }

    pub fn publish_edition(&self, edition: EditionId) -> DlResult<()> {
        self.editions.publish(edition)
    }

    pub fn unpublish_edition(&self, edition: EditionId) -> DlResult<()> {
        self.editions.unpublish(edition)
    }

    /// Mark the current edition of the handle's version as published.
    pub fn publish_version(&self, handle: &mut ResearchObjectHandle) -> DlResult<()> {
        let edition = self.resolver.edition_id(handle)?;
        self.editions.publish(edition)
    }

    /// Withdraw the published mark from the current edition of the
    /// handle's version.
    pub fn unpublish_version(&self, handle: &mut ResearchObjectHandle) -> DlResult<()> {
        let edition = self.resolver.edition_id(handle)?;
        self.editions.unpublish(edition)
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    /// Logical paths under `folder` in the current edition (`None` for the
    /// whole research object version).
    pub fn list_resource_paths(
        &self,
        handle: &mut ResearchObjectHandle,
        folder: Option<&str>,
    ) -> DlResult<Vec<String>> {
        self.files.file_paths_in_folder(handle, folder_arg(folder))
    }

    /// Logical paths under `folder` in an explicit edition, typically a
    /// sealed one taken from [`edition_list`](Self::edition_list).
    pub fn list_resource_paths_at(
        &self,
        edition: EditionId,
        folder: Option<&str>,
    ) -> DlResult<Vec<String>> {
        self.files.file_paths_at(edition, folder_arg(folder))
    }

    pub fn file_exists(&self, handle: &mut ResearchObjectHandle, path: &str) -> bool {
        self.files.file_exists(handle, clean_path(path))
    }

    pub fn create_or_update_file(
        &self,
        handle: &mut ResearchObjectHandle,
        path: &str,
        content: &mut dyn Read,
        mime_type: &str,
    ) -> DlResult<ResourceMetadata> {
        self.files
            .create_or_update_file(handle, clean_path(path), content, mime_type)
    }

    pub fn get_file_info(
        &self,
        handle: &mut ResearchObjectHandle,
        path: &str,
    ) -> DlResult<ResourceMetadata> {
        self.files.file_info(handle, clean_path(path))
    }

    /// Metadata of the file `path` holds in an explicit edition.
    pub fn get_file_info_at(&self, edition: EditionId, path: &str) -> DlResult<ResourceMetadata> {
        self.files.file_info_at(edition, clean_path(path))
    }

    /// Mime type of the file at `path` in the current edition.
    pub fn get_file_mime_type(
        &self,
        handle: &mut ResearchObjectHandle,
        path: &str,
    ) -> DlResult<String> {
        Ok(self.get_file_info(handle, path)?.mime_type)
    }

    /// Mime type of the file at `path` in an explicit edition.
    pub fn get_file_mime_type_at(&self, edition: EditionId, path: &str) -> DlResult<String> {
        Ok(self.get_file_info_at(edition, path)?.mime_type)
    }

    pub fn delete_file(&self, handle: &mut ResearchObjectHandle, path: &str) -> DlResult<()> {
        self.files.delete_file(handle, clean_path(path))
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    /// Content stream of one file. Dropping the reader releases the
    /// backend-side lock.
    pub fn get_file_contents(
        &self,
        handle: &mut ResearchObjectHandle,
        path: &str,
    ) -> DlResult<UnlockingReader> {
        self.content.file_content(handle, clean_path(path))
    }

    /// Zip archive of everything under `folder` in the current edition.
    pub fn get_zipped_folder(
        &self,
        handle: &mut ResearchObjectHandle,
        folder: Option<&str>,
    ) -> DlResult<ZipStream> {
        self.content.zipped_folder(handle, folder_arg(folder))
    }

    /// Content stream of one file in an explicit edition.
    pub fn get_file_contents_at(
        &self,
        edition: EditionId,
        path: &str,
    ) -> DlResult<UnlockingReader> {
        self.content.file_content_at(edition, clean_path(path))
    }

    /// Zip archive of the whole current edition.
    pub fn get_zipped_research_object(
        &self,
        handle: &mut ResearchObjectHandle,
    ) -> DlResult<ZipStream> {
        self.content.zipped_edition(handle)
    }

    /// Zip archive of everything under `folder` in an explicit edition
    /// (`None` for the full edition).
    pub fn get_zipped_folder_at(
        &self,
        edition: EditionId,
        folder: Option<&str>,
    ) -> DlResult<ZipStream> {
        self.content.zipped_folder_at(edition, folder_arg(folder))
    }

    // -----------------------------------------------------------------------
    // Attributes
    // -----------------------------------------------------------------------

    /// Replace the descriptive attributes of the current edition.
    pub fn store_attributes(
        &self,
        handle: &mut ResearchObjectHandle,
        attributes: &[(String, AttributeValue)],
    ) -> DlResult<()> {
        self.attributes.store_attributes(handle, attributes)
    }
}

/// Logical paths never carry a leading slash; tolerate callers that pass
/// one.
fn clean_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// A folder argument of `None`, `""`, or `"/"` selects the whole edition.
fn folder_arg(folder: Option<&str>) -> Option<&str> {
    match folder.map(clean_path) {
        None | Some("") => None,
        Some(folder) => Some(folder),
    }
}

fn version_label(handle: &ResearchObjectHandle) -> DlResult<String> {
    handle
        .version_name()
        .map(str::to_string)
        .ok_or_else(|| DigitalLibraryError::not_found(format!("version name in {handle}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodl_backend::InMemoryBackend;

    const URI: &str = "http://example.com/workspaces/w/ros/r/v1";

    fn library() -> (Arc<InMemoryBackend>, DigitalLibrary) {
        let backend = Arc::new(InMemoryBackend::new());
        let library = DigitalLibrary::new(backend.clone(), ConnectionConfig::default());
        (backend, library)
    }

    fn created(library: &DigitalLibrary) -> ResearchObjectHandle {
        let mut handle = ResearchObjectHandle::new(URI);
        let mut content: &[u8] = b"main";
        library
            .create_research_object(&mut handle, &mut content, "main.txt", "text/plain")
            .unwrap();
        handle
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn create_research_object_builds_the_whole_chain() {
        let (_, library) = library();
        let mut handle = created(&library);
        assert_eq!(library.workspace_ids().unwrap(), vec!["w"]);
        assert_eq!(library.research_object_ids("w").unwrap(), vec!["r"]);
        assert_eq!(library.version_ids(&mut handle).unwrap(), vec!["v1"]);
        assert_eq!(
            library.list_resource_paths(&mut handle, None).unwrap(),
            vec!["main.txt"]
        );
    }

    #[test]
    fn duplicate_research_object_is_a_conflict() {
        let (_, library) = library();
        created(&library);
        let mut again = ResearchObjectHandle::new(URI);
        let mut content: &[u8] = b"main";
        let err = library
            .create_research_object(&mut again, &mut content, "main.txt", "text/plain")
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn duplicate_version_is_a_conflict() {
        let (_, library) = library();
        created(&library);
        let mut handle = ResearchObjectHandle::new(URI);
        let mut content: &[u8] = b"main";
        let err = library
            .create_version(&mut handle, &mut content, "main.txt", "text/plain")
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn version_copy_inherits_the_base_content() {
        let (_, library) = library();
        let mut v1 = created(&library);
        let mut content: &[u8] = b"extra";
        library
            .create_or_update_file(&mut v1, "extra.txt", &mut content, "text/plain")
            .unwrap();

        let mut v2 =
            ResearchObjectHandle::new("http://example.com/workspaces/w/ros/r/v2");
        library.create_version_as_copy(&mut v2, "v1").unwrap();
        let mut paths = library.list_resource_paths(&mut v2, None).unwrap();
        paths.sort();
        assert_eq!(paths, vec!["extra.txt", "main.txt"]);
    }

    #[test]
    fn delete_version_forgets_it() {
        let (_, library) = library();
        let mut handle = created(&library);
        library.delete_version(&mut handle).unwrap();
        assert!(library.version_ids(&mut handle).unwrap().is_empty());
    }

    #[test]
    fn delete_research_object_forgets_it() {
        let (_, library) = library();
        let mut handle = created(&library);
        library.delete_research_object(&mut handle).unwrap();
        assert!(library.research_object_ids("w").unwrap().is_empty());
        let err = library.delete_research_object(&mut handle).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_missing_workspace_is_not_found() {
        let (_, library) = library();
        assert!(library.delete_workspace("nope").unwrap_err().is_not_found());
    }

    // -----------------------------------------------------------------------
    // Users and roles
    // -----------------------------------------------------------------------

    #[test]
    fn role_rule_follows_the_login() {
        let (_, library) = library();
        for login in ["wfadmin", "wf4ever_reader", "jdoe"] {
            library.create_user(login, "pw", login).unwrap();
        }
        assert_eq!(
            library.get_user_profile(Some("wfadmin")).unwrap().role,
            Role::Admin
        );
        assert_eq!(
            library.get_user_profile(Some("wf4ever_reader")).unwrap().role,
            Role::Public
        );
        assert_eq!(
            library.get_user_profile(Some("jdoe")).unwrap().role,
            Role::Authenticated
        );
        // The session identity is the default.
        assert_eq!(library.get_user_profile(None).unwrap().login, "wfadmin");
    }

    #[test]
    fn create_user_updates_on_second_call() {
        let (_, library) = library();
        assert!(library.create_user("jdoe", "pw", "Jane Doe").unwrap());
        assert!(!library.create_user("jdoe", "pw2", "Jane D.").unwrap());
        assert_eq!(
            library.get_user_profile(Some("jdoe")).unwrap().name,
            "Jane D."
        );
    }

    #[test]
    fn user_exists_and_delete() {
        let (_, library) = library();
        assert!(!library.user_exists("jdoe").unwrap());
        library.create_user("jdoe", "pw", "Jane Doe").unwrap();
        assert!(library.user_exists("jdoe").unwrap());
        library.delete_user("jdoe").unwrap();
        assert!(!library.user_exists("jdoe").unwrap());
    }

    #[test]
    fn missing_profile_is_not_found() {
        let (_, library) = library();
        assert!(library
            .get_user_profile(Some("ghost"))
            .unwrap_err()
            .is_not_found());
    }

    // -----------------------------------------------------------------------
    // Editions at the facade level
    // -----------------------------------------------------------------------

    #[test]
    fn snapshotting_freezes_the_old_edition() {
        let (_, library) = library();
        let mut handle = created(&library);
        library.create_edition(&mut handle, "v1").unwrap();

        let mut content: &[u8] = b"new";
        library
            .create_or_update_file(&mut handle, "new.txt", &mut content, "text/plain")
            .unwrap();

        // Two editions now exist and only the new one took the write.
        assert_eq!(library.edition_list(&mut handle).unwrap().len(), 2);
        let mut paths = library.list_resource_paths(&mut handle, None).unwrap();
        paths.sort();
        assert_eq!(paths, vec!["main.txt", "new.txt"]);
    }

    #[test]
    fn historical_editions_stay_readable() {
        let (_, library) = library();
        let mut handle = created(&library);
        library.create_edition(&mut handle, "v1").unwrap();
        let mut content: &[u8] = b"changed";
        library
            .create_or_update_file(&mut handle, "main.txt", &mut content, "text/plain")
            .unwrap();

        let editions = library.edition_list(&mut handle).unwrap();
        let old = editions.iter().min_by_key(|s| s.id.0).unwrap().id;
        assert_eq!(
            library.list_resource_paths_at(old, None).unwrap(),
            vec!["main.txt"]
        );
        let mut reader = library.get_file_contents_at(old, "main.txt").unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"main");
        assert_eq!(
            library.get_file_info_at(old, "main.txt").unwrap().size,
            4
        );
    }

    #[test]
    fn mime_type_comes_from_the_stored_file() {
        let (_, library) = library();
        let mut handle = created(&library);
        let mut content: &[u8] = b"{}";
        library
            .create_or_update_file(&mut handle, "data.json", &mut content, "application/json")
            .unwrap();
        assert_eq!(
            library.get_file_mime_type(&mut handle, "data.json").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn publish_flow() {
        let (_, library) = library();
        let mut handle = created(&library);
        let edition = library.edition_list(&mut handle).unwrap()[0].id;
        library.publish_edition(edition).unwrap();
        assert!(library.edition_list(&mut handle).unwrap()[0].published);
        library.unpublish_edition(edition).unwrap();
        assert!(!library.edition_list(&mut handle).unwrap()[0].published);
    }

    #[test]
    fn publish_version_targets_the_current_edition() {
        let (_, library) = library();
        let mut handle = created(&library);
        library.create_edition(&mut handle, "v1").unwrap();

        library.publish_version(&mut handle).unwrap();
        let editions = library.edition_list(&mut handle).unwrap();
        assert!(editions.iter().max_by_key(|s| s.id.0).unwrap().published);
        assert!(!editions.iter().min_by_key(|s| s.id.0).unwrap().published);

        library.unpublish_version(&mut handle).unwrap();
        assert!(library
            .edition_list(&mut handle)
            .unwrap()
            .iter()
            .all(|s| !s.published));
    }

    // -----------------------------------------------------------------------
    // Path hygiene
    // -----------------------------------------------------------------------

    #[test]
    fn leading_slashes_are_tolerated() {
        let (_, library) = library();
        let mut handle = created(&library);
        let mut content: &[u8] = b"x";
        library
            .create_or_update_file(&mut handle, "/dir/a.txt", &mut content, "text/plain")
            .unwrap();
        assert!(library.file_exists(&mut handle, "dir/a.txt"));
        assert_eq!(
            library
                .list_resource_paths(&mut handle, Some("/dir"))
                .unwrap(),
            vec!["dir/a.txt"]
        );
    }

    #[test]
    fn folder_argument_normalization() {
        assert_eq!(folder_arg(None), None);
        assert_eq!(folder_arg(Some("")), None);
        assert_eq!(folder_arg(Some("/")), None);
        assert_eq!(folder_arg(Some("dir")), Some("dir"));
        assert_eq!(folder_arg(Some("/dir/")), Some("dir/"));
    }
}
