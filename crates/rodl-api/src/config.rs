//! Backend connection settings.

use std::path::Path;

use rodl_types::{DigitalLibraryError, DlResult};
use serde::{Deserialize, Serialize};

/// Connection and session settings for one backend instance.
///
/// `login` is the identity the adapter session is bound to; `admin_login`
/// and `public_reader_login` drive the role rule of `get_user_profile`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Backend directory holding the workspace group publications.
    pub workspaces_directory: u64,
    /// Backend collection new publications are assigned to.
    pub collection_id: u64,
    pub login: String,
    pub password: String,
    pub admin_login: String,
    pub public_reader_login: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 10051,
            workspaces_directory: 1,
            collection_id: 1,
            login: "wfadmin".into(),
            password: String::new(),
            admin_login: "wfadmin".into(),
            public_reader_login: "wf4ever_reader".into(),
        }
    }
}

impl ConnectionConfig {
    /// Load settings from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> DlResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| DigitalLibraryError::Backend {
            message: format!("could not read config {}", path.display()),
            source: Some(Box::new(err)),
        })?;
        toml::from_str(&text).map_err(|err| DigitalLibraryError::Backend {
            message: format!("invalid config {}", path.display()),
            source: Some(Box::new(err)),
        })
    }
}
