//! The digital library facade.
//!
//! [`DigitalLibrary`] is the single entry point callers use: research object
//! and version lifecycle, file operations, zipped archives, descriptive
//! attributes, and user provisioning, all expressed against research object
//! handles and logical paths. The mapping work is delegated to the focused
//! crates underneath; this crate wires them to one backend connection and
//! applies the session-level rules (path cleanup, the login role rule).
//!
//! # Modules
//!
//! - [`config`]: backend connection settings
//! - [`library`]: the facade itself

pub mod config;
pub mod library;

pub use config::ConnectionConfig;
pub use library::DigitalLibrary;
