//! Path virtualization: representing empty folders in a backend that only
//! stores file versions.
//!
//! The backend has no notion of a directory; a folder exists only as a path
//! prefix shared by file versions, which makes an intentionally empty folder
//! unrepresentable. RODL encodes such a folder as a sentinel leaf entry
//! inside it, so the backend's flat version list still contains one
//! addressable object for the folder.
//!
//! A logical path ending in `/` denotes an intentionally empty folder. The
//! two mapping functions below are pure, total, and inverse to each other:
//!
//! - `dir/sub/` ↔ `dir/sub/.ro_empty_folder`
//! - any other path maps to itself
//!
//! Listings convert sentinel paths back to logical folder paths and exclude
//! them from the "real content" view, while existence checks see them first.

/// Reserved file name marking an intentionally empty folder.
pub const EMPTY_FOLDER_SENTINEL: &str = ".ro_empty_folder";

/// Mime type stored on sentinel entries.
pub const EMPTY_FOLDER_MIME: &str = "text/plain";

/// Map a logical path to the backend path that stores it.
///
/// A trailing slash selects the empty-folder encoding; everything else is
/// passed through unchanged.
pub fn to_backend_path(logical: &str) -> String {
    if logical.ends_with('/') {
        format!("{logical}{EMPTY_FOLDER_SENTINEL}")
    } else {
        logical.to_string()
    }
}

/// Map a backend path to the logical path it represents.
///
/// Inverse of [`to_backend_path`]: a sentinel leaf turns back into its
/// folder path (with trailing slash), anything else is unchanged.
pub fn to_logical_path(backend: &str) -> String {
    match backend.strip_suffix(EMPTY_FOLDER_SENTINEL) {
        Some(prefix) if prefix.is_empty() || prefix.ends_with('/') => prefix.to_string(),
        _ => backend.to_string(),
    }
}

/// Returns `true` if `backend` is an empty-folder sentinel path.
pub fn is_sentinel_path(backend: &str) -> bool {
    match backend.strip_suffix(EMPTY_FOLDER_SENTINEL) {
        Some(prefix) => prefix.is_empty() || prefix.ends_with('/'),
        None => false,
    }
}

/// Returns `true` if `logical` denotes an intentionally empty folder.
pub fn is_folder_path(logical: &str) -> bool {
    logical.ends_with('/')
}

/// Normalize a folder prefix: ensure a single trailing slash.
///
/// Folder arguments arrive both with and without the trailing slash; the
/// mapper always compares against the slashed form.
pub fn normalize_folder(folder: &str) -> String {
    if folder.ends_with('/') {
        folder.to_string()
    } else {
        format!("{folder}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_maps_to_sentinel() {
        assert_eq!(to_backend_path("dir/"), "dir/.ro_empty_folder");
        assert_eq!(to_backend_path("dir/sub/"), "dir/sub/.ro_empty_folder");
    }

    #[test]
    fn file_maps_to_itself() {
        assert_eq!(to_backend_path("dir/a.txt"), "dir/a.txt");
        assert_eq!(to_backend_path("a.txt"), "a.txt");
    }

    #[test]
    fn sentinel_maps_back_to_folder() {
        assert_eq!(to_logical_path("dir/.ro_empty_folder"), "dir/");
        assert_eq!(to_logical_path("dir/sub/.ro_empty_folder"), "dir/sub/");
    }

    #[test]
    fn round_trips_are_identity() {
        for logical in ["dir/", "dir/sub/", "dir/a.txt", "a.txt"] {
            assert_eq!(to_logical_path(&to_backend_path(logical)), logical);
        }
        for backend in ["dir/.ro_empty_folder", "dir/a.txt", "a.txt"] {
            assert_eq!(to_backend_path(&to_logical_path(backend)), backend);
        }
    }

    #[test]
    fn sentinel_name_must_be_a_leaf() {
        // A file that merely contains the sentinel substring is not one.
        assert!(!is_sentinel_path("dir/x.ro_empty_folder"));
        assert!(is_sentinel_path("dir/.ro_empty_folder"));
        assert!(is_sentinel_path(".ro_empty_folder"));
        assert_eq!(to_logical_path("dir/x.ro_empty_folder"), "dir/x.ro_empty_folder");
    }

    #[test]
    fn normalize_folder_adds_one_slash() {
        assert_eq!(normalize_folder("dir"), "dir/");
        assert_eq!(normalize_folder("dir/"), "dir/");
    }

    #[test]
    fn folder_path_detection() {
        assert!(is_folder_path("dir/"));
        assert!(!is_folder_path("dir/a.txt"));
    }
}
