//! A content reader that releases its backend lock exactly once.

use std::io::Read;
use std::sync::Arc;

use rodl_backend::Backend;
use rodl_types::{DlResult, FileVersionId};
use tracing::{debug, warn};

/// Reads the content of one file version and releases the backend-side
/// lock taken when the stream was opened.
///
/// The lock is released exactly once: on [`close`](Self::close) or on drop,
/// whichever comes first. Reading after close yields end-of-stream.
pub struct UnlockingReader {
    inner: Option<Box<dyn Read + Send>>,
    backend: Arc<dyn Backend>,
    version: FileVersionId,
    released: bool,
}

impl UnlockingReader {
    /// Open the content stream of `version`, taking the backend lock.
    pub fn open(backend: Arc<dyn Backend>, version: FileVersionId) -> DlResult<Self> {
        let inner = backend.read_version_content(version)?;
        Ok(Self {
            inner: Some(inner),
            backend,
            version,
            released: false,
        })
    }

    /// The file version being read.
    pub fn version(&self) -> FileVersionId {
        self.version
    }

    /// Release the lock now instead of waiting for drop. Idempotent.
    pub fn close(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.inner = None;
        match self.backend.release_version(self.version) {
            Ok(()) => debug!(version = %self.version, "released content lock"),
            // The content has been delivered; a failed unlock is the
            // backend's problem to expire, not the caller's error.
            Err(err) => warn!(%err, version = %self.version, "failed to release content lock"),
        }
    }
}

impl std::fmt::Debug for UnlockingReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockingReader")
            .field("version", &self.version)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl Read for UnlockingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            Some(inner) => inner.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for UnlockingReader {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodl_backend::{ContentBackend, InMemoryBackend, MetadataBackend, PublicationId};

    fn stored(backend: &Arc<InMemoryBackend>, bytes: &[u8]) -> FileVersionId {
        let ws = backend.create_group_publication(None, "w").unwrap();
        let ro = backend.create_group_publication(Some(ws), "r").unwrap();
        let publication = backend.create_publication(ro, "v1").unwrap();
        let version = backend
            .create_file_version(PublicationId(publication.0), None, "a.txt", "text/plain")
            .unwrap();
        let mut content = bytes;
        backend.write_version_content(version, &mut content).unwrap();
        version
    }

    #[test]
    fn reads_the_full_content() {
        let backend = Arc::new(InMemoryBackend::new());
        let version = stored(&backend, b"hello");
        let mut reader = UnlockingReader::open(backend.clone(), version).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn drop_releases_the_lock() {
        let backend = Arc::new(InMemoryBackend::new());
        let version = stored(&backend, b"hello");
        {
            let _reader = UnlockingReader::open(backend.clone(), version).unwrap();
            assert_eq!(backend.lock_count(version), 1);
        }
        assert_eq!(backend.lock_count(version), 0);
    }

    #[test]
    fn close_then_drop_releases_once() {
        let backend = Arc::new(InMemoryBackend::new());
        let version = stored(&backend, b"hello");
        let mut reader = UnlockingReader::open(backend.clone(), version).unwrap();
        reader.close();
        reader.close();
        assert_eq!(backend.lock_count(version), 0);
        drop(reader);
        // A double release would have errored inside the backend and the
        // count would underflow; it stays at zero.
        assert_eq!(backend.lock_count(version), 0);
    }

    #[test]
    fn reading_after_close_is_end_of_stream() {
        let backend = Arc::new(InMemoryBackend::new());
        let version = stored(&backend, b"hello");
        let mut reader = UnlockingReader::open(backend.clone(), version).unwrap();
        reader.close();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
    }
}
