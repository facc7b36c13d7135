//! Folder and edition archive assembly.
//!
//! Archives are streamed: a producer thread reads file versions and writes
//! zip data into a bounded channel, the caller consumes the other end as a
//! plain [`Read`]. The channel depth bounds how far the producer can run
//! ahead of a slow consumer.

use std::io::{self, Read};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use rodl_backend::Backend;
use rodl_files::{FileMapper, FolderEntry};
use rodl_types::{DigitalLibraryError, DlResult, EditionId, ResearchObjectHandle};
use tracing::debug;

use crate::unlock::UnlockingReader;
use crate::zip::ZipBuilder;

/// How many pending chunks the producer may queue before it blocks.
const PIPE_DEPTH: usize = 8;

/// Assembles content streams and zipped archives for research objects.
#[derive(Clone)]
pub struct ContentAssembler {
    backend: Arc<dyn Backend>,
    files: FileMapper,
}

impl ContentAssembler {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let files = FileMapper::new(backend.clone());
        Self { backend, files }
    }

    /// Open the content of the file at `path` in the current edition.
    ///
    /// The returned reader holds a backend lock; it is released when the
    /// reader is closed or dropped.
    pub fn file_content(
        &self,
        handle: &mut ResearchObjectHandle,
        path: &str,
    ) -> DlResult<UnlockingReader> {
        let version = self.files.version_id(handle, path)?;
        UnlockingReader::open(self.backend.clone(), version)
    }

    /// Open the content of the file at `path` in an explicit edition,
    /// typically a sealed historical one.
    pub fn file_content_at(&self, edition: EditionId, path: &str) -> DlResult<UnlockingReader> {
        let version = self.files.version_at(edition, path)?;
        UnlockingReader::open(self.backend.clone(), version)
    }

    /// Zip everything the current edition holds under `folder` (the whole
    /// edition when `folder` is `None`).
    ///
    /// Entry names are logical paths; intentionally empty folders become
    /// directory entries. Fails up front if the folder does not exist; a
    /// backend failure mid-stream surfaces as a read error on the returned
    /// stream.
    pub fn zipped_folder(
        &self,
        handle: &mut ResearchObjectHandle,
        folder: Option<&str>,
    ) -> DlResult<ZipStream> {
        let entries = self.files.folder_entries(handle, folder)?;
        debug!(entries = entries.len(), ?folder, "assembling zip archive");
        self.spawn_producer(entries)
    }

    /// Zip the full content of the current edition.
    pub fn zipped_edition(&self, handle: &mut ResearchObjectHandle) -> DlResult<ZipStream> {
        self.zipped_folder(handle, None)
    }

    /// [`zipped_folder`](Self::zipped_folder) against an explicit edition.
    pub fn zipped_folder_at(
        &self,
        edition: EditionId,
        folder: Option<&str>,
    ) -> DlResult<ZipStream> {
        let entries = self.files.folder_entries_at(edition, folder)?;
        debug!(entries = entries.len(), %edition, ?folder, "assembling zip archive");
        self.spawn_producer(entries)
    }

    fn spawn_producer(&self, entries: Vec<FolderEntry>) -> DlResult<ZipStream> {
        let (tx, rx) = sync_channel(PIPE_DEPTH);
        let backend = self.backend.clone();
        thread::Builder::new()
            .name("rodl-zip".into())
            .spawn(move || {
                if let Err(err) = produce(backend, entries, &tx) {
                    // Forward the failure to the consumer. If the send
                    // fails the consumer is gone and nobody is listening.
                    let _ = tx.send(Err(err));
                }
            })
            .map_err(|err| DigitalLibraryError::Backend {
                message: "could not spawn archive producer".into(),
                source: Some(Box::new(err)),
            })?;
        Ok(ZipStream {
            rx,
            buffer: Vec::new(),
            pos: 0,
        })
    }
}

fn produce(
    backend: Arc<dyn Backend>,
    entries: Vec<FolderEntry>,
    tx: &SyncSender<io::Result<Vec<u8>>>,
) -> io::Result<()> {
    let writer = ChannelWriter { tx: tx.clone() };
    let mut zip = ZipBuilder::new(writer, Utc::now());
    for entry in entries {
        match entry.version {
            None => zip.add_directory(&entry.name)?,
            Some(version) => {
                let mut reader =
                    UnlockingReader::open(backend.clone(), version).map_err(io::Error::other)?;
                // Chunked copy: never holds more than one chunk of a file.
                zip.add_file_streamed(&entry.name, &mut reader)?;
            }
        }
    }
    zip.finish()?;
    Ok(())
}

/// The consumer end of the archive pipe.
#[derive(Debug)]
pub struct ZipStream {
    rx: Receiver<io::Result<Vec<u8>>>,
    buffer: Vec<u8>,
    pos: usize,
}

impl Read for ZipStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.buffer.len() {
            match self.rx.recv() {
                Ok(Ok(chunk)) => {
                    self.buffer = chunk;
                    self.pos = 0;
                }
                Ok(Err(err)) => return Err(err),
                // Producer finished and dropped its sender.
                Err(_) => return Ok(0),
            }
        }
        let n = (self.buffer.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.buffer[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Blocking writer over the pipe's sender half.
struct ChannelWriter {
    tx: SyncSender<io::Result<Vec<u8>>>,
}

impl io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .send(Ok(buf.to_vec()))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive consumer dropped"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::tests::parse_stored_zip;
    use rodl_backend::{InMemoryBackend, MetadataBackend};

    const URI: &str = "http://example.com/workspaces/w/ros/r/v1";

    fn setup() -> (
        Arc<InMemoryBackend>,
        FileMapper,
        ContentAssembler,
        ResearchObjectHandle,
    ) {
        let backend = Arc::new(InMemoryBackend::new());
        let ws = backend.create_group_publication(None, "w").unwrap();
        let ro = backend.create_group_publication(Some(ws), "r").unwrap();
        let version = backend.create_publication(ro, "v1").unwrap();
        backend.create_edition(version, "v1", &[]).unwrap();
        let mapper = FileMapper::new(backend.clone());
        let assembler = ContentAssembler::new(backend.clone());
        (backend, mapper, assembler, ResearchObjectHandle::new(URI))
    }

    fn write(mapper: &FileMapper, handle: &mut ResearchObjectHandle, path: &str, bytes: &[u8]) {
        let mut content = bytes;
        mapper
            .create_or_update_file(handle, path, &mut content, "text/plain")
            .unwrap();
    }

    fn read_archive(mut stream: ZipStream) -> Vec<(String, Vec<u8>)> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes).unwrap();
        parse_stored_zip(&bytes)
    }

    // -----------------------------------------------------------------------
    // Content streams
    // -----------------------------------------------------------------------

    #[test]
    fn file_content_streams_and_unlocks() {
        let (backend, mapper, assembler, mut handle) = setup();
        write(&mapper, &mut handle, "a.txt", b"hello");
        let mut reader = assembler.file_content(&mut handle, "a.txt").unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
        drop(reader);
        assert_eq!(backend.total_locks(), 0);
    }

    #[test]
    fn missing_file_content_is_not_found() {
        let (_, _, assembler, mut handle) = setup();
        let err = assembler.file_content(&mut handle, "nope.txt").unwrap_err();
        assert!(err.is_not_found());
    }

    // -----------------------------------------------------------------------
    // Archives
    // -----------------------------------------------------------------------

    #[test]
    fn folder_archive_holds_the_folder_files() {
        let (_, mapper, assembler, mut handle) = setup();
        write(&mapper, &mut handle, "dir/a.txt", b"hello");
        write(&mapper, &mut handle, "other.txt", b"x");
        let stream = assembler.zipped_folder(&mut handle, Some("dir")).unwrap();
        assert_eq!(
            read_archive(stream),
            vec![("dir/a.txt".to_string(), b"hello".to_vec())]
        );
    }

    #[test]
    fn edition_archive_holds_everything() {
        let (_, mapper, assembler, mut handle) = setup();
        write(&mapper, &mut handle, "a.txt", b"one");
        write(&mapper, &mut handle, "dir/b.txt", b"two");
        let stream = assembler.zipped_edition(&mut handle).unwrap();
        let mut entries = read_archive(stream);
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            entries,
            vec![
                ("a.txt".to_string(), b"one".to_vec()),
                ("dir/b.txt".to_string(), b"two".to_vec()),
            ]
        );
    }

    #[test]
    fn large_files_stream_through_the_pipe() {
        let (backend, mapper, assembler, mut handle) = setup();
        let payload = vec![42u8; 200_000];
        let mut content = payload.as_slice();
        mapper
            .create_or_update_file(&mut handle, "big.bin", &mut content, "application/octet-stream")
            .unwrap();
        let stream = assembler.zipped_edition(&mut handle).unwrap();
        assert_eq!(
            read_archive(stream),
            vec![("big.bin".to_string(), payload)]
        );
        assert_eq!(backend.total_locks(), 0);
    }

    #[test]
    fn empty_folder_archives_as_directory_entry() {
        let (_, mapper, assembler, mut handle) = setup();
        write(&mapper, &mut handle, "dir/", b"");
        let stream = assembler.zipped_folder(&mut handle, Some("dir/")).unwrap();
        assert_eq!(read_archive(stream), vec![("dir/".to_string(), Vec::new())]);
    }

    #[test]
    fn empty_edition_archives_as_empty_zip() {
        let (_, _, assembler, mut handle) = setup();
        let mut stream = assembler.zipped_edition(&mut handle).unwrap();
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes).unwrap();
        assert!(parse_stored_zip(&bytes).is_empty());
        // Still a valid archive: the end record is present.
        assert_eq!(bytes.len(), 22);
    }

    #[test]
    fn historical_edition_archives_its_own_membership() {
        let backend = Arc::new(InMemoryBackend::new());
        let ws = backend.create_group_publication(None, "w").unwrap();
        let ro = backend.create_group_publication(Some(ws), "r").unwrap();
        let publication = backend.create_publication(ro, "v1").unwrap();
        let old = backend.create_edition(publication, "v1", &[]).unwrap().id;
        let mapper = FileMapper::new(backend.clone());
        let assembler = ContentAssembler::new(backend.clone());

        let mut handle = ResearchObjectHandle::new(URI);
        write(&mapper, &mut handle, "a.txt", b"one");
        let members = backend.list_edition_versions(old).unwrap();
        backend.create_edition(publication, "v1", &members).unwrap();
        let mut fresh = ResearchObjectHandle::new(URI);
        write(&mapper, &mut fresh, "a.txt", b"two");

        let stream = assembler.zipped_folder_at(old, None).unwrap();
        assert_eq!(
            read_archive(stream),
            vec![("a.txt".to_string(), b"one".to_vec())]
        );
        let mut reader = assembler.file_content_at(old, "a.txt").unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"one");
    }

    #[test]
    fn missing_folder_fails_before_streaming() {
        let (_, mapper, assembler, mut handle) = setup();
        write(&mapper, &mut handle, "a.txt", b"x");
        let err = assembler
            .zipped_folder(&mut handle, Some("nope/"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn archiving_releases_every_lock() {
        let (backend, mapper, assembler, mut handle) = setup();
        for i in 0..5 {
            write(&mapper, &mut handle, &format!("f{i}.txt"), b"data");
        }
        let stream = assembler.zipped_edition(&mut handle).unwrap();
        let entries = read_archive(stream);
        assert_eq!(entries.len(), 5);
        assert_eq!(backend.total_locks(), 0);
    }
}
