//! Content assembly: reading stored bytes and packaging folders as zip
//! archives.
//!
//! Opening a content stream takes a backend-side lock on the file version;
//! [`UnlockingReader`] guarantees the lock is released exactly once, whether
//! the caller reads to the end, closes early, or just drops the reader.
//!
//! Archives are produced through a bounded producer/consumer pipe: a worker
//! thread walks the folder and writes zip data into the pipe while the
//! caller reads from the other end, so an archive is never buffered whole.
//!
//! # Modules
//!
//! - [`assembler`]: folder and edition archive assembly
//! - [`unlock`]: the release-exactly-once content reader
//! - [`zip`]: minimal zip container writer (stored entries)

pub mod assembler;
pub mod unlock;
pub mod zip;

pub use assembler::{ContentAssembler, ZipStream};
pub use unlock::UnlockingReader;
pub use zip::ZipBuilder;
