//! Minimal zip container writer.
//!
//! Entries are stored uncompressed with CRC-32 checksums, which keeps the
//! writer a single pass: local header, data, and at the end one central
//! directory plus the end-of-central-directory record. Streamed entries
//! carry a trailing data descriptor (general-purpose flag bit 3) so the
//! CRC and size land after the data without buffering it. No zip64, so
//! entry sizes and the archive itself are limited to 32 bits.

use std::io::{self, Read, Write};

use chrono::{DateTime, Datelike, Timelike, Utc};

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_SIG: u32 = 0x0605_4b50;
const DATA_DESCRIPTOR_SIG: u32 = 0x0807_4b50;
const VERSION_NEEDED: u16 = 20;
const METHOD_STORED: u16 = 0;
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
const DOS_ATTR_DIRECTORY: u32 = 0x10;

/// Copy granularity for streamed entries, and the most entry data held in
/// memory at a time.
const COPY_CHUNK: usize = 64 * 1024;

struct CentralRecord {
    name: String,
    crc: u32,
    size: u32,
    offset: u32,
    flags: u16,
    directory: bool,
}

/// Single-pass zip writer over any [`Write`] sink.
pub struct ZipBuilder<W: Write> {
    out: W,
    offset: u64,
    timestamp: (u16, u16),
    central: Vec<CentralRecord>,
}

impl<W: Write> ZipBuilder<W> {
    /// Start an archive. All entries are stamped with `modified`.
    pub fn new(out: W, modified: DateTime<Utc>) -> Self {
        Self {
            out,
            offset: 0,
            timestamp: dos_datetime(modified),
            central: Vec::new(),
        }
    }

    /// Append a stored file entry.
    pub fn add_file(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        let crc = crc32fast::hash(data);
        self.add_entry(name, data, crc, false)
    }

    /// Append a stored file entry by copying `reader` through in fixed-size
    /// chunks.
    ///
    /// The CRC and size are not known until the copy ends, so the entry is
    /// written with flag bit 3 and a trailing data descriptor. Memory use is
    /// bounded by one copy chunk no matter how large the entry is.
    pub fn add_file_streamed(&mut self, name: &str, reader: &mut dyn Read) -> io::Result<()> {
        let offset = fit_u32(self.offset, "archive too large for zip")?;
        let (date, time) = self.timestamp;

        let mut header = Vec::with_capacity(30 + name.len());
        header.extend_from_slice(&LOCAL_HEADER_SIG.to_le_bytes());
        header.extend_from_slice(&VERSION_NEEDED.to_le_bytes());
        header.extend_from_slice(&FLAG_DATA_DESCRIPTOR.to_le_bytes());
        header.extend_from_slice(&METHOD_STORED.to_le_bytes());
        header.extend_from_slice(&time.to_le_bytes());
        header.extend_from_slice(&date.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes()); // crc, in the descriptor
        header.extend_from_slice(&0u32.to_le_bytes()); // compressed size
        header.extend_from_slice(&0u32.to_le_bytes()); // uncompressed size
        header.extend_from_slice(&(name.len() as u16).to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes()); // extra length
        header.extend_from_slice(name.as_bytes());
        self.out.write_all(&header)?;

        let mut hasher = crc32fast::Hasher::new();
        let mut copied = 0u64;
        let mut buf = [0u8; COPY_CHUNK];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            hasher.update(&buf[..n]);
            self.out.write_all(&buf[..n])?;
            copied += n as u64;
        }
        let size = fit_u32(copied, "entry too large for zip")?;
        let crc = hasher.finalize();

        let mut descriptor = Vec::with_capacity(16);
        descriptor.extend_from_slice(&DATA_DESCRIPTOR_SIG.to_le_bytes());
        descriptor.extend_from_slice(&crc.to_le_bytes());
        descriptor.extend_from_slice(&size.to_le_bytes()); // compressed
        descriptor.extend_from_slice(&size.to_le_bytes()); // uncompressed
        self.out.write_all(&descriptor)?;

        self.offset += header.len() as u64 + copied + descriptor.len() as u64;
        self.central.push(CentralRecord {
            name: name.to_string(),
            crc,
            size,
            offset,
            flags: FLAG_DATA_DESCRIPTOR,
            directory: false,
        });
        Ok(())
    }

    /// Append a directory entry. The name gains a trailing slash if missing.
    pub fn add_directory(&mut self, name: &str) -> io::Result<()> {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{name}/")
        };
        self.add_entry(&name, &[], 0, true)
    }

    fn add_entry(&mut self, name: &str, data: &[u8], crc: u32, directory: bool) -> io::Result<()> {
        let size = fit_u32(data.len() as u64, "entry too large for zip")?;
        let offset = fit_u32(self.offset, "archive too large for zip")?;
        let (date, time) = self.timestamp;

        let mut header = Vec::with_capacity(30 + name.len());
        header.extend_from_slice(&LOCAL_HEADER_SIG.to_le_bytes());
        header.extend_from_slice(&VERSION_NEEDED.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes()); // flags
        header.extend_from_slice(&METHOD_STORED.to_le_bytes());
        header.extend_from_slice(&time.to_le_bytes());
        header.extend_from_slice(&date.to_le_bytes());
        header.extend_from_slice(&crc.to_le_bytes());
        header.extend_from_slice(&size.to_le_bytes()); // compressed
        header.extend_from_slice(&size.to_le_bytes()); // uncompressed
        header.extend_from_slice(&(name.len() as u16).to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes()); // extra length
        header.extend_from_slice(name.as_bytes());

        self.out.write_all(&header)?;
        self.out.write_all(data)?;
        self.offset += header.len() as u64 + data.len() as u64;

        self.central.push(CentralRecord {
            name: name.to_string(),
            crc,
            size,
            offset,
            flags: 0,
            directory,
        });
        Ok(())
    }

    /// Write the central directory and finish the archive, returning the
    /// sink.
    pub fn finish(mut self) -> io::Result<W> {
        let central_offset = fit_u32(self.offset, "archive too large for zip")?;
        let (date, time) = self.timestamp;
        let mut central_size = 0u64;

        for record in &self.central {
            let external = if record.directory {
                DOS_ATTR_DIRECTORY
            } else {
                0
            };
            let mut header = Vec::with_capacity(46 + record.name.len());
            header.extend_from_slice(&CENTRAL_HEADER_SIG.to_le_bytes());
            header.extend_from_slice(&VERSION_NEEDED.to_le_bytes()); // made by
            header.extend_from_slice(&VERSION_NEEDED.to_le_bytes()); // needed
            header.extend_from_slice(&record.flags.to_le_bytes());
            header.extend_from_slice(&METHOD_STORED.to_le_bytes());
            header.extend_from_slice(&time.to_le_bytes());
            header.extend_from_slice(&date.to_le_bytes());
            header.extend_from_slice(&record.crc.to_le_bytes());
            header.extend_from_slice(&record.size.to_le_bytes());
            header.extend_from_slice(&record.size.to_le_bytes());
            header.extend_from_slice(&(record.name.len() as u16).to_le_bytes());
            header.extend_from_slice(&0u16.to_le_bytes()); // extra length
            header.extend_from_slice(&0u16.to_le_bytes()); // comment length
            header.extend_from_slice(&0u16.to_le_bytes()); // disk number
            header.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
            header.extend_from_slice(&external.to_le_bytes());
            header.extend_from_slice(&record.offset.to_le_bytes());
            header.extend_from_slice(record.name.as_bytes());
            self.out.write_all(&header)?;
            central_size += header.len() as u64;
        }

        let count = self.central.len().min(u16::MAX as usize) as u16;
        let mut end = Vec::with_capacity(22);
        end.extend_from_slice(&END_OF_CENTRAL_SIG.to_le_bytes());
        end.extend_from_slice(&0u16.to_le_bytes()); // this disk
        end.extend_from_slice(&0u16.to_le_bytes()); // central dir disk
        end.extend_from_slice(&count.to_le_bytes());
        end.extend_from_slice(&count.to_le_bytes());
        end.extend_from_slice(&fit_u32(central_size, "central directory too large")?.to_le_bytes());
        end.extend_from_slice(&central_offset.to_le_bytes());
        end.extend_from_slice(&0u16.to_le_bytes()); // comment length
        self.out.write_all(&end)?;
        self.out.flush()?;
        Ok(self.out)
    }
}

fn fit_u32(value: u64, what: &str) -> io::Result<u32> {
    u32::try_from(value).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, what.to_string()))
}

/// MS-DOS date and time fields, clamped to the representable range.
fn dos_datetime(t: DateTime<Utc>) -> (u16, u16) {
    let year = t.year().clamp(1980, 2107) as u16;
    let date = ((year - 1980) << 9) | ((t.month() as u16) << 5) | t.day() as u16;
    let time = ((t.hour() as u16) << 11) | ((t.minute() as u16) << 5) | (t.second() as u16 / 2);
    (date, time)
}
