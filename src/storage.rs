//! The Block Device component (spec.md §3.1 / §4.1).
//!
//! Modeled after the `Storage` trait the teacher crate pulls in from
//! `storage-traits` (`read_sector`/`write_sector` over a
//! `GenericArray<u8, SectorSize>`), but defined locally: this spec fixes the
//! sector size at 512 bytes (spec.md §3.1) so there is no need for the
//! teacher's type-level `SECTOR_SIZE: ArrayLength<u8>` generic, and the only
//! backend in scope is a plain file, so there's no reason to pull in a git
//! dependency for the trait itself.

use generic_array::GenericArray;
use typenum::consts::U512;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{IoError, Result};

pub const SECTOR_SIZE: usize = 512;

/// One sector's worth of bytes.
pub type Sector = GenericArray<u8, U512>;

/// Sector-addressed byte I/O over a backing medium.
///
/// Implementors provide access to a whole device (this spec never deals in
/// partitions); `sector_count` bounds valid reads and writes.
pub trait BlockDevice {
    fn read_sector(&mut self, sector: u64, buf: &mut Sector) -> Result<()>;
    fn write_sector(&mut self, sector: u64, buf: &Sector) -> Result<()>;

    /// Number of sectors in the device, or `None` if unknown (a device
    /// opened without being able to `stat` its size, e.g. a raw character
    /// device).
    fn sector_count(&self) -> Option<u64>;

    /// The device's current-sector hint (spec.md §4.1). Not
    /// correctness-critical; higher layers may use it for caching
    /// decisions, but every read must re-seek explicitly regardless.
    fn current_sector_hint(&self) -> Option<u64>;
}

/// A device backed by a regular file, opened read+write like the original's
/// `device_open` (`fopen(path, "r+b")`).
#[derive(Debug)]
pub struct FileDevice {
    file: File,
    sector_count: Option<u64>,
    current_sector: Option<u64>,
}

impl FileDevice {
    /// Opens `path` for reading and writing. Fails if the path cannot be
    /// opened (mirrors the original's `device_open`, which only fails by
    /// returning a null pointer on a failed `fopen`).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(IoError::Os)?;

        let sector_count = file.metadata().ok().map(|m| m.len() / SECTOR_SIZE as u64);

        Ok(Self {
            file,
            sector_count,
            current_sector: None,
        })
    }

    fn seek_to_sector(&mut self, sector: u64) -> Result<()> {
        if let Some(count) = self.sector_count {
            if sector >= count {
                return Err(IoError::OutOfRange {
                    sector,
                    sector_count: count,
                }
                .into());
            }
        }

        self.file
            .seek(SeekFrom::Start(sector * SECTOR_SIZE as u64))
            .map_err(IoError::Os)?;

        Ok(())
    }
}

impl BlockDevice for FileDevice {
    fn read_sector(&mut self, sector: u64, buf: &mut Sector) -> Result<()> {
        self.seek_to_sector(sector)?;

        self.file.read_exact(buf.as_mut_slice()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                IoError::ShortTransfer {
                    sector,
                    expected: SECTOR_SIZE,
                    actual: 0,
                }
            } else {
                IoError::Os(e)
            }
        })?;

        self.current_sector = Some(sector);
        log::trace!("read sector {}", sector);

        Ok(())
    }

    fn write_sector(&mut self, sector: u64, buf: &Sector) -> Result<()> {
        self.seek_to_sector(sector)?;
        self.file.write_all(buf.as_slice()).map_err(IoError::Os)?;
        self.current_sector = Some(sector);
        log::trace!("wrote sector {}", sector);
        Ok(())
    }

    fn sector_count(&self) -> Option<u64> {
        self.sector_count
    }

    fn current_sector_hint(&self) -> Option<u64> {
        self.current_sector
    }
}

/// Releases the underlying handle. `FileDevice`'s `Drop` impl (via `File`)
/// already does this; this free function exists to mirror the explicit
/// `close(device)` operation spec.md §4.1 names.
pub fn close(device: FileDevice) {
    drop(device);
}
