//! The Filesystem Facade: a single backend-agnostic surface over a mounted
//! FAT32 or Quark volume (spec.md §4.10).

use crate::error::{Error, Result};
use crate::storage::BlockDevice;

use crate::fat::dentry::Attributes as FatAttributes;
use crate::fat::dir::{DirIter, DirIterItem};
use crate::fat::{file as fat_file, resolve as fat_resolve, Fat32Volume};

use crate::quark::dentry::{EntryFlags as QuarkFlags, QuarkDirEntry};
use crate::quark::dir::{QuarkDirIter, QuarkDirIterItem};
use crate::quark::{file as quark_file, resolve as quark_resolve, QuarkVolume};

use crate::util::IterFlags;

/// The entry's file type, independent of its permission bits. FAT32 has no
/// notion of symlinks; Quark's `AT_SYMLINK` surfaces as `Symlink` here even
/// though nothing in this crate resolves the link target yet (see
/// DESIGN.md's Open Question on Quark symlinks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
}

/// `getattr`'s result: enough to answer `stat(2)`-shaped questions without
/// committing to a host-specific struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attrs {
    pub is_dir: bool,
    pub kind: EntryKind,
    /// POSIX permission bits, composed with the file-type bits a host's
    /// `st_mode` would carry (`S_IFDIR`/`S_IFREG` are left to the bridge,
    /// since this crate has no notion of them).
    pub mode: u16,
    pub size: u64,
    /// Seconds since the Unix epoch; `0` where the backend has no
    /// meaningful value (e.g. Quark's directories, which carry no
    /// separate access time).
    pub atime: i64,
    pub mtime: i64,
    pub nlink: u32,
}

impl Attrs {
    fn root() -> Self {
        Self {
            is_dir: true,
            kind: EntryKind::Directory,
            mode: 0o755,
            size: 0,
            atime: 0,
            mtime: 0,
            nlink: 2,
        }
    }
}

/// A mounted volume, backend-erased behind one facade.
pub enum Filesystem<D: BlockDevice> {
    Fat32 { volume: Fat32Volume, device: D },
    Quark { volume: QuarkVolume, device: D },
}

impl<D: BlockDevice> Filesystem<D> {
    pub fn mount_fat32(mut device: D) -> Result<Self> {
        let volume = Fat32Volume::mount(&mut device)?;
        Ok(Self::Fat32 { volume, device })
    }

    pub fn mount_quark(mut device: D) -> Result<Self> {
        let volume = QuarkVolume::mount(&mut device)?;
        Ok(Self::Quark { volume, device })
    }

    /// `getattr(path) → Attributes`. `"/"` is special-cased as a directory
    /// with mode 0755 and two links, for both backends.
    pub fn getattr(&mut self, path: &str) -> Result<Attrs> {
        if path == "/" {
            return Ok(Attrs::root());
        }

        match self {
            Self::Fat32 { volume, device } => {
                let entry = fat_resolve::lookup(volume, device, path)?;
                Ok(fat_attrs(&entry))
            }
            Self::Quark { volume, device } => {
                let entry = quark_resolve::lookup(volume, device, path)?;
                Ok(quark_attrs(&entry))
            }
        }
    }

    /// `readdir(path) → stream of (name, Attributes)`.
    pub fn readdir(&mut self, path: &str) -> Result<Vec<(String, Attrs)>> {
        match self {
            Self::Fat32 { volume, device } => {
                let cluster = if path == "/" {
                    volume.root_cluster()
                } else {
                    let entry = fat_resolve::lookup(volume, device, path)?;
                    if !entry.attributes.contains(FatAttributes::DIRECTORY) {
                        return Err(Error::NotADirectory(path.to_string()));
                    }
                    entry.first_cluster
                };

                let mut iter = DirIter::new(volume, device, cluster, IterFlags::empty())?;
                let mut out = Vec::new();
                while let Some(item) = iter.next(device)? {
                    if let DirIterItem::Entry { name, entry } = item {
                        out.push((name, fat_attrs(&entry)));
                    }
                }
                Ok(out)
            }
            Self::Quark { volume, device } => {
                let parent = if path == "/" {
                    volume.root_pseudo_entry()
                } else {
                    let entry = quark_resolve::lookup(volume, device, path)?;
                    if !entry.flags().contains(QuarkFlags::DIRECTORY) {
                        return Err(Error::NotADirectory(path.to_string()));
                    }
                    entry
                };

                let mut iter = QuarkDirIter::new(volume, device, parent, IterFlags::empty())?;
                let mut out = Vec::new();
                while let Some(item) = iter.next(device)? {
                    if let QuarkDirIterItem::Entry { name, entry } = item {
                        out.push((name, quark_attrs(&entry)));
                    }
                }
                Ok(out)
            }
        }
    }

    /// `read(path, offset, size) → bytes`.
    pub fn read(&mut self, path: &str, offset: u64, size: usize) -> Result<Vec<u8>> {
        match self {
            Self::Fat32 { volume, device } => {
                let entry = fat_resolve::lookup(volume, device, path)?;
                if entry.attributes.contains(FatAttributes::DIRECTORY) {
                    return Err(Error::NotADirectory(path.to_string()));
                }
                let mut buf = vec![0u8; size];
                let n = fat_file::read(volume, device, &entry, offset, size, &mut buf)?;
                buf.truncate(n);
                Ok(buf)
            }
            Self::Quark { volume, device } => {
                let entry = quark_resolve::lookup(volume, device, path)?;
                if entry.flags().contains(QuarkFlags::DIRECTORY) {
                    return Err(Error::NotADirectory(path.to_string()));
                }
                let mut buf = vec![0u8; size];
                let n = quark_file::read(volume, device, &entry, offset, size, &mut buf)?;
                buf.truncate(n);
                Ok(buf)
            }
        }
    }

    /// `destroy()` — unmount.
    pub fn destroy(self) {
        match self {
            Self::Fat32 { volume, device } => {
                volume.unmount();
                drop(device);
            }
            Self::Quark { volume, device } => {
                volume.unmount();
                drop(device);
            }
        }
    }
}

fn fat_attrs(entry: &crate::fat::dentry::ShortDirEntry) -> Attrs {
    let is_dir = entry.attributes.contains(FatAttributes::DIRECTORY);
    Attrs {
        is_dir,
        kind: if is_dir { EntryKind::Directory } else { EntryKind::Regular },
        mode: if is_dir { 0o755 } else { 0o644 },
        size: entry.size as u64,
        atime: fat_date_to_epoch_seconds(entry.last_access_date, 0),
        mtime: fat_date_to_epoch_seconds(entry.write_date, entry.write_time),
        nlink: if is_dir { 2 } else { 1 },
    }
}

fn quark_attrs(entry: &QuarkDirEntry) -> Attrs {
    let flags = entry.flags();
    let is_dir = flags.contains(QuarkFlags::DIRECTORY);
    let kind = if is_dir {
        EntryKind::Directory
    } else if flags.contains(QuarkFlags::SYMLINK) {
        EntryKind::Symlink
    } else {
        EntryKind::Regular
    };
    Attrs {
        is_dir,
        kind,
        mode: entry.permissions(),
        size: entry.size as u64,
        atime: 0,
        mtime: entry.write_time as i64,
        nlink: if is_dir { 2 } else { 1 },
    }
}

/// Decodes a FAT date/time pair into seconds-since-Unix-epoch, per the bit
/// layout spec.md §4.10 specifies:
/// `year = ((date & 0xFE00) >> 9) + 1980`, `month = (date & 0x01E0) >> 5`,
/// `day = date & 0x001F`; `hour = time >> 11`, `minute = (time >> 5) &
/// 0x3F`, `second = (time & 0x1F) * 2`.
fn fat_date_to_epoch_seconds(date: u16, time: u16) -> i64 {
    if date == 0 {
        return 0;
    }

    let year = (((date & 0xFE00) >> 9) + 1980) as i64;
    let month = ((date & 0x01E0) >> 5) as u32;
    let day = (date & 0x001F) as u32;

    let hour = (time >> 11) as i64;
    let minute = ((time >> 5) & 0x3F) as i64;
    let second = ((time & 0x1F) * 2) as i64;

    let days = days_from_civil(year, month, day);
    days * 86_400 + hour * 3600 + minute * 60 + second
}

/// Howard Hinnant's days-from-civil algorithm, days since 1970-01-01.
fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as i64;
    let mp = ((m as i64 + 9) % 12) as i64;
    let doy = (153 * mp + 2) / 5 + d as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}
