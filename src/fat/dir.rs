//! The FAT32 directory iterator: the state machine that walks a directory's
//! cluster chain and yields one logical entry per call, reconstructing LFN
//! runs along the way (spec.md §4.4).

use core::convert::TryInto;

use crate::error::{Error, Result};
use crate::storage::BlockDevice;
use crate::util::IterFlags;

use super::dentry::{
    Attributes, LfnAccumulator, LongDirEntry, ShortDirEntry, DENTRY_SIZE, NAME_DELETED, NAME_END,
};
use super::table::Cluster;
use super::Fat32Volume;

/// One item produced by the iterator. In non-`RAW` mode only `Entry` is
/// ever yielded; `RAW` mode also surfaces the records a normal directory
/// listing would swallow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirIterItem {
    Entry { name: String, entry: ShortDirEntry },
    RawDeleted(ShortDirEntry),
    RawVolumeId(ShortDirEntry),
    RawLongFragment(LongDirEntry),
}

/// Cursor over a directory's cluster chain (spec.md §3.8).
pub struct DirIter<'v> {
    volume: &'v Fat32Volume,
    flags: IterFlags,

    cluster: Cluster,
    buffer: Vec<u8>,
    offset: usize,

    lfn: LfnAccumulator,
    done: bool,
}

impl<'v> DirIter<'v> {
    /// `create(iter, desc, start_cluster, flags)`: reads the first cluster
    /// and positions the cursor at its start.
    pub fn new<D: BlockDevice>(
        volume: &'v Fat32Volume,
        device: &mut D,
        start_cluster: Cluster,
        flags: IterFlags,
    ) -> Result<Self> {
        let mut iter = Self {
            volume,
            flags,
            cluster: start_cluster,
            buffer: vec![0u8; volume.cluster_size_bytes() as usize],
            offset: 0,
            lfn: LfnAccumulator::new(),
            done: false,
        };
        iter.load_cluster(device, start_cluster)?;
        Ok(iter)
    }

    fn load_cluster<D: BlockDevice>(&mut self, device: &mut D, cluster: Cluster) -> Result<()> {
        self.volume.read_cluster(device, cluster, &mut self.buffer)?;
        self.cluster = cluster;
        self.offset = 0;
        Ok(())
    }

    /// `reset(iter, cluster)`: rewind to a new start cluster.
    pub fn reset<D: BlockDevice>(&mut self, device: &mut D, start_cluster: Cluster) -> Result<()> {
        self.lfn.clear();
        self.done = false;
        self.load_cluster(device, start_cluster)
    }

    /// Pulls the next logical item, or `None` at end-of-directory.
    pub fn next<D: BlockDevice>(&mut self, device: &mut D) -> Result<Option<DirIterItem>> {
        if self.done {
            return Ok(None);
        }

        loop {
            if self.offset >= self.buffer.len() {
                let next = self.volume.next_cluster(self.cluster)?;
                match next {
                    Some(c) if self.volume.is_valid_cluster(c) => self.load_cluster(device, c)?,
                    _ => {
                        self.done = true;
                        return Ok(None);
                    }
                }
            }

            let rec: [u8; DENTRY_SIZE] = self.buffer[self.offset..self.offset + DENTRY_SIZE]
                .try_into()
                .unwrap();
            self.offset += DENTRY_SIZE;

            if rec[0] == NAME_END {
                self.done = true;
                return Ok(None);
            }

            let attrs = Attributes::from_bits_truncate(rec[0x0B]);

            if rec[0] == NAME_DELETED {
                let entry = ShortDirEntry::from_bytes(&rec);
                if self.flags.contains(IterFlags::RAW) {
                    return Ok(Some(DirIterItem::RawDeleted(entry)));
                }
                continue;
            }

            if attrs.is_long_name() {
                let lfn = LongDirEntry::from_bytes(&rec);
                if self.flags.contains(IterFlags::RAW) {
                    return Ok(Some(DirIterItem::RawLongFragment(lfn)));
                }
                self.lfn.push(&lfn);
                continue;
            }

            if attrs.contains(Attributes::VOLUME_ID) {
                let entry = ShortDirEntry::from_bytes(&rec);
                if self.flags.contains(IterFlags::RAW) {
                    return Ok(Some(DirIterItem::RawVolumeId(entry)));
                }
                continue;
            }

            // Terminal SFN.
            let entry = ShortDirEntry::from_bytes(&rec);
            let name = if self.lfn.is_empty() {
                entry.format_short_name()
            } else {
                self.lfn.take()
            };

            return Ok(Some(DirIterItem::Entry { name, entry }));
        }
    }
}

/// Looks up a single component by name within one directory cluster chain,
/// without exposing the iterator to the caller. Used by path resolution
/// (spec.md §4.5): "iterate until a name matches".
pub fn find_in_directory<D: BlockDevice>(
    volume: &Fat32Volume,
    device: &mut D,
    start_cluster: Cluster,
    name: &str,
) -> Result<ShortDirEntry> {
    let mut iter = DirIter::new(volume, device, start_cluster, IterFlags::empty())?;
    while let Some(item) = iter.next(device)? {
        if let DirIterItem::Entry { name: n, entry } = item {
            if n == name {
                return Ok(entry);
            }
        }
    }
    Err(Error::NotFound(name.to_string()))
}
