//! Quark volume mounting and cluster addressing (spec.md §4.7).

pub mod dentry;
pub mod dir;
pub mod file;
pub mod resolve;
pub mod slot;
pub mod superblock;

use crate::error::{Error, Result};
use crate::storage::{BlockDevice, Sector};
use crate::util::BitMap;

use superblock::Superblock;

/// A mounted Quark volume: the superblock plus the in-memory free-space
/// bitmap and the geometry derived from both.
#[derive(Debug)]
pub struct QuarkVolume {
    pub superblock: Superblock,
    pub bitmap: BitMap,
}

impl QuarkVolume {
    /// Reads sector 0, verifies the signature, and loads the free-space
    /// bitmap into memory (spec.md §4.7).
    pub fn mount<D: BlockDevice>(device: &mut D) -> Result<Self> {
        let mut sector = Sector::default();
        device.read_sector(0, &mut sector)?;

        let superblock = Superblock::read(&sector);
        superblock.validate()?;

        let bitmap_bytes = read_bitmap(device, &superblock)?;
        let bit_count = superblock.cluster_count as usize;
        let bitmap = BitMap::from_bytes(bitmap_bytes, bit_count);

        log::debug!(
            "mounted quark volume: {} clusters, {} free",
            superblock.cluster_count,
            bitmap.empty_bits()
        );

        Ok(Self { superblock, bitmap })
    }

    pub fn unmount(self) {}

    pub fn cluster_size_bytes(&self) -> u32 {
        self.superblock.cluster_size as u32
    }

    pub fn root_cluster(&self) -> u32 {
        self.superblock.root_offset
    }

    /// A synthetic dentry for the root directory, which (unlike every
    /// other directory) has no parent dentry pointing at it — the
    /// superblock names its first cluster directly. We model it as a
    /// single direct slot covering the rest of the volume as one
    /// contiguous run starting at `root_offset`, so the slot walker and
    /// iterator need no special-casing to traverse it.
    pub fn root_pseudo_entry(&self) -> dentry::QuarkDirEntry {
        let mut slots = [slot::Slot { coverage: 0, pointer: 0 }; dentry::MAX_SLOTS];
        slots[0] = slot::Slot {
            coverage: self.superblock.cluster_count,
            pointer: self.superblock.root_offset,
        };

        dentry::QuarkDirEntry {
            size: 0,
            write_time: 0,
            bits: 0o755 | dentry::EntryFlags::DIRECTORY.bits(),
            owner: 0,
            slots,
            name_hash: 0,
            name_length: 0,
            name: [0u8; dentry::MAX_NAME],
        }
    }

    pub fn is_valid_cluster(&self, cluster: u32) -> bool {
        cluster >= 1 && cluster <= self.superblock.cluster_count
    }

    /// Absolute sector of 1-indexed data `cluster` (spec.md §3.5, §6.2).
    pub fn first_sector_of_cluster(&self, cluster: u32) -> u64 {
        let sectors_per_cluster = self.superblock.sectors_per_cluster() as u64;
        self.superblock.data_offset as u64 + (cluster as u64 - 1) * sectors_per_cluster
    }

    pub fn read_cluster<D: BlockDevice>(
        &self,
        device: &mut D,
        cluster: u32,
        out: &mut [u8],
    ) -> Result<()> {
        if !self.is_valid_cluster(cluster) {
            return Err(Error::InvalidCluster {
                cluster,
                reason: "outside the volume's data region",
            });
        }

        let start = self.first_sector_of_cluster(cluster);
        let sector_size = self.superblock.sector_size as usize;
        let sectors_per_cluster = self.superblock.sectors_per_cluster() as u64;

        let mut sector = Sector::default();
        for i in 0..sectors_per_cluster {
            device.read_sector(start + i, &mut sector)?;
            let off = (i as usize) * sector_size;
            out[off..off + sector_size].copy_from_slice(&sector.as_slice()[..sector_size]);
        }

        Ok(())
    }
}

fn read_bitmap<D: BlockDevice>(device: &mut D, sb: &Superblock) -> Result<Vec<u8>> {
    let sector_size = sb.sector_size as usize;
    let mut out = vec![0u8; sb.bitmap_sectors as usize * sector_size];
    let mut sector = Sector::default();
    for i in 0..sb.bitmap_sectors as u64 {
        device.read_sector(sb.bitmap_offset as u64 + i, &mut sector)?;
        let off = (i as usize) * sector_size;
        out[off..off + sector_size].copy_from_slice(&sector.as_slice()[..sector_size]);
    }
    Ok(out)
}
