//! The Quark superblock at sector 0 (spec.md §3.5, §4.7, §6.2).
//!
//! Field offsets are taken directly from the original implementation's
//! `struct quark_superblock` (offsets as commented there); two small gaps
//! between fields (after `indirect_size` and before `root_offset`) are
//! kept as reserved padding rather than closed up, so a dump of this
//! struct lines up with the reference byte-for-byte.

use core::convert::TryInto;

use crate::error::{Error, Result};
use crate::storage::Sector;

pub const SIGNATURE: u32 = 0xDEAD_BEEF;
pub const VERSION: u16 = 0x0100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    pub signature: u32,
    pub hash: u32,
    pub serial: [u8; 8],
    pub version: u16,
    pub sector_size: u16,
    pub cluster_count: u32,
    pub cluster_size: u16,
    pub indirect_size: u16,
    pub bitmap_offset: u16,
    pub bitmap_sectors: u16,
    pub root_offset: u32,
    pub label: [u8; 24],
    pub data_offset: u32,
}

impl Superblock {
    pub fn read(sector: &Sector) -> Self {
        let s = sector.as_slice();
        Self {
            signature: u32::from_le_bytes(s[0..4].try_into().unwrap()),
            hash: u32::from_le_bytes(s[4..8].try_into().unwrap()),
            serial: s[8..16].try_into().unwrap(),
            version: u16::from_le_bytes(s[16..18].try_into().unwrap()),
            sector_size: u16::from_le_bytes(s[18..20].try_into().unwrap()),
            cluster_count: u32::from_le_bytes(s[20..24].try_into().unwrap()),
            cluster_size: u16::from_le_bytes(s[24..26].try_into().unwrap()),
            indirect_size: u16::from_le_bytes(s[26..28].try_into().unwrap()),
            bitmap_offset: u16::from_le_bytes(s[30..32].try_into().unwrap()),
            bitmap_sectors: u16::from_le_bytes(s[32..34].try_into().unwrap()),
            root_offset: u32::from_le_bytes(s[36..40].try_into().unwrap()),
            label: s[40..64].try_into().unwrap(),
            data_offset: u32::from_le_bytes(s[64..68].try_into().unwrap()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.signature != SIGNATURE {
            return Err(Error::BadFilesystemType("bad quark superblock signature"));
        }
        if self.sector_size == 0 || self.cluster_size == 0 {
            return Err(Error::BadFilesystemType("zero sector/cluster size"));
        }
        if self.cluster_size % self.sector_size != 0 {
            return Err(Error::BadFilesystemType(
                "cluster_size is not a multiple of sector_size",
            ));
        }
        Ok(())
    }

    /// UTF-8 label, trimmed at the first NUL (spec.md §6.2: "null-terminated
    /// if shorter" than the 24-byte field).
    pub fn label_str(&self) -> std::borrow::Cow<'_, str> {
        let end = self.label.iter().position(|&b| b == 0).unwrap_or(24);
        String::from_utf8_lossy(&self.label[..end])
    }

    pub fn sectors_per_cluster(&self) -> u32 {
        self.cluster_size as u32 / self.sector_size as u32
    }
}
