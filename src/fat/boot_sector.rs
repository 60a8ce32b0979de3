//! The BIOS Parameter Block and FSInfo sector (spec.md §3.2, §4.2, §6.1).
//!
//! Majority of the field docs here are sourced from the FAT spec by way of
//! <https://en.wikipedia.org/wiki/Design_of_the_FAT_file_system>, same as the
//! teacher's version of this file. Offsets/sizes are bit-exact; no deviation
//! from the standard layout (spec.md §6.1).

use crate::error::{Error, Result};
use crate::storage::Sector;

use core::convert::TryInto;

const JMP_SHORT: u8 = 0xEB;
const JMP_NEAR: u8 = 0xE9;

macro_rules! field {
    ($sector:expr, $ty:tt, $offset:literal) => {
        $ty::from_le_bytes(
            $sector[$offset..($offset + core::mem::size_of::<$ty>())]
                .try_into()
                .unwrap(),
        )
    };
}

/// FAT32 Extended BIOS Parameter Block (includes the DOS 3.31 BPB, which
/// includes the DOS 2.0 BPB).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiosParameterBlock {
    // From the DOS 2.0 BPB:
    pub jump: [u8; 3],
    pub oem_name: [u8; 8],

    /// Bytes per logical sector; this spec requires 512 (spec.md §3.2).
    pub bytes_per_sector: u16,
    /// Logical sectors per cluster; allowed values are powers of two, 1..128.
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    /// Always 0 for FAT32 (no fixed-size root directory region).
    pub root_entry_count: u16,
    /// 0 for FAT32; see `total_sectors_32`.
    pub total_sectors_16: u16,
    pub media: u8,
    /// 0 for FAT32; see `fat_size_32`.
    pub fat_size_16: u16,

    pub sectors_per_track: u16,
    pub num_heads: u16,
    pub hidden_sectors: u32,
    pub total_sectors_32: u32,

    // FAT32-specific extension:
    pub fat_size_32: u32,
    pub ext_flags: u16,
    pub fs_version: u16,
    pub root_cluster: u32,
    pub fs_info_sector: u16,
    pub backup_boot_sector: u16,
    pub drive_number: u8,
    pub boot_signature: u8,
    pub volume_id: u32,
    pub volume_label: [u8; 11],
    pub file_system_type: [u8; 8],
}

impl BiosParameterBlock {
    pub fn read(sector: &Sector) -> Self {
        let sector = sector.as_slice();

        Self {
            jump: sector[0..3].try_into().unwrap(),
            oem_name: sector[3..11].try_into().unwrap(),

            bytes_per_sector: field!(sector, u16, 0x0B),
            sectors_per_cluster: sector[0x0D],
            reserved_sectors: field!(sector, u16, 0x0E),
            num_fats: sector[0x10],
            root_entry_count: field!(sector, u16, 0x11),
            total_sectors_16: field!(sector, u16, 0x13),
            media: sector[0x15],
            fat_size_16: field!(sector, u16, 0x16),

            sectors_per_track: field!(sector, u16, 0x18),
            num_heads: field!(sector, u16, 0x1A),
            hidden_sectors: field!(sector, u32, 0x1C),
            total_sectors_32: field!(sector, u32, 0x20),

            fat_size_32: field!(sector, u32, 0x24),
            ext_flags: field!(sector, u16, 0x28),
            fs_version: field!(sector, u16, 0x2A),
            root_cluster: field!(sector, u32, 0x2C),
            fs_info_sector: field!(sector, u16, 0x30),
            backup_boot_sector: field!(sector, u16, 0x32),
            drive_number: sector[0x40],
            boot_signature: sector[0x42],
            volume_id: field!(sector, u32, 0x43),
            volume_label: sector[0x47..0x52].try_into().unwrap(),
            file_system_type: sector[0x52..0x5A].try_into().unwrap(),
        }
    }

    /// All the checks in spec.md §3.2 that must pass before the rest of the
    /// descriptor is trusted. Does not check `cluster_count`, since that is
    /// only known once data geometry (§4.2 step 3) has been computed.
    pub fn validate(&self) -> Result<()> {
        let jump_ok = (self.jump[0] == JMP_SHORT && self.jump[2] == 0x90) || self.jump[0] == JMP_NEAR;
        if !jump_ok {
            return Err(Error::BadFilesystemType("bad boot-sector jump instruction"));
        }

        if self.bytes_per_sector != 512 {
            return Err(Error::BadFilesystemType("bytes_per_sector must be 512"));
        }

        if self.reserved_sectors == 0 {
            return Err(Error::BadFilesystemType("reserved_sectors is zero"));
        }

        let media_ok = self.media == 0xF0 || self.media >= 0xF8;
        if !media_ok {
            return Err(Error::BadFilesystemType("invalid media descriptor byte"));
        }

        if self.fat_size_16 != 0 || self.total_sectors_16 != 0 {
            return Err(Error::BadFilesystemType("not a FAT32 volume (FAT16/12 fields set)"));
        }

        if self.fat_size_32 == 0 || self.total_sectors_32 == 0 {
            return Err(Error::BadFilesystemType("fat_size_32/total_sectors_32 must be nonzero"));
        }

        Ok(())
    }
}

/// The advisory FSInfo sector (spec.md §4.2 step 5). Its free-cluster hints
/// must never be trusted for correctness; this crate decodes them purely to
/// log them at mount time (SPEC_FULL.md's ambient-stack section).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsInfo {
    pub lead_signature: u32,
    pub struct_signature: u32,
    pub free_count: u32,
    pub next_free: u32,
    pub trail_signature: u32,
}

impl FsInfo {
    pub const LEAD_SIGNATURE: u32 = 0x4161_5252;
    pub const STRUCT_SIGNATURE: u32 = 0x6141_7272;
    pub const TRAIL_SIGNATURE: u32 = 0xAA55_0000;

    pub fn read(sector: &Sector) -> Self {
        let sector = sector.as_slice();
        Self {
            lead_signature: field!(sector, u32, 0x000),
            struct_signature: field!(sector, u32, 0x1E4),
            free_count: field!(sector, u32, 0x1E8),
            next_free: field!(sector, u32, 0x1EC),
            trail_signature: field!(sector, u32, 0x1FC),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lead_signature == Self::LEAD_SIGNATURE
            && self.struct_signature == Self::STRUCT_SIGNATURE
            && self.trail_signature == Self::TRAIL_SIGNATURE
    }
}
