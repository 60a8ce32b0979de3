//! Quark file reads (spec.md §4.9). Unlike FAT32's chain walk, cluster
//! addressing goes through the slot walker; this path is built fresh here
//! since the original implementation's equivalent (`quark_read`) ships
//! with its body commented out and stubbed to return immediately.

use crate::error::Result;
use crate::storage::BlockDevice;

use super::dentry::QuarkDirEntry;
use super::slot::logical_to_physical;
use super::QuarkVolume;

pub fn read<D: BlockDevice>(
    volume: &QuarkVolume,
    device: &mut D,
    entry: &QuarkDirEntry,
    offset: u64,
    size: usize,
    buffer: &mut [u8],
) -> Result<usize> {
    let file_size = entry.size as u64;
    if offset >= file_size {
        return Ok(0);
    }

    let mut pending = size.min((file_size - offset) as usize).min(buffer.len());
    if pending == 0 {
        return Ok(0);
    }

    let cluster_size = volume.cluster_size_bytes() as u64;
    let mut logical = (offset / cluster_size) as u32;
    let mut intra_offset = (offset % cluster_size) as usize;

    let mut page = vec![0u8; cluster_size as usize];
    let mut written = 0usize;

    while pending > 0 {
        let physical = logical_to_physical(volume, device, entry, logical)?;
        volume.read_cluster(device, physical, &mut page)?;

        let chunk = pending.min(page.len() - intra_offset);
        buffer[written..written + chunk]
            .copy_from_slice(&page[intra_offset..intra_offset + chunk]);

        written += chunk;
        pending -= chunk;
        intra_offset = 0;
        logical += 1;
    }

    Ok(written)
}
