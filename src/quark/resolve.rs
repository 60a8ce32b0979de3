//! Path resolution over a Quark volume (spec.md §4.9, mirroring §4.5).

use crate::error::{Error, Result};
use crate::storage::BlockDevice;

use super::dentry::{EntryFlags, QuarkDirEntry};
use super::dir::find_in_directory;
use super::QuarkVolume;

pub const MAX_PATH: usize = 256;
pub const MAX_NAME: usize = super::dentry::MAX_NAME;

pub fn lookup<D: BlockDevice>(
    volume: &QuarkVolume,
    device: &mut D,
    path: &str,
) -> Result<QuarkDirEntry> {
    if !path.starts_with('/') {
        return Err(Error::InvalidArgument("path must start with '/'"));
    }
    if path.len() > MAX_PATH {
        return Err(Error::InvalidArgument("path exceeds MAX_PATH"));
    }

    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    if components.is_empty() {
        return Err(Error::InvalidArgument("path resolves to the root directory"));
    }

    let mut parent = volume.root_pseudo_entry();
    let mut entry = None;

    for (i, component) in components.iter().enumerate() {
        if component.len() > MAX_NAME {
            return Err(Error::InvalidArgument("path component exceeds MAX_NAME"));
        }

        let found = find_in_directory(volume, device, parent.clone(), component)?;

        let is_last = i == components.len() - 1;
        if !is_last {
            if !found.flags().contains(EntryFlags::DIRECTORY) {
                return Err(Error::NotADirectory(component.to_string()));
            }
            parent = found.clone();
        }
        entry = Some(found);
    }

    entry.ok_or_else(|| Error::NotFound(path.to_string()))
}
