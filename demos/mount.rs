//! Mounts a disk image as either FAT32 or Quark and walks it depth-first,
//! printing every entry it finds. Backend is auto-detected by peeking at
//! sector 0's signature bytes.
//!
//! ```text
//! cargo run --example mount -- /path/to/image.img
//! ```

use core::convert::TryInto;
use std::env;
use std::process::ExitCode;

use dualfs::facade::Filesystem;
use dualfs::storage::{BlockDevice, FileDevice, Sector};

fn looks_like_quark(device: &mut FileDevice) -> bool {
    let mut sector = Sector::default();
    if device.read_sector(0, &mut sector).is_err() {
        return false;
    }
    u32::from_le_bytes(sector.as_slice()[0..4].try_into().unwrap()) == 0xDEAD_BEEF
}

fn walk(fs: &mut Filesystem<FileDevice>, path: &str, depth: usize) {
    let entries = match fs.readdir(path) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{:indent$}<error reading {}: {}>", "", path, e, indent = depth * 2);
            return;
        }
    };

    for (name, attrs) in entries {
        println!(
            "{:indent$}{}{} ({} bytes)",
            "",
            name,
            if attrs.is_dir { "/" } else { "" },
            attrs.size,
            indent = depth * 2
        );

        if attrs.is_dir {
            let child = if path == "/" {
                format!("/{}", name)
            } else {
                format!("{}/{}", path, name)
            };
            walk(fs, &child, depth + 1);
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let path = match env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("usage: mount <disk-image>");
            return ExitCode::FAILURE;
        }
    };

    let mut probe = match FileDevice::open(&path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("failed to open {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };
    let is_quark = looks_like_quark(&mut probe);
    drop(probe);

    let device = match FileDevice::open(&path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("failed to open {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let fs = if is_quark {
        println!("detected quark volume");
        Filesystem::mount_quark(device)
    } else {
        println!("detected fat32 volume");
        Filesystem::mount_fat32(device)
    };

    let mut fs = match fs {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("mount failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    walk(&mut fs, "/", 0);
    fs.destroy();

    ExitCode::SUCCESS
}
