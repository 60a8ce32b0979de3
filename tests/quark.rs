//! End-to-end coverage of the Quark backend through the public facade.

use dualfs::facade::Filesystem;
use dualfs::storage::FileDevice;

const SECTOR_SIZE: usize = 512;
const DENTRY_SIZE: usize = 96;

fn write_entry(
    buf: &mut [u8],
    off: usize,
    name: &str,
    bits: u16,
    coverage0: u32,
    pointer0: u32,
    size: u32,
) {
    buf[off..off + 4].copy_from_slice(&size.to_le_bytes());
    buf[off + 8..off + 10].copy_from_slice(&bits.to_le_bytes());
    buf[off + 12..off + 16].copy_from_slice(&coverage0.to_le_bytes());
    buf[off + 16..off + 20].copy_from_slice(&pointer0.to_le_bytes());
    buf[off + 66] = name.len() as u8;
    buf[off + 67..off + 67 + name.len()].copy_from_slice(name.as_bytes());
}

const AT_DIRECTORY: u16 = 0x0400;
const AT_REGULAR: u16 = 0x0800;

/// Superblock + 1 bitmap sector + 16 data clusters of 2 sectors each.
/// Root is cluster 1 (one cluster, fits both entries); "doc.txt" is
/// clusters 3..4 (contiguous run of 2, to exercise a coverage boundary).
fn synth_image() -> Vec<u8> {
    let total_sectors = 1 + 1 + 32;
    let mut image = vec![0u8; total_sectors * SECTOR_SIZE];

    let sb = &mut image[0..SECTOR_SIZE];
    sb[0..4].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
    sb[16..18].copy_from_slice(&0x0100u16.to_le_bytes());
    sb[18..20].copy_from_slice(&(SECTOR_SIZE as u16).to_le_bytes());
    sb[20..24].copy_from_slice(&16u32.to_le_bytes());
    sb[24..26].copy_from_slice(&1024u16.to_le_bytes()); // cluster_size = 2 sectors
    sb[30..32].copy_from_slice(&1u16.to_le_bytes()); // bitmap_offset
    sb[32..34].copy_from_slice(&1u16.to_le_bytes()); // bitmap_sectors
    sb[36..40].copy_from_slice(&1u32.to_le_bytes()); // root_offset = cluster 1
    sb[64..68].copy_from_slice(&2u32.to_le_bytes()); // data_offset = sector 2

    // root directory lives in cluster 1 -> sector 2.
    let root_off = 2 * SECTOR_SIZE;
    write_entry(&mut image[root_off..], 0, "doc.txt", AT_REGULAR | 0o644, 2, 3, 1200);
    write_entry(
        &mut image[root_off..],
        DENTRY_SIZE,
        "sub",
        AT_DIRECTORY | 0o755,
        1,
        5,
        0,
    );

    // "sub" directory lives in cluster 5 -> sector 10.
    let sub_off = (2 + (5 - 1) * 2) * SECTOR_SIZE;
    write_entry(
        &mut image[sub_off..],
        0,
        "leaf.bin",
        AT_REGULAR | 0o600,
        1,
        6,
        50,
    );

    // doc.txt data spans clusters 3 and 4 -> sectors 6..10.
    let cluster3_off = (2 + (3 - 1) * 2) * SECTOR_SIZE;
    let data: Vec<u8> = (0..1200u32).map(|i| (i % 241) as u8).collect();
    image[cluster3_off..cluster3_off + 1200].copy_from_slice(&data);

    // leaf.bin data in cluster 6 -> sector 12.
    let cluster6_off = (2 + (6 - 1) * 2) * SECTOR_SIZE;
    let leaf_data: Vec<u8> = (0..50u32).map(|i| (i * 3 % 241) as u8).collect();
    image[cluster6_off..cluster6_off + 50].copy_from_slice(&leaf_data);

    image
}

fn tempfile(contents: &[u8], tag: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("dualfs-quark-it-{}-{}", std::process::id(), tag));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn root_getattr_is_synthesized() {
    let path = tempfile(&synth_image(), "root");
    let device = FileDevice::open(&path).unwrap();
    let mut fs = Filesystem::mount_quark(device).unwrap();

    let attrs = fs.getattr("/").unwrap();
    assert!(attrs.is_dir);
    assert_eq!(attrs.nlink, 2);

    std::fs::remove_file(path).ok();
}

#[test]
fn readdir_lists_files_and_subdirectory() {
    let path = tempfile(&synth_image(), "readdir");
    let device = FileDevice::open(&path).unwrap();
    let mut fs = Filesystem::mount_quark(device).unwrap();

    let mut root = fs.readdir("/").unwrap();
    root.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(root.len(), 2);
    assert_eq!(root[0].0, "doc.txt");
    assert_eq!(root[0].1.size, 1200);
    assert_eq!(root[1].0, "sub");
    assert!(root[1].1.is_dir);

    let sub = fs.readdir("/sub").unwrap();
    assert_eq!(sub.len(), 1);
    assert_eq!(sub[0].0, "leaf.bin");
    assert_eq!(sub[0].1.mode, 0o600);

    std::fs::remove_file(path).ok();
}

#[test]
fn read_spans_slot_coverage_boundary() {
    let path = tempfile(&synth_image(), "read");
    let device = FileDevice::open(&path).unwrap();
    let mut fs = Filesystem::mount_quark(device).unwrap();

    let data = fs.read("/doc.txt", 0, 1200).unwrap();
    assert_eq!(data.len(), 1200);
    let expected: Vec<u8> = (0..1200u32).map(|i| (i % 241) as u8).collect();
    assert_eq!(data, expected);

    std::fs::remove_file(path).ok();
}

#[test]
fn read_nested_file() {
    let path = tempfile(&synth_image(), "nested");
    let device = FileDevice::open(&path).unwrap();
    let mut fs = Filesystem::mount_quark(device).unwrap();

    let data = fs.read("/sub/leaf.bin", 0, 50).unwrap();
    let expected: Vec<u8> = (0..50u32).map(|i| (i * 3 % 241) as u8).collect();
    assert_eq!(data, expected);

    std::fs::remove_file(path).ok();
}

#[test]
fn mount_rejects_bad_signature() {
    let image = vec![0u8; 512 * 4];
    let path = tempfile(&image, "bad-sig");
    let device = FileDevice::open(&path).unwrap();

    assert!(Filesystem::mount_quark(device).is_err());

    std::fs::remove_file(path).ok();
}
