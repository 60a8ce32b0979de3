//! C ABI glue for a host filesystem bridge (spec.md §6.3).
//!
//! Mirrors the shape of the teacher's hardware `bindings.rs` (an opaque
//! handle crossing the FFI boundary, thin `extern "C"` wrappers translating
//! into/out of the safe Rust API) but targets a user-space bridge instead
//! of an embedded board driver: callbacks return 0/byte-count on success
//! and negative errno on failure, the standard FUSE-style convention.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};

use crate::error::Error;
use crate::facade::{EntryKind, Filesystem};
use crate::storage::FileDevice;

/// Opaque handle returned to the host; owns the mounted volume and its
/// backing file.
pub struct DualfsHandle {
    fs: Filesystem<FileDevice>,
}

fn error_to_errno(err: &Error) -> c_int {
    match err {
        Error::NotFound(_) => -libc_enoent(),
        Error::NotADirectory(_) => -libc_enotdir(),
        Error::InvalidArgument(_) => -libc_einval(),
        Error::BadFilesystemType(_) => -libc_einval(),
        Error::InvalidCluster { .. } => -libc_eio(),
        Error::UnexpectedEof { .. } => -libc_eio(),
        Error::OutOfMemory => -libc_enomem(),
        Error::Io(_) => -libc_eio(),
    }
}

// Hand-rolled errno constants: this crate has no `libc` dependency (the
// bridge is the only thing that cares about these numbers, and pulling in
// `libc` for five constants isn't worth it), so they're spelled out here
// instead. Values match Linux/POSIX.
fn libc_enoent() -> c_int {
    2
}
fn libc_eio() -> c_int {
    5
}
fn libc_einval() -> c_int {
    22
}
fn libc_enotdir() -> c_int {
    20
}
fn libc_enomem() -> c_int {
    12
}

unsafe fn path_from_c(path: *const c_char) -> Result<String, c_int> {
    if path.is_null() {
        return Err(-libc_einval());
    }
    CStr::from_ptr(path)
        .to_str()
        .map(str::to_owned)
        .map_err(|_| -libc_einval())
}

/// Opens `path` as a FAT32 volume. Returns a handle, or null on failure.
#[no_mangle]
pub unsafe extern "C" fn dualfs_mount_fat32(path: *const c_char) -> *mut DualfsHandle {
    let path = match path_from_c(path) {
        Ok(p) => p,
        Err(_) => return std::ptr::null_mut(),
    };

    let device = match FileDevice::open(&path) {
        Ok(d) => d,
        Err(_) => return std::ptr::null_mut(),
    };

    match Filesystem::mount_fat32(device) {
        Ok(fs) => Box::into_raw(Box::new(DualfsHandle { fs })),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Opens `path` as a Quark volume. Returns a handle, or null on failure.
#[no_mangle]
pub unsafe extern "C" fn dualfs_mount_quark(path: *const c_char) -> *mut DualfsHandle {
    let path = match path_from_c(path) {
        Ok(p) => p,
        Err(_) => return std::ptr::null_mut(),
    };

    let device = match FileDevice::open(&path) {
        Ok(d) => d,
        Err(_) => return std::ptr::null_mut(),
    };

    match Filesystem::mount_quark(device) {
        Ok(fs) => Box::into_raw(Box::new(DualfsHandle { fs })),
        Err(_) => std::ptr::null_mut(),
    }
}

/// `CAttrs.kind` values: 0 = regular, 1 = directory, 2 = symlink.
const KIND_REGULAR: c_int = 0;
const KIND_DIRECTORY: c_int = 1;
const KIND_SYMLINK: c_int = 2;

fn kind_to_c(kind: EntryKind) -> c_int {
    match kind {
        EntryKind::Regular => KIND_REGULAR,
        EntryKind::Directory => KIND_DIRECTORY,
        EntryKind::Symlink => KIND_SYMLINK,
    }
}

#[repr(C)]
pub struct CAttrs {
    pub is_dir: c_int,
    pub kind: c_int,
    pub mode: u32,
    pub size: u64,
    pub atime: i64,
    pub mtime: i64,
    pub nlink: u32,
}

/// `do_getattr`: fills `out` and returns 0, or a negative errno.
#[no_mangle]
pub unsafe extern "C" fn dualfs_getattr(
    handle: *mut DualfsHandle,
    path: *const c_char,
    out: *mut CAttrs,
) -> c_int {
    if handle.is_null() || out.is_null() {
        return -libc_einval();
    }
    let path = match path_from_c(path) {
        Ok(p) => p,
        Err(e) => return e,
    };

    match (*handle).fs.getattr(&path) {
        Ok(attrs) => {
            *out = CAttrs {
                is_dir: attrs.is_dir as c_int,
                kind: kind_to_c(attrs.kind),
                mode: attrs.mode as u32,
                size: attrs.size,
                atime: attrs.atime,
                mtime: attrs.mtime,
                nlink: attrs.nlink,
            };
            0
        }
        Err(e) => error_to_errno(&e),
    }
}

/// `do_readdir`: invokes `callback(name, is_dir, userdata)` once per entry.
/// Returns 0, or a negative errno.
#[no_mangle]
pub unsafe extern "C" fn dualfs_readdir(
    handle: *mut DualfsHandle,
    path: *const c_char,
    callback: extern "C" fn(*const c_char, c_int, *mut c_void),
    userdata: *mut c_void,
) -> c_int {
    if handle.is_null() {
        return -libc_einval();
    }
    let path = match path_from_c(path) {
        Ok(p) => p,
        Err(e) => return e,
    };

    match (*handle).fs.readdir(&path) {
        Ok(entries) => {
            for (name, attrs) in entries {
                if let Ok(cname) = CString::new(name) {
                    callback(cname.as_ptr(), attrs.is_dir as c_int, userdata);
                }
            }
            0
        }
        Err(e) => error_to_errno(&e),
    }
}

/// `do_read`: reads up to `len` bytes at `offset` into `buf`. Returns the
/// number of bytes read, or a negative errno.
#[no_mangle]
pub unsafe extern "C" fn dualfs_read(
    handle: *mut DualfsHandle,
    path: *const c_char,
    offset: u64,
    buf: *mut u8,
    len: usize,
) -> isize {
    if handle.is_null() || buf.is_null() {
        return -libc_einval() as isize;
    }
    let path = match path_from_c(path) {
        Ok(p) => p,
        Err(e) => return e as isize,
    };

    match (*handle).fs.read(&path, offset, len) {
        Ok(data) => {
            let n = data.len().min(len);
            std::ptr::copy_nonoverlapping(data.as_ptr(), buf, n);
            n as isize
        }
        Err(e) => error_to_errno(&e) as isize,
    }
}

/// `do_destroy`: unmounts and frees the handle.
#[no_mangle]
pub unsafe extern "C" fn dualfs_destroy(handle: *mut DualfsHandle) {
    if handle.is_null() {
        return;
    }
    let handle = Box::from_raw(handle);
    handle.fs.destroy();
}
