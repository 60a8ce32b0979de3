
//! Read-only user-space core for FAT32 and the experimental Quark on-disk
//! layout.
//!
//! Mounts a sector-addressed block device as either filesystem and exposes
//! a single backend-agnostic [`facade::Filesystem`] surface
//! (`getattr`/`readdir`/`read`/`destroy`) for a host bridge to drive.

#[cfg(feature = "bindings")]
pub mod bindings;

pub mod error;
pub mod facade;
pub mod fat;
pub mod quark;
pub mod storage;
pub mod util;
