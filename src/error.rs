//! The error contract every fallible operation in this crate returns.

/// Errors raised by the block device, the decoders, and the facade.
///
/// Variants correspond to spec.md §7; each carries whatever context it can
/// to make the failure actionable without re-deriving it from call sites.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("bad filesystem type: {0}")]
    BadFilesystemType(&'static str),

    #[error("device i/o error: {0}")]
    Io(#[from] IoError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("invalid cluster {cluster:#x}: {reason}")]
    InvalidCluster { cluster: u32, reason: &'static str },

    #[error("unexpected end of file at offset {offset}")]
    UnexpectedEof { offset: u64 },

    #[error("out of memory")]
    OutOfMemory,
}

pub type Result<T> = core::result::Result<T, Error>;

/// Thin wrapper so the underlying device's I/O error type stays out of the
/// public `Error` enum's generic parameters (the teacher's `storage.rs`
/// threads an `Other(T)` type parameter through `ReadError`/`WriteError`
/// instead; we collapse that to a concrete type since the only backend in
/// scope is a plain file).
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error("short read/write at sector {sector}: expected {expected} bytes, got {actual}")]
    ShortTransfer {
        sector: u64,
        expected: usize,
        actual: usize,
    },
    #[error("sector {sector} is out of range (device has {sector_count} sectors)")]
    OutOfRange { sector: u64, sector_count: u64 },
    #[error("{0}")]
    Os(#[from] std::io::Error),
}
