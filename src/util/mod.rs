//! Small bit-level helpers shared by the FAT32 and Quark decoders.

mod bitmap;
mod bits;

pub use bitmap::BitMap;
pub use bits::Bits;

bitflags::bitflags! {
    /// Mount-time directory-iterator behavior (spec.md §3.8, §4.4).
    ///
    /// Shared between the FAT32 and Quark iterators since both expose the
    /// same single knob: yield every raw record (including deleted
    /// entries, LFN fragments, or `AT_DELETE`d Quark dentries) instead of
    /// filtering them out.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IterFlags: u32 {
        const RAW = 0x01;
    }
}
