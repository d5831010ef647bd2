// Shared scaffolding for in-crate tests that want a real volume on a
// throwaway image.
#![allow(clippy::unwrap_used)]

use tempfile::TempDir;

use crate::layout::{FIRST_DATA_BLOCK, MAX_BLOCKS, MAX_INODES};
use crate::volume::volume_struct::Volume;

/// A freshly formatted, mounted volume. Keep the TempDir alive as
/// long as the volume.
pub(crate) fn scratch_volume() -> (Volume, TempDir) {
    let dir = tempfile::tempdir().expect("a temp dir for the image");
    let path = dir.path().join("scratch.img");
    Volume::format(&path).expect("formatting a fresh image");
    let volume = Volume::mount(&path).expect("mounting the fresh image");
    (volume, dir)
}

/// What `free_blocks` reads right after format: the data region minus
/// the root directory's one block.
pub(crate) fn post_format_free_blocks() -> u32 {
    MAX_BLOCKS - FIRST_DATA_BLOCK - 1
}

/// What `free_inodes` reads right after format: every inode bit clear
/// except the root's, minus the reserved inode 0.
pub(crate) fn post_format_free_inodes() -> u32 {
    MAX_INODES - 2
}

/// The cached free counters must equal the bitmap zero-counts at
/// every stable point.
pub(crate) fn assert_counters_match_bitmaps(volume: &Volume) {
    assert_eq!(
        volume.superblock.free_blocks_count,
        volume.block_bitmap.zeros_in(FIRST_DATA_BLOCK, MAX_BLOCKS),
        "free-block counter must mirror the bitmap"
    );
    assert_eq!(
        volume.superblock.free_inodes_count,
        volume.inode_bitmap.zeros_in(0, MAX_INODES) - 1,
        "free-inode counter must mirror the bitmap, minus reserved inode 0"
    );
}
