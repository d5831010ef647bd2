// The one handle to a mounted volume. This is where the fun begins.

use std::path::PathBuf;

use crate::disk::disk_struct::DiskImage;
use crate::users::user_struct::Identity;
use crate::volume::bitmap::bitmap_struct::Bitmap;
use crate::volume::open_files::OpenFileTable;
use crate::volume::superblock::Superblock;

/// A mounted volume.
///
/// Holds the image handle, the in-memory superblock and bitmaps, the
/// open-file table, and the identity state. Every public operation
/// takes this handle explicitly; there is no global volume.
///
/// All mutations are write-through: when an operation returns, the
/// image already reflects it.
pub struct Volume {
    pub(crate) image: DiskImage,
    pub(crate) superblock: Superblock,
    pub(crate) block_bitmap: Bitmap,
    pub(crate) inode_bitmap: Bitmap,
    pub(crate) open_files: OpenFileTable,
    pub(crate) identity: Identity,
}

/// Snapshot of the counters `status` dumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeStatus {
    pub image_path: PathBuf,
    pub total_blocks: u32,
    pub free_blocks: u32,
    pub total_inodes: u32,
    pub free_inodes: u32,
    pub current_user: Option<String>,
    pub open_files: usize,
}
