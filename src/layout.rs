// Fixed parameters of the on-disk format. Change nothing here without
// reformatting every image you care about.

/// Unit of all I/O against the image, in bytes.
pub const BLOCK_SIZE: usize = 1024;

/// Total number of blocks in the image.
pub const MAX_BLOCKS: u32 = 1024;

/// Total number of inode bits in the inode bitmap. Inode 0 is the
/// reserved null inode and is never allocated.
pub const MAX_INODES: u32 = 128;

/// Size of one on-disk inode record, in bytes.
pub const INODE_SIZE: usize = 128;

/// The ext2 magic.
pub const SUPERBLOCK_MAGIC: u16 = 0xEF53;

// Block-indexed layout of the image.
pub const SUPERBLOCK_BLOCK: u32 = 0;
pub const BLOCK_BITMAP_BLOCK: u32 = 1;
pub const INODE_BITMAP_BLOCK: u32 = 2;
pub const INODE_TABLE_START: u32 = 3;

/// How many blocks the inode table occupies.
pub const INODE_TABLE_BLOCKS: u32 =
    ((MAX_INODES as usize * INODE_SIZE).div_ceil(BLOCK_SIZE)) as u32;

/// First block that can hold file or directory data. Everything below
/// this is metadata and must never be marked free.
pub const FIRST_DATA_BLOCK: u32 = INODE_TABLE_START + INODE_TABLE_BLOCKS;

/// The root directory lives here. Created at format time.
pub const ROOT_INODE: u32 = 2;

/// Direct pointer slots in an inode.
pub const DIRECT_SLOTS: usize = 12;

/// Index of the single-indirect slot.
pub const INDIRECT_SLOT: usize = 12;

/// Total pointer slots in an inode record. Slots 13 and 14 exist on
/// disk but are unused and always written as zero.
pub const BLOCK_SLOTS: usize = 15;

/// Direct pointers held by the single-indirect block.
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;

/// Largest number of data blocks one file can map.
pub const MAX_FILE_BLOCKS: u32 = DIRECT_SLOTS as u32 + POINTERS_PER_BLOCK as u32;

/// Exact byte length of a well-formed image file.
pub const IMAGE_SIZE: u64 = MAX_BLOCKS as u64 * BLOCK_SIZE as u64;

/// Capacity of the open-file table.
pub const MAX_OPEN_FILES: usize = 16;

/// Longest directory entry name we accept.
pub const MAX_NAME_LEN: usize = 255;

/// How many blocks a file of `bytes` bytes occupies.
pub const fn blocks_for(bytes: u32) -> u32 {
    bytes.div_ceil(BLOCK_SIZE as u32)
}
