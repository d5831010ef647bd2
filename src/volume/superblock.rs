// The superblock. Block 0 of every image.

use crate::helpers::clock::unix_now;
use crate::layout::{
    BLOCK_SIZE, FIRST_DATA_BLOCK, INODE_SIZE, MAX_BLOCKS, MAX_INODES, SUPERBLOCK_MAGIC,
};

/// Clean filesystem state marker.
pub const STATE_CLEAN: u16 = 1;
/// Error policy: carry on.
pub const ERRORS_CONTINUE: u16 = 1;

/// Volume metadata, held in memory while mounted and written through
/// on every mutation.
///
/// The two free counters are cached projections of the bitmaps. At
/// every stable point they must equal the bitmap zero-counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    pub inodes_count: u32,
    pub blocks_count: u32,
    pub free_blocks_count: u32,
    pub free_inodes_count: u32,
    pub first_data_block: u32,
    pub log_block_size: u32,
    pub inodes_per_group: u32,
    /// Last mount time, seconds since the epoch.
    pub mount_time: u32,
    /// Last write time.
    pub write_time: u32,
    pub magic: u16,
    pub state: u16,
    pub errors: u16,
    pub last_check: u32,
    pub first_ino: u32,
    pub inode_size: u16,
}

impl Superblock {
    /// A fresh superblock for a just-zeroed image. The root directory
    /// is not accounted for yet; format allocates it through the
    /// normal machinery.
    pub fn new_formatted() -> Superblock {
        let now = unix_now();
        Superblock {
            inodes_count: MAX_INODES,
            blocks_count: MAX_BLOCKS,
            free_blocks_count: MAX_BLOCKS - FIRST_DATA_BLOCK,
            // Inode 0 is the reserved null inode, never free.
            free_inodes_count: MAX_INODES - 1,
            first_data_block: FIRST_DATA_BLOCK,
            // Block size is 1024 << log_block_size.
            log_block_size: 0,
            inodes_per_group: MAX_INODES,
            mount_time: now,
            write_time: now,
            magic: SUPERBLOCK_MAGIC,
            state: STATE_CLEAN,
            errors: ERRORS_CONTINUE,
            last_check: now,
            first_ino: 1,
            inode_size: INODE_SIZE as u16,
        }
    }

    /// Serialize at the classic ext2 field offsets, little-endian,
    /// padded out to one block.
    pub fn to_block(&self) -> [u8; BLOCK_SIZE] {
        let mut buffer: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

        buffer[0..4].copy_from_slice(&self.inodes_count.to_le_bytes());
        buffer[4..8].copy_from_slice(&self.blocks_count.to_le_bytes());
        // 8..12 is the reserved-blocks count, which we do not use.
        buffer[12..16].copy_from_slice(&self.free_blocks_count.to_le_bytes());
        buffer[16..20].copy_from_slice(&self.free_inodes_count.to_le_bytes());
        buffer[20..24].copy_from_slice(&self.first_data_block.to_le_bytes());
        buffer[24..28].copy_from_slice(&self.log_block_size.to_le_bytes());
        buffer[40..44].copy_from_slice(&self.inodes_per_group.to_le_bytes());
        buffer[44..48].copy_from_slice(&self.mount_time.to_le_bytes());
        buffer[48..52].copy_from_slice(&self.write_time.to_le_bytes());
        buffer[56..58].copy_from_slice(&self.magic.to_le_bytes());
        buffer[58..60].copy_from_slice(&self.state.to_le_bytes());
        buffer[60..62].copy_from_slice(&self.errors.to_le_bytes());
        buffer[64..68].copy_from_slice(&self.last_check.to_le_bytes());
        buffer[84..88].copy_from_slice(&self.first_ino.to_le_bytes());
        buffer[88..90].copy_from_slice(&self.inode_size.to_le_bytes());

        buffer
    }

    pub fn from_block(block: &[u8; BLOCK_SIZE]) -> Superblock {
        let u32_at = |offset: usize| -> u32 {
            u32::from_le_bytes(block[offset..offset + 4].try_into().expect("4 = 4"))
        };
        let u16_at = |offset: usize| -> u16 {
            u16::from_le_bytes(block[offset..offset + 2].try_into().expect("2 = 2"))
        };

        Superblock {
            inodes_count: u32_at(0),
            blocks_count: u32_at(4),
            free_blocks_count: u32_at(12),
            free_inodes_count: u32_at(16),
            first_data_block: u32_at(20),
            log_block_size: u32_at(24),
            inodes_per_group: u32_at(40),
            mount_time: u32_at(44),
            write_time: u32_at(48),
            magic: u16_at(56),
            state: u16_at(58),
            errors: u16_at(60),
            last_check: u32_at(64),
            first_ino: u32_at(84),
            inode_size: u16_at(88),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::Superblock;
    use crate::layout::SUPERBLOCK_MAGIC;

    #[test]
    fn superblock_round_trip() {
        let superblock = Superblock::new_formatted();
        let block = superblock.to_block();
        let back = Superblock::from_block(&block);
        assert_eq!(superblock, back, "superblock must survive serialization");
    }

    #[test]
    fn magic_lands_at_offset_56() {
        let block = Superblock::new_formatted().to_block();
        let magic = u16::from_le_bytes(block[56..58].try_into().unwrap());
        assert_eq!(magic, SUPERBLOCK_MAGIC, "magic must sit at the ext2 offset");
    }
}
