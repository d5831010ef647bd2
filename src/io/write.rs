// Byte-addressed writes and truncation.

use log::{debug, warn};

use crate::error_types::filesystem::FsError;
use crate::helpers::clock::unix_now;
use crate::layout::{BLOCK_SIZE, DIRECT_SLOTS, INDIRECT_SLOT, blocks_for};
use crate::volume::volume_struct::Volume;

impl Volume {
    /// Write `data` starting at byte `offset`, allocating blocks on
    /// demand. Writing past the end of the file extends it; skipped
    /// ranges stay as holes.
    ///
    /// Running out of space mid-write is not an error: the write stops
    /// and the count of bytes already persisted comes back.
    pub fn write_inode_data(
        &mut self,
        inode_no: u32,
        data: &[u8],
        offset: u32,
    ) -> Result<usize, FsError> {
        go_write_inode_data(self, inode_no, data, offset)
    }

    /// Shorten the file to `length` bytes, freeing every block whose
    /// logical index lands past the new end. Asking for a length at or
    /// beyond the current size is a no-op; write is how files grow.
    pub fn truncate_inode(&mut self, inode_no: u32, length: u32) -> Result<(), FsError> {
        go_truncate_inode(self, inode_no, length)
    }
}

fn go_write_inode_data(
    volume: &mut Volume,
    inode_no: u32,
    data: &[u8],
    offset: u32,
) -> Result<usize, FsError> {
    let mut inode = volume.read_inode(inode_no)?;
    let mut written: usize = 0;
    let mut position = offset;

    while written < data.len() {
        let block_index = position / BLOCK_SIZE as u32;
        let block_offset = (position % BLOCK_SIZE as u32) as usize;
        let chunk = (BLOCK_SIZE - block_offset).min(data.len() - written);

        let mapped = match volume.map_block(&inode, block_index) {
            Ok(mapped) => mapped,
            Err(error) => {
                debug!("Write to inode {inode_no} stopped at byte {written}: {error}");
                break;
            }
        };

        let mut fresh = false;
        let physical = if mapped != 0 {
            mapped
        } else {
            let allocated = match volume.allocate_block() {
                Ok(allocated) => allocated,
                Err(error) => {
                    debug!("Write to inode {inode_no} stopped at byte {written}: {error}");
                    break;
                }
            };
            if let Err(error) = volume.set_map_block(&mut inode, block_index, allocated) {
                let _ = volume.free_block(allocated);
                debug!("Write to inode {inode_no} stopped at byte {written}: {error}");
                break;
            }
            fresh = true;
            allocated
        };

        // Whole-block writes skip the read; partial writes into a
        // freshly allocated block start from zeroes rather than
        // whatever the allocator handed us.
        let mut block: [u8; BLOCK_SIZE] = if chunk == BLOCK_SIZE || fresh {
            [0u8; BLOCK_SIZE]
        } else {
            match volume.image.read_block(physical) {
                Ok(block) => block,
                Err(error) => {
                    warn!("Write to inode {inode_no} stopped at byte {written}: {error}");
                    break;
                }
            }
        };

        block[block_offset..block_offset + chunk]
            .copy_from_slice(&data[written..written + chunk]);
        if let Err(error) = volume.image.write_block(physical, &block) {
            warn!("Write to inode {inode_no} stopped at byte {written}: {error}");
            break;
        }

        written += chunk;
        position += chunk as u32;
    }

    // The mapping slots touched above and any size growth must land
    // in the record even when the loop stopped early.
    let end = offset + written as u32;
    if end > inode.size {
        inode.size = end;
        inode.blocks = blocks_for(inode.size);
    }
    let now = unix_now();
    inode.mtime = now;
    inode.ctime = now;
    volume.write_inode(inode_no, &inode)?;

    Ok(written)
}

fn go_truncate_inode(volume: &mut Volume, inode_no: u32, length: u32) -> Result<(), FsError> {
    let mut inode = volume.read_inode(inode_no)?;

    if length >= inode.size {
        return Ok(());
    }

    let new_blocks = blocks_for(length);
    let old_blocks = blocks_for(inode.size);
    debug!("Truncating inode {inode_no} from {old_blocks} to {new_blocks} blocks.");

    for block_index in new_blocks..old_blocks {
        let physical = volume.map_block(&inode, block_index)?;
        if physical != 0 {
            volume.free_block(physical)?;
            volume.set_map_block(&mut inode, block_index, 0)?;
        }
    }

    // Once nothing past the direct range remains, the indirect block
    // itself goes back to the allocator.
    if new_blocks <= DIRECT_SLOTS as u32 && inode.block[INDIRECT_SLOT] != 0 {
        volume.free_block(inode.block[INDIRECT_SLOT])?;
        inode.block[INDIRECT_SLOT] = 0;
    }

    inode.size = length;
    inode.blocks = new_blocks;
    let now = unix_now();
    inode.mtime = now;
    inode.ctime = now;
    volume.write_inode(inode_no, &inode)?;
    Ok(())
}
